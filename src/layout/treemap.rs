use crate::config::ChartOptions;
use crate::error::ChartError;
use crate::payload::DataFrame;
use crate::style::StyleResolution;
use crate::text_metrics::TextMetricsProvider;

use super::fit::TextAnchor;
use super::margins::{MarginRequest, compute_margins, inner_plot};
use super::text::measure_block;
use super::{ChartData, Layout, PlacedBlock, centered_first_baseline};

#[derive(Debug, Clone)]
pub struct TreemapData {
    pub cells: Vec<CellMark>,
}

#[derive(Debug, Clone)]
pub struct CellMark {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub depth: usize,
    pub color: String,
    pub category: String,
    /// Leaf cells carry their value; group cells do not.
    pub value: Option<f64>,
    pub label: Option<PlacedBlock>,
}

struct TreeItem {
    name: String,
    weight: f64,
    color: String,
    value: Option<f64>,
    children: Vec<TreeItem>,
}

#[derive(Clone, Copy)]
struct TreeRect {
    x: f32,
    y: f32,
    w: f32,
    h: f32,
}

impl TreeRect {
    fn inset(self, pad: f32) -> Self {
        let pad = pad.max(0.0);
        Self {
            x: self.x + pad,
            y: self.y + pad,
            w: (self.w - pad * 2.0).max(0.0),
            h: (self.h - pad * 2.0).max(0.0),
        }
    }
}

/// Slice-and-dice treemap: the split axis alternates per depth, cell spans
/// are proportional to value weights. With a group column the first level
/// splits by group; leaves are the categories.
pub(super) fn compute_treemap_layout(
    frame: &DataFrame,
    style: &StyleResolution,
    options: &ChartOptions,
    metrics: &dyn TextMetricsProvider,
) -> Result<Layout, ChartError> {
    let title_block = options.title.as_deref().map(|title| {
        measure_block(
            title,
            &style.title_font,
            Some(options.width),
            options.label_line_height,
            metrics,
        )
    });
    let request = MarginRequest {
        top_extent: title_block.as_ref().map(|block| block.height).unwrap_or(0.0),
        ..Default::default()
    };
    let margins = compute_margins(&request, options, metrics);
    let (inner_width, inner_height) = inner_plot(options.width, options.height, &margins)?;

    let items = build_items(frame, style)?;
    let root = TreeRect {
        x: margins.left,
        y: margins.top,
        w: inner_width,
        h: inner_height,
    };

    let mut cells = Vec::new();
    slice_items(
        &items, root, 0, frame, style, options, metrics, &mut cells,
    );

    Ok(Layout {
        width: options.width,
        height: options.height,
        chart: ChartData::Treemap(TreemapData { cells }),
    })
}

fn build_items(
    frame: &DataFrame,
    style: &StyleResolution,
) -> Result<Vec<TreeItem>, ChartError> {
    let mut items: Vec<TreeItem> = Vec::new();

    if frame.group_field.is_some() {
        for row in &frame.rows {
            if row.value <= 0.0 {
                tracing::debug!(category = %row.category, "non-positive treemap value dropped");
                continue;
            }
            let group = row.group.clone().unwrap_or_default();
            let group_index = match items.iter().position(|item| item.name == group) {
                Some(index) => index,
                None => {
                    let color = style.category_color(&group, items.len());
                    items.push(TreeItem {
                        name: group,
                        weight: 0.0,
                        color,
                        value: None,
                        children: Vec::new(),
                    });
                    items.len() - 1
                }
            };
            let group_item = &mut items[group_index];
            group_item.weight += row.value;
            let color = group_item.color.clone();
            group_item.children.push(TreeItem {
                name: row.category.clone(),
                weight: row.value,
                color,
                value: Some(row.value),
                children: Vec::new(),
            });
        }
    } else {
        for (index, row) in frame.rows.iter().enumerate() {
            if row.value <= 0.0 {
                tracing::debug!(category = %row.category, "non-positive treemap value dropped");
                continue;
            }
            items.push(TreeItem {
                name: row.category.clone(),
                weight: row.value,
                color: style.category_color(&row.category, index),
                value: Some(row.value),
                children: Vec::new(),
            });
        }
    }

    if items.is_empty() {
        return Err(ChartError::config(
            "treemap requires at least one positive value",
        ));
    }
    Ok(items)
}

#[allow(clippy::too_many_arguments)]
fn slice_items(
    items: &[TreeItem],
    rect: TreeRect,
    depth: usize,
    frame: &DataFrame,
    style: &StyleResolution,
    options: &ChartOptions,
    metrics: &dyn TextMetricsProvider,
    cells: &mut Vec<CellMark>,
) {
    if items.is_empty() || rect.w <= 0.0 || rect.h <= 0.0 {
        return;
    }
    let cfg = &options.treemap;
    let total_weight: f64 = items.iter().map(|item| item.weight).sum();
    if total_weight <= 0.0 {
        return;
    }

    let gap = cfg.gap.max(0.0);
    let horizontal = depth % 2 == 0;
    let count = items.len();
    let available = if horizontal {
        (rect.w - gap * count.saturating_sub(1) as f32).max(0.0)
    } else {
        (rect.h - gap * count.saturating_sub(1) as f32).max(0.0)
    };

    let mut offset = 0.0;
    for item in items {
        let ratio = (item.weight / total_weight).max(0.0) as f32;
        let span = available * ratio;
        let cell_rect = if horizontal {
            let x = rect.x + offset;
            offset += span + gap;
            TreeRect {
                x,
                y: rect.y,
                w: span,
                h: rect.h,
            }
        } else {
            let y = rect.y + offset;
            offset += span + gap;
            TreeRect {
                x: rect.x,
                y,
                w: rect.w,
                h: span,
            }
        };

        if item.children.is_empty() {
            let label = leaf_label(item, cell_rect, frame, style, options, metrics);
            cells.push(CellMark {
                x: cell_rect.x,
                y: cell_rect.y,
                width: cell_rect.w,
                height: cell_rect.h,
                depth,
                color: item.color.clone(),
                category: item.name.clone(),
                value: item.value,
                label,
            });
        } else {
            let label = group_label(item, cell_rect, style, options, metrics);
            let header = if label.is_some() {
                style.label_font.size + 6.0
            } else {
                0.0
            };
            cells.push(CellMark {
                x: cell_rect.x,
                y: cell_rect.y,
                width: cell_rect.w,
                height: cell_rect.h,
                depth,
                color: item.color.clone(),
                category: item.name.clone(),
                value: None,
                label,
            });
            let mut child_rect = cell_rect.inset(cfg.padding);
            child_rect.y += header;
            child_rect.h = (child_rect.h - header).max(0.0);
            if child_rect.w > 1.0 && child_rect.h > 1.0 {
                slice_items(
                    &item.children,
                    child_rect,
                    depth + 1,
                    frame,
                    style,
                    options,
                    metrics,
                    cells,
                );
            }
        }
    }
}

/// Category plus value, centered, drawn only when the wrapped block fits
/// the cell inset and the cell is big enough to bother.
fn leaf_label(
    item: &TreeItem,
    rect: TreeRect,
    frame: &DataFrame,
    style: &StyleResolution,
    options: &ChartOptions,
    metrics: &dyn TextMetricsProvider,
) -> Option<PlacedBlock> {
    let cfg = &options.treemap;
    let value_text = item
        .value
        .map(|value| frame.y_field.format_value(value))
        .unwrap_or_default();
    let text = if value_text.is_empty() {
        item.name.clone()
    } else {
        format!("{}\n{}", item.name, value_text)
    };
    let max_width = (rect.w - cfg.label_padding_x * 2.0).max(1.0);
    let block = measure_block(
        &text,
        &style.label_font,
        Some(max_width),
        options.label_line_height,
        metrics,
    );

    let fits = block.width <= max_width && block.height <= (rect.h - cfg.label_padding_y * 2.0).max(0.0);
    let area = rect.w * rect.h;
    if !fits || area < cfg.min_label_area {
        return None;
    }
    Some(PlacedBlock {
        x: rect.x + rect.w / 2.0,
        y: centered_first_baseline(rect.y + rect.h / 2.0, &block, &style.label_font),
        block,
        anchor: TextAnchor::Middle,
        fill: style.on_mark_color(&item.color),
        font: style.label_font.clone(),
    })
}

fn group_label(
    item: &TreeItem,
    rect: TreeRect,
    style: &StyleResolution,
    options: &ChartOptions,
    metrics: &dyn TextMetricsProvider,
) -> Option<PlacedBlock> {
    let cfg = &options.treemap;
    if item.name.is_empty() {
        return None;
    }
    let block = measure_block(
        &item.name,
        &style.label_font,
        None,
        options.label_line_height,
        metrics,
    );
    if block.width > (rect.w - cfg.label_padding_x * 2.0).max(0.0)
        || rect.h < style.label_font.size * 2.0
    {
        return None;
    }
    // Group cells render with a washed-out fill, so the header reads in the
    // ambient text color rather than the on-mark contrast color.
    Some(PlacedBlock {
        x: rect.x + cfg.label_padding_x,
        y: rect.y + cfg.label_padding_y + style.label_font.size,
        block,
        anchor: TextAnchor::Start,
        fill: style.text_color.clone(),
        font: style.label_font.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payload::parse_payload;
    use crate::style::ColorMode;
    use crate::text_metrics::HeuristicMetrics;
    use serde_json::json;

    fn compute(records: serde_json::Value, columns: serde_json::Value) -> TreemapData {
        let payload = parse_payload(
            &json!({
                "data": { "data": records, "columns": columns },
                "variables": { "width": 600, "height": 400 }
            })
            .to_string(),
        )
        .unwrap();
        let frame = DataFrame::from_payload(&payload).unwrap();
        let style = StyleResolution::resolve(&payload, ColorMode::Light);
        let options = ChartOptions::from_variables(&payload.variables);
        let layout = compute_treemap_layout(&frame, &style, &options, &HeuristicMetrics).unwrap();
        match layout.chart {
            ChartData::Treemap(data) => data,
            other => panic!("expected treemap data, got {other:?}"),
        }
    }

    fn flat_columns() -> serde_json::Value {
        json!([
            { "name": "lang", "role": "x" },
            { "name": "files", "role": "y" }
        ])
    }

    #[test]
    fn flat_cells_split_proportionally_to_weight() {
        let data = compute(
            json!([
                { "lang": "Rust", "files": 60 },
                { "lang": "Go", "files": 30 },
                { "lang": "Shell", "files": 10 }
            ]),
            flat_columns(),
        );
        assert_eq!(data.cells.len(), 3);
        // Depth 0 splits horizontally, so widths carry the proportions.
        let rust = &data.cells[0];
        let shell = &data.cells[2];
        assert!((rust.width / shell.width - 6.0).abs() < 0.1);
        assert_eq!(rust.height, shell.height);
    }

    #[test]
    fn grouped_rows_nest_under_group_cells() {
        let data = compute(
            json!([
                { "lang": "Rust", "files": 40, "team": "Systems" },
                { "lang": "C", "files": 20, "team": "Systems" },
                { "lang": "Python", "files": 40, "team": "Data" }
            ]),
            json!([
                { "name": "lang", "role": "x" },
                { "name": "files", "role": "y" },
                { "name": "team", "role": "group" }
            ]),
        );
        let groups: Vec<_> = data.cells.iter().filter(|cell| cell.depth == 0).collect();
        let leaves: Vec<_> = data.cells.iter().filter(|cell| cell.depth == 1).collect();
        assert_eq!(groups.len(), 2);
        assert_eq!(leaves.len(), 3);
        assert!(groups.iter().all(|cell| cell.value.is_none()));
        // Leaves inherit the group color.
        let systems = groups.iter().find(|cell| cell.category == "Systems").unwrap();
        let rust = leaves.iter().find(|cell| cell.category == "Rust").unwrap();
        assert_eq!(systems.color, rust.color);
    }

    #[test]
    fn tiny_cells_suppress_their_labels() {
        let data = compute(
            json!([
                { "lang": "Dominant", "files": 5000 },
                { "lang": "Speck", "files": 1 }
            ]),
            flat_columns(),
        );
        let speck = data.cells.iter().find(|cell| cell.category == "Speck").unwrap();
        assert!(speck.label.is_none());
        let dominant = data
            .cells
            .iter()
            .find(|cell| cell.category == "Dominant")
            .unwrap();
        assert!(dominant.label.is_some());
    }

    #[test]
    fn non_positive_values_are_dropped_and_all_zero_fails() {
        let data = compute(
            json!([
                { "lang": "Rust", "files": 10 },
                { "lang": "Void", "files": 0 }
            ]),
            flat_columns(),
        );
        assert_eq!(data.cells.len(), 1);

        let payload = parse_payload(
            &json!({
                "data": {
                    "data": [{ "lang": "Void", "files": 0 }],
                    "columns": flat_columns()
                }
            })
            .to_string(),
        )
        .unwrap();
        let frame = DataFrame::from_payload(&payload).unwrap();
        let style = StyleResolution::resolve(&payload, ColorMode::Light);
        let err = compute_treemap_layout(
            &frame,
            &style,
            &ChartOptions::default(),
            &HeuristicMetrics,
        )
        .unwrap_err();
        assert!(matches!(err, ChartError::Configuration { .. }));
    }
}
