use crate::config::ChartOptions;
use crate::error::ChartError;
use crate::payload::DataFrame;
use crate::style::StyleResolution;
use crate::text_metrics::TextMetricsProvider;

use super::fit::{LabelFill, LabelPosition, MarkBox, TextAnchor, place_label};
use super::margins::{MarginRequest, compute_margins, inner_plot};
use super::text::measure_block;
use super::{ChartData, Layout, PlacedBlock, PlotFrame, centered_first_baseline};

#[derive(Debug, Clone)]
pub struct ColumnData {
    pub plot: PlotFrame,
    pub title: Option<PlacedBlock>,
    pub columns: Vec<ColumnMark>,
    pub ticks: Vec<TickMark>,
}

#[derive(Debug, Clone)]
pub struct ColumnMark {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub color: String,
    pub corner_radius: f32,
    pub category: PlacedBlock,
    pub value_label: Option<PlacedBlock>,
}

/// A horizontal gridline with its value label at the left axis.
#[derive(Debug, Clone)]
pub struct TickMark {
    pub y: f32,
    pub label: PlacedBlock,
}

/// Vertical columns on a category band axis. Tick labels size the left
/// margin; category labels wrap to the band width below the plot, so the
/// bottom margin is measured after the horizontal margins are known.
pub(super) fn compute_column_layout(
    frame: &DataFrame,
    style: &StyleResolution,
    options: &ChartOptions,
    metrics: &dyn TextMetricsProvider,
) -> Result<Layout, ChartError> {
    let column_cfg = &options.column;
    let label_font = &style.label_font;
    let annotation_font = &style.annotation_font;

    let max_value = frame.max_value().max(0.0);
    let tick_values: Vec<f64> = (0..=options.tick_count)
        .map(|step| max_value * step as f64 / options.tick_count as f64)
        .collect();
    let tick_labels: Vec<String> = tick_values
        .iter()
        .map(|value| frame.y_field.format_value(*value))
        .collect();

    let title_block = options.title.as_deref().map(|title| {
        measure_block(
            title,
            &style.title_font,
            Some(options.width),
            options.label_line_height,
            metrics,
        )
    });
    let top_extent = title_block.as_ref().map(|block| block.height).unwrap_or(0.0);

    // First pass: horizontal margins from the tick labels only.
    let request = MarginRequest {
        left_labels: &tick_labels,
        left_font: Some(annotation_font),
        top_extent,
        ..Default::default()
    };
    let provisional = compute_margins(&request, options, metrics);
    let (inner_width, _) = inner_plot(options.width, options.height, &provisional)?;

    // Second pass: wrap category labels to the band width and let the
    // tallest block size the bottom margin.
    let band = inner_width / frame.rows.len() as f32;
    let category_blocks: Vec<_> = frame
        .rows
        .iter()
        .map(|row| {
            measure_block(
                &row.category,
                label_font,
                Some((band - column_cfg.label_pad * 2.0).max(1.0)),
                options.label_line_height,
                metrics,
            )
        })
        .collect();
    let bottom_extent = category_blocks
        .iter()
        .map(|block| block.height)
        .fold(0.0, f32::max)
        + column_cfg.axis_label_gap;

    let request = MarginRequest {
        left_labels: &tick_labels,
        left_font: Some(annotation_font),
        top_extent,
        bottom_extent,
        ..Default::default()
    };
    let margins = compute_margins(&request, options, metrics);
    let (inner_width, inner_height) = inner_plot(options.width, options.height, &margins)?;

    let plot = PlotFrame {
        x: margins.left,
        y: margins.top,
        width: inner_width,
        height: inner_height,
    };
    let band = inner_width / frame.rows.len() as f32;
    let column_width = (band * (1.0 - column_cfg.band_gap_ratio)).max(1.0_f32.min(band));
    let scale = if max_value > 0.0 {
        inner_height / max_value as f32
    } else {
        0.0
    };

    let ticks = tick_values
        .iter()
        .zip(&tick_labels)
        .map(|(value, text)| {
            let y = plot.y + inner_height - (*value as f32 * scale);
            let block = measure_block(text, annotation_font, None, options.label_line_height, metrics);
            TickMark {
                y,
                label: PlacedBlock {
                    x: plot.x - column_cfg.tick_gap,
                    y: centered_first_baseline(y, &block, annotation_font),
                    block,
                    anchor: TextAnchor::End,
                    fill: style.text_color.clone(),
                    font: annotation_font.clone(),
                },
            }
        })
        .collect();

    let mut columns = Vec::with_capacity(frame.rows.len());
    for (index, row) in frame.rows.iter().enumerate() {
        let band_left = plot.x + index as f32 * band;
        let column_x = band_left + (band - column_width) / 2.0;
        let column_height = (row.value.max(0.0) as f32 * scale).min(inner_height);
        let column_y = plot.y + inner_height - column_height;
        let color = style.category_color(&row.category, index);

        let category_block = category_blocks[index].clone();
        let category = PlacedBlock {
            x: band_left + band / 2.0,
            y: plot.y + inner_height + column_cfg.axis_label_gap + label_font.size,
            block: category_block,
            anchor: TextAnchor::Middle,
            fill: style.text_color.clone(),
            font: label_font.clone(),
        };

        // Fitting runs along the column's vertical extent: "outside" means
        // above the column top, in the space up to the canvas edge.
        let value_text = frame.y_field.format_value(row.value);
        let outside_room = inner_height - column_height + margins.top - column_cfg.label_pad;
        let fit = place_label(
            MarkBox {
                width: column_height,
                height: column_width,
            },
            &value_text,
            annotation_font,
            column_cfg.label_pad,
            Some(outside_room),
            metrics,
        );
        let value_block = measure_block(
            &value_text,
            annotation_font,
            None,
            options.label_line_height,
            metrics,
        );
        let value_label = match fit.position {
            LabelPosition::Hidden => None,
            LabelPosition::Inside => Some(PlacedBlock {
                x: band_left + band / 2.0,
                y: column_y + column_cfg.label_pad + annotation_font.size,
                block: value_block,
                anchor: TextAnchor::Middle,
                fill: match fit.fill {
                    LabelFill::OnMark => style.on_mark_color(&color),
                    LabelFill::Ambient => style.text_color.clone(),
                },
                font: annotation_font.clone(),
            }),
            LabelPosition::Outside => Some(PlacedBlock {
                x: band_left + band / 2.0,
                y: column_y - column_cfg.label_pad,
                block: value_block,
                anchor: TextAnchor::Middle,
                fill: style.text_color.clone(),
                font: annotation_font.clone(),
            }),
        };

        columns.push(ColumnMark {
            x: column_x,
            y: column_y,
            width: column_width,
            height: column_height,
            color,
            corner_radius: options.corner_radius.min(column_width / 2.0),
            category,
            value_label,
        });
    }

    let title = title_block.map(|block| PlacedBlock {
        x: plot.x + inner_width / 2.0,
        y: style.title_font.size + 4.0,
        block,
        anchor: TextAnchor::Middle,
        fill: style.text_color.clone(),
        font: style.title_font.clone(),
    });

    Ok(Layout {
        width: options.width,
        height: options.height,
        chart: ChartData::Column(ColumnData {
            plot,
            title,
            columns,
            ticks,
        }),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payload::parse_payload;
    use crate::style::ColorMode;
    use crate::text_metrics::HeuristicMetrics;
    use serde_json::json;

    fn fixture(variables: serde_json::Value) -> (DataFrame, StyleResolution, ChartOptions) {
        let payload = parse_payload(
            &json!({
                "data": {
                    "data": [
                        { "quarter": "Q1 of the fiscal year", "revenue": 120 },
                        { "quarter": "Q2", "revenue": 80 },
                        { "quarter": "Q3", "revenue": 200 },
                        { "quarter": "Q4", "revenue": 45 }
                    ],
                    "columns": [
                        { "name": "quarter", "role": "x" },
                        { "name": "revenue", "role": "y", "unit": "k" }
                    ]
                },
                "variables": variables
            })
            .to_string(),
        )
        .unwrap();
        let frame = DataFrame::from_payload(&payload).unwrap();
        let style = StyleResolution::resolve(&payload, ColorMode::Light);
        let options = ChartOptions::from_variables(&payload.variables);
        (frame, style, options)
    }

    fn layout(variables: serde_json::Value) -> ColumnData {
        let (frame, style, options) = fixture(variables);
        let layout = compute_column_layout(&frame, &style, &options, &HeuristicMetrics).unwrap();
        match layout.chart {
            ChartData::Column(data) => data,
            other => panic!("expected column data, got {other:?}"),
        }
    }

    #[test]
    fn tallest_column_reaches_the_plot_top() {
        let data = layout(json!({ "width": 640, "height": 400 }));
        let tallest = &data.columns[2];
        assert!((tallest.height - data.plot.height).abs() < 0.01);
        assert!((tallest.y - data.plot.y).abs() < 0.01);
    }

    #[test]
    fn long_category_labels_wrap_within_the_band() {
        let data = layout(json!({ "width": 400, "height": 300 }));
        let wrapped = &data.columns[0].category.block;
        assert!(wrapped.lines.len() > 1, "expected wrapping, got {:?}", wrapped.lines);
        let band = data.plot.width / 4.0;
        assert!(wrapped.width <= band);
    }

    #[test]
    fn tick_labels_cover_zero_to_max() {
        let data = layout(json!({ "tick_count": 4 }));
        assert_eq!(data.ticks.len(), 5);
        assert_eq!(data.ticks[0].label.block.lines[0], "0 k");
        assert_eq!(data.ticks[4].label.block.lines[0], "200 k");
        assert!(data.ticks[4].y < data.ticks[0].y);
    }

    #[test]
    fn bottom_margin_clears_the_tallest_wrapped_label() {
        let data = layout(json!({ "width": 400, "height": 300 }));
        let tallest = data
            .columns
            .iter()
            .map(|column| column.category.block.height)
            .fold(0.0, f32::max);
        assert!(data.plot.y + data.plot.height + tallest <= 300.0);
    }
}
