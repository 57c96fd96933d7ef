use crate::config::ChartOptions;
use crate::error::ChartError;
use crate::payload::DataFrame;
use crate::style::StyleResolution;
use crate::text_metrics::TextMetricsProvider;

use super::fit::{LabelFill, LabelPosition, MarkBox, TextAnchor, place_label};
use super::margins::{MarginRequest, compute_margins, inner_plot};
use super::text::measure_block;
use super::{ChartData, IconMark, Layout, PlacedBlock, PlotFrame, centered_first_baseline};

#[derive(Debug, Clone)]
pub struct BarData {
    pub plot: PlotFrame,
    pub title: Option<PlacedBlock>,
    pub bars: Vec<BarMark>,
}

#[derive(Debug, Clone)]
pub struct BarMark {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub color: String,
    pub corner_radius: f32,
    pub category: PlacedBlock,
    pub icon: Option<IconMark>,
    pub value_label: Option<PlacedBlock>,
    /// x of the y2 (target) tick when the payload carries a y2 column.
    pub target_x: Option<f32>,
}

/// Horizontal bars, one band per record. Category labels (and icons) live
/// in the left margin; value labels go inside or outside the bar end.
pub(super) fn compute_bar_layout(
    frame: &DataFrame,
    style: &StyleResolution,
    options: &ChartOptions,
    metrics: &dyn TextMetricsProvider,
) -> Result<Layout, ChartError> {
    let bar_cfg = &options.bar;
    let label_font = &style.label_font;
    let annotation_font = &style.annotation_font;

    let category_labels = frame.category_labels();
    let value_labels = frame.value_labels();
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
        left_labels: &category_labels,
        left_font: Some(label_font),
        left_icon: style.has_icons().then_some(bar_cfg.icon_size),
        right_labels: &value_labels,
        right_font: Some(annotation_font),
        top_extent: title_block.as_ref().map(|block| block.height).unwrap_or(0.0),
        bottom_extent: 0.0,
    };
    let margins = compute_margins(&request, options, metrics);
    let (inner_width, inner_height) = inner_plot(options.width, options.height, &margins)?;

    let plot = PlotFrame {
        x: margins.left,
        y: margins.top,
        width: inner_width,
        height: inner_height,
    };

    let max_value = frame.max_value();
    let scale = if max_value > 0.0 {
        inner_width / max_value as f32
    } else {
        0.0
    };

    let band = inner_height / frame.rows.len() as f32;
    let bar_height = (band * (1.0 - bar_cfg.band_gap_ratio)).max(bar_cfg.min_band.min(band));
    let margin_cfg = &options.margins;

    let mut bars = Vec::with_capacity(frame.rows.len());
    for (index, row) in frame.rows.iter().enumerate() {
        let band_top = plot.y + index as f32 * band;
        let bar_y = band_top + (band - bar_height) / 2.0;
        let bar_width = (row.value.max(0.0) as f32 * scale).min(inner_width);
        let color = style.category_color(&row.category, index);

        let icon = style.icon_url(&row.category).map(|url| IconMark {
            x: plot.x - margin_cfg.icon_gap - bar_cfg.icon_size,
            y: band_top + (band - bar_cfg.icon_size) / 2.0,
            size: bar_cfg.icon_size,
            url: url.to_string(),
        });
        let label_right = match icon {
            Some(_) => plot.x - margin_cfg.icon_gap - bar_cfg.icon_size - margin_cfg.label_gap,
            None => plot.x - margin_cfg.label_gap,
        };
        let category_block = measure_block(
            &row.category,
            label_font,
            None,
            options.label_line_height,
            metrics,
        );
        let category = PlacedBlock {
            x: label_right,
            y: centered_first_baseline(band_top + band / 2.0, &category_block, label_font),
            block: category_block,
            anchor: TextAnchor::End,
            fill: style.text_color.clone(),
            font: label_font.clone(),
        };

        let value_text = frame.y_field.format_value(row.value);
        // Room between the bar end and the canvas edge; an outside label
        // that cannot fit there is forced back inside.
        let outside_room = inner_width - bar_width + margins.right - margin_cfg.label_gap;
        let fit = place_label(
            MarkBox {
                width: bar_width,
                height: bar_height,
            },
            &value_text,
            annotation_font,
            bar_cfg.label_pad,
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
                x: plot.x + bar_width / 2.0,
                y: centered_first_baseline(bar_y + bar_height / 2.0, &value_block, annotation_font),
                block: value_block,
                anchor: fit.anchor,
                fill: match fit.fill {
                    LabelFill::OnMark => style.on_mark_color(&color),
                    LabelFill::Ambient => style.text_color.clone(),
                },
                font: annotation_font.clone(),
            }),
            LabelPosition::Outside => Some(PlacedBlock {
                x: plot.x + bar_width + bar_cfg.label_pad,
                y: centered_first_baseline(bar_y + bar_height / 2.0, &value_block, annotation_font),
                block: value_block,
                anchor: fit.anchor,
                fill: style.text_color.clone(),
                font: annotation_font.clone(),
            }),
        };

        let target_x = row
            .secondary
            .filter(|value| *value > 0.0)
            .map(|value| plot.x + (value as f32 * scale).min(inner_width));

        bars.push(BarMark {
            x: plot.x,
            y: bar_y,
            width: bar_width,
            height: bar_height,
            color,
            corner_radius: options.corner_radius.min(bar_height / 2.0),
            category,
            icon,
            value_label,
            target_x,
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
        chart: ChartData::Bar(BarData { plot, title, bars }),
    })
}
