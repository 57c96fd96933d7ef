use std::f32::consts::{FRAC_PI_2, PI};

use crate::config::ChartOptions;
use crate::error::ChartError;
use crate::payload::DataFrame;
use crate::style::StyleResolution;
use crate::text_metrics::TextMetricsProvider;

use super::fit::{LabelFill, LabelPosition, MarkBox, TextAnchor, place_label};
use super::margins::{MarginRequest, compute_margins, inner_plot};
use super::text::measure_block;
use super::{ChartData, Layout, PlacedBlock, centered_first_baseline};

#[derive(Debug, Clone)]
pub struct RadialData {
    pub center: (f32, f32),
    pub rings: Vec<RingMark>,
    pub spokes: Vec<SpokeMark>,
    pub title: Option<PlacedBlock>,
}

/// Concentric guide circle with its value tick at 12 o'clock.
#[derive(Debug, Clone)]
pub struct RingMark {
    pub radius: f32,
    pub label: Option<PlacedBlock>,
}

/// One polar bar plus its category label on the rim.
#[derive(Debug, Clone)]
pub struct SpokeMark {
    pub start_angle: f32,
    pub end_angle: f32,
    pub inner_radius: f32,
    pub outer_radius: f32,
    pub color: String,
    pub category: String,
    pub value: f64,
    pub category_label: PlacedBlock,
    pub value_label: Option<PlacedBlock>,
}

/// Radial bar chart: one angular slot per record, bars growing outward from
/// an inner hub. Category labels sit outside the outermost ring, so both
/// horizontal margins are sized for the widest category.
pub(super) fn compute_radial_layout(
    frame: &DataFrame,
    style: &StyleResolution,
    options: &ChartOptions,
    metrics: &dyn TextMetricsProvider,
) -> Result<Layout, ChartError> {
    let radial_cfg = &options.radial;
    let label_font = &style.label_font;
    let annotation_font = &style.annotation_font;

    let category_labels = frame.category_labels();
    let title_block = options.title.as_deref().map(|title| {
        measure_block(
            title,
            &style.title_font,
            Some(options.width),
            options.label_line_height,
            metrics,
        )
    });
    let title_extent = title_block.as_ref().map(|block| block.height).unwrap_or(0.0);

    let request = MarginRequest {
        left_labels: &category_labels,
        left_font: Some(label_font),
        left_icon: None,
        right_labels: &category_labels,
        right_font: Some(label_font),
        top_extent: title_extent + label_font.size,
        bottom_extent: label_font.size,
    };
    let margins = compute_margins(&request, options, metrics);
    let (inner_width, inner_height) = inner_plot(options.width, options.height, &margins)?;

    let center = (
        margins.left + inner_width / 2.0,
        margins.top + inner_height / 2.0,
    );
    let max_radius = (inner_width.min(inner_height) / 2.0 - radial_cfg.label_gap).max(1.0);
    let hub_radius = max_radius * radial_cfg.inner_radius_ratio;
    let bar_room = max_radius - hub_radius;

    let max_value = frame.max_value();
    let scale = if max_value > 0.0 {
        bar_room / max_value as f32
    } else {
        0.0
    };

    let ring_count = radial_cfg.ring_count.max(1);
    let rings = (1..=ring_count)
        .map(|step| {
            let fraction = step as f32 / ring_count as f32;
            let radius = hub_radius + bar_room * fraction;
            let label = (max_value > 0.0).then(|| {
                let text = frame.y_field.format_value(max_value * fraction as f64);
                let block = measure_block(
                    &text,
                    annotation_font,
                    None,
                    options.label_line_height,
                    metrics,
                );
                PlacedBlock {
                    x: center.0,
                    y: center.1 - radius - 3.0,
                    block,
                    anchor: TextAnchor::Middle,
                    fill: style.text_color.clone(),
                    font: annotation_font.clone(),
                }
            });
            RingMark { radius, label }
        })
        .collect();

    let slot = PI * 2.0 / frame.rows.len() as f32;
    let gap = radial_cfg.spoke_gap_deg.to_radians().min(slot * 0.8);

    let mut spokes = Vec::with_capacity(frame.rows.len());
    for (index, row) in frame.rows.iter().enumerate() {
        let start_angle = -FRAC_PI_2 + index as f32 * slot + gap / 2.0;
        let end_angle = -FRAC_PI_2 + (index + 1) as f32 * slot - gap / 2.0;
        let mid = (start_angle + end_angle) / 2.0;
        let bar_length = row.value.max(0.0) as f32 * scale;
        let outer_radius = hub_radius + bar_length;
        let color = style.category_color(&row.category, index);

        let category_block = measure_block(
            &row.category,
            label_font,
            None,
            options.label_line_height,
            metrics,
        );
        let rim = max_radius + radial_cfg.label_gap;
        let anchor = rim_anchor(mid);
        let category_label = PlacedBlock {
            x: center.0 + rim * mid.cos(),
            y: centered_first_baseline(center.1 + rim * mid.sin(), &category_block, label_font),
            block: category_block,
            anchor,
            fill: style.text_color.clone(),
            font: label_font.clone(),
        };

        let value_text = frame.y_field.format_value(row.value);
        let fit = place_label(
            MarkBox {
                width: bar_length,
                height: slot * outer_radius,
            },
            &value_text,
            annotation_font,
            radial_cfg.label_gap,
            Some(bar_room - bar_length + radial_cfg.label_gap),
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
            LabelPosition::Inside => {
                let r = (outer_radius - radial_cfg.label_gap - value_block.width / 2.0)
                    .max(hub_radius);
                Some(PlacedBlock {
                    x: center.0 + r * mid.cos(),
                    y: centered_first_baseline(
                        center.1 + r * mid.sin(),
                        &value_block,
                        annotation_font,
                    ),
                    block: value_block,
                    anchor: TextAnchor::Middle,
                    fill: match fit.fill {
                        LabelFill::OnMark => style.on_mark_color(&color),
                        LabelFill::Ambient => style.text_color.clone(),
                    },
                    font: annotation_font.clone(),
                })
            }
            LabelPosition::Outside => {
                let r = outer_radius + radial_cfg.label_gap;
                Some(PlacedBlock {
                    x: center.0 + r * mid.cos(),
                    y: centered_first_baseline(
                        center.1 + r * mid.sin(),
                        &value_block,
                        annotation_font,
                    ),
                    block: value_block,
                    anchor: rim_anchor(mid),
                    fill: style.text_color.clone(),
                    font: annotation_font.clone(),
                })
            }
        };

        spokes.push(SpokeMark {
            start_angle,
            end_angle,
            inner_radius: hub_radius,
            outer_radius,
            color,
            category: row.category.clone(),
            value: row.value,
            category_label,
            value_label,
        });
    }

    let title = title_block.map(|block| PlacedBlock {
        x: center.0,
        y: style.title_font.size + 4.0,
        block,
        anchor: TextAnchor::Middle,
        fill: style.text_color.clone(),
        font: style.title_font.clone(),
    });

    Ok(Layout {
        width: options.width,
        height: options.height,
        chart: ChartData::Radial(RadialData {
            center,
            rings,
            spokes,
            title,
        }),
    })
}

/// Anchor for text placed on the rim at `angle`: labels to the right of the
/// hub read away from it, labels to the left read toward it, and labels
/// near 12/6 o'clock center on the spoke.
fn rim_anchor(angle: f32) -> TextAnchor {
    let cos = angle.cos();
    if cos > 0.25 {
        TextAnchor::Start
    } else if cos < -0.25 {
        TextAnchor::End
    } else {
        TextAnchor::Middle
    }
}
