use std::cmp::Ordering;
use std::f32::consts::{FRAC_PI_2, PI};

use crate::config::ChartOptions;
use crate::error::ChartError;
use crate::payload::DataFrame;
use crate::style::StyleResolution;
use crate::text_metrics::TextMetricsProvider;

use super::fit::TextAnchor;
use super::margins::{MarginRequest, compute_margins, inner_plot};
use super::text::measure_block;
use super::{ChartData, Layout, LegendItem, PlacedBlock, centered_first_baseline};

#[derive(Debug, Clone)]
pub struct PieData {
    pub center: (f32, f32),
    pub radius: f32,
    pub inner_radius: f32,
    pub slices: Vec<SliceMark>,
    pub legend: Vec<LegendItem>,
    pub title: Option<PlacedBlock>,
}

#[derive(Debug, Clone)]
pub struct SliceMark {
    pub start_angle: f32,
    pub end_angle: f32,
    pub color: String,
    pub category: String,
    pub value: f64,
    pub label: Option<PlacedBlock>,
    /// Polyline from the slice rim to an outside label.
    pub leader: Option<Vec<(f32, f32)>>,
}

struct SliceDatum {
    index: usize,
    category: String,
    value: f64,
}

/// Pie (or donut, when `donut_ratio` > 0) with a right-hand legend. Slices
/// run clockwise from 12 o'clock, largest first; slices under `min_percent`
/// merge into a single trailing "Other" slice.
pub(super) fn compute_pie_layout(
    frame: &DataFrame,
    style: &StyleResolution,
    options: &ChartOptions,
    metrics: &dyn TextMetricsProvider,
) -> Result<Layout, ChartError> {
    let pie_cfg = &options.pie;
    let label_font = &style.label_font;
    let annotation_font = &style.annotation_font;

    let total: f64 = frame.rows.iter().map(|row| row.value.max(0.0)).sum();
    if total <= 0.0 {
        return Err(ChartError::config(
            "pie requires at least one positive value",
        ));
    }

    let mut data: Vec<SliceDatum> = Vec::new();
    let mut other_total = 0.0f64;
    for (index, row) in frame.rows.iter().enumerate() {
        let value = row.value.max(0.0);
        let percent = value / total * 100.0;
        if percent >= pie_cfg.min_percent as f64 {
            data.push(SliceDatum {
                index,
                category: row.category.clone(),
                value,
            });
        } else {
            other_total += value;
        }
    }
    data.sort_by(|a, b| {
        b.value
            .partial_cmp(&a.value)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.index.cmp(&b.index))
    });
    if other_total > 0.0 {
        data.push(SliceDatum {
            index: usize::MAX,
            category: pie_cfg.other_label.clone(),
            value: other_total,
        });
    }

    let title_block = options.title.as_deref().map(|title| {
        measure_block(
            title,
            &style.title_font,
            Some(options.width),
            options.label_line_height,
            metrics,
        )
    });

    let legend_labels: Vec<String> = data
        .iter()
        .map(|datum| format!("{} [{}]", datum.category, frame.y_field.format_value(datum.value)))
        .collect();

    let request = MarginRequest {
        right_labels: &legend_labels,
        right_font: Some(label_font),
        top_extent: title_block.as_ref().map(|block| block.height).unwrap_or(0.0),
        ..Default::default()
    };
    let mut margins = compute_margins(&request, options, metrics);
    if options.margin_right.is_none() {
        margins.right += pie_cfg.legend_rect_size + pie_cfg.legend_spacing;
    }
    let (inner_width, inner_height) = inner_plot(options.width, options.height, &margins)?;

    let center = (
        margins.left + inner_width / 2.0,
        margins.top + inner_height / 2.0,
    );
    let radius = (inner_width.min(inner_height) / 2.0 - pie_cfg.pad).max(1.0);
    let inner_radius = radius * pie_cfg.donut_ratio;

    let slice_color = |datum: &SliceDatum, position: usize| {
        if datum.index == usize::MAX {
            style.secondary.clone()
        } else {
            style.category_color(&datum.category, position)
        }
    };

    let mut slices = Vec::with_capacity(data.len());
    let mut angle = -FRAC_PI_2;
    for (position, datum) in data.iter().enumerate() {
        let span = (datum.value / total) as f32 * PI * 2.0;
        let start_angle = angle;
        let end_angle = angle + span;
        angle = end_angle;
        let mid = (start_angle + end_angle) / 2.0;
        let color = slice_color(datum, position);

        let percent_text = format!("{:.0}%", datum.value / total * 100.0);
        let block = measure_block(
            &percent_text,
            annotation_font,
            None,
            options.label_line_height,
            metrics,
        );

        let label_radius = inner_radius + (radius - inner_radius) * pie_cfg.label_radius_ratio;
        // Chord across the slice at the label radius; a slice wider than a
        // half turn has the full diameter available.
        let chord = if span >= PI {
            2.0 * label_radius
        } else {
            2.0 * label_radius * (span / 2.0).sin()
        };
        let radial_room = radius - inner_radius;
        let fits_inside = block.width + 4.0 <= chord && block.height <= radial_room;

        let (label, leader) = if fits_inside {
            let x = center.0 + label_radius * mid.cos();
            let y = center.1 + label_radius * mid.sin();
            (
                Some(PlacedBlock {
                    x,
                    y: centered_first_baseline(y, &block, annotation_font),
                    block,
                    anchor: TextAnchor::Middle,
                    fill: style.on_mark_color(&color),
                    font: annotation_font.clone(),
                }),
                None,
            )
        } else {
            let rim = (
                center.0 + radius * mid.cos(),
                center.1 + radius * mid.sin(),
            );
            let elbow = (
                center.0 + (radius + pie_cfg.leader_extend) * mid.cos(),
                center.1 + (radius + pie_cfg.leader_extend) * mid.sin(),
            );
            let rightward = mid.cos() >= 0.0;
            let tail_x = if rightward { elbow.0 + 6.0 } else { elbow.0 - 6.0 };
            let anchor = if rightward {
                TextAnchor::Start
            } else {
                TextAnchor::End
            };
            (
                Some(PlacedBlock {
                    x: tail_x + if rightward { 3.0 } else { -3.0 },
                    y: centered_first_baseline(elbow.1, &block, annotation_font),
                    block,
                    anchor,
                    fill: style.text_color.clone(),
                    font: annotation_font.clone(),
                }),
                Some(vec![rim, elbow, (tail_x, elbow.1)]),
            )
        };

        slices.push(SliceMark {
            start_angle,
            end_angle,
            color,
            category: datum.category.clone(),
            value: datum.value,
            label,
            leader,
        });
    }

    let legend_row = pie_cfg.legend_rect_size + pie_cfg.legend_spacing;
    let legend_height = legend_row * data.len() as f32;
    let legend_x = options.width - margins.right + pie_cfg.legend_spacing;
    let legend_top = center.1 - legend_height / 2.0;
    let legend = data
        .iter()
        .zip(&legend_labels)
        .enumerate()
        .map(|(position, (datum, text))| {
            let y = legend_top + position as f32 * legend_row;
            let block =
                measure_block(text, label_font, None, options.label_line_height, metrics);
            LegendItem {
                x: legend_x,
                y,
                marker_size: pie_cfg.legend_rect_size,
                color: slice_color(datum, position),
                label: PlacedBlock {
                    x: legend_x + pie_cfg.legend_rect_size + pie_cfg.legend_spacing,
                    y: centered_first_baseline(
                        y + pie_cfg.legend_rect_size / 2.0,
                        &block,
                        label_font,
                    ),
                    block,
                    anchor: TextAnchor::Start,
                    fill: style.text_color.clone(),
                    font: label_font.clone(),
                },
            }
        })
        .collect();

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
        chart: ChartData::Pie(PieData {
            center,
            radius,
            inner_radius,
            slices,
            legend,
            title,
        }),
    })
}
