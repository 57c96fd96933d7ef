use crate::config::ChartOptions;
use crate::payload::FontToken;
use crate::style::FontSpec;
use crate::text_metrics::TextMetricsProvider;

use super::fit::TextAnchor;
use super::text::measure_block;
use super::{ChartData, Layout, PlacedBlock};

/// Fixed-size placeholder card carrying the failure text, so a pipeline
/// that expects an image always gets one.
#[derive(Debug, Clone)]
pub struct ErrorData {
    pub heading: PlacedBlock,
    pub message: PlacedBlock,
}

pub fn compute_error_layout(
    message: &str,
    options: &ChartOptions,
    metrics: &dyn TextMetricsProvider,
) -> Layout {
    let cfg = &options.error_card;
    let width = cfg.width.max(1.0);
    let height = cfg.height.max(1.0);

    let heading_font = FontSpec {
        family: FontToken::default().font_family,
        size: cfg.text_size + 2.0,
        weight: "bold".to_string(),
    };
    let body_font = FontSpec {
        family: heading_font.family.clone(),
        size: cfg.text_size,
        weight: "normal".to_string(),
    };

    let heading_block = measure_block(
        &cfg.heading,
        &heading_font,
        Some(width - cfg.pad * 2.0),
        options.label_line_height,
        metrics,
    );
    let message_block = measure_block(
        message,
        &body_font,
        Some(width - cfg.pad * 2.0),
        options.label_line_height,
        metrics,
    );

    let heading_y = cfg.pad + heading_font.size;
    let heading = PlacedBlock {
        x: cfg.pad,
        y: heading_y,
        block: heading_block,
        anchor: TextAnchor::Start,
        fill: "#B3261E".to_string(),
        font: heading_font,
    };
    let message = PlacedBlock {
        x: cfg.pad,
        y: heading_y + heading.block.height + body_font.size,
        block: message_block,
        anchor: TextAnchor::Start,
        fill: "#44474F".to_string(),
        font: body_font,
    };

    Layout {
        width,
        height,
        chart: ChartData::Error(ErrorData { heading, message }),
    }
}
