use crate::config::{ChartOptions, MarginConfig};
use crate::error::ChartError;
use crate::style::FontSpec;
use crate::text_metrics::TextMetricsProvider;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Margins {
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
    pub left: f32,
}

/// What a chart wants space for around the plot. Sides the chart does not
/// use stay at their configured minimum.
#[derive(Debug, Default)]
pub struct MarginRequest<'a> {
    pub left_labels: &'a [String],
    pub left_font: Option<&'a FontSpec>,
    /// Icon edge length when the left label column carries category icons.
    pub left_icon: Option<f32>,
    pub right_labels: &'a [String],
    pub right_font: Option<&'a FontSpec>,
    /// Already-measured vertical extent above the plot (title, legend).
    pub top_extent: f32,
    /// Already-measured vertical extent below the plot (axis labels).
    pub bottom_extent: f32,
}

/// Widen margins to fit every label that will be drawn in them. Runs once
/// per render before any mark geometry, because the inner plot size depends
/// on the result. Explicit `margin_*` overrides win over the measurement.
pub fn compute_margins(
    request: &MarginRequest<'_>,
    options: &ChartOptions,
    metrics: &dyn TextMetricsProvider,
) -> Margins {
    let cfg = &options.margins;

    let left = side_extent(
        request.left_labels,
        request.left_font,
        request.left_icon,
        cfg,
        metrics,
    )
    .max(cfg.min_left);
    let right = side_extent(request.right_labels, request.right_font, None, cfg, metrics)
        .max(cfg.min_right);
    let top = if request.top_extent > 0.0 {
        request.top_extent + cfg.label_gap
    } else {
        0.0
    }
    .max(cfg.min_top);
    let bottom = if request.bottom_extent > 0.0 {
        request.bottom_extent + cfg.label_gap
    } else {
        0.0
    }
    .max(cfg.min_bottom);

    Margins {
        top: options.margin_top.unwrap_or(top),
        right: options.margin_right.unwrap_or(right),
        bottom: options.margin_bottom.unwrap_or(bottom),
        left: options.margin_left.unwrap_or(left),
    }
}

fn side_extent(
    labels: &[String],
    font: Option<&FontSpec>,
    icon: Option<f32>,
    cfg: &MarginConfig,
    metrics: &dyn TextMetricsProvider,
) -> f32 {
    let widest = match font {
        Some(font) => labels
            .iter()
            .map(|label| metrics.text_width(label, font))
            .fold(0.0, f32::max),
        None => 0.0,
    };
    let icon_extent = icon.map(|size| size + cfg.icon_gap).unwrap_or(0.0);
    if widest <= 0.0 && icon_extent <= 0.0 {
        return 0.0;
    }
    widest + icon_extent + cfg.label_gap
}

/// Inner plot size after margins. A non-positive result is the degenerate
/// layout case and aborts the render.
pub fn inner_plot(width: f32, height: f32, margins: &Margins) -> Result<(f32, f32), ChartError> {
    let inner_width = width - margins.left - margins.right;
    let inner_height = height - margins.top - margins.bottom;
    if inner_width <= 0.0 || inner_height <= 0.0 {
        return Err(ChartError::DegenerateLayout {
            inner_width,
            inner_height,
        });
    }
    Ok((inner_width, inner_height))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text_metrics::{HeuristicMetrics, TextMetricsProvider};

    fn font() -> FontSpec {
        FontSpec {
            family: "sans-serif".to_string(),
            size: 12.0,
            weight: "normal".to_string(),
        }
    }

    fn labels(texts: &[&str]) -> Vec<String> {
        texts.iter().map(|t| t.to_string()).collect()
    }

    #[test]
    fn longest_label_fits_inside_its_margin() {
        let spec = font();
        let left = labels(&["Alpha", "Beta", "A rather long category name"]);
        let options = ChartOptions::default();
        let request = MarginRequest {
            left_labels: &left,
            left_font: Some(&spec),
            ..Default::default()
        };
        let margins = compute_margins(&request, &options, &HeuristicMetrics);
        let widest = left
            .iter()
            .map(|label| HeuristicMetrics.text_width(label, &spec))
            .fold(0.0, f32::max);
        assert!(widest + options.margins.label_gap <= margins.left);
    }

    #[test]
    fn icons_widen_the_label_side() {
        let spec = font();
        let left = labels(&["Alpha"]);
        let options = ChartOptions::default();
        let without = compute_margins(
            &MarginRequest {
                left_labels: &left,
                left_font: Some(&spec),
                ..Default::default()
            },
            &options,
            &HeuristicMetrics,
        );
        let with = compute_margins(
            &MarginRequest {
                left_labels: &left,
                left_font: Some(&spec),
                left_icon: Some(20.0),
                ..Default::default()
            },
            &options,
            &HeuristicMetrics,
        );
        assert!(with.left >= without.left + 20.0);
    }

    #[test]
    fn unused_sides_stay_at_the_minimum() {
        let options = ChartOptions::default();
        let margins = compute_margins(&MarginRequest::default(), &options, &HeuristicMetrics);
        assert_eq!(margins.top, options.margins.min_top);
        assert_eq!(margins.right, options.margins.min_right);
        assert_eq!(margins.bottom, options.margins.min_bottom);
        assert_eq!(margins.left, options.margins.min_left);
    }

    #[test]
    fn explicit_overrides_beat_measurement() {
        let spec = font();
        let left = labels(&["A very very very long label indeed"]);
        let options = ChartOptions {
            margin_left: Some(30.0),
            ..Default::default()
        };
        let margins = compute_margins(
            &MarginRequest {
                left_labels: &left,
                left_font: Some(&spec),
                ..Default::default()
            },
            &options,
            &HeuristicMetrics,
        );
        assert_eq!(margins.left, 30.0);
    }

    #[test]
    fn degenerate_plot_is_reported() {
        let margins = Margins {
            top: 10.0,
            right: 300.0,
            bottom: 10.0,
            left: 400.0,
        };
        let err = inner_plot(640.0, 400.0, &margins).unwrap_err();
        assert!(matches!(err, ChartError::DegenerateLayout { .. }));
        assert!(inner_plot(800.0, 400.0, &margins).is_ok());
    }
}
