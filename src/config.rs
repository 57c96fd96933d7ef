use serde::{Deserialize, Serialize};

/// Per-render options: canvas size, margin overrides and the per-chart
/// tuning knobs. Everything has a default; `from_variables` overlays the
/// recognized keys of the payload's `variables` map.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChartOptions {
    pub width: f32,
    pub height: f32,
    pub title: Option<String>,
    pub margin_top: Option<f32>,
    pub margin_right: Option<f32>,
    pub margin_bottom: Option<f32>,
    pub margin_left: Option<f32>,
    pub label_line_height: f32,
    pub tick_count: usize,
    pub corner_radius: f32,
    pub margins: MarginConfig,
    pub bar: BarConfig,
    pub column: ColumnConfig,
    pub pie: PieConfig,
    pub radial: RadialConfig,
    pub treemap: TreemapConfig,
    pub error_card: ErrorCardConfig,
}

impl Default for ChartOptions {
    fn default() -> Self {
        Self {
            width: 640.0,
            height: 400.0,
            title: None,
            margin_top: None,
            margin_right: None,
            margin_bottom: None,
            margin_left: None,
            label_line_height: 1.25,
            tick_count: 5,
            corner_radius: 3.0,
            margins: MarginConfig::default(),
            bar: BarConfig::default(),
            column: ColumnConfig::default(),
            pie: PieConfig::default(),
            radial: RadialConfig::default(),
            treemap: TreemapConfig::default(),
            error_card: ErrorCardConfig::default(),
        }
    }
}

impl ChartOptions {
    /// Overlay the recognized `variables` keys onto the defaults. Unknown
    /// keys are ignored so payloads can carry chart-specific extras.
    pub fn from_variables(variables: &serde_json::Map<String, serde_json::Value>) -> Self {
        let mut options = Self::default();
        let number = |key: &str| variables.get(key).and_then(|value| value.as_f64());

        if let Some(value) = variables.get("title").and_then(|value| value.as_str()) {
            if !value.trim().is_empty() {
                options.title = Some(value.trim().to_string());
            }
        }
        if let Some(value) = number("width") {
            options.width = value as f32;
        }
        if let Some(value) = number("height") {
            options.height = value as f32;
        }
        if let Some(value) = number("margin_top") {
            options.margin_top = Some(value as f32);
        }
        if let Some(value) = number("margin_right") {
            options.margin_right = Some(value as f32);
        }
        if let Some(value) = number("margin_bottom") {
            options.margin_bottom = Some(value as f32);
        }
        if let Some(value) = number("margin_left") {
            options.margin_left = Some(value as f32);
        }
        if let Some(value) = number("tick_count") {
            options.tick_count = (value.max(1.0) as usize).min(20);
        }
        if let Some(value) = number("corner_radius") {
            options.corner_radius = (value as f32).max(0.0);
        }
        if let Some(value) = number("bar_gap_ratio") {
            let ratio = (value as f32).clamp(0.0, 0.9);
            options.bar.band_gap_ratio = ratio;
            options.column.band_gap_ratio = ratio;
        }
        if let Some(value) = number("donut_ratio") {
            options.pie.donut_ratio = (value as f32).clamp(0.0, 0.95);
        }
        if let Some(value) = number("min_percent") {
            options.pie.min_percent = (value as f32).max(0.0);
        }
        if let Some(value) = number("inner_radius_ratio") {
            options.radial.inner_radius_ratio = (value as f32).clamp(0.0, 0.9);
        }
        options
    }
}

/// Minimum margins and the padding constants the auto-sizer adds on top of
/// measured label widths.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarginConfig {
    pub min_top: f32,
    pub min_right: f32,
    pub min_bottom: f32,
    pub min_left: f32,
    pub label_gap: f32,
    pub icon_gap: f32,
}

impl Default for MarginConfig {
    fn default() -> Self {
        Self {
            min_top: 16.0,
            min_right: 16.0,
            min_bottom: 16.0,
            min_left: 16.0,
            label_gap: 8.0,
            icon_gap: 6.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BarConfig {
    pub band_gap_ratio: f32,
    pub label_pad: f32,
    pub icon_size: f32,
    pub min_band: f32,
}

impl Default for BarConfig {
    fn default() -> Self {
        Self {
            band_gap_ratio: 0.28,
            label_pad: 6.0,
            icon_size: 20.0,
            min_band: 4.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnConfig {
    pub band_gap_ratio: f32,
    pub label_pad: f32,
    pub tick_gap: f32,
    pub axis_label_gap: f32,
}

impl Default for ColumnConfig {
    fn default() -> Self {
        Self {
            band_gap_ratio: 0.25,
            label_pad: 5.0,
            tick_gap: 8.0,
            axis_label_gap: 10.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PieConfig {
    pub donut_ratio: f32,
    pub min_percent: f32,
    pub label_radius_ratio: f32,
    pub leader_extend: f32,
    pub legend_rect_size: f32,
    pub legend_spacing: f32,
    pub pad: f32,
    pub other_label: String,
}

impl Default for PieConfig {
    fn default() -> Self {
        Self {
            donut_ratio: 0.0,
            min_percent: 1.0,
            label_radius_ratio: 0.62,
            leader_extend: 14.0,
            legend_rect_size: 12.0,
            legend_spacing: 6.0,
            pad: 12.0,
            other_label: "Other".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RadialConfig {
    pub inner_radius_ratio: f32,
    pub spoke_gap_deg: f32,
    pub ring_count: usize,
    pub label_gap: f32,
    pub legend_rect_size: f32,
    pub legend_spacing: f32,
}

impl Default for RadialConfig {
    fn default() -> Self {
        Self {
            inner_radius_ratio: 0.22,
            spoke_gap_deg: 4.0,
            ring_count: 4,
            label_gap: 6.0,
            legend_rect_size: 11.0,
            legend_spacing: 8.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreemapConfig {
    pub padding: f32,
    pub gap: f32,
    pub label_padding_x: f32,
    pub label_padding_y: f32,
    pub min_label_area: f32,
}

impl Default for TreemapConfig {
    fn default() -> Self {
        Self {
            padding: 8.0,
            gap: 2.0,
            label_padding_x: 6.0,
            label_padding_y: 4.0,
            min_label_area: 900.0,
        }
    }
}

/// Fixed-size placeholder card rendered in place of a chart when the
/// payload cannot be drawn.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorCardConfig {
    pub width: f32,
    pub height: f32,
    pub pad: f32,
    pub text_size: f32,
    pub heading: String,
}

impl Default for ErrorCardConfig {
    fn default() -> Self {
        Self {
            width: 420.0,
            height: 140.0,
            pad: 18.0,
            text_size: 13.0,
            heading: "Chart could not be rendered".to_string(),
        }
    }
}
