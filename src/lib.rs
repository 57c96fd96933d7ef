//! Data-card chart renderer: a JSON payload of tabular records, field-role
//! mappings and style tokens in, a standalone SVG document out.

#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod error;
pub mod layout;
pub mod payload;
pub mod render;
pub mod style;
pub mod text_metrics;

pub use config::ChartOptions;
pub use error::ChartError;
pub use payload::{ChartKind, DataFrame, Payload, parse_payload};
pub use style::{ColorMode, StyleResolution};
pub use text_metrics::{FontMetrics, HeuristicMetrics, TextMetricsProvider};

#[cfg(feature = "cli")]
pub use cli::run;

/// Render one chart from a raw payload string. The whole pipeline in one
/// call: parse, validate roles, resolve style, lay out, emit SVG.
pub fn render_chart(
    kind: ChartKind,
    payload_json: &str,
    mode: ColorMode,
) -> Result<String, ChartError> {
    let payload = parse_payload(payload_json)?;
    render_chart_payload(kind, &payload, mode)
}

/// Render an already-parsed payload with glyph-accurate text metrics.
pub fn render_chart_payload(
    kind: ChartKind,
    payload: &Payload,
    mode: ColorMode,
) -> Result<String, ChartError> {
    render_chart_with_metrics(kind, payload, mode, &FontMetrics)
}

/// Render with an injected metrics provider. Headless tests pass
/// [`HeuristicMetrics`] here and get deterministic output on any host.
pub fn render_chart_with_metrics(
    kind: ChartKind,
    payload: &Payload,
    mode: ColorMode,
    metrics: &dyn TextMetricsProvider,
) -> Result<String, ChartError> {
    let frame = DataFrame::from_payload(payload)?;
    let style = StyleResolution::resolve(payload, mode);
    let options = ChartOptions::from_variables(&payload.variables);
    let layout = layout::compute_layout(kind, &frame, &style, &options, metrics)?;
    Ok(render::render_svg(&layout, &style))
}

/// Placeholder SVG carrying a failure message, for callers that must show
/// an image even when the payload cannot be drawn.
pub fn render_error_svg(message: &str) -> String {
    let options = ChartOptions::default();
    let layout = layout::compute_error_layout(message, &options, &FontMetrics);
    let style = StyleResolution::resolve(&Payload::default(), ColorMode::Light);
    render::render_svg(&layout, &style)
}

#[cfg(feature = "telemetry")]
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .try_init();
}
