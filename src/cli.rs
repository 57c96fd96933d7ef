use crate::config::ChartOptions;
use crate::error::ChartError;
use crate::layout::compute_error_layout;
use crate::payload::{ChartKind, Payload, parse_payload};
use crate::render::{render_svg, write_output_svg};
use crate::style::{ColorMode, StyleResolution};
use crate::text_metrics::FontMetrics;
use anyhow::Result;
use clap::{Parser, ValueEnum};
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::str::FromStr;

#[derive(Parser, Debug)]
#[command(name = "chartcard", version, about = "Render a chart payload (JSON/JSON5) to SVG or PNG")]
pub struct Args {
    /// Input payload file or '-' for stdin
    #[arg(short = 'i', long = "input")]
    pub input: Option<PathBuf>,

    /// Output file (svg/png). Defaults to stdout for SVG if omitted.
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,

    /// Output format
    #[arg(short = 'f', long = "format", value_enum, default_value = "svg")]
    pub format: OutputFormat,

    /// Chart kind (bar, column, pie, donut, radial, treemap). Falls back to
    /// the payload's `variables.chart_type`.
    #[arg(short = 't', long = "chart")]
    pub chart: Option<String>,

    /// Use the payload's dark color tokens
    #[arg(long = "dark")]
    pub dark: bool,

    /// Override the payload's canvas width
    #[arg(short = 'w', long = "width")]
    pub width: Option<f32>,

    /// Override the payload's canvas height
    #[arg(short = 'H', long = "height")]
    pub height: Option<f32>,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum OutputFormat {
    Svg,
    Png,
}

pub fn run() -> Result<()> {
    #[cfg(feature = "telemetry")]
    crate::init_tracing();

    let args = Args::parse();
    let input = read_input(args.input.as_deref())?;

    match render_requested_chart(&args, &input) {
        Ok(svg) => write_rendered(&svg, &args),
        Err(err) => {
            // The placeholder card stands in for the chart so downstream
            // pipelines still receive an image; the exit code carries the
            // failure.
            let options = ChartOptions::default();
            let layout = compute_error_layout(&err.to_string(), &options, &FontMetrics);
            let style = StyleResolution::resolve(&Payload::default(), ColorMode::Light);
            let svg = render_svg(&layout, &style);
            write_rendered(&svg, &args)?;
            Err(err.into())
        }
    }
}

fn render_requested_chart(args: &Args, input: &str) -> Result<String, ChartError> {
    let mut payload = parse_payload(input)?;
    if let Some(width) = args.width {
        payload
            .variables
            .insert("width".to_string(), serde_json::json!(width));
    }
    if let Some(height) = args.height {
        payload
            .variables
            .insert("height".to_string(), serde_json::json!(height));
    }

    let kind = resolve_chart_kind(args.chart.as_deref(), &payload)?;
    let mode = if args.dark {
        ColorMode::Dark
    } else {
        ColorMode::Light
    };
    crate::render_chart_payload(kind, &payload, mode)
}

fn resolve_chart_kind(flag: Option<&str>, payload: &Payload) -> Result<ChartKind, ChartError> {
    if let Some(token) = flag {
        return ChartKind::from_str(token);
    }
    match payload
        .variables
        .get("chart_type")
        .and_then(|value| value.as_str())
    {
        Some(token) => ChartKind::from_str(token),
        None => Err(ChartError::config(
            "no chart kind: pass --chart or set variables.chart_type",
        )),
    }
}

fn write_rendered(svg: &str, args: &Args) -> Result<()> {
    match args.format {
        OutputFormat::Svg => write_output_svg(svg, args.output.as_deref()),
        OutputFormat::Png => {
            #[cfg(feature = "png")]
            {
                let output = args
                    .output
                    .as_deref()
                    .ok_or_else(|| anyhow::anyhow!("Output path required for png output"))?;
                crate::render::write_output_png(svg, output)
            }
            #[cfg(not(feature = "png"))]
            {
                Err(anyhow::anyhow!(
                    "png output requires the `png` feature"
                ))
            }
        }
    }
}

fn read_input(path: Option<&Path>) -> Result<String> {
    if let Some(path) = path
        && path != Path::new("-")
    {
        return Ok(std::fs::read_to_string(path)?);
    }
    let mut buf = String::new();
    io::stdin().read_to_string(&mut buf)?;
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn payload_with(variables: serde_json::Value) -> Payload {
        parse_payload(&json!({ "variables": variables }).to_string()).unwrap()
    }

    #[test]
    fn chart_flag_wins_over_payload_variables() {
        let payload = payload_with(json!({ "chart_type": "pie" }));
        let kind = resolve_chart_kind(Some("bar"), &payload).unwrap();
        assert_eq!(kind, ChartKind::Bar);
    }

    #[test]
    fn payload_chart_type_is_the_fallback() {
        let payload = payload_with(json!({ "chart_type": "treemap" }));
        let kind = resolve_chart_kind(None, &payload).unwrap();
        assert_eq!(kind, ChartKind::Treemap);
    }

    #[test]
    fn missing_chart_kind_is_reported() {
        let payload = payload_with(json!({}));
        assert!(resolve_chart_kind(None, &payload).is_err());
    }
}
