use std::path::{Path, PathBuf};
use std::str::FromStr;

use chartcard::{
    ChartError, ChartKind, ColorMode, HeuristicMetrics, parse_payload, render_chart_payload,
    render_chart_with_metrics, render_error_svg,
};

fn fixture_path(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn render_fixture(name: &str) -> Result<String, ChartError> {
    let input = std::fs::read_to_string(fixture_path(name)).expect("fixture read failed");
    let payload = parse_payload(&input)?;
    let kind_token = payload
        .variables
        .get("chart_type")
        .and_then(|value| value.as_str())
        .expect("fixture without chart_type");
    let kind = ChartKind::from_str(kind_token)?;
    render_chart_with_metrics(kind, &payload, ColorMode::Light, &HeuristicMetrics)
}

fn assert_valid_svg(svg: &str, fixture: &str) {
    assert!(svg.contains("<svg"), "{fixture}: missing <svg tag");
    assert!(svg.contains("</svg>"), "{fixture}: missing </svg tag");
    assert!(!svg.contains("NaN"), "{fixture}: NaN leaked into the SVG");
    assert!(!svg.contains("inf"), "{fixture}: infinity leaked into the SVG");
}

#[test]
fn render_all_fixtures() {
    // Keep this list explicit so new chart kinds must be added intentionally.
    let candidates = [
        ("bar.json", "Chrome"),
        ("column.json", "Q1 2025"),
        ("pie.json", "Organic search"),
        ("donut.json5", "Closed won"),
        ("radial.json", "Kubernetes"),
        ("treemap.json", "TypeScript"),
    ];

    for (fixture, expected_label) in candidates {
        let svg = render_fixture(fixture).unwrap_or_else(|err| panic!("{fixture}: {err}"));
        assert_valid_svg(&svg, fixture);
        assert!(
            svg.contains(expected_label),
            "{fixture}: expected label {expected_label:?} in output"
        );
    }
}

#[test]
fn missing_role_fixture_is_a_configuration_error() {
    let err = render_fixture("missing_role.json").unwrap_err();
    assert!(matches!(err, ChartError::Configuration { .. }), "got {err}");
    assert!(err.to_string().contains("role"));
}

#[test]
fn tiny_canvas_fixture_degenerates_cleanly() {
    let err = render_fixture("tiny_canvas.json").unwrap_err();
    assert!(matches!(err, ChartError::DegenerateLayout { .. }), "got {err}");
}

#[test]
fn identical_payloads_render_byte_identical_svg() {
    for fixture in ["bar.json", "pie.json", "treemap.json"] {
        let first = render_fixture(fixture).unwrap();
        let second = render_fixture(fixture).unwrap();
        assert_eq!(first, second, "{fixture}: render is not idempotent");
    }
}

#[test]
fn dark_mode_swaps_the_background() {
    let input = std::fs::read_to_string(fixture_path("bar.json")).unwrap();
    let payload = parse_payload(&input).unwrap();
    let light =
        render_chart_with_metrics(ChartKind::Bar, &payload, ColorMode::Light, &HeuristicMetrics)
            .unwrap();
    let dark =
        render_chart_with_metrics(ChartKind::Bar, &payload, ColorMode::Dark, &HeuristicMetrics)
            .unwrap();
    assert!(light.contains("#FFFFFF"));
    assert!(dark.contains("#101418"));
    assert!(dark.contains("#E8ECF2"));
}

#[test]
fn icons_are_emitted_for_configured_categories_only() {
    let svg = render_fixture("bar.json").unwrap();
    assert!(svg.contains("icons/chrome.svg"));
    assert!(svg.contains("icons/safari.svg"));
    assert_eq!(svg.matches("<image").count(), 2, "Edge/Firefox/Opera have no icon");
}

#[test]
fn error_placeholder_carries_the_message() {
    let svg = render_error_svg("configuration error: no column with role \"y\"");
    assert!(svg.contains("<svg"));
    assert!(svg.contains("Chart could not be rendered"));
    assert!(svg.contains("role"));
}

#[test]
fn glyph_metrics_pipeline_also_renders() {
    // Same payload through the default (font-backed) provider; on hosts
    // without fonts this exercises the heuristic fallback path instead.
    let input = std::fs::read_to_string(fixture_path("bar.json")).unwrap();
    let payload = parse_payload(&input).unwrap();
    let svg = render_chart_payload(ChartKind::Bar, &payload, ColorMode::Light).unwrap();
    assert_valid_svg(&svg, "bar.json via FontMetrics");
}
