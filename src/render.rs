use crate::layout::bar::BarData;
use crate::layout::column::ColumnData;
use crate::layout::error::ErrorData;
use crate::layout::pie::PieData;
use crate::layout::radial::RadialData;
use crate::layout::treemap::TreemapData;
use crate::layout::{ChartData, Layout, LegendItem, PlacedBlock};
use crate::style::StyleResolution;
use anyhow::Result;
use std::f32::consts::PI;
use std::fmt::Write as _;
use std::path::Path;

/// Serialize a computed layout into a standalone SVG document. Pure
/// function of its inputs: identical layout and style give byte-identical
/// output.
pub fn render_svg(layout: &Layout, style: &StyleResolution) -> String {
    let width = layout.width;
    let height = layout.height;
    let mut svg = String::new();
    let _ = write!(
        svg,
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{width}\" height=\"{height}\" viewBox=\"0 0 {width} {height}\">",
    );
    let background = match &layout.chart {
        ChartData::Error(_) => "#FFFFFF".to_string(),
        _ => style.background.clone(),
    };
    let _ = write!(
        svg,
        "<rect width=\"100%\" height=\"100%\" fill=\"{}\"/>",
        escape_xml(&background)
    );

    match &layout.chart {
        ChartData::Bar(data) => render_bar(&mut svg, data, style),
        ChartData::Column(data) => render_column(&mut svg, data, style),
        ChartData::Pie(data) => render_pie(&mut svg, data, style),
        ChartData::Radial(data) => render_radial(&mut svg, data, style),
        ChartData::Treemap(data) => render_treemap(&mut svg, data, style),
        ChartData::Error(data) => render_error(&mut svg, data),
    }

    svg.push_str("</svg>");
    svg
}

fn render_bar(svg: &mut String, data: &BarData, style: &StyleResolution) {
    if let Some(title) = &data.title {
        svg.push_str(&placed_text(title));
    }
    for bar in &data.bars {
        if bar.width > 0.0 {
            let _ = write!(
                svg,
                "<rect x=\"{:.2}\" y=\"{:.2}\" width=\"{:.2}\" height=\"{:.2}\" rx=\"{:.2}\" fill=\"{}\"/>",
                bar.x,
                bar.y,
                bar.width,
                bar.height,
                bar.corner_radius,
                escape_xml(&bar.color)
            );
        }
        if let Some(target_x) = bar.target_x {
            let _ = write!(
                svg,
                "<line x1=\"{target_x:.2}\" y1=\"{:.2}\" x2=\"{target_x:.2}\" y2=\"{:.2}\" stroke=\"{}\" stroke-width=\"2\"/>",
                bar.y - 2.0,
                bar.y + bar.height + 2.0,
                escape_xml(&style.text_color)
            );
        }
        if let Some(icon) = &bar.icon {
            let _ = write!(
                svg,
                "<image x=\"{:.2}\" y=\"{:.2}\" width=\"{:.2}\" height=\"{:.2}\" href=\"{}\"/>",
                icon.x,
                icon.y,
                icon.size,
                icon.size,
                escape_xml(&icon.url)
            );
        }
        svg.push_str(&placed_text(&bar.category));
        if let Some(label) = &bar.value_label {
            svg.push_str(&placed_text(label));
        }
    }
}

fn render_column(svg: &mut String, data: &ColumnData, style: &StyleResolution) {
    if let Some(title) = &data.title {
        svg.push_str(&placed_text(title));
    }
    for tick in &data.ticks {
        let _ = write!(
            svg,
            "<line x1=\"{:.2}\" y1=\"{:.2}\" x2=\"{:.2}\" y2=\"{:.2}\" stroke=\"{}\" stroke-opacity=\"0.15\"/>",
            data.plot.x,
            tick.y,
            data.plot.x + data.plot.width,
            tick.y,
            escape_xml(&style.text_color)
        );
        svg.push_str(&placed_text(&tick.label));
    }
    for column in &data.columns {
        if column.height > 0.0 {
            let _ = write!(
                svg,
                "<rect x=\"{:.2}\" y=\"{:.2}\" width=\"{:.2}\" height=\"{:.2}\" rx=\"{:.2}\" fill=\"{}\"/>",
                column.x,
                column.y,
                column.width,
                column.height,
                column.corner_radius,
                escape_xml(&column.color)
            );
        }
        svg.push_str(&placed_text(&column.category));
        if let Some(label) = &column.value_label {
            svg.push_str(&placed_text(label));
        }
    }
}

fn render_pie(svg: &mut String, data: &PieData, style: &StyleResolution) {
    if let Some(title) = &data.title {
        svg.push_str(&placed_text(title));
    }
    let (cx, cy) = data.center;
    for slice in &data.slices {
        let path = annular_slice_path(
            cx,
            cy,
            data.radius,
            data.inner_radius,
            slice.start_angle,
            slice.end_angle,
        );
        let _ = write!(
            svg,
            "<path d=\"{}\" fill=\"{}\" fill-rule=\"evenodd\" stroke=\"{}\" stroke-width=\"1\"/>",
            path,
            escape_xml(&slice.color),
            escape_xml(&style.background)
        );
        if let Some(leader) = &slice.leader {
            let points: Vec<String> = leader
                .iter()
                .map(|(x, y)| format!("{x:.2},{y:.2}"))
                .collect();
            let _ = write!(
                svg,
                "<polyline points=\"{}\" fill=\"none\" stroke=\"{}\" stroke-opacity=\"0.6\"/>",
                points.join(" "),
                escape_xml(&style.text_color)
            );
        }
        if let Some(label) = &slice.label {
            svg.push_str(&placed_text(label));
        }
    }
    render_legend(svg, &data.legend);
}

fn render_radial(svg: &mut String, data: &RadialData, style: &StyleResolution) {
    if let Some(title) = &data.title {
        svg.push_str(&placed_text(title));
    }
    let (cx, cy) = data.center;
    for ring in &data.rings {
        let _ = write!(
            svg,
            "<circle cx=\"{cx:.2}\" cy=\"{cy:.2}\" r=\"{:.2}\" fill=\"none\" stroke=\"{}\" stroke-opacity=\"0.15\"/>",
            ring.radius,
            escape_xml(&style.text_color)
        );
        if let Some(label) = &ring.label {
            svg.push_str(&placed_text(label));
        }
    }
    for spoke in &data.spokes {
        if spoke.outer_radius > spoke.inner_radius {
            let path = annular_slice_path(
                cx,
                cy,
                spoke.outer_radius,
                spoke.inner_radius,
                spoke.start_angle,
                spoke.end_angle,
            );
            let _ = write!(
                svg,
                "<path d=\"{}\" fill=\"{}\" fill-rule=\"evenodd\"/>",
                path,
                escape_xml(&spoke.color)
            );
        }
        svg.push_str(&placed_text(&spoke.category_label));
        if let Some(label) = &spoke.value_label {
            svg.push_str(&placed_text(label));
        }
    }
}

fn render_treemap(svg: &mut String, data: &TreemapData, style: &StyleResolution) {
    for cell in &data.cells {
        if cell.width <= 0.0 || cell.height <= 0.0 {
            continue;
        }
        if cell.value.is_some() {
            let _ = write!(
                svg,
                "<rect x=\"{:.2}\" y=\"{:.2}\" width=\"{:.2}\" height=\"{:.2}\" fill=\"{}\" stroke=\"{}\" stroke-width=\"1\"/>",
                cell.x,
                cell.y,
                cell.width,
                cell.height,
                escape_xml(&cell.color),
                escape_xml(&style.background)
            );
        } else {
            let _ = write!(
                svg,
                "<rect x=\"{:.2}\" y=\"{:.2}\" width=\"{:.2}\" height=\"{:.2}\" fill=\"{}\" fill-opacity=\"0.18\" stroke=\"{}\" stroke-width=\"1\"/>",
                cell.x,
                cell.y,
                cell.width,
                cell.height,
                escape_xml(&cell.color),
                escape_xml(&cell.color)
            );
        }
        if let Some(label) = &cell.label {
            svg.push_str(&placed_text(label));
        }
    }
}

fn render_error(svg: &mut String, data: &ErrorData) {
    svg.push_str(
        "<rect x=\"0.5\" y=\"0.5\" width=\"99.8%\" height=\"99.6%\" rx=\"8\" fill=\"none\" stroke=\"#B3261E\" stroke-width=\"1\"/>",
    );
    svg.push_str(&placed_text(&data.heading));
    svg.push_str(&placed_text(&data.message));
}

fn render_legend(svg: &mut String, legend: &[LegendItem]) {
    for item in legend {
        let _ = write!(
            svg,
            "<rect x=\"{:.2}\" y=\"{:.2}\" width=\"{:.2}\" height=\"{:.2}\" rx=\"2\" fill=\"{}\"/>",
            item.x,
            item.y,
            item.marker_size,
            item.marker_size,
            escape_xml(&item.color)
        );
        svg.push_str(&placed_text(&item.label));
    }
}

/// One `<text>` element per placed block; extra lines become `tspan`s one
/// line-height below the previous.
fn placed_text(placed: &PlacedBlock) -> String {
    let dy = placed.block.height / placed.block.lines.len().max(1) as f32;
    let mut text = format!(
        "<text x=\"{:.2}\" y=\"{:.2}\" text-anchor=\"{}\" font-family=\"{}\" font-size=\"{}\" font-weight=\"{}\" fill=\"{}\">",
        placed.x,
        placed.y,
        placed.anchor.as_svg(),
        escape_xml(&placed.font.family),
        placed.font.size,
        escape_xml(&placed.font.weight),
        escape_xml(&placed.fill)
    );
    for (index, line) in placed.block.lines.iter().enumerate() {
        if index == 0 {
            let _ = write!(
                text,
                "<tspan x=\"{:.2}\" dy=\"0\">{}</tspan>",
                placed.x,
                escape_xml(line)
            );
        } else {
            let _ = write!(
                text,
                "<tspan x=\"{:.2}\" dy=\"{:.2}\">{}</tspan>",
                placed.x,
                dy,
                escape_xml(line)
            );
        }
    }
    text.push_str("</text>");
    text
}

/// Path for a pie/radial sector between two radii. Handles the full-turn
/// case, which the two-arc form cannot express.
fn annular_slice_path(
    cx: f32,
    cy: f32,
    r_outer: f32,
    r_inner: f32,
    start_angle: f32,
    end_angle: f32,
) -> String {
    let span = end_angle - start_angle;
    let point = |radius: f32, angle: f32| (cx + radius * angle.cos(), cy + radius * angle.sin());

    if span >= PI * 2.0 - 1e-4 {
        let mut path = full_circle_path(cx, cy, r_outer);
        if r_inner > 0.0 {
            path.push(' ');
            path.push_str(&full_circle_path(cx, cy, r_inner));
        }
        return path;
    }

    let large = if span > PI { 1 } else { 0 };
    let (x0, y0) = point(r_outer, start_angle);
    let (x1, y1) = point(r_outer, end_angle);
    if r_inner <= 0.0 {
        format!(
            "M {cx:.2} {cy:.2} L {x0:.2} {y0:.2} A {r_outer:.2} {r_outer:.2} 0 {large} 1 {x1:.2} {y1:.2} Z"
        )
    } else {
        let (xi1, yi1) = point(r_inner, end_angle);
        let (xi0, yi0) = point(r_inner, start_angle);
        format!(
            "M {x0:.2} {y0:.2} A {r_outer:.2} {r_outer:.2} 0 {large} 1 {x1:.2} {y1:.2} L {xi1:.2} {yi1:.2} A {r_inner:.2} {r_inner:.2} 0 {large} 0 {xi0:.2} {yi0:.2} Z"
        )
    }
}

fn full_circle_path(cx: f32, cy: f32, radius: f32) -> String {
    let left = cx - radius;
    let right = cx + radius;
    format!(
        "M {right:.2} {cy:.2} A {radius:.2} {radius:.2} 0 1 1 {left:.2} {cy:.2} A {radius:.2} {radius:.2} 0 1 1 {right:.2} {cy:.2} Z"
    )
}

pub fn write_output_svg(svg: &str, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, svg)?;
        }
        None => {
            print!("{}", svg);
        }
    }
    Ok(())
}

#[cfg(feature = "png")]
pub fn write_output_png(svg: &str, output: &Path) -> Result<()> {
    let opt = usvg::Options::default();
    let tree = usvg::Tree::from_str(svg, &opt)?;
    let size = tree.size().to_int_size();
    let mut pixmap = resvg::tiny_skia::Pixmap::new(size.width(), size.height())
        .ok_or_else(|| anyhow::anyhow!("Failed to allocate pixmap"))?;

    let mut pixmap_mut = pixmap.as_mut();
    resvg::render(&tree, resvg::tiny_skia::Transform::default(), &mut pixmap_mut);
    pixmap.save_png(output)?;
    Ok(())
}

pub(crate) fn escape_xml(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ChartOptions;
    use crate::layout::compute_layout;
    use crate::payload::{ChartKind, DataFrame, Payload, parse_payload};
    use crate::style::{ColorMode, StyleResolution};
    use crate::text_metrics::HeuristicMetrics;
    use serde_json::json;

    fn sample_payload() -> Payload {
        parse_payload(
            &json!({
                "data": {
                    "data": [
                        { "name": "Alpha & Co", "score": 10 },
                        { "name": "Beta", "score": 50 }
                    ],
                    "columns": [
                        { "name": "name", "role": "x" },
                        { "name": "score", "role": "y" }
                    ]
                }
            })
            .to_string(),
        )
        .unwrap()
    }

    fn render_kind(kind: ChartKind) -> String {
        let payload = sample_payload();
        let frame = DataFrame::from_payload(&payload).unwrap();
        let style = StyleResolution::resolve(&payload, ColorMode::Light);
        let options = ChartOptions::from_variables(&payload.variables);
        let layout = compute_layout(kind, &frame, &style, &options, &HeuristicMetrics).unwrap();
        render_svg(&layout, &style)
    }

    #[test]
    fn every_chart_kind_produces_a_well_formed_document() {
        for kind in ChartKind::ALL {
            let svg = render_kind(kind);
            assert!(svg.starts_with("<svg"), "{kind:?} missing <svg");
            assert!(svg.ends_with("</svg>"), "{kind:?} missing </svg>");
            assert!(svg.contains("Beta"), "{kind:?} missing a category label");
        }
    }

    #[test]
    fn special_characters_are_escaped() {
        let svg = render_kind(ChartKind::Bar);
        assert!(svg.contains("Alpha &amp; Co"));
        assert!(!svg.contains("Alpha & Co<"));
    }

    #[test]
    fn rendering_is_idempotent() {
        let first = render_kind(ChartKind::Pie);
        let second = render_kind(ChartKind::Pie);
        assert_eq!(first, second);
    }

    #[test]
    fn full_turn_slice_renders_as_a_ring() {
        let path = annular_slice_path(100.0, 100.0, 50.0, 20.0, 0.0, PI * 2.0);
        assert!(path.matches('M').count() == 2, "outer and inner subpaths");
        assert!(!path.contains("NaN"));
    }

    #[test]
    fn half_turn_slice_uses_the_large_arc_flag() {
        let path = annular_slice_path(0.0, 0.0, 10.0, 0.0, 0.0, PI * 1.5);
        assert!(path.contains(" 1 1 "));
        let small = annular_slice_path(0.0, 0.0, 10.0, 0.0, 0.0, PI * 0.5);
        assert!(small.contains(" 0 1 "));
    }

    #[test]
    fn multiline_labels_emit_tspans_with_dy() {
        use crate::layout::{PlacedBlock, TextBlock, fit::TextAnchor};
        use crate::style::FontSpec;
        let placed = PlacedBlock {
            x: 10.0,
            y: 20.0,
            block: TextBlock {
                lines: vec!["one".to_string(), "two".to_string()],
                width: 30.0,
                height: 32.0,
            },
            anchor: TextAnchor::Middle,
            fill: "#333333".to_string(),
            font: FontSpec {
                family: "sans-serif".to_string(),
                size: 13.0,
                weight: "normal".to_string(),
            },
        };
        let text = placed_text(&placed);
        assert_eq!(text.matches("<tspan").count(), 2);
        assert!(text.contains("dy=\"16.00\""));
    }
}
