pub mod bar;
pub mod column;
pub mod error;
pub mod fit;
pub mod margins;
pub mod pie;
pub mod radial;
pub mod text;
pub mod treemap;

use crate::config::ChartOptions;
use crate::error::ChartError;
use crate::payload::{ChartKind, DataFrame};
use crate::style::{FontSpec, StyleResolution};
use crate::text_metrics::TextMetricsProvider;

pub use bar::BarData;
pub use column::ColumnData;
pub use error::{ErrorData, compute_error_layout};
pub use fit::{LabelFill, LabelFit, LabelPosition, MarkBox, TextAnchor, place_label};
pub use margins::{MarginRequest, Margins, compute_margins, inner_plot};
pub use pie::PieData;
pub use radial::RadialData;
pub use treemap::TreemapData;

/// Wrapped, measured text. `width` is the widest line, `height` covers all
/// lines at the measuring line-height.
#[derive(Debug, Clone, PartialEq)]
pub struct TextBlock {
    pub lines: Vec<String>,
    pub width: f32,
    pub height: f32,
}

impl TextBlock {
    pub fn empty() -> Self {
        Self {
            lines: vec![String::new()],
            width: 0.0,
            height: 0.0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.lines.iter().all(|line| line.is_empty())
    }
}

/// A text block pinned to a position, ready for the SVG emitter.
#[derive(Debug, Clone)]
pub struct PlacedBlock {
    pub x: f32,
    pub y: f32,
    pub block: TextBlock,
    pub anchor: TextAnchor,
    pub fill: String,
    pub font: FontSpec,
}

/// Inner drawing area after margins.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlotFrame {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

#[derive(Debug, Clone)]
pub struct IconMark {
    pub x: f32,
    pub y: f32,
    pub size: f32,
    pub url: String,
}

#[derive(Debug, Clone)]
pub struct LegendItem {
    pub x: f32,
    pub y: f32,
    pub marker_size: f32,
    pub color: String,
    pub label: PlacedBlock,
}

#[derive(Debug, Clone)]
pub struct Layout {
    pub width: f32,
    pub height: f32,
    pub chart: ChartData,
}

#[derive(Debug, Clone)]
pub enum ChartData {
    Bar(BarData),
    Column(ColumnData),
    Pie(PieData),
    Radial(RadialData),
    Treemap(TreemapData),
    Error(ErrorData),
}

/// Compute the full layout for one chart kind. This is the single entry
/// point the renderer and CLI go through.
pub fn compute_layout(
    kind: ChartKind,
    frame: &DataFrame,
    style: &StyleResolution,
    options: &ChartOptions,
    metrics: &dyn TextMetricsProvider,
) -> Result<Layout, ChartError> {
    if frame.rows.is_empty() {
        return Err(ChartError::config("data.data has no drawable rows"));
    }
    match kind {
        ChartKind::Bar => bar::compute_bar_layout(frame, style, options, metrics),
        ChartKind::Column => column::compute_column_layout(frame, style, options, metrics),
        ChartKind::Pie => pie::compute_pie_layout(frame, style, options, metrics),
        ChartKind::Radial => radial::compute_radial_layout(frame, style, options, metrics),
        ChartKind::Treemap => treemap::compute_treemap_layout(frame, style, options, metrics),
    }
}

/// Vertical offset of the first line's baseline so an n-line block is
/// centered on `anchor_y`. Subsequent lines advance by one line-height.
pub(crate) fn centered_first_baseline(anchor_y: f32, block: &TextBlock, font: &FontSpec) -> f32 {
    anchor_y - block.height / 2.0 + font.size
}
