use crate::style::FontSpec;
use crate::text_metrics::TextMetricsProvider;

/// Extent of one mark as far as label fitting is concerned.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MarkBox {
    pub width: f32,
    pub height: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelPosition {
    Inside,
    Outside,
    Hidden,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextAnchor {
    Start,
    Middle,
    End,
}

impl TextAnchor {
    pub fn as_svg(self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Middle => "middle",
            Self::End => "end",
        }
    }
}

/// Which color the label takes: contrasting over the mark, or the ambient
/// text color next to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelFill {
    OnMark,
    Ambient,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LabelFit {
    pub position: LabelPosition,
    pub anchor: TextAnchor,
    pub fill: LabelFill,
}

/// Decide where a value label goes relative to its mark. The rules run in
/// order; the first match wins, so the decision is deterministic for
/// identical inputs:
///
/// 1. degenerate mark (width <= 0) - the label is suppressed;
/// 2. the measured label plus padding on both sides fits - centered inside,
///    contrasting fill;
/// 3. otherwise - just past the trailing edge, start-anchored, ambient fill;
/// 4. unless the outside run would collide with a trailing decoration
///    (`outside_room` is the clearance the caller has there), in which case
///    the label is forced back inside and allowed to overflow visually.
pub fn place_label(
    mark: MarkBox,
    text: &str,
    font: &FontSpec,
    padding: f32,
    outside_room: Option<f32>,
    metrics: &dyn TextMetricsProvider,
) -> LabelFit {
    if mark.width <= 0.0 {
        return LabelFit {
            position: LabelPosition::Hidden,
            anchor: TextAnchor::Middle,
            fill: LabelFill::Ambient,
        };
    }

    let measured = metrics.text_width(text, font);
    if measured + padding * 2.0 <= mark.width {
        return LabelFit {
            position: LabelPosition::Inside,
            anchor: TextAnchor::Middle,
            fill: LabelFill::OnMark,
        };
    }

    if let Some(room) = outside_room
        && measured + padding > room
    {
        return LabelFit {
            position: LabelPosition::Inside,
            anchor: TextAnchor::Middle,
            fill: LabelFill::OnMark,
        };
    }

    LabelFit {
        position: LabelPosition::Outside,
        anchor: TextAnchor::Start,
        fill: LabelFill::Ambient,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text_metrics::{HeuristicMetrics, TextMetricsProvider};
    use proptest::prelude::*;

    fn font(size: f32) -> FontSpec {
        FontSpec {
            family: "sans-serif".to_string(),
            size,
            weight: "normal".to_string(),
        }
    }

    fn mark(width: f32) -> MarkBox {
        MarkBox {
            width,
            height: 20.0,
        }
    }

    #[test]
    fn zero_width_mark_hides_the_label() {
        let fit = place_label(mark(0.0), "12", &font(12.0), 6.0, None, &HeuristicMetrics);
        assert_eq!(fit.position, LabelPosition::Hidden);
        let fit = place_label(mark(-3.0), "12", &font(12.0), 6.0, None, &HeuristicMetrics);
        assert_eq!(fit.position, LabelPosition::Hidden);
    }

    #[test]
    fn wide_mark_takes_the_label_inside_on_contrasting_fill() {
        // Beta bar from the reference scenario: value 50 mapped to >= 200px.
        let fit = place_label(mark(220.0), "50", &font(12.0), 6.0, None, &HeuristicMetrics);
        assert_eq!(fit.position, LabelPosition::Inside);
        assert_eq!(fit.anchor, TextAnchor::Middle);
        assert_eq!(fit.fill, LabelFill::OnMark);
    }

    #[test]
    fn narrow_mark_pushes_the_label_outside() {
        let fit = place_label(
            mark(20.0),
            "12345",
            &font(12.0),
            6.0,
            None,
            &HeuristicMetrics,
        );
        assert_eq!(fit.position, LabelPosition::Outside);
        assert_eq!(fit.anchor, TextAnchor::Start);
        assert_eq!(fit.fill, LabelFill::Ambient);
    }

    #[test]
    fn single_digit_on_a_small_bar_follows_the_measured_width() {
        // Gamma bar from the reference scenario: ~20px bar, label "5".
        let spec = font(12.0);
        let fit = place_label(mark(20.0), "5", &spec, 6.0, None, &HeuristicMetrics);
        let expected = if HeuristicMetrics.text_width("5", &spec) + 12.0 <= 20.0 {
            LabelPosition::Inside
        } else {
            LabelPosition::Outside
        };
        assert_eq!(fit.position, expected);
    }

    #[test]
    fn cramped_trailing_decoration_forces_the_label_inside() {
        let spec = font(12.0);
        let overflowing = place_label(mark(20.0), "12345", &spec, 6.0, Some(10.0), &HeuristicMetrics);
        assert_eq!(overflowing.position, LabelPosition::Inside);
        let roomy = place_label(mark(20.0), "12345", &spec, 6.0, Some(500.0), &HeuristicMetrics);
        assert_eq!(roomy.position, LabelPosition::Outside);
    }

    proptest! {
        // Clearly-fitting labels always land inside; clearly-overflowing
        // labels always land outside. The padding band in between is
        // implementation-defined but deterministic.
        #[test]
        fn fit_is_monotonic(width in 1.0f32..500.0, len in 1usize..20) {
            let spec = font(12.0);
            let text: String = "8".repeat(len);
            let measured = HeuristicMetrics.text_width(&text, &spec);
            let padding = 6.0;
            let fit = place_label(mark(width), &text, &spec, padding, None, &HeuristicMetrics);
            if measured < width - padding * 2.0 {
                prop_assert_eq!(fit.position, LabelPosition::Inside);
            }
            if measured > width + padding {
                prop_assert_eq!(fit.position, LabelPosition::Outside);
            }
            // Determinism: the same inputs give the same decision.
            let again = place_label(mark(width), &text, &spec, padding, None, &HeuristicMetrics);
            prop_assert_eq!(fit, again);
        }
    }
}
