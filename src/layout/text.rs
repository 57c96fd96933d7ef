use crate::style::FontSpec;
use crate::text_metrics::TextMetricsProvider;

use super::TextBlock;

/// Split on explicit breaks before any width-driven wrapping. Payload
/// strings may carry literal newlines, `\n` escapes or `<br/>` tags.
pub(crate) fn split_lines(text: &str) -> Vec<String> {
    let normalized = text
        .replace("<br/>", "\n")
        .replace("<br>", "\n")
        .replace("\\n", "\n");
    normalized
        .split('\n')
        .map(|line| line.trim().to_string())
        .collect()
}

/// Greedy word wrap with a character-level fallback for tokens that alone
/// exceed `max_width` (scripts without word boundaries, long identifiers).
/// Always returns at least one line; a line overflows `max_width` by at
/// most one character's measured width.
pub(crate) fn wrap_line(
    line: &str,
    max_width: f32,
    font: &FontSpec,
    metrics: &dyn TextMetricsProvider,
) -> Vec<String> {
    if metrics.text_width(line, font) <= max_width {
        return vec![line.to_string()];
    }

    let mut lines = Vec::new();
    let mut current = String::new();
    for word in line.split_whitespace() {
        let candidate = if current.is_empty() {
            word.to_string()
        } else {
            format!("{current} {word}")
        };
        if metrics.text_width(&candidate, font) <= max_width {
            current = candidate;
            continue;
        }
        if !current.is_empty() {
            lines.push(std::mem::take(&mut current));
        }
        if metrics.text_width(word, font) <= max_width {
            current = word.to_string();
        } else {
            let mut chunks = wrap_chars(word, max_width, font, metrics);
            current = chunks.pop().unwrap_or_default();
            lines.extend(chunks);
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}

/// Character-greedy split of a single unbreakable token. Every emitted line
/// carries at least one character, so progress is guaranteed.
fn wrap_chars(
    token: &str,
    max_width: f32,
    font: &FontSpec,
    metrics: &dyn TextMetricsProvider,
) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    for ch in token.chars() {
        let mut candidate = current.clone();
        candidate.push(ch);
        if !current.is_empty() && metrics.text_width(&candidate, font) > max_width {
            lines.push(std::mem::take(&mut current));
            current.push(ch);
        } else {
            current = candidate;
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}

/// Wrap (when `max_width` is set) and measure a label into a [`TextBlock`].
pub(crate) fn measure_block(
    text: &str,
    font: &FontSpec,
    max_width: Option<f32>,
    line_height: f32,
    metrics: &dyn TextMetricsProvider,
) -> TextBlock {
    let mut lines = Vec::new();
    for raw in split_lines(text) {
        match max_width {
            Some(width) => lines.extend(wrap_line(&raw, width.max(1.0), font, metrics)),
            None => lines.push(raw),
        }
    }
    if lines.is_empty() {
        lines.push(String::new());
    }
    let width = lines
        .iter()
        .map(|line| metrics.text_width(line, font))
        .fold(0.0, f32::max);
    let height = lines.len() as f32 * font.size * line_height;
    TextBlock {
        lines,
        width,
        height,
    }
}
