use crate::payload::{ColorTokens, FontToken, Payload};
use std::collections::BTreeMap;

/// Categorical fallback palette used when the payload supplies neither
/// per-category colors nor an `available_colors` list.
const DEFAULT_PALETTE: [&str; 8] = [
    "#4e79a7", "#f28e2c", "#e15759", "#76b7b2", "#59a14f", "#edc949", "#af7aa1", "#ff9da7",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorMode {
    Light,
    Dark,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FontSpec {
    pub family: String,
    pub size: f32,
    pub weight: String,
}

impl FontSpec {
    pub fn from_token(token: &FontToken) -> Self {
        Self {
            family: token.font_family.clone(),
            size: token.font_size.max(1.0),
            weight: token.font_weight.clone(),
        }
    }

    /// Scaled copy, for derived labels (tick text at 0.85x label size etc.).
    pub fn scaled(&self, factor: f32) -> Self {
        Self {
            family: self.family.clone(),
            size: (self.size * factor).max(1.0),
            weight: self.weight.clone(),
        }
    }
}

/// Immutable style bundle built once at the top of each render and passed
/// down. Charts never read raw payload tokens directly.
#[derive(Debug, Clone)]
pub struct StyleResolution {
    pub title_font: FontSpec,
    pub label_font: FontSpec,
    pub description_font: FontSpec,
    pub annotation_font: FontSpec,
    pub text_color: String,
    pub background: String,
    pub primary: String,
    pub secondary: String,
    palette: Vec<String>,
    field_colors: BTreeMap<String, String>,
    icons: BTreeMap<String, String>,
}

impl StyleResolution {
    pub fn resolve(payload: &Payload, mode: ColorMode) -> Self {
        let tokens = match (mode, payload.colors_dark.as_ref()) {
            (ColorMode::Dark, Some(dark)) => dark,
            _ => &payload.colors,
        };
        let (default_text, default_background) = match mode {
            ColorMode::Light => ("#1C2430", "#FFFFFF"),
            ColorMode::Dark => ("#E8ECF2", "#101418"),
        };

        let default_font = FontToken::default();
        let font = |token: &Option<FontToken>| {
            FontSpec::from_token(token.as_ref().unwrap_or(&default_font))
        };
        let mut title_font = font(&payload.typography.title);
        if payload.typography.title.is_none() {
            title_font.size = 18.0;
            title_font.weight = "bold".to_string();
        }

        let palette = if tokens.available_colors.is_empty() {
            DEFAULT_PALETTE.iter().map(|color| color.to_string()).collect()
        } else {
            tokens.available_colors.clone()
        };

        Self {
            title_font,
            label_font: font(&payload.typography.label),
            description_font: font(&payload.typography.description),
            annotation_font: font(&payload.typography.annotation),
            text_color: named_or(tokens, "text", tokens.text_color.as_deref(), default_text),
            background: named_or(
                tokens,
                "background",
                tokens.background_color.as_deref(),
                default_background,
            ),
            primary: other_or(tokens, "primary", DEFAULT_PALETTE[0]),
            secondary: other_or(tokens, "secondary", DEFAULT_PALETTE[3]),
            palette,
            field_colors: tokens.field.clone(),
            icons: payload.images.field.clone(),
        }
    }

    /// Color for one category mark: explicit field color, then palette by
    /// first-seen index, then primary.
    pub fn category_color(&self, category: &str, index: usize) -> String {
        if let Some(color) = self.field_colors.get(category) {
            return color.clone();
        }
        if !self.palette.is_empty() {
            return self.palette[index % self.palette.len()].clone();
        }
        self.primary.clone()
    }

    pub fn icon_url(&self, category: &str) -> Option<&str> {
        self.icons.get(category).map(String::as_str)
    }

    pub fn has_icons(&self) -> bool {
        !self.icons.is_empty()
    }

    /// Fill for a label drawn on top of a mark: white over dark marks, the
    /// ambient text color over light ones.
    pub fn on_mark_color(&self, mark_color: &str) -> String {
        match relative_luminance(mark_color) {
            Some(luminance) if luminance > 0.65 => self.text_color.clone(),
            _ => "#FFFFFF".to_string(),
        }
    }
}

fn named_or(
    tokens: &ColorTokens,
    other_key: &str,
    explicit: Option<&str>,
    default: &str,
) -> String {
    explicit
        .or_else(|| tokens.other.get(other_key).map(String::as_str))
        .unwrap_or(default)
        .to_string()
}

fn other_or(tokens: &ColorTokens, key: &str, default: &str) -> String {
    tokens
        .other
        .get(key)
        .cloned()
        .unwrap_or_else(|| default.to_string())
}

/// sRGB relative luminance of a `#rgb`/`#rrggbb` color, `None` for anything
/// that does not parse (named colors, gradients).
fn relative_luminance(color: &str) -> Option<f32> {
    let hex = color.trim().strip_prefix('#')?;
    let (r, g, b) = match hex.len() {
        3 => {
            let mut digits = hex.chars().map(|c| c.to_digit(16));
            let r = digits.next()??;
            let g = digits.next()??;
            let b = digits.next()??;
            ((r * 17) as f32, (g * 17) as f32, (b * 17) as f32)
        }
        6 => {
            let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
            let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
            let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
            (r as f32, g as f32, b as f32)
        }
        _ => return None,
    };
    Some((0.2126 * r + 0.7152 * g + 0.0722 * b) / 255.0)
}
