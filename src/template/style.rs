//! Style resolution: the first style run of a text layer, completed from a default table.

use crate::document::model::{LayerNode, StyleRun, TextData};
use crate::foundation::core::UnitRgb;
use crate::foundation::math::unit_to_u8;

/// Horizontal anchoring of a rendered string.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Justification {
    /// Anchor at the raster's left edge.
    #[default]
    Left,
    /// Center on the raster's horizontal midpoint.
    Center,
    /// Anchor at the raster's right edge.
    Right,
}

impl Justification {
    /// Map a raw justification name: anything containing "center" is centered, anything
    /// containing "right" is right-aligned, everything else is left-aligned.
    pub fn from_name(name: &str) -> Self {
        let lower = name.to_ascii_lowercase();
        if lower.contains("center") {
            Self::Center
        } else if lower.contains("right") {
            Self::Right
        } else {
            Self::Left
        }
    }
}

/// Fallback values for attributes a text layer does not carry.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct StyleDefaults {
    /// Family used when the first run names no font.
    pub font_family: String,
    /// Size used when neither the run nor the layer height gives one.
    pub font_size_px: u32,
    /// Lower bound for sizes derived from layer height.
    pub min_font_size_px: u32,
    /// Multiplier applied to layer height when deriving a size.
    pub height_factor: f64,
    /// Fill used when the first run has no color, as `#RRGGBB`.
    pub fill_hex: String,
}

impl Default for StyleDefaults {
    fn default() -> Self {
        Self {
            font_family: "Arial".to_string(),
            font_size_px: 32,
            min_font_size_px: 32,
            height_factor: 1.1,
            fill_hex: "#FFFFFF".to_string(),
        }
    }
}

impl StyleDefaults {
    /// Return defaults with a different fallback family.
    pub fn with_font_family(mut self, family: impl Into<String>) -> Self {
        self.font_family = family.into();
        self
    }

    /// Return defaults with a different fallback size.
    pub fn with_font_size_px(mut self, size: u32) -> Self {
        self.font_size_px = size;
        self
    }

    /// Return defaults with a different fallback fill.
    pub fn with_fill_hex(mut self, hex: impl Into<String>) -> Self {
        self.fill_hex = hex.into();
        self
    }
}

/// Fully populated style for one text layer.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct ResolvedStyle {
    /// Requested family or PostScript name.
    pub font_family: String,
    /// Font size in pixels, at least 1.
    pub font_size_px: u32,
    /// Fill as `#RRGGBB`.
    pub fill_hex: String,
    /// Horizontal anchoring.
    pub justification: Justification,
}

impl ResolvedStyle {
    /// Fill as an opaque RGBA byte quadruple. Malformed hex reads as white.
    pub fn fill_rgba8(&self) -> [u8; 4] {
        parse_hex(&self.fill_hex).unwrap_or([255, 255, 255, 255])
    }
}

/// Resolve every attribute of a text layer. Never fails.
pub fn resolve_style(layer: &LayerNode, defaults: &StyleDefaults) -> ResolvedStyle {
    let text = layer.text();
    let run = text.and_then(|t| t.runs.first());
    ResolvedStyle {
        font_family: resolve_font_family(run, defaults),
        font_size_px: resolve_font_size(run, layer.bounds.height(), defaults),
        fill_hex: resolve_fill_hex(run, defaults),
        justification: resolve_justification(text),
    }
}

fn resolve_font_family(run: Option<&StyleRun>, defaults: &StyleDefaults) -> String {
    run.and_then(|r| r.font_family.as_deref())
        .filter(|f| !f.trim().is_empty())
        .unwrap_or(&defaults.font_family)
        .to_string()
}

fn resolve_font_size(run: Option<&StyleRun>, layer_height: u32, defaults: &StyleDefaults) -> u32 {
    let from_run = run
        .and_then(|r| r.font_size_pt)
        .filter(|s| s.is_finite() && *s > 0.0)
        .map(|s| s.round() as u32);
    let size = match from_run {
        Some(size) => size,
        None if layer_height > 0 => {
            let derived = (f64::from(layer_height) * defaults.height_factor).round() as u32;
            derived.max(defaults.min_font_size_px)
        }
        None => defaults.font_size_px,
    };
    size.max(1)
}

fn resolve_fill_hex(run: Option<&StyleRun>, defaults: &StyleDefaults) -> String {
    match run.and_then(|r| r.fill_color) {
        Some(c) => fill_hex(c),
        None => defaults.fill_hex.clone(),
    }
}

fn resolve_justification(text: Option<&TextData>) -> Justification {
    let Some(text) = text else {
        return Justification::Left;
    };
    text.paragraph
        .justification
        .as_deref()
        .or_else(|| text.runs.first().and_then(|r| r.justification.as_deref()))
        .map(Justification::from_name)
        .unwrap_or_default()
}

/// Convert a unit-interval color to uppercase `#RRGGBB`.
pub fn fill_hex(c: UnitRgb) -> String {
    format!(
        "#{:02X}{:02X}{:02X}",
        unit_to_u8(c.r),
        unit_to_u8(c.g),
        unit_to_u8(c.b)
    )
}

fn parse_hex(hex: &str) -> Option<[u8; 4]> {
    let digits = hex.strip_prefix('#')?;
    if digits.len() != 6 || !digits.is_ascii() {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(&digits[i..i + 2], 16).ok();
    Some([channel(0)?, channel(2)?, channel(4)?, 255])
}

#[cfg(test)]
#[path = "../../tests/unit/template/style.rs"]
mod tests;
