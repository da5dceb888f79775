use crate::foundation::core::{Bounds, Canvas, UnitRgb};

/// Container flavour declared in the file header.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
pub enum ContainerVersion {
    /// Classic document (version 1), 32-bit section lengths.
    Psd,
    /// Large document (version 2), 64-bit section lengths.
    Psb,
}

/// Parsed layered document. Immutable once loaded.
#[derive(Clone, Debug)]
pub struct Document {
    /// Declared canvas size; every rendered output has exactly these dimensions.
    pub canvas: Canvas,
    /// Header version.
    pub version: ContainerVersion,
    /// Bits per channel.
    pub depth: u16,
    /// Header color mode (3 = RGB, 1 = grayscale, ...).
    pub color_mode: u16,
    /// Top-level layers in stacking order, bottom-most first.
    pub children: Vec<LayerNode>,
    /// Flattened composite image, when decoded.
    pub composite: Option<image::RgbaImage>,
    /// Embedded preview thumbnail, when decoded.
    pub thumbnail: Option<image::RgbaImage>,
}

impl Document {
    /// Canvas width in pixels.
    pub fn width(&self) -> u32 {
        self.canvas.width
    }

    /// Canvas height in pixels.
    pub fn height(&self) -> u32 {
        self.canvas.height
    }
}

/// One node of the layer tree. Owned exclusively by its parent or the document root.
#[derive(Clone, Debug)]
pub struct LayerNode {
    /// Layer name as shown in the layers panel. May be empty.
    pub name: String,
    /// Pixel bounds in document space.
    pub bounds: Bounds,
    /// Visibility flag from the layer record.
    pub visible: bool,
    /// Layer opacity, 0..=255.
    pub opacity: u8,
    /// Group, text or plain pixel layer.
    pub kind: LayerKind,
    /// Decoded straight-alpha pixels covering `bounds`, when decoded.
    pub raster: Option<image::RgbaImage>,
}

impl LayerNode {
    /// `true` for text layers.
    pub fn is_text(&self) -> bool {
        matches!(self.kind, LayerKind::Text(_))
    }

    /// Text payload for text layers.
    pub fn text(&self) -> Option<&TextData> {
        match &self.kind {
            LayerKind::Text(t) => Some(t),
            _ => None,
        }
    }

    /// Child layers for groups; empty for everything else.
    pub fn children(&self) -> &[LayerNode] {
        match &self.kind {
            LayerKind::Group { children } => children,
            _ => &[],
        }
    }

    /// Short label for the node kind.
    pub fn kind_name(&self) -> &'static str {
        match self.kind {
            LayerKind::Group { .. } => "group",
            LayerKind::Text(_) => "text",
            LayerKind::Other => "other",
        }
    }
}

/// Tagged layer payload.
#[derive(Clone, Debug)]
pub enum LayerKind {
    /// Layer group (folder) with its children in stacking order, bottom-most first.
    Group {
        /// Child layers.
        children: Vec<LayerNode>,
    },
    /// Type layer.
    Text(TextData),
    /// Anything else: pixel layers, adjustment layers, fills.
    Other,
}

/// Text content and styling extracted from a type layer.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TextData {
    /// The layer's current text.
    pub text: String,
    /// Paragraph-level style of the first paragraph.
    pub paragraph: ParagraphStyle,
    /// Character style runs in order.
    pub runs: Vec<StyleRun>,
}

/// Paragraph-level attributes.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ParagraphStyle {
    /// Raw justification name (`"left"`, `"center"`, `"justify-right"`, ...).
    pub justification: Option<String>,
}

/// A contiguous span of text sharing one style.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StyleRun {
    /// Span length in UTF-16 code units.
    pub length: usize,
    /// Font name as stored in the document (typically a PostScript name).
    pub font_family: Option<String>,
    /// Font size in points.
    pub font_size_pt: Option<f64>,
    /// Fill color.
    pub fill_color: Option<UnitRgb>,
    /// Raw justification name of the paragraph this run starts in.
    pub justification: Option<String>,
}
