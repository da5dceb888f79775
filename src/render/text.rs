//! Text rasterization: one string, one style, one transparent premultiplied RGBA raster.

use crate::foundation::core::Bounds;
use crate::foundation::error::{TemplateError, TemplateResult};
use crate::render::fonts::FontLibrary;
use crate::template::style::{Justification, ResolvedStyle};

/// Fraction of the font size left blank above the line box.
const TOP_PADDING_EM: f32 = 0.1;
/// Average advance estimate used to size rasters before shaping.
const CHAR_WIDTH_EM: f64 = 0.6;
const LINE_HEIGHT_EM: f64 = 1.8;
const MIN_RASTER_WIDTH: u32 = 100;

/// RGBA8 brush color used by Parley text layout.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TextBrushRgba8 {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
    /// Alpha channel.
    pub a: u8,
}

/// Rendered text, premultiplied RGBA8, row-major.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TextRaster {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// `width * height * 4` premultiplied bytes.
    pub data: Vec<u8>,
}

impl TextRaster {
    fn blank(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![0; width as usize * height as usize * 4],
        }
    }

    /// `true` when no pixel has any coverage.
    pub fn is_blank(&self) -> bool {
        self.data.chunks_exact(4).all(|px| px[3] == 0)
    }
}

/// Raster size that fits `text` at `font_size_px` without clipping, never smaller than the layer.
pub fn raster_size_for(bounds: Bounds, text: &str, font_size_px: u32) -> (u32, u32) {
    let size = f64::from(font_size_px);
    let chars = text.chars().count() as f64;
    let est_width = (size * chars * CHAR_WIDTH_EM).ceil() as u32;
    let est_height = (size * LINE_HEIGHT_EM).ceil() as u32;
    (
        bounds.width().max(est_width).max(MIN_RASTER_WIDTH),
        bounds.height().max(est_height),
    )
}

/// Draw `text` once into a `width x height` transparent raster.
///
/// The line box top sits at 10% of the font size; the string is anchored per the style's
/// justification. Dimensions above `u16::MAX` are clamped.
#[tracing::instrument(skip(style, fonts), fields(font = %style.font_family, size = style.font_size_px))]
pub fn rasterize_text(
    text: &str,
    width: u32,
    height: u32,
    style: &ResolvedStyle,
    fonts: &FontLibrary,
) -> TemplateResult<TextRaster> {
    if width == 0 || height == 0 {
        return Err(TemplateError::validation(format!(
            "text raster dimensions must be > 0, got {width}x{height}"
        )));
    }
    let width = width.min(u32::from(u16::MAX));
    let height = height.min(u32::from(u16::MAX));

    if text.is_empty() {
        return Ok(TextRaster::blank(width, height));
    }
    let Some(face) = fonts.resolve(&style.font_family) else {
        tracing::warn!(font = %style.font_family, "no font registered, leaving text raster blank");
        return Ok(TextRaster::blank(width, height));
    };
    if face.family() != style.font_family {
        tracing::debug!(requested = %style.font_family, using = %face.family(), "font fallback");
    }

    let [r, g, b, a] = style.fill_rgba8();
    let brush = TextBrushRgba8 { r, g, b, a };
    let blob = face.blob();
    let mut engine = TextLayoutEngine::new();
    let layout = engine.layout_plain(text, blob.clone(), style.font_size_px as f32, brush)?;

    let x = match style.justification {
        Justification::Left => 0.0,
        Justification::Center => (width as f32 - layout.width()) / 2.0,
        Justification::Right => width as f32 - layout.width(),
    };
    let y = style.font_size_px as f32 * TOP_PADDING_EM;

    let font = vello_cpu::peniko::FontData::new(blob, 0);
    Ok(draw_layout(&layout, &font, width as u16, height as u16, x, y))
}

fn draw_layout(
    layout: &parley::Layout<TextBrushRgba8>,
    font: &vello_cpu::peniko::FontData,
    width: u16,
    height: u16,
    x: f32,
    y: f32,
) -> TextRaster {
    let mut ctx = vello_cpu::RenderContext::new(width, height);
    ctx.set_transform(vello_cpu::kurbo::Affine::translate((f64::from(x), f64::from(y))));

    for line in layout.lines() {
        for item in line.items() {
            let parley::layout::PositionedLayoutItem::GlyphRun(run) = item else {
                continue;
            };
            let brush = run.style().brush;
            ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(
                brush.r, brush.g, brush.b, brush.a,
            ));
            let glyphs = run.positioned_glyphs().map(|g| vello_cpu::Glyph {
                id: g.id,
                x: g.x,
                y: g.y,
            });
            ctx.glyph_run(font)
                .font_size(run.run().font_size())
                .fill_glyphs(glyphs);
        }
    }

    let mut pixmap = vello_cpu::Pixmap::new(width, height);
    ctx.flush();
    ctx.render_to_pixmap(&mut pixmap);
    TextRaster {
        width: u32::from(width),
        height: u32::from(height),
        data: pixmap.data_as_u8_slice().to_vec(),
    }
}

/// Parley shaping state for a single rasterization call.
struct TextLayoutEngine {
    font_ctx: parley::FontContext,
    layout_ctx: parley::LayoutContext<TextBrushRgba8>,
}

impl TextLayoutEngine {
    fn new() -> Self {
        Self {
            font_ctx: parley::FontContext::default(),
            layout_ctx: parley::LayoutContext::new(),
        }
    }

    /// Shape and lay out a single unwrapped line.
    fn layout_plain(
        &mut self,
        text: &str,
        font: parley::fontique::Blob<u8>,
        size_px: f32,
        brush: TextBrushRgba8,
    ) -> TemplateResult<parley::Layout<TextBrushRgba8>> {
        if !size_px.is_finite() || size_px <= 0.0 {
            return Err(TemplateError::validation(
                "text size_px must be finite and > 0",
            ));
        }

        let families = self.font_ctx.collection.register_fonts(font, None);
        let family_id = families.first().map(|(id, _)| *id).ok_or_else(|| {
            TemplateError::validation("no font families registered from font bytes")
        })?;
        let family_name = self
            .font_ctx
            .collection
            .family_name(family_id)
            .ok_or_else(|| TemplateError::validation("registered font family has no name"))?
            .to_string();

        let mut builder = self
            .layout_ctx
            .ranged_builder(&mut self.font_ctx, text, 1.0, true);
        builder.push_default(parley::style::StyleProperty::FontStack(
            parley::style::FontStack::Source(std::borrow::Cow::Owned(family_name)),
        ));
        builder.push_default(parley::style::StyleProperty::FontSize(size_px));
        builder.push_default(parley::style::StyleProperty::Brush(brush));

        let mut layout: parley::Layout<TextBrushRgba8> = builder.build(text);
        layout.break_all_lines(None);
        Ok(layout)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/text.rs"]
mod tests;
