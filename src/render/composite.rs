use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use crate::foundation::core::Canvas;
use crate::foundation::error::{TemplateError, TemplateResult};
use crate::foundation::math::mul_div255_u8;
use crate::render::text::TextRaster;

pub(crate) type PremulRgba8 = [u8; 4];

/// A rendered raster placed at a document position.
#[derive(Clone, Debug)]
pub struct Overlay {
    /// Premultiplied pixels.
    pub raster: TextRaster,
    /// Document x of the raster's left edge.
    pub left: i32,
    /// Document y of the raster's top edge.
    pub top: i32,
}

pub(crate) fn over(dst: PremulRgba8, src: PremulRgba8) -> PremulRgba8 {
    if src[3] == 0 {
        return dst;
    }
    if src[3] == 255 {
        return src;
    }
    let inv = 255u16 - u16::from(src[3]);
    let mut out = [0u8; 4];
    for i in 0..4 {
        out[i] = src[i].saturating_add(mul_div255_u8(u16::from(dst[i]), inv));
    }
    out
}

pub(crate) fn premultiply_rgba8_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = u16::from(px[3]);
        if a == 0 {
            px[0] = 0;
            px[1] = 0;
            px[2] = 0;
            continue;
        }
        px[0] = mul_div255_u8(u16::from(px[0]), a);
        px[1] = mul_div255_u8(u16::from(px[1]), a);
        px[2] = mul_div255_u8(u16::from(px[2]), a);
    }
}

pub(crate) fn unpremultiply_rgba8_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = u32::from(px[3]);
        if a == 0 || a == 255 {
            continue;
        }
        for c in &mut px[..3] {
            *c = ((u32::from(*c) * 255 + a / 2) / a).min(255) as u8;
        }
    }
}

/// Draw a premultiplied raster onto a premultiplied canvas buffer at `(left, top)`, clipping to
/// the canvas.
pub(crate) fn draw_over(canvas: &mut [u8], canvas_w: u32, canvas_h: u32, overlay: &Overlay) {
    let r = &overlay.raster;
    let x0 = i64::from(overlay.left).max(0);
    let y0 = i64::from(overlay.top).max(0);
    let x1 = (i64::from(overlay.left) + i64::from(r.width)).min(i64::from(canvas_w));
    let y1 = (i64::from(overlay.top) + i64::from(r.height)).min(i64::from(canvas_h));
    if x0 >= x1 || y0 >= y1 {
        return;
    }
    for y in y0..y1 {
        let sy = (y - i64::from(overlay.top)) as usize;
        for x in x0..x1 {
            let sx = (x - i64::from(overlay.left)) as usize;
            let si = (sy * r.width as usize + sx) * 4;
            let di = (y as usize * canvas_w as usize + x as usize) * 4;
            let src = [r.data[si], r.data[si + 1], r.data[si + 2], r.data[si + 3]];
            let dst = [canvas[di], canvas[di + 1], canvas[di + 2], canvas[di + 3]];
            canvas[di..di + 4].copy_from_slice(&over(dst, src));
        }
    }
}

/// Decode the background, stretch it to the canvas, and draw overlays in order.
///
/// Returns straight-alpha pixels ready for encoding.
#[tracing::instrument(skip(background, overlays), fields(overlays = overlays.len()))]
pub fn compose(
    background: &[u8],
    canvas: Canvas,
    overlays: &[Overlay],
) -> TemplateResult<image::RgbaImage> {
    let decoded = image::load_from_memory(background)
        .map_err(|e| TemplateError::encoding(format!("decode background: {e}")))?;
    let mut base = if decoded.width() == canvas.width && decoded.height() == canvas.height {
        decoded.to_rgba8()
    } else {
        tracing::debug!(
            from_w = decoded.width(),
            from_h = decoded.height(),
            to_w = canvas.width,
            to_h = canvas.height,
            "stretching background"
        );
        image::imageops::resize(
            &decoded.to_rgba8(),
            canvas.width,
            canvas.height,
            image::imageops::FilterType::Triangle,
        )
    };

    if overlays.is_empty() {
        return Ok(base);
    }
    premultiply_rgba8_in_place(&mut base);
    for overlay in overlays {
        draw_over(&mut base, canvas.width, canvas.height, overlay);
    }
    unpremultiply_rgba8_in_place(&mut base);
    Ok(base)
}

/// Encode as PNG.
pub fn encode_png(img: &image::RgbaImage) -> TemplateResult<Vec<u8>> {
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .map_err(|e| TemplateError::encoding(format!("encode png: {e}")))?;
    Ok(buf)
}

/// Create the parent directory of `path` if missing.
pub fn ensure_parent_dir(path: &Path) -> TemplateResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| {
            TemplateError::io(format!(
                "failed to create output directory '{}': {e}",
                parent.display()
            ))
        })?;
    }
    Ok(())
}

/// Write `bytes` to `path` through a sibling temporary file and a rename, so a failed write
/// never leaves a partial artifact at `path`.
pub fn write_output(path: &Path, bytes: &[u8]) -> TemplateResult<()> {
    ensure_parent_dir(path)?;
    let tmp = temp_sibling(path)?;
    if let Err(e) = std::fs::write(&tmp, bytes) {
        let _ = std::fs::remove_file(&tmp);
        return Err(TemplateError::io(format!(
            "write '{}': {e}",
            tmp.display()
        )));
    }
    std::fs::rename(&tmp, path).map_err(|e| {
        let _ = std::fs::remove_file(&tmp);
        TemplateError::io(format!("rename into '{}': {e}", path.display()))
    })
}

static TEMP_SEQ: AtomicU64 = AtomicU64::new(0);

fn temp_sibling(path: &Path) -> TemplateResult<PathBuf> {
    let name = path
        .file_name()
        .ok_or_else(|| TemplateError::io(format!("output path '{}' has no file name", path.display())))?;
    let mut tmp_name = std::ffi::OsString::from(".");
    tmp_name.push(name);
    let seq = TEMP_SEQ.fetch_add(1, Ordering::Relaxed);
    tmp_name.push(format!(".{}-{seq}.tmp", std::process::id()));
    Ok(path.with_file_name(tmp_name))
}

#[cfg(test)]
#[path = "../../tests/unit/render/composite.rs"]
mod tests;
