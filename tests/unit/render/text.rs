use super::*;
use crate::template::style::ResolvedStyle;
use crate::test_support::system_font;

fn style(justification: Justification) -> ResolvedStyle {
    ResolvedStyle {
        font_family: "DejaVu Sans".to_string(),
        font_size_px: 24,
        fill_hex: "#FF0000".to_string(),
        justification,
    }
}

fn dejavu() -> Option<FontLibrary> {
    let mut lib = FontLibrary::new();
    lib.register(system_font()?).ok()?;
    Some(lib)
}

/// Leftmost and rightmost columns with any coverage.
fn ink_columns(r: &TextRaster) -> Option<(u32, u32)> {
    let mut cols = (0..r.width).filter(|&x| {
        (0..r.height).any(|y| r.data[((y * r.width + x) * 4 + 3) as usize] > 0)
    });
    let first = cols.next()?;
    let last = cols.last().unwrap_or(first);
    Some((first, last))
}

#[test]
fn raster_size_covers_layer_and_estimate() {
    let b = Bounds::new(0, 0, 50, 10);
    assert_eq!(raster_size_for(b, "", 20), (100, 36));
    assert_eq!(raster_size_for(b, "abcdefghij", 20), (120, 36));

    let big = Bounds::new(0, 0, 400, 90);
    assert_eq!(raster_size_for(big, "abc", 20), (400, 90));
}

#[test]
fn degenerate_dimensions_are_validation_errors() {
    let lib = FontLibrary::new();
    for (w, h) in [(0, 10), (10, 0)] {
        let err = rasterize_text("x", w, h, &style(Justification::Left), &lib).unwrap_err();
        assert!(matches!(err, TemplateError::Validation(_)));
    }
}

#[test]
fn empty_text_and_empty_library_give_blank_rasters() {
    let lib = FontLibrary::new();
    let r = rasterize_text("", 40, 20, &style(Justification::Left), &lib).unwrap();
    assert_eq!((r.width, r.height), (40, 20));
    assert_eq!(r.data.len(), 40 * 20 * 4);
    assert!(r.is_blank());

    let r = rasterize_text("hello", 40, 20, &style(Justification::Left), &lib).unwrap();
    assert!(r.is_blank());
}

#[test]
fn oversized_dimensions_are_clamped() {
    let lib = FontLibrary::new();
    let r = rasterize_text("", 70_000, 1, &style(Justification::Left), &lib).unwrap();
    assert_eq!(r.width, u32::from(u16::MAX));
}

#[test]
fn draws_glyphs_in_fill_color() {
    let Some(lib) = dejavu() else {
        return;
    };
    let r = rasterize_text("Hello", 200, 60, &style(Justification::Left), &lib).unwrap();
    assert!(!r.is_blank());
    let opaque = r
        .data
        .chunks_exact(4)
        .find(|px| px[3] == 255)
        .expect("some fully covered pixel");
    assert_eq!(opaque, &[255, 0, 0, 255]);
    // Premultiplied: color never exceeds alpha.
    assert!(r.data.chunks_exact(4).all(|px| px[0] <= px[3] && px[1] == 0));
}

#[test]
fn justification_moves_ink() {
    let Some(lib) = dejavu() else {
        return;
    };
    let left = rasterize_text("Hi", 300, 60, &style(Justification::Left), &lib).unwrap();
    let center = rasterize_text("Hi", 300, 60, &style(Justification::Center), &lib).unwrap();
    let right = rasterize_text("Hi", 300, 60, &style(Justification::Right), &lib).unwrap();

    let (l0, _) = ink_columns(&left).unwrap();
    let (c0, c1) = ink_columns(&center).unwrap();
    let (_, r1) = ink_columns(&right).unwrap();
    assert!(l0 < 10);
    assert!(c0 > 100 && c1 < 200);
    assert!(r1 > 280);
}

#[test]
fn rendering_is_deterministic() {
    let Some(lib) = dejavu() else {
        return;
    };
    let a = rasterize_text("Same", 120, 50, &style(Justification::Center), &lib).unwrap();
    let b = rasterize_text("Same", 120, 50, &style(Justification::Center), &lib).unwrap();
    assert_eq!(a, b);
}
