//! psd-template fills text placeholders in layered design documents and composites them over a
//! background image.
//!
//! A template is an ordinary Photoshop document whose layer names carry directives:
//!
//! - `{{KEY}}` on a text layer: the layer's text is replaced with the value supplied for `KEY`,
//!   styled with the layer's own font, size, color and justification.
//! - `[NAME]` on any layer: the layer's bounds are exported as region `NAME`
//!   (`x`, `y`, `width`, `height`, `centerX`, `centerY`, `radius`).
//!
//! # Pipeline overview
//!
//! 1. **Load**: document bytes -> [`Document`] (canvas size + layer tree)
//! 2. **Flatten**: layer tree -> pre-order list in stacking order
//! 3. **Plan**: substitution layers + [`Replacements`] -> text rasters via [`resolve_style`] and
//!    [`rasterize_text`]
//! 4. **Compose**: background stretched to the canvas, rasters drawn at each layer's top-left,
//!    encoded as PNG
//!
//! Design constraints:
//!
//! - **No unsafe**: `unsafe` is forbidden in this crate.
//! - **Deterministic**: identical inputs produce byte-identical PNG output.
//! - **Explicit fonts**: no system font discovery; faces come from a [`FontLibrary`].
#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod document;
mod foundation;
mod psd;
mod render;
mod template;

pub use document::flatten::{flatten_layers, flatten_layers_with_depth};
pub use document::model::{
    ContainerVersion, Document, LayerKind, LayerNode, ParagraphStyle, StyleRun, TextData,
};
pub use foundation::core::{Bounds, Canvas, UnitRgb};
pub use foundation::error::{TemplateError, TemplateResult};
pub use psd::loader::{LoadOpts, load_document, load_document_from_path};
pub use render::composite::{Overlay, compose, encode_png, ensure_parent_dir, write_output};
pub use render::fonts::{FontFace, FontLibrary};
pub use render::pipeline::{
    RenderOpts, RenderRequest, Replacements, TemplateRenderer, extract_regions, plan_overlays,
};
pub use render::text::{TextBrushRgba8, TextRaster, raster_size_for, rasterize_text};
pub use template::directive::{Directive, match_directive, region_name, substitution_key};
pub use template::regions::{Region, RegionMap, extract_regions_from_document};
pub use template::style::{
    Justification, ResolvedStyle, StyleDefaults, fill_hex, resolve_style,
};

#[cfg(test)]
#[path = "../tests/support/mod.rs"]
pub(crate) mod test_support;
