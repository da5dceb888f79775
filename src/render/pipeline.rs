use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use rayon::prelude::*;

use crate::document::flatten::flatten_layers;
use crate::document::model::Document;
use crate::foundation::error::{TemplateError, TemplateResult, read_input};
use crate::psd::loader::{LoadOpts, load_document_from_path};
use crate::render::composite::{Overlay, compose, encode_png, write_output};
use crate::render::fonts::FontLibrary;
use crate::render::text::{rasterize_text, raster_size_for};
use crate::template::directive::substitution_key;
use crate::template::regions::{RegionMap, extract_regions_from_document};
use crate::template::style::{StyleDefaults, resolve_style};

/// Replacement text keyed by substitution key (`{{KEY}}` without the braces).
pub type Replacements = BTreeMap<String, String>;

/// Renderer configuration.
///
/// Deserializes from JSON with every field optional.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct RenderOpts {
    /// Fallbacks for missing text styling.
    pub style: StyleDefaults,
    /// Decoding switches used when loading documents. Rendering reads layer metadata only, so
    /// the default skips all pixel data.
    pub load: LoadOpts,
    /// Worker count for [`TemplateRenderer::render_batch`]; `None` uses the rayon default.
    pub threads: Option<usize>,
}

impl Default for RenderOpts {
    fn default() -> Self {
        Self {
            style: StyleDefaults::default(),
            load: LoadOpts::metadata_only(),
            threads: None,
        }
    }
}

impl RenderOpts {
    /// Return options with a different style default table.
    pub fn with_style(mut self, style: StyleDefaults) -> Self {
        self.style = style;
        self
    }

    /// Return options with different load switches.
    pub fn with_load(mut self, load: LoadOpts) -> Self {
        self.load = load;
        self
    }

    /// Return options with a fixed batch worker count.
    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = Some(threads);
        self
    }
}

/// One unit of batch work.
#[derive(Clone, Debug, Default)]
pub struct RenderRequest {
    /// Layered document path.
    pub document: PathBuf,
    /// Background image path.
    pub background: PathBuf,
    /// Output path; `None` renders to memory only.
    pub output: Option<PathBuf>,
    /// Replacement text.
    pub replacements: Replacements,
}

/// Fills `{{KEY}}` text layers and composites them over a background.
///
/// Holds immutable options and shared fonts, so one renderer can serve concurrent callers.
#[derive(Clone, Debug, Default)]
pub struct TemplateRenderer {
    opts: RenderOpts,
    fonts: Arc<FontLibrary>,
}

impl TemplateRenderer {
    /// Renderer with default options.
    pub fn new(fonts: FontLibrary) -> Self {
        Self {
            opts: RenderOpts::default(),
            fonts: Arc::new(fonts),
        }
    }

    /// Return the renderer with different options.
    pub fn with_opts(mut self, opts: RenderOpts) -> Self {
        self.opts = opts;
        self
    }

    /// Current options.
    pub fn opts(&self) -> &RenderOpts {
        &self.opts
    }

    /// Registered fonts.
    pub fn fonts(&self) -> &FontLibrary {
        &self.fonts
    }

    /// Render and write a PNG to `output`, returning the encoded bytes.
    #[tracing::instrument(skip(self, replacements), fields(keys = replacements.len()))]
    pub fn render_to_file(
        &self,
        document: &Path,
        background: &Path,
        output: &Path,
        replacements: &Replacements,
    ) -> TemplateResult<Vec<u8>> {
        let png = self.render_to_buffer(document, background, replacements)?;
        write_output(output, &png)?;
        tracing::debug!(bytes = png.len(), "wrote output");
        Ok(png)
    }

    /// Render to PNG bytes without touching the filesystem beyond reading inputs.
    #[tracing::instrument(skip(self, replacements), fields(keys = replacements.len()))]
    pub fn render_to_buffer(
        &self,
        document: &Path,
        background: &Path,
        replacements: &Replacements,
    ) -> TemplateResult<Vec<u8>> {
        let doc = load_document_from_path(document, self.opts.load)?;
        let background = read_input(background, "background")?;
        let img = self.render_document(&doc, &background, replacements)?;
        encode_png(&img)
    }

    /// Render an already-loaded document over encoded background bytes.
    pub fn render_document(
        &self,
        doc: &Document,
        background: &[u8],
        replacements: &Replacements,
    ) -> TemplateResult<image::RgbaImage> {
        let overlays = plan_overlays(doc, replacements, &self.opts.style, &self.fonts)?;
        compose(background, doc.canvas, &overlays)
    }

    /// Run every request on the rayon pool. Results keep input order; one failing request does
    /// not affect the others.
    #[tracing::instrument(skip(self, requests), fields(requests = requests.len()))]
    pub fn render_batch(
        &self,
        requests: &[RenderRequest],
    ) -> TemplateResult<Vec<TemplateResult<Vec<u8>>>> {
        let pool = build_thread_pool(self.opts.threads)?;
        Ok(pool.install(|| {
            requests
                .par_iter()
                .map(|req| match &req.output {
                    Some(out) => {
                        self.render_to_file(&req.document, &req.background, out, &req.replacements)
                    }
                    None => self.render_to_buffer(&req.document, &req.background, &req.replacements),
                })
                .collect()
        }))
    }
}

/// Rasterize every substitutable text layer that has a replacement, in flatten order.
///
/// Layers without a replacement keep nothing drawn; replacement keys without a layer are inert.
pub fn plan_overlays(
    doc: &Document,
    replacements: &Replacements,
    defaults: &StyleDefaults,
    fonts: &FontLibrary,
) -> TemplateResult<Vec<Overlay>> {
    let mut overlays = Vec::new();
    let mut used = BTreeSet::new();
    for layer in flatten_layers(doc) {
        let Some(key) = substitution_key(layer) else {
            continue;
        };
        let Some(value) = replacements.get(&key) else {
            tracing::debug!(layer = %layer.name, key = %key, "no replacement, skipping layer");
            continue;
        };
        let style = resolve_style(layer, defaults);
        let (width, height) = raster_size_for(layer.bounds, value, style.font_size_px);
        let raster = rasterize_text(value, width, height, &style, fonts)?;
        overlays.push(Overlay {
            raster,
            left: layer.bounds.left,
            top: layer.bounds.top,
        });
        used.insert(key);
    }
    for key in replacements.keys().filter(|k| !used.contains(*k)) {
        tracing::debug!(key = %key, "replacement matches no text layer");
    }
    Ok(overlays)
}

/// Load a document and export its `[NAME]` regions.
#[tracing::instrument]
pub fn extract_regions(document: &Path) -> TemplateResult<RegionMap> {
    let doc = load_document_from_path(document, LoadOpts::metadata_only())?;
    Ok(extract_regions_from_document(&doc))
}

fn build_thread_pool(threads: Option<usize>) -> TemplateResult<rayon::ThreadPool> {
    if let Some(n) = threads
        && n == 0
    {
        return Err(TemplateError::validation(
            "render option 'threads' must be >= 1 when set",
        ));
    }

    let mut builder = rayon::ThreadPoolBuilder::new();
    if let Some(n) = threads {
        builder = builder.num_threads(n);
    }
    builder.build().map_err(|e| {
        TemplateError::Other(anyhow::anyhow!("failed to build rayon thread pool: {e}"))
    })
}

#[cfg(test)]
#[path = "../../tests/unit/render/pipeline.rs"]
mod tests;
