//! Container loader: header, resources, layer records and image data.

use std::path::Path;

use crate::document::model::{ContainerVersion, Document, LayerKind, LayerNode, TextData};
use crate::foundation::core::{Bounds, Canvas};
use crate::foundation::error::{TemplateError, TemplateResult, read_input};
use crate::psd::pixels::{self, PlaneSpec};
use crate::psd::reader::Reader;
use crate::psd::text::read_type_tool;

const SIGNATURE: &[u8; 4] = b"8BPS";
const MAX_CHANNELS: u16 = 56;
const MAX_PSD_DIMENSION: u32 = 30_000;
const MAX_PSB_DIMENSION: u32 = 300_000;

const RESOURCE_THUMBNAIL: u16 = 1036;
const RESOURCE_THUMBNAIL_BGR: u16 = 1033;

const SECTION_OPEN_FOLDER: u32 = 1;
const SECTION_CLOSED_FOLDER: u32 = 2;
const SECTION_DIVIDER: u32 = 3;

const FLAG_HIDDEN: u8 = 0x02;

/// Additional-info keys whose length field is 64-bit in PSB files.
const WIDE_LENGTH_KEYS: [&[u8; 4]; 13] = [
    b"LMsk", b"Lr16", b"Lr32", b"Layr", b"Mt16", b"Mt32", b"Mtrn", b"Alph", b"FMsk", b"lnk2",
    b"FEid", b"FXid", b"PxSD",
];

/// Decoding switches for [`load_document`].
///
/// Only layer metadata (names, bounds, text styling) feeds rendering, so skipping pixel data is a
/// pure speed-up with no effect on rendered output.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct LoadOpts {
    /// Do not decode per-layer channel data.
    pub skip_layer_image_data: bool,
    /// Do not decode the merged composite image.
    pub skip_composite_image_data: bool,
    /// Do not decode the embedded preview thumbnail.
    pub skip_thumbnail: bool,
}

impl LoadOpts {
    /// Options that parse metadata only.
    pub fn metadata_only() -> Self {
        Self {
            skip_layer_image_data: true,
            skip_composite_image_data: true,
            skip_thumbnail: true,
        }
    }

    /// Return options with layer pixel decoding toggled.
    pub fn with_skip_layer_image_data(mut self, skip: bool) -> Self {
        self.skip_layer_image_data = skip;
        self
    }

    /// Return options with composite decoding toggled.
    pub fn with_skip_composite_image_data(mut self, skip: bool) -> Self {
        self.skip_composite_image_data = skip;
        self
    }

    /// Return options with thumbnail decoding toggled.
    pub fn with_skip_thumbnail(mut self, skip: bool) -> Self {
        self.skip_thumbnail = skip;
        self
    }
}

/// Read and parse a document from disk.
pub fn load_document_from_path(path: impl AsRef<Path>, opts: LoadOpts) -> TemplateResult<Document> {
    let path = path.as_ref();
    let bytes = read_input(path, "document")?;
    load_document(&bytes, opts)
}

/// Parse a document from raw container bytes.
#[tracing::instrument(skip(bytes), fields(len = bytes.len()))]
pub fn load_document(bytes: &[u8], opts: LoadOpts) -> TemplateResult<Document> {
    let mut r = Reader::new(bytes);
    let header = read_header(&mut r)?;

    let color_data_len = r.u32("color mode data length")? as usize;
    r.skip(color_data_len, "color mode data")?;

    let resources_len = r.u32("image resources length")? as usize;
    let mut resources = r.sub(resources_len, "image resources")?;
    let thumbnail = if opts.skip_thumbnail {
        None
    } else {
        read_thumbnail(&mut resources)?
    };

    let layer_mask_len = r.length(header.wide(), "layer and mask info length")?;
    let mut layer_mask = r.sub(layer_mask_len, "layer and mask info")?;
    let records = read_layer_and_mask(&mut layer_mask, &header, opts)?;
    let children = build_tree(records)?;

    let composite = if opts.skip_composite_image_data || r.is_empty() {
        None
    } else {
        read_composite(&mut r, &header)?
    };

    tracing::debug!(
        width = header.canvas.width,
        height = header.canvas.height,
        top_level_layers = children.len(),
        "loaded document"
    );

    Ok(Document {
        canvas: header.canvas,
        version: header.version,
        depth: header.depth,
        color_mode: header.color_mode,
        children,
        composite,
        thumbnail,
    })
}

#[derive(Clone, Copy, Debug)]
struct Header {
    version: ContainerVersion,
    channels: u16,
    canvas: Canvas,
    depth: u16,
    color_mode: u16,
}

impl Header {
    fn wide(&self) -> bool {
        self.version == ContainerVersion::Psb
    }
}

fn read_header(r: &mut Reader<'_>) -> TemplateResult<Header> {
    let sig = r.four_cc("signature")?;
    if &sig != SIGNATURE {
        return Err(TemplateError::parse("bad signature: not a layered document"));
    }
    let version = match r.u16("version")? {
        1 => ContainerVersion::Psd,
        2 => ContainerVersion::Psb,
        v => return Err(TemplateError::parse(format!("unsupported version {v}"))),
    };
    r.skip(6, "reserved header bytes")?;
    let channels = r.u16("channel count")?;
    if channels == 0 || channels > MAX_CHANNELS {
        return Err(TemplateError::parse(format!("invalid channel count {channels}")));
    }
    let height = r.u32("canvas height")?;
    let width = r.u32("canvas width")?;
    let max = match version {
        ContainerVersion::Psd => MAX_PSD_DIMENSION,
        ContainerVersion::Psb => MAX_PSB_DIMENSION,
    };
    if width == 0 || height == 0 || width > max || height > max {
        return Err(TemplateError::parse(format!(
            "invalid canvas size {width}x{height}"
        )));
    }
    let depth = r.u16("bit depth")?;
    if !matches!(depth, 1 | 8 | 16 | 32) {
        return Err(TemplateError::parse(format!("invalid bit depth {depth}")));
    }
    let color_mode = r.u16("color mode")?;
    Ok(Header {
        version,
        channels,
        canvas: Canvas { width, height },
        depth,
        color_mode,
    })
}

/// Walk the image resource blocks and decode the JPEG thumbnail if one is present.
///
/// Resource 1033 is the pre-5.0 variant with red and blue swapped. A thumbnail that fails to
/// decode is dropped with a warning; it never affects rendering.
fn read_thumbnail(r: &mut Reader<'_>) -> TemplateResult<Option<image::RgbaImage>> {
    while r.remaining() >= 12 {
        r.four_cc("resource signature")?;
        let id = r.u16("resource id")?;
        r.pascal_string(2, "resource name")?;
        let size = r.u32("resource size")? as usize;
        let data = r.bytes(size, "resource data")?;
        if size % 2 == 1 && !r.is_empty() {
            r.skip(1, "resource padding")?;
        }
        if id != RESOURCE_THUMBNAIL && id != RESOURCE_THUMBNAIL_BGR {
            continue;
        }
        // 28-byte thumbnail header precedes the JFIF stream.
        let Some(jpeg) = data.get(28..) else {
            tracing::warn!("thumbnail resource shorter than its header");
            return Ok(None);
        };
        return match image::load_from_memory_with_format(jpeg, image::ImageFormat::Jpeg) {
            Ok(img) => {
                let mut rgba = img.to_rgba8();
                if id == RESOURCE_THUMBNAIL_BGR {
                    for px in rgba.pixels_mut() {
                        px.0.swap(0, 2);
                    }
                }
                Ok(Some(rgba))
            }
            Err(e) => {
                tracing::warn!(error = %e, "thumbnail did not decode");
                Ok(None)
            }
        };
    }
    Ok(None)
}

/// Metadata of one layer record, before the tree is assembled.
#[derive(Debug)]
struct LayerRecord {
    name: String,
    bounds: Bounds,
    channels: Vec<(i16, usize)>,
    opacity: u8,
    visible: bool,
    section: Option<u32>,
    text: Option<TextData>,
    raster: Option<image::RgbaImage>,
}

fn read_layer_and_mask(
    r: &mut Reader<'_>,
    header: &Header,
    opts: LoadOpts,
) -> TemplateResult<Vec<LayerRecord>> {
    if r.is_empty() {
        return Ok(Vec::new());
    }
    let info_len = r.length(header.wide(), "layer info length")?;
    let mut records = if info_len > 0 {
        let mut info = r.sub(info_len, "layer info")?;
        read_layer_info(&mut info, header, opts)?
    } else {
        Vec::new()
    };

    if r.remaining() < 4 {
        return Ok(records);
    }
    let global_mask_len = r.u32("global layer mask length")? as usize;
    r.skip(global_mask_len, "global layer mask")?;

    // 16/32-bit documents keep their layer info in a global tagged block instead.
    while records.is_empty() && r.remaining() >= 12 {
        let sig = r.four_cc("global block signature")?;
        if &sig != b"8BIM" && &sig != b"8B64" {
            break;
        }
        let key = r.four_cc("global block key")?;
        let len = block_length(r, header, &key)?;
        let data = r.bytes(len, "global block data")?;
        if matches!(&key, b"Lr16" | b"Lr32" | b"Layr") {
            records = read_layer_info(&mut Reader::new(data), header, opts)?;
        }
        let pad = (4 - len % 4) % 4;
        if r.remaining() < pad {
            break;
        }
        r.skip(pad, "global block padding")?;
    }
    Ok(records)
}

fn block_length(r: &mut Reader<'_>, header: &Header, key: &[u8; 4]) -> TemplateResult<usize> {
    let wide = header.wide() && WIDE_LENGTH_KEYS.contains(&key);
    r.length(wide, "additional info length")
}

fn read_layer_info(
    r: &mut Reader<'_>,
    header: &Header,
    opts: LoadOpts,
) -> TemplateResult<Vec<LayerRecord>> {
    let count = r.i16("layer count")?.unsigned_abs();
    let mut records = Vec::with_capacity(usize::from(count));
    for _ in 0..count {
        records.push(read_layer_record(r, header)?);
    }

    if opts.skip_layer_image_data {
        return Ok(records);
    }
    let bps = pixels::bytes_per_sample(header.depth);
    for rec in &mut records {
        let (width, height) = (rec.bounds.width(), rec.bounds.height());
        if width > MAX_PSB_DIMENSION || height > MAX_PSB_DIMENSION {
            return Err(TemplateError::parse(format!(
                "layer '{}' spans {width}x{height}, larger than any valid document",
                rec.name
            )));
        }
        let mut planes: Vec<(i16, Vec<u8>)> = Vec::new();
        for &(id, len) in &rec.channels {
            let data = r.bytes(len, "channel image data")?;
            let Some(bps) = bps else { continue };
            if id < -1 {
                continue;
            }
            let spec = PlaneSpec {
                width: width as usize,
                height: height as usize,
                bytes_per_sample: bps,
                wide: header.wide(),
            };
            if let Some(plane) = pixels::decode_layer_channel(data, spec)? {
                planes.push((id, plane));
            }
        }
        if rec.bounds.is_empty() {
            continue;
        }
        rec.raster = pixels::assemble_rgba(
            header.color_mode,
            width,
            height,
            |id| planes.iter().find(|(pid, _)| *pid == id).map(|(_, p)| p.as_slice()),
        );
    }
    Ok(records)
}

fn read_layer_record(r: &mut Reader<'_>, header: &Header) -> TemplateResult<LayerRecord> {
    let top = r.i32("layer top")?;
    let left = r.i32("layer left")?;
    let bottom = r.i32("layer bottom")?;
    let right = r.i32("layer right")?;

    let channel_count = r.u16("layer channel count")?;
    if channel_count > MAX_CHANNELS {
        return Err(TemplateError::parse(format!(
            "invalid layer channel count {channel_count}"
        )));
    }
    let mut channels = Vec::with_capacity(usize::from(channel_count));
    for _ in 0..channel_count {
        let id = r.i16("channel id")?;
        let len = r.length(header.wide(), "channel data length")?;
        channels.push((id, len));
    }

    let blend_sig = r.four_cc("blend mode signature")?;
    if &blend_sig != b"8BIM" {
        return Err(TemplateError::parse("bad blend mode signature in layer record"));
    }
    r.four_cc("blend mode key")?;
    let opacity = r.u8("layer opacity")?;
    r.u8("layer clipping")?;
    let flags = r.u8("layer flags")?;
    r.u8("layer filler")?;

    let extra_len = r.u32("layer extra data length")? as usize;
    let mut extra = r.sub(extra_len, "layer extra data")?;
    let mask_len = extra.u32("layer mask length")? as usize;
    extra.skip(mask_len, "layer mask data")?;
    let ranges_len = extra.u32("blending ranges length")? as usize;
    extra.skip(ranges_len, "blending ranges")?;
    let mut name = extra.pascal_string(4, "layer name")?;

    let mut section = None;
    let mut text = None;
    while extra.remaining() >= 12 {
        let sig = extra.four_cc("additional info signature")?;
        if &sig != b"8BIM" && &sig != b"8B64" {
            return Err(TemplateError::parse("bad additional info signature"));
        }
        let key = extra.four_cc("additional info key")?;
        let len = block_length(&mut extra, header, &key)?;
        let data = extra.bytes(len, "additional info data")?;
        if len % 2 == 1 && !extra.is_empty() {
            extra.skip(1, "additional info padding")?;
        }
        match &key {
            b"luni" => {
                let unicode = Reader::new(data).unicode_string("unicode layer name")?;
                if !unicode.is_empty() {
                    name = unicode;
                }
            }
            b"lsct" | b"lsdk" => {
                section = Some(Reader::new(data).u32("section divider type")?);
            }
            b"TySh" => {
                text = Some(read_type_tool(data).unwrap_or_else(|e| {
                    tracing::warn!(layer = %name, error = %e, "text styling unreadable, using defaults");
                    TextData::default()
                }));
            }
            _ => {}
        }
    }

    Ok(LayerRecord {
        name,
        bounds: Bounds::new(left, top, right, bottom),
        channels,
        opacity,
        visible: flags & FLAG_HIDDEN == 0,
        section,
        text,
        raster: None,
    })
}

/// Rebuild the group hierarchy from the flat, bottom-most-first record list.
///
/// A divider record opens a group whose children follow it; the folder record closes it and
/// carries the group's name and flags.
fn build_tree(records: Vec<LayerRecord>) -> TemplateResult<Vec<LayerNode>> {
    let mut stack: Vec<Vec<LayerNode>> = vec![Vec::new()];
    for mut rec in records {
        match rec.section {
            Some(SECTION_DIVIDER) => stack.push(Vec::new()),
            Some(SECTION_OPEN_FOLDER | SECTION_CLOSED_FOLDER) => {
                if stack.len() < 2 {
                    return Err(TemplateError::parse(format!(
                        "layer group '{}' has no matching section divider",
                        rec.name
                    )));
                }
                let children = stack.pop().unwrap_or_default();
                let node = rec.into_node(LayerKind::Group { children });
                push_node(&mut stack, node);
            }
            _ => {
                let kind = match rec.text.take() {
                    Some(text) => LayerKind::Text(text),
                    None => LayerKind::Other,
                };
                let node = rec.into_node(kind);
                push_node(&mut stack, node);
            }
        }
    }
    if stack.len() != 1 {
        return Err(TemplateError::parse(format!(
            "{} layer group(s) left unclosed",
            stack.len() - 1
        )));
    }
    Ok(stack.pop().unwrap_or_default())
}

fn push_node(stack: &mut [Vec<LayerNode>], node: LayerNode) {
    if let Some(top) = stack.last_mut() {
        top.push(node);
    }
}

impl LayerRecord {
    fn into_node(self, kind: LayerKind) -> LayerNode {
        LayerNode {
            name: self.name,
            bounds: self.bounds,
            visible: self.visible,
            opacity: self.opacity,
            kind,
            raster: self.raster,
        }
    }
}

fn read_composite(r: &mut Reader<'_>, header: &Header) -> TemplateResult<Option<image::RgbaImage>> {
    let Some(bps) = pixels::bytes_per_sample(header.depth) else {
        tracing::debug!(depth = header.depth, "composite depth not decoded");
        return Ok(None);
    };
    let spec = PlaneSpec {
        width: header.canvas.width as usize,
        height: header.canvas.height as usize,
        bytes_per_sample: bps,
        wide: header.wide(),
    };
    let Some(planes) = pixels::decode_composite_planes(r, usize::from(header.channels), spec)?
    else {
        return Ok(None);
    };
    // Merged data lists color channels first, then the transparency channel if any.
    let color_channels: usize = match header.color_mode {
        pixels::COLOR_MODE_GRAYSCALE => 1,
        _ => 3,
    };
    Ok(pixels::assemble_rgba(
        header.color_mode,
        header.canvas.width,
        header.canvas.height,
        |id| {
            let idx = if id < 0 { color_channels } else { id as usize };
            planes.get(idx).map(Vec::as_slice)
        },
    ))
}

#[cfg(test)]
#[path = "../../tests/unit/psd/loader.rs"]
mod tests;
