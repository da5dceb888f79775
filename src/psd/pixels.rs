//! Channel image data: raw and PackBits planes, assembled into RGBA rasters.

use crate::foundation::error::{TemplateError, TemplateResult};
use crate::psd::reader::Reader;

pub(crate) const COLOR_MODE_GRAYSCALE: u16 = 1;
pub(crate) const COLOR_MODE_RGB: u16 = 3;

const COMPRESSION_RAW: u16 = 0;
const COMPRESSION_RLE: u16 = 1;
const COMPRESSION_ZIP: u16 = 2;
const COMPRESSION_ZIP_PREDICTED: u16 = 3;

/// Geometry of one channel plane.
#[derive(Clone, Copy, Debug)]
pub(crate) struct PlaneSpec {
    pub(crate) width: usize,
    pub(crate) height: usize,
    /// 1 for 8-bit documents, 2 for 16-bit.
    pub(crate) bytes_per_sample: usize,
    /// PSB stores RLE row counts as 32-bit values.
    pub(crate) wide: bool,
}

impl PlaneSpec {
    fn row_len(self) -> TemplateResult<usize> {
        self.width
            .checked_mul(self.bytes_per_sample)
            .ok_or_else(|| TemplateError::parse(format!("channel row width {} overflows", self.width)))
    }

    fn plane_len(self) -> TemplateResult<usize> {
        self.row_len()?.checked_mul(self.height).ok_or_else(|| {
            TemplateError::parse(format!(
                "channel plane {}x{} overflows",
                self.width, self.height
            ))
        })
    }
}

/// Fewest PackBits bytes that can expand to `row_len` bytes: one header and one value per
/// 128-byte repeat run.
fn min_packbits_len(row_len: usize) -> usize {
    row_len.div_ceil(128) * 2
}

/// Bytes per sample for depths we can reduce to 8-bit, `None` otherwise.
pub(crate) fn bytes_per_sample(depth: u16) -> Option<usize> {
    match depth {
        8 => Some(1),
        16 => Some(2),
        _ => None,
    }
}

/// Expand PackBits data into exactly `expected` bytes.
pub(crate) fn unpack_bits(src: &[u8], expected: usize) -> TemplateResult<Vec<u8>> {
    let mut out = Vec::with_capacity(expected);
    let mut i = 0usize;
    while i < src.len() && out.len() < expected {
        let n = src[i] as i8;
        i += 1;
        if n >= 0 {
            let count = n as usize + 1;
            let lit = src
                .get(i..i + count)
                .ok_or_else(|| TemplateError::parse("packbits literal run past end of row"))?;
            out.extend_from_slice(lit);
            i += count;
        } else if n != -128 {
            let count = (1 - i32::from(n)) as usize;
            let b = *src
                .get(i)
                .ok_or_else(|| TemplateError::parse("packbits repeat run past end of row"))?;
            out.extend(std::iter::repeat_n(b, count));
            i += 1;
        }
    }
    if out.len() < expected {
        return Err(TemplateError::parse(format!(
            "packbits row decoded to {} bytes, expected {expected}",
            out.len()
        )));
    }
    out.truncate(expected);
    Ok(out)
}

fn read_row_counts(r: &mut Reader<'_>, rows: usize, wide: bool) -> TemplateResult<Vec<usize>> {
    let field = if wide { 4 } else { 2 };
    if rows.checked_mul(field).is_none_or(|need| need > r.remaining()) {
        return Err(TemplateError::parse(format!(
            "rle row table claims {rows} rows, only {} bytes left",
            r.remaining()
        )));
    }
    let mut counts = Vec::with_capacity(rows);
    for _ in 0..rows {
        let n = if wide {
            r.u32("rle row length")? as usize
        } else {
            usize::from(r.u16("rle row length")?)
        };
        counts.push(n);
    }
    Ok(counts)
}

fn read_rle_plane(r: &mut Reader<'_>, counts: &[usize], spec: PlaneSpec) -> TemplateResult<Vec<u8>> {
    let row_len = spec.row_len()?;
    spec.plane_len()?;
    // Check the whole row table against the data before expanding anything.
    let total = counts
        .iter()
        .try_fold(0usize, |acc, &n| acc.checked_add(n))
        .filter(|&t| t <= r.remaining())
        .ok_or_else(|| TemplateError::parse("rle row lengths exceed channel data"))?;
    let min_row = min_packbits_len(row_len);
    if counts.iter().any(|&n| n < min_row) {
        return Err(TemplateError::parse(format!(
            "rle row shorter than {min_row} bytes cannot expand to {row_len} bytes"
        )));
    }
    tracing::trace!(rows = counts.len(), bytes = total, "decoding rle plane");

    let mut plane = Vec::new();
    for &n in counts {
        let row = r.bytes(n, "rle row")?;
        plane.extend(unpack_bits(row, row_len)?);
    }
    Ok(plane)
}

fn to_8bit(plane: Vec<u8>, bytes_per_sample: usize) -> Vec<u8> {
    if bytes_per_sample == 1 {
        return plane;
    }
    plane.chunks_exact(bytes_per_sample).map(|s| s[0]).collect()
}

/// Decode one layer channel (compression tag followed by data).
///
/// Returns `None` for zip-compressed channels, which are left undecoded.
pub(crate) fn decode_layer_channel(data: &[u8], spec: PlaneSpec) -> TemplateResult<Option<Vec<u8>>> {
    if spec.width == 0 || spec.height == 0 {
        return Ok(Some(Vec::new()));
    }
    let mut r = Reader::new(data);
    let compression = r.u16("channel compression")?;
    let plane = match compression {
        COMPRESSION_RAW => r.bytes(spec.plane_len()?, "raw channel data")?.to_vec(),
        COMPRESSION_RLE => {
            let counts = read_row_counts(&mut r, spec.height, spec.wide)?;
            read_rle_plane(&mut r, &counts, spec)?
        }
        COMPRESSION_ZIP | COMPRESSION_ZIP_PREDICTED => return Ok(None),
        other => {
            return Err(TemplateError::parse(format!(
                "unknown channel compression {other}"
            )));
        }
    };
    Ok(Some(to_8bit(plane, spec.bytes_per_sample)))
}

/// Decode the merged image section into one 8-bit plane per channel.
pub(crate) fn decode_composite_planes(
    r: &mut Reader<'_>,
    channels: usize,
    spec: PlaneSpec,
) -> TemplateResult<Option<Vec<Vec<u8>>>> {
    let compression = r.u16("composite compression")?;
    let mut planes = Vec::with_capacity(channels);
    match compression {
        COMPRESSION_RAW => {
            for _ in 0..channels {
                let plane = r.bytes(spec.plane_len()?, "composite plane")?.to_vec();
                planes.push(to_8bit(plane, spec.bytes_per_sample));
            }
        }
        COMPRESSION_RLE => {
            let rows = channels.checked_mul(spec.height).ok_or_else(|| {
                TemplateError::parse("composite row table overflows")
            })?;
            let counts = read_row_counts(r, rows, spec.wide)?;
            for rows in counts.chunks(spec.height.max(1)) {
                let plane = read_rle_plane(r, rows, spec)?;
                planes.push(to_8bit(plane, spec.bytes_per_sample));
            }
        }
        COMPRESSION_ZIP | COMPRESSION_ZIP_PREDICTED => return Ok(None),
        other => {
            return Err(TemplateError::parse(format!(
                "unknown composite compression {other}"
            )));
        }
    }
    Ok(Some(planes))
}

/// Interleave 8-bit planes into a straight-alpha RGBA image.
///
/// `plane(id)` looks up a channel by its id (0..=2 color, -1 transparency). Missing alpha reads
/// as opaque. Unsupported color modes yield `None`.
pub(crate) fn assemble_rgba<'p>(
    color_mode: u16,
    width: u32,
    height: u32,
    plane: impl Fn(i16) -> Option<&'p [u8]>,
) -> Option<image::RgbaImage> {
    let n = (width as usize).checked_mul(height as usize)?;
    let get = |id: i16| plane(id).filter(|p| p.len() >= n);
    let (r, g, b) = match color_mode {
        COLOR_MODE_RGB => (get(0)?, get(1)?, get(2)?),
        COLOR_MODE_GRAYSCALE => {
            let gray = get(0)?;
            (gray, gray, gray)
        }
        _ => return None,
    };
    let alpha = get(-1);

    let mut out = Vec::with_capacity(n.checked_mul(4)?);
    for i in 0..n {
        out.extend_from_slice(&[r[i], g[i], b[i], alpha.map_or(255, |a| a[i])]);
    }
    image::RgbaImage::from_raw(width, height, out)
}

#[cfg(test)]
#[path = "../../tests/unit/psd/pixels.rs"]
mod tests;
