use crate::foundation::error::{TemplateError, TemplateResult};

/// Big-endian cursor over a borrowed byte slice.
///
/// Every read is bounds-checked; running off the end yields [`TemplateError::Parse`] naming the
/// field that was being read.
#[derive(Clone, Debug)]
pub(crate) struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    pub(crate) fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    pub(crate) fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.pos)
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    pub(crate) fn bytes(&mut self, len: usize, what: &str) -> TemplateResult<&'a [u8]> {
        let end = self
            .pos
            .checked_add(len)
            .filter(|&end| end <= self.data.len())
            .ok_or_else(|| {
                TemplateError::parse(format!(
                    "truncated data reading {what}: need {len} bytes at offset {}, have {}",
                    self.pos,
                    self.remaining()
                ))
            })?;
        let out = &self.data[self.pos..end];
        self.pos = end;
        Ok(out)
    }

    pub(crate) fn skip(&mut self, len: usize, what: &str) -> TemplateResult<()> {
        self.bytes(len, what).map(|_| ())
    }

    /// Split off the next `len` bytes as an independent reader and advance past them.
    pub(crate) fn sub(&mut self, len: usize, what: &str) -> TemplateResult<Reader<'a>> {
        self.bytes(len, what).map(Reader::new)
    }

    pub(crate) fn u8(&mut self, what: &str) -> TemplateResult<u8> {
        Ok(self.bytes(1, what)?[0])
    }

    pub(crate) fn u16(&mut self, what: &str) -> TemplateResult<u16> {
        let b = self.bytes(2, what)?;
        Ok(u16::from_be_bytes([b[0], b[1]]))
    }

    pub(crate) fn i16(&mut self, what: &str) -> TemplateResult<i16> {
        let b = self.bytes(2, what)?;
        Ok(i16::from_be_bytes([b[0], b[1]]))
    }

    pub(crate) fn u32(&mut self, what: &str) -> TemplateResult<u32> {
        let b = self.bytes(4, what)?;
        Ok(u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
    }

    pub(crate) fn i32(&mut self, what: &str) -> TemplateResult<i32> {
        let b = self.bytes(4, what)?;
        Ok(i32::from_be_bytes([b[0], b[1], b[2], b[3]]))
    }

    pub(crate) fn u64(&mut self, what: &str) -> TemplateResult<u64> {
        let b = self.bytes(8, what)?;
        let mut arr = [0u8; 8];
        arr.copy_from_slice(b);
        Ok(u64::from_be_bytes(arr))
    }

    pub(crate) fn i64(&mut self, what: &str) -> TemplateResult<i64> {
        Ok(self.u64(what)? as i64)
    }

    pub(crate) fn f64(&mut self, what: &str) -> TemplateResult<f64> {
        Ok(f64::from_bits(self.u64(what)?))
    }

    pub(crate) fn four_cc(&mut self, what: &str) -> TemplateResult<[u8; 4]> {
        let b = self.bytes(4, what)?;
        Ok([b[0], b[1], b[2], b[3]])
    }

    /// Read a section length: 4 bytes for PSD, 8 bytes for PSB when `wide` is set.
    pub(crate) fn length(&mut self, wide: bool, what: &str) -> TemplateResult<usize> {
        let len = if wide {
            self.u64(what)?
        } else {
            u64::from(self.u32(what)?)
        };
        usize::try_from(len)
            .map_err(|_| TemplateError::parse(format!("{what} length {len} does not fit in memory")))
    }

    /// Pascal string: one length byte followed by that many bytes, the whole field padded to a
    /// multiple of `pad`.
    pub(crate) fn pascal_string(&mut self, pad: usize, what: &str) -> TemplateResult<String> {
        let len = usize::from(self.u8(what)?);
        let raw = self.bytes(len, what)?;
        let consumed = len + 1;
        let rem = consumed % pad;
        if rem != 0 {
            self.skip(pad - rem, what)?;
        }
        Ok(raw.iter().map(|&b| char::from(b)).collect())
    }

    /// UTF-16BE string prefixed with a 32-bit code unit count. A trailing NUL is dropped.
    pub(crate) fn unicode_string(&mut self, what: &str) -> TemplateResult<String> {
        let count = self.u32(what)? as usize;
        let byte_len = count
            .checked_mul(2)
            .ok_or_else(|| TemplateError::parse(format!("{what} length overflow")))?;
        let raw = self.bytes(byte_len, what)?;
        let mut s = decode_utf16be(raw);
        if s.ends_with('\0') {
            s.pop();
        }
        Ok(s)
    }
}

/// Decode big-endian UTF-16, replacing unpaired surrogates.
pub(crate) fn decode_utf16be(raw: &[u8]) -> String {
    let units = raw
        .chunks_exact(2)
        .map(|c| u16::from_be_bytes([c[0], c[1]]));
    char::decode_utf16(units)
        .map(|r| r.unwrap_or(char::REPLACEMENT_CHARACTER))
        .collect()
}

#[cfg(test)]
#[path = "../../tests/unit/psd/reader.rs"]
mod tests;
