//! Parser for the text engine's `EngineData` blob.
//!
//! The blob is a PostScript-flavoured literal: `<< /Key value ... >>` dictionaries, `[ ... ]`
//! arrays, numbers, `true`/`false`, and parenthesised strings that are usually UTF-16BE with a
//! byte-order mark.

use crate::foundation::error::{TemplateError, TemplateResult};
use crate::psd::reader::decode_utf16be;

const MAX_DEPTH: usize = 128;

#[derive(Clone, Debug, PartialEq)]
pub(crate) enum EngineValue {
    Dict(Vec<(String, EngineValue)>),
    Array(Vec<EngineValue>),
    Number(f64),
    Bool(bool),
    String(String),
    Name(String),
    Null,
}

impl EngineValue {
    pub(crate) fn get(&self, key: &str) -> Option<&EngineValue> {
        match self {
            Self::Dict(items) => items.iter().find(|(k, _)| k == key).map(|(_, v)| v),
            _ => None,
        }
    }

    /// Follow a `/`-free key path through nested dictionaries.
    pub(crate) fn path(&self, keys: &[&str]) -> Option<&EngineValue> {
        keys.iter().try_fold(self, |v, k| v.get(k))
    }

    pub(crate) fn as_array(&self) -> Option<&[EngineValue]> {
        match self {
            Self::Array(items) => Some(items),
            _ => None,
        }
    }

    pub(crate) fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub(crate) fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) | Self::Name(s) => Some(s),
            _ => None,
        }
    }
}

/// Parse an `EngineData` blob into its root value.
pub(crate) fn parse_engine_data(bytes: &[u8]) -> TemplateResult<EngineValue> {
    let mut p = Parser { src: bytes, pos: 0 };
    p.skip_ws();
    let root = p.value(0)?;
    p.skip_ws();
    if p.pos < p.src.len() {
        return Err(p.error("trailing data after root value"));
    }
    Ok(root)
}

struct Parser<'a> {
    src: &'a [u8],
    pos: usize,
}

impl Parser<'_> {
    fn error(&self, msg: &str) -> TemplateError {
        TemplateError::parse(format!("engine data: {msg} at byte {}", self.pos))
    }

    fn peek(&self) -> Option<u8> {
        self.src.get(self.pos).copied()
    }

    fn starts_with(&self, s: &[u8]) -> bool {
        self.src[self.pos..].starts_with(s)
    }

    fn skip_ws(&mut self) {
        while let Some(c) = self.peek() {
            if c.is_ascii_whitespace() || c == 0 {
                self.pos += 1;
            } else {
                break;
            }
        }
    }

    fn value(&mut self, depth: usize) -> TemplateResult<EngineValue> {
        if depth > MAX_DEPTH {
            return Err(self.error("nesting too deep"));
        }
        let c = self.peek().ok_or_else(|| self.error("unexpected end of data"))?;
        match c {
            b'<' if self.starts_with(b"<<") => self.dict(depth),
            b'[' => self.array(depth),
            b'(' => self.string(),
            b'/' => {
                self.pos += 1;
                Ok(EngineValue::Name(self.word()))
            }
            b'-' | b'.' | b'0'..=b'9' => self.number(),
            _ => match self.word().as_str() {
                "true" => Ok(EngineValue::Bool(true)),
                "false" => Ok(EngineValue::Bool(false)),
                "null" => Ok(EngineValue::Null),
                _ => Err(self.error("unexpected token")),
            },
        }
    }

    fn dict(&mut self, depth: usize) -> TemplateResult<EngineValue> {
        self.pos += 2;
        let mut items = Vec::new();
        loop {
            self.skip_ws();
            if self.starts_with(b">>") {
                self.pos += 2;
                return Ok(EngineValue::Dict(items));
            }
            if self.peek() != Some(b'/') {
                return Err(self.error("expected dictionary key"));
            }
            self.pos += 1;
            let key = self.word();
            self.skip_ws();
            let value = self.value(depth + 1)?;
            items.push((key, value));
        }
    }

    fn array(&mut self, depth: usize) -> TemplateResult<EngineValue> {
        self.pos += 1;
        let mut items = Vec::new();
        loop {
            self.skip_ws();
            match self.peek() {
                Some(b']') => {
                    self.pos += 1;
                    return Ok(EngineValue::Array(items));
                }
                Some(_) => items.push(self.value(depth + 1)?),
                None => return Err(self.error("unterminated array")),
            }
        }
    }

    fn string(&mut self) -> TemplateResult<EngineValue> {
        self.pos += 1;
        let mut raw = Vec::new();
        loop {
            let c = self.peek().ok_or_else(|| self.error("unterminated string"))?;
            self.pos += 1;
            match c {
                b'\\' => {
                    let next = self.peek().ok_or_else(|| self.error("dangling escape"))?;
                    self.pos += 1;
                    raw.push(next);
                }
                b')' => break,
                _ => raw.push(c),
            }
        }
        let text = if raw.starts_with(&[0xFE, 0xFF]) {
            decode_utf16be(&raw[2..])
        } else {
            raw.iter().map(|&b| char::from(b)).collect()
        };
        Ok(EngineValue::String(text))
    }

    fn number(&mut self) -> TemplateResult<EngineValue> {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if c == b'-' || c == b'.' || c.is_ascii_digit() {
                self.pos += 1;
            } else {
                break;
            }
        }
        let text = std::str::from_utf8(&self.src[start..self.pos])
            .map_err(|_| self.error("invalid number"))?;
        text.parse::<f64>()
            .map(EngineValue::Number)
            .map_err(|_| self.error("invalid number"))
    }

    /// A bare word: everything up to whitespace or a delimiter.
    fn word(&mut self) -> String {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if c.is_ascii_whitespace() || matches!(c, b'/' | b'<' | b'>' | b'[' | b']' | b'(' | b')')
            {
                break;
            }
            self.pos += 1;
        }
        self.src[start..self.pos]
            .iter()
            .map(|&b| char::from(b))
            .collect()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/psd/engine_data.rs"]
mod tests;
