//! Photoshop action descriptors, the typed key/value structure embedded in type tool blocks.

use crate::foundation::error::{TemplateError, TemplateResult};
use crate::psd::reader::Reader;

const MAX_DEPTH: usize = 64;

/// A parsed descriptor: class id plus ordered items.
#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct Descriptor {
    pub(crate) class_id: String,
    pub(crate) items: Vec<(String, DescValue)>,
}

impl Descriptor {
    pub(crate) fn get(&self, key: &str) -> Option<&DescValue> {
        self.items.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }
}

/// Every value type a descriptor item can carry.
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum DescValue {
    Descriptor(Descriptor),
    List(Vec<DescValue>),
    Double(f64),
    UnitFloat { unit: String, value: f64 },
    UnitFloats { unit: String, values: Vec<f64> },
    Text(String),
    Enum { type_id: String, value: String },
    Integer(i32),
    LargeInteger(i64),
    Bool(bool),
    Class { name: String, class_id: String },
    RawData(Vec<u8>),
    Reference(Vec<String>),
    ObjectArray(Vec<(String, Vec<f64>)>),
}

impl DescValue {
    pub(crate) fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    pub(crate) fn as_raw(&self) -> Option<&[u8]> {
        match self {
            Self::RawData(b) => Some(b),
            _ => None,
        }
    }
}

/// Parse a descriptor body (no leading version field).
pub(crate) fn read_descriptor(r: &mut Reader<'_>) -> TemplateResult<Descriptor> {
    read_descriptor_at(r, 0)
}

fn read_descriptor_at(r: &mut Reader<'_>, depth: usize) -> TemplateResult<Descriptor> {
    if depth > MAX_DEPTH {
        return Err(TemplateError::parse("descriptor nesting too deep"));
    }
    let _name = r.unicode_string("descriptor name")?;
    let class_id = read_id(r, "descriptor class id")?;
    let count = r.u32("descriptor item count")?;
    let mut items = Vec::new();
    for _ in 0..count {
        let key = read_id(r, "descriptor key")?;
        let ty = r.four_cc("descriptor value type")?;
        let value = read_value(r, ty, depth)?;
        items.push((key, value));
    }
    Ok(Descriptor { class_id, items })
}

/// Class ids and keys: a 32-bit length, or zero followed by a four-character code.
fn read_id(r: &mut Reader<'_>, what: &str) -> TemplateResult<String> {
    let len = r.u32(what)? as usize;
    let raw = if len == 0 { r.bytes(4, what)? } else { r.bytes(len, what)? };
    Ok(raw.iter().map(|&b| char::from(b)).collect())
}

fn four_cc_string(code: [u8; 4]) -> String {
    code.iter().map(|&b| char::from(b)).collect()
}

fn read_value(r: &mut Reader<'_>, ty: [u8; 4], depth: usize) -> TemplateResult<DescValue> {
    let value = match &ty {
        b"Objc" | b"GlbO" => DescValue::Descriptor(read_descriptor_at(r, depth + 1)?),
        b"VlLs" => {
            let count = r.u32("list length")?;
            let mut out = Vec::new();
            for _ in 0..count {
                let item_ty = r.four_cc("list item type")?;
                out.push(read_value(r, item_ty, depth + 1)?);
            }
            DescValue::List(out)
        }
        b"doub" => DescValue::Double(r.f64("double value")?),
        b"UntF" => DescValue::UnitFloat {
            unit: four_cc_string(r.four_cc("unit float unit")?),
            value: r.f64("unit float value")?,
        },
        b"UnFl" => {
            let unit = four_cc_string(r.four_cc("unit floats unit")?);
            let count = r.u32("unit floats count")?;
            let mut values = Vec::new();
            for _ in 0..count {
                values.push(r.f64("unit floats value")?);
            }
            DescValue::UnitFloats { unit, values }
        }
        b"TEXT" => DescValue::Text(r.unicode_string("text value")?),
        b"enum" => DescValue::Enum {
            type_id: read_id(r, "enum type")?,
            value: read_id(r, "enum value")?,
        },
        b"long" => DescValue::Integer(r.i32("integer value")?),
        b"comp" => DescValue::LargeInteger(r.i64("large integer value")?),
        b"bool" => DescValue::Bool(r.u8("boolean value")? != 0),
        b"type" | b"GlbC" => DescValue::Class {
            name: r.unicode_string("class name")?,
            class_id: read_id(r, "class id")?,
        },
        b"alis" | b"tdta" | b"Pth " => {
            let len = r.u32("raw data length")? as usize;
            DescValue::RawData(r.bytes(len, "raw data")?.to_vec())
        }
        b"obj " => DescValue::Reference(read_reference(r)?),
        b"ObAr" => DescValue::ObjectArray(read_object_array(r)?),
        other => {
            return Err(TemplateError::parse(format!(
                "unsupported descriptor value type '{}'",
                four_cc_string(*other)
            )));
        }
    };
    Ok(value)
}

fn read_reference(r: &mut Reader<'_>) -> TemplateResult<Vec<String>> {
    let count = r.u32("reference item count")?;
    let mut classes = Vec::new();
    for _ in 0..count {
        let ty = r.four_cc("reference item type")?;
        match &ty {
            b"prop" => {
                r.unicode_string("reference name")?;
                classes.push(read_id(r, "reference class")?);
                read_id(r, "reference key")?;
            }
            b"Clss" => {
                r.unicode_string("reference name")?;
                classes.push(read_id(r, "reference class")?);
            }
            b"Enmr" => {
                r.unicode_string("reference name")?;
                classes.push(read_id(r, "reference class")?);
                read_id(r, "reference enum type")?;
                read_id(r, "reference enum value")?;
            }
            b"rele" => {
                r.unicode_string("reference name")?;
                classes.push(read_id(r, "reference class")?);
                r.u32("reference offset")?;
            }
            b"Idnt" | b"indx" => {
                r.u32("reference index")?;
            }
            b"name" => {
                r.unicode_string("reference name")?;
                classes.push(read_id(r, "reference class")?);
                r.unicode_string("reference value")?;
            }
            other => {
                return Err(TemplateError::parse(format!(
                    "unsupported reference item '{}'",
                    four_cc_string(*other)
                )));
            }
        }
    }
    Ok(classes)
}

fn read_object_array(r: &mut Reader<'_>) -> TemplateResult<Vec<(String, Vec<f64>)>> {
    let _version = r.u32("object array version")?;
    r.unicode_string("object array name")?;
    read_id(r, "object array class")?;
    let count = r.u32("object array item count")?;
    let mut out = Vec::new();
    for _ in 0..count {
        let key = read_id(r, "object array key")?;
        let ty = r.four_cc("object array value type")?;
        if &ty != b"UnFl" {
            return Err(TemplateError::parse("object array items must be unit float lists"));
        }
        r.four_cc("object array unit")?;
        let n = r.u32("object array value count")?;
        let mut values = Vec::new();
        for _ in 0..n {
            values.push(r.f64("object array value")?);
        }
        out.push((key, values));
    }
    Ok(out)
}

#[cfg(test)]
#[path = "../../tests/unit/psd/descriptor.rs"]
mod tests;
