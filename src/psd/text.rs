//! Type tool object (`TySh`) decoding into [`TextData`].

use crate::document::model::{ParagraphStyle, StyleRun, TextData};
use crate::foundation::core::UnitRgb;
use crate::foundation::error::{TemplateError, TemplateResult};
use crate::psd::descriptor::read_descriptor;
use crate::psd::engine_data::{EngineValue, parse_engine_data};
use crate::psd::reader::Reader;

const JUSTIFICATION_NAMES: [&str; 7] = [
    "left",
    "right",
    "center",
    "justify-left",
    "justify-right",
    "justify-center",
    "justify-all",
];

/// Decode the payload of a `TySh` additional-info block.
pub(crate) fn read_type_tool(data: &[u8]) -> TemplateResult<TextData> {
    let mut r = Reader::new(data);
    let version = r.u16("type tool version")?;
    if version != 1 {
        return Err(TemplateError::parse(format!(
            "unsupported type tool version {version}"
        )));
    }
    for _ in 0..6 {
        r.f64("type tool transform")?;
    }
    let text_version = r.u16("text version")?;
    if text_version != 50 {
        return Err(TemplateError::parse(format!(
            "unsupported text data version {text_version}"
        )));
    }
    let desc_version = r.u32("text descriptor version")?;
    if desc_version != 16 {
        return Err(TemplateError::parse(format!(
            "unsupported text descriptor version {desc_version}"
        )));
    }
    let desc = read_descriptor(&mut r)?;

    let engine = match desc.get("EngineData").and_then(|v| v.as_raw()) {
        Some(raw) => Some(parse_engine_data(raw)?),
        None => None,
    };

    let text = desc
        .get("Txt ")
        .and_then(|v| v.as_text())
        .map(str::to_string)
        .or_else(|| {
            engine
                .as_ref()
                .and_then(|e| e.path(&["EngineDict", "Editor", "Text"]))
                .and_then(|v| v.as_str())
                .map(str::to_string)
        })
        .unwrap_or_default();

    let Some(engine) = engine else {
        return Ok(TextData {
            text,
            ..TextData::default()
        });
    };

    Ok(TextData {
        text,
        paragraph: ParagraphStyle {
            justification: paragraph_runs(&engine).first().and_then(|(_, j)| j.clone()),
        },
        runs: style_runs(&engine),
    })
}

/// Paragraph runs as `(length, justification name)` pairs.
fn paragraph_runs(engine: &EngineValue) -> Vec<(usize, Option<String>)> {
    let Some(run) = engine.path(&["EngineDict", "ParagraphRun"]) else {
        return Vec::new();
    };
    let default = run
        .path(&["DefaultRunData", "ParagraphSheet", "Properties", "Justification"])
        .and_then(EngineValue::as_f64);
    let lengths = run_lengths(run);
    let sheets = run.get("RunArray").and_then(EngineValue::as_array).unwrap_or(&[]);

    sheets
        .iter()
        .enumerate()
        .map(|(i, sheet)| {
            let justification = sheet
                .path(&["ParagraphSheet", "Properties", "Justification"])
                .and_then(EngineValue::as_f64)
                .or(default)
                .and_then(justification_name)
                .map(str::to_string);
            (lengths.get(i).copied().unwrap_or(0), justification)
        })
        .collect()
}

fn style_runs(engine: &EngineValue) -> Vec<StyleRun> {
    let Some(run) = engine.path(&["EngineDict", "StyleRun"]) else {
        return Vec::new();
    };
    let fonts = font_names(engine);
    let default = run.path(&["DefaultRunData", "StyleSheet", "StyleSheetData"]);
    let lengths = run_lengths(run);
    let paragraphs = paragraph_runs(engine);
    let sheets = run.get("RunArray").and_then(EngineValue::as_array).unwrap_or(&[]);

    let mut offset = 0usize;
    sheets
        .iter()
        .enumerate()
        .map(|(i, sheet)| {
            let data = sheet.path(&["StyleSheet", "StyleSheetData"]);
            let field = |key: &str| {
                data.and_then(|d| d.get(key))
                    .or_else(|| default.and_then(|d| d.get(key)))
            };
            let length = lengths.get(i).copied().unwrap_or(0);
            let out = StyleRun {
                length,
                font_family: field("Font")
                    .and_then(EngineValue::as_f64)
                    .and_then(|idx| fonts.get(idx as usize).cloned()),
                font_size_pt: field("FontSize").and_then(EngineValue::as_f64),
                fill_color: field("FillColor").and_then(fill_color),
                justification: justification_at(&paragraphs, offset),
            };
            offset += length;
            out
        })
        .collect()
}

fn run_lengths(run: &EngineValue) -> Vec<usize> {
    run.get("RunLengthArray")
        .and_then(EngineValue::as_array)
        .unwrap_or(&[])
        .iter()
        .map(|v| v.as_f64().unwrap_or(0.0).max(0.0) as usize)
        .collect()
}

fn font_names(engine: &EngineValue) -> Vec<String> {
    let set = engine
        .path(&["ResourceDict", "FontSet"])
        .or_else(|| engine.path(&["DocumentResources", "FontSet"]))
        .and_then(EngineValue::as_array)
        .unwrap_or(&[]);
    set.iter()
        .map(|f| {
            f.get("Name")
                .and_then(EngineValue::as_str)
                .unwrap_or_default()
                .to_string()
        })
        .collect()
}

/// `FillColor` is `<< /Type 1 /Values [ a r g b ] >>`; missing components read as 1.0.
fn fill_color(v: &EngineValue) -> Option<UnitRgb> {
    let values = v.get("Values").and_then(EngineValue::as_array)?;
    let component = |i: usize| values.get(i).and_then(EngineValue::as_f64).unwrap_or(1.0);
    Some(UnitRgb {
        r: component(1),
        g: component(2),
        b: component(3),
    })
}

fn justification_name(code: f64) -> Option<&'static str> {
    if code < 0.0 {
        return None;
    }
    JUSTIFICATION_NAMES.get(code as usize).copied()
}

fn justification_at(paragraphs: &[(usize, Option<String>)], offset: usize) -> Option<String> {
    let mut start = 0usize;
    for (len, justification) in paragraphs {
        if offset < start + len {
            return justification.clone();
        }
        start += len;
    }
    paragraphs.last().and_then(|(_, j)| j.clone())
}

#[cfg(test)]
#[path = "../../tests/unit/psd/text.rs"]
mod tests;
