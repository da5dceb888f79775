//! Layer-name directives: `{{KEY}}` marks a substitutable text layer, `[NAME]` a geometry region.

use std::sync::OnceLock;

use regex::Regex;

use crate::document::model::LayerNode;

/// What a layer name asks for.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Directive {
    /// `{{KEY}}`: replace the layer's text with the value supplied for `KEY`.
    Substitute(String),
    /// `[NAME]`: export the layer's bounds as region `NAME`.
    Region(String),
    /// Ordinary layer.
    None,
}

fn substitute_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^\{\{\s*([A-Z0-9_]+)\s*\}\}$").expect("substitution regex compiles")
    })
}

fn region_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\[([A-Z_]+)\]$").expect("region regex compiles"))
}

/// Classify a layer name. Surrounding whitespace is ignored; matching is case-sensitive.
pub fn match_directive(name: &str) -> Directive {
    let name = name.trim();
    if let Some(c) = substitute_re().captures(name) {
        return Directive::Substitute(c[1].to_string());
    }
    if let Some(c) = region_re().captures(name) {
        return Directive::Region(c[1].to_string());
    }
    Directive::None
}

/// Substitution key of a text layer, if its name carries one.
///
/// Non-text layers never substitute, even when named `{{KEY}}`.
pub fn substitution_key(layer: &LayerNode) -> Option<String> {
    if !layer.is_text() {
        return None;
    }
    match match_directive(&layer.name) {
        Directive::Substitute(key) => Some(key),
        _ => None,
    }
}

/// Region name of a layer, if its name carries one. Any layer kind qualifies.
pub fn region_name(layer: &LayerNode) -> Option<String> {
    match match_directive(&layer.name) {
        Directive::Region(name) => Some(name),
        _ => None,
    }
}

#[cfg(test)]
#[path = "../../tests/unit/template/directive.rs"]
mod tests;
