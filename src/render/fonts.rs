use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use crate::foundation::error::{TemplateError, TemplateResult};

const FONT_EXTENSIONS: [&str; 3] = ["ttf", "otf", "ttc"];

/// One registered font face.
#[derive(Clone, Debug)]
pub struct FontFace {
    family: String,
    data: Arc<Vec<u8>>,
}

impl FontFace {
    /// Family name read from the face's naming table.
    pub fn family(&self) -> &str {
        &self.family
    }

    /// Raw font file bytes.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Shared handle to the font bytes for the text stack; no copy is made.
    pub(crate) fn blob(&self) -> parley::fontique::Blob<u8> {
        parley::fontique::Blob::new(self.data.clone())
    }
}

/// Caller-owned collection of font faces used by the text rasterizer.
///
/// No system font discovery happens; faces come only from explicit registration.
#[derive(Clone, Debug)]
pub struct FontLibrary {
    faces: Vec<FontFace>,
    aliases: BTreeMap<String, usize>,
    default_family: String,
}

impl Default for FontLibrary {
    fn default() -> Self {
        Self::new()
    }
}

impl FontLibrary {
    /// Empty library with `"Arial"` as the default family.
    pub fn new() -> Self {
        Self {
            faces: Vec::new(),
            aliases: BTreeMap::new(),
            default_family: "Arial".to_string(),
        }
    }

    /// Return the library with a different default family.
    pub fn with_default_family(mut self, family: impl Into<String>) -> Self {
        self.default_family = family.into();
        self
    }

    /// Number of registered faces.
    pub fn len(&self) -> usize {
        self.faces.len()
    }

    /// `true` when no face is registered.
    pub fn is_empty(&self) -> bool {
        self.faces.is_empty()
    }

    /// Register a face and return its family name.
    pub fn register(&mut self, bytes: Vec<u8>) -> TemplateResult<String> {
        let data = Arc::new(bytes);
        let family = family_name_of(parley::fontique::Blob::new(data.clone()))?;
        tracing::debug!(family = %family, "registered font face");
        self.faces.push(FontFace {
            family: family.clone(),
            data,
        });
        Ok(family)
    }

    /// Register a face that is also reachable under an exact alias (for example the PostScript
    /// name a document stores).
    pub fn register_alias(&mut self, alias: impl Into<String>, bytes: Vec<u8>) -> TemplateResult<String> {
        let family = self.register(bytes)?;
        self.aliases.insert(alias.into(), self.faces.len() - 1);
        Ok(family)
    }

    /// Load every `.ttf`, `.otf` and `.ttc` file directly inside `dir`, in path order.
    ///
    /// Unreadable or unparsable files are skipped with a warning.
    pub fn from_dir(dir: impl AsRef<Path>) -> TemplateResult<Self> {
        let dir = dir.as_ref();
        let entries = std::fs::read_dir(dir).map_err(|e| {
            TemplateError::not_found(format!("font directory '{}': {e}", dir.display()))
        })?;
        let mut paths: Vec<_> = entries
            .filter_map(Result::ok)
            .map(|e| e.path())
            .filter(|p| p.is_file() && has_font_extension(p))
            .collect();
        paths.sort();

        let mut lib = Self::new();
        for path in paths {
            let registered = std::fs::read(&path)
                .map_err(|e| TemplateError::io(e.to_string()))
                .and_then(|bytes| lib.register(bytes));
            if let Err(e) = registered {
                tracing::warn!(path = %path.display(), error = %e, "skipping font file");
            }
        }
        Ok(lib)
    }

    /// Pick the face for a requested family or PostScript name.
    ///
    /// Order: exact alias, normalized family match, longest normalized family prefix of the
    /// request, the default family, then the first registered face.
    pub fn resolve(&self, requested: &str) -> Option<&FontFace> {
        if let Some(&i) = self.aliases.get(requested) {
            return self.faces.get(i);
        }
        let wanted = normalize(requested);
        if let Some(face) = self.find_family(&wanted) {
            return Some(face);
        }
        let by_prefix = self
            .faces
            .iter()
            .map(|f| (normalize(&f.family), f))
            .filter(|(n, _)| !n.is_empty() && wanted.starts_with(n.as_str()))
            .max_by_key(|(n, _)| n.len());
        if let Some((_, face)) = by_prefix {
            return Some(face);
        }
        self.find_family(&normalize(&self.default_family))
            .or_else(|| self.faces.first())
    }

    fn find_family(&self, normalized: &str) -> Option<&FontFace> {
        if normalized.is_empty() {
            return None;
        }
        self.faces.iter().find(|f| normalize(&f.family) == normalized)
    }
}

/// Lowercase ASCII alphanumerics only: `"Open Sans-Bold"` becomes `"opensansbold"`.
fn normalize(name: &str) -> String {
    name.chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

fn has_font_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| FONT_EXTENSIONS.iter().any(|x| e.eq_ignore_ascii_case(x)))
}

fn family_name_of(blob: parley::fontique::Blob<u8>) -> TemplateResult<String> {
    let mut ctx = parley::FontContext::default();
    let families = ctx.collection.register_fonts(blob, None);
    let family_id = families
        .first()
        .map(|(id, _)| *id)
        .ok_or_else(|| TemplateError::validation("no font families registered from font bytes"))?;
    ctx.collection
        .family_name(family_id)
        .map(str::to_string)
        .ok_or_else(|| TemplateError::validation("registered font family has no name"))
}

#[cfg(test)]
#[path = "../../tests/unit/render/fonts.rs"]
mod tests;
