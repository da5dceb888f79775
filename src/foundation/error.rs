/// Convenience result type used across the crate.
pub type TemplateResult<T> = Result<T, TemplateError>;

/// Top-level error taxonomy surfaced by every entry point.
///
/// Soft mismatches (a replacement key with no layer, a layer key with no replacement, a name that
/// matches no directive) are never errors; they are skipped.
#[derive(thiserror::Error, Debug)]
pub enum TemplateError {
    /// A referenced document or background file does not exist or cannot be read.
    #[error("not found: {0}")]
    NotFound(String),

    /// Container bytes do not match the expected signature, structure or version.
    #[error("parse error: {0}")]
    Parse(String),

    /// A raster could not be decoded or encoded.
    #[error("encoding error: {0}")]
    Encoding(String),

    /// The output artifact could not be created or written.
    #[error("io error: {0}")]
    Io(String),

    /// Invalid caller-provided values.
    #[error("validation error: {0}")]
    Validation(String),

    /// Wrapped lower-level error from dependencies.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl TemplateError {
    /// Build a [`TemplateError::NotFound`] value.
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Build a [`TemplateError::Parse`] value.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }

    /// Build a [`TemplateError::Encoding`] value.
    pub fn encoding(msg: impl Into<String>) -> Self {
        Self::Encoding(msg.into())
    }

    /// Build a [`TemplateError::Io`] value.
    pub fn io(msg: impl Into<String>) -> Self {
        Self::Io(msg.into())
    }

    /// Build a [`TemplateError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Short stable name of the error kind, for callers that report kind and message separately.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "NotFound",
            Self::Parse(_) => "ParseError",
            Self::Encoding(_) => "EncodingError",
            Self::Io(_) => "IOError",
            Self::Validation(_) => "ValidationError",
            Self::Other(_) => "Other",
        }
    }
}

/// Read a whole input file, mapping every failure to [`TemplateError::NotFound`].
pub(crate) fn read_input(path: &std::path::Path, what: &str) -> TemplateResult<Vec<u8>> {
    std::fs::read(path)
        .map_err(|e| TemplateError::not_found(format!("{what} '{}': {e}", path.display())))
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
