//! Layered document container decoding.

pub(crate) mod descriptor;
pub(crate) mod engine_data;
pub mod loader;
pub(crate) mod pixels;
pub(crate) mod reader;
pub(crate) mod text;
