//! Format-neutral document tree and traversal.

pub mod flatten;
pub mod model;
