//! Template semantics layered over the document tree.

pub mod directive;
pub mod regions;
pub mod style;
