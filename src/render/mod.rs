//! Text rasterization, compositing and the end-to-end render pipeline.

pub mod composite;
pub mod fonts;
pub mod pipeline;
pub mod text;
