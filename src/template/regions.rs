use std::collections::BTreeMap;

use crate::document::flatten::flatten_layers;
use crate::document::model::Document;
use crate::foundation::core::Bounds;
use crate::template::directive::region_name;

/// Named geometry exported from `[NAME]` layers.
pub type RegionMap = BTreeMap<String, Region>;

/// Geometry of one region in document pixels.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Region {
    /// Left edge.
    pub x: f64,
    /// Top edge.
    pub y: f64,
    /// Horizontal span.
    pub width: f64,
    /// Vertical span.
    pub height: f64,
    /// `x + width / 2`.
    pub center_x: f64,
    /// `y + height / 2`.
    pub center_y: f64,
    /// Half of the shorter span.
    pub radius: f64,
}

impl Region {
    /// Derive region geometry from layer bounds.
    pub fn from_bounds(b: Bounds) -> Self {
        let x = f64::from(b.left);
        let y = f64::from(b.top);
        let width = f64::from(b.width());
        let height = f64::from(b.height());
        Self {
            x,
            y,
            width,
            height,
            center_x: x + width / 2.0,
            center_y: y + height / 2.0,
            radius: width.min(height) / 2.0,
        }
    }
}

/// Collect every `[NAME]` layer of any kind. A later layer with a repeated name replaces the
/// earlier one.
pub fn extract_regions_from_document(doc: &Document) -> RegionMap {
    let mut out = RegionMap::new();
    for layer in flatten_layers(doc) {
        if let Some(name) = region_name(layer) {
            out.insert(name, Region::from_bounds(layer.bounds));
        }
    }
    out
}

#[cfg(test)]
#[path = "../../tests/unit/template/regions.rs"]
mod tests;
