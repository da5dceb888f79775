/// Document canvas dimensions in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Canvas {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

/// Pixel rectangle a layer occupies in document space.
///
/// Constructed through [`Bounds::new`], which clamps negative spans so that `right >= left` and
/// `bottom >= top` always hold.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize)]
pub struct Bounds {
    /// Left edge (inclusive).
    pub left: i32,
    /// Top edge (inclusive).
    pub top: i32,
    /// Right edge (exclusive).
    pub right: i32,
    /// Bottom edge (exclusive).
    pub bottom: i32,
}

impl Bounds {
    /// Build bounds, clamping inverted edges to a zero-sized span.
    pub fn new(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self {
            left,
            top,
            right: right.max(left),
            bottom: bottom.max(top),
        }
    }

    /// Span along x.
    pub fn width(self) -> u32 {
        self.right.abs_diff(self.left)
    }

    /// Span along y.
    pub fn height(self) -> u32 {
        self.bottom.abs_diff(self.top)
    }

    /// `true` when either span is zero.
    pub fn is_empty(self) -> bool {
        self.width() == 0 || self.height() == 0
    }
}

/// Straight-alpha color with unit-interval RGB components.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize)]
pub struct UnitRgb {
    /// Red in `[0, 1]` (not enforced; clamped on conversion).
    pub r: f64,
    /// Green in `[0, 1]`.
    pub g: f64,
    /// Blue in `[0, 1]`.
    pub b: f64,
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
