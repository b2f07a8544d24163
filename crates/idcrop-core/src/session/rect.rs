//! Crop rectangles in source pixel coordinates.

use serde::{Deserialize, Serialize};

/// Allowed difference between a rectangle's width and `height * ratio`,
/// on top of [`ASPECT_TOLERANCE_FRACTION`] of the width. Widgets report
/// whole-pixel rectangles, so a one pixel slack is unavoidable.
pub const ASPECT_TOLERANCE_PX: f64 = 1.0;

/// Relative slack for aspect comparisons on large rectangles.
pub const ASPECT_TOLERANCE_FRACTION: f64 = 0.01;

/// A selected region of the source image.
///
/// Coordinates are in source pixels and may be fractional: the widget derives
/// them from zoomed screen positions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CropRectangle {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl CropRectangle {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Rectangle covering a whole `width x height` image.
    pub fn full(width: u32, height: u32) -> Self {
        Self::new(0.0, 0.0, width as f64, height as f64)
    }

    /// The largest rectangle of `aspect` (width / height) centred in a
    /// `source_width x source_height` image.
    ///
    /// This is what a pan/zoom widget reports at zoom 1 with no rotation or
    /// pan. Returns `None` for a degenerate source or ratio.
    pub fn centered(source_width: u32, source_height: u32, aspect: f64) -> Option<Self> {
        if source_width == 0 || source_height == 0 || !aspect.is_finite() || aspect <= 0.0 {
            return None;
        }

        let (sw, sh) = (source_width as f64, source_height as f64);
        let (width, height) = if sw / sh > aspect {
            // Source is wider than the target: height limits
            (sh * aspect, sh)
        } else {
            (sw, sw / aspect)
        };

        Some(Self::new((sw - width) / 2.0, (sh - height) / 2.0, width, height))
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    /// Width over height; `NaN` or infinite for degenerate rectangles.
    pub fn aspect_ratio(&self) -> f64 {
        self.width / self.height
    }

    /// Whether the rectangle has no usable area.
    pub fn is_empty(&self) -> bool {
        !(self.width > 0.0 && self.height > 0.0)
    }

    /// Whether every coordinate is a finite number.
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.width.is_finite() && self.height.is_finite()
    }

    /// Whether the shape agrees with `aspect` within pixel rounding.
    pub fn matches_aspect(&self, aspect: f64) -> bool {
        if self.is_empty() || !aspect.is_finite() || aspect <= 0.0 {
            return false;
        }
        let expected_width = self.height * aspect;
        (self.width - expected_width).abs()
            <= ASPECT_TOLERANCE_PX + ASPECT_TOLERANCE_FRACTION * self.width
    }
}
