//! On-screen view transform: zoom, rotation and pan.
//!
//! The view transform only describes what the user sees. Exports are driven
//! by the committed crop rectangle, so nothing here feeds pixel dimensions.

use serde::{Deserialize, Serialize};

/// Zoom at which the image fits the viewport.
pub const MIN_ZOOM: f64 = 1.0;

/// Largest magnification the editor allows.
pub const MAX_ZOOM: f64 = 3.0;

/// Pan offset in widget space.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PanOffset {
    pub x: f64,
    pub y: f64,
}

impl PanOffset {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Zoom, rotation and pan applied to the preview.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewTransform {
    /// Magnification in `[MIN_ZOOM, MAX_ZOOM]`.
    pub zoom: f64,
    /// Clockwise rotation in degrees, in `[0, 360)`.
    pub rotation_deg: f64,
    pub pan: PanOffset,
}

impl Default for ViewTransform {
    fn default() -> Self {
        Self {
            zoom: MIN_ZOOM,
            rotation_deg: 0.0,
            pan: PanOffset::default(),
        }
    }
}

/// Partial update from a slider or drag event. `None` fields are kept.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewTransformUpdate {
    pub zoom: Option<f64>,
    pub rotation_deg: Option<f64>,
    pub pan: Option<PanOffset>,
}

impl ViewTransform {
    /// Merge `update`, clamping zoom and normalising rotation.
    ///
    /// Non-finite values are ignored.
    pub fn apply(&mut self, update: ViewTransformUpdate) {
        if let Some(zoom) = update.zoom.filter(|z| z.is_finite()) {
            self.zoom = zoom.clamp(MIN_ZOOM, MAX_ZOOM);
        }
        if let Some(rotation) = update.rotation_deg.filter(|r| r.is_finite()) {
            self.rotation_deg = normalize_degrees(rotation);
        }
        if let Some(pan) = update.pan.filter(|p| p.x.is_finite() && p.y.is_finite()) {
            self.pan = pan;
        }
    }
}

/// Map any angle into `[0, 360)`.
pub fn normalize_degrees(degrees: f64) -> f64 {
    let normalized = degrees.rem_euclid(360.0);
    // rem_euclid can return 360.0 for tiny negative inputs
    if normalized >= 360.0 {
        0.0
    } else {
        normalized
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_identity() {
        let view = ViewTransform::default();
        assert_eq!(view.zoom, 1.0);
        assert_eq!(view.rotation_deg, 0.0);
        assert_eq!(view.pan, PanOffset::new(0.0, 0.0));
    }

    #[test]
    fn test_apply_merges_only_given_fields() {
        let mut view = ViewTransform::default();
        view.apply(ViewTransformUpdate {
            zoom: Some(2.0),
            ..Default::default()
        });
        view.apply(ViewTransformUpdate {
            pan: Some(PanOffset::new(-12.0, 4.5)),
            ..Default::default()
        });

        assert_eq!(view.zoom, 2.0);
        assert_eq!(view.rotation_deg, 0.0);
        assert_eq!(view.pan, PanOffset::new(-12.0, 4.5));
    }

    #[test]
    fn test_zoom_is_clamped() {
        let mut view = ViewTransform::default();
        view.apply(ViewTransformUpdate {
            zoom: Some(5.0),
            ..Default::default()
        });
        assert_eq!(view.zoom, MAX_ZOOM);

        view.apply(ViewTransformUpdate {
            zoom: Some(0.2),
            ..Default::default()
        });
        assert_eq!(view.zoom, MIN_ZOOM);
    }

    #[test]
    fn test_rotation_is_normalized() {
        let mut view = ViewTransform::default();
        view.apply(ViewTransformUpdate {
            rotation_deg: Some(360.0),
            ..Default::default()
        });
        assert_eq!(view.rotation_deg, 0.0);

        view.apply(ViewTransformUpdate {
            rotation_deg: Some(-90.0),
            ..Default::default()
        });
        assert_eq!(view.rotation_deg, 270.0);

        view.apply(ViewTransformUpdate {
            rotation_deg: Some(725.0),
            ..Default::default()
        });
        assert_eq!(view.rotation_deg, 5.0);
    }

    #[test]
    fn test_non_finite_values_ignored() {
        let mut view = ViewTransform::default();
        view.apply(ViewTransformUpdate {
            zoom: Some(f64::NAN),
            rotation_deg: Some(f64::INFINITY),
            pan: Some(PanOffset::new(f64::NAN, 0.0)),
        });
        assert_eq!(view, ViewTransform::default());
    }

    #[test]
    fn test_normalize_degrees_tiny_negative() {
        let r = normalize_degrees(-1e-20);
        assert!((0.0..360.0).contains(&r));
    }
}
