//! Geometric transforms for export.
//!
//! - [`extract`] resamples a crop rectangle onto the exact output raster
//! - [`rotate_to_bounds`] rotates the source when the crop rectangle is
//!   expressed in the rotated frame
//!
//! # Coordinate System
//!
//! - Coordinates are in source pixels, origin at the top-left corner
//! - Pixel `(i, j)` covers `[i, i+1) x [j, j+1)`; its centre is `(i+0.5, j+0.5)`
//! - Rotation angles are in degrees, positive = clockwise

pub mod extract;
mod rotation;

pub use extract::{clamp_to_source, extract, ExtractError, BOUNDS_TOLERANCE_PX};
pub use rotation::{compute_rotated_bounds, rotate_to_bounds};
