//! Source image decoding.
//!
//! Turns the bytes of the photo the user picked into an upright RGB raster
//! that the crop session owns for its lifetime. Decoding happens once per
//! `load_image`; every export resamples from that same raster.
//!
//! JPEG and PNG are supported. EXIF orientation is applied during decode so
//! pixel coordinates agree with what the browser displays.

mod source;
mod types;

pub use source::decode_image;
pub use types::{DecodeError, DecodedImage, FilterType, Orientation};
pub(crate) use types::lanczos_weight;
