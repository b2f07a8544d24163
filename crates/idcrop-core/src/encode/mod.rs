//! Output encoding.
//!
//! Exported ID photos are written as high-quality JPEG: prints go through
//! lossy stages anyway, and the small rasters involved (~413x531 for
//! 35x45mm) show no visible artifacts at 0.95.

mod jpeg;

pub use jpeg::{encode_image, encode_jpeg, quality_percent, EncodeError};
