//! Millimetre to pixel conversion at a print density.
//!
//! `px = round(mm * dpi / 25.4)`, rounded half away from zero. Width and
//! height are converted independently and are not forced back into the exact
//! millimetre aspect ratio; the rounding error is at most half a pixel, which
//! at 300 DPI is about 0.042mm.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::size_spec::SizeSpec;

/// Millimetres per inch.
pub const MM_PER_INCH: f64 = 25.4;

/// Print density used for ID photos unless overridden.
pub const DEFAULT_DPI: f64 = 300.0;

/// Largest edge an export may request.
pub const MAX_OUTPUT_EDGE: u32 = 20_000;

/// Largest pixel count an export may request (about 75 MB of RGB).
pub const MAX_OUTPUT_PIXELS: u64 = 25_000_000;

/// Errors from millimetre to pixel conversion.
#[derive(Debug, Error, PartialEq)]
pub enum ConvertError {
    #[error("invalid conversion input: {mm}mm at {dpi} dpi")]
    InvalidInput { mm: f64, dpi: f64 },

    #[error("{mm}mm at {dpi} dpi rounds to zero pixels")]
    ZeroPixels { mm: f64, dpi: f64 },

    #[error("{pixels}px exceeds the maximum output edge of 20000px")]
    TooLarge { pixels: f64 },

    #[error("{width}x{height} exceeds the maximum output area of 25000000 pixels")]
    AreaTooLarge { width: u32, height: u32 },
}

/// Pixel dimensions of an export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputSize {
    pub width: u32,
    pub height: u32,
}

impl OutputSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// Convert a physical length to a pixel count at `dpi`.
pub fn to_pixels(mm: f64, dpi: f64) -> Result<u32, ConvertError> {
    if !mm.is_finite() || !dpi.is_finite() || mm <= 0.0 || dpi <= 0.0 {
        return Err(ConvertError::InvalidInput { mm, dpi });
    }

    let pixels = (mm * dpi / MM_PER_INCH).round();
    if pixels < 1.0 {
        return Err(ConvertError::ZeroPixels { mm, dpi });
    }
    if pixels > MAX_OUTPUT_EDGE as f64 {
        return Err(ConvertError::TooLarge { pixels });
    }

    Ok(pixels as u32)
}

/// Output raster dimensions for `spec` at `dpi`.
pub fn output_size(spec: &SizeSpec, dpi: f64) -> Result<OutputSize, ConvertError> {
    let width = to_pixels(spec.width_mm, dpi)?;
    let height = to_pixels(spec.height_mm, dpi)?;

    if width as u64 * height as u64 > MAX_OUTPUT_PIXELS {
        return Err(ConvertError::AreaTooLarge { width, height });
    }
    Ok(OutputSize { width, height })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::size_spec::{list_presets, update_custom, PresetKey, SizeField};

    #[test]
    fn test_reference_values_at_300_dpi() {
        assert_eq!(to_pixels(35.0, DEFAULT_DPI), Ok(413));
        assert_eq!(to_pixels(45.0, DEFAULT_DPI), Ok(531));
        assert_eq!(to_pixels(51.0, DEFAULT_DPI), Ok(602));
    }

    #[test]
    fn test_one_inch_is_dpi_pixels() {
        assert_eq!(to_pixels(25.4, 300.0), Ok(300));
        assert_eq!(to_pixels(25.4, 600.0), Ok(600));
    }

    #[test]
    fn test_rounds_to_nearest_pixel() {
        // 412.91px and 412.20px
        assert_eq!(to_pixels(34.96, 300.0), Ok(413));
        assert_eq!(to_pixels(34.9, 300.0), Ok(412));
    }

    #[test]
    fn test_rejects_non_positive_input() {
        assert!(matches!(to_pixels(0.0, 300.0), Err(ConvertError::InvalidInput { .. })));
        assert!(matches!(to_pixels(-35.0, 300.0), Err(ConvertError::InvalidInput { .. })));
        assert!(matches!(to_pixels(35.0, 0.0), Err(ConvertError::InvalidInput { .. })));
        assert!(matches!(to_pixels(f64::NAN, 300.0), Err(ConvertError::InvalidInput { .. })));
        assert!(matches!(to_pixels(35.0, f64::INFINITY), Err(ConvertError::InvalidInput { .. })));
    }

    #[test]
    fn test_rejects_sub_pixel_result() {
        assert!(matches!(to_pixels(0.01, 300.0), Err(ConvertError::ZeroPixels { .. })));
    }

    #[test]
    fn test_rejects_huge_result() {
        assert!(matches!(to_pixels(10_000.0, 300.0), Err(ConvertError::TooLarge { .. })));
    }

    #[test]
    fn test_output_size_for_presets() {
        let passport = output_size(PresetKey::Passport.spec(), DEFAULT_DPI).unwrap();
        assert_eq!(passport, OutputSize::new(413, 531));

        let visa = output_size(PresetKey::VisaUs.spec(), DEFAULT_DPI).unwrap();
        assert_eq!(visa, OutputSize::new(602, 602));
    }

    #[test]
    fn test_output_area_is_bounded() {
        // Each edge alone is under the edge limit
        let custom = update_custom(&SizeSpec::default_custom(), SizeField::Width, 1690.0);
        let custom = update_custom(&custom, SizeField::Height, 1690.0);

        assert_eq!(
            output_size(&custom, DEFAULT_DPI),
            Err(ConvertError::AreaTooLarge {
                width: 19961,
                height: 19961
            })
        );
    }

    #[test]
    fn test_large_but_reasonable_area_is_accepted() {
        let custom = update_custom(&SizeSpec::default_custom(), SizeField::Width, 300.0);
        let custom = update_custom(&custom, SizeField::Height, 300.0);

        assert_eq!(output_size(&custom, DEFAULT_DPI), Ok(OutputSize::new(3543, 3543)));
    }

    #[test]
    fn test_output_size_for_every_preset_is_positive() {
        for (_, spec) in list_presets() {
            let size = output_size(spec, DEFAULT_DPI).unwrap();
            assert!(size.width > 0 && size.height > 0);
        }
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn prop_matches_formula(mm in 1.0f64..=200.0, dpi in 72.0f64..=1200.0) {
            let expected = (mm * dpi / MM_PER_INCH).round() as u32;
            prop_assert_eq!(to_pixels(mm, dpi), Ok(expected));
        }

        #[test]
        fn prop_rounding_error_within_half_pixel(mm in 1.0f64..=200.0, dpi in 72.0f64..=1200.0) {
            let px = to_pixels(mm, dpi).unwrap() as f64;
            let exact = mm * dpi / MM_PER_INCH;
            prop_assert!((px - exact).abs() <= 0.5 + 1e-9);
        }

        #[test]
        fn prop_monotonic_in_mm(mm in 1.0f64..=100.0, delta in 0.0f64..=50.0, dpi in 72.0f64..=600.0) {
            let a = to_pixels(mm, dpi).unwrap();
            let b = to_pixels(mm + delta, dpi).unwrap();
            prop_assert!(b >= a);
        }
    }
}
