//! Region extraction: resample a fractional source rectangle onto an exact
//! output raster.
//!
//! # Algorithm
//!
//! The resampler is separable. Along each axis, output sample `i` maps to the
//! source position
//!
//! ```text
//! centre(i) = start + (i + 0.5) * extent / out_len
//! ```
//!
//! and gathers every source pixel whose centre lies within the filter
//! support around it. When shrinking, the support is widened by the scale
//! factor so each output pixel averages the whole area it covers instead of
//! point-sampling it; a 4000px capture cropped down to 413px would otherwise
//! alias badly. Taps beyond the image edge reuse the edge pixel.
//!
//! Source rows are filtered horizontally on demand and kept only while the
//! vertical taps of the current output row still read them, then combined
//! vertically. Weights are normalised per sample, so a
//! uniform region stays exactly uniform and an identity extraction
//! reproduces the source exactly.
//!
//! Each axis is scaled independently: a rectangle whose ratio differs from
//! the output's is stretched, not letterboxed. Keeping the two in agreement
//! is the caller's job.

use std::collections::BTreeMap;

use thiserror::Error;

use crate::decode::{DecodedImage, FilterType};
use crate::resolution::OutputSize;
use crate::session::CropRectangle;

/// How far a rectangle may overshoot the source edge before it is rejected.
/// Overshoot within this margin is clamped away.
pub const BOUNDS_TOLERANCE_PX: f64 = 1.0;

/// Errors from region extraction.
#[derive(Debug, Error, PartialEq)]
pub enum ExtractError {
    #[error("crop region is empty ({width}x{height})")]
    EmptyRegion { width: f64, height: f64 },

    #[error("crop region {rect:?} lies outside the {source_width}x{source_height} source")]
    OutOfBounds {
        rect: CropRectangle,
        source_width: u32,
        source_height: u32,
    },

    #[error("output size must be non-zero, got {width}x{height}")]
    InvalidOutputSize { width: u32, height: u32 },

    #[error("source image is empty")]
    EmptySource,

    #[error("source pixel buffer holds {actual} bytes, expected {expected}")]
    MalformedSource { expected: usize, actual: usize },
}

/// Resample `crop` of `source` into exactly `output` pixels.
///
/// # Errors
///
/// - `EmptyRegion` if the rectangle has no area
/// - `OutOfBounds` if it has non-finite coordinates or overshoots the source
///   by more than [`BOUNDS_TOLERANCE_PX`]
/// - `InvalidOutputSize` if either output dimension is zero
/// - `MalformedSource` if the pixel buffer does not match the dimensions
pub fn extract(
    source: &DecodedImage,
    crop: &CropRectangle,
    output: OutputSize,
    filter: FilterType,
) -> Result<DecodedImage, ExtractError> {
    if source.is_empty() {
        return Err(ExtractError::EmptySource);
    }
    if source.pixels.len() != source.expected_len() {
        return Err(ExtractError::MalformedSource {
            expected: source.expected_len(),
            actual: source.pixels.len(),
        });
    }
    if output.width == 0 || output.height == 0 {
        return Err(ExtractError::InvalidOutputSize {
            width: output.width,
            height: output.height,
        });
    }

    let region = clamp_to_source(crop, source.width, source.height)?;

    tracing::debug!(
        x = region.x,
        y = region.y,
        width = region.width,
        height = region.height,
        out_width = output.width,
        out_height = output.height,
        ?filter,
        "resampling crop region"
    );

    let columns = axis_taps(region.x, region.width, source.width, output.width, filter);
    let rows = axis_taps(region.y, region.height, source.height, output.height, filter);

    Ok(resample(source, &columns, &rows, output))
}

/// Validate `crop` against the source extents and clip any small overshoot.
pub fn clamp_to_source(
    crop: &CropRectangle,
    source_width: u32,
    source_height: u32,
) -> Result<CropRectangle, ExtractError> {
    if crop.is_empty() {
        return Err(ExtractError::EmptyRegion {
            width: crop.width,
            height: crop.height,
        });
    }

    let (sw, sh) = (source_width as f64, source_height as f64);
    let out_of_bounds = !crop.is_finite()
        || crop.x < -BOUNDS_TOLERANCE_PX
        || crop.y < -BOUNDS_TOLERANCE_PX
        || crop.right() > sw + BOUNDS_TOLERANCE_PX
        || crop.bottom() > sh + BOUNDS_TOLERANCE_PX;

    if out_of_bounds {
        tracing::warn!(?crop, source_width, source_height, "crop region outside source");
        return Err(ExtractError::OutOfBounds {
            rect: *crop,
            source_width,
            source_height,
        });
    }

    let x0 = crop.x.max(0.0);
    let y0 = crop.y.max(0.0);
    let x1 = crop.right().min(sw);
    let y1 = crop.bottom().min(sh);

    let clamped = CropRectangle::new(x0, y0, x1 - x0, y1 - y0);
    if clamped.is_empty() {
        return Err(ExtractError::EmptyRegion {
            width: clamped.width,
            height: clamped.height,
        });
    }
    Ok(clamped)
}

/// Source taps contributing to one output sample.
#[derive(Debug, Clone)]
struct Taps {
    indices: Vec<usize>,
    weights: Vec<f64>,
}

fn axis_taps(start: f64, extent: f64, src_len: u32, out_len: u32, filter: FilterType) -> Vec<Taps> {
    let scale = extent / out_len as f64;
    let filter_scale = match filter {
        FilterType::Nearest => 1.0,
        _ => scale.max(1.0),
    };
    let support = filter.support() * filter_scale;
    let last = (src_len - 1) as i64;

    (0..out_len)
        .map(|i| {
            let centre = start + (i as f64 + 0.5) * scale;
            let lo = (centre - support - 0.5).floor() as i64;
            let hi = (centre + support - 0.5).ceil() as i64;

            let mut indices = Vec::with_capacity((hi - lo + 1) as usize);
            let mut weights = Vec::with_capacity((hi - lo + 1) as usize);
            for j in lo..=hi {
                let w = filter.weight((j as f64 + 0.5 - centre) / filter_scale);
                if w != 0.0 {
                    indices.push(j.clamp(0, last) as usize);
                    weights.push(w);
                }
            }

            let sum: f64 = weights.iter().sum();
            if sum.abs() < f64::EPSILON {
                // Sample sits exactly on a pixel boundary with a box filter
                let nearest = (centre.floor() as i64).clamp(0, last) as usize;
                return Taps {
                    indices: vec![nearest],
                    weights: vec![1.0],
                };
            }
            weights.iter_mut().for_each(|w| *w /= sum);

            Taps { indices, weights }
        })
        .collect()
}

fn resample(source: &DecodedImage, columns: &[Taps], rows: &[Taps], output: OutputSize) -> DecodedImage {
    let out_w = output.width as usize;
    let out_h = output.height as usize;

    // Horizontally filtered source rows, keyed by source row. Output rows
    // walk down the source, so rows above the current taps are dropped and
    // the window never holds more than one output row's vertical support.
    let mut window: BTreeMap<usize, Vec<f64>> = BTreeMap::new();

    let mut pixels = vec![0u8; out_w * out_h * 3];
    for (oy, taps) in rows.iter().enumerate() {
        if let Some(&lowest) = taps.indices.iter().min() {
            window = window.split_off(&lowest);
        }
        for &sy in &taps.indices {
            window
                .entry(sy)
                .or_insert_with(|| filter_row(source, sy, columns));
        }

        for ox in 0..out_w {
            let mut acc = [0.0f64; 3];
            for (sy, &w) in taps.indices.iter().zip(&taps.weights) {
                if let Some(row) = window.get(sy) {
                    let p = &row[ox * 3..ox * 3 + 3];
                    acc[0] += p[0] * w;
                    acc[1] += p[1] * w;
                    acc[2] += p[2] * w;
                }
            }
            let dst = (oy * out_w + ox) * 3;
            for (out, value) in pixels[dst..dst + 3].iter_mut().zip(acc) {
                *out = value.round().clamp(0.0, 255.0) as u8;
            }
        }
    }

    DecodedImage::new(output.width, output.height, pixels)
}

/// Horizontal pass over source row `sy`.
fn filter_row(source: &DecodedImage, sy: usize, columns: &[Taps]) -> Vec<f64> {
    let src_w = source.width as usize;
    let src_row = &source.pixels[sy * src_w * 3..(sy + 1) * src_w * 3];

    let mut filtered = Vec::with_capacity(columns.len() * 3);
    for taps in columns {
        let mut acc = [0.0f64; 3];
        for (&sx, &w) in taps.indices.iter().zip(&taps.weights) {
            let p = &src_row[sx * 3..sx * 3 + 3];
            acc[0] += p[0] as f64 * w;
            acc[1] += p[1] as f64 * w;
            acc[2] += p[2] as f64 * w;
        }
        filtered.extend_from_slice(&acc);
    }
    filtered
}
