//! Rotation of the source onto its expanded bounding box.
//!
//! Pan/zoom widgets that support rotation report the crop rectangle relative
//! to the bounding box of the rotated image rather than the raw source. To
//! export from such a rectangle, the source is rotated the same way first.
//!
//! Angles are clockwise in degrees, matching the on-screen rotation slider.
//! For each destination pixel the inverse rotation gives the source position:
//!
//! ```text
//! src_x =  dx * cos(θ) + dy * sin(θ) + src_cx
//! src_y = -dx * sin(θ) + dy * cos(θ) + src_cy
//! ```
//!
//! where `(dx, dy)` is the destination pixel centre relative to the
//! destination centre. Corners not covered by the source are black.

use crate::decode::{lanczos_weight, DecodedImage, FilterType};

const ANGLE_EPSILON: f64 = 0.001;

/// Dimensions of the box enclosing a `width x height` image rotated by
/// `angle_degrees`.
pub fn compute_rotated_bounds(width: u32, height: u32, angle_degrees: f64) -> (u32, u32) {
    let angle = angle_degrees.rem_euclid(360.0);
    let near = |target: f64| (angle - target).abs() < ANGLE_EPSILON;

    if near(0.0) || near(180.0) || near(360.0) {
        return (width, height);
    }
    if near(90.0) || near(270.0) {
        return (height, width);
    }

    let rad = angle.to_radians();
    let (sin, cos) = (rad.sin().abs(), rad.cos().abs());
    let (w, h) = (width as f64, height as f64);

    let new_w = (w * cos + h * sin).round() as u32;
    let new_h = (w * sin + h * cos).round() as u32;
    (new_w.max(1), new_h.max(1))
}

/// Rotate `image` clockwise by `angle_degrees` onto its bounding box.
pub fn rotate_to_bounds(image: &DecodedImage, angle_degrees: f64, filter: FilterType) -> DecodedImage {
    let angle = angle_degrees.rem_euclid(360.0);
    if angle < ANGLE_EPSILON || 360.0 - angle < ANGLE_EPSILON || image.is_empty() {
        return image.clone();
    }

    let (dst_w, dst_h) = compute_rotated_bounds(image.width, image.height, angle);
    let rad = angle.to_radians();
    let (sin, cos) = (rad.sin(), rad.cos());

    let src_cx = image.width as f64 / 2.0;
    let src_cy = image.height as f64 / 2.0;
    let dst_cx = dst_w as f64 / 2.0;
    let dst_cy = dst_h as f64 / 2.0;

    tracing::debug!(angle, dst_w, dst_h, ?filter, "rotating source onto bounding box");

    let mut pixels = vec![0u8; (dst_w as usize) * (dst_h as usize) * 3];
    for y in 0..dst_h {
        for x in 0..dst_w {
            let dx = x as f64 + 0.5 - dst_cx;
            let dy = y as f64 + 0.5 - dst_cy;

            let sx = dx * cos + dy * sin + src_cx;
            let sy = -dx * sin + dy * cos + src_cy;

            let pixel = match filter {
                FilterType::Nearest => sample_nearest(image, sx, sy),
                FilterType::Bilinear => sample_bilinear(image, sx, sy),
                FilterType::Lanczos3 => sample_lanczos3(image, sx, sy),
            };

            let idx = ((y as usize) * (dst_w as usize) + x as usize) * 3;
            pixels[idx..idx + 3].copy_from_slice(&pixel);
        }
    }

    DecodedImage::new(dst_w, dst_h, pixels)
}

#[inline]
fn inside(image: &DecodedImage, x: f64, y: f64) -> bool {
    x >= 0.0 && y >= 0.0 && x < image.width as f64 && y < image.height as f64
}

#[inline]
fn pixel_f64(image: &DecodedImage, px: i64, py: i64) -> [f64; 3] {
    let px = px.clamp(0, image.width as i64 - 1) as u32;
    let py = py.clamp(0, image.height as i64 - 1) as u32;
    image.pixel(px, py).map(f64::from)
}

#[inline]
fn to_rgb(values: [f64; 3]) -> [u8; 3] {
    values.map(|v| v.round().clamp(0.0, 255.0) as u8)
}

fn sample_nearest(image: &DecodedImage, x: f64, y: f64) -> [u8; 3] {
    if !inside(image, x, y) {
        return [0, 0, 0];
    }
    image.pixel(x.floor() as u32, y.floor() as u32)
}

/// Bilinear interpolation between the 4 nearest pixel centres.
fn sample_bilinear(image: &DecodedImage, x: f64, y: f64) -> [u8; 3] {
    if !inside(image, x, y) {
        return [0, 0, 0];
    }

    // Positions relative to pixel centres
    let (cx, cy) = (x - 0.5, y - 0.5);
    let (x0, y0) = (cx.floor() as i64, cy.floor() as i64);
    let (fx, fy) = (cx - x0 as f64, cy - y0 as f64);

    let p00 = pixel_f64(image, x0, y0);
    let p10 = pixel_f64(image, x0 + 1, y0);
    let p01 = pixel_f64(image, x0, y0 + 1);
    let p11 = pixel_f64(image, x0 + 1, y0 + 1);

    let mut out = [0.0; 3];
    for c in 0..3 {
        out[c] = p00[c] * (1.0 - fx) * (1.0 - fy)
            + p10[c] * fx * (1.0 - fy)
            + p01[c] * (1.0 - fx) * fy
            + p11[c] * fx * fy;
    }
    to_rgb(out)
}

/// Lanczos3 over a 6x6 neighbourhood, edge pixels repeated.
fn sample_lanczos3(image: &DecodedImage, x: f64, y: f64) -> [u8; 3] {
    if !inside(image, x, y) {
        return [0, 0, 0];
    }

    let (cx, cy) = (x - 0.5, y - 0.5);
    let (x0, y0) = (cx.floor() as i64, cy.floor() as i64);

    let mut sum = [0.0f64; 3];
    let mut weight_sum = 0.0;
    for ky in -2..=3 {
        let wy = lanczos_weight(cy - (y0 + ky) as f64, 3.0);
        for kx in -2..=3 {
            let w = wy * lanczos_weight(cx - (x0 + kx) as f64, 3.0);
            let p = pixel_f64(image, x0 + kx, y0 + ky);
            for c in 0..3 {
                sum[c] += p[c] * w;
            }
            weight_sum += w;
        }
    }

    if weight_sum.abs() < f64::EPSILON {
        return sample_bilinear(image, x, y);
    }
    to_rgb(sum.map(|s| s / weight_sum))
}
