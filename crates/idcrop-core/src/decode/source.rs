//! Source photo decoding with EXIF orientation applied.
//!
//! Browsers render photos upright according to their EXIF orientation, so the
//! crop widget reports rectangles in that upright space. Decoding must land in
//! the same space or every crop taken from a phone portrait is rotated.

use std::io::Cursor;

use exif::{In, Reader, Tag};
use image::{DynamicImage, ImageReader};

use super::{DecodeError, DecodedImage, Orientation};

/// Decode a source photo (JPEG, PNG) into upright RGB pixels.
///
/// # Errors
///
/// Returns `DecodeError::InvalidFormat` for empty or unrecognised bytes,
/// `DecodeError::CorruptedFile` when the decoder fails part way, and
/// `DecodeError::ZeroDimensions` for a degenerate raster.
pub fn decode_image(bytes: &[u8]) -> Result<DecodedImage, DecodeError> {
    if bytes.is_empty() {
        return Err(DecodeError::InvalidFormat);
    }

    let orientation = extract_orientation(bytes);

    let reader = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| DecodeError::CorruptedFile(e.to_string()))?;

    if reader.format().is_none() {
        return Err(DecodeError::InvalidFormat);
    }

    let img = reader
        .decode()
        .map_err(|e| DecodeError::CorruptedFile(e.to_string()))?;

    let upright = apply_orientation(img, orientation);
    let decoded = DecodedImage::from_rgb_image(upright.into_rgb8());

    if decoded.is_empty() {
        return Err(DecodeError::ZeroDimensions);
    }

    tracing::debug!(
        width = decoded.width,
        height = decoded.height,
        ?orientation,
        "decoded source image"
    );

    Ok(decoded)
}

/// Read the EXIF orientation tag, if the container carries one.
fn extract_orientation(bytes: &[u8]) -> Orientation {
    let mut cursor = Cursor::new(bytes);
    Reader::new()
        .read_from_container(&mut cursor)
        .ok()
        .and_then(|exif| {
            exif.get_field(Tag::Orientation, In::PRIMARY)
                .and_then(|field| field.value.get_uint(0))
        })
        .map(Orientation::from)
        .unwrap_or_default()
}

fn apply_orientation(img: DynamicImage, orientation: Orientation) -> DynamicImage {
    match orientation {
        Orientation::Normal => img,
        Orientation::FlipHorizontal => img.fliph(),
        Orientation::Rotate180 => img.rotate180(),
        Orientation::FlipVertical => img.flipv(),
        Orientation::Transpose => img.rotate90().fliph(),
        Orientation::Rotate90CW => img.rotate90(),
        Orientation::Transverse => img.rotate270().fliph(),
        Orientation::Rotate270CW => img.rotate270(),
    }
}
