//! WASM-compatible wrapper types.
//!
//! Exports cross the boundary as [`JsExportedPhoto`]; the JPEG bytes become a
//! `Uint8Array` the shell hands to a download link.

use idcrop_core::export::ExportedPhoto;
use wasm_bindgen::prelude::*;

/// A finished ID photo for JavaScript.
///
/// # Memory Management
///
/// The JPEG bytes live in WASM memory. `jpeg()` copies them into a
/// `Uint8Array`; call `free()` afterwards to release the WASM side early.
#[wasm_bindgen]
#[derive(Debug)]
pub struct JsExportedPhoto {
    filename: String,
    width: u32,
    height: u32,
    jpeg: Vec<u8>,
}

#[wasm_bindgen]
impl JsExportedPhoto {
    /// Suggested download name, e.g. `여권용_1718000000123.jpg`
    #[wasm_bindgen(getter)]
    pub fn filename(&self) -> String {
        self.filename.clone()
    }

    /// Output width in pixels
    #[wasm_bindgen(getter)]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Output height in pixels
    #[wasm_bindgen(getter)]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[wasm_bindgen(getter)]
    pub fn byte_length(&self) -> usize {
        self.jpeg.len()
    }

    /// Encoded JPEG bytes as a Uint8Array (copied).
    pub fn jpeg(&self) -> Vec<u8> {
        self.jpeg.clone()
    }

    /// Explicitly free WASM memory.
    pub fn free(self) {
        // Dropping self releases the memory
    }
}

impl From<ExportedPhoto> for JsExportedPhoto {
    fn from(photo: ExportedPhoto) -> Self {
        Self {
            filename: photo.filename,
            width: photo.raster.width,
            height: photo.raster.height,
            jpeg: photo.jpeg,
        }
    }
}
