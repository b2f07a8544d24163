//! idcrop WASM - WebAssembly bindings for idcrop
//!
//! This crate exposes the idcrop-core crop session and export pipeline to the
//! browser shell that hosts the interactive crop widget.
//!
//! # Module Structure
//!
//! - `presets` - Size catalog and millimetre to pixel conversion
//! - `session` - Crop session: image loading, size selection, crop commits, export
//! - `types` - WASM-compatible wrapper for exported photos
//!
//! # Usage
//!
//! ```typescript
//! import init, { JsCropSession, list_presets } from '@idcrop/wasm';
//!
//! await init();
//!
//! const session = new JsCropSession();
//! session.load_image(new Uint8Array(await file.arrayBuffer()));
//! session.commit_default_crop();
//! const photo = session.export_photo();
//! console.log(`${photo.filename}: ${photo.width}x${photo.height}`);
//! ```

use wasm_bindgen::prelude::*;

mod presets;
mod session;
mod types;

// Re-export public types
pub use presets::{default_dpi, list_presets, mm_to_pixels};
pub use session::JsCropSession;
pub use types::JsExportedPhoto;

/// Initialize the WASM module (called automatically on load)
#[wasm_bindgen(start)]
pub fn init() {
    // Future: route panics to the browser console once
    // console_error_panic_hook is part of the workspace
}

/// Get the version of the WASM module
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}
