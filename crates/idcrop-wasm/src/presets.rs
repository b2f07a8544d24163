//! Size catalog and unit conversion bindings.
//!
//! # Example
//!
//! ```typescript
//! import { list_presets, mm_to_pixels } from '@idcrop/wasm';
//!
//! for (const preset of list_presets()) {
//!   console.log(preset.key, preset.name, `${preset.widthPx}x${preset.heightPx}`);
//! }
//! mm_to_pixels(35, 300); // 413
//! ```

use idcrop_core::resolution::{self, DEFAULT_DPI};
use idcrop_core::size_spec::{self, SizeSpec};
use serde::Serialize;
use wasm_bindgen::prelude::*;

/// One catalog entry as seen by JavaScript.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PresetEntry {
    pub key: &'static str,
    #[serde(flatten)]
    pub spec: &'static SizeSpec,
    /// Output width at the default density
    pub width_px: u32,
    pub height_px: u32,
}

pub(crate) fn preset_entries() -> Result<Vec<PresetEntry>, resolution::ConvertError> {
    size_spec::list_presets()
        .map(|(key, spec)| {
            let size = resolution::output_size(spec, DEFAULT_DPI)?;
            Ok(PresetEntry {
                key: key.as_str(),
                spec,
                width_px: size.width,
                height_px: size.height,
            })
        })
        .collect()
}

/// The preset catalog in display order.
///
/// Each entry is `{ key, name, widthMm, heightMm, description, guidelines,
/// widthPx, heightPx }` with pixel sizes at 300 DPI.
#[wasm_bindgen]
pub fn list_presets() -> Result<JsValue, JsValue> {
    let entries = preset_entries().map_err(|e| JsValue::from_str(&e.to_string()))?;
    serde_wasm_bindgen::to_value(&entries).map_err(|e| JsValue::from_str(&e.to_string()))
}

/// Convert millimetres to whole pixels at `dpi`.
#[wasm_bindgen]
pub fn mm_to_pixels(mm: f64, dpi: f64) -> Result<u32, JsValue> {
    resolution::to_pixels(mm, dpi).map_err(|e| JsValue::from_str(&e.to_string()))
}

#[wasm_bindgen]
pub fn default_dpi() -> f64 {
    DEFAULT_DPI
}


#[cfg(all(test, target_arch = "wasm32"))]
mod wasm_tests {
    use super::*;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    #[wasm_bindgen_test]
    fn test_list_presets_is_array() {
        let value = list_presets().unwrap();
        assert!(js_sys::Array::is_array(&value));
        assert_eq!(js_sys::Array::from(&value).length(), 4);
    }

    #[wasm_bindgen_test]
    fn test_mm_to_pixels() {
        assert_eq!(mm_to_pixels(35.0, 300.0).unwrap(), 413);
        assert_eq!(mm_to_pixels(51.0, 300.0).unwrap(), 602);
        assert!(mm_to_pixels(0.0, 300.0).is_err());
    }
}
