//! Crop session bindings.
//!
//! [`JsCropSession`] owns the size selection, the custom size and the crop
//! session, and keeps the session's aspect ratio in step with whichever size
//! is active. The crop widget reports its rectangle through `commit_crop`
//! after every zoom, rotation or pan change.
//!
//! # Example
//!
//! ```typescript
//! const session = new JsCropSession();
//! session.load_image(new Uint8Array(await file.arrayBuffer()));
//! session.commit_default_crop();
//!
//! cropper.on('crop', ({ x, y, width, height }) => session.commit_crop(x, y, width, height));
//!
//! const photo = session.export_photo({ quality: 0.95 });
//! download(new Blob([photo.jpeg()], { type: 'image/jpeg' }), photo.filename);
//! ```

use idcrop_core::export::{ExportFailed, ExportSettings, ExportedPhoto, Exporter};
use idcrop_core::session::{
    AspectChange, CropRectangle, CropSession, PanOffset, SessionError, SessionState,
    ViewTransform, ViewTransformUpdate,
};
use idcrop_core::size_spec::{resolve_active, update_custom, SizeField, SizeSelection, SizeSpec};
use wasm_bindgen::prelude::*;

use crate::types::JsExportedPhoto;

fn to_js_error(err: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&err.to_string())
}

/// Editing state for one ID photo.
#[wasm_bindgen]
pub struct JsCropSession {
    session: CropSession,
    selection: SizeSelection,
    custom: SizeSpec,
}

impl Default for JsCropSession {
    fn default() -> Self {
        Self::new()
    }
}

#[wasm_bindgen]
impl JsCropSession {
    /// A session with the passport size selected and no image.
    #[wasm_bindgen(constructor)]
    pub fn new() -> JsCropSession {
        let selection = SizeSelection::default();
        let custom = SizeSpec::default_custom();
        let mut session = CropSession::new();
        session.set_aspect_ratio(resolve_active(selection, &custom).aspect_ratio());
        JsCropSession {
            session,
            selection,
            custom,
        }
    }

    /// Decode and load an image file. A failed decode keeps the current image.
    pub fn load_image(&mut self, bytes: &[u8]) -> Result<(), JsValue> {
        self.session.load_image(bytes).map_err(to_js_error)
    }

    /// Drop the current image. Returns `false` if nothing was loaded.
    pub fn reset(&mut self) -> Result<bool, JsValue> {
        self.session.reset().map_err(to_js_error)
    }

    /// `"empty"`, `"loaded"` or `"exporting"`
    #[wasm_bindgen(getter)]
    pub fn state(&self) -> String {
        match self.session.state() {
            SessionState::Empty => "empty",
            SessionState::Loaded => "loaded",
            SessionState::Exporting => "exporting",
        }
        .to_string()
    }

    #[wasm_bindgen(getter)]
    pub fn is_exporting(&self) -> bool {
        self.session.is_exporting()
    }

    /// Loaded image width, if any
    #[wasm_bindgen(getter)]
    pub fn image_width(&self) -> Option<u32> {
        self.session.image().map(|img| img.width)
    }

    #[wasm_bindgen(getter)]
    pub fn image_height(&self) -> Option<u32> {
        self.session.image().map(|img| img.height)
    }

    /// Ratio the crop widget must enforce, or `undefined` while the custom
    /// size is unusable.
    #[wasm_bindgen(getter)]
    pub fn aspect_ratio(&self) -> Option<f64> {
        self.session.aspect_ratio()
    }

    /// Select a preset by key, or `"custom"`.
    ///
    /// Returns `true` when the crop widget must reshape its window; the
    /// committed rectangle has then been discarded.
    pub fn select_size(&mut self, key: &str) -> Result<bool, JsValue> {
        let selection: SizeSelection = key.parse().map_err(to_js_error)?;
        Ok(self.select(selection) == AspectChange::Reshape)
    }

    /// Set `"width"` or `"height"` of the custom size in millimetres.
    ///
    /// Any number is accepted; an unusable size fails at export.
    pub fn set_custom_size(&mut self, field: &str, value: f64) -> Result<bool, JsValue> {
        let field: SizeField = field.parse().map_err(to_js_error)?;
        Ok(self.set_custom(field, value) == AspectChange::Reshape)
    }

    /// The active size as `{ name, widthMm, heightMm, description, guidelines }`.
    pub fn active_size(&self) -> Result<JsValue, JsValue> {
        serde_wasm_bindgen::to_value(self.active_spec()).map_err(to_js_error)
    }

    /// Merge a view change; omitted arguments keep their current value.
    pub fn update_view(
        &mut self,
        zoom: Option<f64>,
        rotation_deg: Option<f64>,
        pan_x: Option<f64>,
        pan_y: Option<f64>,
    ) -> Result<JsValue, JsValue> {
        let view = self
            .update_view_native(zoom, rotation_deg, pan_x, pan_y)
            .map_err(to_js_error)?;
        serde_wasm_bindgen::to_value(&view).map_err(to_js_error)
    }

    /// Record the widget's current rectangle in source pixels.
    pub fn commit_crop(&mut self, x: f64, y: f64, width: f64, height: f64) -> Result<(), JsValue> {
        self.session
            .commit_crop_rectangle(CropRectangle::new(x, y, width, height))
            .map_err(to_js_error)
    }

    /// Commit the centred rectangle a freshly opened widget shows.
    pub fn commit_default_crop(&mut self) -> Result<JsValue, JsValue> {
        let rect = self.session.commit_default_crop().map_err(to_js_error)?;
        serde_wasm_bindgen::to_value(&rect).map_err(to_js_error)
    }

    /// Export the committed crop at the active size.
    ///
    /// `settings` is an optional `{ dpi, quality, filter, frame }` object.
    /// On failure the cause is logged to the console and the generic user
    /// notice is thrown.
    pub fn export_photo(&mut self, settings: JsValue) -> Result<JsExportedPhoto, JsValue> {
        let settings: ExportSettings = if settings.is_undefined() || settings.is_null() {
            ExportSettings::default()
        } else {
            serde_wasm_bindgen::from_value(settings)
                .map_err(|e| JsValue::from_str(&format!("Invalid export settings: {}", e)))?
        };
        let now = js_sys::Date::now() as u64;

        match self.export_at(&settings, now) {
            Ok(photo) => Ok(photo.into()),
            Err(err) => {
                web_sys::console::error_1(&JsValue::from_str(&format!(
                    "export failed: {}",
                    err.cause
                )));
                Err(JsValue::from_str(err.user_message()))
            }
        }
    }
}

impl JsCropSession {
    pub(crate) fn active_spec(&self) -> &SizeSpec {
        resolve_active(self.selection, &self.custom)
    }

    pub(crate) fn select(&mut self, selection: SizeSelection) -> AspectChange {
        self.selection = selection;
        self.sync_aspect()
    }

    pub(crate) fn set_custom(&mut self, field: SizeField, value: f64) -> AspectChange {
        self.custom = update_custom(&self.custom, field, value);
        self.sync_aspect()
    }

    fn sync_aspect(&mut self) -> AspectChange {
        let aspect = self.active_spec().aspect_ratio();
        self.session.set_aspect_ratio(aspect)
    }

    pub(crate) fn update_view_native(
        &mut self,
        zoom: Option<f64>,
        rotation_deg: Option<f64>,
        pan_x: Option<f64>,
        pan_y: Option<f64>,
    ) -> Result<ViewTransform, SessionError> {
        let pan = match (pan_x, pan_y) {
            (None, None) => None,
            (x, y) => {
                let current = self
                    .session
                    .view_transform()
                    .map(|v| v.pan)
                    .unwrap_or_default();
                Some(PanOffset {
                    x: x.unwrap_or(current.x),
                    y: y.unwrap_or(current.y),
                })
            }
        };
        self.session.update_view_transform(ViewTransformUpdate {
            zoom,
            rotation_deg,
            pan,
        })
    }

    pub(crate) fn export_at(
        &mut self,
        settings: &ExportSettings,
        unix_millis: u64,
    ) -> Result<ExportedPhoto, ExportFailed> {
        let spec = self.active_spec().clone();
        Exporter::new(*settings).run(&mut self.session, &spec, unix_millis)
    }
}


#[cfg(all(test, target_arch = "wasm32"))]
mod wasm_tests {
    use super::*;
    use idcrop_core::decode::DecodedImage;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    #[wasm_bindgen_test]
    fn test_select_size_rejects_unknown_key() {
        let mut js = JsCropSession::new();
        assert!(js.select_size("passport_xl").is_err());
        assert!(js.select_size("visa_us").unwrap());
    }

    #[wasm_bindgen_test]
    fn test_set_custom_size_rejects_unknown_field() {
        let mut js = JsCropSession::new();
        assert!(js.set_custom_size("depth", 10.0).is_err());
    }

    #[wasm_bindgen_test]
    fn test_load_invalid_bytes_fails() {
        let mut js = JsCropSession::new();
        assert!(js.load_image(&[1, 2, 3]).is_err());
        assert_eq!(js.state(), "empty");
    }

    #[wasm_bindgen_test]
    fn test_export_with_default_settings() {
        let mut js = JsCropSession::new();
        js.session
            .load_decoded(DecodedImage::new(200, 200, vec![50u8; 200 * 200 * 3]))
            .unwrap();
        js.commit_default_crop().unwrap();

        let photo = js.export_photo(JsValue::UNDEFINED).unwrap();
        assert_eq!((photo.width(), photo.height()), (413, 531));
        assert!(photo.filename().ends_with(".jpg"));
    }

    #[wasm_bindgen_test]
    fn test_export_without_crop_throws_user_notice() {
        let mut js = JsCropSession::new();
        let err = js.export_photo(JsValue::UNDEFINED).unwrap_err();
        assert_eq!(
            err.as_string().as_deref(),
            Some(idcrop_core::export::EXPORT_FAILED_NOTICE)
        );
    }
}
