//! Crop session: the editing state for one loaded photo.
//!
//! # States
//!
//! ```text
//! Empty --load_image--> Loaded --begin_export--> Exporting --finish_export--> Loaded
//!   ^                     |
//!   +-------reset---------+
//! ```
//!
//! The session is driven by a single event loop: the crop widget commits a
//! rectangle on every pan/zoom/rotate tick, sliders update the view transform,
//! and export requests flow through [`crate::export::Exporter`]. Events are
//! handled one at a time, so no locking is involved. The only exclusion rule
//! is that a second export cannot start while one is running.
//!
//! Everything tied to the photo (pixels, view transform, crop rectangle) is
//! dropped on `reset` or when another photo is loaded. The active aspect ratio
//! belongs to the size selection and survives both.

mod rect;
mod view;

use std::sync::Arc;

use thiserror::Error;

use crate::decode::{decode_image, DecodeError, DecodedImage};

pub use rect::{CropRectangle, ASPECT_TOLERANCE_FRACTION, ASPECT_TOLERANCE_PX};
pub use view::{
    normalize_degrees, PanOffset, ViewTransform, ViewTransformUpdate, MAX_ZOOM, MIN_ZOOM,
};

/// Errors raised by session transitions.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("no image is loaded")]
    NoImage,

    #[error("no crop area has been selected")]
    NoSelection,

    #[error("an export is already running")]
    ExportInProgress,

    #[error("failed to load image: {0}")]
    Decode(#[from] DecodeError),
}

/// Coarse session state, e.g. for enabling buttons.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Empty,
    Loaded,
    Exporting,
}

/// Outcome of changing the active aspect ratio.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AspectChange {
    /// Same ratio as before; the committed rectangle still holds.
    Unchanged,
    /// The widget must reshape its crop window. Any committed rectangle was
    /// discarded and a fresh one is needed before export.
    Reshape,
}

/// Everything an export needs, captured when it starts.
#[derive(Debug, Clone)]
pub struct ExportJob {
    pub image: Arc<DecodedImage>,
    pub crop: CropRectangle,
    pub view: ViewTransform,
}

#[derive(Debug)]
struct LoadedImage {
    image: Arc<DecodedImage>,
    view: ViewTransform,
    crop: Option<CropRectangle>,
}

/// Editing state for the photo being cropped.
#[derive(Debug, Default)]
pub struct CropSession {
    loaded: Option<LoadedImage>,
    exporting: bool,
    aspect_ratio: Option<f64>,
}

impl CropSession {
    /// An empty session.
    pub fn new() -> Self {
        Self::default()
    }

    /// An empty session whose crop window starts at `aspect`.
    pub fn with_aspect_ratio(aspect: f64) -> Self {
        let mut session = Self::new();
        session.set_aspect_ratio(Some(aspect));
        session
    }

    pub fn state(&self) -> SessionState {
        match (&self.loaded, self.exporting) {
            (None, _) => SessionState::Empty,
            (Some(_), false) => SessionState::Loaded,
            (Some(_), true) => SessionState::Exporting,
        }
    }

    /// Whether the export action should show as busy.
    pub fn is_exporting(&self) -> bool {
        self.exporting
    }

    /// Decode `bytes` and start editing it.
    ///
    /// On a decode failure the session is left untouched.
    pub fn load_image(&mut self, bytes: &[u8]) -> Result<(), SessionError> {
        self.ensure_idle()?;
        let image = decode_image(bytes)?;
        self.install(image);
        Ok(())
    }

    /// Start editing an already decoded image.
    pub fn load_decoded(&mut self, image: DecodedImage) -> Result<(), SessionError> {
        self.ensure_idle()?;
        if image.is_empty() {
            return Err(DecodeError::ZeroDimensions.into());
        }
        image.check_buffer()?;
        self.install(image);
        Ok(())
    }

    fn install(&mut self, image: DecodedImage) {
        tracing::debug!(
            width = image.width,
            height = image.height,
            replaced = self.loaded.is_some(),
            "image loaded into crop session"
        );
        self.loaded = Some(LoadedImage {
            image: Arc::new(image),
            view: ViewTransform::default(),
            crop: None,
        });
    }

    /// Drop the image and all editing state. Returns `false` if nothing was
    /// loaded.
    pub fn reset(&mut self) -> Result<bool, SessionError> {
        self.ensure_idle()?;
        let had_image = self.loaded.take().is_some();
        if had_image {
            tracing::debug!("crop session reset");
        }
        Ok(had_image)
    }

    pub fn image(&self) -> Option<&DecodedImage> {
        self.loaded.as_ref().map(|l| l.image.as_ref())
    }

    pub fn view_transform(&self) -> Option<&ViewTransform> {
        self.loaded.as_ref().map(|l| &l.view)
    }

    pub fn crop_rectangle(&self) -> Option<&CropRectangle> {
        self.loaded.as_ref().and_then(|l| l.crop.as_ref())
    }

    pub fn aspect_ratio(&self) -> Option<f64> {
        self.aspect_ratio
    }

    /// Merge a zoom/rotation/pan change into the view.
    pub fn update_view_transform(
        &mut self,
        update: ViewTransformUpdate,
    ) -> Result<ViewTransform, SessionError> {
        self.ensure_idle()?;
        let loaded = self.loaded.as_mut().ok_or(SessionError::NoImage)?;
        loaded.view.apply(update);
        Ok(loaded.view)
    }

    /// Record the rectangle the widget currently shows.
    ///
    /// The widget is trusted to report source-pixel coordinates of the active
    /// aspect ratio; geometry is checked again at export.
    pub fn commit_crop_rectangle(&mut self, rect: CropRectangle) -> Result<(), SessionError> {
        self.ensure_idle()?;
        let loaded = self.loaded.as_mut().ok_or(SessionError::NoImage)?;
        loaded.crop = Some(rect);
        Ok(())
    }

    /// Switch the crop window's aspect ratio.
    ///
    /// `None` means the active size is currently unusable (an invalid custom
    /// size); the committed rectangle is discarded in that case too.
    pub fn set_aspect_ratio(&mut self, aspect: Option<f64>) -> AspectChange {
        let changed = match (self.aspect_ratio, aspect) {
            (Some(old), Some(new)) => (old - new).abs() > 1e-9,
            (None, None) => false,
            _ => true,
        };
        if !changed {
            return AspectChange::Unchanged;
        }

        self.aspect_ratio = aspect;
        if let Some(loaded) = self.loaded.as_mut() {
            if loaded.crop.take().is_some() {
                tracing::debug!(?aspect, "aspect ratio changed, committed crop discarded");
            }
        }
        AspectChange::Reshape
    }

    /// The rectangle a widget shows at zoom 1 with no pan or rotation.
    pub fn default_crop_rectangle(&self) -> Option<CropRectangle> {
        let image = self.image()?;
        CropRectangle::centered(image.width, image.height, self.aspect_ratio?)
    }

    /// Commit [`Self::default_crop_rectangle`].
    pub fn commit_default_crop(&mut self) -> Result<CropRectangle, SessionError> {
        let rect = self
            .default_crop_rectangle()
            .ok_or(if self.loaded.is_none() {
                SessionError::NoImage
            } else {
                SessionError::NoSelection
            })?;
        self.commit_crop_rectangle(rect)?;
        Ok(rect)
    }

    /// Enter the exporting state and capture the job.
    pub fn begin_export(&mut self) -> Result<ExportJob, SessionError> {
        self.ensure_idle()?;
        let loaded = self.loaded.as_ref().ok_or(SessionError::NoImage)?;
        let crop = loaded.crop.ok_or(SessionError::NoSelection)?;

        let job = ExportJob {
            image: Arc::clone(&loaded.image),
            crop,
            view: loaded.view,
        };
        self.exporting = true;
        Ok(job)
    }

    /// Leave the exporting state, whatever the outcome.
    pub fn finish_export(&mut self) {
        self.exporting = false;
    }

    fn ensure_idle(&self) -> Result<(), SessionError> {
        if self.exporting {
            return Err(SessionError::ExportInProgress);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PASSPORT: f64 = 35.0 / 45.0;

    fn image(width: u32, height: u32, fill: u8) -> DecodedImage {
        DecodedImage::new(width, height, vec![fill; (width * height * 3) as usize])
    }

    fn loaded_session() -> CropSession {
        let mut session = CropSession::with_aspect_ratio(PASSPORT);
        session.load_decoded(image(400, 600, 10)).unwrap();
        session
    }

    #[test]
    fn test_new_session_is_empty() {
        let session = CropSession::new();
        assert_eq!(session.state(), SessionState::Empty);
        assert!(session.image().is_none());
        assert!(session.view_transform().is_none());
        assert!(session.crop_rectangle().is_none());
    }

    #[test]
    fn test_load_resets_view_and_crop() {
        let session = loaded_session();
        assert_eq!(session.state(), SessionState::Loaded);
        assert_eq!(session.view_transform(), Some(&ViewTransform::default()));
        assert!(session.crop_rectangle().is_none());
    }

    #[test]
    fn test_load_image_from_bytes_failure_keeps_state() {
        let mut session = loaded_session();
        session
            .commit_crop_rectangle(CropRectangle::new(0.0, 0.0, 35.0, 45.0))
            .unwrap();

        let result = session.load_image(b"not an image");
        assert!(matches!(result, Err(SessionError::Decode(_))));
        assert_eq!(session.image().unwrap().width, 400);
        assert!(session.crop_rectangle().is_some());
    }

    #[test]
    fn test_load_rejects_empty_image() {
        let mut session = CropSession::new();
        let result = session.load_decoded(DecodedImage::new(0, 0, vec![]));
        assert!(matches!(
            result,
            Err(SessionError::Decode(DecodeError::ZeroDimensions))
        ));
        assert_eq!(session.state(), SessionState::Empty);
    }

    #[test]
    fn test_load_rejects_mismatched_pixel_buffer() {
        let mut session = CropSession::with_aspect_ratio(PASSPORT);
        let malformed = DecodedImage {
            width: 100,
            height: 100,
            pixels: vec![0; 300],
        };

        let result = session.load_decoded(malformed);
        assert!(matches!(
            result,
            Err(SessionError::Decode(DecodeError::PixelBufferMismatch { .. }))
        ));
        assert_eq!(session.state(), SessionState::Empty);
        assert!(matches!(
            session.commit_default_crop(),
            Err(SessionError::NoImage)
        ));
    }

    #[test]
    fn test_edits_require_image() {
        let mut session = CropSession::new();
        assert!(matches!(
            session.update_view_transform(ViewTransformUpdate::default()),
            Err(SessionError::NoImage)
        ));
        assert!(matches!(
            session.commit_crop_rectangle(CropRectangle::new(0.0, 0.0, 1.0, 1.0)),
            Err(SessionError::NoImage)
        ));
        assert!(matches!(session.begin_export(), Err(SessionError::NoImage)));
    }

    #[test]
    fn test_commit_overwrites_previous_rectangle() {
        let mut session = loaded_session();
        let first = CropRectangle::new(0.0, 0.0, 70.0, 90.0);
        let second = CropRectangle::new(10.5, 20.25, 140.0, 180.0);

        session.commit_crop_rectangle(first).unwrap();
        session.commit_crop_rectangle(second).unwrap();

        assert_eq!(session.crop_rectangle(), Some(&second));
    }

    #[test]
    fn test_update_view_transform_merges() {
        let mut session = loaded_session();
        session
            .update_view_transform(ViewTransformUpdate {
                zoom: Some(1.5),
                ..Default::default()
            })
            .unwrap();
        let view = session
            .update_view_transform(ViewTransformUpdate {
                rotation_deg: Some(90.0),
                ..Default::default()
            })
            .unwrap();

        assert_eq!(view.zoom, 1.5);
        assert_eq!(view.rotation_deg, 90.0);
    }

    #[test]
    fn test_export_without_selection_fails() {
        let mut session = loaded_session();
        assert!(matches!(session.begin_export(), Err(SessionError::NoSelection)));
        assert_eq!(session.state(), SessionState::Loaded);
    }

    #[test]
    fn test_export_state_excludes_second_export() {
        let mut session = loaded_session();
        session.commit_default_crop().unwrap();

        let job = session.begin_export().unwrap();
        assert_eq!(session.state(), SessionState::Exporting);
        assert!(session.is_exporting());
        assert_eq!(job.image.width, 400);

        assert!(matches!(
            session.begin_export(),
            Err(SessionError::ExportInProgress)
        ));
        assert!(matches!(
            session.commit_crop_rectangle(job.crop),
            Err(SessionError::ExportInProgress)
        ));
        assert!(matches!(session.reset(), Err(SessionError::ExportInProgress)));

        session.finish_export();
        assert_eq!(session.state(), SessionState::Loaded);
        assert!(session.begin_export().is_ok());
    }

    #[test]
    fn test_reset_discards_everything() {
        let mut session = loaded_session();
        session.commit_default_crop().unwrap();

        assert!(session.reset().unwrap());
        assert_eq!(session.state(), SessionState::Empty);
        assert!(session.crop_rectangle().is_none());
        assert!(!session.reset().unwrap());
    }

    #[test]
    fn test_reset_then_load_isolates_sessions() {
        let mut session = loaded_session();
        session
            .update_view_transform(ViewTransformUpdate {
                zoom: Some(2.5),
                rotation_deg: Some(45.0),
                pan: Some(PanOffset::new(30.0, -10.0)),
            })
            .unwrap();
        session
            .commit_crop_rectangle(CropRectangle::new(5.0, 5.0, 70.0, 90.0))
            .unwrap();

        session.reset().unwrap();
        session.load_decoded(image(100, 100, 200)).unwrap();

        assert_eq!(session.view_transform(), Some(&ViewTransform::default()));
        assert!(session.crop_rectangle().is_none());
        assert_eq!(session.image().unwrap().pixel(0, 0), [200, 200, 200]);
    }

    #[test]
    fn test_loading_new_image_discards_previous_state() {
        let mut session = loaded_session();
        session.commit_default_crop().unwrap();
        session.load_decoded(image(50, 50, 0)).unwrap();

        assert!(session.crop_rectangle().is_none());
        assert_eq!(session.aspect_ratio(), Some(PASSPORT));
    }

    #[test]
    fn test_aspect_change_invalidates_crop() {
        let mut session = loaded_session();
        session.commit_default_crop().unwrap();

        assert_eq!(session.set_aspect_ratio(Some(1.0)), AspectChange::Reshape);
        assert!(session.crop_rectangle().is_none());
        assert!(matches!(session.begin_export(), Err(SessionError::NoSelection)));
    }

    #[test]
    fn test_same_aspect_keeps_crop() {
        let mut session = loaded_session();
        session.commit_default_crop().unwrap();

        // passport -> id card: same 35x45 ratio
        assert_eq!(
            session.set_aspect_ratio(Some(35.0 / 45.0)),
            AspectChange::Unchanged
        );
        assert!(session.crop_rectangle().is_some());
    }

    #[test]
    fn test_invalid_size_clears_aspect() {
        let mut session = loaded_session();
        session.commit_default_crop().unwrap();

        assert_eq!(session.set_aspect_ratio(None), AspectChange::Reshape);
        assert!(session.crop_rectangle().is_none());
        assert!(matches!(
            session.commit_default_crop(),
            Err(SessionError::NoSelection)
        ));
    }

    #[test]
    fn test_default_crop_matches_aspect() {
        let mut session = loaded_session();
        let rect = session.commit_default_crop().unwrap();

        assert!(rect.matches_aspect(PASSPORT));
        assert!(rect.x >= 0.0 && rect.right() <= 400.0 + 1e-9);
        assert!(rect.y >= 0.0 && rect.bottom() <= 600.0 + 1e-9);
    }

    #[test]
    fn test_commit_default_crop_without_image() {
        let mut session = CropSession::with_aspect_ratio(PASSPORT);
        assert!(matches!(
            session.commit_default_crop(),
            Err(SessionError::NoImage)
        ));
    }
}
