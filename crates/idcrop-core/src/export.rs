//! Export: turn the session's committed crop into a finished ID photo.
//!
//! The exporter asks the resolution converter for the output dimensions of
//! the active size, resamples the committed rectangle into exactly that many
//! pixels, encodes JPEG and names the file `<size token>_<unix millis>.jpg`.
//! Any failure along the way is reported as one [`ExportFailed`]; nothing is
//! delivered unless every step succeeded.

use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::decode::{DecodedImage, FilterType};
use crate::encode::{encode_image, quality_percent, EncodeError};
use crate::resolution::{output_size, ConvertError, DEFAULT_DPI};
use crate::session::{CropSession, ExportJob, SessionError};
use crate::size_spec::{SizeSpec, SizeSpecError};
use crate::transform::{extract, rotate_to_bounds, ExtractError};

/// JPEG quality for exports on a 0.0-1.0 scale.
pub const DEFAULT_QUALITY: f32 = 0.95;

/// Notice shown to the user for any failed export.
pub const EXPORT_FAILED_NOTICE: &str = "이미지 생성 중 오류가 발생했습니다.";

/// Which coordinate frame the committed crop rectangle is expressed in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CropFrame {
    /// Raw source pixels.
    #[default]
    Source,
    /// Pixels of the source rotated by the view rotation onto its bounding box.
    RotatedBounds,
}

/// Export configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ExportSettings {
    /// Print density in dots per inch.
    pub dpi: f64,
    /// JPEG quality, 0.0 to 1.0.
    pub quality: f32,
    pub filter: FilterType,
    pub frame: CropFrame,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            dpi: DEFAULT_DPI,
            quality: DEFAULT_QUALITY,
            filter: FilterType::Lanczos3,
            frame: CropFrame::Source,
        }
    }
}

/// The precise reason an export failed.
#[derive(Debug, Error)]
pub enum ExportCause {
    #[error("no crop area has been selected")]
    NoSelection,

    #[error(transparent)]
    InvalidSize(#[from] SizeSpecError),

    #[error(transparent)]
    Convert(#[from] ConvertError),

    #[error(transparent)]
    Extract(#[from] ExtractError),

    #[error("crop ratio {crop_ratio:.4} does not match the selected size ratio {size_ratio:.4}")]
    AspectMismatch { crop_ratio: f64, size_ratio: f64 },

    #[error(transparent)]
    Encode(#[from] EncodeError),

    #[error(transparent)]
    Session(SessionError),

    #[error("failed to save {filename}: {source}")]
    Sink {
        filename: String,
        #[source]
        source: std::io::Error,
    },
}

impl From<SessionError> for ExportCause {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::NoSelection => ExportCause::NoSelection,
            other => ExportCause::Session(other),
        }
    }
}

/// The single user-facing export failure.
#[derive(Debug, Error)]
#[error("export failed")]
pub struct ExportFailed {
    #[source]
    pub cause: ExportCause,
}

impl ExportFailed {
    /// Generic notice for the user; details stay in `cause`.
    pub fn user_message(&self) -> &'static str {
        EXPORT_FAILED_NOTICE
    }
}

impl From<ExportCause> for ExportFailed {
    fn from(cause: ExportCause) -> Self {
        Self { cause }
    }
}

impl From<SizeSpecError> for ExportFailed {
    fn from(err: SizeSpecError) -> Self {
        ExportCause::from(err).into()
    }
}

impl From<ConvertError> for ExportFailed {
    fn from(err: ConvertError) -> Self {
        ExportCause::from(err).into()
    }
}

impl From<ExtractError> for ExportFailed {
    fn from(err: ExtractError) -> Self {
        ExportCause::from(err).into()
    }
}

impl From<EncodeError> for ExportFailed {
    fn from(err: EncodeError) -> Self {
        ExportCause::from(err).into()
    }
}

impl From<SessionError> for ExportFailed {
    fn from(err: SessionError) -> Self {
        ExportCause::from(err).into()
    }
}

/// A finished export.
#[derive(Debug, Clone)]
pub struct ExportedPhoto {
    pub filename: String,
    pub raster: DecodedImage,
    /// Encoded JPEG bytes.
    pub jpeg: Vec<u8>,
}

/// Destination for finished exports.
pub trait ExportSink {
    fn deliver(&mut self, filename: &str, bytes: &[u8]) -> std::io::Result<()>;
}

/// Writes exports into a directory.
#[derive(Debug, Clone)]
pub struct DirectorySink {
    dir: PathBuf,
}

impl DirectorySink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl ExportSink for DirectorySink {
    fn deliver(&mut self, filename: &str, bytes: &[u8]) -> std::io::Result<()> {
        fs::write(self.dir.join(filename), bytes)
    }
}

/// `<first word of the size name>_<unix millis>.jpg`
pub fn export_filename(spec: &SizeSpec, unix_millis: u64) -> String {
    format!("{}_{}.jpg", spec.name_token(), unix_millis)
}

/// Drives one export against a crop session.
#[derive(Debug, Clone, Copy, Default)]
pub struct Exporter {
    settings: ExportSettings,
}

impl Exporter {
    pub fn new(settings: ExportSettings) -> Self {
        Self { settings }
    }

    /// Export the session's committed crop at the size of `spec`.
    ///
    /// The session is in the exporting state for the duration and returns to
    /// loaded afterwards, whether the export succeeded or not.
    pub fn run(
        &self,
        session: &mut CropSession,
        spec: &SizeSpec,
        unix_millis: u64,
    ) -> Result<ExportedPhoto, ExportFailed> {
        let job = session.begin_export().inspect_err(|err| {
            tracing::warn!(error = %err, "export rejected");
        })?;
        let result = self.render(&job, spec, unix_millis);
        session.finish_export();

        match &result {
            Ok(photo) => tracing::info!(
                filename = %photo.filename,
                width = photo.raster.width,
                height = photo.raster.height,
                bytes = photo.jpeg.len(),
                "export complete"
            ),
            Err(err) => tracing::warn!(cause = %err.cause, "export failed"),
        }
        result
    }

    /// [`Self::run`], then hand the JPEG to `sink`.
    pub fn run_into(
        &self,
        session: &mut CropSession,
        spec: &SizeSpec,
        unix_millis: u64,
        sink: &mut dyn ExportSink,
    ) -> Result<ExportedPhoto, ExportFailed> {
        let photo = self.run(session, spec, unix_millis)?;
        sink.deliver(&photo.filename, &photo.jpeg)
            .map_err(|source| ExportCause::Sink {
                filename: photo.filename.clone(),
                source,
            })?;
        Ok(photo)
    }

    fn render(
        &self,
        job: &ExportJob,
        spec: &SizeSpec,
        unix_millis: u64,
    ) -> Result<ExportedPhoto, ExportFailed> {
        spec.validate()?;
        let quality = quality_percent(self.settings.quality)?;
        let size = output_size(spec, self.settings.dpi)?;

        let size_ratio = spec.width_mm / spec.height_mm;
        if !job.crop.matches_aspect(size_ratio) && !job.crop.is_empty() {
            return Err(ExportCause::AspectMismatch {
                crop_ratio: job.crop.aspect_ratio(),
                size_ratio,
            }
            .into());
        }

        let raster = match self.settings.frame {
            CropFrame::Source => extract(&job.image, &job.crop, size, self.settings.filter)?,
            CropFrame::RotatedBounds => {
                let rotated = rotate_to_bounds(&job.image, job.view.rotation_deg, self.settings.filter);
                extract(&rotated, &job.crop, size, self.settings.filter)?
            }
        };

        let jpeg = encode_image(&raster, quality)?;

        Ok(ExportedPhoto {
            filename: export_filename(spec, unix_millis),
            raster,
            jpeg,
        })
    }
}
