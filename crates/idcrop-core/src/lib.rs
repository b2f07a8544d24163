//! idcrop Core - ID photo cropping library
//!
//! This crate holds everything behind the ID photo tool except the
//! interactive crop widget: the catalog of document sizes, millimetre to
//! pixel conversion, the crop session state, region resampling, and the
//! export pipeline that produces the final JPEG.

pub mod decode;
pub mod encode;
pub mod export;
pub mod resolution;
pub mod session;
pub mod size_spec;
pub mod transform;

pub use decode::{decode_image, DecodedImage, FilterType};
pub use export::{
    export_filename, CropFrame, DirectorySink, ExportCause, ExportFailed, ExportSettings,
    ExportSink, ExportedPhoto, Exporter,
};
pub use resolution::{output_size, to_pixels, OutputSize, DEFAULT_DPI};
pub use session::{CropRectangle, CropSession, SessionError, SessionState, ViewTransform};
pub use size_spec::{
    list_presets, resolve_active, update_custom, PresetKey, SizeField, SizeSelection, SizeSpec,
};
pub use transform::{compute_rotated_bounds, extract};
