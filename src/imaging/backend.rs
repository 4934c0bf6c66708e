//! Image processing backend trait and shared types.
//!
//! The [`ImageBackend`] trait defines the two operations every backend
//! must support: decode and rasterize.
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend), built on the `image`
//! crate. Tests use the recording `MockBackend` in this module's test
//! submodule.

use super::params::RasterizeParams;
use image::DynamicImage;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to decode {path}: {message}")]
    Decode { path: String, message: String },
    #[error("Processing failed: {0}")]
    ProcessingFailed(String),
}

/// Intrinsic pixel size of a decoded image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

/// Trait for image processing backends.
///
/// `Sync` so a single backend can be shared by rayon workers, one task per
/// file.
pub trait ImageBackend: Sync {
    /// Decode a file into an in-memory bitmap.
    fn decode(&self, path: &Path) -> Result<DynamicImage, BackendError>;

    /// Draw `bitmap` at the requested size and encode it as JPEG.
    fn rasterize(
        &self,
        bitmap: &DynamicImage,
        params: &RasterizeParams,
    ) -> Result<Vec<u8>, BackendError>;
}
