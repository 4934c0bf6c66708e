//! High-level image operations.
//!
//! These functions combine calculations with backend execution.
//! They take resolved targets, compute parameters, and call the backend.

use super::backend::{BackendError, ImageBackend};
use super::params::{Quality, RasterizeParams};
use crate::dimensions::ResolvedDimensions;
use image::DynamicImage;

/// Result type for image operations.
pub type Result<T> = std::result::Result<T, BackendError>;

/// Plan a rasterize operation without executing it.
pub fn plan_resize(target: ResolvedDimensions) -> RasterizeParams {
    RasterizeParams {
        width: target.width,
        height: target.height,
        quality: Quality::default(),
    }
}

/// Draw `bitmap` at `target` and return the encoded JPEG bytes.
pub fn resize_to_jpeg(
    backend: &impl ImageBackend,
    bitmap: &DynamicImage,
    target: ResolvedDimensions,
) -> Result<Vec<u8>> {
    backend.rasterize(bitmap, &plan_resize(target))
}

/// Deterministic download name for the `index`-th file of a batch.
///
/// ```
/// # use qrsize::imaging::output_filename;
/// assert_eq!(output_filename("resized_image", 0), "resized_image_0.jpg");
/// ```
pub fn output_filename(prefix: &str, index: usize) -> String {
    format!("{}_{}.jpg", prefix, index)
}
