//! Pure Rust image processing backend.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Decode (JPEG, PNG, GIF, BMP, TIFF, WebP) | `image` crate decoders, format sniffed from content |
//! | Resize | `image::DynamicImage::resize_exact` with `Lanczos3` filter |
//! | Encode → JPEG | `image::codecs::jpeg::JpegEncoder` |

use super::backend::{BackendError, ImageBackend};
use super::params::RasterizeParams;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat, ImageReader};
use std::path::Path;
use std::sync::LazyLock;

/// Extensions picked up when a directory is ingested, paired with the
/// format that has to be compiled in for them to decode.
const INPUT_CANDIDATES: &[(&str, ImageFormat)] = &[
    ("jpg", ImageFormat::Jpeg),
    ("jpeg", ImageFormat::Jpeg),
    ("png", ImageFormat::Png),
    ("gif", ImageFormat::Gif),
    ("bmp", ImageFormat::Bmp),
    ("tif", ImageFormat::Tiff),
    ("tiff", ImageFormat::Tiff),
    ("webp", ImageFormat::WebP),
];

static SUPPORTED_EXTENSIONS: LazyLock<Vec<&'static str>> = LazyLock::new(|| {
    INPUT_CANDIDATES
        .iter()
        .filter(|(_, fmt)| fmt.reading_enabled())
        .map(|(ext, _)| *ext)
        .collect()
});

/// Returns the set of image file extensions that have working decoders compiled in.
pub fn supported_input_extensions() -> &'static [&'static str] {
    &SUPPORTED_EXTENSIONS
}

/// Whether `path` has one of the [`supported_input_extensions`], ignoring case.
pub fn has_supported_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| {
            supported_input_extensions()
                .iter()
                .any(|s| s.eq_ignore_ascii_case(e))
        })
}

/// Largest side a baseline JPEG can carry.
const MAX_JPEG_SIDE: u32 = u16::MAX as u32;

/// Most pixels one resize may allocate, for the output or the working
/// buffer of the first (vertical) pass, which keeps the source width.
const MAX_RESIZE_PIXELS: u64 = 100_000_000;

/// Reject targets that cannot be encoded or would not fit in memory.
/// Must run before `resize_exact` allocates.
fn check_target(bitmap: &DynamicImage, params: &RasterizeParams) -> Result<(), BackendError> {
    let (width, height) = (params.width, params.height);
    if width == 0 || height == 0 || width > MAX_JPEG_SIDE || height > MAX_JPEG_SIDE {
        return Err(BackendError::ProcessingFailed(format!(
            "Cannot rasterize to {width}x{height}: each side must be between 1 and {MAX_JPEG_SIDE}"
        )));
    }
    let working = u64::from(width.max(bitmap.width())) * u64::from(height);
    if working > MAX_RESIZE_PIXELS {
        return Err(BackendError::ProcessingFailed(format!(
            "Cannot rasterize to {width}x{height}: more than {MAX_RESIZE_PIXELS} pixels"
        )));
    }
    Ok(())
}

/// Pure Rust backend using the `image` crate ecosystem.
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

fn open_reader(path: &Path) -> Result<ImageReader<std::io::BufReader<std::fs::File>>, BackendError> {
    // Sniff the format from content so misnamed files still decode
    Ok(ImageReader::open(path)?.with_guessed_format()?)
}

fn decode_error(path: &Path, err: impl std::fmt::Display) -> BackendError {
    BackendError::Decode {
        path: path.display().to_string(),
        message: err.to_string(),
    }
}

/// Encode as baseline JPEG. Alpha is dropped, as a canvas JPEG export does.
fn encode_jpeg(img: &DynamicImage, quality: u8) -> Result<Vec<u8>, BackendError> {
    let rgb = img.to_rgb8();
    let mut bytes = Vec::new();
    JpegEncoder::new_with_quality(&mut bytes, quality)
        .encode_image(&rgb)
        .map_err(|e| BackendError::ProcessingFailed(format!("JPEG encode failed: {}", e)))?;
    Ok(bytes)
}

impl ImageBackend for RustBackend {
    fn decode(&self, path: &Path) -> Result<DynamicImage, BackendError> {
        open_reader(path)?.decode().map_err(|e| decode_error(path, e))
    }

    fn rasterize(
        &self,
        bitmap: &DynamicImage,
        params: &RasterizeParams,
    ) -> Result<Vec<u8>, BackendError> {
        check_target(bitmap, params)?;
        let resized = bitmap.resize_exact(params.width, params.height, FilterType::Lanczos3);
        encode_jpeg(&resized, params.quality.value())
    }
}
