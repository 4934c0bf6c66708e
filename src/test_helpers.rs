//! Shared test utilities for the qrsize test suite.
//!
//! Provides synthetic image fixtures and a sink that records deliveries
//! instead of writing them to disk.

use std::io::Cursor;
use std::path::Path;
use std::sync::Mutex;

use image::{ImageFormat, RgbImage, RgbaImage};

use crate::export::{ExportError, ExportSink};

// =========================================================================
// Image fixtures
// =========================================================================

/// Write a `width`×`height` gradient image to `path`.
///
/// The format follows the file extension. Parent directories are created.
pub fn create_test_image(path: &Path, width: u32, height: u32) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    let img = RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([(x % 256) as u8, (y % 256) as u8, 128])
    });
    img.save(path).unwrap();
}

/// Encode an RGBA image as PNG bytes, as if read from an uploaded file.
pub fn png_bytes(img: RgbaImage) -> Vec<u8> {
    let mut bytes = Vec::new();
    img.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .unwrap();
    bytes
}

// =========================================================================
// Recording sink
// =========================================================================

/// Collects deliveries in memory, in arrival order.
#[derive(Default)]
pub struct RecordingSink {
    deliveries: Mutex<Vec<(String, Vec<u8>)>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Names of delivered files, in arrival order.
    pub fn filenames(&self) -> Vec<String> {
        self.deliveries
            .lock()
            .unwrap()
            .iter()
            .map(|(name, _)| name.clone())
            .collect()
    }

    pub fn deliveries(&self) -> Vec<(String, Vec<u8>)> {
        self.deliveries.lock().unwrap().clone()
    }
}

impl ExportSink for RecordingSink {
    fn deliver(&self, bytes: &[u8], filename: &str) -> Result<(), ExportError> {
        self.deliveries
            .lock()
            .unwrap()
            .push((filename.to_string(), bytes.to_vec()));
        Ok(())
    }
}
