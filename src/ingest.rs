//! File ingestion: turn user-supplied paths into decoded images.
//!
//! Paths play the role of a file selection or a drop. Each path is either
//! a file, taken as-is, or a directory, whose image files are collected:
//!
//! ```text
//! photos/            → photos/a.jpg, photos/b.png      (sorted by name)
//! photos/ --recursive → also photos/2024/c.webp
//! notes.txt          → notes.txt  (explicit files are never filtered;
//!                                  the decoder decides)
//! ```
//!
//! Every candidate is decoded on its own rayon task with no ordering
//! dependency between tasks. Results are gathered back into input order so
//! the "most recent" image and the batch indices are deterministic.
//!
//! A file that fails to decode does not stop the others. It becomes a
//! [`DecodeFailure`] in the result and is left out of any export.

use crate::imaging::{AspectRatio, Dimensions, ImageBackend, has_supported_extension};
use image::DynamicImage;
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum IngestError {
    #[error("Failed to read directory: {0}")]
    Walk(#[from] walkdir::Error),
}

/// A successfully decoded image. Immutable once created.
#[derive(Debug, Clone)]
pub struct ImageDescriptor {
    source: PathBuf,
    dimensions: Dimensions,
    ratio: AspectRatio,
    bitmap: Arc<DynamicImage>,
}

impl ImageDescriptor {
    /// Wrap a decoded bitmap. Returns `None` for zero-sized images, which
    /// have no aspect ratio.
    pub fn new(source: impl Into<PathBuf>, bitmap: DynamicImage) -> Option<Self> {
        let dimensions = Dimensions {
            width: bitmap.width(),
            height: bitmap.height(),
        };
        let ratio = AspectRatio::from_dimensions(dimensions.width, dimensions.height)?;
        Some(Self {
            source: source.into(),
            dimensions,
            ratio,
            bitmap: Arc::new(bitmap),
        })
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    /// Intrinsic (decoded) pixel size.
    pub fn dimensions(&self) -> Dimensions {
        self.dimensions
    }

    /// Intrinsic ratio, fixed at load time.
    pub fn ratio(&self) -> AspectRatio {
        self.ratio
    }

    pub fn bitmap(&self) -> &DynamicImage {
        &self.bitmap
    }
}

/// A candidate file that could not be turned into an image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodeFailure {
    pub source: PathBuf,
    pub error: String,
}

/// Result of ingesting a set of paths.
#[derive(Debug, Clone, Default)]
pub struct Ingested {
    /// Decoded images, in input order.
    pub images: Vec<ImageDescriptor>,
    /// Candidates that failed to decode, in input order.
    pub failures: Vec<DecodeFailure>,
}

impl Ingested {
    /// The "no file" signal: nothing usable was loaded.
    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }
}

/// Expand `inputs` into the list of candidate files.
///
/// Directories contribute files with a supported image extension, sorted
/// by file name. Without `recursive` only the directory's direct children
/// are considered.
pub fn discover(inputs: &[PathBuf], recursive: bool) -> Result<Vec<PathBuf>, IngestError> {
    let mut files = Vec::new();
    for input in inputs {
        if !input.is_dir() {
            files.push(input.clone());
            continue;
        }
        let max_depth = if recursive { usize::MAX } else { 1 };
        for entry in WalkDir::new(input)
            .min_depth(1)
            .max_depth(max_depth)
            .sort_by_file_name()
        {
            let entry = entry?;
            if entry.file_type().is_file() && has_supported_extension(entry.path()) {
                files.push(entry.into_path());
            }
        }
    }
    Ok(files)
}

/// Decode every file, one task per file.
pub fn decode_all(backend: &impl ImageBackend, files: &[PathBuf]) -> Ingested {
    let results: Vec<Result<ImageDescriptor, DecodeFailure>> = files
        .par_iter()
        .map(|path| {
            let failure = |error: String| DecodeFailure {
                source: path.clone(),
                error,
            };
            let bitmap = backend.decode(path).map_err(|e| failure(e.to_string()))?;
            ImageDescriptor::new(path.clone(), bitmap)
                .ok_or_else(|| failure("image has zero width or height".to_string()))
        })
        .collect();

    let mut ingested = Ingested::default();
    for result in results {
        match result {
            Ok(image) => ingested.images.push(image),
            Err(failure) => ingested.failures.push(failure),
        }
    }
    ingested
}

/// Discover and decode in one step.
pub fn ingest(
    backend: &impl ImageBackend,
    inputs: &[PathBuf],
    recursive: bool,
) -> Result<Ingested, IngestError> {
    let files = discover(inputs, recursive)?;
    Ok(decode_all(backend, &files))
}
