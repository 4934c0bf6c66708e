//! Batch resize execution.
//!
//! A batch takes a snapshot of the resize form ([`BatchSettings`]) and the
//! loaded images, validates once, then resizes and exports every image
//! independently:
//!
//! ```text
//! validate settings ──▶ for each image (one rayon task per file):
//!                         resolve dims with the image's own ratio
//!                         rasterize → JPEG bytes
//!                         deliver as resized_image_{index}.jpg
//! ```
//!
//! ## Failure Policy
//!
//! Validation is all-or-nothing and happens before any per-file work:
//! unparseable dimensions abort with [`BatchError::InvalidDimensions`],
//! then an empty image set aborts with [`BatchError::NoFiles`]. Neither
//! reaches the backend.
//!
//! Once past validation, each file's pipeline is self-contained. A file
//! whose rasterize or export step fails is recorded as
//! [`FileStatus::Failed`] in the report; the rest of the batch still runs.
//!
//! ## Progress
//!
//! When given a [`Sender`], each finished file emits a [`ResizeEvent`] as
//! soon as its task completes, so the CLI can print progress while the
//! pool is still working. Completion order follows the workers, not the
//! input; the returned [`BatchReport`] is always in input order.

use crate::dimensions::{Field, ResolvedDimensions, parse_dimension, resolve_for_image};
use crate::export::ExportSink;
use crate::imaging::{ImageBackend, output_filename, resize_to_jpeg};
use crate::ingest::ImageDescriptor;
use rayon::prelude::*;
use serde::Serialize;
use std::sync::mpsc::Sender;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BatchError {
    #[error("Please enter valid width and height values.")]
    InvalidDimensions,
    #[error("Please upload an image.")]
    NoFiles,
}

/// Form snapshot taken when "resize and download" is invoked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchSettings {
    /// Raw width field text.
    pub width: String,
    /// Raw height field text.
    pub height: String,
    pub lock_aspect: bool,
    /// Field the user edited last; under the lock it is kept and the other
    /// is re-derived per image.
    pub anchor: Option<Field>,
}

impl BatchSettings {
    /// Parse both fields, failing if either is not a positive integer.
    pub fn validate(&self) -> Result<ResolvedDimensions, BatchError> {
        match (parse_dimension(&self.width), parse_dimension(&self.height)) {
            (Some(width), Some(height)) => Ok(ResolvedDimensions { width, height }),
            _ => Err(BatchError::InvalidDimensions),
        }
    }
}

/// Options that do not come from the form.
#[derive(Debug, Clone)]
pub struct BatchOptions {
    /// Output names are `{filename_prefix}_{index}.jpg`.
    pub filename_prefix: String,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            filename_prefix: "resized_image".to_string(),
        }
    }
}

/// Progress events emitted while a batch runs.
#[derive(Debug, Clone)]
pub enum ResizeEvent {
    /// Validation passed; `count` files will be processed at `target`.
    Started {
        count: usize,
        target: ResolvedDimensions,
        lock_aspect: bool,
    },
    FileFinished(FileReport),
}

/// What happened to one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum FileStatus {
    Written { bytes: usize },
    Failed { error: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileReport {
    /// Zero-based position in the batch.
    pub index: usize,
    pub source: String,
    pub filename: String,
    pub dimensions: ResolvedDimensions,
    #[serde(flatten)]
    pub status: FileStatus,
}

impl FileReport {
    pub fn is_written(&self) -> bool {
        matches!(self.status, FileStatus::Written { .. })
    }
}

/// Outcome of a batch that passed validation.
#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    pub lock_aspect: bool,
    pub files: Vec<FileReport>,
}

impl BatchReport {
    pub fn written(&self) -> usize {
        self.files.iter().filter(|f| f.is_written()).count()
    }

    pub fn failed(&self) -> usize {
        self.files.len() - self.written()
    }
}

/// Validate `settings`, then resize and export every image.
pub fn execute_batch(
    backend: &impl ImageBackend,
    sink: &impl ExportSink,
    images: &[ImageDescriptor],
    settings: &BatchSettings,
    options: &BatchOptions,
    events: Option<Sender<ResizeEvent>>,
) -> Result<BatchReport, BatchError> {
    let entered = settings.validate()?;
    if images.is_empty() {
        return Err(BatchError::NoFiles);
    }

    if let Some(tx) = &events {
        tx.send(ResizeEvent::Started {
            count: images.len(),
            target: entered,
            lock_aspect: settings.lock_aspect,
        })
        .ok();
    }

    let files: Vec<FileReport> = images
        .par_iter()
        .enumerate()
        .map(|(index, image)| {
            let target = resolve_for_image(
                entered,
                image.ratio(),
                settings.anchor,
                settings.lock_aspect,
            );
            let report = resize_one(backend, sink, image, index, target, options);
            if let Some(tx) = &events {
                tx.send(ResizeEvent::FileFinished(report.clone())).ok();
            }
            report
        })
        .collect();

    Ok(BatchReport {
        lock_aspect: settings.lock_aspect,
        files,
    })
}

fn resize_one(
    backend: &impl ImageBackend,
    sink: &impl ExportSink,
    image: &ImageDescriptor,
    index: usize,
    target: ResolvedDimensions,
    options: &BatchOptions,
) -> FileReport {
    let filename = output_filename(&options.filename_prefix, index);
    let status = resize_to_jpeg(backend, image.bitmap(), target)
        .map_err(|e| e.to_string())
        .and_then(|bytes| {
            sink.deliver(&bytes, &filename)
                .map(|()| bytes.len())
                .map_err(|e| e.to_string())
        });

    FileReport {
        index,
        source: image.source().display().to_string(),
        filename,
        dimensions: target,
        status: match status {
            Ok(bytes) => FileStatus::Written { bytes },
            Err(error) => FileStatus::Failed { error },
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::backend::tests::MockBackend;
    use crate::ingest::decode_all;
    use crate::test_helpers::RecordingSink;
    use std::path::PathBuf;

    fn settings(width: &str, height: &str, lock: bool, anchor: Option<Field>) -> BatchSettings {
        BatchSettings {
            width: width.to_string(),
            height: height.to_string(),
            lock_aspect: lock,
            anchor,
        }
    }

    fn load(backend: &MockBackend, names: &[&str]) -> Vec<ImageDescriptor> {
        let paths: Vec<PathBuf> = names.iter().map(PathBuf::from).collect();
        decode_all(backend, &paths).images
    }

    #[test]
    fn validate_parses_both_fields() {
        assert_eq!(
            settings("400", "200", true, None).validate(),
            Ok(ResolvedDimensions {
                width: 400,
                height: 200
            })
        );
    }

    #[test]
    fn non_numeric_width_aborts_without_rasterizing() {
        let backend = MockBackend::with_images(&[("a.jpg", 1000, 500)]);
        let images = load(&backend, &["a.jpg"]);
        let sink = RecordingSink::new();

        let result = execute_batch(
            &backend,
            &sink,
            &images,
            &settings("abc", "200", true, None),
            &BatchOptions::default(),
            None,
        );

        assert_eq!(result.unwrap_err(), BatchError::InvalidDimensions);
        assert!(backend.rasterize_calls().is_empty());
        assert!(sink.filenames().is_empty());
    }

    #[test]
    fn zero_height_aborts_without_rasterizing() {
        let backend = MockBackend::with_images(&[("a.jpg", 1000, 500)]);
        let images = load(&backend, &["a.jpg"]);
        let sink = RecordingSink::new();

        let err = execute_batch(
            &backend,
            &sink,
            &images,
            &settings("400", "0", false, None),
            &BatchOptions::default(),
            None,
        )
        .unwrap_err();

        assert_eq!(err.to_string(), "Please enter valid width and height values.");
        assert!(backend.rasterize_calls().is_empty());
    }

    #[test]
    fn no_files_aborts_with_distinct_message() {
        let backend = MockBackend::new();
        let sink = RecordingSink::new();

        let err = execute_batch(
            &backend,
            &sink,
            &[],
            &settings("400", "200", true, None),
            &BatchOptions::default(),
            None,
        )
        .unwrap_err();

        assert_eq!(err, BatchError::NoFiles);
        assert_eq!(err.to_string(), "Please upload an image.");
        assert!(backend.rasterize_calls().is_empty());
    }

    #[test]
    fn numeric_check_runs_before_file_check() {
        let backend = MockBackend::new();
        let err = execute_batch(
            &backend,
            &RecordingSink::new(),
            &[],
            &settings("", "", true, None),
            &BatchOptions::default(),
            None,
        )
        .unwrap_err();
        assert_eq!(err, BatchError::InvalidDimensions);
    }

    #[test]
    fn single_image_resized_once_and_downloaded_once() {
        let backend = MockBackend::with_images(&[("wide.jpg", 1000, 500)]);
        let images = load(&backend, &["wide.jpg"]);
        let sink = RecordingSink::new();

        let report = execute_batch(
            &backend,
            &sink,
            &images,
            &settings("400", "200", true, Some(Field::Width)),
            &BatchOptions::default(),
            None,
        )
        .unwrap();

        assert_eq!(backend.rasterize_calls(), vec![(400, 200)]);
        assert_eq!(sink.filenames(), vec!["resized_image_0.jpg"]);
        assert_eq!(report.written(), 1);
        assert_eq!(report.failed(), 0);
    }

    #[test]
    fn mixed_ratios_each_use_their_own_ratio() {
        let backend = MockBackend::with_images(&[("wide.jpg", 1000, 500), ("tall.jpg", 500, 1000)]);
        let images = load(&backend, &["wide.jpg", "tall.jpg"]);
        let sink = RecordingSink::new();

        let report = execute_batch(
            &backend,
            &sink,
            &images,
            &settings("400", "800", true, Some(Field::Width)),
            &BatchOptions::default(),
            None,
        )
        .unwrap();

        let dims: Vec<(u32, u32)> = report
            .files
            .iter()
            .map(|f| (f.dimensions.width, f.dimensions.height))
            .collect();
        assert_eq!(dims, vec![(400, 200), (400, 800)]);

        let mut calls = backend.rasterize_calls();
        calls.sort();
        assert_eq!(calls, vec![(400, 200), (400, 800)]);
    }

    #[test]
    fn unlocked_batch_uses_fields_verbatim() {
        let backend = MockBackend::with_images(&[("wide.jpg", 1000, 500), ("tall.jpg", 500, 1000)]);
        let images = load(&backend, &["wide.jpg", "tall.jpg"]);

        let report = execute_batch(
            &backend,
            &RecordingSink::new(),
            &images,
            &settings("300", "300", false, Some(Field::Width)),
            &BatchOptions::default(),
            None,
        )
        .unwrap();

        assert!(report.files.iter().all(|f| f.dimensions
            == ResolvedDimensions {
                width: 300,
                height: 300
            }));
    }

    #[test]
    fn report_and_names_follow_input_order() {
        let names = ["a.jpg", "b.jpg", "c.jpg", "d.jpg"];
        let backend = MockBackend::with_images(&[
            ("a.jpg", 10, 10),
            ("b.jpg", 20, 10),
            ("c.jpg", 10, 20),
            ("d.jpg", 30, 10),
        ]);
        let images = load(&backend, &names);
        let sink = RecordingSink::new();
        let options = BatchOptions {
            filename_prefix: "out".to_string(),
        };

        let report = execute_batch(
            &backend,
            &sink,
            &images,
            &settings("10", "10", false, None),
            &options,
            None,
        )
        .unwrap();

        for (i, file) in report.files.iter().enumerate() {
            assert_eq!(file.index, i);
            assert_eq!(file.source, names[i]);
            assert_eq!(file.filename, format!("out_{i}.jpg"));
        }
        let mut delivered = sink.filenames();
        delivered.sort();
        assert_eq!(delivered, vec!["out_0.jpg", "out_1.jpg", "out_2.jpg", "out_3.jpg"]);
    }

    #[test]
    fn rasterize_failure_is_reported_per_file() {
        let mut backend = MockBackend::with_images(&[("a.jpg", 10, 10), ("b.jpg", 10, 10)]);
        backend.fail_rasterize = true;
        let images = load(&backend, &["a.jpg", "b.jpg"]);
        let sink = RecordingSink::new();

        let report = execute_batch(
            &backend,
            &sink,
            &images,
            &settings("5", "5", false, None),
            &BatchOptions::default(),
            None,
        )
        .unwrap();

        assert_eq!(report.failed(), 2);
        assert!(sink.filenames().is_empty());
        assert!(matches!(
            &report.files[0].status,
            FileStatus::Failed { error } if error.contains("mock failure")
        ));
    }

    #[test]
    fn oversized_target_fails_one_file_and_keeps_the_rest() {
        // 1:1000 ratio: width 100 under the lock derives a height of 100000
        let images = vec![
            ImageDescriptor::new("tall.png", image::DynamicImage::new_rgb8(10, 10_000)).unwrap(),
            ImageDescriptor::new("wide.png", image::DynamicImage::new_rgb8(1000, 500)).unwrap(),
        ];
        let sink = RecordingSink::new();

        let report = execute_batch(
            &crate::imaging::RustBackend::new(),
            &sink,
            &images,
            &settings("100", "50", true, Some(Field::Width)),
            &BatchOptions::default(),
            None,
        )
        .unwrap();

        assert_eq!(
            report.files[0].dimensions,
            ResolvedDimensions {
                width: 100,
                height: 100_000
            }
        );
        assert!(matches!(&report.files[0].status, FileStatus::Failed { .. }));
        assert!(report.files[1].is_written());
        assert_eq!((report.written(), report.failed()), (1, 1));

        let deliveries = sink.deliveries();
        assert_eq!(deliveries.len(), 1);
        assert_eq!(deliveries[0].0, "resized_image_1.jpg");
        let decoded = image::load_from_memory(&deliveries[0].1).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (100, 50));
    }

    #[test]
    fn events_cover_start_and_every_file() {
        let backend = MockBackend::with_images(&[("a.jpg", 10, 10), ("b.jpg", 10, 10)]);
        let images = load(&backend, &["a.jpg", "b.jpg"]);
        let (tx, rx) = std::sync::mpsc::channel();

        execute_batch(
            &backend,
            &RecordingSink::new(),
            &images,
            &settings("5", "5", true, None),
            &BatchOptions::default(),
            Some(tx),
        )
        .unwrap();

        let events: Vec<ResizeEvent> = rx.iter().collect();
        assert_eq!(events.len(), 3);
        assert!(matches!(events[0], ResizeEvent::Started { count: 2, .. }));
        assert!(
            events[1..]
                .iter()
                .all(|e| matches!(e, ResizeEvent::FileFinished(f) if f.is_written()))
        );
    }

    #[test]
    fn report_serializes_with_flat_status() {
        let report = FileReport {
            index: 0,
            source: "a.jpg".to_string(),
            filename: "resized_image_0.jpg".to_string(),
            dimensions: ResolvedDimensions {
                width: 4,
                height: 2,
            },
            status: FileStatus::Written { bytes: 10 },
        };
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["status"], "written");
        assert_eq!(json["bytes"], 10);
        assert_eq!(json["dimensions"]["width"], 4);
    }
}
