//! Export sinks: where finished bytes go.
//!
//! A sink receives an encoded payload and a suggested file name, the same
//! contract as a browser download. [`DirectorySink`] writes into an output
//! directory; tests use a recording sink instead.

use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid output file name: {0:?}")]
    InvalidFilename(String),
}

/// Destination for exported files.
///
/// `Sync` so batch workers can deliver concurrently.
pub trait ExportSink: Sync {
    fn deliver(&self, bytes: &[u8], filename: &str) -> Result<(), ExportError>;
}

/// Writes each delivery to `<dir>/<filename>`, overwriting existing files.
#[derive(Debug, Clone)]
pub struct DirectorySink {
    dir: PathBuf,
}

impl DirectorySink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Where `filename` ends up once delivered.
    pub fn path_for(&self, filename: &str) -> PathBuf {
        self.dir.join(filename)
    }
}

/// A suggested name must be a single plain path component.
fn validate_filename(filename: &str) -> Result<(), ExportError> {
    let mut components = Path::new(filename).components();
    match (components.next(), components.next()) {
        (Some(std::path::Component::Normal(_)), None) => Ok(()),
        _ => Err(ExportError::InvalidFilename(filename.to_string())),
    }
}

impl ExportSink for DirectorySink {
    fn deliver(&self, bytes: &[u8], filename: &str) -> Result<(), ExportError> {
        validate_filename(filename)?;
        std::fs::create_dir_all(&self.dir)?;
        std::fs::write(self.path_for(filename), bytes)?;
        Ok(())
    }
}
