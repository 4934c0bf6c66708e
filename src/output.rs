//! CLI output formatting for every command.
//!
//! # Information-First Display
//!
//! Each image is shown by its position and file name first, with the full
//! path and any error as indented context lines underneath.
//!
//! # Output Format
//!
//! ## Identify
//!
//! ```text
//! Images
//! 001 beach.jpg (1000x500, ratio 2.000)
//!     Source: photos/beach.jpg
//!
//! Skipped
//! 001 notes.txt
//!     Error: The image format could not be determined
//! ```
//!
//! ## Resize
//!
//! ```text
//! Resizing 2 images to 400x200 (aspect lock on)
//! 001 resized_image_0.jpg (400x200)
//!     Source: photos/beach.jpg
//! 002 resized_image_1.jpg (400x800)
//!     Source: photos/tower.png
//!
//! Wrote 2 of 2 images
//! ```
//!
//! Resize lines arrive in completion order, so positions may appear out of
//! sequence.
//!
//! ## QR
//!
//! ```text
//! QR code for "https://example.com" (with logo)
//!     → out/QRCode.pdf
//! ```
//!
//! # Architecture
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout.

use crate::batch::{BatchReport, FileStatus, ResizeEvent};
use crate::ingest::Ingested;
use std::path::{Path, PathBuf};

// ============================================================================
// Shared display helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|f| f.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn plural(count: usize, noun: &str) -> String {
    if count == 1 {
        format!("{count} {noun}")
    } else {
        format!("{count} {noun}s")
    }
}

// ============================================================================
// Identify
// ============================================================================

/// Format the result of ingesting files: loaded images, then skipped ones.
pub fn format_ingest_output(ingested: &Ingested) -> Vec<String> {
    let mut lines = Vec::new();

    if ingested.images.is_empty() {
        lines.push("No images loaded".to_string());
    } else {
        lines.push("Images".to_string());
        for (i, image) in ingested.images.iter().enumerate() {
            let dims = image.dimensions();
            lines.push(format!(
                "{} {} ({}x{}, ratio {:.3})",
                format_index(i + 1),
                file_name(image.source()),
                dims.width,
                dims.height,
                image.ratio().value()
            ));
            lines.push(format!("{}Source: {}", indent(1), image.source().display()));
        }
    }

    if !ingested.failures.is_empty() {
        lines.push(String::new());
        lines.push("Skipped".to_string());
        for (i, failure) in ingested.failures.iter().enumerate() {
            lines.push(format!(
                "{} {}",
                format_index(i + 1),
                file_name(&failure.source)
            ));
            lines.push(format!("{}Error: {}", indent(1), failure.error));
        }
    }

    lines
}

pub fn print_ingest_output(ingested: &Ingested) {
    for line in format_ingest_output(ingested) {
        println!("{}", line);
    }
}

// ============================================================================
// Resize
// ============================================================================

/// Format a single batch progress event as display lines.
pub fn format_resize_event(event: &ResizeEvent) -> Vec<String> {
    match event {
        ResizeEvent::Started {
            count,
            target,
            lock_aspect,
        } => {
            let lock = if *lock_aspect { "on" } else { "off" };
            vec![format!(
                "Resizing {} to {} (aspect lock {})",
                plural(*count, "image"),
                target,
                lock
            )]
        }
        ResizeEvent::FileFinished(report) => {
            let mut lines = vec![format!(
                "{} {} ({})",
                format_index(report.index + 1),
                report.filename,
                report.dimensions
            )];
            lines.push(format!("{}Source: {}", indent(1), report.source));
            if let FileStatus::Failed { error } = &report.status {
                lines.push(format!("{}Error: {}", indent(1), error));
            }
            lines
        }
    }
}

/// One-line summary after a batch completes.
pub fn format_batch_summary(report: &BatchReport) -> Vec<String> {
    let total = report.files.len();
    let written = report.written();
    let mut summary = format!("Wrote {} of {}", written, plural(total, "image"));
    if report.failed() > 0 {
        summary.push_str(&format!(", {} failed", report.failed()));
    }
    vec![summary]
}

pub fn print_batch_summary(report: &BatchReport) {
    println!();
    for line in format_batch_summary(report) {
        println!("{}", line);
    }
}

// ============================================================================
// QR
// ============================================================================

/// Format the QR command result: payload, logo status, and written files.
pub fn format_qr_output(payload: &str, has_logo: bool, written: &[PathBuf]) -> Vec<String> {
    let header = if payload.is_empty() {
        "QR code for empty text".to_string()
    } else {
        format!("QR code for {:?}", payload)
    };
    let mut lines = vec![if has_logo {
        format!("{header} (with logo)")
    } else {
        header
    }];
    for path in written {
        lines.push(format!("{}→ {}", indent(1), path.display()));
    }
    lines
}

pub fn print_qr_output(payload: &str, has_logo: bool, written: &[PathBuf]) {
    for line in format_qr_output(payload, has_logo, written) {
        println!("{}", line);
    }
}
