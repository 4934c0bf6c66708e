//! # qrsize
//!
//! Two small image utilities behind one command line:
//!
//! - a **QR code generator** that can overlay a semi-transparent logo and
//!   export the result as a one-page PDF (or PNG), and
//! - a **batch resizer** that turns any number of images into JPEGs at a
//!   chosen size, optionally keeping each image's own aspect ratio.
//!
//! # Architecture
//!
//! Both tools follow the same shape: inputs are decoded once, a pure
//! decision step computes what to produce, and the bytes go to an
//! [`export::ExportSink`]:
//!
//! ```text
//! resize:  paths ─▶ ingest ─▶ ResizeForm ─▶ BatchSettings ─▶ execute_batch ─▶ sink
//!                  (decode)   (dimension     (snapshot)      (one rayon task
//!                              resolver)                      per file)
//!
//! qr:      text + logo ─▶ QrSession::generate ─▶ compose ─▶ pdf / png ─▶ sink
//! ```
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`dimensions`] | Dimension resolver and the resize form state (aspect lock, last-edited field) |
//! | [`batch`] | Validates a form snapshot and resizes/exports every loaded image |
//! | [`ingest`] | Expands input paths and decodes images in parallel |
//! | [`qr`] | QR rendering, logo compositing, and the generator session |
//! | [`pdf`] | Single-page PDF containing one bitmap |
//! | [`export`] | Delivery of finished bytes under a suggested file name |
//! | [`imaging`] | Image backend trait, pure-Rust implementation, size math |
//! | [`config`] | `qrsize.toml` loading, validation, and merging with stock defaults |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Per-Image Aspect Ratio
//!
//! A batch shares one width/height pair, but under the aspect lock every
//! image keeps its *own* proportions: the field the user edited last is
//! kept and the other is recomputed from each image's intrinsic ratio.
//! Without the lock every image is stretched to the exact pair.
//!
//! ## Export Follows the Current State
//!
//! Exporting a QR code is only possible for the text that was last
//! generated. If the text changes, export is disabled until the next
//! generate. The logo, in contrast, is read at export time, so swapping
//! logos never requires regenerating.

pub mod batch;
pub mod config;
pub mod dimensions;
pub mod export;
pub mod imaging;
pub mod ingest;
pub mod output;
pub mod pdf;
pub mod qr;

#[cfg(test)]
pub(crate) mod test_helpers;
