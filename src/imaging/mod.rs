//! Image processing on top of the `image` crate.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Decode** | `image::ImageReader::decode` |
//! | **Resize → JPEG** | `resize_exact` (Lanczos3) + `JpegEncoder` at quality 100 |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for dimension math (unit testable)
//! - **Parameters**: Data structures describing image operations
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]
//! - **Operations**: High-level functions combining calculations + backend

pub mod backend;
mod calculations;
pub mod operations;
mod params;
pub mod rust_backend;

pub use backend::{BackendError, Dimensions, ImageBackend};
pub use calculations::{
    AspectRatio, ModuleLayout, calculate_contain_dimensions, calculate_module_layout,
    center_offset,
};
pub use operations::{output_filename, resize_to_jpeg};
pub use params::{Quality, RasterizeParams};
pub use rust_backend::{RustBackend, has_supported_extension, supported_input_extensions};
