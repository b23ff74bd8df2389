//! Image processing in pure Rust, no platform image APIs.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Decode** | `image::load_from_memory_with_format` (JPEG) |
//! | **Orient** | `fliph` / `flipv` / `rotate90` / `rotate180` |
//! | **Resize** | `resize_exact` with Lanczos3 |
//! | **Crop** | `crop_imm` |
//! | **Encode** | `JpegEncoder::new_with_quality` |
//! | **DNG** | custom TIFF writer |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for dimension math (unit testable)
//! - **Parameters**: Data structures describing image operations
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]
//! - **DNG**: RAW sensor planes wrapped in a DNG container

pub mod backend;
mod calculations;
pub mod dng;
mod params;
pub mod rust_backend;

pub use backend::{BackendError, Dimensions, ImageBackend};
pub use calculations::{calculate_crop_rect, calculate_resize_dimensions, oriented_dimensions};
pub use params::{AspectRatio, CropRect, CropTarget, OrientTransform, Quality, Rotation};
pub use rust_backend::RustBackend;
