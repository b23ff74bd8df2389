//! # Photo Finish
//!
//! Post-processing for photos handed over by a camera session. A capture
//! arrives as an encoded buffer plus an EXIF orientation tag; it leaves as a
//! file on disk and a small descriptor the host app can consume.
//!
//! # Architecture: One Pipeline
//!
//! ```text
//! CaptureResult ──► decode ──► orient ──► resize ──► crop ──► encode ──► persist ──► ProcessedPhoto
//!                     (JPEG)    (tag)    (width)   (ratio)   (quality)   (file)
//!
//! RAW_SENSOR ───────────────────────────────────────────► DNG ──────► persist
//! ```
//!
//! Every stage that would not change the buffer is skipped, so an upright
//! capture with default options is decoded and re-encoded exactly once.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`process`] | The pipeline: [`process::PhotoPostProcessor`], stage planning, atomic persist |
//! | [`capture`] | Owned completion handles for in-flight captures |
//! | [`orientation`] | EXIF tag → pixel transform, reported orientation, mirroring |
//! | [`imaging`] | Pure-Rust image operations and the DNG writer |
//! | [`types`] | `CaptureResult`, `ProcessingRequest`, `ProcessedPhoto` |
//! | [`options`] | Host-facing `TakePhotoOptions` and quality tiers |
//! | [`metadata`] | Capture metadata merging and lookups |
//! | [`descriptor`] | JSON capture descriptors read by the CLI |
//! | [`config`] | `photo-finish.toml` loading, validation, merging |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Backend Trait Over Platform APIs
//!
//! Pixel work goes through [`imaging::ImageBackend`]. The production
//! [`imaging::RustBackend`] uses the `image` crate; tests swap in a
//! recording mock that only tracks dimensions, so stage selection and order
//! are asserted without encoding a single pixel.
//!
//! ## Explicit Ownership of In-Flight Captures
//!
//! A capture in progress is a pair of owned values, not an entry in a global
//! table. The session side resolves it exactly once; dropping it without
//! resolving wakes the caller with an error instead of leaking a waiter.
//!
//! ## Crop Anchoring
//!
//! Square crops of tall frames and 16:9 crops of wide frames are vertically
//! centered. Their offset is measured from the bottom edge, as the capture
//! APIs do, so with an odd leftover the extra row lands below the window.
//! The window never sits more than one row above center.

pub mod capture;
pub mod config;
pub mod descriptor;
pub mod imaging;
pub mod metadata;
pub mod options;
pub mod orientation;
pub mod output;
pub mod process;
pub mod types;

#[cfg(test)]
pub(crate) mod test_helpers;
