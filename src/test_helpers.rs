//! Shared test utilities for the photo-finish test suite.
//!
//! Builders for captures and real JPEG bytes, so unit tests across modules
//! construct inputs the same way.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let capture = jpeg_capture(encode_test_jpeg(80, 60), 80, 60).with_orientation(6);
//! let raw = raw_capture(4, 2);
//! ```

use image::{DynamicImage, Rgb, RgbImage};
use std::io::Cursor;

use crate::types::{CaptureFormat, CaptureResult, RawSensorInfo};

// =========================================================================
// Pixel fixtures
// =========================================================================

/// A black image with a single red pixel at (0, 0).
///
/// Tracking where the marker ends up tells which transform was applied.
pub fn marked_image(width: u32, height: u32) -> DynamicImage {
    let mut img = RgbImage::new(width, height);
    img.put_pixel(0, 0, Rgb([255, 0, 0]));
    DynamicImage::ImageRgb8(img)
}

/// Encode a flat grey image of the given size as JPEG bytes.
pub fn encode_test_jpeg(width: u32, height: u32) -> Vec<u8> {
    let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb([128, 128, 128])));
    let mut bytes = Vec::new();
    img.write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Jpeg)
        .unwrap();
    bytes
}

// =========================================================================
// Capture builders
// =========================================================================

/// An upright, unmirrored JPEG capture.
pub fn jpeg_capture(pixel_data: Vec<u8>, width: u32, height: u32) -> CaptureResult {
    CaptureResult::jpeg(pixel_data, width, height)
}

/// A RAW_SENSOR capture with tightly packed 16-bit samples.
///
/// Sample values count up from zero so repacking errors are visible.
pub fn raw_capture(width: u32, height: u32) -> CaptureResult {
    let samples = (width * height) as u16;
    let pixel_data = (0..samples).flat_map(u16::to_le_bytes).collect();
    CaptureResult {
        pixel_data,
        format: CaptureFormat::RawSensor,
        exif_orientation: 1,
        is_mirrored: false,
        pixel_width: width,
        pixel_height: height,
        metadata: Default::default(),
        raw: Some(RawSensorInfo::default()),
    }
}
