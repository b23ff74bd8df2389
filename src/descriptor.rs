//! Capture descriptors: a capture stored on disk for the CLI.
//!
//! A descriptor is a small JSON file next to the raw pixel bytes:
//!
//! ```json
//! {
//!   "source": "IMG_0001.jpg",
//!   "format": "jpeg",
//!   "exifOrientation": 6,
//!   "isMirrored": false,
//!   "pixelWidth": 4032,
//!   "pixelHeight": 3024,
//!   "metadata": { "{TIFF}": { "Make": "Acme" } },
//!   "options": { "targetWidth": 1080, "aspectRatio": 1.0 }
//! }
//! ```
//!
//! Only `source` is required. `source` is resolved relative to the
//! descriptor. Missing fields fall back in this order:
//!
//! | Field | Fallbacks |
//! |---|---|
//! | `format` | `jpeg` |
//! | `exifOrientation` | `Orientation` in metadata, then 1 |
//! | `pixelWidth` / `pixelHeight` | `PixelXDimension` / `PixelYDimension`, then the JPEG header |
//!
//! RAW_SENSOR descriptors may add a `raw` object (`cfaPattern`,
//! `blackLevel`, `whiteLevel`, `rowStride`).

use crate::metadata::{Metadata, exif_pixel_dimensions, orientation_tag};
use crate::options::TakePhotoOptions;
use crate::types::{CaptureFormat, CaptureResult, RawSensorInfo};
use serde::{Deserialize, Serialize};
use std::io::Cursor;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DescriptorError {
    #[error("Failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid capture descriptor {}: {source}", .path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("RAW capture {} has no pixel dimensions", .0.display())]
    MissingDimensions(PathBuf),
}

fn default_format() -> CaptureFormat {
    CaptureFormat::Jpeg
}

/// On-disk form of a capture.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptureDescriptor {
    pub source: PathBuf,
    #[serde(default = "default_format")]
    pub format: CaptureFormat,
    #[serde(default)]
    pub exif_orientation: Option<u32>,
    #[serde(default)]
    pub is_mirrored: bool,
    #[serde(default)]
    pub pixel_width: Option<u32>,
    #[serde(default)]
    pub pixel_height: Option<u32>,
    #[serde(default)]
    pub metadata: Metadata,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw: Option<RawSensorInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<TakePhotoOptions>,
}

/// A loaded capture plus any options stored with it.
#[derive(Debug)]
pub struct DescribedCapture {
    pub capture: CaptureResult,
    pub options: Option<TakePhotoOptions>,
    /// Absolute path of the pixel bytes.
    pub source: PathBuf,
}

/// Read a descriptor and the pixel bytes it points at.
pub fn load_capture(path: &Path) -> Result<DescribedCapture, DescriptorError> {
    let content = std::fs::read_to_string(path).map_err(|source| DescriptorError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let descriptor: CaptureDescriptor =
        serde_json::from_str(&content).map_err(|source| DescriptorError::Json {
            path: path.to_path_buf(),
            source,
        })?;

    let base = path.parent().unwrap_or(Path::new("."));
    let source = base.join(&descriptor.source);
    let pixel_data = std::fs::read(&source).map_err(|e| DescriptorError::Io {
        path: source.clone(),
        source: e,
    })?;

    let (pixel_width, pixel_height) = match (descriptor.pixel_width, descriptor.pixel_height) {
        (Some(w), Some(h)) => (w, h),
        _ => match exif_pixel_dimensions(&descriptor.metadata) {
            Some(dims) => dims,
            None if descriptor.format.is_raw() => {
                return Err(DescriptorError::MissingDimensions(path.to_path_buf()));
            }
            // Decode reports a bad buffer; an unreadable header is not fatal here.
            None => probe_dimensions(&pixel_data).unwrap_or_default(),
        },
    };

    let exif_orientation = descriptor
        .exif_orientation
        .or_else(|| orientation_tag(&descriptor.metadata))
        .unwrap_or(1);

    Ok(DescribedCapture {
        capture: CaptureResult {
            pixel_data,
            format: descriptor.format,
            exif_orientation,
            is_mirrored: descriptor.is_mirrored,
            pixel_width,
            pixel_height,
            metadata: descriptor.metadata,
            raw: descriptor.raw,
        },
        options: descriptor.options,
        source,
    })
}

fn probe_dimensions(bytes: &[u8]) -> Option<(u32, u32)> {
    image::ImageReader::with_format(Cursor::new(bytes), image::ImageFormat::Jpeg)
        .into_dimensions()
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::CropTarget;
    use crate::test_helpers::encode_test_jpeg;
    use std::fs;
    use tempfile::TempDir;

    fn write_descriptor(dir: &Path, name: &str, json: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, json).unwrap();
        path
    }

    #[test]
    fn loads_full_descriptor() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("img.jpg"), b"bytes").unwrap();
        let path = write_descriptor(
            tmp.path(),
            "img.json",
            r#"{
                "source": "img.jpg",
                "format": "jpeg",
                "exifOrientation": 6,
                "isMirrored": true,
                "pixelWidth": 4000,
                "pixelHeight": 3000,
                "metadata": { "DPIWidth": 72 },
                "options": { "aspectRatio": 1.0 }
            }"#,
        );

        let described = load_capture(&path).unwrap();
        let capture = &described.capture;
        assert_eq!(capture.pixel_data, b"bytes");
        assert_eq!(capture.exif_orientation, 6);
        assert!(capture.is_mirrored);
        assert_eq!((capture.pixel_width, capture.pixel_height), (4000, 3000));
        assert_eq!(described.source, tmp.path().join("img.jpg"));
        let options = described.options.unwrap();
        assert_eq!(options.aspect_ratio.target(), CropTarget::Square);
    }

    #[test]
    fn falls_back_to_metadata() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("img.jpg"), b"bytes").unwrap();
        let path = write_descriptor(
            tmp.path(),
            "img.json",
            r#"{
                "source": "img.jpg",
                "metadata": {
                    "{TIFF}": { "Orientation": 3 },
                    "{Exif}": { "PixelXDimension": 640, "PixelYDimension": 480 }
                }
            }"#,
        );

        let capture = load_capture(&path).unwrap().capture;
        assert_eq!(capture.format, CaptureFormat::Jpeg);
        assert_eq!(capture.exif_orientation, 3);
        assert_eq!((capture.pixel_width, capture.pixel_height), (640, 480));
    }

    #[test]
    fn probes_jpeg_header_when_size_is_missing() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("img.jpg"), encode_test_jpeg(32, 24)).unwrap();
        let path = write_descriptor(tmp.path(), "img.json", r#"{ "source": "img.jpg" }"#);

        let capture = load_capture(&path).unwrap().capture;
        assert_eq!((capture.pixel_width, capture.pixel_height), (32, 24));
        assert_eq!(capture.exif_orientation, 1);
    }

    #[test]
    fn raw_without_dimensions_is_rejected() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("img.raw"), [0u8; 16]).unwrap();
        let path = write_descriptor(
            tmp.path(),
            "img.json",
            r#"{ "source": "img.raw", "format": "raw-sensor" }"#,
        );
        assert!(matches!(
            load_capture(&path),
            Err(DescriptorError::MissingDimensions(_))
        ));
    }

    #[test]
    fn missing_source_is_io_error() {
        let tmp = TempDir::new().unwrap();
        let path = write_descriptor(tmp.path(), "img.json", r#"{ "source": "gone.jpg" }"#);
        match load_capture(&path) {
            Err(DescriptorError::Io { path, .. }) => assert!(path.ends_with("gone.jpg")),
            other => panic!("expected io error, got {other:?}"),
        }
    }

    #[test]
    fn malformed_json_is_reported() {
        let tmp = TempDir::new().unwrap();
        let path = write_descriptor(tmp.path(), "img.json", "{ not json");
        assert!(matches!(load_capture(&path), Err(DescriptorError::Json { .. })));
    }
}
