//! Shared types passed between the capture session, the pipeline and the
//! bridge layer.
//!
//! - [`CaptureResult`]: what the session hands over after a photo request.
//! - [`ProcessingRequest`]: how the caller wants the photo finished.
//! - [`ProcessedPhoto`]: what the bridge receives, serialized with the
//!   camelCase keys the host expects.

use crate::imaging::{AspectRatio, Quality};
use crate::metadata::Metadata;
use crate::orientation::PhotoOrientation;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Pixel format of a capture, as reported by the platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum CaptureFormat {
    Jpeg,
    DepthJpeg,
    RawSensor,
    /// Any format the pipeline has no handling for.
    Unknown(String),
}

impl CaptureFormat {
    /// Map an Android `ImageFormat` constant.
    pub fn from_android_code(code: i32) -> Self {
        match code {
            0x100 => Self::Jpeg,
            0x6965_6963 => Self::DepthJpeg,
            0x20 => Self::RawSensor,
            other => Self::Unknown(format!("0x{other:x}")),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Jpeg => "jpeg",
            Self::DepthJpeg => "depth-jpeg",
            Self::RawSensor => "raw-sensor",
            Self::Unknown(name) => name,
        }
    }

    pub fn is_raw(&self) -> bool {
        matches!(self, Self::RawSensor)
    }
}

impl From<String> for CaptureFormat {
    fn from(name: String) -> Self {
        match name.to_ascii_lowercase().replace('_', "-").as_str() {
            "jpeg" | "jpg" => Self::Jpeg,
            "depth-jpeg" => Self::DepthJpeg,
            "raw-sensor" | "raw" | "dng" => Self::RawSensor,
            _ => Self::Unknown(name),
        }
    }
}

impl From<CaptureFormat> for String {
    fn from(format: CaptureFormat) -> Self {
        format.as_str().to_string()
    }
}

impl fmt::Display for CaptureFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Bayer tile layout of a RAW sensor, read row-major over the 2x2 tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CfaPattern {
    #[default]
    Rggb,
    Grbg,
    Gbrg,
    Bggr,
}

/// Sensor layout needed to wrap RAW samples in a DNG container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RawSensorInfo {
    pub cfa_pattern: CfaPattern,
    pub black_level: u32,
    pub white_level: u32,
    /// Bytes per sensor row; `None` for tightly packed 16-bit rows.
    pub row_stride: Option<u32>,
}

impl Default for RawSensorInfo {
    fn default() -> Self {
        Self {
            cfa_pattern: CfaPattern::Rggb,
            black_level: 64,
            white_level: 1023,
            row_stride: None,
        }
    }
}

/// One completed capture, handed over by the camera session.
///
/// Consumed exactly once by the pipeline.
#[derive(Debug, Clone)]
pub struct CaptureResult {
    pub pixel_data: Vec<u8>,
    pub format: CaptureFormat,
    /// EXIF orientation tag (1–8) describing how to make the buffer upright.
    pub exif_orientation: u32,
    /// True for front-facing / mirrored sensors.
    pub is_mirrored: bool,
    /// Stored buffer size, before orientation correction.
    pub pixel_width: u32,
    pub pixel_height: u32,
    pub metadata: Metadata,
    pub raw: Option<RawSensorInfo>,
}

impl CaptureResult {
    /// A JPEG capture with no metadata.
    pub fn jpeg(pixel_data: Vec<u8>, pixel_width: u32, pixel_height: u32) -> Self {
        Self {
            pixel_data,
            format: CaptureFormat::Jpeg,
            exif_orientation: 1,
            is_mirrored: false,
            pixel_width,
            pixel_height,
            metadata: Metadata::new(),
            raw: None,
        }
    }

    pub fn with_orientation(mut self, exif_orientation: u32) -> Self {
        self.exif_orientation = exif_orientation;
        self
    }

    pub fn with_mirrored(mut self, is_mirrored: bool) -> Self {
        self.is_mirrored = is_mirrored;
        self
    }
}

/// Caller-supplied configuration for one pipeline run.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessingRequest {
    /// Output width in pixels; 0 disables resizing.
    pub target_width: u32,
    pub aspect_ratio: AspectRatio,
    /// Destination file; `None` allocates a temporary file.
    pub output_path: Option<PathBuf>,
    pub jpeg_quality: Quality,
}

impl ProcessingRequest {
    /// Treats an empty path the same as no path.
    pub fn with_output_path(mut self, path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        self.output_path = (!path.as_os_str().is_empty()).then_some(path);
        self
    }
}

impl Default for ProcessingRequest {
    fn default() -> Self {
        Self {
            target_width: 0,
            aspect_ratio: AspectRatio::default(),
            output_path: None,
            jpeg_quality: Quality::default(),
        }
    }
}

/// Result descriptor for the bridge layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessedPhoto {
    pub path: PathBuf,
    pub width: u32,
    pub height: u32,
    pub orientation: PhotoOrientation,
    pub is_raw_photo: bool,
    pub is_mirrored: bool,
    pub metadata: Metadata,
}
