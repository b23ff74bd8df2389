//! Host-facing photo options.
//!
//! [`TakePhotoOptions`] mirrors the option object the host passes to
//! `takePhoto`. Only part of it concerns post-processing; flash, shutter
//! sound, red-eye reduction and stabilization are consumed by the capture
//! session and merely carried here so one record describes the request.

use crate::imaging::{AspectRatio, Quality};
use crate::types::ProcessingRequest;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Coarse speed/quality trade-off chosen by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QualityPrioritization {
    Speed,
    #[default]
    Balanced,
    Quality,
}

impl QualityPrioritization {
    /// JPEG quality used for this tier.
    pub fn jpeg_quality(self) -> Quality {
        Quality::new(match self {
            Self::Speed => 85,
            Self::Balanced => 92,
            Self::Quality => 100,
        })
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Speed => "speed",
            Self::Balanced => "balanced",
            Self::Quality => "quality",
        }
    }
}

impl fmt::Display for QualityPrioritization {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QualityPrioritization {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "speed" => Ok(Self::Speed),
            "balanced" => Ok(Self::Balanced),
            "quality" => Ok(Self::Quality),
            other => Err(format!(
                "unknown quality prioritization '{other}' (expected speed, balanced or quality)"
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Flash {
    #[default]
    Off,
    On,
    Auto,
}

/// Options for one photo, as sent by the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TakePhotoOptions {
    pub quality_prioritization: QualityPrioritization,
    pub flash: Flash,
    pub enable_shutter_sound: bool,
    pub enable_auto_red_eye_reduction: bool,
    pub enable_auto_stabilization: bool,
    /// Destination path; empty means a temporary file.
    pub file_path: String,
    pub target_width: u32,
    pub aspect_ratio: AspectRatio,
}

impl Default for TakePhotoOptions {
    fn default() -> Self {
        Self {
            quality_prioritization: QualityPrioritization::default(),
            flash: Flash::default(),
            enable_shutter_sound: true,
            enable_auto_red_eye_reduction: false,
            enable_auto_stabilization: false,
            file_path: String::new(),
            target_width: 0,
            aspect_ratio: AspectRatio::default(),
        }
    }
}

impl TakePhotoOptions {
    /// Build the pipeline request these options describe.
    pub fn to_request(&self) -> ProcessingRequest {
        ProcessingRequest {
            target_width: self.target_width,
            aspect_ratio: self.aspect_ratio,
            output_path: None,
            jpeg_quality: self.quality_prioritization.jpeg_quality(),
        }
        .with_output_path(&self.file_path)
    }
}
