//! Parameter types for image operations.
//!
//! These structs describe *what* to do to a buffer, not *how*. They are the
//! interface between the pipeline planner in [`process`](crate::process)
//! (which decides which stages run) and the [`backend`](super::backend)
//! (which does the pixel work).
//!
//! ## Types
//!
//! - [`Quality`]: JPEG encoding quality (1–100, default 92). Clamped on construction.
//! - [`OrientTransform`]: flips plus a rotation that puts a buffer upright.
//! - [`CropRect`]: a crop window in top-left (y-down) pixel coordinates.
//! - [`AspectRatio`]: requested output ratio (width / height), default 4:3.
//! - [`CropTarget`]: which crop rule an [`AspectRatio`] selects.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Quality setting for JPEG encoding (1-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "u32", into = "u32")]
pub struct Quality(u32);

impl Quality {
    pub fn new(value: u32) -> Self {
        Self(value.clamp(1, 100))
    }

    pub fn value(self) -> u32 {
        self.0
    }

    /// Quality as the `u8` the JPEG encoder takes.
    pub fn as_u8(self) -> u8 {
        self.0 as u8
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(92)
    }
}

impl From<u32> for Quality {
    fn from(value: u32) -> Self {
        Self::new(value)
    }
}

impl From<Quality> for u32 {
    fn from(quality: Quality) -> Self {
        quality.0
    }
}

/// Rotation applied after any flips, expressed as displayed on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rotation {
    None,
    /// A quarter turn clockwise (−90° in the y-up convention of the capture APIs).
    Quarter,
    Half,
}

/// Pixel transform that normalizes a buffer to upright.
///
/// Flips are applied first, then the rotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrientTransform {
    pub flip_horizontal: bool,
    pub flip_vertical: bool,
    pub rotation: Rotation,
}

impl OrientTransform {
    pub const IDENTITY: Self = Self {
        flip_horizontal: false,
        flip_vertical: false,
        rotation: Rotation::None,
    };

    pub fn is_identity(self) -> bool {
        self == Self::IDENTITY
    }

    /// Whether applying this transform exchanges width and height.
    pub fn swaps_dimensions(self) -> bool {
        self.rotation == Rotation::Quarter
    }
}

impl Default for OrientTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Crop window in top-left pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl CropRect {
    /// True when the window covers the whole `(width, height)` extent.
    pub fn covers(&self, extent: (u32, u32)) -> bool {
        self.x == 0 && self.y == 0 && (self.width, self.height) == extent
    }
}

/// Ratio comparisons are made with this tolerance, so `16.0 / 9.0`
/// computed on the host side still selects the 16:9 rule.
const RATIO_EPSILON: f64 = 1e-3;

/// Which crop rule an aspect ratio selects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CropTarget {
    /// 4:3, the sensor's own ratio. Never cropped.
    Native,
    Square,
    Widescreen,
    /// Any other ratio. Passed through uncropped.
    Unsupported,
}

/// Requested output aspect ratio (width / height).
///
/// Deserializes from either a number (`1.7777`) or a `[width, height]` pair
/// (`[16, 9]`), and always serializes as a number.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "AspectRatioRepr", into = "f64")]
pub struct AspectRatio(f64);

impl AspectRatio {
    pub const NATIVE: Self = Self(4.0 / 3.0);
    pub const SQUARE: Self = Self(1.0);
    pub const WIDESCREEN: Self = Self(16.0 / 9.0);

    /// Returns `None` unless `ratio` is finite and positive.
    pub fn new(ratio: f64) -> Option<Self> {
        (ratio.is_finite() && ratio > 0.0).then_some(Self(ratio))
    }

    /// Build from a `width:height` pair. Both parts must be non-zero.
    pub fn from_pair(width: u32, height: u32) -> Option<Self> {
        if width == 0 || height == 0 {
            return None;
        }
        Self::new(width as f64 / height as f64)
    }

    pub fn value(self) -> f64 {
        self.0
    }

    /// Select the crop rule for this ratio.
    pub fn target(self) -> CropTarget {
        let close = |other: Self| (self.0 - other.0).abs() < RATIO_EPSILON;
        if close(Self::NATIVE) {
            CropTarget::Native
        } else if close(Self::SQUARE) {
            CropTarget::Square
        } else if close(Self::WIDESCREEN) {
            CropTarget::Widescreen
        } else {
            CropTarget::Unsupported
        }
    }
}

impl Default for AspectRatio {
    fn default() -> Self {
        Self::NATIVE
    }
}

impl fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.target() {
            CropTarget::Native => write!(f, "4:3"),
            CropTarget::Square => write!(f, "1:1"),
            CropTarget::Widescreen => write!(f, "16:9"),
            CropTarget::Unsupported => write!(f, "{:.4}", self.0),
        }
    }
}

impl std::str::FromStr for AspectRatio {
    type Err = String;

    /// Parses `"16:9"`, `"16/9"` or a plain number such as `"1.0"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let parsed = match s.split_once([':', '/']) {
            Some((w, h)) => {
                let w: u32 = w.trim().parse().map_err(|_| format!("invalid ratio: {s}"))?;
                let h: u32 = h.trim().parse().map_err(|_| format!("invalid ratio: {s}"))?;
                Self::from_pair(w, h)
            }
            None => s.parse::<f64>().ok().and_then(Self::new),
        };
        parsed.ok_or_else(|| format!("aspect ratio must be positive: {s}"))
    }
}

impl From<AspectRatio> for f64 {
    fn from(ratio: AspectRatio) -> Self {
        ratio.0
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum AspectRatioRepr {
    Ratio(f64),
    Pair([u32; 2]),
}

impl TryFrom<AspectRatioRepr> for AspectRatio {
    type Error = String;

    fn try_from(repr: AspectRatioRepr) -> Result<Self, Self::Error> {
        match repr {
            AspectRatioRepr::Ratio(r) => {
                Self::new(r).ok_or_else(|| format!("aspect ratio must be positive, got {r}"))
            }
            AspectRatioRepr::Pair([w, h]) => Self::from_pair(w, h)
                .ok_or_else(|| format!("aspect ratio parts must be non-zero, got [{w}, {h}]")),
        }
    }
}
