//! EXIF orientation tags.
//!
//! One tag drives two independent lookups:
//!
//! | Tag | Pixel transform | Reported orientation | Tag mirrored |
//! |---|---|---|---|
//! | 1 | identity | portrait | no |
//! | 2 | flip horizontal | portrait | yes |
//! | 3 | rotate 180° | portrait-upside-down | no |
//! | 4 | flip vertical | portrait-upside-down | yes |
//! | 5 | flip horizontal + rotate 180° | landscape-left | no |
//! | 6 | rotate −90° | landscape-right | yes |
//! | 7 | flip horizontal + rotate −90° | landscape-right | no |
//! | 8 | rotate −90° | landscape-left | yes |
//!
//! "−90°" follows the y-up convention of the capture APIs, which is a
//! quarter turn clockwise on screen. Tags 6 and 8 deliberately share the
//! same rotation, matching what shipped on device; EXIF proper rotates 8
//! the other way. Unknown tags behave like tag 1.

use crate::imaging::{OrientTransform, Rotation};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Orientation reported to the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PhotoOrientation {
    Portrait,
    PortraitUpsideDown,
    LandscapeLeft,
    LandscapeRight,
}

impl PhotoOrientation {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Portrait => "portrait",
            Self::PortraitUpsideDown => "portrait-upside-down",
            Self::LandscapeLeft => "landscape-left",
            Self::LandscapeRight => "landscape-right",
        }
    }
}

impl fmt::Display for PhotoOrientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An EXIF orientation tag as delivered by the capture session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExifOrientation(u32);

impl ExifOrientation {
    pub fn new(tag: u32) -> Self {
        Self(tag)
    }

    pub fn tag(self) -> u32 {
        self.0
    }

    /// True for tags 1 through 8.
    pub fn is_known(self) -> bool {
        (1..=8).contains(&self.0)
    }

    /// Transform that stores the buffer upright in memory.
    pub fn transform(self) -> OrientTransform {
        let (flip_horizontal, flip_vertical, rotation) = match self.0 {
            2 => (true, false, Rotation::None),
            3 => (false, false, Rotation::Half),
            4 => (false, true, Rotation::None),
            5 => (true, false, Rotation::Half),
            6 | 8 => (false, false, Rotation::Quarter),
            7 => (true, false, Rotation::Quarter),
            _ => return OrientTransform::IDENTITY,
        };
        OrientTransform {
            flip_horizontal,
            flip_vertical,
            rotation,
        }
    }

    pub fn orientation(self) -> PhotoOrientation {
        match self.0 {
            3 | 4 => PhotoOrientation::PortraitUpsideDown,
            5 | 8 => PhotoOrientation::LandscapeLeft,
            6 | 7 => PhotoOrientation::LandscapeRight,
            _ => PhotoOrientation::Portrait,
        }
    }

    /// Mirroring implied by the tag alone.
    ///
    /// Callers compare this with the session's own mirrored flag; the two
    /// should agree.
    pub fn is_mirrored(self) -> bool {
        matches!(self.0, 2 | 4 | 6 | 8)
    }
}

impl From<u32> for ExifOrientation {
    fn from(tag: u32) -> Self {
        Self(tag)
    }
}
