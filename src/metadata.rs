//! Capture metadata handling.
//!
//! The camera session delivers metadata as a flat dictionary whose values
//! are opaque to the pipeline, with two well-known nested dictionaries:
//!
//! - `{Exif}`: exposure data, `PixelXDimension` / `PixelYDimension`, …
//! - `{TIFF}`: `Make`, `Model`, `Orientation`, `Software`, …
//!
//! ## Merging for the bridge
//!
//! The host wants both the nested dictionaries and their keys at the top
//! level, so [`merge_capture_metadata`] copies the top level, then lays the
//! `{Exif}` entries over it, then the `{TIFF}` entries. Later sources win on
//! key collisions. The nested dictionaries themselves are kept.
//!
//! ## Lookups
//!
//! The remaining helpers read the handful of values the pipeline itself
//! needs (camera make and model for the DNG container, the orientation tag
//! and pixel size as fallbacks when a capture descriptor omits them). Each
//! looks in the specific sub-dictionary first and the top level second.

use serde_json::Value;

/// Key/value metadata passed through to the host.
pub type Metadata = serde_json::Map<String, Value>;

pub const EXIF_DICTIONARY: &str = "{Exif}";
pub const TIFF_DICTIONARY: &str = "{TIFF}";

/// Flatten `{Exif}` and `{TIFF}` entries into the top level.
pub fn merge_capture_metadata(metadata: &Metadata) -> Metadata {
    let mut merged = metadata.clone();
    for dictionary in [EXIF_DICTIONARY, TIFF_DICTIONARY] {
        if let Some(Value::Object(entries)) = metadata.get(dictionary) {
            for (key, value) in entries {
                merged.insert(key.clone(), value.clone());
            }
        }
    }
    merged
}

fn lookup<'a>(metadata: &'a Metadata, dictionary: &str, key: &str) -> Option<&'a Value> {
    metadata
        .get(dictionary)
        .and_then(Value::as_object)
        .and_then(|d| d.get(key))
        .or_else(|| metadata.get(key))
}

/// A non-empty string from `{TIFF}` (e.g. `Make`, `Model`).
pub fn tiff_string<'a>(metadata: &'a Metadata, key: &str) -> Option<&'a str> {
    lookup(metadata, TIFF_DICTIONARY, key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

/// The EXIF orientation tag, if the metadata carries one.
pub fn orientation_tag(metadata: &Metadata) -> Option<u32> {
    lookup(metadata, TIFF_DICTIONARY, "Orientation")
        .and_then(Value::as_u64)
        .and_then(|v| u32::try_from(v).ok())
}

/// `PixelXDimension` x `PixelYDimension` from `{Exif}`.
pub fn exif_pixel_dimensions(metadata: &Metadata) -> Option<(u32, u32)> {
    let read = |key| {
        lookup(metadata, EXIF_DICTIONARY, key)
            .and_then(Value::as_u64)
            .and_then(|v| u32::try_from(v).ok())
    };
    Some((read("PixelXDimension")?, read("PixelYDimension")?))
}
