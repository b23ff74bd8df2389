//! CLI output formatting.
//!
//! # Output Format
//!
//! ## Process
//!
//! ```text
//! IMG_0001.json → /data/photos/IMG_0001.jpg
//!     Size: 3000x4000
//!     Orientation: landscape-right
//!     Mirrored: no
//! ```
//!
//! ## Batch
//!
//! ```text
//! 001 IMG_0001.json → /data/photos/IMG_0001.jpg (3000x4000, landscape-right)
//! 002 IMG_0002.json ✗ capture/decode-error: Failed to decode jpeg capture (0x0): …
//!
//! Processed 1 of 2 captures, 1 failed
//! ```
//!
//! ## Orientations
//!
//! ```text
//! Tag  Transform                       Orientation           Mirrored
//! 1    identity                        portrait              no
//! 6    rotate 90° cw                   landscape-right       yes
//! ```
//!
//! # Architecture
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure: no I/O, no side effects.

use crate::imaging::{OrientTransform, Rotation};
use crate::orientation::ExifOrientation;
use crate::types::ProcessedPhoto;
use std::path::{Path, PathBuf};

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

fn yes_no(flag: bool) -> &'static str {
    if flag { "yes" } else { "no" }
}

/// Short display name for a descriptor: its file name, or the full path.
fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Human-readable description of an orientation transform.
pub fn describe_transform(transform: OrientTransform) -> String {
    let mut steps = Vec::new();
    if transform.flip_horizontal {
        steps.push("flip horizontal");
    }
    if transform.flip_vertical {
        steps.push("flip vertical");
    }
    match transform.rotation {
        Rotation::None => {}
        Rotation::Quarter => steps.push("rotate 90° cw"),
        Rotation::Half => steps.push("rotate 180°"),
    }
    if steps.is_empty() {
        "identity".to_string()
    } else {
        steps.join(" + ")
    }
}

// ============================================================================
// Process
// ============================================================================

pub fn format_processed(descriptor: &Path, photo: &ProcessedPhoto) -> Vec<String> {
    let mut lines = vec![
        format!("{} → {}", display_name(descriptor), photo.path.display()),
        format!("    Size: {}x{}", photo.width, photo.height),
        format!("    Orientation: {}", photo.orientation),
        format!("    Mirrored: {}", yes_no(photo.is_mirrored)),
    ];
    if photo.is_raw_photo {
        lines.push("    Format: DNG".to_string());
    }
    lines
}

pub fn print_processed(descriptor: &Path, photo: &ProcessedPhoto) {
    for line in format_processed(descriptor, photo) {
        println!("{}", line);
    }
}

// ============================================================================
// Batch
// ============================================================================

/// Why one capture in a batch failed.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchFailure {
    pub code: &'static str,
    pub message: String,
}

/// Result of one capture in a batch.
#[derive(Debug, Clone)]
pub struct BatchEntry {
    pub descriptor: PathBuf,
    pub outcome: Result<ProcessedPhoto, BatchFailure>,
}

pub fn format_batch(entries: &[BatchEntry]) -> Vec<String> {
    let mut lines = Vec::new();
    for (i, entry) in entries.iter().enumerate() {
        let name = display_name(&entry.descriptor);
        let line = match &entry.outcome {
            Ok(photo) => format!(
                "{} {} → {} ({}x{}, {})",
                format_index(i + 1),
                name,
                photo.path.display(),
                photo.width,
                photo.height,
                photo.orientation
            ),
            Err(failure) => format!(
                "{} {} ✗ {}: {}",
                format_index(i + 1),
                name,
                failure.code,
                failure.message
            ),
        };
        lines.push(line);
    }

    let failed = entries.iter().filter(|e| e.outcome.is_err()).count();
    let succeeded = entries.len() - failed;
    lines.push(String::new());
    if failed == 0 {
        let noun = if succeeded == 1 { "capture" } else { "captures" };
        lines.push(format!("Processed {} {}", succeeded, noun));
    } else {
        lines.push(format!(
            "Processed {} of {} captures, {} failed",
            succeeded,
            entries.len(),
            failed
        ));
    }
    lines
}

pub fn print_batch(entries: &[BatchEntry]) {
    for line in format_batch(entries) {
        println!("{}", line);
    }
}

// ============================================================================
// Orientations
// ============================================================================

pub fn format_orientation_table() -> Vec<String> {
    let mut lines = vec![format!(
        "{:<5}{:<32}{:<22}{}",
        "Tag", "Transform", "Orientation", "Mirrored"
    )];
    for tag in 1..=8 {
        let exif = ExifOrientation::new(tag);
        lines.push(format!(
            "{:<5}{:<32}{:<22}{}",
            tag,
            describe_transform(exif.transform()),
            exif.orientation().as_str(),
            yes_no(exif.is_mirrored())
        ));
    }
    lines
}

pub fn print_orientation_table() {
    for line in format_orientation_table() {
        println!("{}", line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::Metadata;
    use crate::orientation::PhotoOrientation;

    fn photo(path: &str) -> ProcessedPhoto {
        ProcessedPhoto {
            path: path.into(),
            width: 3000,
            height: 4000,
            orientation: PhotoOrientation::LandscapeRight,
            is_raw_photo: false,
            is_mirrored: false,
            metadata: Metadata::new(),
        }
    }

    #[test]
    fn processed_lines() {
        let lines = format_processed(Path::new("/in/IMG_0001.json"), &photo("/out/IMG_0001.jpg"));
        assert_eq!(
            lines,
            vec![
                "IMG_0001.json → /out/IMG_0001.jpg",
                "    Size: 3000x4000",
                "    Orientation: landscape-right",
                "    Mirrored: no",
            ]
        );
    }

    #[test]
    fn raw_photo_adds_format_line() {
        let mut raw = photo("/out/IMG_0001.dng");
        raw.is_raw_photo = true;
        let lines = format_processed(Path::new("IMG_0001.json"), &raw);
        assert_eq!(lines.last().unwrap(), "    Format: DNG");
    }

    #[test]
    fn batch_lists_successes_and_failures() {
        let entries = vec![
            BatchEntry {
                descriptor: "/in/a.json".into(),
                outcome: Ok(photo("/out/a.jpg")),
            },
            BatchEntry {
                descriptor: "/in/b.json".into(),
                outcome: Err(BatchFailure {
                    code: "capture/decode-error",
                    message: "bad bytes".into(),
                }),
            },
        ];
        let lines = format_batch(&entries);
        assert_eq!(lines[0], "001 a.json → /out/a.jpg (3000x4000, landscape-right)");
        assert_eq!(lines[1], "002 b.json ✗ capture/decode-error: bad bytes");
        assert_eq!(lines[3], "Processed 1 of 2 captures, 1 failed");
    }

    #[test]
    fn batch_summary_without_failures() {
        let entries = vec![BatchEntry {
            descriptor: "a.json".into(),
            outcome: Ok(photo("/out/a.jpg")),
        }];
        assert_eq!(format_batch(&entries).last().unwrap(), "Processed 1 capture");
    }

    #[test]
    fn orientation_table_has_all_tags() {
        let lines = format_orientation_table();
        assert_eq!(lines.len(), 9);
        assert!(lines[0].starts_with("Tag"));
        assert!(lines[1].starts_with("1    identity"));
        assert!(lines[6].contains("rotate 90° cw"));
        assert!(lines[6].contains("landscape-right"));
        assert!(lines[6].ends_with("yes"));
        assert!(lines[7].contains("flip horizontal + rotate 90° cw"));
    }

    #[test]
    fn describe_combined_transform() {
        let five = ExifOrientation::new(5).transform();
        assert_eq!(describe_transform(five), "flip horizontal + rotate 180°");
    }
}
