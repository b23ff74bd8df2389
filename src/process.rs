//! Post-processing of a single capture.
//!
//! [`PhotoPostProcessor::process`] turns one [`CaptureResult`] into a file on
//! disk plus a [`ProcessedPhoto`] descriptor for the bridge.
//!
//! ## JPEG path
//!
//! ```text
//! decode → orient (EXIF tag) → resize (target width) → crop (aspect) → encode → persist
//! ```
//!
//! Every pixel stage is planned up front by [`plan_pixel_pipeline`] and
//! skipped when it would not change the buffer: tag 1 means no rotation,
//! `target_width == 0` means no resize, 4:3 (or any ratio other than 1:1
//! and 16:9) means no crop.
//!
//! ## RAW path
//!
//! RAW_SENSOR planes bypass the pixel stages entirely. The samples are
//! wrapped in a DNG container and written with a `.dng` extension.
//!
//! ## Persisting
//!
//! Output is written to a temporary file in the destination directory and
//! renamed into place, so a failed run never leaves a partial file at the
//! requested path. Captures without a path get a fresh temporary file named
//! `<file_prefix><random>.jpg` (or `.dng`) in the configured temp directory.

use crate::config::OutputConfig;
use crate::imaging::dng::{DngDescription, SensorPlane, encode_dng};
use crate::imaging::{
    BackendError, CropRect, CropTarget, Dimensions, ImageBackend, OrientTransform, RustBackend,
    calculate_crop_rect, calculate_resize_dimensions, oriented_dimensions,
};
use crate::metadata::{merge_capture_metadata, tiff_string};
use crate::orientation::ExifOrientation;
use crate::types::{CaptureFormat, CaptureResult, ProcessedPhoto, ProcessingRequest};
use std::fs;
use std::io::{self, Write};
use std::path::{Component, Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Error, Debug)]
pub enum ProcessError {
    #[error("Failed to decode {format} capture ({width}x{height}): {reason}")]
    Decode {
        format: CaptureFormat,
        width: u32,
        height: u32,
        reason: String,
    },
    #[error("Unsupported capture format: {0}")]
    UnsupportedFormat(CaptureFormat),
    #[error("Failed to encode {width}x{height} JPEG for {target}: {reason}")]
    Encode {
        width: u32,
        height: u32,
        target: String,
        reason: String,
    },
    #[error("IO error at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl ProcessError {
    /// Stable error code reported to the host.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Decode { .. } => "capture/decode-error",
            Self::UnsupportedFormat(_) => "capture/unsupported-format",
            Self::Encode { .. } => "capture/encode-error",
            Self::Io { .. } => "capture/file-io-error",
        }
    }
}

/// Largest buffer a resize may produce, in pixels (16384 x 16384).
///
/// Checked before the backend allocates, so an oversized `target_width`
/// fails with an encode error instead of exhausting memory.
pub const MAX_OUTPUT_PIXELS: u64 = 1 << 28;

fn io_error(path: &Path) -> impl FnOnce(io::Error) -> ProcessError + '_ {
    move |source| ProcessError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// The pixel stages one JPEG capture will go through.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelPlan {
    /// Orientation correction; identity for tag 1 and unknown tags.
    pub transform: OrientTransform,
    /// Resize target, `None` when the width already matches or resizing is off.
    pub resize: Option<Dimensions>,
    /// Crop window in post-resize coordinates.
    pub crop: Option<CropRect>,
    /// Final buffer size.
    pub output: Dimensions,
}

/// Plan orientation, resize and crop for a decoded buffer.
///
/// Pure function of the decoded size, the EXIF tag and the request.
pub fn plan_pixel_pipeline(
    decoded: Dimensions,
    orientation: ExifOrientation,
    request: &ProcessingRequest,
) -> PixelPlan {
    let transform = orientation.transform();
    let mut extent = oriented_dimensions(decoded.as_tuple(), transform);

    let resize = Some(request.target_width)
        .filter(|&width| width > 0)
        .map(|width| calculate_resize_dimensions(extent, width))
        .filter(|&resized| resized != extent);
    if let Some(resized) = resize {
        extent = resized;
    }

    let crop = calculate_crop_rect(extent, request.aspect_ratio).filter(|rect| !rect.covers(extent));
    if let Some(rect) = crop {
        extent = (rect.width, rect.height);
    }

    PixelPlan {
        transform,
        resize: resize.map(Dimensions::from),
        crop,
        output: extent.into(),
    }
}

/// Runs captures through the pipeline and writes the results.
///
/// The processor holds no per-capture state, so one instance can be shared
/// across threads.
#[derive(Debug, Clone)]
pub struct PhotoPostProcessor<B = RustBackend> {
    backend: B,
    output: OutputConfig,
}

impl PhotoPostProcessor<RustBackend> {
    pub fn new() -> Self {
        Self::with_backend(RustBackend::new())
    }

    pub fn from_config(output: &OutputConfig) -> Self {
        Self::new().with_output(output.clone())
    }
}

impl Default for PhotoPostProcessor<RustBackend> {
    fn default() -> Self {
        Self::new()
    }
}

impl<B: ImageBackend> PhotoPostProcessor<B> {
    /// Use a specific backend (allows testing with mock).
    pub fn with_backend(backend: B) -> Self {
        Self {
            backend,
            output: OutputConfig::default(),
        }
    }

    pub fn with_output(mut self, output: OutputConfig) -> Self {
        self.output = output;
        self
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn output_config(&self) -> &OutputConfig {
        &self.output
    }

    /// Process one capture end to end.
    ///
    /// The capture is consumed; its buffer is released when this returns,
    /// whether or not processing succeeded.
    pub fn process(
        &self,
        capture: CaptureResult,
        request: &ProcessingRequest,
    ) -> Result<ProcessedPhoto, ProcessError> {
        let exif = ExifOrientation::new(capture.exif_orientation);
        if !exif.is_known() {
            debug!(tag = exif.tag(), "unknown EXIF orientation, leaving buffer as stored");
        }
        if exif.is_mirrored() != capture.is_mirrored {
            warn!(
                tag = exif.tag(),
                session_mirrored = capture.is_mirrored,
                "mirrored flag disagrees with EXIF orientation"
            );
        }

        let (bytes, dims, extension) = match &capture.format {
            CaptureFormat::Jpeg | CaptureFormat::DepthJpeg => {
                let (bytes, dims) = self.render_jpeg(&capture, exif, request)?;
                (bytes, dims, "jpg")
            }
            CaptureFormat::RawSensor => {
                let bytes = self.render_dng(&capture, exif)?;
                let dims = Dimensions::new(capture.pixel_width, capture.pixel_height);
                (bytes, dims, "dng")
            }
            CaptureFormat::Unknown(_) => {
                return Err(ProcessError::UnsupportedFormat(capture.format.clone()));
            }
        };

        let requested = request
            .output_path
            .as_deref()
            .map(|path| destination_path(path, &capture.format));
        let path = self.persist(&bytes, requested.as_deref(), extension)?;
        info!(
            path = %path.display(),
            width = dims.width,
            height = dims.height,
            format = %capture.format,
            "photo written"
        );

        Ok(ProcessedPhoto {
            path,
            width: dims.width,
            height: dims.height,
            orientation: exif.orientation(),
            is_raw_photo: capture.format.is_raw(),
            is_mirrored: capture.is_mirrored,
            metadata: merge_capture_metadata(&capture.metadata),
        })
    }

    fn render_jpeg(
        &self,
        capture: &CaptureResult,
        exif: ExifOrientation,
        request: &ProcessingRequest,
    ) -> Result<(Vec<u8>, Dimensions), ProcessError> {
        let image = self
            .backend
            .decode_jpeg(&capture.pixel_data)
            .map_err(|e| decode_error(capture, e))?;

        let decoded = self.backend.dimensions(&image);
        if decoded.as_tuple() != (capture.pixel_width, capture.pixel_height) {
            debug!(
                declared = ?(capture.pixel_width, capture.pixel_height),
                decoded = ?decoded.as_tuple(),
                "declared capture size differs from decoded size"
            );
        }

        if request.aspect_ratio.target() == CropTarget::Unsupported {
            warn!(ratio = %request.aspect_ratio, "no crop rule for aspect ratio, keeping full frame");
        }
        let plan = plan_pixel_pipeline(decoded, exif, request);
        debug!(?plan, "pixel plan");
        if let Some(size) = plan.resize {
            check_pixel_budget(size, request)?;
        }

        let mut image = image;
        if !plan.transform.is_identity() {
            image = self.backend.orient(image, plan.transform);
        }
        if let Some(size) = plan.resize {
            image = self.backend.resize(image, size.width, size.height);
        }
        if let Some(rect) = plan.crop {
            image = self.backend.crop(image, rect);
        }

        let dims = self.backend.dimensions(&image);
        let bytes = self
            .backend
            .encode_jpeg(&image, request.jpeg_quality)
            .map_err(|e| ProcessError::Encode {
                width: dims.width,
                height: dims.height,
                target: describe_target(request.output_path.as_deref()),
                reason: e.to_string(),
            })?;
        Ok((bytes, dims))
    }

    fn render_dng(
        &self,
        capture: &CaptureResult,
        exif: ExifOrientation,
    ) -> Result<Vec<u8>, ProcessError> {
        let sensor = capture.raw.unwrap_or_default();
        let plane = SensorPlane::new(
            &capture.pixel_data,
            capture.pixel_width,
            capture.pixel_height,
            sensor.row_stride,
        )
        .map_err(|reason| ProcessError::Decode {
            format: capture.format.clone(),
            width: capture.pixel_width,
            height: capture.pixel_height,
            reason,
        })?;

        let description = DngDescription {
            make: tiff_string(&capture.metadata, "Make"),
            model: tiff_string(&capture.metadata, "Model"),
            orientation: exif.tag(),
            sensor,
        };
        Ok(encode_dng(&plane, &description))
    }

    /// Write `bytes` to `destination`, or to a new temporary file.
    fn persist(
        &self,
        bytes: &[u8],
        destination: Option<&Path>,
        extension: &str,
    ) -> Result<PathBuf, ProcessError> {
        match destination {
            Some(path) => {
                self.write_atomic(path, bytes)?;
                Ok(path.to_path_buf())
            }
            None => self.write_temporary(bytes, extension),
        }
    }

    fn write_atomic(&self, destination: &Path, bytes: &[u8]) -> Result<(), ProcessError> {
        if !destination.is_absolute() {
            return Err(ProcessError::Io {
                path: destination.to_path_buf(),
                source: io::Error::new(io::ErrorKind::InvalidInput, "output path must be absolute"),
            });
        }
        self.check_sandbox(destination)?;

        let parent = destination
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .ok_or_else(|| ProcessError::Io {
                path: destination.to_path_buf(),
                source: io::Error::new(io::ErrorKind::InvalidInput, "output path has no parent"),
            })?;
        fs::create_dir_all(parent).map_err(io_error(parent))?;

        let mut staged = tempfile::Builder::new()
            .prefix(".photo-finish-")
            .tempfile_in(parent)
            .map_err(io_error(parent))?;
        staged
            .write_all(bytes)
            .and_then(|()| staged.as_file().sync_all())
            .map_err(io_error(destination))?;
        staged
            .persist(destination)
            .map_err(|e| io_error(destination)(e.error))?;
        Ok(())
    }

    fn write_temporary(&self, bytes: &[u8], extension: &str) -> Result<PathBuf, ProcessError> {
        let dir = self.output.temp_dir();
        fs::create_dir_all(&dir).map_err(io_error(&dir))?;

        let suffix = format!(".{extension}");
        let mut file = tempfile::Builder::new()
            .prefix(&self.output.file_prefix)
            .suffix(&suffix)
            .tempfile_in(&dir)
            .map_err(io_error(&dir))?;
        file.write_all(bytes).map_err(io_error(file.path()))?;

        let (_, path) = file.keep().map_err(|e| io_error(&dir)(e.error))?;
        Ok(path)
    }

    fn check_sandbox(&self, destination: &Path) -> Result<(), ProcessError> {
        let Some(root) = &self.output.sandbox_root else {
            return Ok(());
        };
        if normalize(destination).starts_with(normalize(root)) {
            return Ok(());
        }
        Err(ProcessError::Io {
            path: destination.to_path_buf(),
            source: io::Error::new(
                io::ErrorKind::PermissionDenied,
                format!("outside of {}", root.display()),
            ),
        })
    }
}

/// The file a capture with an explicit output path is written to.
///
/// RAW captures always land in a `.dng` file, whatever extension was asked
/// for; every other format is written to the requested path as is.
pub fn destination_path(requested: &Path, format: &CaptureFormat) -> PathBuf {
    if format.is_raw() {
        requested.with_extension("dng")
    } else {
        requested.to_path_buf()
    }
}

/// Process a capture with the default backend and output settings.
pub fn process_capture(
    capture: CaptureResult,
    request: &ProcessingRequest,
) -> Result<ProcessedPhoto, ProcessError> {
    PhotoPostProcessor::new().process(capture, request)
}

fn decode_error(capture: &CaptureResult, error: BackendError) -> ProcessError {
    ProcessError::Decode {
        format: capture.format.clone(),
        width: capture.pixel_width,
        height: capture.pixel_height,
        reason: error.to_string(),
    }
}

fn check_pixel_budget(size: Dimensions, request: &ProcessingRequest) -> Result<(), ProcessError> {
    let pixels = u64::from(size.width) * u64::from(size.height);
    if pixels <= MAX_OUTPUT_PIXELS {
        return Ok(());
    }
    Err(ProcessError::Encode {
        width: size.width,
        height: size.height,
        target: describe_target(request.output_path.as_deref()),
        reason: format!("{pixels} pixels exceeds the {MAX_OUTPUT_PIXELS} pixel limit"),
    })
}

fn describe_target(path: Option<&Path>) -> String {
    path.map(|p| p.display().to_string())
        .unwrap_or_else(|| "temporary file".to_string())
}

/// Resolve `.` and `..` without touching the filesystem.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other),
        }
    }
    out
}
