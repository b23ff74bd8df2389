//! Image processing backend trait and shared types.
//!
//! The [`ImageBackend`] trait is the image-buffer abstraction the pipeline is
//! written against: decode, measure, orient, resize, crop, encode. Each
//! backend picks its own in-memory buffer type through
//! [`ImageBackend::Image`].
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend), built on the `image`
//! crate. Tests use a recording mock whose "image" is just its dimensions.

use super::params::{CropRect, OrientTransform, Quality};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("decode failed: {0}")]
    Decode(String),
    #[error("encode failed: {0}")]
    Encode(String),
}

/// Width and height of a buffer in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn as_tuple(self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn is_empty(self) -> bool {
        self.width == 0 || self.height == 0
    }
}

impl From<(u32, u32)> for Dimensions {
    fn from((width, height): (u32, u32)) -> Self {
        Self { width, height }
    }
}

/// Trait for image processing backends.
///
/// Pixel operations take the buffer by value and return the transformed
/// buffer, so a backend is free to work in place.
pub trait ImageBackend: Sync {
    /// In-memory image buffer.
    type Image;

    /// Decode JPEG bytes into a buffer.
    fn decode_jpeg(&self, bytes: &[u8]) -> Result<Self::Image, BackendError>;

    /// Current buffer dimensions.
    fn dimensions(&self, image: &Self::Image) -> Dimensions;

    /// Apply flips, then rotation.
    fn orient(&self, image: Self::Image, transform: OrientTransform) -> Self::Image;

    /// Resize to exactly `width` x `height` with a high-quality filter.
    fn resize(&self, image: Self::Image, width: u32, height: u32) -> Self::Image;

    /// Cut out `rect`. The rectangle is already clamped to the buffer.
    fn crop(&self, image: Self::Image, rect: CropRect) -> Self::Image;

    /// Encode the buffer as JPEG.
    fn encode_jpeg(&self, image: &Self::Image, quality: Quality) -> Result<Vec<u8>, BackendError>;
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Mock backend that records operations and tracks only dimensions.
    /// Uses Mutex (not RefCell) so it is Sync and can sit behind rayon.
    #[derive(Default)]
    pub struct MockBackend {
        pub decode_results: Mutex<Vec<Dimensions>>,
        pub operations: Mutex<Vec<RecordedOp>>,
    }

    #[derive(Debug, Clone, PartialEq)]
    pub enum RecordedOp {
        Decode { bytes: usize },
        Orient(OrientTransform),
        Resize { width: u32, height: u32 },
        Crop(CropRect),
        Encode { width: u32, height: u32, quality: u32 },
    }

    impl MockBackend {
        pub fn new() -> Self {
            Self::default()
        }

        /// Every decode pops the next queued size.
        pub fn with_decoded(dims: Vec<Dimensions>) -> Self {
            Self {
                decode_results: Mutex::new(dims),
                operations: Mutex::new(Vec::new()),
            }
        }

        pub fn get_operations(&self) -> Vec<RecordedOp> {
            self.operations.lock().unwrap().clone()
        }

        fn record(&self, op: RecordedOp) {
            self.operations.lock().unwrap().push(op);
        }
    }

    impl ImageBackend for MockBackend {
        type Image = Dimensions;

        fn decode_jpeg(&self, bytes: &[u8]) -> Result<Dimensions, BackendError> {
            self.record(RecordedOp::Decode { bytes: bytes.len() });
            if bytes.is_empty() {
                return Err(BackendError::Decode("empty buffer".into()));
            }
            self.decode_results
                .lock()
                .unwrap()
                .pop()
                .ok_or_else(|| BackendError::Decode("No mock dimensions".into()))
        }

        fn dimensions(&self, image: &Dimensions) -> Dimensions {
            *image
        }

        fn orient(&self, image: Dimensions, transform: OrientTransform) -> Dimensions {
            self.record(RecordedOp::Orient(transform));
            if transform.swaps_dimensions() {
                Dimensions::new(image.height, image.width)
            } else {
                image
            }
        }

        fn resize(&self, _image: Dimensions, width: u32, height: u32) -> Dimensions {
            self.record(RecordedOp::Resize { width, height });
            Dimensions::new(width, height)
        }

        fn crop(&self, _image: Dimensions, rect: CropRect) -> Dimensions {
            self.record(RecordedOp::Crop(rect));
            Dimensions::new(rect.width, rect.height)
        }

        fn encode_jpeg(&self, image: &Dimensions, quality: Quality) -> Result<Vec<u8>, BackendError> {
            self.record(RecordedOp::Encode {
                width: image.width,
                height: image.height,
                quality: quality.value(),
            });
            if image.is_empty() {
                return Err(BackendError::Encode("zero-area image".into()));
            }
            Ok(b"mock-jpeg".to_vec())
        }
    }

    #[test]
    fn mock_decode_pops_dimensions() {
        let backend = MockBackend::with_decoded(vec![Dimensions::new(800, 600)]);

        let image = backend.decode_jpeg(b"jpeg").unwrap();
        assert_eq!(image, Dimensions::new(800, 600));

        let ops = backend.get_operations();
        assert_eq!(ops, vec![RecordedOp::Decode { bytes: 4 }]);
    }

    #[test]
    fn mock_decode_rejects_empty_bytes() {
        let backend = MockBackend::with_decoded(vec![Dimensions::new(800, 600)]);
        assert!(matches!(
            backend.decode_jpeg(&[]),
            Err(BackendError::Decode(_))
        ));
    }

    #[test]
    fn mock_crop_and_encode_track_dimensions() {
        let backend = MockBackend::new();
        let cropped = backend.crop(
            Dimensions::new(400, 300),
            CropRect {
                x: 50,
                y: 0,
                width: 300,
                height: 300,
            },
        );
        assert_eq!(cropped, Dimensions::new(300, 300));

        backend.encode_jpeg(&cropped, Quality::new(85)).unwrap();
        assert!(matches!(
            backend.get_operations().last(),
            Some(RecordedOp::Encode {
                width: 300,
                height: 300,
                quality: 85
            })
        ));
    }

    #[test]
    fn dimensions_helpers() {
        let dims: Dimensions = (0, 10).into();
        assert!(dims.is_empty());
        assert_eq!(Dimensions::new(3, 4).as_tuple(), (3, 4));
    }
}
