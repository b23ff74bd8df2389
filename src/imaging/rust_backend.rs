//! Pure Rust image processing backend built on the `image` crate.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Decode (JPEG, depth JPEG) | `image::load_from_memory_with_format` |
//! | Flip / rotate | `DynamicImage::{fliph, flipv, rotate90, rotate180}` |
//! | Resize | `DynamicImage::resize_exact` with `Lanczos3` filter |
//! | Crop | `DynamicImage::crop_imm` |
//! | Encode → JPEG | `image::codecs::jpeg::JpegEncoder` |

use super::backend::{BackendError, Dimensions, ImageBackend};
use super::params::{CropRect, OrientTransform, Quality, Rotation};
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat};
use std::borrow::Cow;

/// Pure Rust backend using the `image` crate ecosystem.
///
/// See the [module docs](self) for the crate-to-operation mapping.
#[derive(Debug, Clone, Copy)]
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

/// The JPEG encoder only accepts 8-bit luma or RGB samples.
fn encodable(image: &DynamicImage) -> Cow<'_, DynamicImage> {
    match image {
        DynamicImage::ImageLuma8(_) | DynamicImage::ImageRgb8(_) => Cow::Borrowed(image),
        other => Cow::Owned(DynamicImage::ImageRgb8(other.to_rgb8())),
    }
}

impl ImageBackend for RustBackend {
    type Image = DynamicImage;

    fn decode_jpeg(&self, bytes: &[u8]) -> Result<DynamicImage, BackendError> {
        if bytes.is_empty() {
            return Err(BackendError::Decode("empty buffer".into()));
        }
        image::load_from_memory_with_format(bytes, ImageFormat::Jpeg)
            .map_err(|e| BackendError::Decode(e.to_string()))
    }

    fn dimensions(&self, image: &DynamicImage) -> Dimensions {
        Dimensions::new(image.width(), image.height())
    }

    fn orient(&self, image: DynamicImage, transform: OrientTransform) -> DynamicImage {
        let image = if transform.flip_horizontal {
            image.fliph()
        } else {
            image
        };
        let image = if transform.flip_vertical {
            image.flipv()
        } else {
            image
        };
        match transform.rotation {
            Rotation::None => image,
            Rotation::Quarter => image.rotate90(),
            Rotation::Half => image.rotate180(),
        }
    }

    fn resize(&self, image: DynamicImage, width: u32, height: u32) -> DynamicImage {
        image.resize_exact(width, height, FilterType::Lanczos3)
    }

    fn crop(&self, image: DynamicImage, rect: CropRect) -> DynamicImage {
        image.crop_imm(rect.x, rect.y, rect.width, rect.height)
    }

    fn encode_jpeg(&self, image: &DynamicImage, quality: Quality) -> Result<Vec<u8>, BackendError> {
        if image.width() == 0 || image.height() == 0 {
            return Err(BackendError::Encode(format!(
                "cannot encode a {}x{} image",
                image.width(),
                image.height()
            )));
        }
        let mut buf = Vec::new();
        let encoder = JpegEncoder::new_with_quality(&mut buf, quality.as_u8());
        encodable(image)
            .write_with_encoder(encoder)
            .map_err(|e| BackendError::Encode(e.to_string()))?;
        Ok(buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{encode_test_jpeg, marked_image};
    use image::{GenericImageView, Rgb, RgbImage};

    #[test]
    fn decode_synthetic_jpeg() {
        let bytes = encode_test_jpeg(200, 150);
        let backend = RustBackend::new();
        let image = backend.decode_jpeg(&bytes).unwrap();
        assert_eq!(backend.dimensions(&image), Dimensions::new(200, 150));
    }

    #[test]
    fn decode_rejects_empty_and_garbage() {
        let backend = RustBackend::new();
        assert!(matches!(
            backend.decode_jpeg(&[]),
            Err(BackendError::Decode(_))
        ));
        assert!(matches!(
            backend.decode_jpeg(b"definitely not a jpeg"),
            Err(BackendError::Decode(_))
        ));
    }

    #[test]
    fn decode_rejects_png_declared_as_jpeg() {
        let mut png = Vec::new();
        DynamicImage::ImageRgb8(RgbImage::new(4, 4))
            .write_to(&mut std::io::Cursor::new(&mut png), ImageFormat::Png)
            .unwrap();
        assert!(RustBackend::new().decode_jpeg(&png).is_err());
    }

    #[test]
    fn quarter_turn_is_clockwise() {
        // Red marker at top-left; after a clockwise quarter turn it sits top-right.
        let backend = RustBackend::new();
        let oriented = backend.orient(
            marked_image(4, 2),
            OrientTransform {
                rotation: Rotation::Quarter,
                ..OrientTransform::IDENTITY
            },
        );
        assert_eq!(backend.dimensions(&oriented), Dimensions::new(2, 4));
        assert_eq!(oriented.get_pixel(1, 0).0[..3], [255, 0, 0]);
    }

    #[test]
    fn horizontal_flip_mirrors_marker() {
        let backend = RustBackend::new();
        let oriented = backend.orient(
            marked_image(4, 2),
            OrientTransform {
                flip_horizontal: true,
                ..OrientTransform::IDENTITY
            },
        );
        assert_eq!(oriented.get_pixel(3, 0).0[..3], [255, 0, 0]);
    }

    #[test]
    fn vertical_flip_moves_marker_to_bottom_left() {
        let backend = RustBackend::new();
        let oriented = backend.orient(
            marked_image(4, 2),
            OrientTransform {
                flip_vertical: true,
                ..OrientTransform::IDENTITY
            },
        );
        assert_eq!(backend.dimensions(&oriented), Dimensions::new(4, 2));
        assert_eq!(oriented.get_pixel(0, 1).0[..3], [255, 0, 0]);
        assert_eq!(oriented.get_pixel(0, 0).0[..3], [0, 0, 0]);
    }

    #[test]
    fn flip_applies_before_rotation() {
        // fliph moves the marker to top-right, then a quarter turn moves it bottom-right.
        let backend = RustBackend::new();
        let oriented = backend.orient(
            marked_image(4, 2),
            OrientTransform {
                flip_horizontal: true,
                flip_vertical: false,
                rotation: Rotation::Quarter,
            },
        );
        assert_eq!(oriented.get_pixel(1, 3).0[..3], [255, 0, 0]);
    }

    #[test]
    fn resize_and_crop_produce_requested_sizes() {
        let backend = RustBackend::new();
        let image = DynamicImage::ImageRgb8(RgbImage::from_pixel(400, 300, Rgb([10, 20, 30])));

        let resized = backend.resize(image, 200, 150);
        assert_eq!(backend.dimensions(&resized), Dimensions::new(200, 150));

        let cropped = backend.crop(
            resized,
            CropRect {
                x: 25,
                y: 0,
                width: 150,
                height: 150,
            },
        );
        assert_eq!(backend.dimensions(&cropped), Dimensions::new(150, 150));
    }

    #[test]
    fn encode_round_trips_dimensions() {
        let backend = RustBackend::new();
        let image = DynamicImage::ImageRgb8(RgbImage::from_pixel(64, 48, Rgb([200, 100, 50])));
        let bytes = backend.encode_jpeg(&image, Quality::new(100)).unwrap();
        let decoded = backend.decode_jpeg(&bytes).unwrap();
        assert_eq!(backend.dimensions(&decoded), Dimensions::new(64, 48));
    }

    #[test]
    fn encode_converts_rgba() {
        let backend = RustBackend::new();
        let image = DynamicImage::ImageRgba8(image::RgbaImage::new(8, 8));
        assert!(backend.encode_jpeg(&image, Quality::default()).is_ok());
    }

    #[test]
    fn encode_rejects_zero_area() {
        let backend = RustBackend::new();
        let image = DynamicImage::ImageRgb8(RgbImage::new(0, 10));
        assert!(matches!(
            backend.encode_jpeg(&image, Quality::default()),
            Err(BackendError::Encode(_))
        ));
    }
}
