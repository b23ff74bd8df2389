//! Pure calculation functions for image dimensions.
//!
//! All functions here are pure and testable without any I/O or images.

use super::params::{AspectRatio, CropRect, CropTarget, OrientTransform};

/// Dimensions of a buffer after applying an orientation transform.
pub fn oriented_dimensions(source: (u32, u32), transform: OrientTransform) -> (u32, u32) {
    let (w, h) = source;
    if transform.swaps_dimensions() {
        (h, w)
    } else {
        (w, h)
    }
}

/// Calculate the output size for a `target_width` resize.
///
/// The buffer's own aspect ratio is preserved. The width lands on
/// `target_width` either way: for portrait and square buffers it is the
/// short edge, for landscape buffers the long edge. The other dimension is
/// scaled proportionally and never drops below one pixel.
///
/// # Examples
/// ```
/// # use photo_finish::imaging::calculate_resize_dimensions;
/// // Portrait 3000x4000 → short edge 1500
/// assert_eq!(calculate_resize_dimensions((3000, 4000), 1500), (1500, 2000));
///
/// // Landscape 4000x3000 → long edge 1000
/// assert_eq!(calculate_resize_dimensions((4000, 3000), 1000), (1000, 750));
/// ```
pub fn calculate_resize_dimensions(source: (u32, u32), target_width: u32) -> (u32, u32) {
    let (w, h) = source;
    if w == 0 || h == 0 {
        return source;
    }
    let scale = target_width as f64 / w as f64;
    let new_h = ((h as f64 * scale).round() as u32).max(1);
    (target_width, new_h)
}

/// Calculate the crop window for an aspect ratio.
///
/// Returns `None` when the ratio has no crop rule (4:3 and anything other
/// than 1:1 or 16:9). The returned window is always clamped to the buffer.
///
/// | Ratio | Buffer | Window |
/// |---|---|---|
/// | 1:1 | taller | height = width, bottom-anchored offset |
/// | 1:1 | wider | width = height, horizontally centered |
/// | 16:9 | taller | width = height / (16/9), horizontally centered |
/// | 16:9 | wider or square | height = width / (16/9), bottom-anchored offset |
pub fn calculate_crop_rect(source: (u32, u32), aspect: AspectRatio) -> Option<CropRect> {
    let (w, h) = source;
    let ratio = aspect.value();

    let rect = match aspect.target() {
        CropTarget::Native | CropTarget::Unsupported => return None,
        CropTarget::Square if h > w => {
            let height = fit(w as f64 * ratio, h);
            CropRect {
                x: 0,
                y: bottom_anchored_top(h, height),
                width: w,
                height,
            }
        }
        CropTarget::Square => {
            let width = fit(h as f64 * ratio, w);
            CropRect {
                x: (w - width) / 2,
                y: 0,
                width,
                height: h,
            }
        }
        CropTarget::Widescreen if h > w => {
            let width = fit(h as f64 / ratio, w);
            CropRect {
                x: (w - width) / 2,
                y: 0,
                width,
                height: h,
            }
        }
        CropTarget::Widescreen => {
            let height = fit(w as f64 / ratio, h);
            CropRect {
                x: 0,
                y: bottom_anchored_top(h, height),
                width: w,
                height,
            }
        }
    };

    Some(rect)
}

/// Round a computed edge and clamp it into `1..=extent`.
fn fit(len: f64, extent: u32) -> u32 {
    (len.round() as u32).max(1).min(extent)
}

/// Top row of a window whose offset is measured from the bottom edge.
///
/// The bottom margin is `ceil((extent - window) / 2)`, so an odd leftover
/// row ends up below the window and the window leans toward the top.
fn bottom_anchored_top(extent: u32, window: u32) -> u32 {
    let spare = extent - window;
    let bottom_margin = spare.div_ceil(2);
    spare - bottom_margin
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::params::Rotation;

    fn ratio(r: f64) -> AspectRatio {
        AspectRatio::new(r).unwrap()
    }

    // =========================================================================
    // oriented_dimensions tests
    // =========================================================================

    #[test]
    fn quarter_turn_swaps() {
        let t = OrientTransform {
            rotation: Rotation::Quarter,
            ..OrientTransform::IDENTITY
        };
        assert_eq!(oriented_dimensions((4000, 3000), t), (3000, 4000));
    }

    #[test]
    fn flips_and_half_turn_keep_dimensions() {
        let t = OrientTransform {
            flip_horizontal: true,
            flip_vertical: false,
            rotation: Rotation::Half,
        };
        assert_eq!(oriented_dimensions((4000, 3000), t), (4000, 3000));
    }

    // =========================================================================
    // calculate_resize_dimensions tests
    // =========================================================================

    #[test]
    fn resize_portrait_sets_short_edge() {
        assert_eq!(calculate_resize_dimensions((3000, 4000), 1080), (1080, 1440));
    }

    #[test]
    fn resize_landscape_sets_long_edge() {
        assert_eq!(calculate_resize_dimensions((4000, 3000), 1080), (1080, 810));
    }

    #[test]
    fn resize_square() {
        assert_eq!(calculate_resize_dimensions((500, 500), 200), (200, 200));
    }

    #[test]
    fn resize_upscales_when_target_is_larger() {
        assert_eq!(calculate_resize_dimensions((300, 400), 600), (600, 800));
    }

    #[test]
    fn resize_never_collapses_height() {
        assert_eq!(calculate_resize_dimensions((1000, 1), 10), (10, 1));
    }

    // =========================================================================
    // calculate_crop_rect tests
    // =========================================================================

    #[test]
    fn native_ratio_has_no_crop() {
        assert_eq!(calculate_crop_rect((3000, 4000), AspectRatio::NATIVE), None);
    }

    #[test]
    fn unsupported_ratio_has_no_crop() {
        assert_eq!(calculate_crop_rect((3000, 4000), ratio(1.5)), None);
        assert_eq!(calculate_crop_rect((3000, 4000), ratio(9.0 / 16.0)), None);
    }

    #[test]
    fn square_on_portrait_crops_height() {
        // 3000x4000 → 3000x3000, 1000 spare rows split 500/500
        let rect = calculate_crop_rect((3000, 4000), AspectRatio::SQUARE).unwrap();
        assert_eq!(
            rect,
            CropRect {
                x: 0,
                y: 500,
                width: 3000,
                height: 3000
            }
        );
    }

    #[test]
    fn square_on_portrait_odd_spare_row_goes_below() {
        // 3 spare rows: 1 above, 2 below
        let rect = calculate_crop_rect((10, 13), AspectRatio::SQUARE).unwrap();
        assert_eq!(rect.y, 1);
        assert_eq!(rect.height, 10);
    }

    #[test]
    fn square_on_landscape_centers_horizontally() {
        let rect = calculate_crop_rect((4000, 3000), AspectRatio::SQUARE).unwrap();
        assert_eq!(
            rect,
            CropRect {
                x: 500,
                y: 0,
                width: 3000,
                height: 3000
            }
        );
    }

    #[test]
    fn square_on_square_covers_buffer() {
        let rect = calculate_crop_rect((1200, 1200), AspectRatio::SQUARE).unwrap();
        assert!(rect.covers((1200, 1200)));
    }

    #[test]
    fn widescreen_on_portrait_crops_width() {
        // 3000x4000 → width 4000 / (16/9) = 2250, centered
        let rect = calculate_crop_rect((3000, 4000), AspectRatio::WIDESCREEN).unwrap();
        assert_eq!(
            rect,
            CropRect {
                x: 375,
                y: 0,
                width: 2250,
                height: 4000
            }
        );
    }

    #[test]
    fn widescreen_on_landscape_crops_height() {
        // 4000x3000 → height 4000 / (16/9) = 2250, 750 spare rows
        let rect = calculate_crop_rect((4000, 3000), AspectRatio::WIDESCREEN).unwrap();
        assert_eq!(
            rect,
            CropRect {
                x: 0,
                y: 375,
                width: 4000,
                height: 2250
            }
        );
    }

    #[test]
    fn widescreen_on_extreme_portrait_clamps_to_buffer() {
        // 100x1000 would need width 563, clamped to 100
        let rect = calculate_crop_rect((100, 1000), AspectRatio::WIDESCREEN).unwrap();
        assert_eq!(rect.width, 100);
        assert_eq!(rect.x, 0);
    }

    #[test]
    fn widescreen_on_extreme_landscape_keeps_at_least_one_row() {
        let rect = calculate_crop_rect((2, 1), AspectRatio::WIDESCREEN).unwrap();
        assert_eq!(rect.height, 1);
        assert_eq!(rect.y, 0);
    }
}
