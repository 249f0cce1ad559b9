//! Relative luminance maps and the WCAG contrast ratio

use fonttik_common::srgb::relative_luminance;
use fonttik_common::Rect;
use image::{GrayImage, RgbImage};
use ndarray::Array2;

/// Offset added to both luminances in the contrast formula
const FLARE: f64 = 0.05;

/// Relative luminance of every pixel of `rect` (clamped to the image).
///
/// The result is indexed `[[row, column]]`. Values are computed in single
/// precision and widened, which keeps `1 - (1 - x)` exact in the map.
#[must_use]
#[allow(clippy::cast_sign_loss)]
pub fn luminance_map(image: &RgbImage, rect: Rect) -> Array2<f64> {
    let rect = rect.clamp_to(image.width(), image.height());
    Array2::from_shape_fn(
        (rect.height as usize, rect.width as usize),
        |(row, col)| {
            let pixel = image.get_pixel(rect.x as u32 + col as u32, rect.y as u32 + row as u32);
            f64::from(relative_luminance(pixel.0))
        },
    )
}

/// Replace every value `x` inside `region` with `1 - x`
#[allow(clippy::cast_sign_loss)]
pub fn flip_region(luminance: &mut Array2<f64>, region: Rect) {
    let (rows, cols) = luminance.dim();
    #[allow(clippy::cast_possible_truncation)]
    let region = region.clamp_to(cols as u32, rows as u32);
    if region.is_empty() {
        return;
    }
    let mut view = luminance.slice_mut(ndarray::s![
        region.y as usize..region.bottom() as usize,
        region.x as usize..region.right() as usize
    ]);
    view.mapv_inplace(|x| 1.0 - x);
}

/// WCAG contrast ratio between two relative luminances (always >= 1)
#[must_use]
pub fn contrast_ratio(a: f64, b: f64) -> f64 {
    let (lighter, darker) = if a >= b { (a, b) } else { (b, a) };
    (lighter + FLARE) / (darker + FLARE)
}

/// Truncate a ratio to one decimal place
#[must_use]
pub fn truncate_ratio(ratio: f64) -> f64 {
    ((ratio * 10.0) + 1e-9).floor() / 10.0
}

/// Mean luminance over the non-zero pixels of `mask`, `None` if the mask is empty
#[must_use]
pub fn mean_over_mask(luminance: &Array2<f64>, mask: &GrayImage) -> Option<f64> {
    let mut sum = 0.0;
    let mut count = 0usize;
    for (x, y, pixel) in mask.enumerate_pixels() {
        if pixel.0[0] == 0 {
            continue;
        }
        if let Some(value) = luminance.get([y as usize, x as usize]) {
            sum += value;
            count += 1;
        }
    }
    #[allow(clippy::cast_precision_loss)]
    (count > 0).then(|| sum / count as f64)
}

/// Contrast ratio between the mean luminance of two masked regions,
/// truncated to one decimal place.
///
/// Returns `None` when either region has no pixels.
#[must_use]
pub fn contrast_between_regions(
    luminance: &Array2<f64>,
    region_a: &GrayImage,
    region_b: &GrayImage,
) -> Option<f64> {
    let a = mean_over_mask(luminance, region_a)?;
    let b = mean_over_mask(luminance, region_b)?;
    Some(truncate_ratio(contrast_ratio(a, b)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Luma, Rgb};

    fn half_split() -> (RgbImage, GrayImage, GrayImage) {
        let image = RgbImage::from_fn(20, 10, |x, _| {
            if x < 10 {
                Rgb([0, 0, 0])
            } else {
                Rgb([255, 255, 255])
            }
        });
        let left = GrayImage::from_fn(20, 10, |x, _| Luma([if x < 10 { 255 } else { 0 }]));
        let right = GrayImage::from_fn(20, 10, |x, _| Luma([if x < 10 { 0 } else { 255 }]));
        (image, left, right)
    }

    #[test]
    fn test_black_white_is_21() {
        let (image, left, right) = half_split();
        let lum = luminance_map(&image, Rect::new(0, 0, 20, 10));
        assert_eq!(contrast_between_regions(&lum, &left, &right), Some(21.0));
    }

    #[test]
    fn test_contrast_is_swap_invariant() {
        let (image, left, right) = half_split();
        let lum = luminance_map(&image, Rect::new(0, 0, 20, 10));
        assert_eq!(
            contrast_between_regions(&lum, &left, &right),
            contrast_between_regions(&lum, &right, &left)
        );
    }

    #[test]
    fn test_empty_region_has_no_contrast() {
        let (image, left, _) = half_split();
        let lum = luminance_map(&image, Rect::new(0, 0, 20, 10));
        let empty = GrayImage::new(20, 10);
        assert_eq!(contrast_between_regions(&lum, &left, &empty), None);
    }

    #[test]
    fn test_truncation_not_rounding() {
        assert_eq!(truncate_ratio(4.49), 4.4);
        assert_eq!(truncate_ratio(4.5), 4.5);
        assert_eq!(truncate_ratio(1.99999), 1.9);
    }

    #[test]
    fn test_luminance_map_clamps_rect() {
        let image = RgbImage::from_pixel(10, 10, Rgb([255, 255, 255]));
        let lum = luminance_map(&image, Rect::new(5, 5, 20, 20));
        assert_eq!(lum.dim(), (5, 5));
        assert!(lum.iter().all(|&v| v == 1.0));
    }

    #[test]
    fn test_flip_region_only_touches_region() {
        let image = RgbImage::from_pixel(4, 4, Rgb([0, 0, 0]));
        let mut lum = luminance_map(&image, Rect::new(0, 0, 4, 4));
        flip_region(&mut lum, Rect::new(1, 1, 2, 2));
        assert_eq!(lum[[0, 0]], 0.0);
        assert_eq!(lum[[1, 1]], 1.0);
        assert_eq!(lum[[2, 2]], 1.0);
        assert_eq!(lum[[3, 3]], 0.0);
    }
}
