//! Focus and ignore masks built from normalized regions

use fonttik_common::{AppSettings, NormalizedRegion, Rect};
use image::{GrayImage, Luma, RgbImage};

const ANALYSED: u8 = 255;

/// Pixel rectangle covered by a normalized region
#[must_use]
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss,
    clippy::cast_sign_loss
)]
pub fn region_to_rect(region: &NormalizedRegion, width: u32, height: u32) -> Rect {
    let (w, h) = (width as f32, height as f32);
    let x = (region.x * w).floor() as i32;
    let y = (region.y * h).floor() as i32;
    let right = ((region.x + region.width) * w).ceil() as i32;
    let bottom = ((region.y + region.height) * h).ceil() as i32;
    Rect::new(x, y, right - x, bottom - y).clamp_to(width, height)
}

fn fill(mask: &mut GrayImage, rect: Rect, value: u8) {
    #[allow(clippy::cast_sign_loss)]
    for y in rect.y as u32..rect.bottom() as u32 {
        for x in rect.x as u32..rect.right() as u32 {
            mask.put_pixel(x, y, Luma([value]));
        }
    }
}

/// Analysis mask for a frame size, `None` when no regions are configured.
///
/// With focus regions only their area is analysed; ignore regions are then
/// cut out of whatever remains.
#[must_use]
pub fn build_mask(settings: &AppSettings, width: u32, height: u32) -> Option<GrayImage> {
    if settings.focus_regions.is_empty() && settings.ignore_regions.is_empty() {
        return None;
    }

    let mut mask = if settings.focus_regions.is_empty() {
        GrayImage::from_pixel(width, height, Luma([ANALYSED]))
    } else {
        let mut mask = GrayImage::new(width, height);
        for region in &settings.focus_regions {
            fill(&mut mask, region_to_rect(region, width, height), ANALYSED);
        }
        mask
    };
    for region in &settings.ignore_regions {
        fill(&mut mask, region_to_rect(region, width, height), 0);
    }
    Some(mask)
}

/// Copy of `image` with every pixel outside the mask set to black
#[must_use]
pub fn apply_mask(image: &RgbImage, mask: &GrayImage) -> RgbImage {
    let mut masked = image.clone();
    for (x, y, pixel) in masked.enumerate_pixels_mut() {
        let keep = mask.get_pixel_checked(x, y).is_some_and(|m| m.0[0] > 0);
        if !keep {
            pixel.0 = [0, 0, 0];
        }
    }
    masked
}
