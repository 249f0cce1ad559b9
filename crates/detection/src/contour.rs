//! Classical text detector: binarization and connected components
//!
//! The frame is binarized with Otsu's threshold and the minority class is taken
//! as ink. Short horizontal gaps between ink pixels are closed so the glyphs of
//! a word form one component; every 8-connected component tall enough to be
//! text becomes a padded box.

use crate::{Quad, Result, TextDetector};
use fonttik_common::{Rect, TextDetectionParams};
use image::{imageops, GrayImage, Luma, RgbImage};
use imageproc::contrast::otsu_level;
use imageproc::region_labelling::{connected_components, Connectivity};
use tracing::trace;

const INK: u8 = 255;

pub struct ContourDetector {
    params: TextDetectionParams,
}

impl ContourDetector {
    #[must_use]
    pub fn new(params: TextDetectionParams) -> Self {
        Self { params }
    }

    /// Binary ink mask of a frame
    fn ink_mask(gray: &GrayImage) -> GrayImage {
        let level = otsu_level(gray);
        let mut mask = GrayImage::from_fn(gray.width(), gray.height(), |x, y| {
            Luma([if gray.get_pixel(x, y).0[0] > level { INK } else { 0 }])
        });

        let ink = mask.pixels().filter(|p| p.0[0] == INK).count();
        let total = (mask.width() * mask.height()) as usize;
        if ink * 2 > total {
            for pixel in mask.pixels_mut() {
                pixel.0[0] = INK - pixel.0[0];
            }
        }
        mask
    }

    /// Fill background runs of at most `max_gap` pixels that have ink on both sides
    fn close_horizontal_gaps(mask: &mut GrayImage, max_gap: u32) {
        if max_gap == 0 {
            return;
        }
        for y in 0..mask.height() {
            let mut last_ink: Option<u32> = None;
            for x in 0..mask.width() {
                if mask.get_pixel(x, y).0[0] != INK {
                    continue;
                }
                if let Some(previous) = last_ink {
                    let gap = x - previous - 1;
                    if gap > 0 && gap <= max_gap {
                        for fill in (previous + 1)..x {
                            mask.put_pixel(fill, y, Luma([INK]));
                        }
                    }
                }
                last_ink = Some(x);
            }
        }
    }

    /// Bounding rectangles of the 8-connected ink components
    #[allow(clippy::cast_possible_wrap)]
    fn component_boxes(mask: &GrayImage) -> Vec<Rect> {
        let labels = connected_components(mask, Connectivity::Eight, Luma([0u8]));

        // (min_x, min_y, max_x, max_y) per label; label 0 is background
        let mut bounds: Vec<Option<(u32, u32, u32, u32)>> = Vec::new();
        for (x, y, label) in labels.enumerate_pixels() {
            let label = label.0[0] as usize;
            if label == 0 {
                continue;
            }
            if bounds.len() <= label {
                bounds.resize(label + 1, None);
            }
            bounds[label] = Some(match bounds[label] {
                Some((x0, y0, x1, y1)) => (x0.min(x), y0.min(y), x1.max(x), y1.max(y)),
                None => (x, y, x, y),
            });
        }

        bounds
            .into_iter()
            .flatten()
            .map(|(x0, y0, x1, y1)| {
                Rect::new(
                    x0 as i32,
                    y0 as i32,
                    (x1 - x0 + 1) as i32,
                    (y1 - y0 + 1) as i32,
                )
            })
            .collect()
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
    fn padding(&self, height: i32) -> i32 {
        let relative = (self.params.box_padding_ratio * height as f32).round() as i32;
        relative.max(self.params.min_box_padding as i32)
    }
}

impl TextDetector for ContourDetector {
    fn name(&self) -> &'static str {
        "contour"
    }

    fn params(&self) -> &TextDetectionParams {
        &self.params
    }

    #[allow(clippy::cast_possible_wrap)]
    fn detect_regions(&mut self, frame: &RgbImage) -> Result<Vec<Quad>> {
        let (width, height) = frame.dimensions();
        if width == 0 || height == 0 {
            return Ok(Vec::new());
        }

        let gray = imageops::grayscale(frame);
        let mut mask = Self::ink_mask(&gray);
        Self::close_horizontal_gaps(&mut mask, self.params.max_horizontal_gap);

        let components = Self::component_boxes(&mask);
        let total = components.len();
        let min_height = self.params.min_box_height as i32;

        let regions: Vec<Quad> = components
            .into_iter()
            // A component spanning the whole frame is background, not text
            .filter(|rect| rect.height >= min_height && rect.height < height as i32)
            .map(|rect| {
                let pad = self.padding(rect.height);
                Quad::from_rect(rect.inflate(pad, pad).clamp_to(width, height), 1.0)
            })
            .collect();

        trace!("{} components, {} text regions", total, regions.len());
        Ok(regions)
    }
}
