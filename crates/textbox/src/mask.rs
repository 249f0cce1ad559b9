//! Binary glyph mask extraction
//!
//! The luminance of a text region is binarized with Otsu's threshold. Light
//! text on a dark background comes out as foreground directly; dark text on a
//! light background is detected by its border rows being mostly foreground
//! and inverted. Glyph bounding boxes are then clustered by alignment and the
//! largest cluster defines the refined text rectangle.

use fonttik_common::Rect;
use image::{GrayImage, Luma};
use imageproc::contours::{find_contours, BorderType, Contour};
use imageproc::contrast::otsu_level;
use ndarray::Array2;
use tracing::trace;

/// Fewer external contours than this make a polarity check necessary
const POLARITY_CONTOUR_LIMIT: usize = 5;
/// Glyph boxes smaller than this (px²) are treated as noise
const MIN_GLYPH_AREA: i64 = 20;
/// Edges within `max(extent) / ALIGNMENT_DIVISOR` count as aligned
const ALIGNMENT_DIVISOR: f64 = 3.5;

/// Glyph mask of a text region and the rectangle tightened around it
#[derive(Debug, Clone, PartialEq)]
pub struct TextMask {
    /// 0/255 mask with the dimensions of the region
    pub mask: GrayImage,
    /// Refined text rectangle, relative to the region
    pub text_rect: Rect,
}

/// Extract the glyph mask of a region from its luminance map
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn extract_text_mask(luminance: &Array2<f64>) -> TextMask {
    let (rows, cols) = luminance.dim();
    let whole = Rect::new(0, 0, cols as i32, rows as i32);
    if rows == 0 || cols == 0 {
        return TextMask {
            mask: GrayImage::new(cols as u32, rows as u32),
            text_rect: whole,
        };
    }

    let gray = GrayImage::from_fn(cols as u32, rows as u32, |x, y| {
        let value = luminance[[y as usize, x as usize]].clamp(0.0, 1.0);
        Luma([(value * 255.0).round() as u8])
    });
    let level = otsu_level(&gray);
    let mut mask = GrayImage::from_fn(gray.width(), gray.height(), |x, y| {
        Luma([if gray.get_pixel(x, y).0[0] > level { 255 } else { 0 }])
    });

    let mut glyphs = external_boxes(&mask);
    if glyphs.len() < POLARITY_CONTOUR_LIMIT && border_rows_are_foreground(&mask) {
        trace!("Inverting mask polarity ({} external contours)", glyphs.len());
        for pixel in mask.pixels_mut() {
            pixel.0[0] = 255 - pixel.0[0];
        }
        glyphs = external_boxes(&mask);
    }

    glyphs.retain(|rect| rect.area() >= MIN_GLYPH_AREA);
    let Some(text_rect) = largest_cluster(&glyphs) else {
        return TextMask {
            mask,
            text_rect: whole,
        };
    };

    for (x, y, pixel) in mask.enumerate_pixels_mut() {
        #[allow(clippy::cast_precision_loss)]
        if !text_rect.contains_point(x as f32, y as f32) {
            pixel.0[0] = 0;
        }
    }

    TextMask { mask, text_rect }
}

/// Bounding rectangles of the outermost contours
fn external_boxes(mask: &GrayImage) -> Vec<Rect> {
    let contours: Vec<Contour<u32>> = find_contours(mask);
    contours
        .iter()
        .filter(|c| c.border_type == BorderType::Outer && c.parent.is_none())
        .filter_map(|c| bounding_rect(c))
        .collect()
}

#[allow(clippy::cast_possible_wrap)]
fn bounding_rect(contour: &Contour<u32>) -> Option<Rect> {
    let min_x = contour.points.iter().map(|p| p.x).min()?;
    let max_x = contour.points.iter().map(|p| p.x).max()?;
    let min_y = contour.points.iter().map(|p| p.y).min()?;
    let max_y = contour.points.iter().map(|p| p.y).max()?;
    Some(Rect::new(
        min_x as i32,
        min_y as i32,
        (max_x - min_x + 1) as i32,
        (max_y - min_y + 1) as i32,
    ))
}

fn border_rows_are_foreground(mask: &GrayImage) -> bool {
    let row_is_foreground = |y: u32| {
        let lit = (0..mask.width())
            .filter(|&x| mask.get_pixel(x, y).0[0] > 0)
            .count();
        lit * 2 > mask.width() as usize
    };
    row_is_foreground(0) && row_is_foreground(mask.height() - 1)
}

fn aligned(a: i32, b: i32, tolerance: f64) -> bool {
    f64::from((a - b).abs()) <= tolerance
}

/// Two glyph boxes belong together when they share a row or a column edge
fn same_cluster(a: &Rect, b: &Rect) -> bool {
    let vertical = f64::from(a.height.max(b.height)) / ALIGNMENT_DIVISOR;
    let horizontal = f64::from(a.width.max(b.width)) / ALIGNMENT_DIVISOR;
    aligned(a.y, b.y, vertical)
        || aligned(a.bottom(), b.bottom(), vertical)
        || aligned(a.x, b.x, horizontal)
        || aligned(a.right(), b.right(), horizontal)
}

fn find_root(parents: &mut [usize], mut i: usize) -> usize {
    while parents[i] != i {
        parents[i] = parents[parents[i]];
        i = parents[i];
    }
    i
}

/// Bounding rectangle of the cluster with the most members
fn largest_cluster(glyphs: &[Rect]) -> Option<Rect> {
    let mut parents: Vec<usize> = (0..glyphs.len()).collect();
    for i in 0..glyphs.len() {
        for j in (i + 1)..glyphs.len() {
            if same_cluster(&glyphs[i], &glyphs[j]) {
                let (a, b) = (find_root(&mut parents, i), find_root(&mut parents, j));
                parents[b] = a;
            }
        }
    }

    let mut clusters: Vec<(usize, Rect)> = Vec::new();
    let mut slot_of_root = vec![usize::MAX; glyphs.len()];
    for (i, glyph) in glyphs.iter().enumerate() {
        let root = find_root(&mut parents, i);
        if slot_of_root[root] == usize::MAX {
            slot_of_root[root] = clusters.len();
            clusters.push((0, *glyph));
        }
        let (count, rect) = &mut clusters[slot_of_root[root]];
        *count += 1;
        *rect = rect.union(glyph);
    }

    // First cluster wins ties
    clusters
        .into_iter()
        .fold(None, |best: Option<(usize, Rect)>, candidate| match best {
            Some(current) if current.0 >= candidate.0 => Some(current),
            _ => Some(candidate),
        })
        .map(|(_, rect)| rect)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Luminance map with dark bars (value 0) on a light background (value 1)
    fn bars_on_background(width: usize, height: usize, bars: &[Rect], light_text: bool) -> Array2<f64> {
        let (text, background) = if light_text { (1.0, 0.0) } else { (0.0, 1.0) };
        let mut lum = Array2::from_elem((height, width), background);
        for bar in bars {
            for y in bar.y..bar.bottom() {
                for x in bar.x..bar.right() {
                    lum[[y as usize, x as usize]] = text;
                }
            }
        }
        lum
    }

    fn word(x: i32, y: i32, height: i32) -> Vec<Rect> {
        (0..5).map(|i| Rect::new(x + i * 12, y, 8, height)).collect()
    }

    #[test]
    fn test_dark_text_on_light_background_is_inverted() {
        let lum = bars_on_background(80, 40, &word(6, 8, 20), false);
        let result = extract_text_mask(&lum);

        assert_eq!(result.text_rect, Rect::new(6, 8, 56, 20));
        assert_eq!(result.mask.get_pixel(7, 10).0[0], 255);
        assert_eq!(result.mask.get_pixel(0, 0).0[0], 0);
    }

    #[test]
    fn test_light_text_on_dark_background() {
        let lum = bars_on_background(80, 40, &word(6, 8, 20), true);
        let result = extract_text_mask(&lum);

        assert_eq!(result.text_rect, Rect::new(6, 8, 56, 20));
        assert_eq!(result.mask.get_pixel(7, 10).0[0], 255);
    }

    #[test]
    fn test_noise_outside_cluster_is_removed() {
        let mut bars = word(6, 10, 20);
        // Small speck far from the word's rows and columns
        bars.push(Rect::new(75, 1, 2, 2));
        let lum = bars_on_background(80, 40, &bars, true);
        let result = extract_text_mask(&lum);

        assert_eq!(result.text_rect, Rect::new(6, 10, 56, 20));
        assert_eq!(result.mask.get_pixel(75, 1).0[0], 0);
    }

    #[test]
    fn test_uniform_region_keeps_whole_rect() {
        let lum = Array2::from_elem((10, 30), 0.5);
        let result = extract_text_mask(&lum);
        assert_eq!(result.text_rect, Rect::new(0, 0, 30, 10));
    }

    #[test]
    fn test_empty_region() {
        let lum = Array2::<f64>::zeros((0, 12));
        let result = extract_text_mask(&lum);
        assert_eq!(result.text_rect, Rect::new(0, 0, 12, 0));
        assert_eq!(result.mask.dimensions(), (12, 0));
    }

    #[test]
    fn test_clustering_by_shared_edges() {
        let a = Rect::new(0, 10, 8, 20);
        let b = Rect::new(20, 12, 8, 20);
        let stacked = Rect::new(1, 40, 8, 8);
        let far = Rect::new(50, 60, 8, 8);
        assert!(same_cluster(&a, &b));
        assert!(same_cluster(&a, &stacked));
        assert!(!same_cluster(&b, &far));
        assert_eq!(largest_cluster(&[a, b, far]), Some(Rect::new(0, 10, 28, 22)));
    }
}
