use crate::luminance::{flip_region, luminance_map};
use crate::mask::extract_text_mask;
use crate::merge::overlap_axis_percentage;
use fonttik_common::{Point, ProcessingError, Rect, Result};
use image::{GrayImage, RgbImage};
use ndarray::Array2;

/// A detected text region.
///
/// The region rectangle is in frame coordinates. Luminance and the glyph mask
/// are derived per frame pass and share the region's dimensions; the refined
/// text rectangle is stored relative to the region.
#[derive(Debug, Clone, PartialEq)]
pub struct TextBox {
    rect: Rect,
    text_rect: Rect,
    mask: Option<GrayImage>,
    luminance: Option<Array2<f64>>,
    text: Option<String>,
}

impl TextBox {
    pub(crate) fn with_rect(rect: Rect) -> Self {
        Self {
            rect,
            text_rect: Rect::new(0, 0, rect.width, rect.height),
            mask: None,
            luminance: None,
            text: None,
        }
    }

    /// Create a box enclosing detector corner points, clamped to the frame
    #[must_use]
    pub fn from_points(points: &[Point], frame_width: u32, frame_height: u32) -> Self {
        Self::from_rect(Rect::from_points(points), frame_width, frame_height)
    }

    #[must_use]
    pub fn from_rect(rect: Rect, frame_width: u32, frame_height: u32) -> Self {
        Self::with_rect(rect.clamp_to(frame_width, frame_height))
    }

    #[must_use]
    pub fn rect(&self) -> Rect {
        self.rect
    }

    /// Refined text rectangle relative to [`TextBox::rect`]
    #[must_use]
    pub fn text_rect(&self) -> Rect {
        self.text_rect
    }

    /// Refined text rectangle in frame coordinates
    #[must_use]
    pub fn text_rect_in_frame(&self) -> Rect {
        self.text_rect.offset(self.rect.x, self.rect.y)
    }

    #[must_use]
    pub fn mask(&self) -> Option<&GrayImage> {
        self.mask.as_ref()
    }

    #[must_use]
    pub fn luminance(&self) -> Option<&Array2<f64>> {
        self.luminance.as_ref()
    }

    #[must_use]
    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = Some(text.into());
    }

    /// Compute the relative luminance of the region from the frame
    pub fn calculate_luminance(&mut self, frame: &RgbImage) {
        self.luminance = Some(luminance_map(frame, self.rect));
    }

    /// Luminance of the same region in another image (e.g. a simulated
    /// colour vision variant of the frame). The box's own state is untouched.
    #[must_use]
    pub fn luminance_in(&self, image: &RgbImage) -> Array2<f64> {
        luminance_map(image, self.rect)
    }

    /// Extract the glyph mask and refine the text rectangle.
    ///
    /// # Errors
    /// Returns `MissingLuminance` if [`TextBox::calculate_luminance`] has not
    /// been called.
    pub fn calculate_text_mask(&mut self) -> Result<()> {
        let luminance = self
            .luminance
            .as_ref()
            .ok_or(ProcessingError::MissingLuminance(self.rect))?;
        let extracted = extract_text_mask(luminance);
        self.text_rect = extracted.text_rect;
        self.mask = Some(extracted.mask);
        Ok(())
    }

    /// Replace luminance `x` with `1 - x` inside `region` (relative coordinates)
    ///
    /// # Errors
    /// Returns `MissingLuminance` if luminance has not been computed.
    pub fn flip_luminance(&mut self, region: Rect) -> Result<()> {
        let luminance = self
            .luminance
            .as_mut()
            .ok_or(ProcessingError::MissingLuminance(self.rect))?;
        flip_region(luminance, region);
        Ok(())
    }

    /// Per-axis overlap with another box, see [`overlap_axis_percentage`]
    #[must_use]
    pub fn overlap_axis_percentage(&self, other: &TextBox) -> (f64, f64) {
        overlap_axis_percentage(&self.rect, &other.rect)
    }

    /// Grow this box to the union of both rectangles.
    ///
    /// Luminance, mask, refined rectangle and text are reset.
    pub fn merge_with(&mut self, other: &TextBox) {
        *self = Self::with_rect(self.rect.union(&other.rect));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn test_from_points_clamps_to_frame() {
        let points = [
            Point::new(-4.0, 2.0),
            Point::new(30.0, 2.0),
            Point::new(30.0, 50.0),
            Point::new(-4.0, 50.0),
        ];
        let text_box = TextBox::from_points(&points, 20, 40);
        assert_eq!(text_box.rect(), Rect::new(0, 2, 20, 38));
        assert_eq!(text_box.text_rect(), Rect::new(0, 0, 20, 38));
    }

    #[test]
    fn test_mask_requires_luminance() {
        let mut text_box = TextBox::from_rect(Rect::new(0, 0, 10, 10), 10, 10);
        assert!(matches!(
            text_box.calculate_text_mask(),
            Err(ProcessingError::MissingLuminance(_))
        ));
        assert!(text_box.flip_luminance(Rect::new(0, 0, 2, 2)).is_err());
    }

    #[test]
    fn test_mask_dimensions_match_box() {
        let frame = RgbImage::from_fn(60, 30, |x, _| {
            if (10..20).contains(&x) {
                Rgb([0, 0, 0])
            } else {
                Rgb([255, 255, 255])
            }
        });
        let mut text_box = TextBox::from_rect(Rect::new(5, 5, 30, 20), 60, 30);
        text_box.calculate_luminance(&frame);
        text_box.calculate_text_mask().unwrap();

        let mask = text_box.mask().unwrap();
        assert_eq!(mask.dimensions(), (30, 20));
        let refined = text_box.text_rect_in_frame();
        assert!(text_box.rect().contains_rect(&refined));
        assert_eq!(refined.x, 10);
        assert_eq!(refined.width, 10);
    }

    #[test]
    fn test_merge_resets_derived_state() {
        let frame = RgbImage::from_pixel(40, 40, Rgb([255, 255, 255]));
        let mut a = TextBox::from_rect(Rect::new(0, 0, 10, 10), 40, 40);
        a.calculate_luminance(&frame);
        a.set_text("hello");
        let b = TextBox::from_rect(Rect::new(5, 5, 10, 10), 40, 40);

        a.merge_with(&b);
        assert_eq!(a.rect(), Rect::new(0, 0, 15, 15));
        assert_eq!(a.text_rect(), Rect::new(0, 0, 15, 15));
        assert!(a.luminance().is_none());
        assert!(a.text().is_none());
    }
}
