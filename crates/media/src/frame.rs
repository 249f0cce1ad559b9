use image::{GrayImage, RgbImage};
use std::borrow::Cow;
use std::sync::Arc;

/// One decoded frame of a media item
#[derive(Debug, Clone)]
pub struct Frame {
    /// Position in the source (0 for still images)
    pub index: i64,
    /// Presentation time in seconds (videos only)
    pub timestamp: Option<f64>,
    /// Frame as decoded, used for rendering annotated output
    pub image: RgbImage,
    /// Analysis mask (255 = analysed); `None` analyses every pixel
    pub mask: Option<Arc<GrayImage>>,
}

impl Frame {
    #[must_use]
    pub fn new(index: i64, timestamp: Option<f64>, image: RgbImage) -> Self {
        Self {
            index,
            timestamp,
            image,
            mask: None,
        }
    }

    #[must_use]
    pub fn with_mask(mut self, mask: Option<Arc<GrayImage>>) -> Self {
        self.mask = mask;
        self
    }

    #[must_use]
    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    /// The frame with masked-out pixels zeroed
    #[must_use]
    pub fn analysis_image(&self) -> Cow<'_, RgbImage> {
        match &self.mask {
            Some(mask) => Cow::Owned(crate::mask::apply_mask(&self.image, mask)),
            None => Cow::Borrowed(&self.image),
        }
    }
}
