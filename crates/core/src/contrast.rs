//! Text/background contrast check, including simulated colour vision variants

use fonttik_common::{ActiveGuideline, ColorblindResult, ColorblindType, ResultBox, ResultType};
use fonttik_textbox::{contrast_between_regions, TextBox};
use image::{GrayImage, Luma, RgbImage};
use imageproc::distance_transform::Norm;
use imageproc::morphology::dilate;
use ndarray::Array2;
use tracing::debug;

/// Background ring around the glyphs of `mask`.
///
/// Pixels within `radius` of a glyph (chessboard distance) that are not
/// within one pixel of it.
#[must_use]
pub fn background_outline(mask: &GrayImage, radius: u32) -> GrayImage {
    let radius = u8::try_from(radius).unwrap_or(u8::MAX);
    let outer = dilate(mask, Norm::LInf, radius);
    let inner = dilate(mask, Norm::LInf, 1);
    GrayImage::from_fn(mask.width(), mask.height(), |x, y| {
        if outer.get_pixel(x, y).0[0] > 0 && inner.get_pixel(x, y).0[0] == 0 {
            Luma([255])
        } else {
            Luma([0])
        }
    })
}

/// Checks text against its surrounding background
#[derive(Debug, Clone, Copy)]
pub struct ContrastChecker {
    min_ratio: f64,
    background_radius: u32,
    fails_as_warnings: bool,
}

impl ContrastChecker {
    #[must_use]
    pub fn new(guideline: &ActiveGuideline, background_radius: u32, fails_as_warnings: bool) -> Self {
        Self {
            min_ratio: guideline.contrast_ratio,
            background_radius,
            fails_as_warnings,
        }
    }

    fn classify(&self, ratio: f64) -> ResultType {
        if ratio >= self.min_ratio {
            ResultType::Pass
        } else if self.fails_as_warnings {
            ResultType::Warning
        } else {
            ResultType::Fail
        }
    }

    /// Ratio and verdict for one luminance source over fixed text/background masks
    fn measure(&self, luminance: &Array2<f64>, text: &GrayImage, background: &GrayImage) -> (f64, ResultType) {
        match contrast_between_regions(luminance, text, background) {
            Some(ratio) => (ratio, self.classify(ratio)),
            None => (0.0, ResultType::Unrecognized),
        }
    }

    /// Check every box. Boxes must have their luminance and text mask computed.
    ///
    /// `variants` are simulated renderings of the same frame; each is measured
    /// over the masks found on the original frame.
    #[must_use]
    pub fn check_boxes(
        &self,
        boxes: &[TextBox],
        variants: &[(ColorblindType, RgbImage)],
    ) -> Vec<ResultBox> {
        boxes
            .iter()
            .map(|textbox| self.check(textbox, variants))
            .collect()
    }

    #[must_use]
    pub fn check(&self, textbox: &TextBox, variants: &[(ColorblindType, RgbImage)]) -> ResultBox {
        let (Some(luminance), Some(mask)) = (textbox.luminance(), textbox.mask()) else {
            return ResultBox::new(ResultType::Unrecognized, textbox.rect(), 0.0);
        };
        let background = background_outline(mask, self.background_radius);

        let (ratio, result_type) = self.measure(luminance, mask, &background);
        debug!(
            "Contrast {:.1} (min {:.1}) at {:?}: {}",
            ratio,
            self.min_ratio,
            textbox.rect(),
            result_type.as_str()
        );
        let mut result = ResultBox::new(result_type, textbox.rect(), ratio);

        for (kind, image) in variants {
            let (value, result_type) =
                self.measure(&textbox.luminance_in(image), mask, &background);
            result
                .colorblind
                .insert(*kind, ColorblindResult { value, result_type });
        }
        result
    }
}
