//! Text height check against the active size guideline

use fonttik_common::{ActiveGuideline, Rect, Result, ResultBox, ResultType, SizeGuideline};
use fonttik_detection::TextRecognizer;
use fonttik_textbox::TextBox;
use image::RgbImage;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

static ASCENDERS: Lazy<Regex> =
    Lazy::new(|| Regex::new("[A-Zbdfhijklt0-9]").expect("Invalid ascender regex"));
static DESCENDERS: Lazy<Regex> =
    Lazy::new(|| Regex::new("[gjpqy]").expect("Invalid descender regex"));

/// Whether the measured height spans the full glyph range of the text.
///
/// Only text with both an ascender and a descender is measured from the top
/// of its tallest glyph to the bottom of its lowest one.
#[must_use]
pub fn spans_full_height(text: &str) -> bool {
    ASCENDERS.is_match(text) && DESCENDERS.is_match(text)
}

/// Verdict for a measured height.
///
/// `text` is `None` when recognition is disabled, in which case every box
/// below the minimum is eligible to fail.
#[must_use]
pub fn classify_height(height: u32, size: SizeGuideline, text: Option<&str>) -> ResultType {
    if height >= size.height {
        return ResultType::Pass;
    }
    if size.warning_height.is_some_and(|tier| height >= tier) {
        return ResultType::Warning;
    }
    match text {
        None => ResultType::Fail,
        Some(text) if text.trim().is_empty() => ResultType::Unrecognized,
        Some(text) if spans_full_height(text) => ResultType::Fail,
        Some(_) => ResultType::Warning,
    }
}

/// Rectangle reported for a size verdict: the refined text rectangle with a
/// one pixel margin
#[must_use]
pub fn result_rect(textbox: &TextBox) -> Rect {
    let text = textbox.text_rect_in_frame();
    Rect::new(text.x - 1, text.y - 1, text.width + 2, text.height + 2)
}

/// Checks the height of every box against the guideline selected for a media item
#[derive(Debug, Clone, Copy)]
pub struct SizeChecker {
    size: SizeGuideline,
    fails_as_warnings: bool,
}

impl SizeChecker {
    #[must_use]
    pub fn new(guideline: &ActiveGuideline, fails_as_warnings: bool) -> Self {
        Self {
            size: guideline.size,
            fails_as_warnings,
        }
    }

    /// Check every box. Boxes must have their text mask computed.
    ///
    /// With a recognizer, each box's text is recognized once and cached on
    /// the box.
    ///
    /// # Errors
    /// Returns an error if recognition fails.
    pub fn check_boxes(
        &self,
        boxes: &mut [TextBox],
        frame: &RgbImage,
        mut recognizer: Option<&mut dyn TextRecognizer>,
    ) -> Result<Vec<ResultBox>> {
        let mut results = Vec::with_capacity(boxes.len());
        for textbox in boxes.iter_mut() {
            if let Some(recognizer) = recognizer.as_deref_mut() {
                if textbox.text().is_none() {
                    let text = recognizer.recognize(frame, textbox.rect())?;
                    textbox.set_text(text);
                }
            }
            results.push(self.check(textbox));
        }
        Ok(results)
    }

    /// Verdict for a single box, using its cached text if any
    #[must_use]
    pub fn check(&self, textbox: &TextBox) -> ResultBox {
        #[allow(clippy::cast_sign_loss)]
        let height = textbox.text_rect().height.max(0) as u32;
        let mut result_type = classify_height(height, self.size, textbox.text());
        if self.fails_as_warnings && result_type == ResultType::Fail {
            result_type = ResultType::Warning;
        }
        debug!(
            "Size {}px (min {}px) at {:?}: {}",
            height,
            self.size.height,
            textbox.rect(),
            result_type.as_str()
        );
        ResultBox::new(result_type, result_rect(textbox), f64::from(height))
            .with_text(textbox.text().unwrap_or_default())
    }
}
