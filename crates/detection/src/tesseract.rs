//! Tesseract text recognizer
//!
//! A fresh Tesseract instance is created per call, so the recognizer itself
//! only holds configuration and can move freely between threads.

use crate::{DetectionError, Result, TextRecognizer};
use fonttik_common::{Rect, TextRecognitionParams};
use image::{imageops, RgbImage};
use leptess::{LepTess, Variable};
use tracing::trace;

pub struct TesseractRecognizer {
    params: TextRecognitionParams,
}

impl TesseractRecognizer {
    /// Create a recognizer, verifying that the language data is installed
    ///
    /// # Errors
    /// Returns `ModelLoad` if Tesseract cannot initialize the language.
    pub fn new(params: TextRecognitionParams) -> Result<Self> {
        LepTess::new(None, &params.language).map_err(|e| {
            DetectionError::ModelLoad(format!(
                "Failed to initialize Tesseract with language '{}': {}",
                params.language, e
            ))
        })?;
        Ok(Self { params })
    }
}

impl TextRecognizer for TesseractRecognizer {
    fn name(&self) -> &'static str {
        "tesseract"
    }

    #[allow(clippy::cast_sign_loss)]
    fn recognize(&mut self, frame: &RgbImage, rect: Rect) -> Result<String> {
        let rect = rect.clamp_to(frame.width(), frame.height());
        if rect.is_empty() {
            return Ok(String::new());
        }

        let crop = imageops::crop_imm(
            frame,
            rect.x as u32,
            rect.y as u32,
            rect.width as u32,
            rect.height as u32,
        )
        .to_image();

        let mut lt = LepTess::new(None, &self.params.language)
            .map_err(|e| DetectionError::Recognition(format!("Tesseract init: {e}")))?;
        lt.set_variable(
            Variable::TesseditPagesegMode,
            &self.params.page_segmentation_mode.to_string(),
        )
        .map_err(|e| DetectionError::Recognition(format!("Failed to set PSM: {e}")))?;

        // leptess decodes from an encoded buffer
        let mut png = std::io::Cursor::new(Vec::new());
        crop.write_to(&mut png, image::ImageFormat::Png)
            .map_err(|e| DetectionError::Recognition(format!("PNG encoding failed: {e}")))?;
        lt.set_image_from_mem(png.get_ref())
            .map_err(|e| DetectionError::Recognition(format!("Failed to set image: {e}")))?;

        let text = lt.get_utf8_text().unwrap_or_default().trim().to_string();
        trace!("Recognized {:?} at {:?}", text, rect);
        Ok(text)
    }
}
