//! Text detection and recognition backends
//!
//! Detectors report text regions as quadrilaterals; the provided trait methods
//! turn them into [`TextBox`]es, discarding tilted regions, and group words
//! into lines. Recognizers read the string inside a rectangle of the frame.
//!
//! | Backend | Trait | Feature |
//! |---------|-------|---------|
//! | [`ContourDetector`] | [`TextDetector`] | always available |
//! | `DbDetector` | [`TextDetector`] | `onnx` |
//! | `TesseractRecognizer` | [`TextRecognizer`] | `tesseract` |
//!
//! Backends are selected from configuration by [`create_detector`] and
//! [`create_recognizer`].

pub mod contour;
#[cfg(feature = "onnx")]
pub mod db;
pub mod factory;
pub mod quad;
#[cfg(feature = "tesseract")]
pub mod tesseract;

use fonttik_common::{ProcessingError, Rect, TextDetectionParams};
use fonttik_textbox::{group_lines, LineGrouping, TextBox};
use image::RgbImage;
use thiserror::Error;
use tracing::debug;

pub use contour::ContourDetector;
#[cfg(feature = "onnx")]
pub use db::DbDetector;
pub use factory::{create_detector, create_recognizer};
pub use quad::Quad;
#[cfg(feature = "tesseract")]
pub use tesseract::TesseractRecognizer;

/// Errors raised by detection and recognition backends
#[derive(Error, Debug)]
pub enum DetectionError {
    #[error("Failed to load detection model: {0}")]
    ModelLoad(String),

    #[error("Detection inference failed: {0}")]
    Inference(String),

    #[error("Text recognition failed: {0}")]
    Recognition(String),

    #[error("Invalid image: {0}")]
    InvalidImage(String),

    #[error("Backend '{0}' is not available in this build (enable the '{1}' feature)")]
    Unavailable(&'static str, &'static str),

    #[error("Processing error: {0}")]
    Processing(#[from] ProcessingError),
}

impl From<DetectionError> for ProcessingError {
    fn from(err: DetectionError) -> Self {
        match err {
            DetectionError::Processing(inner) => inner,
            DetectionError::Recognition(message) => ProcessingError::Recognition(message),
            other => ProcessingError::Detection(other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, DetectionError>;

/// Word boxes and the lines built from them
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LinesAndWords {
    pub lines: Vec<TextBox>,
    pub words: Vec<TextBox>,
}

/// A text detection backend
pub trait TextDetector: Send {
    /// Short backend name used in logs
    fn name(&self) -> &'static str;

    fn params(&self) -> &TextDetectionParams;

    /// Raw text regions found in the frame
    ///
    /// # Errors
    /// Returns an error if the backend fails on this frame.
    fn detect_regions(&mut self, frame: &RgbImage) -> Result<Vec<Quad>>;

    /// Text boxes for every region that is not tilted beyond the configured
    /// rotation threshold
    ///
    /// # Errors
    /// Propagates backend failures.
    fn detect_boxes(&mut self, frame: &RgbImage) -> Result<Vec<TextBox>> {
        let regions = self.detect_regions(frame)?;
        let limit = self.params().rotation_threshold_degrees;
        let total = regions.len();

        let boxes: Vec<TextBox> = regions
            .iter()
            .filter(|quad| quad.tilt_degrees() <= limit)
            .map(|quad| TextBox::from_points(&quad.points, frame.width(), frame.height()))
            .filter(|text_box| !text_box.rect().is_empty())
            .collect();

        debug!(
            "{}: {} regions, {} kept after tilt filter",
            self.name(),
            total,
            boxes.len()
        );
        Ok(boxes)
    }

    /// Word boxes plus the lines formed by grouping them
    ///
    /// # Errors
    /// Propagates backend failures.
    fn detect_lines_and_words(&mut self, frame: &RgbImage) -> Result<LinesAndWords> {
        let words = self.detect_boxes(frame)?;
        let lines = group_lines(&words, LineGrouping::from_params(self.params()));
        Ok(LinesAndWords { lines, words })
    }
}

/// A text recognition backend
pub trait TextRecognizer: Send {
    fn name(&self) -> &'static str;

    /// Recognize the text inside `rect` (frame coordinates).
    ///
    /// An empty string means nothing could be read.
    ///
    /// # Errors
    /// Returns an error if the backend fails.
    fn recognize(&mut self, frame: &RgbImage, rect: Rect) -> Result<String>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use fonttik_common::Point;

    struct FixedDetector {
        params: TextDetectionParams,
        regions: Vec<Quad>,
    }

    impl TextDetector for FixedDetector {
        fn name(&self) -> &'static str {
            "fixed"
        }

        fn params(&self) -> &TextDetectionParams {
            &self.params
        }

        fn detect_regions(&mut self, _frame: &RgbImage) -> Result<Vec<Quad>> {
            Ok(self.regions.clone())
        }
    }

    #[test]
    fn test_tilted_regions_are_dropped() {
        let level = Quad::from_rect(Rect::new(10, 10, 100, 20), 1.0);
        let tilted = Quad::new(
            [
                Point::new(10.0, 50.0),
                Point::new(110.0, 80.0),
                Point::new(105.0, 100.0),
                Point::new(5.0, 70.0),
            ],
            1.0,
        );
        let mut detector = FixedDetector {
            params: TextDetectionParams::default(),
            regions: vec![level, tilted],
        };

        let frame = RgbImage::new(200, 200);
        let boxes = detector.detect_boxes(&frame).unwrap();
        assert_eq!(boxes.len(), 1);
        assert_eq!(boxes[0].rect(), Rect::new(10, 10, 100, 20));
    }

    #[test]
    fn test_regions_outside_frame_are_dropped() {
        let mut detector = FixedDetector {
            params: TextDetectionParams::default(),
            regions: vec![Quad::from_rect(Rect::new(300, 300, 10, 10), 1.0)],
        };
        let frame = RgbImage::new(200, 200);
        assert!(detector.detect_boxes(&frame).unwrap().is_empty());
    }

    #[test]
    fn test_lines_and_words() {
        let mut detector = FixedDetector {
            params: TextDetectionParams::default(),
            regions: vec![
                Quad::from_rect(Rect::new(10, 10, 50, 20), 1.0),
                Quad::from_rect(Rect::new(70, 11, 50, 20), 1.0),
                Quad::from_rect(Rect::new(10, 60, 50, 20), 1.0),
            ],
        };
        let frame = RgbImage::new(200, 200);
        let result = detector.detect_lines_and_words(&frame).unwrap();
        assert_eq!(result.words.len(), 3);
        assert_eq!(result.lines.len(), 2);
        assert_eq!(result.lines[0].rect(), Rect::new(10, 10, 110, 21));
    }

    #[test]
    fn test_error_conversion() {
        let err: ProcessingError = DetectionError::Inference("bad tensor".into()).into();
        assert!(matches!(err, ProcessingError::Detection(_)));

        let err: ProcessingError = DetectionError::Recognition("no data".into()).into();
        assert!(matches!(err, ProcessingError::Recognition(_)));
    }
}
