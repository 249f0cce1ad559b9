//! Backend selection from configuration

use crate::{ContourDetector, Result, TextDetector, TextRecognizer};
use fonttik_common::{DetectorKind, TextDetectionParams, TextRecognitionParams};
use tracing::debug;

/// Build the configured text detector
///
/// # Errors
/// Returns `Unavailable` when the backend was not compiled in, or the
/// backend's own construction error.
pub fn create_detector(params: &TextDetectionParams) -> Result<Box<dyn TextDetector>> {
    debug!("Creating {:?} text detector", params.detector);
    match params.detector {
        DetectorKind::Contour => Ok(Box::new(ContourDetector::new(params.clone()))),
        #[cfg(feature = "onnx")]
        DetectorKind::Db => Ok(Box::new(crate::DbDetector::new(params.clone())?)),
        #[cfg(not(feature = "onnx"))]
        DetectorKind::Db => Err(crate::DetectionError::Unavailable("db", "onnx")),
    }
}

/// Build the configured text recognizer, `None` when recognition is disabled
///
/// # Errors
/// Returns `Unavailable` when recognition is enabled but no backend was
/// compiled in, or the backend's own construction error.
pub fn create_recognizer(
    params: &TextRecognitionParams,
) -> Result<Option<Box<dyn TextRecognizer>>> {
    if !params.enabled {
        return Ok(None);
    }
    #[cfg(feature = "tesseract")]
    {
        debug!("Creating tesseract recognizer ({})", params.language);
        Ok(Some(Box::new(crate::TesseractRecognizer::new(params.clone())?)))
    }
    #[cfg(not(feature = "tesseract"))]
    {
        Err(crate::DetectionError::Unavailable("tesseract", "tesseract"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_detector_is_contour() {
        let detector = create_detector(&TextDetectionParams::default()).unwrap();
        assert_eq!(detector.name(), "contour");
    }

    #[test]
    fn test_disabled_recognition() {
        let recognizer = create_recognizer(&TextRecognitionParams::default()).unwrap();
        assert!(recognizer.is_none());
    }

    #[cfg(not(feature = "onnx"))]
    #[test]
    fn test_db_requires_feature() {
        let params = TextDetectionParams {
            detector: DetectorKind::Db,
            ..Default::default()
        };
        assert!(matches!(
            create_detector(&params),
            Err(crate::DetectionError::Unavailable("db", "onnx"))
        ));
    }

    #[cfg(not(feature = "tesseract"))]
    #[test]
    fn test_recognition_requires_feature() {
        let params = TextRecognitionParams {
            enabled: true,
            ..Default::default()
        };
        assert!(create_recognizer(&params).is_err());
    }
}
