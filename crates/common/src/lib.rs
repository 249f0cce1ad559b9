/// Common types and utilities for accessibility checks on images and video
pub mod config;
pub mod geometry;
pub mod results;
pub mod srgb;

use thiserror::Error;

pub use config::{
    ActiveGuideline, AppSettings, ColorblindParams, Configuration, DetectorKind, Guideline,
    Matrix3, MergeThreshold, NormalizedRegion, OutlineColors, SizeGuideline, TextDetectionParams,
    TextRecognitionParams,
};
pub use geometry::{Point, Rect};
pub use results::{
    ColorblindResult, ColorblindType, ColorblindVerdict, FrameResults, ResultBox, ResultType,
    Results,
};

/// Processing errors
#[derive(Debug, Error)]
pub enum ProcessingError {
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("Corrupted file: {0}")]
    CorruptedFile(String),

    #[error("No video stream found")]
    NoVideoStream,

    #[error("No guideline matches resolution {width}x{height}")]
    UnresolvedResolution { width: u32, height: u32 },

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Text detection error: {0}")]
    Detection(String),

    #[error("Text recognition error: {0}")]
    Recognition(String),

    #[error("Luminance has not been computed for text box at {0:?}")]
    MissingLuminance(Rect),

    #[error("FFmpeg error: {0}")]
    FFmpegError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Image processing error: {0}")]
    ImageError(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Other error: {0}")]
    Other(String),
}

impl From<image::ImageError> for ProcessingError {
    fn from(err: image::ImageError) -> Self {
        ProcessingError::ImageError(err.to_string())
    }
}

/// Result type for processing operations
pub type Result<T> = std::result::Result<T, ProcessingError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = ProcessingError::UnresolvedResolution {
            width: 640,
            height: 480,
        };
        assert_eq!(err.to_string(), "No guideline matches resolution 640x480");

        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing.png");
        let err: ProcessingError = io.into();
        assert!(err.to_string().starts_with("IO error"));
    }
}
