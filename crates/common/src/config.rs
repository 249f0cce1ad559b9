//! Configuration snapshot shared read-only by every checker
//!
//! The configuration document is a JSON object with independent sections:
//! `guideline`, `textDetection`, `textRecognition`, `colorblindness`,
//! `appSettings` and `outlineColors`. Each section is deserialized on its own;
//! a malformed section logs a warning and falls back to its defaults without
//! affecting the others.

use crate::{ProcessingError, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Minimum text height for one target resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SizeGuideline {
    /// Minimum legal text height in pixels
    pub height: u32,
    /// Heights at or above this tier (but below `height`) are only warned about
    #[serde(default)]
    pub warning_height: Option<u32>,
}

impl SizeGuideline {
    #[must_use]
    pub const fn new(height: u32) -> Self {
        Self {
            height,
            warning_height: None,
        }
    }
}

/// Size and contrast thresholds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Guideline {
    /// Minimum contrast ratio between text and background
    pub contrast_ratio: f64,
    /// Size guidelines keyed by vertical resolution (720, 1080, ...)
    pub resolutions: BTreeMap<u32, SizeGuideline>,
    /// Maximum distance in pixels between a frame height and a table entry
    pub resolution_leeway: u32,
    /// Force a table entry instead of matching the frame height
    pub target_resolution: Option<u32>,
    /// Match the frame height against the table when no target is configured
    pub detect_resolution: bool,
}

impl Default for Guideline {
    fn default() -> Self {
        let resolutions = BTreeMap::from([
            (720, SizeGuideline::new(19)),
            (800, SizeGuideline::new(19)), // Steam Deck 1280x800
            (1080, SizeGuideline::new(28)),
            (1440, SizeGuideline::new(37)),
            (2160, SizeGuideline::new(56)),
        ]);
        Self {
            contrast_ratio: 4.5,
            resolutions,
            resolution_leeway: 100,
            target_resolution: None,
            detect_resolution: true,
        }
    }
}

/// Guideline values selected for one media item
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ActiveGuideline {
    pub resolution: u32,
    pub size: SizeGuideline,
    pub contrast_ratio: f64,
}

impl Guideline {
    /// Select the size guideline for a frame of the given dimensions.
    ///
    /// A configured target resolution wins; otherwise the nearest table entry
    /// within the leeway is used.
    ///
    /// # Errors
    /// Returns `UnresolvedResolution` when no entry applies.
    pub fn resolve(&self, width: u32, height: u32) -> Result<ActiveGuideline> {
        let unresolved = || ProcessingError::UnresolvedResolution { width, height };

        let (resolution, size) = if let Some(target) = self.target_resolution {
            let size = self.resolutions.get(&target).ok_or_else(unresolved)?;
            (target, *size)
        } else if self.detect_resolution {
            self.resolutions
                .iter()
                .map(|(res, size)| (res.abs_diff(height), *res, *size))
                .filter(|(distance, _, _)| *distance <= self.resolution_leeway)
                .min_by_key(|(distance, _, _)| *distance)
                .map(|(_, res, size)| (res, size))
                .ok_or_else(unresolved)?
        } else {
            return Err(unresolved());
        };

        debug!(
            "Resolved guideline {}p (min height {}px) for {}x{}",
            resolution, size.height, width, height
        );

        Ok(ActiveGuideline {
            resolution,
            size,
            contrast_ratio: self.contrast_ratio,
        })
    }
}

/// Available text detector implementations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DetectorKind {
    /// Classical binarization + connected components (no model files)
    #[default]
    Contour,
    /// DB text detection network via ONNX Runtime (`onnx` feature)
    Db,
}

/// Per-axis overlap fraction required to merge two boxes
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MergeThreshold {
    pub x: f64,
    pub y: f64,
}

/// Text detection parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TextDetectionParams {
    pub detector: DetectorKind,
    /// Model file for network based detectors
    pub model_path: Option<PathBuf>,
    /// Minimum box score for network based detectors
    pub confidence: f32,
    /// Longest side the frame is resized to before network inference
    pub detection_size: u32,
    pub merge_threshold: MergeThreshold,
    /// Boxes whose first edge is steeper than this are discarded
    pub rotation_threshold_degrees: f64,
    /// Also build line-level boxes and run the size check on them
    pub group_by_line: bool,
    /// Vertical centre distance (fraction of line height) to join a line
    pub line_height_ratio: f64,
    /// Maximum horizontal gap in pixels between a line and the next word
    pub line_gap: i32,
    /// Words whose tops differ by less than this sort as the same row
    pub line_sort_tolerance: i32,
    /// Horizontal gaps up to this width join glyphs into one word (contour detector)
    pub max_horizontal_gap: u32,
    /// Components shorter than this are treated as noise (contour detector)
    pub min_box_height: u32,
    /// Padding added around each box, as a fraction of its height
    pub box_padding_ratio: f32,
    pub min_box_padding: u32,
}

impl Default for TextDetectionParams {
    fn default() -> Self {
        Self {
            detector: DetectorKind::Contour,
            model_path: None,
            confidence: 0.5,
            detection_size: 960,
            merge_threshold: MergeThreshold { x: 0.2, y: 0.2 },
            rotation_threshold_degrees: 10.0,
            group_by_line: true,
            line_height_ratio: 0.5,
            line_gap: 20,
            line_sort_tolerance: 8,
            max_horizontal_gap: 6,
            min_box_height: 6,
            box_padding_ratio: 0.25,
            min_box_padding: 3,
        }
    }
}

/// Text recognition parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TextRecognitionParams {
    pub enabled: bool,
    /// Tesseract language codes (e.g., "eng", "eng+fra")
    pub language: String,
    /// Tesseract page segmentation mode (7 = single text line)
    pub page_segmentation_mode: u32,
}

impl Default for TextRecognitionParams {
    fn default() -> Self {
        Self {
            enabled: false,
            language: "eng".to_string(),
            page_segmentation_mode: 7,
        }
    }
}

pub type Matrix3 = [[f64; 3]; 3];

/// Colour vision deficiency simulation constants (linear RGB / LMS space)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ColorblindParams {
    pub enabled: bool,
    pub rgb_to_lms: Matrix3,
    pub protanopia: Matrix3,
    pub deuteranopia: Matrix3,
    /// Tritanopia projection for pixels with M/L at or above the neutral ratio
    pub tritanopia_high: Matrix3,
    /// Tritanopia projection for pixels with M/L below the neutral ratio
    pub tritanopia_low: Matrix3,
}

impl Default for ColorblindParams {
    fn default() -> Self {
        Self {
            enabled: false,
            rgb_to_lms: [
                [17.8824, 43.5161, 4.11935],
                [3.45565, 27.1554, 3.86714],
                [0.029_956_6, 0.184_309, 1.46709],
            ],
            protanopia: [[0.0, 2.02344, -2.52581], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]],
            deuteranopia: [[1.0, 0.0, 0.0], [0.494_207, 0.0, 1.24827], [0.0, 0.0, 1.0]],
            tritanopia_high: [
                [1.0, 0.0, 0.0],
                [0.0, 1.0, 0.0],
                [-0.060_112_7, 0.162_996_2, 0.0],
            ],
            tritanopia_low: [
                [1.0, 0.0, 0.0],
                [0.0, 1.0, 0.0],
                [-0.002_519_1, 0.053_552_7, 0.0],
            ],
        }
    }
}

/// Rectangle in normalized frame coordinates (0.0-1.0)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NormalizedRegion {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// Application level settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AppSettings {
    /// When non-empty, only pixels inside these regions are analysed
    pub focus_regions: Vec<NormalizedRegion>,
    /// Pixels inside these regions are never analysed
    pub ignore_regions: Vec<NormalizedRegion>,
    /// Report failures as warnings
    pub fails_as_warnings: bool,
    /// Background outline radius around glyphs for contrast sampling
    pub background_radius: u32,
    pub save_json: bool,
    pub save_outlines: bool,
    /// Render annotated video concurrently with analysis
    pub async_video_save: bool,
    /// Root directory for result artifacts (defaults next to the input)
    pub output_dir: Option<PathBuf>,
    /// Worker threads for batch processing (0 = one per core)
    pub worker_threads: usize,
    /// Analyse every Nth video frame
    pub frame_step: u32,
    /// Mean absolute pixel difference (0.0-1.0) below which a frame is a duplicate
    pub frame_dedup_threshold: f64,
    /// Capacity of the analysis -> rendering queue
    pub queue_capacity: usize,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            focus_regions: Vec::new(),
            ignore_regions: Vec::new(),
            fails_as_warnings: false,
            background_radius: 5,
            save_json: true,
            save_outlines: true,
            async_video_save: true,
            output_dir: None,
            worker_threads: 0,
            frame_step: 1,
            frame_dedup_threshold: 0.005,
            queue_capacity: 10,
        }
    }
}

/// Outline colours (RGB) used when rendering annotated results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct OutlineColors {
    pub pass: [u8; 3],
    pub fail: [u8; 3],
    pub warning: [u8; 3],
    pub unrecognized: [u8; 3],
    pub thickness: u32,
}

impl Default for OutlineColors {
    fn default() -> Self {
        Self {
            pass: [0, 200, 0],
            fail: [220, 0, 0],
            warning: [255, 170, 0],
            unrecognized: [128, 128, 128],
            thickness: 2,
        }
    }
}

/// Complete configuration snapshot
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Configuration {
    pub guideline: Guideline,
    pub text_detection: TextDetectionParams,
    pub text_recognition: TextRecognitionParams,
    pub colorblindness: ColorblindParams,
    pub app_settings: AppSettings,
    pub outline_colors: OutlineColors,
}

impl Configuration {
    /// Load a configuration file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read. Malformed content never
    /// fails; affected sections use their defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        Ok(Self::from_json_str(&contents))
    }

    /// Parse a configuration document, isolating failures per section
    #[must_use]
    pub fn from_json_str(contents: &str) -> Self {
        let document: serde_json::Value = match serde_json::from_str(contents) {
            Ok(value) => value,
            Err(e) => {
                warn!("Configuration is not valid JSON, using defaults: {}", e);
                return Self::default();
            }
        };

        Self {
            guideline: load_section(&document, "guideline"),
            text_detection: load_section(&document, "textDetection"),
            text_recognition: load_section(&document, "textRecognition"),
            colorblindness: load_section(&document, "colorblindness"),
            app_settings: load_section(&document, "appSettings"),
            outline_colors: load_section(&document, "outlineColors"),
        }
    }
}

fn load_section<T>(document: &serde_json::Value, key: &str) -> T
where
    T: DeserializeOwned + Default,
{
    match document.get(key) {
        Some(value) => serde_json::from_value(value.clone()).unwrap_or_else(|e| {
            warn!("Invalid '{}' configuration section, using defaults: {}", key, e);
            T::default()
        }),
        None => {
            debug!("No '{}' configuration section, using defaults", key);
            T::default()
        }
    }
}
