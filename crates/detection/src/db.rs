//! DB (Differentiable Binarization) text detector running on ONNX Runtime
//!
//! The network outputs a per-pixel text probability map. Pixels above
//! `BINARIZE_THRESHOLD` are grouped into contours, each contour's box is
//! scored by the mean probability inside it, expanded ("unclipped") to cover
//! the full glyph extent and scaled back to frame coordinates.

use crate::{DetectionError, Quad, Result, TextDetector};
use fonttik_common::{Rect, TextDetectionParams};
use image::{imageops, GrayImage, Luma, RgbImage};
use imageproc::contours::{find_contours, BorderType};
use ndarray::{Array3, Array4, ArrayView2, Axis, Ix4};
use ort::{
    inputs,
    session::{builder::GraphOptimizationLevel, Session},
    value::TensorRef,
};
use std::path::Path;
use tracing::{debug, info};

/// ImageNet normalization used when the detector was trained
const MEAN: [f32; 3] = [0.485, 0.456, 0.406];
const STD: [f32; 3] = [0.229, 0.224, 0.225];

/// Probability above which a pixel belongs to a text kernel
const BINARIZE_THRESHOLD: f32 = 0.3;
/// Expansion of a kernel box: offset = area * ratio / perimeter
const UNCLIP_RATIO: f32 = 1.5;
/// Kernels with a shorter side than this are dropped
const MIN_KERNEL_SIDE: f32 = 3.0;
const MAX_CANDIDATES: usize = 1000;

pub struct DbDetector {
    session: Session,
    params: TextDetectionParams,
}

impl DbDetector {
    /// Load the detection network
    ///
    /// # Errors
    /// Returns `ModelLoad` if no model is configured or it cannot be loaded.
    pub fn new(params: TextDetectionParams) -> Result<Self> {
        let model = params
            .model_path
            .clone()
            .ok_or_else(|| DetectionError::ModelLoad("no modelPath configured".to_string()))?;
        Self::with_model(&model, params)
    }

    /// Load the detection network from an explicit path
    ///
    /// # Errors
    /// Returns `ModelLoad` if ONNX Runtime rejects the model.
    pub fn with_model(model: &Path, params: TextDetectionParams) -> Result<Self> {
        let session = Session::builder()
            .and_then(|b| b.with_optimization_level(GraphOptimizationLevel::Level1))
            .and_then(|b| b.commit_from_file(model))
            .map_err(|e| DetectionError::ModelLoad(format!("{}: {e}", model.display())))?;
        info!("Loaded DB text detector from {}", model.display());
        Ok(Self { session, params })
    }

    /// Resize so the longest side is at most `detection_size`, both sides a
    /// multiple of 32, and normalize to a (1, 3, H, W) tensor
    #[allow(
        clippy::cast_precision_loss,
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss
    )]
    fn preprocess(&self, frame: &RgbImage) -> Result<Array4<f32>> {
        let (width, height) = frame.dimensions();
        if width == 0 || height == 0 {
            return Err(DetectionError::InvalidImage(format!(
                "frame dimensions must be non-zero (got {width}x{height})"
            )));
        }
        let longest = width.max(height) as f32;
        let limit = self.params.detection_size as f32;
        let ratio = if longest > limit { limit / longest } else { 1.0 };

        let resize_w = (((width as f32 * ratio) / 32.0).round() as u32).max(1) * 32;
        let resize_h = (((height as f32 * ratio) / 32.0).round() as u32).max(1) * 32;

        let resized = imageops::resize(frame, resize_w, resize_h, imageops::FilterType::Triangle);
        let mut tensor = Array3::<f32>::zeros((3, resize_h as usize, resize_w as usize));
        for (x, y, pixel) in resized.enumerate_pixels() {
            for c in 0..3 {
                let value = f32::from(pixel.0[c]) / 255.0;
                tensor[[c, y as usize, x as usize]] = (value - MEAN[c]) / STD[c];
            }
        }
        Ok(tensor.insert_axis(Axis(0)))
    }

    /// Mean probability inside a box of the map
    #[allow(clippy::cast_sign_loss, clippy::cast_precision_loss)]
    fn box_score(map: &ArrayView2<f32>, rect: Rect) -> f32 {
        let (rows, cols) = map.dim();
        let mut sum = 0.0f32;
        let mut count = 0usize;
        for y in rect.y.max(0) as usize..(rect.bottom().max(0) as usize).min(rows) {
            for x in rect.x.max(0) as usize..(rect.right().max(0) as usize).min(cols) {
                sum += map[[y, x]];
                count += 1;
            }
        }
        if count == 0 {
            0.0
        } else {
            sum / count as f32
        }
    }

    #[allow(
        clippy::cast_precision_loss,
        clippy::cast_possible_truncation,
        clippy::cast_possible_wrap
    )]
    fn postprocess(&self, map: ArrayView2<f32>, frame_width: u32, frame_height: u32) -> Vec<Quad> {
        let (rows, cols) = map.dim();
        let mask = GrayImage::from_fn(cols as u32, rows as u32, |x, y| {
            Luma([if map[[y as usize, x as usize]] > BINARIZE_THRESHOLD {
                255
            } else {
                0
            }])
        });

        let scale_x = frame_width as f32 / cols as f32;
        let scale_y = frame_height as f32 / rows as f32;

        let mut quads = Vec::new();
        for contour in find_contours::<u32>(&mask).iter().take(MAX_CANDIDATES) {
            if contour.border_type != BorderType::Outer || contour.points.is_empty() {
                continue;
            }
            let xs = contour.points.iter().map(|p| p.x);
            let ys = contour.points.iter().map(|p| p.y);
            let (Some(min_x), Some(max_x)) = (xs.clone().min(), xs.max()) else {
                continue;
            };
            let (Some(min_y), Some(max_y)) = (ys.clone().min(), ys.max()) else {
                continue;
            };
            let kernel = Rect::new(
                min_x as i32,
                min_y as i32,
                (max_x - min_x + 1) as i32,
                (max_y - min_y + 1) as i32,
            );
            if (kernel.width.min(kernel.height) as f32) < MIN_KERNEL_SIDE {
                continue;
            }

            let score = Self::box_score(&map, kernel);
            if score < self.params.confidence {
                continue;
            }

            let (w, h) = (kernel.width as f32, kernel.height as f32);
            let offset = (w * h * UNCLIP_RATIO / (2.0 * (w + h))).round() as i32;
            let expanded = kernel.inflate(offset, offset);

            let scaled = Rect::new(
                (expanded.x as f32 * scale_x).floor() as i32,
                (expanded.y as f32 * scale_y).floor() as i32,
                (expanded.width as f32 * scale_x).ceil() as i32,
                (expanded.height as f32 * scale_y).ceil() as i32,
            )
            .clamp_to(frame_width, frame_height);
            if !scaled.is_empty() {
                quads.push(Quad::from_rect(scaled, score));
            }
        }
        quads
    }
}

impl TextDetector for DbDetector {
    fn name(&self) -> &'static str {
        "db"
    }

    fn params(&self) -> &TextDetectionParams {
        &self.params
    }

    fn detect_regions(&mut self, frame: &RgbImage) -> Result<Vec<Quad>> {
        let input = self.preprocess(frame)?;
        let input_ref: TensorRef<f32> = TensorRef::from_array_view(&input)
            .map_err(|e| DetectionError::Inference(e.to_string()))?;

        let probabilities = {
            let outputs = self
                .session
                .run(inputs![input_ref])
                .map_err(|e| DetectionError::Inference(e.to_string()))?;
            // Shape: [1, 1, H, W]
            outputs[0]
                .try_extract_array::<f32>()
                .map_err(|e| DetectionError::Inference(e.to_string()))?
                .into_owned()
                .into_dimensionality::<Ix4>()
                .map_err(|e| DetectionError::Inference(format!("unexpected output shape: {e}")))?
        };

        let map = probabilities.index_axis(Axis(0), 0);
        let map = map.index_axis(Axis(0), 0);
        let quads = self.postprocess(map, frame.width(), frame.height());
        debug!("DB detector found {} regions", quads.len());
        Ok(quads)
    }
}
