use crate::mask::build_mask;
use crate::output::{annotated_path, output_dir_for};
use crate::render::{annotate, result_for_frame};
use crate::{Frame, Media};
use fonttik_common::{
    AppSettings, FrameResults, OutlineColors, ProcessingError, Result, Results,
};
use image::{GrayImage, RgbImage};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// A still image: a single frame with index 0
pub struct ImageMedia {
    path: PathBuf,
    output_dir: PathBuf,
    extension: String,
    image: RgbImage,
    mask: Option<Arc<GrayImage>>,
    current: Option<Frame>,
    consumed: bool,
}

impl ImageMedia {
    /// Decode an image file
    ///
    /// # Errors
    /// Returns `CorruptedFile` if the file cannot be decoded.
    pub fn open(path: &Path, output_root: Option<&Path>) -> Result<Self> {
        let image = image::open(path)
            .map_err(|e| ProcessingError::CorruptedFile(format!("{}: {e}", path.display())))?
            .to_rgb8();
        debug!(
            "Opened image {} ({}x{})",
            path.display(),
            image.width(),
            image.height()
        );
        Ok(Self::from_image(path, image, output_root))
    }

    /// Wrap an already decoded image
    #[must_use]
    pub fn from_image(path: &Path, image: RgbImage, output_root: Option<&Path>) -> Self {
        let extension = path
            .extension()
            .map_or_else(|| "png".to_string(), |e| e.to_string_lossy().to_lowercase());
        Self {
            path: path.to_path_buf(),
            output_dir: output_dir_for(path, output_root),
            extension,
            image,
            mask: None,
            current: None,
            consumed: false,
        }
    }

    fn save_annotated(
        &self,
        frames: &[FrameResults],
        suffix: &str,
        colors: &OutlineColors,
    ) -> Result<PathBuf> {
        let path = annotated_path(&self.output_dir, &self.path, suffix, &self.extension);
        let annotated = match result_for_frame(frames, 0) {
            Some(results) => annotate(&self.image, results, colors),
            None => self.image.clone(),
        };
        annotated.save(&path)?;
        Ok(path)
    }
}

impl Media for ImageMedia {
    fn path(&self) -> &Path {
        &self.path
    }

    fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    fn is_video(&self) -> bool {
        false
    }

    fn fps(&self) -> Option<f64> {
        None
    }

    fn calculate_mask(&mut self, settings: &AppSettings) {
        let (width, height) = self.image.dimensions();
        self.mask = build_mask(settings, width, height).map(Arc::new);
    }

    fn load_frame(&mut self) -> Result<bool> {
        if self.consumed {
            self.current = None;
            return Ok(false);
        }
        self.consumed = true;
        self.current = Some(Frame::new(0, None, self.image.clone()).with_mask(self.mask.clone()));
        Ok(true)
    }

    fn frame(&self) -> Option<&Frame> {
        self.current.as_ref()
    }

    fn take_frame(&mut self) -> Option<Frame> {
        self.current.take()
    }

    fn output_path(&self) -> &Path {
        &self.output_dir
    }

    fn extension(&self) -> &str {
        &self.extension
    }

    fn save_results_outlines(
        &mut self,
        results: &mut Results,
        colors: &OutlineColors,
    ) -> Result<Vec<PathBuf>> {
        std::fs::create_dir_all(&self.output_dir)?;
        let size = self.save_annotated(results.size_results(), "size", colors)?;
        let contrast = self.save_annotated(results.contrast_results(), "contrast", colors)?;
        info!("Saved outlines for {}", self.path.display());
        Ok(vec![size, contrast])
    }
}
