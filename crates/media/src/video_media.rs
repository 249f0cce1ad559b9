use crate::mask::build_mask;
use crate::output::{annotated_path, output_dir_for};
use crate::render::{annotate, verdict_for_frame};
use crate::video::{probe, FrameDecoder, VideoInfo, VideoWriter};
use crate::{Frame, Media};
use fonttik_common::{AppSettings, OutlineColors, Result, Results};
use image::GrayImage;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// Container used for annotated video output
pub const VIDEO_OUTPUT_EXTENSION: &str = "mp4";

/// A video file decoded frame by frame
pub struct VideoMedia {
    path: PathBuf,
    output_dir: PathBuf,
    extension: String,
    info: VideoInfo,
    decoder: Option<FrameDecoder>,
    next_index: i64,
    mask: Option<Arc<GrayImage>>,
    current: Option<Frame>,
}

impl VideoMedia {
    /// Probe a video file; decoding starts on the first `load_frame`
    ///
    /// # Errors
    /// Returns an error if ffprobe fails or the file has no video stream.
    pub fn open(path: &Path, output_root: Option<&Path>) -> Result<Self> {
        let info = probe(path)?;
        let extension = path
            .extension()
            .map_or_else(String::new, |e| e.to_string_lossy().to_lowercase());
        Ok(Self {
            path: path.to_path_buf(),
            output_dir: output_dir_for(path, output_root),
            extension,
            info,
            decoder: None,
            next_index: 0,
            mask: None,
            current: None,
        })
    }

    /// Annotated output paths for the size and contrast videos
    #[must_use]
    pub fn annotated_video_paths(&self) -> (PathBuf, PathBuf) {
        (
            annotated_path(&self.output_dir, &self.path, "size", VIDEO_OUTPUT_EXTENSION),
            annotated_path(&self.output_dir, &self.path, "contrast", VIDEO_OUTPUT_EXTENSION),
        )
    }

    #[allow(clippy::cast_precision_loss)]
    fn timestamp(&self, index: i64) -> f64 {
        index as f64 / self.info.fps
    }
}

impl Media for VideoMedia {
    fn path(&self) -> &Path {
        &self.path
    }

    fn dimensions(&self) -> (u32, u32) {
        (self.info.width, self.info.height)
    }

    fn is_video(&self) -> bool {
        true
    }

    fn fps(&self) -> Option<f64> {
        Some(self.info.fps)
    }

    fn calculate_mask(&mut self, settings: &AppSettings) {
        self.mask = build_mask(settings, self.info.width, self.info.height).map(Arc::new);
    }

    fn load_frame(&mut self) -> Result<bool> {
        if self.decoder.is_none() {
            self.decoder = Some(FrameDecoder::open(
                &self.path,
                self.info.width,
                self.info.height,
            )?);
        }
        let Some(decoder) = self.decoder.as_mut() else {
            return Ok(false);
        };

        match decoder.next_frame()? {
            Some(image) => {
                let index = self.next_index;
                self.next_index += 1;
                let frame = Frame::new(index, Some(self.timestamp(index)), image);
                self.current = Some(frame.with_mask(self.mask.clone()));
                Ok(true)
            }
            None => {
                debug!("Decoded {} frames from {}", self.next_index, self.path.display());
                self.current = None;
                Ok(false)
            }
        }
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

    /// Re-decode the video and write both annotated outputs. Frames without a
    /// verdict of their own show the latest preceding one, unless an analysed
    /// frame without text came after it.
    fn save_results_outlines(
        &mut self,
        results: &mut Results,
        colors: &OutlineColors,
    ) -> Result<Vec<PathBuf>> {
        std::fs::create_dir_all(&self.output_dir)?;
        let (size_path, contrast_path) = self.annotated_video_paths();
        let VideoInfo {
            width, height, fps, ..
        } = self.info;

        let mut decoder = FrameDecoder::open(&self.path, width, height)?;
        let mut size_writer = VideoWriter::create(&size_path, width, height, fps)?;
        let mut contrast_writer = VideoWriter::create(&contrast_path, width, height, fps)?;

        let empty_frames = results.empty_frames().to_vec();
        let size_results = results.size_results().to_vec();
        let contrast_results = results.contrast_results();
        let mut index = 0i64;
        while let Some(image) = decoder.next_frame()? {
            match verdict_for_frame(&size_results, &empty_frames, index) {
                Some(verdict) => size_writer.write_frame(&annotate(&image, verdict, colors))?,
                None => size_writer.write_frame(&image)?,
            }
            match verdict_for_frame(contrast_results, &empty_frames, index) {
                Some(verdict) => contrast_writer.write_frame(&annotate(&image, verdict, colors))?,
                None => contrast_writer.write_frame(&image)?,
            }
            index += 1;
        }

        let paths = vec![size_writer.finish()?, contrast_writer.finish()?];
        info!("Saved {} annotated frames for {}", index, self.path.display());
        Ok(paths)
    }
}
