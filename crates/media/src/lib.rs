//! Media sources and result sinks
//!
//! A [`Media`] yields frames one at a time (a still image yields exactly one)
//! with the configured focus/ignore mask attached, and writes the annotated
//! outline artifacts once results are known. Video goes through the
//! `ffmpeg`/`ffprobe` command-line tools.

pub mod dedup;
mod frame;
mod image_media;
pub mod mask;
pub mod output;
pub mod render;
pub mod video;
mod video_media;

use fonttik_common::{AppSettings, OutlineColors, ProcessingError, Result, Results};
use std::path::{Path, PathBuf};

pub use dedup::FrameDeduplicator;
pub use frame::Frame;
pub use image_media::ImageMedia;
pub use output::{output_dir_for, write_results_json};
pub use video::{VideoInfo, VideoWriter};
pub use video_media::{VideoMedia, VIDEO_OUTPUT_EXTENSION};

/// Still image extensions accepted by [`open_media`]
pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "bmp", "webp"];
/// Video extensions accepted by [`open_media`]
pub const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mov", "mkv", "avi", "webm", "m4v"];

/// A source of frames to check
pub trait Media: Send {
    fn path(&self) -> &Path;

    /// Frame dimensions (width, height)
    fn dimensions(&self) -> (u32, u32);

    fn is_video(&self) -> bool;

    fn fps(&self) -> Option<f64>;

    /// Build the analysis mask from the focus/ignore regions. Frames loaded
    /// afterwards carry it.
    fn calculate_mask(&mut self, settings: &AppSettings);

    /// Advance to the next frame.
    ///
    /// # Errors
    /// Returns an error if decoding fails.
    fn load_frame(&mut self) -> Result<bool>;

    /// The frame loaded by the last successful [`Media::load_frame`]
    fn frame(&self) -> Option<&Frame>;

    /// Move the current frame out of the source
    fn take_frame(&mut self) -> Option<Frame>;

    /// Directory receiving this item's artifacts
    fn output_path(&self) -> &Path;

    /// Lower-case extension of the input file
    fn extension(&self) -> &str;

    /// Write the size and contrast outline artifacts
    ///
    /// # Errors
    /// Returns an error if rendering or writing fails.
    fn save_results_outlines(
        &mut self,
        results: &mut Results,
        colors: &OutlineColors,
    ) -> Result<Vec<PathBuf>>;
}

/// Whether `path` has an extension [`open_media`] understands
#[must_use]
pub fn is_supported(path: &Path) -> bool {
    extension_of(path).is_some_and(|ext| {
        IMAGE_EXTENSIONS.contains(&ext.as_str()) || VIDEO_EXTENSIONS.contains(&ext.as_str())
    })
}

fn extension_of(path: &Path) -> Option<String> {
    path.extension().map(|e| e.to_string_lossy().to_lowercase())
}

/// Open an image or video by extension
///
/// # Errors
/// Returns `UnsupportedFormat` for unknown extensions, or the error raised
/// while opening the file.
pub fn open_media(path: &Path, output_root: Option<&Path>) -> Result<Box<dyn Media>> {
    let extension = extension_of(path).unwrap_or_default();
    if IMAGE_EXTENSIONS.contains(&extension.as_str()) {
        Ok(Box::new(ImageMedia::open(path, output_root)?))
    } else if VIDEO_EXTENSIONS.contains(&extension.as_str()) {
        Ok(Box::new(VideoMedia::open(path, output_root)?))
    } else {
        Err(ProcessingError::UnsupportedFormat(path.display().to_string()))
    }
}
