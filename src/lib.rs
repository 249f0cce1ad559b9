//! Fonttik - text size and contrast accessibility checks for images and video
//!
//! The workspace is split by concern:
//! - [`common`]: configuration, geometry and result types
//! - [`textbox`]: text regions, luminance, glyph masks and box merging
//! - [`colorblind`]: colour vision deficiency simulation
//! - [`detection`]: text detector and recognizer backends
//! - [`media`]: image/video sources and annotated outputs
//! - [`checks`]: the checks, the per-item pipeline and batch processing
//!
//! ```no_run
//! use fonttik::{Configuration, Fonttik};
//! use std::path::Path;
//! use std::sync::Arc;
//!
//! let config = Arc::new(Configuration::load("fonttik.json")?);
//! let mut fonttik = Fonttik::new(config)?;
//! let report = fonttik.process_path(Path::new("menu.png"))?;
//! println!("size pass: {}", report.results.overall_size_pass());
//! # Ok::<(), fonttik::ProcessingError>(())
//! ```

pub use fonttik_colorblind as colorblind;
pub use fonttik_common as common;
pub use fonttik_core as checks;
pub use fonttik_detection as detection;
pub use fonttik_media as media;
pub use fonttik_textbox as textbox;

pub use fonttik_common::{
    AppSettings, ColorblindType, Configuration, FrameResults, Guideline, ProcessingError, Rect,
    ResultBox, ResultType, Results,
};
pub use fonttik_core::{BatchProcessor, Fonttik, MediaOutcome, MediaReport};
