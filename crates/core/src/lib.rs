//! Fonttik checks and pipeline
//!
//! [`Fonttik`] checks one media item at a time: it resolves the size
//! guideline for the frame resolution, detects text, and runs the size and
//! contrast checks on every analysed frame. [`BatchProcessor`] runs many
//! items on a fixed worker pool, one checker per item.

pub mod batch;
pub mod contrast;
mod error;
mod fonttik;
pub mod save_pipeline;
pub mod size;

pub use batch::{collect_inputs, process_one, BatchProcessor, MediaOutcome};
pub use contrast::ContrastChecker;
pub use error::{PipelineError, Result};
pub use fonttik::{backfill_text, FrameCheck, Fonttik, MediaReport};
pub use save_pipeline::{run_pipeline, AnnotatedVideoSink, FrameQueue, RenderItem};
pub use size::SizeChecker;
