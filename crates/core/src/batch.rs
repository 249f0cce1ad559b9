//! Batch processing of many media items on a fixed worker pool

use crate::fonttik::Fonttik;
use fonttik_common::{Configuration, ProcessingError, Result};
use fonttik_media::is_supported;
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

/// Summary of one processed media item
#[derive(Debug, Clone, PartialEq)]
pub struct MediaOutcome {
    pub path: PathBuf,
    pub size_pass: bool,
    pub contrast_pass: bool,
    pub frames_checked: usize,
    pub outputs: Vec<PathBuf>,
    /// Set when the item could not be processed
    pub error: Option<String>,
}

impl MediaOutcome {
    fn failed(path: &Path, error: &ProcessingError) -> Self {
        Self {
            path: path.to_path_buf(),
            size_pass: false,
            contrast_pass: false,
            frames_checked: 0,
            outputs: Vec::new(),
            error: Some(error.to_string()),
        }
    }

    /// The item was processed (regardless of its verdicts)
    #[must_use]
    pub fn is_processed(&self) -> bool {
        self.error.is_none()
    }

    /// The item was processed and both checks passed
    #[must_use]
    pub fn passed(&self) -> bool {
        self.is_processed() && self.size_pass && self.contrast_pass
    }
}

/// Expand directories (one level, sorted) and keep supported media files
#[must_use]
pub fn collect_inputs(paths: &[PathBuf]) -> Vec<PathBuf> {
    let mut inputs = Vec::new();
    for path in paths {
        if path.is_dir() {
            match std::fs::read_dir(path) {
                Ok(entries) => {
                    let mut files: Vec<PathBuf> = entries
                        .filter_map(|entry| entry.ok().map(|e| e.path()))
                        .filter(|p| p.is_file() && is_supported(p))
                        .collect();
                    files.sort();
                    inputs.extend(files);
                }
                Err(e) => warn!("Skipping unreadable directory {}: {}", path.display(), e),
            }
        } else {
            // Unsupported files are kept so they are reported as failures
            inputs.push(path.clone());
        }
    }
    inputs
}

/// Processes media items in parallel, one checker per item
pub struct BatchProcessor {
    config: Arc<Configuration>,
    pool: ThreadPool,
}

impl BatchProcessor {
    /// Create the worker pool (`worker_threads` of 0 uses one thread per core)
    ///
    /// # Errors
    /// Returns an error if the pool cannot be created.
    pub fn new(config: Arc<Configuration>) -> Result<Self> {
        let pool = ThreadPoolBuilder::new()
            .num_threads(config.app_settings.worker_threads)
            .thread_name(|i| format!("fonttik-worker-{i}"))
            .build()
            .map_err(|e| ProcessingError::Other(format!("Failed to build worker pool: {e}")))?;
        info!("Worker pool ready with {} threads", pool.current_num_threads());
        Ok(Self { config, pool })
    }

    #[must_use]
    pub fn threads(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Process every input. Outcomes are returned in input order; a failing
    /// item never stops the others.
    #[must_use]
    pub fn process(&self, inputs: &[PathBuf]) -> Vec<MediaOutcome> {
        let start = Instant::now();
        let outcomes: Vec<MediaOutcome> = self.pool.install(|| {
            inputs
                .par_iter()
                .map(|path| process_one(&self.config, path))
                .collect()
        });

        let failed = outcomes.iter().filter(|o| !o.is_processed()).count();
        info!(
            "Processed {} items ({} failed) in {:.2}s",
            outcomes.len(),
            failed,
            start.elapsed().as_secs_f64()
        );
        outcomes
    }
}

/// Check a single item with a checker of its own
#[must_use]
pub fn process_one(config: &Arc<Configuration>, path: &Path) -> MediaOutcome {
    let report = Fonttik::new(Arc::clone(config)).and_then(|mut fonttik| fonttik.process_path(path));
    match report {
        Ok(report) => MediaOutcome {
            path: path.to_path_buf(),
            size_pass: report.results.overall_size_pass(),
            contrast_pass: report.results.overall_contrast_pass(),
            frames_checked: report.results.frames_checked(),
            outputs: report.outputs,
            error: None,
        },
        Err(e) => {
            warn!("Failed to process {}: {}", path.display(), e);
            MediaOutcome::failed(path, &e)
        }
    }
}
