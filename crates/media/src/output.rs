//! Result files written per media item

use fonttik_common::{FrameResults, Result, Results};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub const SIZE_RESULTS_FILE: &str = "sizeChecks.json";
pub const CONTRAST_RESULTS_FILE: &str = "contrastChecks.json";

/// Directory receiving a media item's artifacts: `<root>/<file stem>`,
/// where the root defaults to the directory containing the input
#[must_use]
pub fn output_dir_for(input: &Path, root: Option<&Path>) -> PathBuf {
    let root = root
        .map(Path::to_path_buf)
        .or_else(|| input.parent().map(Path::to_path_buf))
        .unwrap_or_default();
    let stem = input
        .file_stem()
        .map_or_else(|| "media".to_string(), |s| s.to_string_lossy().into_owned());
    root.join(stem)
}

/// Path of an annotated artifact: `<dir>/<stem>_<suffix>.<extension>`
#[must_use]
pub fn annotated_path(dir: &Path, input: &Path, suffix: &str, extension: &str) -> PathBuf {
    let stem = input
        .file_stem()
        .map_or_else(|| "media".to_string(), |s| s.to_string_lossy().into_owned());
    dir.join(format!("{stem}_{suffix}.{extension}"))
}

fn write_json(path: &Path, frames: &[FrameResults]) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, frames)?;
    writer.flush()?;
    debug!("Wrote {} frame verdicts to {}", frames.len(), path.display());
    Ok(())
}

/// Write `sizeChecks.json` and `contrastChecks.json` (frame ascending)
///
/// # Errors
/// Returns an error if the directory or files cannot be written.
pub fn write_results_json(dir: &Path, results: &mut Results) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(dir)?;

    let size_path = dir.join(SIZE_RESULTS_FILE);
    write_json(&size_path, results.size_results())?;
    let contrast_path = dir.join(CONTRAST_RESULTS_FILE);
    write_json(&contrast_path, results.contrast_results())?;

    info!("Saved result files to {}", dir.display());
    Ok(vec![size_path, contrast_path])
}
