//! Directory ensurer for output and working directories.
//!
//! Creation is recursive and treats "already exists" as success, so it is
//! safe to run repeatedly or from racing processes.

use crate::parameters::ParametersConfig;
use job_posting_dq_shared::ErrorEnvelope;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Working directories created alongside the configured output directories.
pub const WORKING_DIRS: [&str; 2] = ["process_data", "raw_data"];

/// Directories the pipeline needs, relative to the working directory.
pub fn required_dirs(params: &ParametersConfig) -> Vec<PathBuf> {
    [
        params.outputs.artifacts_dir.as_str(),
        params.outputs.cache_dir.as_str(),
        params.outputs.reports_dir.as_str(),
    ]
    .into_iter()
    .chain(WORKING_DIRS)
    .map(PathBuf::from)
    .collect()
}

/// Ensure [`required_dirs`] exist under the current working directory.
pub fn ensure_dirs(params: &ParametersConfig) -> Result<Vec<PathBuf>, ErrorEnvelope> {
    ensure_dirs_in(Path::new(""), params)
}

/// Ensure [`required_dirs`] exist under `root`, returning the paths.
///
/// Absolute configured paths ignore `root`.
pub fn ensure_dirs_in(root: &Path, params: &ParametersConfig) -> Result<Vec<PathBuf>, ErrorEnvelope> {
    let mut ensured = Vec::new();
    for relative in required_dirs(params) {
        let dir = root.join(relative);
        create_dir(&dir)?;
        ensured.push(dir);
    }
    Ok(ensured)
}

/// Create the parent directory of an output file path, if it has one.
pub fn ensure_parent_dir(path: &Path) -> Result<(), ErrorEnvelope> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => create_dir(parent),
        _ => Ok(()),
    }
}

fn create_dir(dir: &Path) -> Result<(), ErrorEnvelope> {
    if dir.is_dir() {
        return Ok(());
    }
    std::fs::create_dir_all(dir).map_err(|error| {
        ErrorEnvelope::from(error).with_metadata("path", dir.to_string_lossy().to_string())
    })?;
    debug!(path = %dir.display(), "created directory");
    Ok(())
}
