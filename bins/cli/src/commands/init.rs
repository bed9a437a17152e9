//! Init command handler.

use crate::error::CliError;
use crate::format::OutputMode;
use crate::{CliOutput, format_error_output, to_json_output};
use job_posting_dq_config::{DEFAULT_PARAMETERS_PATH, ParametersConfig, ensure_dirs, load_parameters};
use job_posting_dq_shared::ErrorEnvelope;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Run the init command.
///
/// Without `--parameters`, a missing default parameters file falls back to
/// built-in defaults; an explicit path must exist.
pub fn run_init(mode: OutputMode, parameters: Option<&Path>) -> Result<CliOutput, CliError> {
    let directories = match ensure_from(parameters) {
        Ok(directories) => directories,
        Err(error) => return Ok(format_error_output(mode, &error)),
    };
    let directories = directories
        .iter()
        .map(|dir| dir.display().to_string())
        .collect::<Vec<_>>();

    let stdout = if mode.is_json() {
        to_json_output(&serde_json::json!({
            "status": "ok",
            "directories": directories,
        }))?
    } else {
        let mut out = String::from("status: ok\ndirectories:\n");
        for dir in &directories {
            out.push_str("  - ");
            out.push_str(dir);
            out.push('\n');
        }
        out
    };

    Ok(CliOutput::ok(stdout))
}

fn ensure_from(parameters: Option<&Path>) -> Result<Vec<PathBuf>, ErrorEnvelope> {
    let params = match parameters {
        Some(path) => load_parameters(path)?,
        None => {
            let path = Path::new(DEFAULT_PARAMETERS_PATH);
            if path.exists() {
                load_parameters(path)?
            } else {
                warn!(path = DEFAULT_PARAMETERS_PATH, "parameters file not found; using defaults");
                ParametersConfig::default()
            }
        },
    };
    ensure_dirs(&params)
}
