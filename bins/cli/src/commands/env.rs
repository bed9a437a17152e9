//! Environment command handlers.

use crate::error::CliError;
use crate::format::OutputMode;
use crate::{CliOutput, format_error_output, to_json_output};
use job_posting_dq_config::{EnvSnapshot, load_credentials, resolve_gemini_settings};
use job_posting_dq_shared::ErrorEnvelope;
use std::path::Path;

/// Run `env check`. The API key value is never printed.
pub fn run_env_check(
    mode: OutputMode,
    credentials: &Path,
    model: Option<&str>,
) -> Result<CliOutput, CliError> {
    let credentials = match load_credentials(credentials) {
        Ok(credentials) => credentials,
        Err(error) => return Ok(format_error_output(mode, &error)),
    };
    let env = EnvSnapshot::for_credentials(&credentials);
    let settings = match resolve_gemini_settings(&credentials, model, &env) {
        Ok(settings) => settings,
        Err(error) => return Ok(format_error_output(mode, &ErrorEnvelope::from(error))),
    };

    let stdout = if mode.is_json() {
        to_json_output(&serde_json::json!({
            "status": "ok",
            "modelName": settings.model_name,
            "apiKeyEnv": settings.api_key_env,
            "apiKey": settings.api_key.to_string(),
            "gcpProjectId": settings.gcp_project_id,
            "gcpLocation": settings.gcp_location,
            "timeoutSeconds": settings.timings.timeout.as_secs(),
            "retryBackoffSeconds": settings.timings.retry_backoff.as_secs(),
            "maxRetryBackoffSeconds": settings.timings.max_retry_backoff.as_secs(),
        }))?
    } else {
        format!(
            "status: ok\nmodel_name: {}\napi_key_env: {}\napi_key: {}\ntimeout_seconds: {}\nretry_backoff_seconds: {}\nmax_retry_backoff_seconds: {}\n",
            settings.model_name,
            settings.api_key_env,
            settings.api_key,
            settings.timings.timeout.as_secs(),
            settings.timings.retry_backoff.as_secs(),
            settings.timings.max_retry_backoff.as_secs(),
        )
    };

    Ok(CliOutput::ok(stdout))
}
