//! Environment resolution for LLM client settings.
//!
//! Credentials name variables; this module dereferences them at point of use
//! and assembles the settings a Gemini client would be built from. Nothing
//! here performs network calls.

use crate::credentials::CredentialsConfig;
use job_posting_dq_shared::{ErrorCode, ErrorEnvelope, SecretString, redact_if_secret};
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;
use tracing::debug;

/// Model-name override variable.
pub const ENV_GEMINI_MODEL: &str = "GEMINI_MODEL";

/// Immutable snapshot of the environment variables a resolver may read.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct EnvSnapshot(BTreeMap<String, String>);

impl EnvSnapshot {
    /// Build from an explicit map (useful for tests and fixtures).
    #[must_use]
    pub fn from_map(map: &BTreeMap<String, String>) -> Self {
        Self(map.clone())
    }

    /// Capture `names` from the current process environment.
    pub fn from_std_env<'a>(names: impl IntoIterator<Item = &'a str>) -> Self {
        let mut map = BTreeMap::new();
        for name in names {
            if let Ok(value) = std::env::var(name) {
                map.insert(name.to_string(), value);
            }
        }
        Self(map)
    }

    /// Capture the variables [`resolve_gemini_settings`] reads for `credentials`.
    pub fn for_credentials(credentials: &CredentialsConfig) -> Self {
        Self::from_std_env([credentials.gemini.api_key_env.as_str(), ENV_GEMINI_MODEL])
    }

    /// Trimmed value of `name`; blank values read as unset.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .get(name)
            .map(|value| value.trim())
            .filter(|value| !value.is_empty())
    }
}

impl fmt::Debug for EnvSnapshot {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_map()
            .entries(
                self.0
                    .iter()
                    .map(|(key, value)| (key, redact_if_secret(key, value))),
            )
            .finish()
    }
}

/// Request timing as durations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestTimings {
    /// Per-request timeout.
    pub timeout: Duration,
    /// Initial retry backoff.
    pub retry_backoff: Duration,
    /// Backoff ceiling.
    pub max_retry_backoff: Duration,
}

/// Everything needed to build a Gemini client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeminiClientSettings {
    /// API key value (redacted in `Debug`/`Display`).
    pub api_key: SecretString,
    /// Variable the key was read from.
    pub api_key_env: String,
    /// Resolved model name.
    pub model_name: String,
    /// Optional GCP project id.
    pub gcp_project_id: Option<String>,
    /// Optional GCP location.
    pub gcp_location: Option<String>,
    /// Request timing.
    pub timings: RequestTimings,
}

/// Failures resolving settings from the environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnvError {
    /// A referenced variable is unset or blank.
    MissingVariable {
        /// Variable name.
        var: String,
    },
    /// Neither an override nor `GEMINI_MODEL` supplied a model name.
    MissingModelName,
}

impl fmt::Display for EnvError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingVariable { var } => {
                write!(formatter, "environment variable {var} is not set")
            },
            Self::MissingModelName => write!(
                formatter,
                "no model name: pass llm.model_name or set {ENV_GEMINI_MODEL}"
            ),
        }
    }
}

impl std::error::Error for EnvError {}

impl From<EnvError> for ErrorEnvelope {
    fn from(error: EnvError) -> Self {
        let message = error.to_string();
        match error {
            EnvError::MissingVariable { var } => {
                Self::expected(ErrorCode::config("missing_environment"), message)
                    .with_metadata("var", var)
            },
            EnvError::MissingModelName => {
                Self::expected(ErrorCode::config("missing_model"), message)
            },
        }
    }
}

/// Pick the model name: non-blank override, then `GEMINI_MODEL`.
pub fn resolve_model_name(model_override: Option<&str>, env: &EnvSnapshot) -> Result<String, EnvError> {
    model_override
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .or_else(|| env.get(ENV_GEMINI_MODEL))
        .map(str::to_string)
        .ok_or(EnvError::MissingModelName)
}

/// Resolve client settings from validated credentials and an env snapshot.
pub fn resolve_gemini_settings(
    credentials: &CredentialsConfig,
    model_override: Option<&str>,
    env: &EnvSnapshot,
) -> Result<GeminiClientSettings, EnvError> {
    let gemini = &credentials.gemini;
    let api_key = env
        .get(&gemini.api_key_env)
        .map(SecretString::new)
        .ok_or_else(|| EnvError::MissingVariable {
            var: gemini.api_key_env.clone(),
        })?;
    let model_name = resolve_model_name(model_override, env)?;

    let request = gemini.request;
    let settings = GeminiClientSettings {
        api_key,
        api_key_env: gemini.api_key_env.clone(),
        model_name,
        gcp_project_id: gemini.gcp_project_id.clone(),
        gcp_location: gemini.gcp_location.clone(),
        timings: RequestTimings {
            timeout: Duration::from_secs(u64::from(request.timeout_seconds)),
            retry_backoff: Duration::from_secs(u64::from(request.retry_backoff_seconds)),
            max_retry_backoff: Duration::from_secs(u64::from(request.max_retry_backoff_seconds)),
        },
    };
    debug!(
        model = %settings.model_name,
        api_key_env = %settings.api_key_env,
        "resolved gemini client settings"
    );
    Ok(settings)
}

/// [`resolve_gemini_settings`] against the current process environment.
pub fn resolve_gemini_settings_std_env(
    credentials: &CredentialsConfig,
    model_override: Option<&str>,
) -> Result<GeminiClientSettings, ErrorEnvelope> {
    let env = EnvSnapshot::for_credentials(credentials);
    resolve_gemini_settings(credentials, model_override, &env).map_err(ErrorEnvelope::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    fn snapshot(pairs: &[(&str, &str)]) -> EnvSnapshot {
        let map = pairs
            .iter()
            .map(|(key, value)| ((*key).to_string(), (*value).to_string()))
            .collect::<BTreeMap<_, _>>();
        EnvSnapshot::from_map(&map)
    }

    #[test]
    fn resolves_key_model_and_timings() -> Result<(), Box<dyn Error>> {
        let env = snapshot(&[("GEMINI_API_KEY", " secret-value \n")]);
        let settings =
            resolve_gemini_settings(&CredentialsConfig::default(), Some("gemini-2.5-pro"), &env)?;
        assert_eq!(settings.api_key.expose(), "secret-value");
        assert_eq!(settings.model_name, "gemini-2.5-pro");
        assert_eq!(settings.timings.timeout, Duration::from_secs(60));
        assert_eq!(settings.timings.max_retry_backoff, Duration::from_secs(20));
        assert!(!format!("{settings:?}").contains("secret-value"));
        Ok(())
    }

    #[test]
    fn model_override_beats_environment() -> Result<(), Box<dyn Error>> {
        let env = snapshot(&[("GEMINI_MODEL", "from-env")]);
        assert_eq!(resolve_model_name(Some("explicit"), &env)?, "explicit");
        assert_eq!(resolve_model_name(Some("  "), &env)?, "from-env");
        assert_eq!(resolve_model_name(None, &env)?, "from-env");
        assert_eq!(
            resolve_model_name(None, &EnvSnapshot::default()),
            Err(EnvError::MissingModelName)
        );
        Ok(())
    }

    #[test]
    fn missing_or_blank_key_names_the_variable() -> Result<(), Box<dyn Error>> {
        let mut credentials = CredentialsConfig::default();
        credentials.gemini.api_key_env = "MY_KEY".to_string();
        let env = snapshot(&[("MY_KEY", "   "), ("GEMINI_MODEL", "m")]);

        let error = resolve_gemini_settings(&credentials, None, &env)
            .err()
            .ok_or_else(|| std::io::Error::other("expected missing variable"))?;
        assert_eq!(
            error,
            EnvError::MissingVariable {
                var: "MY_KEY".to_string()
            }
        );
        let envelope = ErrorEnvelope::from(error);
        assert_eq!(envelope.code, ErrorCode::config("missing_environment"));
        assert_eq!(envelope.metadata_value("var"), Some("MY_KEY"));
        Ok(())
    }

    #[test]
    fn snapshot_debug_redacts_secrets() {
        let env = snapshot(&[("GEMINI_API_KEY", "abc123"), ("GEMINI_MODEL", "m")]);
        let rendered = format!("{env:?}");
        assert!(!rendered.contains("abc123"));
        assert!(rendered.contains("\"m\""));
    }
}
