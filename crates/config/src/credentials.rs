//! Credentials document.
//!
//! Credentials only *name* the environment variable holding the API key; the
//! value itself is resolved later, at point of use (see [`crate::env`]).

use crate::document::RawDocument;
use crate::schema::{
    FieldError, FieldRule, FieldSpec, FieldValidationError, UnknownKeys, child_path,
    coerce_string, finish, read_mapping, read_section,
};
use schemars::JsonSchema;
use serde::Serialize;
use serde_yaml_ng::Value;
use tracing::debug;

/// Default `gemini.api_key_env`.
pub const DEFAULT_API_KEY_ENV: &str = "GEMINI_API_KEY";
/// Default `gemini.request.timeout_seconds`.
pub const DEFAULT_TIMEOUT_SECONDS: u32 = 60;
/// Default `gemini.request.retry_backoff_seconds`.
pub const DEFAULT_RETRY_BACKOFF_SECONDS: u32 = 2;
/// Default `gemini.request.max_retry_backoff_seconds`.
pub const DEFAULT_MAX_RETRY_BACKOFF_SECONDS: u32 = 20;

/// Validated credentials document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, JsonSchema)]
pub struct CredentialsConfig {
    /// Gemini client settings.
    pub gemini: GeminiConfig,
}

/// `gemini` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, JsonSchema)]
pub struct GeminiConfig {
    /// Name of the environment variable that holds the API key.
    pub api_key_env: String,
    /// Optional GCP project id.
    pub gcp_project_id: Option<String>,
    /// Optional GCP location.
    pub gcp_location: Option<String>,
    /// Request timing.
    pub request: GeminiRequestConfig,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key_env: DEFAULT_API_KEY_ENV.to_string(),
            gcp_project_id: None,
            gcp_location: None,
            request: GeminiRequestConfig::default(),
        }
    }
}

/// `gemini.request` section, in whole seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, JsonSchema)]
pub struct GeminiRequestConfig {
    /// Per-request timeout (> 0).
    pub timeout_seconds: u32,
    /// Initial retry backoff.
    pub retry_backoff_seconds: u32,
    /// Backoff ceiling (>= `retry_backoff_seconds`).
    pub max_retry_backoff_seconds: u32,
}

impl Default for GeminiRequestConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: DEFAULT_TIMEOUT_SECONDS,
            retry_backoff_seconds: DEFAULT_RETRY_BACKOFF_SECONDS,
            max_retry_backoff_seconds: DEFAULT_MAX_RETRY_BACKOFF_SECONDS,
        }
    }
}

const ROOT_FIELDS: &[FieldSpec<CredentialsConfig>] = &[FieldSpec {
    key: "gemini",
    rule: FieldRule::Nested(|config, value, path, errors| {
        config.gemini = read_section(value, path, GEMINI_FIELDS, UnknownKeys::Reject, errors);
    }),
}];

const GEMINI_FIELDS: &[FieldSpec<GeminiConfig>] = &[
    FieldSpec {
        key: "api_key_env",
        rule: FieldRule::Custom(|gemini, value| {
            let name = coerce_string(value)?;
            if name.trim().is_empty() {
                return Err("must name an environment variable".to_string());
            }
            gemini.api_key_env = name.trim().to_string();
            Ok(())
        }),
    },
    FieldSpec {
        key: "gcp_project_id",
        rule: FieldRule::OptionalText(|gemini, value| gemini.gcp_project_id = value),
    },
    FieldSpec {
        key: "gcp_location",
        rule: FieldRule::OptionalText(|gemini, value| gemini.gcp_location = value),
    },
    FieldSpec {
        key: "request",
        rule: FieldRule::Nested(read_request),
    },
];

const REQUEST_FIELDS: &[FieldSpec<GeminiRequestConfig>] = &[
    FieldSpec {
        key: "timeout_seconds",
        rule: FieldRule::Count {
            min: 1,
            null_keeps_default: false,
            set: |request, value| request.timeout_seconds = value,
        },
    },
    FieldSpec {
        key: "retry_backoff_seconds",
        rule: FieldRule::Count {
            min: 0,
            null_keeps_default: false,
            set: |request, value| request.retry_backoff_seconds = value,
        },
    },
    FieldSpec {
        key: "max_retry_backoff_seconds",
        rule: FieldRule::Count {
            min: 0,
            null_keeps_default: false,
            set: |request, value| request.max_retry_backoff_seconds = value,
        },
    },
];

fn read_request(gemini: &mut GeminiConfig, value: &Value, path: &str, errors: &mut Vec<FieldError>) {
    let before = errors.len();
    let request: GeminiRequestConfig =
        read_section(value, path, REQUEST_FIELDS, UnknownKeys::Reject, errors);
    if errors.len() == before && request.max_retry_backoff_seconds < request.retry_backoff_seconds
    {
        errors.push(FieldError::new(
            child_path(path, "max_retry_backoff_seconds"),
            format!(
                "must be >= retry_backoff_seconds ({}) (got {})",
                request.retry_backoff_seconds, request.max_retry_backoff_seconds
            ),
        ));
    }
    gemini.request = request;
}

impl CredentialsConfig {
    /// Validate a credentials document.
    pub fn from_document(document: &RawDocument) -> Result<Self, FieldValidationError> {
        let mut errors = Vec::new();
        let config = read_mapping(
            document.root(),
            "",
            ROOT_FIELDS,
            UnknownKeys::Reject,
            &mut errors,
        );
        let config = finish("credentials", document.origin(), errors, config)?;
        debug!(
            source = document.origin(),
            api_key_env = %config.gemini.api_key_env,
            "validated credentials"
        );
        Ok(config)
    }
}
