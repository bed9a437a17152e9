//! File-level entry points: read, sanitize, parse, rewrite, validate.
//!
//! These are the functions a pipeline calls once at startup. Every failure is
//! surfaced as an `ErrorEnvelope` with a stable `config:*` code.

use crate::credentials::CredentialsConfig;
use crate::document::{DocumentFormat, INLINE_ORIGIN, load_document, parse_document};
use crate::parameters::ParametersConfig;
use crate::prompts::{PromptTemplates, prompt_templates_from_document, system_prompt_from_document};
use job_posting_dq_shared::{ErrorCode, ErrorEnvelope};
use serde::Serialize;
use std::path::Path;

/// Default parameters document location.
pub const DEFAULT_PARAMETERS_PATH: &str = "configs/parameters.yaml";
/// Default credentials document location.
pub const DEFAULT_CREDENTIALS_PATH: &str = "configs/credentials.yaml";
/// Default multi-template document location.
pub const DEFAULT_PROMPTS_PATH: &str = "configs/prompts.yaml";
/// Default single-prompt document location.
pub const DEFAULT_PROMPT_PATH: &str = "configs/prompt.yaml";

/// Load and validate a parameters document.
pub fn load_parameters(path: &Path) -> Result<ParametersConfig, ErrorEnvelope> {
    let document = load_document(path)?;
    Ok(ParametersConfig::from_document(document)?)
}

/// Parse and validate parameters from in-memory text.
pub fn parse_parameters(text: &str, format: DocumentFormat) -> Result<ParametersConfig, ErrorEnvelope> {
    let document = parse_document(text, format, INLINE_ORIGIN)?;
    Ok(ParametersConfig::from_document(document)?)
}

/// Load and validate a credentials document.
pub fn load_credentials(path: &Path) -> Result<CredentialsConfig, ErrorEnvelope> {
    let document = load_document(path)?;
    Ok(CredentialsConfig::from_document(&document)?)
}

/// Parse and validate credentials from in-memory text.
pub fn parse_credentials(
    text: &str,
    format: DocumentFormat,
) -> Result<CredentialsConfig, ErrorEnvelope> {
    let document = parse_document(text, format, INLINE_ORIGIN)?;
    Ok(CredentialsConfig::from_document(&document)?)
}

/// Load a `meta` + `prompts` document into sanitized templates.
pub fn load_prompt_templates(path: &Path) -> Result<PromptTemplates, ErrorEnvelope> {
    let document = load_document(path)?;
    Ok(prompt_templates_from_document(&document)?)
}

/// Load the system prompt from a single-prompt document.
pub fn load_system_prompt(path: &Path) -> Result<String, ErrorEnvelope> {
    let document = load_document(path)?;
    Ok(system_prompt_from_document(&document)?)
}

/// Serialize as deterministic pretty JSON (with trailing newline).
pub fn to_pretty_json<T: Serialize + ?Sized>(value: &T) -> Result<String, ErrorEnvelope> {
    let mut output = serde_json::to_string_pretty(value).map_err(|error| {
        ErrorEnvelope::unexpected(
            ErrorCode::internal(),
            format!("failed to serialize config: {error}"),
        )
    })?;
    output.push('\n');
    Ok(output)
}

/// Serialize as YAML, in the shape the loaders accept.
pub fn to_yaml<T: Serialize + ?Sized>(value: &T) -> Result<String, ErrorEnvelope> {
    serde_yaml_ng::to_string(value).map_err(|error| {
        ErrorEnvelope::unexpected(
            ErrorCode::config("serialize_yaml"),
            format!("failed to serialize config YAML: {error}"),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn defaults_round_trip_through_yaml() -> Result<(), Box<dyn Error>> {
        let defaults = ParametersConfig::default();
        let yaml = to_yaml(&defaults)?;
        assert_eq!(parse_parameters(&yaml, DocumentFormat::Yaml)?, defaults);

        let credentials = CredentialsConfig::default();
        let yaml = to_yaml(&credentials)?;
        assert_eq!(parse_credentials(&yaml, DocumentFormat::Yaml)?, credentials);
        Ok(())
    }

    #[test]
    fn pretty_json_ends_with_newline() -> Result<(), Box<dyn Error>> {
        let output = to_pretty_json(&CredentialsConfig::default())?;
        assert!(output.ends_with("}\n"));
        assert!(output.contains("\"api_key_env\": \"GEMINI_API_KEY\""));
        Ok(())
    }

    #[test]
    fn validation_failures_surface_as_invalid_fields() -> Result<(), Box<dyn Error>> {
        let error = parse_parameters("llm:\n  temperature: 9\n", DocumentFormat::Yaml)
            .err()
            .ok_or_else(|| std::io::Error::other("expected invalid fields"))?;
        assert_eq!(error.code, ErrorCode::config("invalid_fields"));
        assert_eq!(error.metadata_value("document"), Some("parameters"));
        assert_eq!(error.metadata_value("fields"), Some("llm.temperature"));
        Ok(())
    }

    #[test]
    fn list_root_fails_for_every_loader() {
        let text = "- 1\n- 2\n";
        let schema_error = ErrorCode::config("schema_error");
        assert!(matches!(
            parse_parameters(text, DocumentFormat::Yaml),
            Err(error) if error.code == schema_error
        ));
        assert!(matches!(
            parse_credentials(text, DocumentFormat::Yaml),
            Err(error) if error.code == schema_error
        ));
    }
}
