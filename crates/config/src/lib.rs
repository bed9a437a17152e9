//! # job-posting-dq-config
//!
//! Configuration loading, validation, and normalization for the job-posting
//! data-quality pipeline.
//!
//! Load order for every document:
//! sanitize text, parse to a raw tree, apply compatibility rewrites, then
//! validate against a table-driven schema that reports every invalid field.
//! This crate depends on `shared` only.

/// Backward-compatibility rewrites on raw documents.
pub mod compat;
/// Credentials document schema.
pub mod credentials;
/// Output and working directory creation.
pub mod dirs;
/// Structured-text parsing into raw documents.
pub mod document;
/// Environment resolution for LLM client settings.
pub mod env;
/// JSON Schema exports.
pub mod json_schema;
/// File-level loaders.
pub mod load;
/// Parameters document schema.
pub mod parameters;
/// Prompt-template store.
pub mod prompts;
/// Invisible-whitespace sanitizer.
pub mod sanitize;
/// Table-driven schema validation engine.
pub mod schema;

pub use compat::{CompatRule, PARAMETERS_COMPAT_RULES, apply_compat_rules, apply_parameters_compat};
pub use credentials::{CredentialsConfig, GeminiConfig, GeminiRequestConfig};
pub use dirs::{WORKING_DIRS, ensure_dirs, ensure_dirs_in, ensure_parent_dir, required_dirs};
pub use document::{DocumentError, DocumentFormat, RawDocument, load_document, parse_document};
pub use env::{
    ENV_GEMINI_MODEL, EnvError, EnvSnapshot, GeminiClientSettings, RequestTimings,
    resolve_gemini_settings, resolve_gemini_settings_std_env, resolve_model_name,
};
pub use json_schema::{credentials_schema, parameters_schema};
pub use load::{
    DEFAULT_CREDENTIALS_PATH, DEFAULT_PARAMETERS_PATH, DEFAULT_PROMPT_PATH, DEFAULT_PROMPTS_PATH,
    load_credentials, load_parameters, load_prompt_templates, load_system_prompt,
    parse_credentials, parse_parameters, to_pretty_json, to_yaml,
};
pub use parameters::{InputsConfig, LlmConfig, OutputsConfig, ParametersConfig, ProjectConfig};
pub use prompts::{PromptTemplates, PromptsError};
pub use sanitize::sanitize_text;
pub use schema::{FieldError, FieldValidationError};

/// Returns the config crate version.
#[must_use]
pub const fn config_crate_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
