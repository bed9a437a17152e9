//! Prompt-template store.
//!
//! Two document shapes are supported: a multi-template document with `meta`
//! and `prompts` mappings, and a single-prompt document holding one system
//! prompt string.

use crate::document::{RawDocument, describe_value};
use crate::sanitize::sanitize_text;
use job_posting_dq_shared::{ErrorCode, ErrorEnvelope};
use serde::Serialize;
use serde_yaml_ng::Value;
use std::collections::BTreeMap;
use std::fmt;
use tracing::debug;

/// Accepted keys for the single-prompt document, in lookup order.
pub const SYSTEM_PROMPT_KEYS: [&str; 2] = ["System Prompt", "system_prompt"];

/// Named prompt templates, sanitized and read-only after load.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct PromptTemplates(BTreeMap<String, String>);

impl PromptTemplates {
    /// Template body for `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// Template body for `key`, or [`PromptsError::UnknownPromptKey`].
    pub fn require(&self, key: &str) -> Result<&str, PromptsError> {
        self.get(key).ok_or_else(|| PromptsError::UnknownPromptKey {
            key: key.to_string(),
            available: self.keys().map(str::to_string).collect(),
        })
    }

    /// Template keys in sorted order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// `(key, body)` pairs in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(key, body)| (key.as_str(), body.as_str()))
    }

    /// Number of templates.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// `true` when no templates were loaded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Structural problems in prompt documents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptsError {
    /// A required top-level mapping is absent.
    MissingSection {
        /// Document origin.
        origin: String,
        /// Section name (`meta` or `prompts`).
        section: &'static str,
    },
    /// A required top-level key holds something other than a mapping.
    NotAMapping {
        /// Document origin.
        origin: String,
        /// Section name.
        section: &'static str,
        /// What was found instead.
        found: &'static str,
    },
    /// A `prompts` entry is not a string-to-string pair.
    EntryNotString {
        /// Document origin.
        origin: String,
        /// Offending key, rendered as text.
        key: String,
        /// Type of the offending key or value.
        found: &'static str,
    },
    /// The single-prompt document has no usable system prompt.
    MissingSystemPrompt {
        /// Document origin.
        origin: String,
    },
    /// A selected template key is not in the map.
    UnknownPromptKey {
        /// Requested key.
        key: String,
        /// Keys that do exist.
        available: Vec<String>,
    },
}

impl fmt::Display for PromptsError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingSection { origin, section } => {
                write!(formatter, "{origin}: missing required `{section}` mapping")
            },
            Self::NotAMapping {
                origin,
                section,
                found,
            } => write!(formatter, "{origin}: `{section}` must be a mapping (got {found})"),
            Self::EntryNotString { origin, key, found } => write!(
                formatter,
                "{origin}: prompts must map strings to strings (key `{key}` has {found})"
            ),
            Self::MissingSystemPrompt { origin } => write!(
                formatter,
                "{origin}: must contain a non-empty `System Prompt` string"
            ),
            Self::UnknownPromptKey { key, available } => write!(
                formatter,
                "prompt key `{key}` not found (available: {})",
                available.join(", ")
            ),
        }
    }
}

impl std::error::Error for PromptsError {}

impl From<PromptsError> for ErrorEnvelope {
    fn from(error: PromptsError) -> Self {
        let message = error.to_string();
        match error {
            PromptsError::MissingSection { origin, section }
            | PromptsError::NotAMapping {
                origin, section, ..
            } => Self::expected(ErrorCode::config("schema_error"), message)
                .with_metadata("source", origin)
                .with_metadata("section", section),
            PromptsError::EntryNotString { origin, key, .. } => {
                Self::expected(ErrorCode::config("schema_error"), message)
                    .with_metadata("source", origin)
                    .with_metadata("section", "prompts")
                    .with_metadata("key", key)
            },
            PromptsError::MissingSystemPrompt { origin } => {
                Self::expected(ErrorCode::config("schema_error"), message)
                    .with_metadata("source", origin)
                    .with_metadata("key", SYSTEM_PROMPT_KEYS[0])
            },
            PromptsError::UnknownPromptKey { key, .. } => {
                Self::expected(ErrorCode::config("unknown_prompt_key"), message)
                    .with_metadata("key", key)
            },
        }
    }
}

/// Build the template map from a `meta` + `prompts` document.
///
/// Every template body is sanitized again, since hostile whitespace can
/// hide inside quoted strings that the file-level pass left intact.
pub fn prompt_templates_from_document(
    document: &RawDocument,
) -> Result<PromptTemplates, PromptsError> {
    require_mapping(document, "meta")?;
    let prompts = require_mapping(document, "prompts")?;

    let mut templates = BTreeMap::new();
    for (key, value) in prompts {
        let key_text = match key {
            Value::String(text) => text.clone(),
            other => {
                return Err(PromptsError::EntryNotString {
                    origin: document.origin().to_string(),
                    key: render_key(other),
                    found: describe_value(other),
                });
            },
        };
        let Value::String(body) = value else {
            return Err(PromptsError::EntryNotString {
                origin: document.origin().to_string(),
                key: key_text,
                found: describe_value(value),
            });
        };
        templates.insert(key_text, sanitize_text(body).into_owned());
    }

    debug!(
        source = document.origin(),
        templates = templates.len(),
        "loaded prompt templates"
    );
    Ok(PromptTemplates(templates))
}

/// Extract the system prompt from a single-prompt document.
///
/// `System Prompt` wins over `system_prompt`; a null value counts as
/// absent. The body is returned as written, without trimming.
pub fn system_prompt_from_document(document: &RawDocument) -> Result<String, PromptsError> {
    let value = SYSTEM_PROMPT_KEYS
        .iter()
        .find_map(|key| document.get(key).filter(|value| !value.is_null()));
    match value {
        Some(Value::String(prompt)) if !prompt.trim().is_empty() => Ok(prompt.clone()),
        _ => Err(PromptsError::MissingSystemPrompt {
            origin: document.origin().to_string(),
        }),
    }
}

fn require_mapping<'a>(
    document: &'a RawDocument,
    section: &'static str,
) -> Result<&'a serde_yaml_ng::Mapping, PromptsError> {
    match document.get(section) {
        None | Some(Value::Null) => Err(PromptsError::MissingSection {
            origin: document.origin().to_string(),
            section,
        }),
        Some(Value::Mapping(mapping)) => Ok(mapping),
        Some(other) => Err(PromptsError::NotAMapping {
            origin: document.origin().to_string(),
            section,
            found: describe_value(other),
        }),
    }
}

fn render_key(key: &Value) -> String {
    match key {
        Value::Number(number) => number.to_string(),
        Value::Bool(flag) => flag.to_string(),
        other => format!("<{}>", describe_value(other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{DocumentFormat, INLINE_ORIGIN, parse_document};
    use std::error::Error;

    fn document(text: &str) -> Result<RawDocument, Box<dyn Error>> {
        Ok(parse_document(text, DocumentFormat::Yaml, INLINE_ORIGIN)?)
    }

    #[test]
    fn loads_and_sanitizes_templates() -> Result<(), Box<dyn Error>> {
        let text = "meta:\n  version: 1\nprompts:\n  eval: \"Rate\\u00A0this\\r\\n\"\n  other: plain\n";
        let templates = prompt_templates_from_document(&document(text)?)?;
        assert_eq!(templates.len(), 2);
        assert_eq!(templates.get("eval"), Some("Rate this\n"));
        assert_eq!(templates.keys().collect::<Vec<_>>(), vec!["eval", "other"]);
        assert_eq!(templates.require("other")?, "plain");
        Ok(())
    }

    #[test]
    fn missing_meta_is_a_schema_error() -> Result<(), Box<dyn Error>> {
        let error = prompt_templates_from_document(&document("prompts:\n  a: b\n")?)
            .err()
            .ok_or_else(|| std::io::Error::other("expected missing meta"))?;
        assert_eq!(
            error,
            PromptsError::MissingSection {
                origin: INLINE_ORIGIN.to_string(),
                section: "meta",
            }
        );
        let envelope = ErrorEnvelope::from(error);
        assert_eq!(envelope.code, ErrorCode::config("schema_error"));
        assert_eq!(envelope.metadata_value("section"), Some("meta"));
        Ok(())
    }

    #[test]
    fn prompts_must_be_a_mapping() -> Result<(), Box<dyn Error>> {
        let result = prompt_templates_from_document(&document("meta: {}\nprompts: [a]\n")?);
        assert!(matches!(
            result,
            Err(PromptsError::NotAMapping {
                section: "prompts",
                found: "a sequence",
                ..
            })
        ));
        Ok(())
    }

    #[test]
    fn non_string_template_names_the_key() -> Result<(), Box<dyn Error>> {
        let error = prompt_templates_from_document(&document("meta: {}\nprompts:\n  good: ok\n  bad: 3\n")?)
            .err()
            .ok_or_else(|| std::io::Error::other("expected entry error"))?;
        assert!(matches!(&error, PromptsError::EntryNotString { key, .. } if key == "bad"));
        let envelope = ErrorEnvelope::from(error);
        assert_eq!(envelope.metadata_value("key"), Some("bad"));
        Ok(())
    }

    #[test]
    fn unknown_prompt_key_lists_available_keys() -> Result<(), Box<dyn Error>> {
        let templates = prompt_templates_from_document(&document("meta: {}\nprompts:\n  a: x\n")?)?;
        let error = templates
            .require("missing")
            .err()
            .ok_or_else(|| std::io::Error::other("expected unknown key"))?;
        assert!(error.to_string().contains("available: a"));
        let envelope = ErrorEnvelope::from(error);
        assert_eq!(envelope.code, ErrorCode::config("unknown_prompt_key"));
        assert_eq!(envelope.metadata_value("key"), Some("missing"));
        Ok(())
    }

    #[test]
    fn system_prompt_accepts_both_spellings() -> Result<(), Box<dyn Error>> {
        let prompt = system_prompt_from_document(&document("System Prompt: |\n  Be strict.\n")?)?;
        assert_eq!(prompt, "Be strict.\n");

        let prompt = system_prompt_from_document(&document("system_prompt: Be kind.\n")?)?;
        assert_eq!(prompt, "Be kind.");

        let prompt = system_prompt_from_document(&document(
            "System Prompt: ~\nsystem_prompt: fallback\n",
        )?)?;
        assert_eq!(prompt, "fallback");
        Ok(())
    }

    #[test]
    fn blank_or_missing_system_prompt_fails() -> Result<(), Box<dyn Error>> {
        for text in ["{}", "System Prompt: \"   \"\n", "system_prompt: 42\n"] {
            let result = system_prompt_from_document(&document(text)?);
            assert!(
                matches!(result, Err(PromptsError::MissingSystemPrompt { .. })),
                "{text}"
            );
        }
        Ok(())
    }
}
