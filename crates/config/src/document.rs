//! Structured-text loading into a raw document tree.
//!
//! Every configuration file goes through the same pipeline: read as UTF-8,
//! drop a leading byte-order mark, [`sanitize_text`], parse by format, then
//! insist that the root is a mapping. YAML, JSON, and TOML all land in the
//! same [`serde_yaml_ng::Value`] tree so later stages only ever see one
//! representation.

use crate::sanitize::sanitize_text;
use job_posting_dq_shared::{ErrorCode, ErrorEnvelope};
use serde_yaml_ng::{Mapping, Value};
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Origin label used for documents parsed from in-memory text.
pub const INLINE_ORIGIN: &str = "<inline>";

/// Supported structured-text encodings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentFormat {
    /// YAML (`.yaml`, `.yml`, or no extension).
    Yaml,
    /// JSON (`.json`).
    Json,
    /// TOML (`.toml`).
    Toml,
}

impl DocumentFormat {
    /// Detect the format from a file extension.
    pub fn from_path(path: &Path) -> Result<Self, DocumentError> {
        let extension = path
            .extension()
            .and_then(|value| value.to_str())
            .map(str::to_ascii_lowercase);
        match extension.as_deref() {
            None | Some("yaml" | "yml") => Ok(Self::Yaml),
            Some("json") => Ok(Self::Json),
            Some("toml") => Ok(Self::Toml),
            Some(other) => Err(DocumentError::UnsupportedFormat {
                path: path.to_path_buf(),
                extension: other.to_string(),
            }),
        }
    }

    /// Lowercase format label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Yaml => "yaml",
            Self::Json => "json",
            Self::Toml => "toml",
        }
    }
}

impl fmt::Display for DocumentFormat {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// A parsed document whose root is known to be a mapping.
///
/// Transient: built by the loader, possibly rewritten by compatibility
/// rules, then consumed by a validator.
#[derive(Debug, Clone, PartialEq)]
pub struct RawDocument {
    origin: Box<str>,
    root: Mapping,
}

impl RawDocument {
    /// Wrap an already-parsed root mapping.
    pub fn new(origin: impl Into<Box<str>>, root: Mapping) -> Self {
        Self {
            origin: origin.into(),
            root,
        }
    }

    /// Where the document came from (a path, or [`INLINE_ORIGIN`]).
    #[must_use]
    pub fn origin(&self) -> &str {
        &self.origin
    }

    /// The root mapping.
    #[must_use]
    pub const fn root(&self) -> &Mapping {
        &self.root
    }

    /// Look up a top-level key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.root.get(key)
    }

    pub(crate) const fn root_mut(&mut self) -> &mut Mapping {
        &mut self.root
    }

    /// Consume the document, returning the root mapping.
    #[must_use]
    pub fn into_root(self) -> Mapping {
        self.root
    }
}

/// Failures while turning a file into a [`RawDocument`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentError {
    /// The file does not exist.
    NotFound {
        /// Requested path.
        path: PathBuf,
    },
    /// Any other I/O failure while reading.
    Io {
        /// Requested path.
        path: PathBuf,
        /// Underlying I/O error kind.
        kind: io::ErrorKind,
        /// Human-readable reason.
        reason: String,
    },
    /// The file extension names no supported format.
    UnsupportedFormat {
        /// Requested path.
        path: PathBuf,
        /// Lowercased extension.
        extension: String,
    },
    /// The text is not well-formed for its format.
    Parse {
        /// Document origin.
        origin: String,
        /// Format used to parse.
        format: DocumentFormat,
        /// Parser message.
        reason: String,
    },
    /// The root parsed to a scalar or a sequence.
    RootNotMapping {
        /// Document origin.
        origin: String,
        /// Description of the value found at the root.
        found: &'static str,
    },
}

impl DocumentError {
    fn error_code(&self) -> ErrorCode {
        match self {
            Self::NotFound { .. } => ErrorCode::config("not_found"),
            Self::Io { kind, .. } if *kind == io::ErrorKind::PermissionDenied => {
                ErrorCode::config("permission_denied")
            },
            Self::Io { .. } => ErrorCode::config("io"),
            Self::UnsupportedFormat { .. } => ErrorCode::config("unsupported_format"),
            Self::Parse { .. } => ErrorCode::config("parse_error"),
            Self::RootNotMapping { .. } => ErrorCode::config("schema_error"),
        }
    }
}

impl fmt::Display for DocumentError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound { path } => {
                write!(formatter, "config file not found: {}", path.display())
            },
            Self::Io { path, reason, .. } => {
                write!(formatter, "failed to read {}: {reason}", path.display())
            },
            Self::UnsupportedFormat { extension, .. } => write!(
                formatter,
                "unsupported config format `.{extension}`; use .yaml, .yml, .json or .toml"
            ),
            Self::Parse {
                origin,
                format,
                reason,
            } => write!(formatter, "{origin}: invalid {format}: {reason}"),
            Self::RootNotMapping { origin, found } => {
                write!(formatter, "{origin}: root must be a mapping (got {found})")
            },
        }
    }
}

impl std::error::Error for DocumentError {}

impl From<DocumentError> for ErrorEnvelope {
    fn from(error: DocumentError) -> Self {
        let envelope = Self::expected(error.error_code(), error.to_string());
        match error {
            DocumentError::NotFound { path } | DocumentError::Io { path, .. } => {
                envelope.with_metadata("path", path.to_string_lossy().to_string())
            },
            DocumentError::UnsupportedFormat { path, extension } => envelope
                .with_metadata("path", path.to_string_lossy().to_string())
                .with_metadata("extension", extension),
            DocumentError::Parse { origin, format, .. } => envelope
                .with_metadata("source", origin)
                .with_metadata("format", format.as_str()),
            DocumentError::RootNotMapping { origin, found } => envelope
                .with_metadata("source", origin)
                .with_metadata("section", "<root>")
                .with_metadata("found", found),
        }
    }
}

/// Read, sanitize, and parse a configuration file.
pub fn load_document(path: &Path) -> Result<RawDocument, DocumentError> {
    let format = DocumentFormat::from_path(path)?;
    let text = read_text(path)?;
    let origin = path.to_string_lossy();
    let document = parse_document(&text, format, &origin)?;
    debug!(
        path = %path.display(),
        format = format.as_str(),
        keys = document.root().len(),
        "loaded config document"
    );
    Ok(document)
}

/// Sanitize and parse in-memory text.
///
/// A leading byte-order mark is dropped; an empty or comment-only document
/// yields an empty mapping.
pub fn parse_document(
    text: &str,
    format: DocumentFormat,
    origin: &str,
) -> Result<RawDocument, DocumentError> {
    let text = text.strip_prefix('\u{FEFF}').unwrap_or(text);
    let text = sanitize_text(text);
    let parse_error = |reason: String| DocumentError::Parse {
        origin: origin.to_string(),
        format,
        reason,
    };

    let value = match format {
        DocumentFormat::Yaml => {
            let mut value: Value =
                serde_yaml_ng::from_str(&text).map_err(|error| parse_error(error.to_string()))?;
            value
                .apply_merge()
                .map_err(|error| parse_error(error.to_string()))?;
            value
        },
        DocumentFormat::Json => {
            serde_json::from_str::<Value>(&text).map_err(|error| parse_error(error.to_string()))?
        },
        DocumentFormat::Toml => {
            toml::from_str::<Value>(&text).map_err(|error| parse_error(error.to_string()))?
        },
    };

    match value {
        Value::Null => Ok(RawDocument::new(origin, Mapping::new())),
        Value::Mapping(root) => Ok(RawDocument::new(origin, root)),
        other => Err(DocumentError::RootNotMapping {
            origin: origin.to_string(),
            found: describe_value(&other),
        }),
    }
}

/// Short type description of a document value, for error messages.
#[must_use]
pub const fn describe_value(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Sequence(_) => "a sequence",
        Value::Mapping(_) => "a mapping",
        Value::Tagged(_) => "a tagged value",
    }
}

fn read_text(path: &Path) -> Result<String, DocumentError> {
    std::fs::read_to_string(path).map_err(|error| match error.kind() {
        io::ErrorKind::NotFound => DocumentError::NotFound {
            path: path.to_path_buf(),
        },
        io::ErrorKind::InvalidData => DocumentError::Parse {
            origin: path.to_string_lossy().to_string(),
            format: DocumentFormat::from_path(path).unwrap_or(DocumentFormat::Yaml),
            reason: "file is not valid UTF-8".to_string(),
        },
        kind => DocumentError::Io {
            path: path.to_path_buf(),
            kind,
            reason: error.to_string(),
        },
    })
}
