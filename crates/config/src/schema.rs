//! Table-driven schema validation over raw documents.
//!
//! A schema is a static table of [`FieldSpec`]s per section. The engine walks
//! the table in order, coerces each present value, writes it into a
//! default-initialized target, and records every failure as a
//! [`FieldError`] instead of stopping at the first one. Callers turn a
//! non-empty error list into a [`FieldValidationError`] and discard the
//! partially built target.

use crate::document::describe_value;
use job_posting_dq_shared::{ErrorCode, ErrorEnvelope};
use serde_yaml_ng::{Mapping, Value};
use std::fmt;
use tracing::{error, warn};

/// One invalid field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    /// Dotted path of the field (`llm.temperature`).
    pub path: String,
    /// Why the value was rejected.
    pub reason: String,
}

impl FieldError {
    /// Build a field error.
    pub fn new(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}: {}", self.path, self.reason)
    }
}

/// Every invalid field of one document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldValidationError {
    /// Kind of document (`parameters`, `credentials`).
    pub document: &'static str,
    /// Where the document came from.
    pub origin: String,
    /// All failures, in schema order.
    pub errors: Vec<FieldError>,
}

impl FieldValidationError {
    /// Paths of every invalid field.
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.errors.iter().map(|error| error.path.as_str())
    }

    /// Reason recorded for `path`, if it failed.
    #[must_use]
    pub fn reason_for(&self, path: &str) -> Option<&str> {
        self.errors
            .iter()
            .find(|error| error.path == path)
            .map(|error| error.reason.as_str())
    }
}

impl fmt::Display for FieldValidationError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            formatter,
            "invalid {} document {} ({} field error{})",
            self.document,
            self.origin,
            self.errors.len(),
            if self.errors.len() == 1 { "" } else { "s" }
        )?;
        for (index, error) in self.errors.iter().enumerate() {
            let separator = if index == 0 { ": " } else { "; " };
            write!(formatter, "{separator}{error}")?;
        }
        Ok(())
    }
}

impl std::error::Error for FieldValidationError {}

impl From<FieldValidationError> for ErrorEnvelope {
    fn from(error: FieldValidationError) -> Self {
        let fields = error.fields().collect::<Vec<_>>().join(",");
        let mut envelope = Self::expected(ErrorCode::config("invalid_fields"), error.to_string())
            .with_metadata("document", error.document)
            .with_metadata("source", error.origin.clone())
            .with_metadata("fields", fields);
        for field in error.errors {
            envelope = envelope.with_metadata(format!("field.{}", field.path), field.reason);
        }
        envelope
    }
}

/// How a section treats keys missing from its table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnknownKeys {
    /// Each unknown key is a field error.
    Reject,
    /// Unknown keys are ignored with a warning.
    Tolerate,
}

/// Coercion and validation applied to one field.
pub enum FieldRule<S> {
    /// Plain string.
    Text(fn(&mut S, String)),
    /// String or null.
    OptionalText(fn(&mut S, Option<String>)),
    /// Boolean in any accepted encoding.
    Bool(fn(&mut S, bool)),
    /// Float constrained to a closed interval.
    FloatInRange {
        /// Inclusive lower bound.
        min: f64,
        /// Inclusive upper bound.
        max: f64,
        /// Setter.
        set: fn(&mut S, f64),
    },
    /// Integer with a lower bound.
    Count {
        /// Inclusive lower bound.
        min: u32,
        /// When `true`, an explicit null keeps the default.
        null_keeps_default: bool,
        /// Setter.
        set: fn(&mut S, u32),
    },
    /// Field-specific conversion returning a rejection reason.
    Custom(fn(&mut S, &Value) -> Result<(), String>),
    /// Sub-section; receives the field path and the shared error list.
    Nested(fn(&mut S, &Value, &str, &mut Vec<FieldError>)),
}

/// A key and the rule that reads it.
pub struct FieldSpec<S> {
    /// Key as written in the document.
    pub key: &'static str,
    /// Rule applied when the key is present.
    pub rule: FieldRule<S>,
}

/// Read a section value (mapping or null) into a fresh `S`.
///
/// Null reads as an empty mapping. Any other non-mapping records an error on
/// `path` and yields `S::default()`.
pub fn read_section<S: Default>(
    value: &Value,
    path: &str,
    fields: &[FieldSpec<S>],
    policy: UnknownKeys,
    errors: &mut Vec<FieldError>,
) -> S {
    match value {
        Value::Mapping(mapping) => read_mapping(mapping, path, fields, policy, errors),
        Value::Null => read_mapping(&Mapping::new(), path, fields, policy, errors),
        other => {
            errors.push(FieldError::new(
                path,
                format!("expected a mapping, got {}", describe_value(other)),
            ));
            S::default()
        },
    }
}

/// Read a mapping into a fresh `S` using `fields`.
pub fn read_mapping<S: Default>(
    mapping: &Mapping,
    path: &str,
    fields: &[FieldSpec<S>],
    policy: UnknownKeys,
    errors: &mut Vec<FieldError>,
) -> S {
    let mut target = S::default();
    for spec in fields {
        if let Some(value) = mapping.get(spec.key) {
            let field_path = child_path(path, spec.key);
            apply_rule(&mut target, &spec.rule, value, &field_path, errors);
        }
    }

    let unknown = mapping
        .keys()
        .map(key_label)
        .filter(|key| !fields.iter().any(|spec| spec.key == key.as_str()))
        .collect::<Vec<_>>();
    if !unknown.is_empty() {
        match policy {
            UnknownKeys::Reject => {
                for key in unknown {
                    errors.push(FieldError::new(child_path(path, &key), "unknown field"));
                }
            },
            UnknownKeys::Tolerate => {
                let keys = unknown.join(",");
                warn!(section = path, keys = %keys, "ignoring unknown config keys");
            },
        }
    }

    target
}

/// Turn collected errors into the final outcome for one document.
pub fn finish<T>(
    document: &'static str,
    origin: &str,
    errors: Vec<FieldError>,
    value: T,
) -> Result<T, FieldValidationError> {
    if errors.is_empty() {
        return Ok(value);
    }
    let error = FieldValidationError {
        document,
        origin: origin.to_string(),
        errors,
    };
    let fields = error.fields().collect::<Vec<_>>().join(",");
    error!(
        document,
        source = origin,
        fields = %fields,
        "config validation failed"
    );
    Err(error)
}

fn apply_rule<S>(
    target: &mut S,
    rule: &FieldRule<S>,
    value: &Value,
    path: &str,
    errors: &mut Vec<FieldError>,
) {
    let outcome = match rule {
        FieldRule::Text(set) => coerce_string(value).map(|text| set(target, text)),
        FieldRule::OptionalText(set) => {
            coerce_optional_string(value).map(|text| set(target, text))
        },
        FieldRule::Bool(set) => coerce_bool(value).map(|flag| set(target, flag)),
        FieldRule::FloatInRange { min, max, set } => coerce_float(value)
            .and_then(|number| check_range(number, *min, *max))
            .map(|number| set(target, number)),
        FieldRule::Count {
            min,
            null_keeps_default,
            set,
        } => {
            if value.is_null() && *null_keeps_default {
                Ok(())
            } else {
                coerce_count(value, *min).map(|count| set(target, count))
            }
        },
        FieldRule::Custom(convert) => convert(target, value),
        FieldRule::Nested(read) => {
            read(target, value, path, errors);
            Ok(())
        },
    };
    if let Err(reason) = outcome {
        errors.push(FieldError::new(path, reason));
    }
}

/// Join a parent path and a key with a dot.
#[must_use]
pub fn child_path(parent: &str, key: &str) -> String {
    if parent.is_empty() {
        key.to_string()
    } else {
        format!("{parent}.{key}")
    }
}

fn key_label(key: &Value) -> String {
    match key {
        Value::String(text) => text.clone(),
        Value::Number(number) => number.to_string(),
        Value::Bool(flag) => flag.to_string(),
        other => format!("<{}>", describe_value(other)),
    }
}

fn check_range(number: f64, min: f64, max: f64) -> Result<f64, String> {
    if (min..=max).contains(&number) {
        Ok(number)
    } else {
        Err(format!("must be within [{min:?}, {max:?}] (got {number})"))
    }
}

/// Accept only YAML strings.
pub fn coerce_string(value: &Value) -> Result<String, String> {
    match value {
        Value::String(text) => Ok(text.clone()),
        other => Err(format!("expected a string, got {}", describe_value(other))),
    }
}

/// Accept strings or null.
pub fn coerce_optional_string(value: &Value) -> Result<Option<String>, String> {
    match value {
        Value::Null => Ok(None),
        other => coerce_string(other).map(Some),
    }
}

/// Accept booleans, boolean words, and the integers `0`/`1`.
pub fn coerce_bool(value: &Value) -> Result<bool, String> {
    match value {
        Value::Bool(flag) => Ok(*flag),
        Value::String(text) => match text.trim().to_ascii_lowercase().as_str() {
            "true" | "yes" | "on" | "1" => Ok(true),
            "false" | "no" | "off" | "0" => Ok(false),
            _ => Err(format!("expected a boolean (got {text:?})")),
        },
        Value::Number(number) => match number.as_u64() {
            Some(0) => Ok(false),
            Some(1) => Ok(true),
            _ => Err(format!("expected a boolean (got {number})")),
        },
        other => Err(format!("expected a boolean, got {}", describe_value(other))),
    }
}

/// Accept floats, integers, and numeric strings.
pub fn coerce_float(value: &Value) -> Result<f64, String> {
    match value {
        Value::Number(number) => number
            .as_f64()
            .ok_or_else(|| format!("expected a number (got {number})")),
        Value::String(text) => text
            .trim()
            .parse::<f64>()
            .map_err(|_| format!("expected a number (got {text:?})")),
        other => Err(format!("expected a number, got {}", describe_value(other))),
    }
}

/// Accept integers, whole-number floats (`4.0`), and numeric strings.
pub fn coerce_integer(value: &Value) -> Result<i64, String> {
    match value {
        Value::Number(number) => {
            if let Some(integer) = number.as_i64() {
                Ok(integer)
            } else if number.as_u64().is_some() {
                Err(format!("integer out of range (got {number})"))
            } else if let Some(integer) = number.as_f64().and_then(whole_float) {
                Ok(integer)
            } else {
                Err(format!("expected an integer (got {number})"))
            }
        },
        Value::String(text) => text
            .trim()
            .parse::<i64>()
            .map_err(|_| format!("expected an integer (got {text:?})")),
        other => Err(format!("expected an integer, got {}", describe_value(other))),
    }
}

#[expect(
    clippy::cast_possible_truncation,
    reason = "the value is whole and inside the i64 range before the cast"
)]
fn whole_float(float: f64) -> Option<i64> {
    // 2^63, the first float past i64::MAX.
    const BOUND: f64 = 9_223_372_036_854_775_808.0;
    (float.fract() == 0.0 && (-BOUND..BOUND).contains(&float)).then(|| float as i64)
}

fn coerce_count(value: &Value, min: u32) -> Result<u32, String> {
    let integer = coerce_integer(value)?;
    if integer < i64::from(min) {
        return Err(if min == 1 {
            format!("must be > 0 (got {integer})")
        } else {
            format!("must be >= {min} (got {integer})")
        });
    }
    u32::try_from(integer).map_err(|_| format!("must be <= {} (got {integer})", u32::MAX))
}

/// Canonicalize a row limit.
///
/// Null, the word `all` (any case), and non-positive integers all mean "no
/// limit" (`None`); positive integers and numeric strings become `Some(n)`.
///
/// # Examples
///
/// ```
/// use job_posting_dq_config::schema::parse_row_limit;
/// use serde_yaml_ng::Value;
///
/// assert_eq!(parse_row_limit(&Value::Null), Ok(None));
/// assert_eq!(parse_row_limit(&Value::from(" ALL ")), Ok(None));
/// assert_eq!(parse_row_limit(&Value::from(-3)), Ok(None));
/// assert_eq!(parse_row_limit(&Value::from("250")), Ok(Some(250)));
/// assert!(parse_row_limit(&Value::from("lots")).is_err());
/// ```
pub fn parse_row_limit(value: &Value) -> Result<Option<u64>, String> {
    let rejected = || {
        format!(
            "must be \"all\", null, or an integer (got {})",
            match value {
                Value::String(text) => format!("{text:?}"),
                Value::Number(number) => number.to_string(),
                other => describe_value(other).to_string(),
            }
        )
    };
    match value {
        Value::Null => Ok(None),
        Value::String(text) => {
            let text = text.trim();
            if text.eq_ignore_ascii_case("all") {
                Ok(None)
            } else if let Ok(limit) = text.parse::<u64>() {
                Ok(positive(limit))
            } else if let Some(digits) = text.strip_prefix('-') {
                if is_digits(digits) { Ok(None) } else { Err(rejected()) }
            } else if is_digits(text.strip_prefix('+').unwrap_or(text)) {
                Err(format!("integer out of range (got {text:?})"))
            } else {
                Err(rejected())
            }
        },
        Value::Number(number) => {
            if let Some(limit) = number.as_u64() {
                Ok(positive(limit))
            } else if number.as_i64().is_some() {
                Ok(None)
            } else {
                match number.as_f64().and_then(whole_float) {
                    Some(limit) => Ok(u64::try_from(limit).ok().and_then(positive)),
                    None => Err(rejected()),
                }
            }
        },
        _ => Err(rejected()),
    }
}

fn is_digits(text: &str) -> bool {
    !text.is_empty() && text.bytes().all(|byte| byte.is_ascii_digit())
}

const fn positive(limit: u64) -> Option<u64> {
    if limit == 0 { None } else { Some(limit) }
}
