use job_posting_dq_shared::{ErrorCode, ErrorEnvelope, ErrorKind};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    Ok = 0,
    InvalidInput = 2,
    Io = 3,
    Internal = 1,
}

impl ExitCode {
    #[must_use]
    pub const fn as_u8(self) -> u8 {
        self as u8
    }

    /// Exit code for a failure reported by the config layer.
    pub fn for_envelope(error: &ErrorEnvelope) -> Self {
        let code = &error.code;
        if *code == ErrorCode::config("io") || *code == ErrorCode::config("permission_denied") {
            return Self::Io;
        }
        match (error.kind, code.namespace()) {
            (ErrorKind::Expected, "config") => Self::InvalidInput,
            (_, "core") if *code != ErrorCode::internal() => Self::Io,
            _ => Self::Internal,
        }
    }
}

#[derive(Debug)]
pub enum CliError {
    Envelope(ErrorEnvelope),
    Io(std::io::Error),
    Serialization(serde_json::Error),
}

impl CliError {
    #[must_use]
    pub fn exit_code(&self) -> ExitCode {
        match self {
            Self::Envelope(error) => ExitCode::for_envelope(error),
            Self::Io(_) => ExitCode::Io,
            Self::Serialization(_) => ExitCode::Internal,
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Envelope(error) => write!(formatter, "{error}"),
            Self::Io(error) => write!(formatter, "io error: {error}"),
            Self::Serialization(error) => write!(formatter, "serialization error: {error}"),
        }
    }
}

impl std::error::Error for CliError {}

impl From<ErrorEnvelope> for CliError {
    fn from(error: ErrorEnvelope) -> Self {
        Self::Envelope(error)
    }
}

impl From<std::io::Error> for CliError {
    fn from(error: std::io::Error) -> Self {
        Self::Io(error)
    }
}

impl From<serde_json::Error> for CliError {
    fn from(error: serde_json::Error) -> Self {
        Self::Serialization(error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_errors_are_invalid_input() {
        let error = ErrorEnvelope::expected(ErrorCode::config("invalid_fields"), "bad");
        assert_eq!(ExitCode::for_envelope(&error), ExitCode::InvalidInput);

        let error = ErrorEnvelope::expected(ErrorCode::config("missing_environment"), "unset");
        assert_eq!(CliError::from(error).exit_code(), ExitCode::InvalidInput);
    }

    #[test]
    fn filesystem_errors_are_io() {
        let error = ErrorEnvelope::expected(ErrorCode::config("permission_denied"), "denied");
        assert_eq!(ExitCode::for_envelope(&error), ExitCode::Io);

        let error = ErrorEnvelope::from(std::io::Error::from(std::io::ErrorKind::PermissionDenied));
        assert_eq!(ExitCode::for_envelope(&error), ExitCode::Io);
    }

    #[test]
    fn everything_else_is_internal() {
        let error = ErrorEnvelope::unexpected(ErrorCode::internal(), "bug");
        assert_eq!(ExitCode::for_envelope(&error), ExitCode::Internal);
        assert_eq!(ExitCode::Internal.as_u8(), 1);
    }
}
