//! Machine-readable failures. Every error that reaches the CLI boundary is printed as a
//! `{"ok": false, "error": {...}}` envelope on stderr, and its kind picks the exit status.

use std::fmt;

use anyhow::Error;
use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CodedErrorKind {
    /// Bad command-line input: unknown category, malformed `KEY=VALUE`, missing prompt.
    Usage,
    /// A grammar file or prompt store that exists but does not hold valid data.
    InvalidData,
}

impl CodedErrorKind {
    pub fn exit_code(self) -> i32 {
        match self {
            Self::Usage => 2,
            Self::InvalidData => 1,
        }
    }
}

/// A failure with a stable `SCREAMING_CASE` code, carried through `anyhow` chains.
#[derive(Debug, Clone)]
pub struct CodedError {
    pub code: &'static str,
    pub message: String,
    /// Structured context for callers, such as the offending key and the accepted ones.
    pub details: Option<Value>,
    pub kind: CodedErrorKind,
}

impl CodedError {
    fn new(kind: CodedErrorKind, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
            kind,
        }
    }

    pub fn usage(code: &'static str, message: impl Into<String>) -> Self {
        Self::new(CodedErrorKind::Usage, code, message)
    }

    pub fn invalid_data(code: &'static str, message: impl Into<String>) -> Self {
        Self::new(CodedErrorKind::InvalidData, code, message)
    }

    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }

    pub fn envelope(&self) -> ErrorEnvelope {
        ErrorEnvelope::failed(self.code, &self.message, self.details.clone())
    }
}

impl fmt::Display for CodedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for CodedError {}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorEnvelope {
    pub ok: bool,
    pub error: ErrorReport,
}

impl ErrorEnvelope {
    fn failed(code: &str, message: &str, details: Option<Value>) -> Self {
        Self {
            ok: false,
            error: ErrorReport {
                code: code.to_owned(),
                message: message.to_owned(),
                details,
            },
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorReport {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

pub fn find_coded_error(error: &Error) -> Option<&CodedError> {
    error
        .chain()
        .find_map(|cause| cause.downcast_ref::<CodedError>())
}

/// Envelope for any error; uncoded failures are reported as `INTERNAL`.
pub fn envelope_for(error: &Error) -> ErrorEnvelope {
    match find_coded_error(error) {
        Some(coded) => coded.envelope(),
        None => ErrorEnvelope::failed("INTERNAL", &format!("{error:#}"), None),
    }
}

pub fn exit_code_for(error: &Error) -> i32 {
    find_coded_error(error)
        .map(|coded| coded.kind.exit_code())
        .unwrap_or(1)
}
