//! Shared error type across warden crates.

use thiserror::Error;

/// Stable error codes for the API layer (status mapping, client messages).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// Missing or malformed input.
    Validation,
    /// Write or delete blocked by a built-in policy.
    ImmutablePolicy,
    /// Policy source text did not parse.
    Parse,
    /// Persisted record is corrupt.
    Decode,
    /// Policy type outside the supported set.
    UnknownType,
    /// Durable storage failed.
    Storage,
    /// Invalid configuration.
    Config,
}

impl ErrorCode {
    /// String representation used in API responses and logs.
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::Validation => "VALIDATION",
            ErrorCode::ImmutablePolicy => "IMMUTABLE_POLICY",
            ErrorCode::Parse => "PARSE",
            ErrorCode::Decode => "DECODE",
            ErrorCode::UnknownType => "UNKNOWN_TYPE",
            ErrorCode::Storage => "STORAGE",
            ErrorCode::Config => "CONFIG",
        }
    }
}

/// Shared result type.
pub type Result<T> = std::result::Result<T, WardenError>;

/// Policy source text rejected by the parser.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("line {line}: {message}")]
pub struct ParseError {
    /// 1-based line of the offending token.
    pub line: usize,
    pub message: String,
}

impl ParseError {
    pub fn new(line: usize, message: impl Into<String>) -> Self {
        Self { line, message: message.into() }
    }
}

/// Failure reported by a storage backend.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("invalid storage key: {0:?}")]
    InvalidKey(String),
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
    #[error("{0}")]
    Backend(String),
}

/// Unified error type used by core and store.
#[derive(Debug, Error)]
pub enum WardenError {
    #[error("invalid request: {0}")]
    Validation(String),
    #[error("cannot {action} {name} policy")]
    Immutable { name: String, action: &'static str },
    #[error("failed to parse policy: {0}")]
    Parse(#[from] ParseError),
    #[error("failed to decode policy {name}: {source}")]
    Decode {
        name: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("unknown policy type {0}")]
    UnknownType(String),
    #[error("{context}: {source}")]
    Storage {
        context: &'static str,
        #[source]
        source: StorageError,
    },
    #[error("config: {0}")]
    Config(String),
}

impl WardenError {
    /// Wrap a storage failure with the operation that hit it.
    pub fn storage(context: &'static str, source: StorageError) -> Self {
        WardenError::Storage { context, source }
    }

    /// Map internal error to a stable code.
    pub fn code(&self) -> ErrorCode {
        match self {
            WardenError::Validation(_) => ErrorCode::Validation,
            WardenError::Immutable { .. } => ErrorCode::ImmutablePolicy,
            WardenError::Parse(_) => ErrorCode::Parse,
            WardenError::Decode { .. } => ErrorCode::Decode,
            WardenError::UnknownType(_) => ErrorCode::UnknownType,
            WardenError::Storage { .. } => ErrorCode::Storage,
            WardenError::Config(_) => ErrorCode::Config,
        }
    }
}
