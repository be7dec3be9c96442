//! Shared error type across metrica crates.

use thiserror::Error;

/// Stable error codes surfaced to remote callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// Metric kind tag is neither `gauge` nor `counter`.
    UnknownKind,
    /// Lookup miss.
    UnknownMetric,
    /// Signature missing or mismatched.
    BadDataHash,
    /// Invalid input / malformed payload.
    BadRequest,
    /// Backend or delivery failure.
    Unavailable,
    /// Internal server error.
    Internal,
}

impl ErrorCode {
    /// String representation used in responses and logs.
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::UnknownKind => "UNKNOWN_KIND",
            ErrorCode::UnknownMetric => "UNKNOWN_METRIC",
            ErrorCode::BadDataHash => "BAD_DATA_HASH",
            ErrorCode::BadRequest => "BAD_REQUEST",
            ErrorCode::Unavailable => "UNAVAILABLE",
            ErrorCode::Internal => "INTERNAL",
        }
    }

    /// HTTP status the collector answers with.
    pub fn http_status(self) -> u16 {
        match self {
            ErrorCode::UnknownKind | ErrorCode::BadDataHash | ErrorCode::BadRequest => 400,
            ErrorCode::UnknownMetric => 404,
            ErrorCode::Unavailable => 503,
            ErrorCode::Internal => 500,
        }
    }
}

/// Shared result type.
pub type Result<T> = std::result::Result<T, MetricaError>;

/// Unified error type used by core, server and agent.
#[derive(Debug, Error)]
pub enum MetricaError {
    #[error("unknown metric kind: {0}")]
    UnknownKind(String),
    #[error("metric name is empty")]
    EmptyName,
    #[error("bad metric value: {0}")]
    BadValue(String),
    #[error("unknown metric: kind={kind} name={name}")]
    UnknownMetric { kind: String, name: String },
    #[error("bad data hash")]
    BadDataHash,
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("crypto: {0}")]
    Crypto(String),
    #[error("storage: {0}")]
    Storage(String),
    #[error("transport: {0}")]
    Transport(String),
    #[error("timeout: {0}")]
    Timeout(String),
    #[error("config: {0}")]
    Config(String),
    #[error("internal: {0}")]
    Internal(String),
}

impl MetricaError {
    /// Map an error to its stable code.
    pub fn code(&self) -> ErrorCode {
        match self {
            MetricaError::UnknownKind(_) => ErrorCode::UnknownKind,
            MetricaError::UnknownMetric { .. } => ErrorCode::UnknownMetric,
            MetricaError::BadDataHash => ErrorCode::BadDataHash,
            MetricaError::EmptyName | MetricaError::BadValue(_) | MetricaError::BadRequest(_) => {
                ErrorCode::BadRequest
            }
            MetricaError::Storage(_) | MetricaError::Transport(_) | MetricaError::Timeout(_) => {
                ErrorCode::Unavailable
            }
            MetricaError::Crypto(_) | MetricaError::Config(_) | MetricaError::Internal(_) => {
                ErrorCode::Internal
            }
        }
    }
}
