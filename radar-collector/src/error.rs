//! Error types for the collector.

use thiserror::Error;

/// Errors that can occur while turning probe metrics into a graph.
#[derive(Debug, Error)]
pub enum CollectorError {
    /// Requested window is outside `1..=60` minutes.
    #[error("window out of range: {0} (expected 1..=60 minutes)")]
    InvalidWindow(i64),

    /// Target endpoint cannot be used as a query base.
    #[error("invalid target endpoint: {0}")]
    InvalidTarget(String),

    /// The call to the metrics store could not be completed.
    #[error("transport error: {0}")]
    Transport(String),

    /// Response body is not a query-result envelope.
    #[error("failed to parse response: {0}")]
    Parse(String),

    /// The metrics store answered with a non-success status.
    #[error("query failed: {}", describe_failure(.status, .error_type, .error))]
    QueryFailed {
        /// Reported status.
        status: String,
        /// `errorType` field of the response, if any.
        error_type: Option<String>,
        /// `error` field of the response, if any.
        error: Option<String>,
    },

    /// A sample value is not a number.
    #[error("invalid sample value {value:?}: {reason}")]
    ValueFormat {
        /// Raw value string.
        value: String,
        /// Why it did not parse.
        reason: String,
    },
}

impl CollectorError {
    /// Whether the error was caused by the caller's parameters.
    pub fn is_client_error(&self) -> bool {
        matches!(self, CollectorError::InvalidWindow(_))
    }
}

fn describe_failure(status: &str, error_type: &Option<String>, error: &Option<String>) -> String {
    match (error_type.as_deref(), error.as_deref()) {
        (Some(kind), Some(msg)) => format!("{} ({}: {})", status, kind, msg),
        (None, Some(msg)) => format!("{} ({})", status, msg),
        (Some(kind), None) => format!("{} ({})", status, kind),
        (None, None) => status.to_string(),
    }
}

#[cfg(feature = "http")]
impl From<reqwest::Error> for CollectorError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            CollectorError::Transport(format!("request timed out: {}", err))
        } else if err.is_connect() {
            CollectorError::Transport(format!("connection failed: {}", err))
        } else {
            CollectorError::Transport(err.to_string())
        }
    }
}
