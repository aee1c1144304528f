//! Error types for metric queries.

use thiserror::Error;

/// Errors that can occur when sampling the monitored value.
///
/// None of these are fatal to the monitor: a failed sample is reported
/// and the breach state is left untouched until the next tick.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum QueryError {
    /// The HTTP call failed or the body was not a query envelope.
    #[error("transport error: {0}")]
    Transport(String),

    /// The backend answered but reported no series.
    #[error("no data returned")]
    NoData,

    /// Series were returned but none carried a usable number.
    #[error("no valid value in response")]
    NoValidValue,
}

impl From<reqwest::Error> for QueryError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            QueryError::Transport(format!("request timed out: {}", err))
        } else if err.is_connect() {
            QueryError::Transport(format!("connection failed: {}", err))
        } else if err.is_decode() {
            QueryError::Transport(format!("failed to decode response: {}", err))
        } else {
            QueryError::Transport(err.to_string())
        }
    }
}
