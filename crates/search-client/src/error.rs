//! Error types for the search client

use std::fmt;

/// Errors that can occur while talking to the search backend
#[derive(Debug)]
pub enum SearchClientError {
    /// Request could not be sent or the connection failed
    RequestError(String),

    /// Backend answered with a non-success status
    StatusError { status: u16, body: String },

    /// Response body did not match the expected shape
    DecodeError(String),

    /// Configuration error
    ConfigError(String),
}

impl fmt::Display for SearchClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RequestError(msg) => write!(f, "Search request failed: {msg}"),
            Self::StatusError { status, body } => {
                write!(f, "Search backend returned error {status}: {body}")
            }
            Self::DecodeError(msg) => write!(f, "Failed to decode search response: {msg}"),
            Self::ConfigError(msg) => write!(f, "Configuration error: {msg}"),
        }
    }
}

impl std::error::Error for SearchClientError {}

impl From<SearchClientError> for tablescout_core::error::Error {
    fn from(err: SearchClientError) -> Self {
        match err {
            SearchClientError::ConfigError(msg) => tablescout_core::error::Error::Config(msg),
            other => tablescout_core::error::Error::Search(other.to_string()),
        }
    }
}
