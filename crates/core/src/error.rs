use thiserror::Error;

/// Result type for tablescout operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors shared by the configuration layer and search backends
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Search backend failures (transport, HTTP status, decoding)
    #[error("Search error: {0}")]
    Search(String),
}

impl Error {
    /// Creates a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Creates a search backend error
    pub fn search(msg: impl Into<String>) -> Self {
        Self::Search(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_error_display() {
        let err = Error::search("backend returned 503");
        assert_eq!(err.to_string(), "Search error: backend returned 503");
    }

    #[test]
    fn test_config_error_display() {
        let err = Error::config("max_queries must be greater than 0");
        assert_eq!(
            err.to_string(),
            "Configuration error: max_queries must be greater than 0"
        );
    }
}
