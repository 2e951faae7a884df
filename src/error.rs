use thiserror::Error;

/// Main error type for Solmap
#[derive(Error, Debug)]
pub enum SolmapError {
    /// HTTP transport errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// File system I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Authentication failures (401/403 from the API)
    #[error("Authentication error: {0}")]
    Auth(String),

    /// Resource not found (404 from the API)
    #[error("Not found: {0}")]
    NotFound(String),

    /// Non-success API responses other than auth/not-found
    #[error("API error: {0}")]
    Api(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Convenient Result type using SolmapError
pub type Result<T> = std::result::Result<T, SolmapError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = SolmapError::Config("missing base_url".to_string());
        assert!(err.to_string().contains("Configuration error"));
        assert!(err.to_string().contains("missing base_url"));
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: SolmapError = io_err.into();
        assert!(matches!(err, SolmapError::Io(_)));
    }

    #[test]
    fn test_error_from_json() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: SolmapError = json_err.into();
        assert!(matches!(err, SolmapError::Json(_)));
    }
}
