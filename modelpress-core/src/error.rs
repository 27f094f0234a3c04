//! Error types for the modelpress-core crate.

use thiserror::Error;

/// Convenience alias for publish pipeline results.
pub type Result<T> = std::result::Result<T, PublishError>;

/// Top-level error type for checkpoint publishing operations.
#[derive(Debug, Error)]
pub enum PublishError {
    #[error("Download error: {0}")]
    Download(String),

    #[error("Conversion error: {0}")]
    Convert(String),

    #[error("Store error: {0}")]
    Store(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Unknown model: {0}")]
    UnknownModel(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Tensor error: {0}")]
    Tensor(#[from] candle_core::Error),

    #[error("Object store error: {0}")]
    ObjectStore(#[from] object_store::Error),
}

impl PublishError {
    pub fn download(msg: impl Into<String>) -> Self {
        Self::Download(msg.into())
    }

    pub fn convert(msg: impl Into<String>) -> Self {
        Self::Convert(msg.into())
    }

    pub fn store(msg: impl Into<String>) -> Self {
        Self::Store(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = PublishError::download("HTTP 404 for https://example.com/x");
        assert_eq!(
            err.to_string(),
            "Download error: HTTP 404 for https://example.com/x"
        );

        let err = PublishError::UnknownModel("bert-huge".to_string());
        assert_eq!(err.to_string(), "Unknown model: bert-huge");
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: PublishError = io.into();
        assert!(matches!(err, PublishError::Io(_)));
        assert!(err.to_string().starts_with("IO error:"));
    }
}
