//! Error types for pdfcorpus-rs
//!
//! This module provides the error taxonomy for the processing pipeline:
//! extraction, normalization, segmentation, deduplication and persistence.
//! Most variants are absorbed locally by the stage that raises them; only
//! `DocumentUnreadable`, I/O and persistence errors reach the batch report.

use thiserror::Error;

/// Main error type for corpus processing
#[derive(Error, Debug)]
pub enum CorpusError {
    /// A single extraction backend failed on a document
    #[error("Extraction error: {0}")]
    Extraction(String),

    /// No extraction strategy could open the document
    #[error("Document unreadable: {document}: {reason}")]
    DocumentUnreadable { document: String, reason: String },

    /// An optional capability is not installed or not supported here
    #[error("Backend unavailable: {0}")]
    BackendUnavailable(String),

    /// Text processing errors
    #[error("Text processing error: {0}")]
    TextProcessing(String),

    /// Segmentation precondition violations (non-positive chunk size)
    #[error("Segmentation error: {0}")]
    Segmentation(String),

    /// Machine learning model errors
    #[error("ML model error: {0}")]
    MachineLearning(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Output persistence errors
    #[error("Storage error: {0}")]
    Storage(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Candle ML framework errors
    #[error("Candle ML error: {0}")]
    Candle(#[from] candle_core::Error),

    /// Generic errors
    #[error("Generic error: {0}")]
    Generic(String),
}

/// Result type alias for corpus operations
pub type Result<T> = std::result::Result<T, CorpusError>;

impl From<lopdf::Error> for CorpusError {
    fn from(err: lopdf::Error) -> Self {
        CorpusError::Extraction(err.to_string())
    }
}

impl From<walkdir::Error> for CorpusError {
    fn from(err: walkdir::Error) -> Self {
        CorpusError::Io(std::io::Error::other(err.to_string()))
    }
}

impl From<anyhow::Error> for CorpusError {
    fn from(err: anyhow::Error) -> Self {
        CorpusError::Generic(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let error = CorpusError::Segmentation("max_chunk_size must be positive".to_string());
        assert_eq!(
            error.to_string(),
            "Segmentation error: max_chunk_size must be positive"
        );

        let error = CorpusError::DocumentUnreadable {
            document: "broken.pdf".to_string(),
            reason: "no strategy could open it".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Document unreadable: broken.pdf: no strategy could open it"
        );
    }

    #[test]
    fn test_error_chain() {
        let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let corpus_error = CorpusError::from(io_error);

        match corpus_error {
            CorpusError::Io(_) => (),
            _ => panic!("Expected Io error"),
        }
    }

    #[test]
    fn test_anyhow_conversion() {
        let err: CorpusError = anyhow::anyhow!("boom").into();
        assert!(matches!(err, CorpusError::Generic(ref msg) if msg == "boom"));
    }
}
