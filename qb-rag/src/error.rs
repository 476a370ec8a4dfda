//! Error types for the `qb-rag` crate.

use thiserror::Error;

/// Errors that can occur in the ingestion and retrieval pipeline.
#[derive(Debug, Error)]
pub enum RagError {
    /// A document could not be decoded as the expected format.
    #[error("Extraction error ({format}): {message}")]
    Extraction {
        /// The document format that failed to decode (e.g. "pdf").
        format: String,
        /// A description of the failure.
        message: String,
    },

    /// A remote content source could not be fetched.
    #[error("Ingestion source error ({source_name}): {message}")]
    IngestionSource {
        /// The content source that produced the error.
        source_name: String,
        /// A description of the failure.
        message: String,
    },

    /// An error occurred during embedding generation.
    #[error("Embedding error ({provider}): {message}")]
    Embedding {
        /// The embedding provider that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// An error occurred in the vector store backend.
    #[error("Vector store error ({backend}): {message}")]
    VectorStore {
        /// The vector store backend that produced the error.
        backend: String,
        /// A description of the failure.
        message: String,
    },

    /// An error occurred in the language-model backend.
    #[error("Language model error ({provider}): {message}")]
    LanguageModel {
        /// The language-model provider that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// A configuration validation error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// An error in the pipeline orchestration.
    #[error("Pipeline error: {0}")]
    Pipeline(String),
}

#[cfg(feature = "confluence")]
impl From<qb_confluence::ConfluenceError> for RagError {
    fn from(err: qb_confluence::ConfluenceError) -> Self {
        RagError::IngestionSource { source_name: "confluence".to_string(), message: err.to_string() }
    }
}

/// A convenience result type for pipeline operations.
pub type Result<T> = std::result::Result<T, RagError>;
