//! Error taxonomy shared across the workspace.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, CourseClawError>;

#[derive(Debug, Error)]
pub enum CourseClawError {
    /// Missing or unreadable configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A provider that requires a credential has none.
    #[error("API key missing for provider '{0}'")]
    ApiKeyMissing(String),

    #[error("Provider not found: {0}")]
    ProviderNotFound(String),

    /// The record store could not be opened, migrated or queried.
    #[error("Storage error: {0}")]
    Storage(String),

    /// The catalog source could not be read at all (bad file or header).
    /// Individual malformed rows are skipped and never surface as errors.
    #[error("Ingestion error: {0}")]
    Ingestion(String),

    #[error("Embedding error: {0}")]
    Embedding(String),

    #[error("Embedding dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    /// Tool-call arguments the model produced could not be decoded.
    #[error("Invalid tool arguments: {0}")]
    ToolArgument(String),

    /// The language-model backend failed or returned an unusable response.
    #[error("Model call failed: {0}")]
    ModelCall(String),

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Invalid judge output: {0:?}")]
    InvalidJudgement(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
