//! Error types for the tradeflow pipeline.

use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the tradeflow pipeline.
#[derive(Error, Debug)]
pub enum Error {
    /// Missing or unreadable file, unreachable database, missing table.
    #[error("Source unavailable: {0}")]
    SourceUnavailable(String),

    /// An expected column is absent.
    #[error("Schema mismatch: {0}")]
    SchemaMismatch(String),

    /// A value could not be converted to its declared type.
    #[error("Row coercion error: {0}")]
    RowCoercion(String),

    /// Existing output artifact is unreadable or not a mapping.
    #[error("Artifact merge conflict: {0}")]
    ArtifactMerge(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A pipeline stage failed.
    #[error("{stage} stage failed: {source}")]
    Stage {
        stage: &'static str,
        #[source]
        source: Box<Error>,
    },

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create a source-unavailable error.
    pub fn source_unavailable(msg: impl Into<String>) -> Self {
        Error::SourceUnavailable(msg.into())
    }

    /// Create a schema mismatch error.
    pub fn schema_mismatch(msg: impl Into<String>) -> Self {
        Error::SchemaMismatch(msg.into())
    }

    /// Create a row coercion error.
    pub fn row_coercion(msg: impl Into<String>) -> Self {
        Error::RowCoercion(msg.into())
    }

    /// Create an artifact merge error.
    pub fn artifact_merge(msg: impl Into<String>) -> Self {
        Error::ArtifactMerge(msg.into())
    }

    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Error::Config(msg.into())
    }

    /// Attribute this error to a named pipeline stage.
    pub fn in_stage(self, stage: &'static str) -> Self {
        Error::Stage {
            stage,
            source: Box::new(self),
        }
    }

    /// Name of the stage that failed, if known.
    pub fn stage(&self) -> Option<&'static str> {
        match self {
            Error::Stage { stage, .. } => Some(*stage),
            _ => None,
        }
    }
}
