//! Engine error taxonomy.
//!
//! Loader problems (`SourceUnavailable`, `MalformedSource`) are logged and
//! degraded to an empty or smaller corpus; they only surface as values when a
//! caller invokes a loader function directly. `EncodingFailure` and
//! `EngineNotReady` are returned from the search operations.

use thiserror::Error;

/// Errors produced by the retrieval engine.
#[derive(Debug, Error)]
pub enum EngineError {
    /// A corpus directory or file is missing or unreadable.
    #[error("source unavailable: {path}: {reason}")]
    SourceUnavailable { path: String, reason: String },

    /// A single document or ticket record could not be decoded.
    #[error("malformed source {unit}: {reason}")]
    MalformedSource { unit: String, reason: String },

    /// The embedding provider failed to encode a text.
    #[error("encoding failure: {0}")]
    EncodingFailure(String),

    /// A search was attempted against an index holding no items.
    #[error("engine not ready: the {corpus} index is empty")]
    EngineNotReady { corpus: &'static str },

    /// An embedding vector has the wrong number of components.
    #[error("vector size mismatch: got {got}, want {want}")]
    DimensionMismatch { got: usize, want: usize },
}

impl EngineError {
    pub(crate) fn encoding(err: anyhow::Error) -> Self {
        EngineError::EncodingFailure(format!("{:#}", err))
    }
}
