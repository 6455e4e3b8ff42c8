//! Error types for the retrieval service.

use thiserror::Error;

/// Top-level error for search and chat operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Document store query failed
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Embedding generation failed
    #[error("embedding error: {0}")]
    Embed(#[from] EmbedError),

    /// Chat model call failed
    #[error("chat error: {0}")]
    Chat(#[from] ChatError),

    /// The retrieval pipeline was never initialized (store unavailable at startup)
    #[error("pipeline not initialized")]
    PipelineNotReady,

    /// History or delete on an id the conversation store has never seen
    #[error("unknown conversation: {0}")]
    UnknownConversation(String),

    /// Caller supplied a malformed request
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

/// Document store errors.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("failed to load resume snapshot: {0}")]
    Load(String),

    #[error("keyword query failed: {0}")]
    Query(String),

    /// The vector index was never built. Callers can distinguish this from a
    /// transport failure and skip the vector path entirely.
    #[error("vector index unavailable: {0}")]
    VectorIndexUnavailable(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Embedding client errors.
#[derive(Error, Debug)]
pub enum EmbedError {
    /// The provider returned a vector of the wrong length. Fatal for the
    /// request: a mismatched vector would silently corrupt similarity scores.
    #[error("embedding dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    #[error("embedding provider returned {status}: {body}")]
    Provider { status: u16, body: String },

    #[error("embedding transport error: {0}")]
    Transport(String),

    #[error("unknown embedding provider: {0}")]
    UnknownProvider(String),

    #[error("provider returned no embedding")]
    Empty,
}

/// Chat model client errors.
#[derive(Error, Debug)]
pub enum ChatError {
    #[error("chat provider returned {status}: {body}")]
    Provider { status: u16, body: String },

    #[error("chat transport error: {0}")]
    Transport(String),

    #[error("unknown chat provider: {0}")]
    UnknownProvider(String),
}

pub type Result<T> = std::result::Result<T, Error>;
