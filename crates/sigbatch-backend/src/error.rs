//! Error types for the backend module.

use thiserror::Error;

use sigbatch_core::{BuildError, CoreError, LayoutKind};

/// Errors that can occur during backend operations.
#[derive(Debug, Error)]
pub enum BackendError {
    /// An operation ran before a successful `init`.
    #[error("backend not initialized")]
    NotInitialized,

    /// The randomness source failed.
    #[error("entropy source failed: {0}")]
    Entropy(String),

    /// A batch packed with one layout was handed to the other operation.
    #[error("wrong batch layout: expected {expected:?}, got {got:?}")]
    WrongLayout { expected: LayoutKind, got: LayoutKind },

    /// The output buffer does not match the batch size.
    #[error("output buffer is {got} bytes, expected {expected}")]
    OutputSize { expected: usize, got: usize },

    /// The dedicated worker pool could not be built.
    #[error("thread pool error: {0}")]
    ThreadPool(String),

    /// Key or signature error.
    #[error("crypto error: {0}")]
    Core(#[from] CoreError),

    /// The batch buffer or its offset table is malformed.
    #[error("batch error: {0}")]
    Build(#[from] BuildError),

    /// The backend failed the whole batch.
    #[error("backend failure: {0}")]
    Failed(String),
}

/// Result type for backend operations.
pub type Result<T> = std::result::Result<T, BackendError>;
