//! Error types for the Engine.

use sigbatch_backend::BackendError;
use sigbatch_core::BuildError;
use thiserror::Error;

/// Errors that can occur during Engine operations.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The backend refused to initialize.
    #[error("backend initialization failed")]
    InitFailed,

    /// A batch could not be built.
    #[error("batch error: {0}")]
    Build(#[from] BuildError),

    /// Backend error.
    #[error("backend error: {0}")]
    Backend(#[from] BackendError),

    /// The backend returned a verdict byte other than 0 or 1.
    #[error("backend returned verdict {value} for record {index}")]
    Contract { index: usize, value: u8 },

    /// Invalid configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A spawned batch task panicked or was cancelled.
    #[error("batch task failed: {0}")]
    Join(String),
}

/// Result type for Engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;
