//! Error types for sigbatch core.

use thiserror::Error;

use crate::layout::LayoutKind;

/// Errors from key, seed, and signature handling.
#[derive(Debug, Error, PartialEq)]
pub enum CoreError {
    #[error("invalid signature")]
    InvalidSignature,

    #[error("invalid public key")]
    InvalidPublicKey,

    #[error("private key does not belong to the given public key")]
    KeyMismatch,

    #[error("invalid length: expected {expected} bytes, got {got}")]
    InvalidLength { expected: usize, got: usize },

    #[error("hex decoding error: {0}")]
    Hex(#[from] hex::FromHexError),
}

/// Precondition violations detected while packing or inspecting a batch.
///
/// Every variant is raised before a buffer is handed out, so a failed
/// build never yields a partially packed batch.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BuildError {
    #[error("batch is empty")]
    EmptyBatch,

    #[error("batch of {size} records exceeds the maximum of {max}")]
    BatchTooLarge { size: usize, max: usize },

    #[error("message {index} is {len} bytes, the limit is {max}")]
    MessageTooLong { index: usize, len: usize, max: usize },

    #[error("message {index} is {len} bytes and would overrun its slot (capacity {capacity})")]
    SlotOverflow {
        index: usize,
        len: usize,
        capacity: usize,
    },

    #[error("length mismatch: expected {expected}, got {got}")]
    LengthMismatch { expected: usize, got: usize },

    #[error("field at offset {offset} with length {len} exceeds buffer of {buffer_len} bytes")]
    FieldOutOfBounds {
        offset: usize,
        len: usize,
        buffer_len: usize,
    },

    #[error("offset table entry {index} does not match the {kind:?} layout")]
    LayoutMismatch { index: usize, kind: LayoutKind },
}
