//! # Sigbatch
//!
//! Batched ed25519 key generation, signing, and verification.
//!
//! ## Overview
//!
//! Thousands of independent (key, message, signature) triples are packed
//! into one contiguous buffer of fixed-size slots, with an offset table that
//! tells the backend where each field lives. The backend then processes the
//! whole batch in one call, with no per-record dispatch.
//!
//! - **Engine**: owns an initialized backend and its configuration
//! - **BatchSigner / BatchVerifier**: pack, dispatch, and unpack a batch
//! - **Dispatch**: run independent batches concurrently on tokio
//!
//! ## Usage
//!
//! ```rust
//! use sigbatch::{Engine, EngineConfig, SignRecord, VerifyRecord};
//!
//! let engine = Engine::cpu(EngineConfig::default()).unwrap();
//! let key_pair = engine.create_key_pair().unwrap();
//!
//! let records: Vec<_> = [&b"a"[..], &b"bb"[..], &b"ccc"[..]]
//!     .into_iter()
//!     .map(|m| SignRecord::new(&key_pair, m))
//!     .collect();
//! let signatures = engine.sign_batch(&records).unwrap();
//!
//! let checks: Vec<_> = records
//!     .iter()
//!     .zip(&signatures)
//!     .map(|(r, s)| VerifyRecord::new(*s, r.public_key, r.message.clone()))
//!     .collect();
//! assert_eq!(engine.verify_batch(&checks).unwrap(), vec![true; 3]);
//! ```
//!
//! ## Re-exports
//!
//! This crate re-exports the component crates for convenience:
//!
//! - `sigbatch::core` - Key types, packet layout, batch building
//! - `sigbatch::backend` - Backend trait and implementations

pub mod batch;
pub mod config;
pub mod dispatch;
pub mod engine;
pub mod error;

// Re-export component crates
pub use sigbatch_backend as backend;
pub use sigbatch_core as core;

// Re-export main types for convenience
pub use batch::{BatchSigner, BatchVerifier};
pub use config::{EngineConfig, DEFAULT_MAX_BATCH_SIZE};
pub use engine::Engine;
pub use error::{EngineError, Result};

// Re-export commonly used component types
pub use sigbatch_backend::{Backend, CpuBackend, CpuConfig, ScriptedBackend, Stream};
pub use sigbatch_core::{
    BatchBuffer, KeyPair, LayoutKind, PrivateKey, PublicKey, Seed, SignRecord, Signature,
    VerifyRecord,
};
