//! # Sigbatch Backend
//!
//! The compute side of sigbatch. A [`Backend`] takes a packed batch and
//! writes one signature or verdict per slot.
//!
//! ## Key Types
//!
//! - [`Backend`] - The trait every compute engine implements
//! - [`CpuBackend`] - Data-parallel implementation on rayon
//! - [`ScriptedBackend`] - Fault-injecting wrapper for tests
//! - [`Stream`] - Which execution queue a batch runs on
//!
//! ## Usage
//!
//! ```rust
//! use sigbatch_backend::{Backend, CpuBackend, Stream};
//! use sigbatch_core::{build_sign_batch, KeyPair, Seed, SignRecord, SIGNATURE_SIZE};
//!
//! let backend = CpuBackend::default();
//! assert!(backend.init());
//!
//! let key_pair = KeyPair::from_seed(&Seed([1; 32]));
//! let batch = build_sign_batch(&[SignRecord::new(&key_pair, &b"hello"[..])]).unwrap();
//! let mut signatures = vec![0u8; batch.len() * SIGNATURE_SIZE];
//! backend.sign_many(&batch, Stream::Default, &mut signatures).unwrap();
//! ```

pub mod cpu;
pub mod error;
pub mod scripted;
pub mod traits;

pub use cpu::{CpuBackend, CpuConfig};
pub use error::{BackendError, Result};
pub use scripted::ScriptedBackend;
pub use traits::{Backend, Stream};
