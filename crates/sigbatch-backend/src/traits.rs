//! Backend trait: the contract between batch building and the compute
//! engine that signs and verifies.
//!
//! Batch building is backend-agnostic. A backend receives a packed
//! [`BatchBuffer`] and writes one result per slot, index-aligned with the
//! batch. Implementations include the data-parallel [`CpuBackend`] and the
//! fault-injecting [`ScriptedBackend`] for tests.
//!
//! [`CpuBackend`]: crate::CpuBackend
//! [`ScriptedBackend`]: crate::ScriptedBackend

use serde::{Deserialize, Serialize};

use sigbatch_core::{BatchBuffer, KeyPair, PrivateKey, PublicKey, Seed, Signature};

use crate::error::Result;

/// Execution queue a batch is submitted on.
///
/// Batches on `NonDefault` may overlap with work on `Default`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stream {
    #[default]
    Default,
    NonDefault,
}

/// The Backend trait: sign and verify, one record or a whole batch.
///
/// # Contract
///
/// - **Readiness**: `init` is idempotent. Every operation except
///   `set_verbose` and `license` fails with `NotInitialized` until `init`
///   has returned true.
/// - **Alignment**: output `i` always belongs to slot `i`.
/// - **Equivalence**: `sign_many` output `i` equals `sign` on record `i`,
///   and `verify_many` verdict `i` equals `verify` on record `i`.
/// - **All or nothing**: a failed batch call is an error for the whole batch.
pub trait Backend: Send + Sync {
    // ─────────────────────────────────────────────────────────────────────────
    // Lifecycle
    // ─────────────────────────────────────────────────────────────────────────

    /// Bring the backend up. Returns false if it cannot be used.
    fn init(&self) -> bool;

    /// Toggle per-batch diagnostics. No effect on results.
    fn set_verbose(&self, verbose: bool);

    /// License notice of the signing implementation.
    fn license(&self) -> &'static str;

    // ─────────────────────────────────────────────────────────────────────────
    // Single Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Draw a fresh seed from the randomness source.
    fn create_seed(&self) -> Result<Seed>;

    /// Derive a key pair from a seed. Deterministic.
    fn create_key_pair(&self, seed: &Seed) -> Result<KeyPair>;

    /// Sign one message. Deterministic.
    fn sign(&self, message: &[u8], public_key: &PublicKey, private_key: &PrivateKey)
        -> Result<Signature>;

    /// Verify one signature. A malformed key or signature is simply invalid.
    fn verify(&self, signature: &Signature, message: &[u8], public_key: &PublicKey)
        -> Result<bool>;

    // ─────────────────────────────────────────────────────────────────────────
    // Batch Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Sign every slot of a sign-layout batch.
    ///
    /// `out` must be exactly `batch.len() * SIGNATURE_SIZE` bytes.
    fn sign_many(&self, batch: &BatchBuffer, stream: Stream, out: &mut [u8]) -> Result<()>;

    /// Verify every slot of a verify-layout batch.
    ///
    /// `out` must be exactly `batch.len()` bytes; each is set to 1 (valid)
    /// or 0 (invalid).
    fn verify_many(&self, batch: &BatchBuffer, stream: Stream, out: &mut [u8]) -> Result<()>;
}
