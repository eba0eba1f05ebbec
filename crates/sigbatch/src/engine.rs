//! The Engine: one initialized backend plus the configuration batches run
//! under.
//!
//! All signing and verification goes through an Engine. Creating one is the
//! only way to initialize a backend, so every operation on an Engine runs
//! against a ready backend.

use tracing::{debug, info};

use sigbatch_backend::{Backend, CpuBackend};
use sigbatch_core::{
    BatchBuffer, KeyPair, PublicKey, Seed, SignRecord, Signature, VerifyRecord,
};

use crate::batch::{BatchSigner, BatchVerifier};
use crate::config::EngineConfig;
use crate::error::{EngineError, Result};

/// The main Engine struct.
///
/// Provides:
/// - Seed and key pair generation
/// - Single-record sign and verify
/// - Batched sign and verify, from records or pre-packed buffers
pub struct Engine<B: Backend> {
    /// The compute backend.
    backend: B,
    /// Configuration.
    config: EngineConfig,
}

impl Engine<CpuBackend> {
    /// Create an engine on a CPU backend tuned by `config.cpu`.
    pub fn cpu(config: EngineConfig) -> Result<Self> {
        let backend = CpuBackend::new(config.cpu.clone());
        Self::new(backend, config)
    }
}

impl<B: Backend> Engine<B> {
    /// Create an engine, initializing the backend.
    ///
    /// Fails with [`EngineError::InitFailed`] if the backend cannot start.
    pub fn new(backend: B, config: EngineConfig) -> Result<Self> {
        config.validate()?;

        backend.set_verbose(config.verbose);
        if !backend.init() {
            return Err(EngineError::InitFailed);
        }
        info!(
            stream = ?config.stream,
            max_batch_size = config.max_batch_size,
            "engine initialized"
        );

        Ok(Self { backend, config })
    }

    /// Get the backend reference.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// License notice of the backend's signing implementation.
    pub fn license(&self) -> &'static str {
        self.backend.license()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Keys
    // ─────────────────────────────────────────────────────────────────────────

    /// Draw a fresh seed.
    pub fn create_seed(&self) -> Result<Seed> {
        Ok(self.backend.create_seed()?)
    }

    /// Generate a key pair from a fresh seed.
    pub fn create_key_pair(&self) -> Result<KeyPair> {
        let seed = self.backend.create_seed()?;
        let key_pair = self.backend.create_key_pair(&seed)?;
        debug!(public_key = ?key_pair.public_key(), "key pair created");
        Ok(key_pair)
    }

    /// Derive the key pair for `seed`. Deterministic.
    pub fn key_pair_from_seed(&self, seed: &Seed) -> Result<KeyPair> {
        Ok(self.backend.create_key_pair(seed)?)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Single Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Sign one message.
    pub fn sign(&self, message: &[u8], key_pair: &KeyPair) -> Result<Signature> {
        Ok(self
            .backend
            .sign(message, key_pair.public_key(), key_pair.private_key())?)
    }

    /// Verify one signature.
    pub fn verify(&self, signature: &Signature, message: &[u8], public_key: &PublicKey) -> Result<bool> {
        Ok(self.backend.verify(signature, message, public_key)?)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Batch Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// A batch signer on the configured stream.
    pub fn signer(&self) -> BatchSigner<'_, B> {
        BatchSigner::new(&self.backend, self.config.stream, self.config.max_batch_size)
    }

    /// A batch verifier on the configured stream.
    pub fn verifier(&self) -> BatchVerifier<'_, B> {
        BatchVerifier::new(&self.backend, self.config.stream, self.config.max_batch_size)
    }

    /// Sign every record. Signature `i` belongs to record `i`.
    pub fn sign_batch(&self, records: &[SignRecord]) -> Result<Vec<Signature>> {
        self.signer().sign_batch(records)
    }

    /// Verify every record. Verdict `i` belongs to record `i`.
    pub fn verify_batch(&self, records: &[VerifyRecord]) -> Result<Vec<bool>> {
        self.verifier().verify_batch(records)
    }

    /// Sign a pre-packed sign-layout batch.
    pub fn sign_packed(&self, batch: &BatchBuffer) -> Result<Vec<Signature>> {
        self.signer().sign_packed(batch)
    }

    /// Verify a pre-packed verify-layout batch.
    pub fn verify_packed(&self, batch: &BatchBuffer) -> Result<Vec<bool>> {
        self.verifier().verify_packed(batch)
    }
}
