//! Data-parallel CPU backend.
//!
//! Each slot is independent, so a batch is split across rayon workers by
//! output chunk. `Stream::Default` runs on the global rayon pool;
//! `Stream::NonDefault` runs on a pool this backend owns, built at `init`.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::OnceLock;
use std::time::Instant;

use rand::rngs::OsRng;
use rand::RngCore;
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use sigbatch_core::{
    validate_batch, BatchBuffer, KeyPair, LayoutKind, PrivateKey, PublicKey, Seed, Signature,
    SEED_SIZE, SIGNATURE_SIZE,
};

use crate::error::{BackendError, Result};
use crate::traits::{Backend, Stream};

const LICENSE: &str = "sigbatch CPU backend: ed25519 arithmetic by ed25519-dalek \
(BSD-3-Clause), scheduling by rayon (MIT OR Apache-2.0)";

/// Tuning for [`CpuBackend`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CpuConfig {
    /// Worker threads in the non-default stream's pool.
    /// `None` lets rayon pick (one per logical CPU).
    pub threads: Option<usize>,
}

/// CPU backend.
///
/// Thread-safe; one instance may serve many concurrent batches.
pub struct CpuBackend {
    config: CpuConfig,
    initialized: AtomicBool,
    verbose: AtomicBool,
    pool: OnceLock<ThreadPool>,
}

impl CpuBackend {
    /// Create an uninitialized backend.
    pub fn new(config: CpuConfig) -> Self {
        Self {
            config,
            initialized: AtomicBool::new(false),
            verbose: AtomicBool::new(false),
            pool: OnceLock::new(),
        }
    }

    pub fn config(&self) -> &CpuConfig {
        &self.config
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::Acquire)
    }

    fn ensure_ready(&self) -> Result<()> {
        if self.is_initialized() {
            Ok(())
        } else {
            Err(BackendError::NotInitialized)
        }
    }

    fn build_pool(&self) -> Result<ThreadPool> {
        let mut builder =
            ThreadPoolBuilder::new().thread_name(|index| format!("sigbatch-cpu-{index}"));
        if let Some(threads) = self.config.threads {
            builder = builder.num_threads(threads);
        }
        builder
            .build()
            .map_err(|e| BackendError::ThreadPool(e.to_string()))
    }

    /// Run `op` on the pool behind `stream`.
    fn run<T, F>(&self, stream: Stream, op: F) -> Result<T>
    where
        F: FnOnce() -> T + Send,
        T: Send,
    {
        match stream {
            Stream::Default => Ok(op()),
            Stream::NonDefault => {
                let pool = self.pool.get().ok_or(BackendError::NotInitialized)?;
                Ok(pool.install(op))
            }
        }
    }

    /// Reject a batch of the wrong kind, a malformed table, or an output
    /// buffer of the wrong size.
    fn check_batch(
        &self,
        batch: &BatchBuffer,
        expected: LayoutKind,
        out_len: usize,
        width: usize,
    ) -> Result<()> {
        if batch.kind() != expected {
            return Err(BackendError::WrongLayout {
                expected,
                got: batch.kind(),
            });
        }
        validate_batch(batch)?;

        let expected_len = batch.len() * width;
        if out_len != expected_len {
            return Err(BackendError::OutputSize {
                expected: expected_len,
                got: out_len,
            });
        }
        Ok(())
    }

    fn report(&self, op: &str, records: usize, stream: Stream, started: Instant) {
        if !self.verbose.load(Ordering::Relaxed) {
            return;
        }
        let elapsed = started.elapsed();
        let per_sec = records as f64 / elapsed.as_secs_f64().max(f64::EPSILON);
        info!(
            op,
            records,
            ?stream,
            elapsed_us = elapsed.as_micros() as u64,
            per_sec = per_sec as u64,
            "batch complete"
        );
    }
}

impl Default for CpuBackend {
    fn default() -> Self {
        Self::new(CpuConfig::default())
    }
}

impl Backend for CpuBackend {
    fn init(&self) -> bool {
        if self.is_initialized() {
            return true;
        }
        if self.pool.get().is_none() {
            match self.build_pool() {
                Ok(pool) => {
                    // A concurrent init may have won the race; either pool will do.
                    let _ = self.pool.set(pool);
                }
                Err(e) => {
                    warn!(error = %e, "cpu backend init failed");
                    return false;
                }
            }
        }
        self.initialized.store(true, Ordering::Release);
        debug!(threads = ?self.config.threads, "cpu backend initialized");
        true
    }

    fn set_verbose(&self, verbose: bool) {
        self.verbose.store(verbose, Ordering::Relaxed);
    }

    fn license(&self) -> &'static str {
        LICENSE
    }

    fn create_seed(&self) -> Result<Seed> {
        self.ensure_ready()?;
        let mut bytes = [0u8; SEED_SIZE];
        OsRng
            .try_fill_bytes(&mut bytes)
            .map_err(|e| BackendError::Entropy(e.to_string()))?;
        Ok(Seed(bytes))
    }

    fn create_key_pair(&self, seed: &Seed) -> Result<KeyPair> {
        self.ensure_ready()?;
        Ok(KeyPair::from_seed(seed))
    }

    fn sign(
        &self,
        message: &[u8],
        public_key: &PublicKey,
        private_key: &PrivateKey,
    ) -> Result<Signature> {
        self.ensure_ready()?;
        Ok(private_key.sign(message, public_key)?)
    }

    fn verify(&self, signature: &Signature, message: &[u8], public_key: &PublicKey) -> Result<bool> {
        self.ensure_ready()?;
        Ok(public_key.verify(message, signature).is_ok())
    }

    fn sign_many(&self, batch: &BatchBuffer, stream: Stream, out: &mut [u8]) -> Result<()> {
        self.ensure_ready()?;
        self.check_batch(batch, LayoutKind::Sign, out.len(), SIGNATURE_SIZE)?;
        debug!(records = batch.len(), ?stream, "dispatching sign batch");

        let started = Instant::now();
        self.run(stream, || {
            out.par_chunks_mut(SIGNATURE_SIZE)
                .enumerate()
                .try_for_each(|(index, chunk)| -> Result<()> {
                    let slot = batch.slot(index)?;
                    let signature = slot
                        .private_key()
                        .sign(slot.message(), &slot.public_key())?;
                    chunk.copy_from_slice(signature.as_bytes());
                    Ok(())
                })
        })??;

        self.report("sign_many", batch.len(), stream, started);
        Ok(())
    }

    fn verify_many(&self, batch: &BatchBuffer, stream: Stream, out: &mut [u8]) -> Result<()> {
        self.ensure_ready()?;
        self.check_batch(batch, LayoutKind::Verify, out.len(), 1)?;
        debug!(records = batch.len(), ?stream, "dispatching verify batch");

        let started = Instant::now();
        self.run(stream, || {
            out.par_iter_mut()
                .enumerate()
                .try_for_each(|(index, verdict)| -> Result<()> {
                    let slot = batch.slot(index)?;
                    let valid = slot
                        .public_key()
                        .verify(slot.message(), &slot.signature())
                        .is_ok();
                    *verdict = u8::from(valid);
                    Ok(())
                })
        })??;

        self.report("verify_many", batch.len(), stream, started);
        Ok(())
    }
}
