//! Fault-injecting backend wrapper.
//!
//! This is primarily for testing. It forwards to an inner backend and
//! breaks the calls it was told to break, so callers can exercise init
//! failure, entropy failure, batch failure, and out-of-contract verdicts.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use sigbatch_core::{BatchBuffer, KeyPair, PrivateKey, PublicKey, Seed, Signature};

use crate::error::{BackendError, Result};
use crate::traits::{Backend, Stream};

/// Faults a [`ScriptedBackend`] injects.
#[derive(Debug, Clone, Default)]
struct Script {
    fail_init: bool,
    fail_seed: bool,
    fail_batches: Option<String>,
    verdict: Option<(usize, u8)>,
}

/// Backend wrapper that injects scripted faults.
///
/// Faults are fixed at construction. Batch sizes seen by `sign_many` and
/// `verify_many` are recorded in call order.
pub struct ScriptedBackend<B> {
    inner: B,
    script: Script,
    batch_calls: AtomicUsize,
    batch_sizes: Mutex<Vec<usize>>,
}

impl<B: Backend> ScriptedBackend<B> {
    /// Wrap `inner` with no faults.
    pub fn new(inner: B) -> Self {
        Self {
            inner,
            script: Script::default(),
            batch_calls: AtomicUsize::new(0),
            batch_sizes: Mutex::new(Vec::new()),
        }
    }

    /// Make `init` report failure.
    pub fn fail_init(mut self) -> Self {
        self.script.fail_init = true;
        self
    }

    /// Make `create_seed` report an entropy failure.
    pub fn fail_seed(mut self) -> Self {
        self.script.fail_seed = true;
        self
    }

    /// Make every batch call fail with `reason`.
    pub fn fail_batches(mut self, reason: impl Into<String>) -> Self {
        self.script.fail_batches = Some(reason.into());
        self
    }

    /// Overwrite verdict `index` of every `verify_many` call with `value`.
    pub fn override_verdict(mut self, index: usize, value: u8) -> Self {
        self.script.verdict = Some((index, value));
        self
    }

    pub fn inner(&self) -> &B {
        &self.inner
    }

    /// Number of batch calls that reached this backend.
    pub fn batch_calls(&self) -> usize {
        self.batch_calls.load(Ordering::SeqCst)
    }

    /// Sizes of the batches seen so far, in call order.
    pub fn batch_sizes(&self) -> Vec<usize> {
        self.batch_sizes
            .lock()
            .map(|sizes| sizes.clone())
            .unwrap_or_default()
    }

    fn record_batch(&self, batch: &BatchBuffer) -> Result<()> {
        self.batch_calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut sizes) = self.batch_sizes.lock() {
            sizes.push(batch.len());
        }
        match &self.script.fail_batches {
            Some(reason) => Err(BackendError::Failed(reason.clone())),
            None => Ok(()),
        }
    }
}

impl<B: Backend> Backend for ScriptedBackend<B> {
    fn init(&self) -> bool {
        !self.script.fail_init && self.inner.init()
    }

    fn set_verbose(&self, verbose: bool) {
        self.inner.set_verbose(verbose);
    }

    fn license(&self) -> &'static str {
        self.inner.license()
    }

    fn create_seed(&self) -> Result<Seed> {
        if self.script.fail_seed {
            return Err(BackendError::Entropy("scripted entropy failure".into()));
        }
        self.inner.create_seed()
    }

    fn create_key_pair(&self, seed: &Seed) -> Result<KeyPair> {
        self.inner.create_key_pair(seed)
    }

    fn sign(
        &self,
        message: &[u8],
        public_key: &PublicKey,
        private_key: &PrivateKey,
    ) -> Result<Signature> {
        self.inner.sign(message, public_key, private_key)
    }

    fn verify(&self, signature: &Signature, message: &[u8], public_key: &PublicKey) -> Result<bool> {
        self.inner.verify(signature, message, public_key)
    }

    fn sign_many(&self, batch: &BatchBuffer, stream: Stream, out: &mut [u8]) -> Result<()> {
        self.record_batch(batch)?;
        self.inner.sign_many(batch, stream, out)
    }

    fn verify_many(&self, batch: &BatchBuffer, stream: Stream, out: &mut [u8]) -> Result<()> {
        self.record_batch(batch)?;
        self.inner.verify_many(batch, stream, out)?;
        if let Some((index, value)) = self.script.verdict {
            if let Some(verdict) = out.get_mut(index) {
                *verdict = value;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cpu::CpuBackend;
    use sigbatch_core::{build_verify_batch, VerifyRecord};

    fn verify_batch(n: u8) -> BatchBuffer {
        let records: Vec<_> = (0..n)
            .map(|i| {
                let kp = KeyPair::from_seed(&Seed([i; 32]));
                VerifyRecord::new(kp.sign(b"x"), *kp.public_key(), &b"x"[..])
            })
            .collect();
        build_verify_batch(&records).unwrap()
    }

    #[test]
    fn test_passthrough_without_faults() {
        let backend = ScriptedBackend::new(CpuBackend::default());
        assert!(backend.init());
        let batch = verify_batch(3);
        let mut out = [0u8; 3];
        backend.verify_many(&batch, Stream::Default, &mut out).unwrap();
        assert_eq!(out, [1, 1, 1]);
        assert_eq!(backend.batch_calls(), 1);
        assert_eq!(backend.batch_sizes(), vec![3]);
    }

    #[test]
    fn test_fail_init() {
        let backend = ScriptedBackend::new(CpuBackend::default()).fail_init();
        assert!(!backend.init());
        assert!(!backend.inner().is_initialized());
    }

    #[test]
    fn test_fail_seed() {
        let backend = ScriptedBackend::new(CpuBackend::default()).fail_seed();
        assert!(backend.init());
        assert!(matches!(backend.create_seed(), Err(BackendError::Entropy(_))));
    }

    #[test]
    fn test_override_verdict() {
        let backend = ScriptedBackend::new(CpuBackend::default()).override_verdict(1, 2);
        assert!(backend.init());
        let batch = verify_batch(3);
        let mut out = [0u8; 3];
        backend.verify_many(&batch, Stream::Default, &mut out).unwrap();
        assert_eq!(out, [1, 2, 1]);
    }

    #[test]
    fn test_fail_batches() {
        let backend = ScriptedBackend::new(CpuBackend::default()).fail_batches("device lost");
        assert!(backend.init());
        let batch = verify_batch(2);
        let mut out = [7u8; 2];
        let err = backend
            .verify_many(&batch, Stream::Default, &mut out)
            .unwrap_err();
        assert_eq!(err.to_string(), "backend failure: device lost");
        assert_eq!(out, [7, 7]);
    }
}
