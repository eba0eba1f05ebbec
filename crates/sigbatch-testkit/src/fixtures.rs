//! Test fixtures and helpers.
//!
//! Common setup code for integration tests and benchmarks.

use std::sync::Arc;

use sigbatch::{Engine, EngineConfig};
use sigbatch_backend::{CpuBackend, ScriptedBackend};
use sigbatch_core::{KeyPair, Seed, SignRecord, Signature, VerifyRecord};

/// A test fixture with an engine on the CPU backend and a signing key pair.
pub struct TestFixture {
    pub engine: Arc<Engine<CpuBackend>>,
    pub key_pair: KeyPair,
}

impl TestFixture {
    /// Create a new test fixture with a random key pair.
    pub fn new() -> Self {
        Self::with_seed(rand::random())
    }

    /// Create with a deterministic key pair from seed.
    pub fn with_seed(seed: [u8; 32]) -> Self {
        Self::with_config(seed, EngineConfig::default())
    }

    /// Create with a deterministic key pair and a custom engine config.
    ///
    /// # Panics
    ///
    /// Panics if the engine cannot start.
    pub fn with_config(seed: [u8; 32], config: EngineConfig) -> Self {
        let engine = Engine::cpu(config).expect("cpu engine should start");
        Self {
            engine: Arc::new(engine),
            key_pair: KeyPair::from_seed(&Seed(seed)),
        }
    }

    /// Records for `messages`, all signed by the fixture's key pair.
    pub fn sign_records(&self, messages: &[&[u8]]) -> Vec<SignRecord> {
        messages
            .iter()
            .map(|m| SignRecord::new(&self.key_pair, m.to_vec()))
            .collect()
    }

    /// `count` records of `message_len` bytes, record `i` signed by
    /// [`key_pair`]`(i)`.
    pub fn distinct_records(&self, count: usize, message_len: usize) -> Vec<SignRecord> {
        (0..count)
            .map(|i| {
                let mut message = vec![0u8; message_len];
                for (j, byte) in message.iter_mut().enumerate() {
                    *byte = (i + j) as u8;
                }
                SignRecord::new(&key_pair(i), message)
            })
            .collect()
    }

    /// Sign `records` in one batch and return the matching verify records.
    ///
    /// # Panics
    ///
    /// Panics if signing fails.
    pub fn signed(&self, records: &[SignRecord]) -> Vec<VerifyRecord> {
        let signatures = self
            .engine
            .sign_batch(records)
            .expect("batch signing should succeed");
        verify_records(records, &signatures)
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}

/// Deterministic key pair number `n`.
pub fn key_pair(n: usize) -> KeyPair {
    let mut seed = [0u8; 32];
    seed[..8].copy_from_slice(&(n as u64).to_le_bytes());
    seed[31] = 0xA5;
    KeyPair::from_seed(&Seed(seed))
}

/// Pair each sign record with its signature.
pub fn verify_records(records: &[SignRecord], signatures: &[Signature]) -> Vec<VerifyRecord> {
    records
        .iter()
        .zip(signatures)
        .map(|(r, s)| VerifyRecord::new(*s, r.public_key, r.message.clone()))
        .collect()
}

/// An engine whose CPU backend is wrapped by `script`.
///
/// # Panics
///
/// Panics if the scripted backend refuses to start.
pub fn scripted_engine<F>(script: F) -> Engine<ScriptedBackend<CpuBackend>>
where
    F: FnOnce(ScriptedBackend<CpuBackend>) -> ScriptedBackend<CpuBackend>,
{
    let backend = script(ScriptedBackend::new(CpuBackend::default()));
    Engine::new(backend, EngineConfig::default()).expect("scripted engine should start")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixture_signs_and_verifies() {
        let fixture = TestFixture::with_seed([0x42; 32]);
        let records = fixture.sign_records(&[&b"one"[..], &b"two"[..]]);
        let checks = fixture.signed(&records);
        assert_eq!(fixture.engine.verify_batch(&checks).unwrap(), vec![true, true]);
    }

    #[test]
    fn test_key_pairs_are_distinct_and_stable() {
        assert_eq!(key_pair(3), key_pair(3));
        assert_ne!(key_pair(3).public_key(), key_pair(4).public_key());
    }

    #[test]
    fn test_scripted_engine_applies_script() {
        let engine = scripted_engine(|b| b.override_verdict(0, 3));
        let fixture = TestFixture::with_seed([1; 32]);
        let checks = fixture.signed(&fixture.distinct_records(2, 16));
        assert!(matches!(
            engine.verify_batch(&checks),
            Err(sigbatch::EngineError::Contract { index: 0, value: 3 })
        ));
    }

    #[tokio::test]
    async fn test_fixture_engine_is_shareable() {
        let fixture = TestFixture::with_seed([9; 32]);
        let records = fixture.distinct_records(6, 40);
        let signatures = sigbatch::dispatch::spawn_sign_batch(Arc::clone(&fixture.engine), records.clone())
            .await
            .unwrap()
            .unwrap();
        let verdicts = fixture
            .engine
            .verify_batch(&verify_records(&records, &signatures))
            .unwrap();
        assert!(verdicts.into_iter().all(|ok| ok));
    }
}
