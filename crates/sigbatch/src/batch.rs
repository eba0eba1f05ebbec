//! Batch signing and verification over a backend.
//!
//! A [`BatchSigner`] packs records, hands the buffer to the backend, and
//! splits the output back into signatures. A [`BatchVerifier`] does the same
//! for verdicts. Inputs above the configured batch size are packed into
//! several buffers and submitted one after another; results keep input order.
//!
//! Every buffer is built before the first backend call, so a bad record
//! anywhere in the input fails the call without doing any work.

use tracing::debug;

use sigbatch_backend::{Backend, Stream};
use sigbatch_core::{
    build_sign_batch, build_verify_batch, BatchBuffer, BuildError, PacketLayout, Record,
    SignRecord, Signature, VerifyRecord, MAX_BATCH_SIZE, SIGNATURE_SIZE,
};

use crate::error::{EngineError, Result};

/// Signs batches of records on a backend.
#[derive(Debug)]
pub struct BatchSigner<'a, B> {
    backend: &'a B,
    stream: Stream,
    max_batch_size: usize,
}

impl<'a, B: Backend> BatchSigner<'a, B> {
    /// `max_batch_size` is clamped to `1..=MAX_BATCH_SIZE`.
    pub fn new(backend: &'a B, stream: Stream, max_batch_size: usize) -> Self {
        Self {
            backend,
            stream,
            max_batch_size: max_batch_size.clamp(1, MAX_BATCH_SIZE),
        }
    }

    /// Submit on `stream` instead.
    pub fn with_stream(mut self, stream: Stream) -> Self {
        self.stream = stream;
        self
    }

    pub fn stream(&self) -> Stream {
        self.stream
    }

    /// Sign every record. Signature `i` belongs to record `i`.
    pub fn sign_batch(&self, records: &[SignRecord]) -> Result<Vec<Signature>> {
        let batches = build_chunks(records, self.max_batch_size, build_sign_batch)?;

        let mut signatures = Vec::with_capacity(records.len());
        for batch in &batches {
            signatures.extend(self.sign_packed(batch)?);
        }
        Ok(signatures)
    }

    /// Sign a batch the caller already packed.
    pub fn sign_packed(&self, batch: &BatchBuffer) -> Result<Vec<Signature>> {
        let mut out = vec![0u8; batch.len() * SIGNATURE_SIZE];
        self.backend.sign_many(batch, self.stream, &mut out)?;

        Ok(out
            .chunks_exact(SIGNATURE_SIZE)
            .map(|chunk| {
                let mut bytes = [0u8; SIGNATURE_SIZE];
                bytes.copy_from_slice(chunk);
                Signature(bytes)
            })
            .collect())
    }
}

/// Verifies batches of records on a backend.
#[derive(Debug)]
pub struct BatchVerifier<'a, B> {
    backend: &'a B,
    stream: Stream,
    max_batch_size: usize,
}

impl<'a, B: Backend> BatchVerifier<'a, B> {
    /// `max_batch_size` is clamped to `1..=MAX_BATCH_SIZE`.
    pub fn new(backend: &'a B, stream: Stream, max_batch_size: usize) -> Self {
        Self {
            backend,
            stream,
            max_batch_size: max_batch_size.clamp(1, MAX_BATCH_SIZE),
        }
    }

    /// Submit on `stream` instead.
    pub fn with_stream(mut self, stream: Stream) -> Self {
        self.stream = stream;
        self
    }

    pub fn stream(&self) -> Stream {
        self.stream
    }

    /// Verify every record. Verdict `i` belongs to record `i`.
    ///
    /// An invalid signature is `false`, not an error.
    pub fn verify_batch(&self, records: &[VerifyRecord]) -> Result<Vec<bool>> {
        let batches = build_chunks(records, self.max_batch_size, build_verify_batch)?;

        let mut verdicts = Vec::with_capacity(records.len());
        for batch in &batches {
            let base = verdicts.len();
            let out = self.run(batch)?;
            verdicts.extend(decode_verdicts(&out, base)?);
        }
        Ok(verdicts)
    }

    /// Verify a batch the caller already packed.
    pub fn verify_packed(&self, batch: &BatchBuffer) -> Result<Vec<bool>> {
        let out = self.run(batch)?;
        decode_verdicts(&out, 0)
    }

    fn run(&self, batch: &BatchBuffer) -> Result<Vec<u8>> {
        let mut out = vec![0u8; batch.len()];
        self.backend.verify_many(batch, self.stream, &mut out)?;
        Ok(out)
    }
}

/// Map verdict bytes to booleans. `base` is the input index of `out[0]`.
fn decode_verdicts(out: &[u8], base: usize) -> Result<Vec<bool>> {
    out.iter()
        .enumerate()
        .map(|(i, &value)| match value {
            0 => Ok(false),
            1 => Ok(true),
            value => Err(EngineError::Contract {
                index: base + i,
                value,
            }),
        })
        .collect()
}

/// Pack `records` into buffers of at most `max_batch_size` slots.
///
/// Message capacity is checked against the whole input, so only the final
/// input record may use the full payload whatever the chunk size.
fn build_chunks<R: Record>(
    records: &[R],
    max_batch_size: usize,
    build: fn(&[R]) -> std::result::Result<BatchBuffer, BuildError>,
) -> Result<Vec<BatchBuffer>> {
    if records.is_empty() {
        return Err(BuildError::EmptyBatch.into());
    }

    let layout = PacketLayout::new(R::KIND, records.len());
    for (index, record) in records.iter().enumerate() {
        layout.check_message(index, record.message().len())?;
    }

    let chunks = records.len().div_ceil(max_batch_size);
    if chunks > 1 {
        debug!(records = records.len(), chunks, max_batch_size, "splitting batch");
    }

    records
        .chunks(max_batch_size)
        .enumerate()
        .map(|(n, chunk)| build(chunk).map_err(|e| rebase(e, n * max_batch_size).into()))
        .collect()
}

/// Shift a chunk-relative record index to an input index.
fn rebase(err: BuildError, base: usize) -> BuildError {
    match err {
        BuildError::MessageTooLong { index, len, max } => BuildError::MessageTooLong {
            index: index + base,
            len,
            max,
        },
        BuildError::SlotOverflow {
            index,
            len,
            capacity,
        } => BuildError::SlotOverflow {
            index: index + base,
            len,
            capacity,
        },
        BuildError::LayoutMismatch { index, kind } => BuildError::LayoutMismatch {
            index: index + base,
            kind,
        },
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_MAX_BATCH_SIZE;
    use sigbatch_backend::{CpuBackend, ScriptedBackend};
    use sigbatch_core::{KeyPair, Seed, PAYLOAD_SIZE, SLOT_MESSAGE_CAPACITY};

    fn backend() -> CpuBackend {
        let backend = CpuBackend::default();
        assert!(backend.init());
        backend
    }

    fn sign_records(n: usize) -> Vec<SignRecord> {
        (0..n)
            .map(|i| {
                let kp = KeyPair::from_seed(&Seed([i as u8; 32]));
                SignRecord::new(&kp, format!("message {i}").into_bytes())
            })
            .collect()
    }

    #[test]
    fn test_sign_batch_matches_single() {
        let backend = backend();
        let records = sign_records(5);
        let signatures = BatchSigner::new(&backend, Stream::Default, 64)
            .sign_batch(&records)
            .unwrap();

        assert_eq!(signatures.len(), 5);
        for (record, signature) in records.iter().zip(&signatures) {
            let single = record.private_key.sign(&record.message, &record.public_key).unwrap();
            assert_eq!(*signature, single);
        }
    }

    #[test]
    fn test_chunked_sign_preserves_order() {
        let backend = ScriptedBackend::new(backend());
        let records = sign_records(10);
        let chunked = BatchSigner::new(&backend, Stream::Default, 3)
            .sign_batch(&records)
            .unwrap();
        assert_eq!(backend.batch_sizes(), vec![3, 3, 3, 1]);

        let whole = BatchSigner::new(&backend, Stream::Default, 64)
            .sign_batch(&records)
            .unwrap();
        assert_eq!(chunked, whole);
    }

    #[test]
    fn test_empty_input_rejected() {
        let backend = backend();
        assert!(matches!(
            BatchSigner::new(&backend, Stream::Default, 8).sign_batch(&[]),
            Err(EngineError::Build(BuildError::EmptyBatch))
        ));
        assert!(matches!(
            BatchVerifier::new(&backend, Stream::Default, 8).verify_batch(&[]),
            Err(EngineError::Build(BuildError::EmptyBatch))
        ));
    }

    #[test]
    fn test_error_index_is_input_index() {
        let backend = ScriptedBackend::new(backend());
        let mut records = sign_records(7);
        let kp = KeyPair::from_seed(&Seed([1; 32]));
        records[5] = SignRecord::new(&kp, vec![0u8; PAYLOAD_SIZE + 1]);

        let err = BatchSigner::new(&backend, Stream::Default, 2)
            .sign_batch(&records)
            .unwrap_err();
        assert!(matches!(
            err,
            EngineError::Build(BuildError::MessageTooLong { index: 5, .. })
        ));
        // Nothing was dispatched.
        assert_eq!(backend.batch_calls(), 0);
    }

    #[test]
    fn test_slot_capacity_independent_of_chunk_size() {
        let backend = ScriptedBackend::new(backend());
        let kp = KeyPair::from_seed(&Seed([3; 32]));
        let records: Vec<_> = (0..4).map(|_| SignRecord::new(&kp, vec![0u8; 500])).collect();

        for max_batch_size in [1, 2, DEFAULT_MAX_BATCH_SIZE] {
            let err = BatchSigner::new(&backend, Stream::Default, max_batch_size)
                .sign_batch(&records)
                .unwrap_err();
            assert!(matches!(
                err,
                EngineError::Build(BuildError::SlotOverflow {
                    index: 0,
                    len: 500,
                    capacity: SLOT_MESSAGE_CAPACITY
                })
            ));
        }
        assert_eq!(backend.batch_calls(), 0);
    }

    #[test]
    fn test_full_payload_allowed_in_final_input_record_only() {
        let backend = ScriptedBackend::new(backend());
        let mut records = sign_records(3);
        let kp = KeyPair::from_seed(&Seed([4; 32]));
        records.push(SignRecord::new(&kp, vec![0x5A; PAYLOAD_SIZE]));

        for max_batch_size in [1, 3, DEFAULT_MAX_BATCH_SIZE] {
            let signatures = BatchSigner::new(&backend, Stream::Default, max_batch_size)
                .sign_batch(&records)
                .unwrap();
            assert_eq!(signatures[3], kp.sign(&[0x5A; PAYLOAD_SIZE]));
        }
    }

    #[test]
    fn test_contract_violation_reports_input_index() {
        let backend = ScriptedBackend::new(backend()).override_verdict(1, 7);
        let records: Vec<_> = sign_records(4)
            .into_iter()
            .map(|r| {
                let signature = r.private_key.sign(&r.message, &r.public_key).unwrap();
                VerifyRecord::new(signature, r.public_key, r.message)
            })
            .collect();

        let err = BatchVerifier::new(&backend, Stream::Default, 2)
            .verify_batch(&records)
            .unwrap_err();
        assert!(matches!(err, EngineError::Contract { index: 1, value: 7 }));
    }

    #[test]
    fn test_decode_verdicts() {
        assert_eq!(decode_verdicts(&[1, 0, 1], 0).unwrap(), vec![true, false, true]);
        assert!(matches!(
            decode_verdicts(&[1, 0xFF], 10),
            Err(EngineError::Contract {
                index: 11,
                value: 0xFF
            })
        ));
    }

    #[test]
    fn test_zero_max_batch_size_clamped() {
        let backend = backend();
        let signer = BatchSigner::new(&backend, Stream::Default, 0);
        assert_eq!(signer.sign_batch(&sign_records(2)).unwrap().len(), 2);
    }
}
