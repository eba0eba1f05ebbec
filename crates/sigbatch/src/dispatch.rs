//! Concurrent batch submission.
//!
//! Backend calls block until the whole batch is done, so each submission
//! runs on tokio's blocking pool against the non-default stream. Every task
//! owns its records and output; independent batches may overlap.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::debug;

use sigbatch_backend::{Backend, Stream};
use sigbatch_core::{SignRecord, Signature, VerifyRecord};

use crate::engine::Engine;
use crate::error::{EngineError, Result};

/// Sign `records` on the blocking pool.
pub fn spawn_sign_batch<B>(
    engine: Arc<Engine<B>>,
    records: Vec<SignRecord>,
) -> JoinHandle<Result<Vec<Signature>>>
where
    B: Backend + 'static,
{
    tokio::task::spawn_blocking(move || {
        engine
            .signer()
            .with_stream(Stream::NonDefault)
            .sign_batch(&records)
    })
}

/// Verify `records` on the blocking pool.
pub fn spawn_verify_batch<B>(
    engine: Arc<Engine<B>>,
    records: Vec<VerifyRecord>,
) -> JoinHandle<Result<Vec<bool>>>
where
    B: Backend + 'static,
{
    tokio::task::spawn_blocking(move || {
        engine
            .verifier()
            .with_stream(Stream::NonDefault)
            .verify_batch(&records)
    })
}

/// Sign several independent batches concurrently.
///
/// Results come back in submission order. The first failed batch fails the
/// call.
pub async fn sign_concurrent<B>(
    engine: Arc<Engine<B>>,
    batches: Vec<Vec<SignRecord>>,
) -> Result<Vec<Vec<Signature>>>
where
    B: Backend + 'static,
{
    debug!(batches = batches.len(), "submitting sign batches");
    let handles: Vec<_> = batches
        .into_iter()
        .map(|records| spawn_sign_batch(Arc::clone(&engine), records))
        .collect();
    join_in_order(handles).await
}

/// Verify several independent batches concurrently.
///
/// Results come back in submission order. The first failed batch fails the
/// call.
pub async fn verify_concurrent<B>(
    engine: Arc<Engine<B>>,
    batches: Vec<Vec<VerifyRecord>>,
) -> Result<Vec<Vec<bool>>>
where
    B: Backend + 'static,
{
    debug!(batches = batches.len(), "submitting verify batches");
    let handles: Vec<_> = batches
        .into_iter()
        .map(|records| spawn_verify_batch(Arc::clone(&engine), records))
        .collect();
    join_in_order(handles).await
}

/// Await `handles` in order, stopping at the first failure.
///
/// On failure the remaining tasks are aborted. A blocking task that has
/// already started cannot be interrupted; it runs to completion and its
/// result is discarded.
async fn join_in_order<T>(handles: Vec<JoinHandle<Result<T>>>) -> Result<Vec<T>> {
    let mut results = Vec::with_capacity(handles.len());
    let mut pending = handles.into_iter();
    while let Some(handle) = pending.next() {
        let outcome = match handle.await {
            Ok(result) => result,
            Err(e) => Err(EngineError::Join(e.to_string())),
        };
        match outcome {
            Ok(value) => results.push(value),
            Err(e) => {
                let aborted = pending.len();
                pending.for_each(|handle| handle.abort());
                debug!(aborted, "batch failed, aborting remaining submissions");
                return Err(e);
            }
        }
    }
    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use sigbatch_backend::CpuBackend;
    use sigbatch_core::{KeyPair, Seed};

    fn engine() -> Arc<Engine<CpuBackend>> {
        Arc::new(Engine::cpu(EngineConfig::default()).unwrap())
    }

    fn records(tag: u8, n: usize) -> Vec<SignRecord> {
        let kp = KeyPair::from_seed(&Seed([tag; 32]));
        (0..n)
            .map(|i| SignRecord::new(&kp, vec![tag, i as u8]))
            .collect()
    }

    #[tokio::test]
    async fn test_spawned_batch_matches_inline() {
        let engine = engine();
        let input = records(1, 8);
        let inline = engine.sign_batch(&input).unwrap();
        let spawned = spawn_sign_batch(Arc::clone(&engine), input)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(inline, spawned);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_concurrent_batches_keep_submission_order() {
        let engine = engine();
        let batches: Vec<_> = (0..4u8).map(|tag| records(tag, 5 + tag as usize)).collect();
        let expected: Vec<_> = batches
            .iter()
            .map(|b| engine.sign_batch(b).unwrap())
            .collect();

        let signed = sign_concurrent(Arc::clone(&engine), batches.clone())
            .await
            .unwrap();
        assert_eq!(signed, expected);

        let verify: Vec<Vec<VerifyRecord>> = batches
            .iter()
            .zip(&signed)
            .map(|(records, signatures)| {
                records
                    .iter()
                    .zip(signatures)
                    .map(|(r, s)| VerifyRecord::new(*s, r.public_key, r.message.clone()))
                    .collect()
            })
            .collect();
        let verdicts = verify_concurrent(engine, verify).await.unwrap();
        assert!(verdicts.iter().flatten().all(|&ok| ok));
    }

    #[tokio::test]
    async fn test_failed_batch_fails_call() {
        let engine = engine();
        let result = sign_concurrent(engine, vec![records(1, 2), Vec::new()]).await;
        assert!(matches!(result, Err(EngineError::Build(_))));
    }

    #[tokio::test]
    async fn test_failure_aborts_remaining_tasks() {
        let (alive, dropped) = tokio::sync::oneshot::channel::<()>();
        let failing: JoinHandle<Result<()>> =
            tokio::spawn(async { Err(EngineError::Config("rejected".into())) });
        let stalled: JoinHandle<Result<()>> = tokio::spawn(async move {
            let _alive = alive;
            std::future::pending::<()>().await;
            Ok(())
        });

        let result = join_in_order(vec![failing, stalled]).await;
        assert!(matches!(result, Err(EngineError::Config(_))));

        // The stalled task only drops its sender once aborted.
        let closed = tokio::time::timeout(std::time::Duration::from_secs(5), dropped).await;
        assert!(matches!(closed, Ok(Err(_))));
    }
}
