//! Proptest generators for property-based testing.

use proptest::prelude::*;

use sigbatch_core::{KeyPair, Seed, SignRecord, SLOT_MESSAGE_CAPACITY};

/// Generate a random seed.
pub fn seed() -> impl Strategy<Value = Seed> {
    any::<[u8; 32]>().prop_map(Seed)
}

/// Generate a random key pair.
pub fn key_pair() -> impl Strategy<Value = KeyPair> {
    seed().prop_map(|seed| KeyPair::from_seed(&seed))
}

/// Generate message bytes of specified max length.
pub fn message(max_len: usize) -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), 0..=max_len)
}

/// Generate a record that fits any slot of a batch.
pub fn sign_record() -> impl Strategy<Value = SignRecord> {
    (key_pair(), message(SLOT_MESSAGE_CAPACITY)).prop_map(|(kp, m)| SignRecord::new(&kp, m))
}

/// Generate a batch of `1..=max_len` records.
pub fn sign_batch(max_len: usize) -> impl Strategy<Value = Vec<SignRecord>> {
    prop::collection::vec(sign_record(), 1..=max_len)
}

/// Parameters for a batch with some signatures corrupted.
#[derive(Debug, Clone)]
pub struct TamperParams {
    pub records: Vec<SignRecord>,
    /// Per record: `Some(bit)` flips that bit of its signature.
    pub flips: Vec<Option<usize>>,
}

impl Arbitrary for TamperParams {
    type Parameters = ();
    type Strategy = BoxedStrategy<Self>;

    fn arbitrary_with(_: Self::Parameters) -> Self::Strategy {
        sign_batch(24)
            .prop_flat_map(|records| {
                let n = records.len();
                (
                    Just(records),
                    prop::collection::vec(prop::option::of(0usize..512), n),
                )
            })
            .prop_map(|(records, flips)| TamperParams { records, flips })
            .boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{verify_records, TestFixture};
    use std::sync::OnceLock;

    fn fixture() -> &'static TestFixture {
        static FIXTURE: OnceLock<TestFixture> = OnceLock::new();
        FIXTURE.get_or_init(|| TestFixture::with_seed([0; 32]))
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn test_batch_sign_equals_single_sign(records in sign_batch(32)) {
            let fixture = fixture();
            let batched = fixture.engine.sign_batch(&records).unwrap();

            prop_assert_eq!(batched.len(), records.len());
            for (record, signature) in records.iter().zip(&batched) {
                let single = record.private_key.sign(&record.message, &record.public_key).unwrap();
                prop_assert_eq!(*signature, single);
            }
        }

        #[test]
        fn test_batch_verify_equals_single_verify(params: TamperParams) {
            let fixture = fixture();
            let mut signatures = fixture.engine.sign_batch(&params.records).unwrap();
            for (signature, flip) in signatures.iter_mut().zip(&params.flips) {
                if let Some(bit) = flip {
                    signature.0[bit / 8] ^= 1 << (bit % 8);
                }
            }

            let checks = verify_records(&params.records, &signatures);
            let verdicts = fixture.engine.verify_batch(&checks).unwrap();
            for ((check, verdict), flip) in checks.iter().zip(&verdicts).zip(&params.flips) {
                let single = fixture
                    .engine
                    .verify(&check.signature, &check.message, &check.public_key)
                    .unwrap();
                prop_assert_eq!(*verdict, single);
                prop_assert_eq!(*verdict, flip.is_none());
            }
        }

        #[test]
        fn test_key_pair_deterministic(seed in seed()) {
            prop_assert_eq!(KeyPair::from_seed(&seed), KeyPair::from_seed(&seed));
        }

        #[test]
        fn test_sign_then_verify(kp in key_pair(), m in message(512)) {
            let signature = kp.sign(&m);
            prop_assert!(kp.public_key().verify(&m, &signature).is_ok());
        }
    }
}
