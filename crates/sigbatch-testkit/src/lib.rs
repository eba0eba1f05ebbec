//! # Sigbatch Testkit
//!
//! Testing utilities for sigbatch.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Golden vectors**: RFC 8032 ed25519 cases checked through every signing path
//! - **Generators**: Proptest strategies for property-based testing
//! - **Fixtures**: Helper structs for setting up test scenarios
//!
//! ## Golden Vectors
//!
//! ```rust
//! use sigbatch_testkit::fixtures::TestFixture;
//! use sigbatch_testkit::vectors::verify_all_vectors;
//!
//! let fixture = TestFixture::with_seed([0; 32]);
//! assert_eq!(verify_all_vectors(&*fixture.engine).unwrap(), 3);
//! ```
//!
//! ## Property Testing
//!
//! ```rust,ignore
//! use proptest::prelude::*;
//! use sigbatch_testkit::generators::sign_batch;
//!
//! proptest! {
//!     #[test]
//!     fn batch_has_one_signature_per_record(records in sign_batch(16)) {
//!         let signatures = engine.sign_batch(&records).unwrap();
//!         prop_assert_eq!(signatures.len(), records.len());
//!     }
//! }
//! ```
//!
//! ## Test Fixtures
//!
//! ```rust
//! use sigbatch_testkit::fixtures::TestFixture;
//!
//! let fixture = TestFixture::new();
//! let records = fixture.sign_records(&[&b"hello"[..]]);
//! let checks = fixture.signed(&records);
//! assert_eq!(fixture.engine.verify_batch(&checks).unwrap(), vec![true]);
//! ```

pub mod fixtures;
pub mod generators;
pub mod vectors;

pub use fixtures::{key_pair, scripted_engine, verify_records, TestFixture};
pub use generators::TamperParams;
pub use vectors::{all_vectors, check_vector, verify_all_vectors, GoldenVector};
