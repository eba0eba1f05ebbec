//! # Sigbatch Core
//!
//! Pure primitives for batched ed25519 signing and verification: key
//! material, the packet layout, and batch building.
//!
//! This crate does no I/O and schedules no work. It turns records into a
//! packed buffer plus an offset table, and checks that a buffer and table
//! agree before anything reads them.
//!
//! ## Key Types
//!
//! - [`KeyPair`] - A public key and its 64-byte private key
//! - [`PacketLayout`] - Where each field of slot `i` lives
//! - [`BatchBuffer`] - Packed slots plus their [`OffsetTable`]
//! - [`BatchBuilder`] - Incremental, all-or-nothing batch assembly
//!
//! ## Layout
//!
//! Every record occupies one [`SLOT_SIZE`]-byte slot. See [`layout`].

pub mod batch;
pub mod crypto;
pub mod error;
pub mod layout;
pub mod slot;
pub mod validation;

pub use batch::{
    build_sign_batch, build_verify_batch, BatchBuffer, BatchBuilder, OffsetEntry, OffsetTable,
    Record, SignRecord, VerifyRecord,
};
pub use crypto::{KeyPair, PrivateKey, PublicKey, Seed, Signature};
pub use error::{BuildError, CoreError};
pub use layout::{
    FieldOffsets, LayoutKind, PacketLayout, MAX_BATCH_SIZE, MESSAGE_OFFSET, META_SIZE,
    PAYLOAD_SIZE, PRIVATE_KEY_SIZE, PUBLIC_KEY_OFFSET, PUBLIC_KEY_SIZE, SEED_SIZE,
    SIGNATURE_SIZE, SLOT_MESSAGE_CAPACITY, SLOT_SIZE, TRAILING_PAD,
};
pub use slot::{Slot, SlotMut};
pub use validation::{validate_batch, validate_offset_table};
