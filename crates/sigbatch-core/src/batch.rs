//! Batch building: pack N records into one contiguous buffer plus the
//! offset table the backend uses to find each field.
//!
//! Construction is all-or-nothing. Every record is validated before the
//! buffer is allocated, so a bad record never yields a partial batch.

use bytes::Bytes;

use crate::crypto::{KeyPair, PrivateKey, PublicKey, Signature};
use crate::error::BuildError;
use crate::layout::{FieldOffsets, LayoutKind, PacketLayout, SLOT_SIZE};
use crate::slot::{field, Slot, SlotMut};
use crate::validation::validate_offset_table;

/// A record that can be packed into a slot.
pub trait Record {
    /// The layout this record is packed with.
    const KIND: LayoutKind;

    /// Private key or signature bytes.
    fn secondary(&self) -> &[u8];

    fn public_key(&self) -> &PublicKey;

    fn message(&self) -> &[u8];
}

/// One message to sign, with the key pair that signs it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignRecord {
    pub private_key: PrivateKey,
    pub public_key: PublicKey,
    pub message: Bytes,
}

impl SignRecord {
    pub fn new(key_pair: &KeyPair, message: impl Into<Bytes>) -> Self {
        Self {
            private_key: key_pair.private_key().clone(),
            public_key: *key_pair.public_key(),
            message: message.into(),
        }
    }
}

impl Record for SignRecord {
    const KIND: LayoutKind = LayoutKind::Sign;

    fn secondary(&self) -> &[u8] {
        self.private_key.as_bytes()
    }

    fn public_key(&self) -> &PublicKey {
        &self.public_key
    }

    fn message(&self) -> &[u8] {
        &self.message
    }
}

/// One signature to check against a message and public key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifyRecord {
    pub signature: Signature,
    pub public_key: PublicKey,
    pub message: Bytes,
}

impl VerifyRecord {
    pub fn new(signature: Signature, public_key: PublicKey, message: impl Into<Bytes>) -> Self {
        Self {
            signature,
            public_key,
            message: message.into(),
        }
    }
}

impl Record for VerifyRecord {
    const KIND: LayoutKind = LayoutKind::Verify;

    fn secondary(&self) -> &[u8] {
        self.signature.as_bytes()
    }

    fn public_key(&self) -> &PublicKey {
        &self.public_key
    }

    fn message(&self) -> &[u8] {
        &self.message
    }
}

/// One row of an [`OffsetTable`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OffsetEntry {
    pub message_len: u32,
    pub public_key_offset: u32,
    /// Private key (sign) or signature (verify) offset.
    pub secondary_offset: u32,
    pub message_start_offset: u32,
}

/// Per-record field positions, one entry per slot in slot order.
///
/// All four arrays always have the same length.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OffsetTable {
    pub message_lens: Vec<u32>,
    pub public_key_offsets: Vec<u32>,
    pub secondary_offsets: Vec<u32>,
    pub message_start_offsets: Vec<u32>,
}

impl OffsetTable {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            message_lens: Vec::with_capacity(capacity),
            public_key_offsets: Vec::with_capacity(capacity),
            secondary_offsets: Vec::with_capacity(capacity),
            message_start_offsets: Vec::with_capacity(capacity),
        }
    }

    /// Build the table for a layout from per-slot message lengths.
    pub fn for_layout(layout: &PacketLayout, message_lens: &[u32]) -> Self {
        let mut table = Self::with_capacity(message_lens.len());
        for (index, &len) in message_lens.iter().enumerate() {
            table.push(layout.offsets(index), len);
        }
        table
    }

    // Callers bound the batch by MAX_BATCH_SIZE, so every offset fits u32.
    fn push(&mut self, offsets: FieldOffsets, message_len: u32) {
        self.message_lens.push(message_len);
        self.public_key_offsets.push(offsets.public_key as u32);
        self.secondary_offsets.push(offsets.secondary as u32);
        self.message_start_offsets.push(offsets.message as u32);
    }

    pub fn len(&self) -> usize {
        self.message_lens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.message_lens.is_empty()
    }

    /// True when all four arrays have the same length.
    pub fn is_aligned(&self) -> bool {
        let n = self.message_lens.len();
        self.public_key_offsets.len() == n
            && self.secondary_offsets.len() == n
            && self.message_start_offsets.len() == n
    }

    pub fn entry(&self, index: usize) -> Option<OffsetEntry> {
        Some(OffsetEntry {
            message_len: *self.message_lens.get(index)?,
            public_key_offset: *self.public_key_offsets.get(index)?,
            secondary_offset: *self.secondary_offsets.get(index)?,
            message_start_offset: *self.message_start_offsets.get(index)?,
        })
    }

    pub fn entries(&self) -> impl Iterator<Item = OffsetEntry> + '_ {
        (0..self.len()).filter_map(|i| self.entry(i))
    }
}

/// A packed batch: slot bytes, offset table, and the layout they use.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchBuffer {
    kind: LayoutKind,
    bytes: Vec<u8>,
    offsets: OffsetTable,
}

impl BatchBuffer {
    /// Adopt a buffer the caller packed, given each slot's message length.
    ///
    /// The buffer must hold at least `message_lens.len()` slots, and every
    /// message must fit its slot and end inside the buffer.
    pub fn from_packed(kind: LayoutKind, bytes: Vec<u8>, message_lens: &[u32]) -> Result<Self, BuildError> {
        let batch_size = message_lens.len();
        PacketLayout::check_batch_size(batch_size)?;

        let min_len = batch_size * SLOT_SIZE;
        if bytes.len() < min_len {
            return Err(BuildError::LengthMismatch {
                expected: min_len,
                got: bytes.len(),
            });
        }

        let layout = PacketLayout::new(kind, batch_size);
        for (index, &len) in message_lens.iter().enumerate() {
            layout.check_message(index, len as usize)?;
            field(&bytes, layout.offsets(index).message, len as usize)?;
        }

        Ok(Self {
            kind,
            offsets: OffsetTable::for_layout(&layout, message_lens),
            bytes,
        })
    }

    /// Adopt a packed buffer together with a caller-supplied offset table.
    ///
    /// The table must match the layout exactly; see
    /// [`validate_offset_table`](crate::validation::validate_offset_table).
    pub fn from_parts(kind: LayoutKind, bytes: Vec<u8>, offsets: OffsetTable) -> Result<Self, BuildError> {
        validate_offset_table(&offsets, bytes.len(), kind)?;
        Ok(Self {
            kind,
            bytes,
            offsets,
        })
    }

    pub fn kind(&self) -> LayoutKind {
        self.kind
    }

    /// Number of slots.
    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }

    pub fn slot_size(&self) -> usize {
        SLOT_SIZE
    }

    pub fn layout(&self) -> PacketLayout {
        PacketLayout::new(self.kind, self.len())
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn offsets(&self) -> &OffsetTable {
        &self.offsets
    }

    /// Read slot `index` through the offset table.
    ///
    /// # Panics
    ///
    /// Panics if `index >= len()`.
    pub fn slot(&self, index: usize) -> Result<Slot<'_>, BuildError> {
        let entry = self
            .offsets
            .entry(index)
            .unwrap_or_else(|| panic!("slot index {index} out of range for batch of {}", self.len()));
        Slot::locate(&self.bytes, self.kind, entry)
    }
}

/// Incremental batch assembly.
///
/// ```
/// use sigbatch_core::{BatchBuilder, KeyPair, Seed, SignRecord};
///
/// let key_pair = KeyPair::from_seed(&Seed([7; 32]));
/// let batch = BatchBuilder::new()
///     .record(SignRecord::new(&key_pair, &b"a"[..]))
///     .record(SignRecord::new(&key_pair, &b"bb"[..]))
///     .build()
///     .unwrap();
/// assert_eq!(batch.len(), 2);
/// ```
#[derive(Debug, Clone)]
pub struct BatchBuilder<R> {
    records: Vec<R>,
}

impl<R: Record> BatchBuilder<R> {
    pub fn new() -> Self {
        Self {
            records: Vec::new(),
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            records: Vec::with_capacity(capacity),
        }
    }

    /// Add a record.
    pub fn record(mut self, record: R) -> Self {
        self.records.push(record);
        self
    }

    pub fn push(&mut self, record: R) {
        self.records.push(record);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Pack the records.
    pub fn build(&self) -> Result<BatchBuffer, BuildError> {
        pack(&self.records)
    }
}

impl<R: Record> Default for BatchBuilder<R> {
    fn default() -> Self {
        Self::new()
    }
}

/// Pack records to sign.
pub fn build_sign_batch(records: &[SignRecord]) -> Result<BatchBuffer, BuildError> {
    pack(records)
}

/// Pack records to verify.
pub fn build_verify_batch(records: &[VerifyRecord]) -> Result<BatchBuffer, BuildError> {
    pack(records)
}

fn pack<R: Record>(records: &[R]) -> Result<BatchBuffer, BuildError> {
    PacketLayout::check_batch_size(records.len())?;
    let layout = PacketLayout::new(R::KIND, records.len());

    for (index, record) in records.iter().enumerate() {
        layout.check_message(index, record.message().len())?;
    }

    let mut bytes = vec![0u8; layout.buffer_len()];
    let mut offsets = OffsetTable::with_capacity(records.len());
    for (index, record) in records.iter().enumerate() {
        let mut slot = SlotMut::new(&mut bytes, &layout, index)?;
        slot.write_secondary(record.secondary())?;
        slot.write_public_key(record.public_key());
        slot.write_message(record.message())?;
        offsets.push(layout.offsets(index), record.message().len() as u32);
    }

    Ok(BatchBuffer {
        kind: R::KIND,
        bytes,
        offsets,
    })
}
