//! Packet layout: where each field of a record lives inside a batch buffer.
//!
//! A batch buffer is a run of fixed-size slots, one per record:
//!
//! ```text
//!  slot i (552 bytes, starts at i * 552)
//! +----------------------------+------------+------------------------------
//! | private key / signature 64 | pubkey 32  | message (len from offset table)
//! +----------------------------+------------+------------------------------
//!  0                            64           96
//! ```
//!
//! The byte positions are a wire contract with the backend and must stay
//! bit-exact.

use crate::error::BuildError;

/// Maximum message bytes per record.
pub const PAYLOAD_SIZE: usize = 512;

/// Per-packet metadata allowance carried in every slot.
pub const META_SIZE: usize = 40;

/// Slot stride.
pub const SLOT_SIZE: usize = PAYLOAD_SIZE + META_SIZE;

pub const PUBLIC_KEY_SIZE: usize = 32;
pub const PRIVATE_KEY_SIZE: usize = 64;
pub const SIGNATURE_SIZE: usize = 64;
pub const SEED_SIZE: usize = 32;

/// Offset of the public key inside a slot (both layouts).
pub const PUBLIC_KEY_OFFSET: usize = PRIVATE_KEY_SIZE;

/// Offset of the message inside a slot (both layouts).
pub const MESSAGE_OFFSET: usize = PUBLIC_KEY_OFFSET + PUBLIC_KEY_SIZE;

/// Message bytes that fit before the next slot begins.
pub const SLOT_MESSAGE_CAPACITY: usize = SLOT_SIZE - MESSAGE_OFFSET;

/// Zero bytes appended after the last slot so a full-size message in the
/// final slot stays inside the buffer.
pub const TRAILING_PAD: usize = MESSAGE_OFFSET + PAYLOAD_SIZE - SLOT_SIZE;

/// Largest batch whose offsets fit the backend's `u32` offset arrays.
pub const MAX_BATCH_SIZE: usize = u32::MAX as usize / SLOT_SIZE;

// Both layouts share the public key and message offsets.
const _: () = assert!(PRIVATE_KEY_SIZE == SIGNATURE_SIZE);

/// Which record shape a batch carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LayoutKind {
    /// `private_key || public_key || message`
    Sign,
    /// `signature || public_key || message`
    Verify,
}

impl LayoutKind {
    /// Size of the leading field (private key or signature).
    pub const fn secondary_size(self) -> usize {
        match self {
            Self::Sign => PRIVATE_KEY_SIZE,
            Self::Verify => SIGNATURE_SIZE,
        }
    }

    /// Field offsets of slot `index`. Pure arithmetic, no bounds check.
    pub const fn offsets_at(self, index: usize) -> FieldOffsets {
        let base = index * SLOT_SIZE;
        FieldOffsets {
            secondary: base,
            public_key: base + self.secondary_size(),
            message: base + self.secondary_size() + PUBLIC_KEY_SIZE,
        }
    }
}

/// Absolute byte offsets of one slot's fields within a batch buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldOffsets {
    /// Private key (sign layout) or signature (verify layout).
    pub secondary: usize,
    pub public_key: usize,
    pub message: usize,
}

/// The layout of one batch: a kind and a slot count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PacketLayout {
    kind: LayoutKind,
    batch_size: usize,
}

impl PacketLayout {
    /// Create a layout for `batch_size` slots.
    pub const fn new(kind: LayoutKind, batch_size: usize) -> Self {
        Self { kind, batch_size }
    }

    pub const fn kind(&self) -> LayoutKind {
        self.kind
    }

    pub const fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Total buffer length including the trailing pad.
    pub const fn buffer_len(&self) -> usize {
        self.batch_size * SLOT_SIZE + TRAILING_PAD
    }

    /// Field offsets of slot `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index >= batch_size`.
    pub fn offsets(&self, index: usize) -> FieldOffsets {
        assert!(
            index < self.batch_size,
            "slot index {index} out of range for batch of {}",
            self.batch_size
        );
        self.kind.offsets_at(index)
    }

    /// Message bytes slot `index` may hold.
    ///
    /// Only the final slot may use the full payload size; earlier slots
    /// would spill into their successor's key field.
    pub const fn message_capacity(&self, index: usize) -> usize {
        if index + 1 == self.batch_size {
            PAYLOAD_SIZE
        } else {
            SLOT_MESSAGE_CAPACITY
        }
    }

    /// Check that a message of `len` bytes may be placed in slot `index`.
    pub fn check_message(&self, index: usize, len: usize) -> Result<(), BuildError> {
        if len > PAYLOAD_SIZE {
            return Err(BuildError::MessageTooLong {
                index,
                len,
                max: PAYLOAD_SIZE,
            });
        }
        let capacity = self.message_capacity(index);
        if len > capacity {
            return Err(BuildError::SlotOverflow {
                index,
                len,
                capacity,
            });
        }
        Ok(())
    }

    /// Reject empty and oversized batches.
    pub fn check_batch_size(batch_size: usize) -> Result<(), BuildError> {
        if batch_size == 0 {
            return Err(BuildError::EmptyBatch);
        }
        if batch_size > MAX_BATCH_SIZE {
            return Err(BuildError::BatchTooLarge {
                size: batch_size,
                max: MAX_BATCH_SIZE,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_constants() {
        assert_eq!(SLOT_SIZE, 552);
        assert_eq!(PUBLIC_KEY_OFFSET, 64);
        assert_eq!(MESSAGE_OFFSET, 96);
        assert_eq!(SLOT_MESSAGE_CAPACITY, 456);
        assert_eq!(TRAILING_PAD, 56);
    }

    #[test]
    fn test_sign_offsets() {
        let layout = PacketLayout::new(LayoutKind::Sign, 3);
        assert_eq!(
            layout.offsets(0),
            FieldOffsets {
                secondary: 0,
                public_key: 64,
                message: 96
            }
        );
        assert_eq!(
            layout.offsets(2),
            FieldOffsets {
                secondary: 1104,
                public_key: 1168,
                message: 1200
            }
        );
    }

    #[test]
    fn test_verify_offsets_match_table() {
        let layout = PacketLayout::new(LayoutKind::Verify, 2);
        let o = layout.offsets(1);
        assert_eq!(o.secondary, 552);
        assert_eq!(o.public_key, 552 + 64);
        assert_eq!(o.message, 552 + 96);
    }

    #[test]
    fn test_offsets_monotonic_and_disjoint() {
        let layout = PacketLayout::new(LayoutKind::Sign, 64);
        for i in 1..64 {
            let prev = layout.offsets(i - 1);
            let cur = layout.offsets(i);
            assert!(cur.secondary > prev.message);
            assert_eq!(cur.secondary - prev.secondary, SLOT_SIZE);
            assert!(prev.message + SLOT_MESSAGE_CAPACITY <= cur.secondary);
        }
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn test_offsets_out_of_range_panics() {
        PacketLayout::new(LayoutKind::Sign, 2).offsets(2);
    }

    #[test]
    fn test_message_capacity() {
        let layout = PacketLayout::new(LayoutKind::Sign, 2);
        assert_eq!(layout.message_capacity(0), SLOT_MESSAGE_CAPACITY);
        assert_eq!(layout.message_capacity(1), PAYLOAD_SIZE);

        assert!(layout.check_message(1, 512).is_ok());
        assert!(matches!(
            layout.check_message(1, 513),
            Err(BuildError::MessageTooLong { index: 1, len: 513, .. })
        ));
        assert!(matches!(
            layout.check_message(0, 457),
            Err(BuildError::SlotOverflow { index: 0, .. })
        ));
    }

    #[test]
    fn test_batch_size_bounds() {
        assert_eq!(PacketLayout::check_batch_size(0), Err(BuildError::EmptyBatch));
        assert!(PacketLayout::check_batch_size(1).is_ok());
        assert!(PacketLayout::check_batch_size(MAX_BATCH_SIZE).is_ok());
        assert!(matches!(
            PacketLayout::check_batch_size(MAX_BATCH_SIZE + 1),
            Err(BuildError::BatchTooLarge { .. })
        ));
    }

    #[test]
    fn test_last_offset_fits_u32() {
        let layout = PacketLayout::new(LayoutKind::Sign, MAX_BATCH_SIZE);
        let last = layout.offsets(MAX_BATCH_SIZE - 1);
        assert!(u32::try_from(last.message).is_ok());
    }
}
