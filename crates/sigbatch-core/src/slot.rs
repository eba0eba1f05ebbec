//! Bounds-checked views over a single slot of a batch buffer.
//!
//! Writers get a [`SlotMut`] whose slice ends where the slot's message
//! capacity ends, so a record can never spill into its neighbour. Readers
//! locate a [`Slot`] from an offset table entry; every field is checked
//! against the buffer before it is handed out.

use crate::batch::OffsetEntry;
use crate::crypto::{PrivateKey, PublicKey, Signature};
use crate::error::BuildError;
use crate::layout::{LayoutKind, PacketLayout, MESSAGE_OFFSET, PUBLIC_KEY_OFFSET, PUBLIC_KEY_SIZE};

/// Borrow `len` bytes at `offset`, or report the overrun.
pub(crate) fn field(buffer: &[u8], offset: usize, len: usize) -> Result<&[u8], BuildError> {
    offset
        .checked_add(len)
        .and_then(|end| buffer.get(offset..end))
        .ok_or(BuildError::FieldOutOfBounds {
            offset,
            len,
            buffer_len: buffer.len(),
        })
}

fn fixed<const N: usize>(buffer: &[u8], offset: usize) -> Result<&[u8; N], BuildError> {
    let bytes = field(buffer, offset, N)?;
    bytes.try_into().map_err(|_| BuildError::FieldOutOfBounds {
        offset,
        len: N,
        buffer_len: buffer.len(),
    })
}

/// Writable view of one slot.
#[derive(Debug)]
pub struct SlotMut<'a> {
    index: usize,
    kind: LayoutKind,
    bytes: &'a mut [u8],
}

impl<'a> SlotMut<'a> {
    /// Carve slot `index` out of `buffer`.
    ///
    /// The returned view covers the key fields plus the slot's message
    /// capacity and nothing else.
    pub fn new(buffer: &'a mut [u8], layout: &PacketLayout, index: usize) -> Result<Self, BuildError> {
        let start = layout.offsets(index).secondary;
        let len = MESSAGE_OFFSET + layout.message_capacity(index);
        let buffer_len = buffer.len();
        let bytes = buffer
            .get_mut(start..start + len)
            .ok_or(BuildError::FieldOutOfBounds {
                offset: start,
                len,
                buffer_len,
            })?;

        Ok(Self {
            index,
            kind: layout.kind(),
            bytes,
        })
    }

    /// Write the leading field: private key (sign) or signature (verify).
    pub fn write_secondary(&mut self, secondary: &[u8]) -> Result<(), BuildError> {
        let size = self.kind.secondary_size();
        if secondary.len() != size {
            return Err(BuildError::LengthMismatch {
                expected: size,
                got: secondary.len(),
            });
        }
        self.bytes[..size].copy_from_slice(secondary);
        Ok(())
    }

    pub fn write_public_key(&mut self, public_key: &PublicKey) {
        self.bytes[PUBLIC_KEY_OFFSET..PUBLIC_KEY_OFFSET + PUBLIC_KEY_SIZE]
            .copy_from_slice(public_key.as_bytes());
    }

    /// Write the message. Fails instead of truncating.
    pub fn write_message(&mut self, message: &[u8]) -> Result<(), BuildError> {
        let capacity = self.bytes.len() - MESSAGE_OFFSET;
        if message.len() > capacity {
            return Err(BuildError::SlotOverflow {
                index: self.index,
                len: message.len(),
                capacity,
            });
        }
        self.bytes[MESSAGE_OFFSET..MESSAGE_OFFSET + message.len()].copy_from_slice(message);
        Ok(())
    }
}

/// Read-only view of one slot, located through an offset table entry.
#[derive(Debug, Clone, Copy)]
pub struct Slot<'a> {
    kind: LayoutKind,
    secondary: &'a [u8; 64],
    public_key: &'a [u8; PUBLIC_KEY_SIZE],
    message: &'a [u8],
}

impl<'a> Slot<'a> {
    /// Resolve every field of `entry` inside `buffer`.
    pub fn locate(buffer: &'a [u8], kind: LayoutKind, entry: OffsetEntry) -> Result<Self, BuildError> {
        Ok(Self {
            kind,
            secondary: fixed::<64>(buffer, entry.secondary_offset as usize)?,
            public_key: fixed::<PUBLIC_KEY_SIZE>(buffer, entry.public_key_offset as usize)?,
            message: field(
                buffer,
                entry.message_start_offset as usize,
                entry.message_len as usize,
            )?,
        })
    }

    pub fn kind(&self) -> LayoutKind {
        self.kind
    }

    /// Private key of a sign-layout slot.
    pub fn private_key(&self) -> PrivateKey {
        debug_assert_eq!(self.kind, LayoutKind::Sign);
        PrivateKey(*self.secondary)
    }

    /// Signature of a verify-layout slot.
    pub fn signature(&self) -> Signature {
        debug_assert_eq!(self.kind, LayoutKind::Verify);
        Signature(*self.secondary)
    }

    pub fn public_key(&self) -> PublicKey {
        PublicKey(*self.public_key)
    }

    pub fn message(&self) -> &'a [u8] {
        self.message
    }
}
