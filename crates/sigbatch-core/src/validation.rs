//! Offset table validation.
//!
//! A table that reaches the backend must describe exactly the layout's
//! slots: aligned arrays, offsets where the layout puts them, and messages
//! that fit their slots and end inside the buffer.

use crate::batch::{BatchBuffer, OffsetTable};
use crate::error::BuildError;
use crate::layout::{LayoutKind, PacketLayout};

/// Check `table` against a buffer of `buffer_len` bytes packed with `kind`.
pub fn validate_offset_table(
    table: &OffsetTable,
    buffer_len: usize,
    kind: LayoutKind,
) -> Result<(), BuildError> {
    if !table.is_aligned() {
        let expected = table.message_lens.len();
        let got = [
            table.public_key_offsets.len(),
            table.secondary_offsets.len(),
            table.message_start_offsets.len(),
        ]
        .into_iter()
        .find(|&len| len != expected)
        .unwrap_or(expected);
        return Err(BuildError::LengthMismatch { expected, got });
    }

    PacketLayout::check_batch_size(table.len())?;
    let layout = PacketLayout::new(kind, table.len());

    for (index, entry) in table.entries().enumerate() {
        let expected = layout.offsets(index);
        if entry.secondary_offset as usize != expected.secondary
            || entry.public_key_offset as usize != expected.public_key
            || entry.message_start_offset as usize != expected.message
        {
            return Err(BuildError::LayoutMismatch { index, kind });
        }

        let len = entry.message_len as usize;
        layout.check_message(index, len)?;

        if expected.message + len > buffer_len {
            return Err(BuildError::FieldOutOfBounds {
                offset: expected.message,
                len,
                buffer_len,
            });
        }
    }

    Ok(())
}

/// Check a packed batch against its own offset table.
pub fn validate_batch(batch: &BatchBuffer) -> Result<(), BuildError> {
    validate_offset_table(batch.offsets(), batch.bytes().len(), batch.kind())
}
