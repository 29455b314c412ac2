use crate::{Decomposed, Error, Result};

/// Number of bits holding the elapsed time in 10 ms ticks.
pub const BIT_LEN_TIME: u32 = 39;

/// Number of bits holding the per-tick sequence.
pub const BIT_LEN_SEQUENCE: u32 = 8;

/// Number of bits holding the machine ID. The top bit of the `u64` stays clear.
pub const BIT_LEN_MACHINE_ID: u32 = 63 - (BIT_LEN_TIME + BIT_LEN_SEQUENCE);

/// Largest representable elapsed time, in ticks.
pub const MAX_ELAPSED_TIME: u64 = (1 << BIT_LEN_TIME) - 1;

/// Largest sequence value within a single tick.
pub const MAX_SEQUENCE: u8 = u8::MAX;

/// Largest machine ID.
pub const MAX_MACHINE_ID: u16 = u16::MAX;

/// Number of bits to shift the time field to its position (bit 24).
pub const TIME_SHIFT: u32 = BIT_LEN_SEQUENCE + BIT_LEN_MACHINE_ID;

/// Number of bits to shift the sequence field to its position (bit 16).
pub const SEQUENCE_SHIFT: u32 = BIT_LEN_MACHINE_ID;

/// Bitmask selecting the sequence field of a packed ID.
pub const SEQUENCE_MASK: u64 = (MAX_SEQUENCE as u64) << SEQUENCE_SHIFT;

/// Bitmask selecting the machine ID field of a packed ID.
pub const MACHINE_ID_MASK: u64 = MAX_MACHINE_ID as u64;

/// Packs the three fields into a 63-bit ID.
///
/// # Errors
///
/// Returns [`Error::TimeOverflow`] when `elapsed_time` does not fit in
/// [`BIT_LEN_TIME`] bits. The sequence and machine ID are bounded by their
/// types.
///
/// # Example
/// ```
/// use sonyflake::{decompose, encode};
///
/// let id = encode(42, 3, 0x7F7F).unwrap();
/// assert_eq!(id, (42 << 24) | (3 << 16) | 0x7F7F);
///
/// let parts = decompose(id);
/// assert_eq!((parts.time, parts.sequence, parts.machine_id), (42, 3, 0x7F7F));
/// ```
pub const fn encode(elapsed_time: u64, sequence: u8, machine_id: u16) -> Result<u64> {
    if elapsed_time > MAX_ELAPSED_TIME {
        return Err(Error::TimeOverflow);
    }
    Ok((elapsed_time << TIME_SHIFT)
        | ((sequence as u64) << SEQUENCE_SHIFT)
        | machine_id as u64)
}

/// Splits an ID into its fields.
///
/// No validation is done: `msb` is reported as-is so callers can detect IDs
/// that were not produced by this layout.
pub const fn decompose(id: u64) -> Decomposed {
    Decomposed {
        id,
        msb: (id >> 63) as u8,
        time: (id >> TIME_SHIFT) & MAX_ELAPSED_TIME,
        sequence: ((id & SEQUENCE_MASK) >> SEQUENCE_SHIFT) as u8,
        machine_id: (id & MACHINE_ID_MASK) as u16,
    }
}
