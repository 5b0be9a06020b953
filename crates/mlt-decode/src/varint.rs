//! Varint and zigzag primitives.
//!
//! Varints are LEB128: seven payload bits per byte, least significant group
//! first, high bit set on every byte except the last.

use crate::cursor::Cursor;
use crate::error::{DecodeError, DecodeResult};

/// Longest encoding accepted for a 32-bit lane value.
const MAX_VARINT32_BYTES: u32 = 4;

/// Read a single varint of at most four bytes (28 payload bits).
///
/// A fourth byte with its continuation bit set means the value needs a fifth
/// byte, which no 32-bit lane value may use.
pub fn read_varint(cursor: &mut Cursor<'_>) -> DecodeResult<u32> {
    let start = cursor.position();
    let mut value = 0u32;
    for i in 0..MAX_VARINT32_BYTES {
        let byte = cursor.read_u8()?;
        value |= u32::from(byte & 0x7f) << (7 * i);
        if byte & 0x80 == 0 {
            return Ok(value);
        }
    }
    Err(DecodeError::VarintOverflow {
        offset: start,
        bits: 7 * MAX_VARINT32_BYTES,
    })
}

/// Read a single varint of up to ten bytes into a `u64`.
pub fn read_varint_u64(cursor: &mut Cursor<'_>) -> DecodeResult<u64> {
    let start = cursor.position();
    let mut value = 0u64;
    let mut shift = 0u32;
    loop {
        let byte = cursor.read_u8()?;
        let payload = u64::from(byte & 0x7f);
        // The tenth byte may only contribute the single remaining bit.
        if shift == 63 && payload > 1 {
            return Err(DecodeError::VarintOverflow {
                offset: start,
                bits: 64,
            });
        }
        value |= payload << shift;
        if byte & 0x80 == 0 {
            return Ok(value);
        }
        shift += 7;
        if shift >= 64 {
            return Err(DecodeError::VarintOverflow {
                offset: start,
                bits: 64,
            });
        }
    }
}

/// Read `count` consecutive 32-bit lane varints.
pub fn decode_varints(cursor: &mut Cursor<'_>, count: usize) -> DecodeResult<Vec<u32>> {
    let mut values = Vec::with_capacity(count.min(cursor.remaining()));
    for _ in 0..count {
        values.push(read_varint(cursor)?);
    }
    Ok(values)
}

/// Read `count` consecutive 64-bit lane varints.
pub fn decode_varints_u64(cursor: &mut Cursor<'_>, count: usize) -> DecodeResult<Vec<u64>> {
    let mut values = Vec::with_capacity(count.min(cursor.remaining()));
    for _ in 0..count {
        values.push(read_varint_u64(cursor)?);
    }
    Ok(values)
}

/// Inverse of zigzag encoding: `0, 1, 2, 3, ...` maps to `0, -1, 1, -2, ...`.
#[must_use]
#[allow(clippy::cast_possible_wrap)]
pub const fn decode_zigzag(value: u32) -> i32 {
    ((value >> 1) as i32) ^ -((value & 1) as i32)
}

/// 64-bit variant of [`decode_zigzag`].
#[must_use]
#[allow(clippy::cast_possible_wrap)]
pub const fn decode_zigzag_u64(value: u64) -> i64 {
    ((value >> 1) as i64) ^ -((value & 1) as i64)
}

/// Zigzag-encode a signed value so small magnitudes become small unsigned values.
#[cfg(any(test, feature = "test-tools"))]
#[must_use]
#[allow(clippy::cast_sign_loss)]
pub const fn encode_zigzag(value: i32) -> u32 {
    ((value << 1) ^ (value >> 31)) as u32
}

/// 64-bit variant of [`encode_zigzag`].
#[cfg(any(test, feature = "test-tools"))]
#[must_use]
#[allow(clippy::cast_sign_loss)]
pub const fn encode_zigzag_i64(value: i64) -> u64 {
    ((value << 1) ^ (value >> 63)) as u64
}
