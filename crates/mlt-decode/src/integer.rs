//! Integer stream decoding.
//!
//! Raw values are read with the stream's physical technique, then the logical
//! technique chain is undone:
//!
//! | technique 1           | transform                                        |
//! |-----------------------|--------------------------------------------------|
//! | `NONE`                | zigzag if signed                                 |
//! | `DELTA`               | optional RLE expansion, zigzag, running sum      |
//! | `RLE`                 | RLE expansion, zigzag if signed                  |
//! | `MORTON`              | running sum of codes, de-interleave, unshift     |
//! | `COMPONENTWISE_DELTA` | zigzag, running sum per x/y lane                 |
//!
//! The 64-bit lane supports `NONE`, `DELTA` and `RLE` only.

use crate::cursor::Cursor;
use crate::error::{DecodeError, DecodeResult};
use crate::rle::decode_unsigned_rle;
use crate::stream::{LogicalLevelTechnique, PhysicalLevelTechnique, StreamEncoding, StreamMetadata};
use crate::varint::{decode_varints, decode_varints_u64, decode_zigzag, decode_zigzag_u64};

/// Largest Morton curve precision that fits the 32-bit lane.
const MAX_MORTON_BITS: u32 = 16;

/// Decode a 32-bit integer stream whose header has just been read.
///
/// Unsigned columns come back with their bit patterns unchanged; reinterpret
/// with `as u32`. Morton streams produce interleaved `x, y` pairs.
pub fn decode_int_stream(
    cursor: &mut Cursor<'_>,
    metadata: &StreamMetadata,
    signed: bool,
) -> DecodeResult<Vec<i32>> {
    expect_varint(metadata)?;
    let mut body = metadata.body(cursor)?;
    let values = decode_varints(&mut body, metadata.num_values_usize())?;
    body.expect_end("varint stream")?;
    decode_int_array(&values, metadata, signed)
}

/// Decode an unsigned 32-bit stream such as lengths, offsets or indices.
#[allow(clippy::cast_sign_loss)]
pub fn decode_uint_stream(
    cursor: &mut Cursor<'_>,
    metadata: &StreamMetadata,
) -> DecodeResult<Vec<u32>> {
    Ok(decode_int_stream(cursor, metadata, false)?
        .into_iter()
        .map(|v| v as u32)
        .collect())
}

/// Decode a 64-bit integer stream whose header has just been read.
pub fn decode_long_stream(
    cursor: &mut Cursor<'_>,
    metadata: &StreamMetadata,
    signed: bool,
) -> DecodeResult<Vec<i64>> {
    expect_varint(metadata)?;
    let mut body = metadata.body(cursor)?;
    let values = decode_varints_u64(&mut body, metadata.num_values_usize())?;
    body.expect_end("varint stream")?;
    decode_long_array(&values, metadata, signed)
}

fn expect_varint(metadata: &StreamMetadata) -> DecodeResult<()> {
    match metadata.physical_level_technique {
        PhysicalLevelTechnique::Varint => Ok(()),
        other => Err(DecodeError::unsupported(
            metadata.offset,
            format!("physical level technique {other} for integer stream"),
        )),
    }
}

#[allow(clippy::cast_possible_wrap)]
fn decode_int_array(
    values: &[u32],
    metadata: &StreamMetadata,
    signed: bool,
) -> DecodeResult<Vec<i32>> {
    match metadata.logical_level_technique1 {
        LogicalLevelTechnique::None => Ok(if signed {
            values.iter().map(|&v| decode_zigzag(v)).collect()
        } else {
            values.iter().map(|&v| v as i32).collect()
        }),
        LogicalLevelTechnique::Delta => match metadata.logical_level_technique2 {
            LogicalLevelTechnique::None => Ok(decode_zigzag_delta(values)),
            LogicalLevelTechnique::Rle => {
                let expanded = expand_runs(values, metadata)?;
                Ok(decode_zigzag_delta(&expanded))
            }
            other => Err(unsupported_logical(metadata, other)),
        },
        LogicalLevelTechnique::Rle => {
            let expanded = expand_runs(values, metadata)?;
            Ok(if signed {
                expanded.iter().map(|&v| decode_zigzag(v)).collect()
            } else {
                expanded.iter().map(|&v| v as i32).collect()
            })
        }
        LogicalLevelTechnique::Morton => {
            let StreamEncoding::Morton {
                num_bits,
                coordinate_shift,
            } = metadata.encoding
            else {
                return Err(DecodeError::malformed(
                    metadata.offset,
                    "Morton stream without curve parameters",
                ));
            };
            if num_bits > MAX_MORTON_BITS {
                return Err(DecodeError::InvalidHeader {
                    field: "Morton bit count",
                    value: num_bits,
                    offset: metadata.offset,
                });
            }
            Ok(decode_morton_delta(values, num_bits, coordinate_shift))
        }
        LogicalLevelTechnique::ComponentwiseDelta => {
            if values.len() % 2 != 0 {
                return Err(DecodeError::malformed(
                    metadata.offset,
                    format!("componentwise delta stream has odd length {}", values.len()),
                ));
            }
            Ok(decode_componentwise_delta_vec2(values))
        }
        other @ LogicalLevelTechnique::Pde => Err(unsupported_logical(metadata, other)),
    }
}

#[allow(clippy::cast_possible_wrap)]
fn decode_long_array(
    values: &[u64],
    metadata: &StreamMetadata,
    signed: bool,
) -> DecodeResult<Vec<i64>> {
    match metadata.logical_level_technique1 {
        LogicalLevelTechnique::None => Ok(if signed {
            values.iter().map(|&v| decode_zigzag_u64(v)).collect()
        } else {
            values.iter().map(|&v| v as i64).collect()
        }),
        LogicalLevelTechnique::Delta => match metadata.logical_level_technique2 {
            LogicalLevelTechnique::None => Ok(decode_zigzag_delta_u64(values)),
            LogicalLevelTechnique::Rle => {
                let expanded = expand_runs(values, metadata)?;
                Ok(decode_zigzag_delta_u64(&expanded))
            }
            other => Err(unsupported_logical(metadata, other)),
        },
        LogicalLevelTechnique::Rle => {
            let expanded = expand_runs(values, metadata)?;
            Ok(if signed {
                expanded.iter().map(|&v| decode_zigzag_u64(v)).collect()
            } else {
                expanded.iter().map(|&v| v as i64).collect()
            })
        }
        other => Err(unsupported_logical(metadata, other)),
    }
}

fn expand_runs<T>(values: &[T], metadata: &StreamMetadata) -> DecodeResult<Vec<T>>
where
    T: Copy + Into<u64>,
{
    let StreamEncoding::Rle {
        runs,
        num_rle_values,
    } = metadata.encoding
    else {
        return Err(DecodeError::malformed(
            metadata.offset,
            "RLE stream without run metadata",
        ));
    };
    decode_unsigned_rle(
        values,
        runs as usize,
        num_rle_values as usize,
        metadata.offset,
    )
}

fn unsupported_logical(metadata: &StreamMetadata, technique: LogicalLevelTechnique) -> DecodeError {
    DecodeError::unsupported(
        metadata.offset,
        format!(
            "logical level technique {technique} (with {}) for integer stream",
            metadata.logical_level_technique2
        ),
    )
}

/// Zigzag-decode each delta and accumulate into absolute values.
#[must_use]
pub fn decode_zigzag_delta(values: &[u32]) -> Vec<i32> {
    let mut previous = 0i32;
    values
        .iter()
        .map(|&v| {
            previous = previous.wrapping_add(decode_zigzag(v));
            previous
        })
        .collect()
}

/// 64-bit variant of [`decode_zigzag_delta`].
#[must_use]
pub fn decode_zigzag_delta_u64(values: &[u64]) -> Vec<i64> {
    let mut previous = 0i64;
    values
        .iter()
        .map(|&v| {
            previous = previous.wrapping_add(decode_zigzag_u64(v));
            previous
        })
        .collect()
}

/// Undo delta coding of interleaved `x, y` pairs, each lane independently.
#[must_use]
pub fn decode_componentwise_delta_vec2(values: &[u32]) -> Vec<i32> {
    let mut decoded = Vec::with_capacity(values.len());
    let (mut x, mut y) = (0i32, 0i32);
    for pair in values.chunks_exact(2) {
        x = x.wrapping_add(decode_zigzag(pair[0]));
        y = y.wrapping_add(decode_zigzag(pair[1]));
        decoded.push(x);
        decoded.push(y);
    }
    decoded
}

/// Accumulate delta-coded Morton codes and split them into `x, y` pairs.
#[must_use]
pub fn decode_morton_delta(values: &[u32], num_bits: u32, coordinate_shift: u32) -> Vec<i32> {
    let mut vertices = Vec::with_capacity(values.len() * 2);
    let mut previous = 0u32;
    for &delta in values {
        let code = previous.wrapping_add(delta);
        let (x, y) = decode_morton_code(code, num_bits, coordinate_shift);
        vertices.push(x);
        vertices.push(y);
        previous = code;
    }
    vertices
}

/// Split one Morton code into its coordinates and remove the encoder's shift.
#[must_use]
#[allow(clippy::cast_possible_wrap)]
pub fn decode_morton_code(code: u32, num_bits: u32, coordinate_shift: u32) -> (i32, i32) {
    let x = compact_bits(code, num_bits);
    let y = compact_bits(code >> 1, num_bits);
    (
        (x as i32).wrapping_sub(coordinate_shift as i32),
        (y as i32).wrapping_sub(coordinate_shift as i32),
    )
}

/// Gather the even bits of `code` into the low `num_bits` bits.
fn compact_bits(code: u32, num_bits: u32) -> u32 {
    (0..num_bits).fold(0, |coordinate, i| {
        coordinate | (((code >> (2 * i)) & 1) << i)
    })
}
