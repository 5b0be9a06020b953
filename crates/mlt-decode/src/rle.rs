//! Run-length primitives.
//!
//! Byte RLE follows the ORC scheme: a header byte `h <= 0x7f` introduces a run
//! of `h + 3` copies of the following byte, a header `h > 0x7f` introduces
//! `256 - h` literal bytes. Boolean RLE is byte RLE over a packed bitset.

use bitvec::prelude::{BitVec, Lsb0};

use crate::cursor::Cursor;
use crate::error::{DecodeError, DecodeResult};

/// Packed booleans, bit `i` describing feature `i`.
pub type BitSet = BitVec<u8, Lsb0>;

/// Minimum length of a repeated run.
const MIN_REPEAT_SIZE: usize = 3;

/// Decode exactly `num_bytes` bytes of byte RLE.
pub fn decode_byte_rle(cursor: &mut Cursor<'_>, num_bytes: usize) -> DecodeResult<Vec<u8>> {
    let mut values = Vec::with_capacity(num_bytes.min(cursor.remaining().saturating_mul(128)));
    while values.len() < num_bytes {
        let header_offset = cursor.position();
        let header = cursor.read_u8()?;
        let (run_len, literal) = if header <= 0x7f {
            (usize::from(header) + MIN_REPEAT_SIZE, false)
        } else {
            (256 - usize::from(header), true)
        };
        if values.len() + run_len > num_bytes {
            return Err(DecodeError::malformed(
                header_offset,
                format!(
                    "byte RLE run of {run_len} overruns the {num_bytes} expected bytes"
                ),
            ));
        }
        if literal {
            values.extend_from_slice(cursor.read_bytes(run_len)?);
        } else {
            let value = cursor.read_u8()?;
            values.resize(values.len() + run_len, value);
        }
    }
    Ok(values)
}

/// Decode `num_booleans` boolean-RLE bits.
pub fn decode_boolean_rle(cursor: &mut Cursor<'_>, num_booleans: usize) -> DecodeResult<BitSet> {
    let bytes = decode_byte_rle(cursor, num_booleans.div_ceil(8))?;
    let mut bits = BitSet::from_vec(bytes);
    bits.truncate(num_booleans);
    Ok(bits)
}

/// Expand `num_runs` run/value pairs into `num_total_values` values.
///
/// `data` holds every run length first, then every value:
/// `[run_0, .., run_n, value_0, .., value_n]`. `offset` locates the stream for
/// error reporting.
pub fn decode_unsigned_rle<T>(
    data: &[T],
    num_runs: usize,
    num_total_values: usize,
    offset: usize,
) -> DecodeResult<Vec<T>>
where
    T: Copy + Into<u64>,
{
    if data.len() < num_runs.saturating_mul(2) {
        return Err(DecodeError::malformed(
            offset,
            format!(
                "RLE stream holds {} values, {num_runs} runs need {}",
                data.len(),
                num_runs * 2
            ),
        ));
    }
    let (runs, values) = data.split_at(num_runs);
    let lengths = || runs.iter().map(|&run| usize::try_from(Into::<u64>::into(run)));
    let total = lengths().try_fold(0usize, |total, run| {
        run.ok().and_then(|run| total.checked_add(run))
    });
    if total != Some(num_total_values) {
        return Err(DecodeError::malformed(
            offset,
            format!("RLE runs do not add up to the declared {num_total_values} values"),
        ));
    }
    let mut decoded = Vec::with_capacity(num_total_values);
    for (run, &value) in lengths().zip(values) {
        decoded.resize(decoded.len() + run.unwrap_or_default(), value);
    }
    Ok(decoded)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn byte_rle_runs_and_literals() {
        // Run of 5 x 9, then 3 literals.
        let data = [0x02, 9, 0xfd, 1, 2, 3];
        let mut cursor = Cursor::new(&data);
        let decoded = decode_byte_rle(&mut cursor, 8).unwrap();
        assert_eq!(decoded, vec![9, 9, 9, 9, 9, 1, 2, 3]);
        assert!(cursor.is_at_end());
    }

    #[test]
    fn byte_rle_overrun_is_malformed() {
        let data = [0x02, 9];
        let mut cursor = Cursor::new(&data);
        let err = decode_byte_rle(&mut cursor, 4).unwrap_err();
        assert!(matches!(err, DecodeError::MalformedStream { offset: 0, .. }));
    }

    #[test]
    fn byte_rle_truncated_literals() {
        let data = [0xfd, 1];
        let mut cursor = Cursor::new(&data);
        assert!(matches!(
            decode_byte_rle(&mut cursor, 3).unwrap_err(),
            DecodeError::BoundsViolation { .. }
        ));
    }

    #[test]
    fn boolean_rle_bit_order() {
        // One literal byte 0b0000_0101: features 0 and 2 set.
        let data = [0xff, 0b0000_0101];
        let mut cursor = Cursor::new(&data);
        let bits = decode_boolean_rle(&mut cursor, 3).unwrap();
        assert_eq!(bits.len(), 3);
        assert!(bits[0]);
        assert!(!bits[1]);
        assert!(bits[2]);
    }

    #[test]
    fn boolean_rle_spanning_bytes() {
        // Run of 3 x 0xff covers 24 bits, only 20 requested.
        let data = [0x00, 0xff];
        let mut cursor = Cursor::new(&data);
        let bits = decode_boolean_rle(&mut cursor, 20).unwrap();
        assert_eq!(bits.len(), 20);
        assert_eq!(bits.count_ones(), 20);
    }

    #[test]
    fn expands_runs() {
        let data = [2u32, 3, 10, 20];
        let decoded = decode_unsigned_rle(&data, 2, 5, 0).unwrap();
        assert_eq!(decoded, vec![10, 10, 20, 20, 20]);
    }

    #[test]
    fn expands_long_runs() {
        let data = [1u64, 2, u64::MAX, 7];
        let decoded = decode_unsigned_rle(&data, 2, 3, 0).unwrap();
        assert_eq!(decoded, vec![u64::MAX, 7, 7]);
    }

    #[test]
    fn run_count_mismatch_is_malformed() {
        let data = [2u32, 3, 10, 20];
        assert!(decode_unsigned_rle(&data, 2, 4, 0).is_err());
        assert!(decode_unsigned_rle(&data, 2, 6, 0).is_err());
        assert!(decode_unsigned_rle(&data, 3, 6, 0).is_err());
    }

    #[test]
    fn oversized_declared_count_fails_before_expanding() {
        let data = [2u32, 3, 10, 20];
        let err = decode_unsigned_rle(&data, 2, 1 << 28, 7).unwrap_err();
        assert!(matches!(err, DecodeError::MalformedStream { offset: 7, .. }));
    }
}
