//! String column decoding.
//!
//! A string column is a set of sub-streams identified by their headers:
//!
//! | stream                        | role                                   |
//! |-------------------------------|----------------------------------------|
//! | `PRESENT`                     | nullability bitset                     |
//! | `OFFSET`                      | dictionary index per present value     |
//! | `LENGTH` `VAR_BINARY`/`DICTIONARY` | byte length per entry or value    |
//! | `DATA` `NONE`                 | concatenated values (plain layout)     |
//! | `DATA` `SINGLE`               | concatenated dictionary entries        |
//!
//! `LENGTH` `SYMBOL` and any other `DATA` kind belong to FSST symbol tables,
//! which are not supported.

use std::str;

use tracing::debug;

use crate::cursor::Cursor;
use crate::error::{DecodeError, DecodeResult};
use crate::integer::decode_uint_stream;
use crate::property::decode_present_stream;
use crate::rle::BitSet;
use crate::stream::{ByteLayout, DictionaryType, LengthType, PhysicalStreamType, StreamMetadata};

/// Raw bytes of a data stream along with where they start in the tile.
struct ByteStream<'a> {
    bytes: &'a [u8],
    offset: usize,
}

#[derive(Default)]
struct StringStreams<'a> {
    present: Option<BitSet>,
    offsets: Option<Vec<u32>>,
    lengths: Option<(Vec<u32>, usize)>,
    data: Option<ByteStream<'a>>,
    dictionary: Option<ByteStream<'a>>,
}

/// Decode a string column of `num_streams` streams.
///
/// Without a present stream every value is present and the value count comes
/// from the offset stream (dictionary layout) or the length stream (plain
/// layout).
pub fn decode_string_column(
    cursor: &mut Cursor<'_>,
    num_streams: u32,
) -> DecodeResult<Vec<Option<String>>> {
    let column_offset = cursor.position();
    let mut streams = StringStreams::default();
    for _ in 0..num_streams {
        let metadata = StreamMetadata::decode(cursor)?;
        match metadata.physical_stream_type {
            PhysicalStreamType::Present => {
                let present = decode_present_stream(cursor, &metadata)?;
                set_once(&mut streams.present, present, &metadata)?;
            }
            PhysicalStreamType::Offset => {
                let offsets = decode_uint_stream(cursor, &metadata)?;
                set_once(&mut streams.offsets, offsets, &metadata)?;
            }
            PhysicalStreamType::Length => match metadata.length_type() {
                Some(LengthType::VarBinary | LengthType::Dictionary) => {
                    let lengths = decode_uint_stream(cursor, &metadata)?;
                    set_once(&mut streams.lengths, (lengths, metadata.offset), &metadata)?;
                }
                Some(LengthType::Symbol) => {
                    return Err(DecodeError::unsupported(
                        metadata.offset,
                        "FSST symbol length stream",
                    ));
                }
                other => {
                    return Err(DecodeError::malformed(
                        metadata.offset,
                        format!("unexpected length stream {other:?} in string column"),
                    ));
                }
            },
            PhysicalStreamType::Data => {
                metadata.expect_byte_layout(ByteLayout::Bytes, "string data stream")?;
                let bytes = ByteStream {
                    bytes: metadata.body(cursor)?.read_bytes(metadata.byte_length as usize)?,
                    offset: metadata.offset,
                };
                match metadata.dictionary_type() {
                    Some(DictionaryType::None) => set_once(&mut streams.data, bytes, &metadata)?,
                    Some(DictionaryType::Single) => {
                        set_once(&mut streams.dictionary, bytes, &metadata)?;
                    }
                    other => {
                        return Err(DecodeError::unsupported(
                            metadata.offset,
                            format!("FSST symbol table stream ({other:?} dictionary)"),
                        ));
                    }
                }
            }
        }
    }

    if streams.dictionary.is_some() {
        decode_dictionary(streams, column_offset)
    } else {
        decode_plain(streams, column_offset)
    }
}

fn decode_dictionary(
    streams: StringStreams<'_>,
    column_offset: usize,
) -> DecodeResult<Vec<Option<String>>> {
    let StringStreams {
        present,
        offsets,
        lengths,
        dictionary,
        ..
    } = streams;
    let (dictionary, (lengths, lengths_offset)) = dictionary.zip(lengths).ok_or_else(|| {
        DecodeError::malformed(column_offset, "dictionary string column without lengths")
    })?;
    let offsets = offsets.ok_or_else(|| {
        DecodeError::malformed(column_offset, "dictionary string column without offsets")
    })?;
    let entries = split_utf8(&dictionary, &lengths, lengths_offset)?;
    let num_values = present.as_ref().map_or(offsets.len(), BitSet::len);

    let mut indices = offsets.iter();
    let mut values = Vec::with_capacity(num_values);
    for i in 0..num_values {
        if !is_present(present.as_ref(), i) {
            values.push(None);
            continue;
        }
        let entry = indices
            .next()
            .and_then(|&index| entries.get(index as usize))
            .ok_or_else(|| {
                DecodeError::malformed(
                    column_offset,
                    format!("no dictionary entry for value {i} of {num_values}"),
                )
            })?;
        values.push(Some((*entry).to_owned()));
    }
    log_unused(indices.len(), column_offset);
    Ok(values)
}

fn decode_plain(
    streams: StringStreams<'_>,
    column_offset: usize,
) -> DecodeResult<Vec<Option<String>>> {
    let StringStreams {
        present,
        offsets,
        lengths,
        data,
        ..
    } = streams;
    if offsets.is_some() {
        return Err(DecodeError::malformed(
            column_offset,
            "offset stream in a string column without dictionary",
        ));
    }
    let (data, (lengths, lengths_offset)) = data.zip(lengths).ok_or_else(|| {
        DecodeError::malformed(column_offset, "string column needs a data and a length stream")
    })?;
    let num_values = present.as_ref().map_or(lengths.len(), BitSet::len);

    let mut spans = lengths.iter();
    let mut position = 0usize;
    let mut values = Vec::with_capacity(num_values);
    for i in 0..num_values {
        if !is_present(present.as_ref(), i) {
            values.push(None);
            continue;
        }
        let len = *spans.next().ok_or_else(|| {
            DecodeError::malformed(
                column_offset,
                format!("no length for string value {i} of {num_values}"),
            )
        })? as usize;
        let span = position
            .checked_add(len)
            .and_then(|end| data.bytes.get(position..end))
            .ok_or(DecodeError::BoundsViolation {
                offset: data.offset,
                needed: position.saturating_add(len),
                available: data.bytes.len(),
            })?;
        let value = str::from_utf8(span).map_err(|source| DecodeError::InvalidUtf8 {
            offset: data.offset,
            source,
        })?;
        values.push(Some(value.to_owned()));
        position += len;
    }
    if position != data.bytes.len() {
        return Err(DecodeError::malformed(
            lengths_offset,
            format!(
                "{} string bytes not covered by lengths",
                data.bytes.len() - position
            ),
        ));
    }
    log_unused(spans.len(), column_offset);
    Ok(values)
}

/// Split `bytes` into consecutive UTF-8 entries of the given lengths.
fn split_utf8<'a>(
    dictionary: &ByteStream<'a>,
    lengths: &[u32],
    lengths_offset: usize,
) -> DecodeResult<Vec<&'a str>> {
    let mut entries = Vec::with_capacity(lengths.len());
    let mut rest = dictionary.bytes;
    for &len in lengths {
        let len = len as usize;
        if len > rest.len() {
            return Err(DecodeError::malformed(
                lengths_offset,
                format!(
                    "dictionary entry of {len} bytes exceeds the {} remaining",
                    rest.len()
                ),
            ));
        }
        let (entry, tail) = rest.split_at(len);
        let entry = str::from_utf8(entry).map_err(|source| DecodeError::InvalidUtf8 {
            offset: dictionary.offset,
            source,
        })?;
        entries.push(entry);
        rest = tail;
    }
    if !rest.is_empty() {
        return Err(DecodeError::malformed(
            lengths_offset,
            format!("{} dictionary bytes not covered by lengths", rest.len()),
        ));
    }
    Ok(entries)
}

fn is_present(present: Option<&BitSet>, index: usize) -> bool {
    present.is_none_or(|bits| bits[index])
}

fn log_unused(unused: usize, column_offset: usize) {
    if unused > 0 {
        debug!(unused, column_offset, "string column carries unused values");
    }
}

fn set_once<T>(slot: &mut Option<T>, value: T, metadata: &StreamMetadata) -> DecodeResult<()> {
    if slot.replace(value).is_some() {
        return Err(DecodeError::malformed(
            metadata.offset,
            format!("duplicate {:?} stream", metadata.physical_stream_type),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream::{LogicalLevelTechnique, OffsetType, PhysicalLevelTechnique};
    use crate::test_utils::{StreamBuilder, present_stream};

    fn decode(streams: &[Vec<u8>]) -> DecodeResult<Vec<Option<String>>> {
        let data = streams.concat();
        let mut cursor = Cursor::new(&data);
        #[allow(clippy::cast_possible_truncation)]
        let values = decode_string_column(&mut cursor, streams.len() as u32)?;
        assert!(cursor.is_at_end());
        Ok(values)
    }

    fn owned(values: &[Option<&str>]) -> Vec<Option<String>> {
        values.iter().map(|v| v.map(str::to_owned)).collect()
    }

    #[test]
    fn dictionary_with_present_stream() {
        // Offsets are consumed one per present value, so the fourth feature
        // takes the third offset.
        let streams = [
            present_stream(&[true, true, false, true]),
            StreamBuilder::offset(OffsetType::String).varints(&[1, 0, 1]),
            StreamBuilder::length(LengthType::Dictionary).varints(&[3, 6]),
            StreamBuilder::dictionary(DictionaryType::Single).raw(2, b"foobarbaz"),
        ];
        assert_eq!(
            decode(&streams).unwrap(),
            owned(&[Some("barbaz"), Some("foo"), None, Some("barbaz")])
        );

        let streams = [
            present_stream(&[true, true, false, true]),
            StreamBuilder::offset(OffsetType::String).varints(&[1, 0, 0]),
            StreamBuilder::length(LengthType::Dictionary).varints(&[3, 6]),
            StreamBuilder::dictionary(DictionaryType::Single).raw(2, b"foobarbaz"),
        ];
        assert_eq!(
            decode(&streams).unwrap(),
            owned(&[Some("barbaz"), Some("foo"), None, Some("foo")])
        );
    }

    #[test]
    fn dictionary_without_present_is_dense() {
        let streams = [
            StreamBuilder::length(LengthType::Dictionary).varints(&[1, 2]),
            StreamBuilder::dictionary(DictionaryType::Single).raw(2, b"abc"),
            StreamBuilder::offset(OffsetType::String).varints(&[0, 1, 1]),
        ];
        assert_eq!(
            decode(&streams).unwrap(),
            owned(&[Some("a"), Some("bc"), Some("bc")])
        );
    }

    #[test]
    fn plain_layout() {
        let streams = [
            present_stream(&[false, true, true]),
            StreamBuilder::length(LengthType::VarBinary).varints(&[5, 4]),
            StreamBuilder::data().raw(9, "riverlake".as_bytes()),
        ];
        assert_eq!(
            decode(&streams).unwrap(),
            owned(&[None, Some("river"), Some("lake")])
        );
    }

    #[test]
    fn plain_multibyte_utf8() {
        let streams = [
            StreamBuilder::length(LengthType::VarBinary).varints(&[7, 1]),
            StreamBuilder::data().raw(8, "Zürichx".as_bytes()),
        ];
        assert_eq!(decode(&streams).unwrap(), owned(&[Some("Zürich"), Some("x")]));
    }

    #[test]
    fn out_of_range_index_is_malformed() {
        let streams = [
            StreamBuilder::length(LengthType::Dictionary).varints(&[1]),
            StreamBuilder::dictionary(DictionaryType::Single).raw(1, b"a"),
            StreamBuilder::offset(OffsetType::String).varints(&[3]),
        ];
        assert!(matches!(
            decode(&streams).unwrap_err(),
            DecodeError::MalformedStream { .. }
        ));
    }

    #[test]
    fn invalid_utf8_is_reported() {
        let streams = [
            StreamBuilder::length(LengthType::VarBinary).varints(&[2]),
            StreamBuilder::data().raw(2, &[0xc3, 0x28]),
        ];
        assert!(matches!(
            decode(&streams).unwrap_err(),
            DecodeError::InvalidUtf8 { .. }
        ));
    }

    #[test]
    fn plain_bytes_beyond_lengths_are_malformed() {
        let streams = [
            StreamBuilder::length(LengthType::VarBinary).varints(&[5]),
            StreamBuilder::data().raw(1, b"riverlake"),
        ];
        assert!(matches!(
            decode(&streams).unwrap_err(),
            DecodeError::MalformedStream { .. }
        ));
    }

    #[test]
    fn offsets_without_dictionary_are_malformed() {
        let streams = [
            StreamBuilder::offset(OffsetType::String).varints(&[0]),
            StreamBuilder::length(LengthType::VarBinary).varints(&[4]),
            StreamBuilder::data().raw(1, b"lake"),
        ];
        assert!(matches!(
            decode(&streams).unwrap_err(),
            DecodeError::MalformedStream { .. }
        ));
    }

    #[test]
    fn transformed_data_stream_is_unsupported() {
        let streams = [
            StreamBuilder::length(LengthType::VarBinary).varints(&[4]),
            StreamBuilder::data()
                .physical(PhysicalLevelTechnique::FastPfor)
                .raw(1, b"lake"),
        ];
        assert!(matches!(
            decode(&streams).unwrap_err(),
            DecodeError::UnsupportedTechnique { .. }
        ));

        let streams = [
            StreamBuilder::length(LengthType::Dictionary).varints(&[4]),
            StreamBuilder::dictionary(DictionaryType::Single)
                .logical(LogicalLevelTechnique::Pde)
                .raw(1, b"lake"),
            StreamBuilder::offset(OffsetType::String).varints(&[0]),
        ];
        assert!(matches!(
            decode(&streams).unwrap_err(),
            DecodeError::UnsupportedTechnique { .. }
        ));
    }

    #[test]
    fn fsst_streams_are_unsupported() {
        let symbol_lengths = [StreamBuilder::length(LengthType::Symbol).varints(&[1])];
        assert!(matches!(
            decode(&symbol_lengths).unwrap_err(),
            DecodeError::UnsupportedTechnique { .. }
        ));

        let symbol_table = [StreamBuilder::dictionary(DictionaryType::Fsst).raw(1, b"x")];
        assert!(matches!(
            decode(&symbol_table).unwrap_err(),
            DecodeError::UnsupportedTechnique { .. }
        ));
    }
}
