//! Property column decoding.
//!
//! Non-string columns are exactly two streams: a `PRESENT` bitset followed by
//! a `DATA` stream holding one value per set bit. The bitset length is the
//! logical value count; clear bits become `None`.

use tracing::debug;

use crate::cursor::Cursor;
use crate::error::{DecodeError, DecodeResult};
use crate::integer::{decode_int_stream, decode_long_stream, decode_uint_stream};
use crate::rle::{BitSet, decode_boolean_rle};
use crate::schema::{ColumnType, ScalarType};
use crate::stream::{ByteLayout, PhysicalStreamType, StreamMetadata};
use crate::string::decode_string_column;

/// A single decoded property value.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    Boolean(bool),
    Int32(i32),
    UInt32(u32),
    Int64(i64),
    UInt64(u64),
    Float(f32),
    Double(f64),
    String(String),
}

/// A decoded property column, one slot per feature. `None` marks an absent value.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyColumn {
    Boolean(Vec<Option<bool>>),
    Int32(Vec<Option<i32>>),
    UInt32(Vec<Option<u32>>),
    Int64(Vec<Option<i64>>),
    UInt64(Vec<Option<u64>>),
    Float(Vec<Option<f32>>),
    Double(Vec<Option<f64>>),
    String(Vec<Option<String>>),
}

impl PropertyColumn {
    /// Number of feature slots.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Boolean(v) => v.len(),
            Self::Int32(v) => v.len(),
            Self::UInt32(v) => v.len(),
            Self::Int64(v) => v.len(),
            Self::UInt64(v) => v.len(),
            Self::Float(v) => v.len(),
            Self::Double(v) => v.len(),
            Self::String(v) => v.len(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Convert into per-feature values.
    #[must_use]
    pub fn into_values(self) -> Vec<Option<PropertyValue>> {
        fn wrap<T>(values: Vec<Option<T>>, f: fn(T) -> PropertyValue) -> Vec<Option<PropertyValue>> {
            values.into_iter().map(|v| v.map(f)).collect()
        }
        match self {
            Self::Boolean(v) => wrap(v, PropertyValue::Boolean),
            Self::Int32(v) => wrap(v, PropertyValue::Int32),
            Self::UInt32(v) => wrap(v, PropertyValue::UInt32),
            Self::Int64(v) => wrap(v, PropertyValue::Int64),
            Self::UInt64(v) => wrap(v, PropertyValue::UInt64),
            Self::Float(v) => wrap(v, PropertyValue::Float),
            Self::Double(v) => wrap(v, PropertyValue::Double),
            Self::String(v) => wrap(v, PropertyValue::String),
        }
    }
}

/// Decode one property column of `num_streams` streams.
pub fn decode_property_column(
    cursor: &mut Cursor<'_>,
    column_type: &ColumnType,
    num_streams: u32,
) -> DecodeResult<PropertyColumn> {
    let offset = cursor.position();
    let scalar_type = match column_type {
        ColumnType::Scalar(scalar_type) => *scalar_type,
        ColumnType::Struct => {
            return Err(DecodeError::unsupported(offset, "struct property column"));
        }
        ColumnType::Unsupported(description) => {
            return Err(DecodeError::unsupported(
                offset,
                format!("column type {description}"),
            ));
        }
        ColumnType::Geometry => {
            return Err(DecodeError::malformed(
                offset,
                "geometry column decoded as a property",
            ));
        }
    };

    let decode_data: DataDecoder = match scalar_type {
        ScalarType::String => {
            return Ok(PropertyColumn::String(decode_string_column(
                cursor,
                num_streams,
            )?));
        }
        ScalarType::Boolean => decode_boolean_data,
        ScalarType::Int32 => decode_int32_data,
        ScalarType::UInt32 => decode_uint32_data,
        ScalarType::Int64 => decode_int64_data,
        ScalarType::UInt64 => decode_uint64_data,
        ScalarType::Float => decode_float_data,
        ScalarType::Double => decode_double_data,
    };
    match num_streams {
        2 => {}
        1 => {
            return Err(DecodeError::unsupported(
                offset,
                "property column without present stream",
            ));
        }
        n => {
            return Err(DecodeError::malformed(
                offset,
                format!("{scalar_type:?} property column with {n} streams, expected 2"),
            ));
        }
    }

    let present_metadata = StreamMetadata::decode(cursor)?;
    let present = decode_present_stream(cursor, &present_metadata)?;
    let metadata = StreamMetadata::decode(cursor)?;
    metadata.expect_type(PhysicalStreamType::Data)?;
    decode_data(cursor, &metadata, &present)
}

type DataDecoder = fn(&mut Cursor<'_>, &StreamMetadata, &BitSet) -> DecodeResult<PropertyColumn>;

fn decode_boolean_data(
    cursor: &mut Cursor<'_>,
    metadata: &StreamMetadata,
    present: &BitSet,
) -> DecodeResult<PropertyColumn> {
    metadata.expect_byte_layout(ByteLayout::Boolean, "boolean stream")?;
    let mut body = metadata.body(cursor)?;
    let bits = decode_boolean_rle(&mut body, metadata.num_values_usize())?;
    body.expect_end("boolean stream")?;
    Ok(PropertyColumn::Boolean(scatter(present, bits, metadata)?))
}

fn decode_int32_data(
    cursor: &mut Cursor<'_>,
    metadata: &StreamMetadata,
    present: &BitSet,
) -> DecodeResult<PropertyColumn> {
    let values = decode_int_stream(cursor, metadata, true)?;
    Ok(PropertyColumn::Int32(scatter(present, values, metadata)?))
}

fn decode_uint32_data(
    cursor: &mut Cursor<'_>,
    metadata: &StreamMetadata,
    present: &BitSet,
) -> DecodeResult<PropertyColumn> {
    let values = decode_uint_stream(cursor, metadata)?;
    Ok(PropertyColumn::UInt32(scatter(present, values, metadata)?))
}

fn decode_int64_data(
    cursor: &mut Cursor<'_>,
    metadata: &StreamMetadata,
    present: &BitSet,
) -> DecodeResult<PropertyColumn> {
    let values = decode_long_stream(cursor, metadata, true)?;
    Ok(PropertyColumn::Int64(scatter(present, values, metadata)?))
}

#[allow(clippy::cast_sign_loss)]
fn decode_uint64_data(
    cursor: &mut Cursor<'_>,
    metadata: &StreamMetadata,
    present: &BitSet,
) -> DecodeResult<PropertyColumn> {
    let values = decode_long_stream(cursor, metadata, false)?
        .into_iter()
        .map(|v| v as u64);
    Ok(PropertyColumn::UInt64(scatter(present, values, metadata)?))
}

fn decode_float_data(
    cursor: &mut Cursor<'_>,
    metadata: &StreamMetadata,
    present: &BitSet,
) -> DecodeResult<PropertyColumn> {
    let values = decode_raw(cursor, metadata, "float stream", f32::from_le_bytes)?;
    Ok(PropertyColumn::Float(scatter(present, values, metadata)?))
}

fn decode_double_data(
    cursor: &mut Cursor<'_>,
    metadata: &StreamMetadata,
    present: &BitSet,
) -> DecodeResult<PropertyColumn> {
    let values = decode_raw(cursor, metadata, "double stream", f64::from_le_bytes)?;
    Ok(PropertyColumn::Double(scatter(present, values, metadata)?))
}

/// Decode a present stream whose header has just been read.
pub(crate) fn decode_present_stream(
    cursor: &mut Cursor<'_>,
    metadata: &StreamMetadata,
) -> DecodeResult<BitSet> {
    metadata.expect_type(PhysicalStreamType::Present)?;
    metadata.expect_byte_layout(ByteLayout::Boolean, "present stream")?;
    let mut body = metadata.body(cursor)?;
    let present = decode_boolean_rle(&mut body, metadata.num_values_usize())?;
    body.expect_end("present stream")?;
    Ok(present)
}

/// Place one data value at every set bit of `present`, `None` elsewhere.
pub(crate) fn scatter<T>(
    present: &BitSet,
    values: impl IntoIterator<Item = T>,
    metadata: &StreamMetadata,
) -> DecodeResult<Vec<Option<T>>> {
    let mut values = values.into_iter();
    let mut column = Vec::with_capacity(present.len());
    for bit in present.iter().by_vals() {
        if bit {
            let value = values.next().ok_or_else(|| {
                DecodeError::malformed(
                    metadata.offset,
                    format!(
                        "present stream marks {} values, data stream has fewer",
                        present.count_ones()
                    ),
                )
            })?;
            column.push(Some(value));
        } else {
            column.push(None);
        }
    }
    let unused = values.count();
    if unused > 0 {
        debug!(unused, offset = metadata.offset, "data stream carries unused values");
    }
    Ok(column)
}

/// Read fixed-width little-endian values straight from the stream body.
fn decode_raw<T, const N: usize>(
    cursor: &mut Cursor<'_>,
    metadata: &StreamMetadata,
    what: &str,
    from_le_bytes: fn([u8; N]) -> T,
) -> DecodeResult<Vec<T>> {
    metadata.expect_byte_layout(ByteLayout::FixedWidth, what)?;
    let mut body = metadata.body(cursor)?;
    let mut values = Vec::with_capacity(metadata.num_values_usize().min(body.remaining() / N));
    for _ in 0..metadata.num_values {
        let mut bytes = [0u8; N];
        bytes.copy_from_slice(body.read_bytes(N)?);
        values.push(from_le_bytes(bytes));
    }
    body.expect_end(what)?;
    Ok(values)
}
