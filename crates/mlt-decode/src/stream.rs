//! Stream metadata headers.
//!
//! # Format
//!
//! - Byte 0: physical stream type (high nibble), logical stream type (low nibble)
//! - Byte 1: logical technique 1 (bits 7-5), logical technique 2 (bits 4-2),
//!   physical technique (bits 1-0)
//! - Varints: `num_values`, `byte_length`
//! - RLE streams append varints `runs`, `num_rle_values`
//! - Morton streams append varints `num_bits`, `coordinate_shift`

use std::fmt;

use crate::cursor::Cursor;
use crate::error::{DecodeError, DecodeResult};
use crate::varint::read_varint;

/// What a stream carries within its column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhysicalStreamType {
    Present,
    Data,
    Offset,
    Length,
}

/// Dictionary variant of a `Data` stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DictionaryType {
    None,
    Single,
    Shared,
    Vertex,
    Morton,
    Fsst,
}

/// Offset variant of an `Offset` stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OffsetType {
    Vertex,
    Index,
    String,
    Key,
}

/// Length variant of a `Length` stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LengthType {
    VarBinary,
    Geometries,
    Parts,
    Rings,
    Triangles,
    Symbol,
    Dictionary,
}

/// Logical stream type, interpreted according to the physical stream type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalStreamType {
    Dictionary(DictionaryType),
    Offset(OffsetType),
    Length(LengthType),
}

/// Semantic transform applied on top of the physical values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalLevelTechnique {
    None,
    Delta,
    ComponentwiseDelta,
    Rle,
    Morton,
    /// Pseudodecimal encoding of floats.
    Pde,
}

/// Bit-level encoding of the raw values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhysicalLevelTechnique {
    None,
    FastPfor,
    Varint,
    /// Adaptive lossless floating-point compression.
    Alp,
}

/// Technique-specific header fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamEncoding {
    Plain,
    Rle { runs: u32, num_rle_values: u32 },
    Morton { num_bits: u32, coordinate_shift: u32 },
}

/// Decoded header of one stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamMetadata {
    pub physical_stream_type: PhysicalStreamType,
    /// `None` for present streams.
    pub logical_stream_type: Option<LogicalStreamType>,
    pub logical_level_technique1: LogicalLevelTechnique,
    pub logical_level_technique2: LogicalLevelTechnique,
    pub physical_level_technique: PhysicalLevelTechnique,
    /// Number of values in the physical stream.
    pub num_values: u32,
    /// Number of bytes the stream body occupies after the header.
    pub byte_length: u32,
    pub encoding: StreamEncoding,
    /// Absolute offset of the header in the tile buffer.
    pub offset: usize,
}

impl StreamMetadata {
    /// Read one stream header and leave the cursor at the stream body.
    pub fn decode(cursor: &mut Cursor<'_>) -> DecodeResult<Self> {
        let offset = cursor.position();

        let stream_type = cursor.read_u8()?;
        let physical_stream_type = PhysicalStreamType::from_bits(stream_type >> 4, offset)?;
        let logical_stream_type = match physical_stream_type {
            PhysicalStreamType::Present => None,
            PhysicalStreamType::Data => Some(LogicalStreamType::Dictionary(
                DictionaryType::from_bits(stream_type & 0x0f, offset)?,
            )),
            PhysicalStreamType::Offset => Some(LogicalStreamType::Offset(OffsetType::from_bits(
                stream_type & 0x0f,
                offset,
            )?)),
            PhysicalStreamType::Length => Some(LogicalStreamType::Length(LengthType::from_bits(
                stream_type & 0x0f,
                offset,
            )?)),
        };

        let encodings = cursor.read_u8()?;
        let logical_level_technique1 = LogicalLevelTechnique::from_bits(encodings >> 5, offset + 1)?;
        let logical_level_technique2 =
            LogicalLevelTechnique::from_bits((encodings >> 2) & 0x07, offset + 1)?;
        let physical_level_technique = PhysicalLevelTechnique::from_bits(encodings & 0x03);

        let num_values = read_varint(cursor)?;
        let byte_length = read_varint(cursor)?;

        let encoding = if logical_level_technique1 == LogicalLevelTechnique::Morton {
            StreamEncoding::Morton {
                num_bits: read_varint(cursor)?,
                coordinate_shift: read_varint(cursor)?,
            }
        } else if (logical_level_technique1 == LogicalLevelTechnique::Rle
            || logical_level_technique2 == LogicalLevelTechnique::Rle)
            && physical_level_technique != PhysicalLevelTechnique::None
        {
            StreamEncoding::Rle {
                runs: read_varint(cursor)?,
                num_rle_values: read_varint(cursor)?,
            }
        } else {
            StreamEncoding::Plain
        };

        Ok(Self {
            physical_stream_type,
            logical_stream_type,
            logical_level_technique1,
            logical_level_technique2,
            physical_level_technique,
            num_values,
            byte_length,
            encoding,
            offset,
        })
    }

    /// Number of values after all logical transforms are undone.
    #[must_use]
    pub fn num_logical_values(&self) -> u32 {
        match self.encoding {
            StreamEncoding::Rle { num_rle_values, .. } => num_rle_values,
            _ => self.num_values,
        }
    }

    /// Dictionary variant, if this is a data stream.
    #[must_use]
    pub fn dictionary_type(&self) -> Option<DictionaryType> {
        match self.logical_stream_type {
            Some(LogicalStreamType::Dictionary(dictionary)) => Some(dictionary),
            _ => None,
        }
    }

    /// Length variant, if this is a length stream.
    #[must_use]
    pub fn length_type(&self) -> Option<LengthType> {
        match self.logical_stream_type {
            Some(LogicalStreamType::Length(length)) => Some(length),
            _ => None,
        }
    }

    /// Split off the stream body as its own cursor.
    pub(crate) fn body<'a>(&self, cursor: &mut Cursor<'a>) -> DecodeResult<Cursor<'a>> {
        cursor.split_off(self.byte_length as usize)
    }

    pub(crate) fn num_values_usize(&self) -> usize {
        self.num_values as usize
    }

    /// Fail unless this stream has the given physical type.
    pub(crate) fn expect_type(&self, expected: PhysicalStreamType) -> DecodeResult<()> {
        if self.physical_stream_type == expected {
            Ok(())
        } else {
            Err(DecodeError::malformed(
                self.offset,
                format!(
                    "expected {expected:?} stream, found {:?}",
                    self.physical_stream_type
                ),
            ))
        }
    }

    /// Fail unless the header labels this stream as untransformed bytes of
    /// the given layout. Checked before the body is read.
    pub(crate) fn expect_byte_layout(&self, layout: ByteLayout, what: &str) -> DecodeResult<()> {
        let physical = self.physical_level_technique;
        let physical_ok = match physical {
            PhysicalLevelTechnique::None => true,
            PhysicalLevelTechnique::Varint => layout != ByteLayout::FixedWidth,
            PhysicalLevelTechnique::FastPfor | PhysicalLevelTechnique::Alp => false,
        };
        if !physical_ok {
            return Err(DecodeError::unsupported(
                self.offset,
                format!("physical level technique {physical} for {what}"),
            ));
        }

        let logical_ok = match (self.logical_level_technique1, self.logical_level_technique2) {
            (LogicalLevelTechnique::None, LogicalLevelTechnique::None) => true,
            // Boolean RLE is implicit; some encoders still label it.
            (LogicalLevelTechnique::Rle, LogicalLevelTechnique::None) => {
                layout == ByteLayout::Boolean
            }
            _ => false,
        };
        if !logical_ok {
            return Err(DecodeError::unsupported(
                self.offset,
                format!(
                    "logical level techniques {} + {} for {what}",
                    self.logical_level_technique1, self.logical_level_technique2
                ),
            ));
        }
        Ok(())
    }
}

/// Layouts of streams whose body is read as bytes rather than varints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ByteLayout {
    /// Boolean-RLE bitset (present streams, boolean data).
    Boolean,
    /// Opaque bytes such as UTF-8 string data.
    Bytes,
    /// Little-endian floats and doubles.
    FixedWidth,
}

impl PhysicalStreamType {
    fn from_bits(bits: u8, offset: usize) -> DecodeResult<Self> {
        Ok(match bits {
            0 => Self::Present,
            1 => Self::Data,
            2 => Self::Offset,
            3 => Self::Length,
            _ => return Err(invalid("physical stream type", bits, offset)),
        })
    }
}

impl DictionaryType {
    fn from_bits(bits: u8, offset: usize) -> DecodeResult<Self> {
        Ok(match bits {
            0 => Self::None,
            1 => Self::Single,
            2 => Self::Shared,
            3 => Self::Vertex,
            4 => Self::Morton,
            5 => Self::Fsst,
            _ => return Err(invalid("dictionary type", bits, offset)),
        })
    }
}

impl OffsetType {
    fn from_bits(bits: u8, offset: usize) -> DecodeResult<Self> {
        Ok(match bits {
            0 => Self::Vertex,
            1 => Self::Index,
            2 => Self::String,
            3 => Self::Key,
            _ => return Err(invalid("offset type", bits, offset)),
        })
    }
}

impl LengthType {
    fn from_bits(bits: u8, offset: usize) -> DecodeResult<Self> {
        Ok(match bits {
            0 => Self::VarBinary,
            1 => Self::Geometries,
            2 => Self::Parts,
            3 => Self::Rings,
            4 => Self::Triangles,
            5 => Self::Symbol,
            6 => Self::Dictionary,
            _ => return Err(invalid("length type", bits, offset)),
        })
    }
}

impl LogicalLevelTechnique {
    fn from_bits(bits: u8, offset: usize) -> DecodeResult<Self> {
        Ok(match bits {
            0 => Self::None,
            1 => Self::Delta,
            2 => Self::ComponentwiseDelta,
            3 => Self::Rle,
            4 => Self::Morton,
            5 => Self::Pde,
            _ => return Err(invalid("logical level technique", bits, offset)),
        })
    }
}

impl PhysicalLevelTechnique {
    // Two bits, every pattern is assigned.
    fn from_bits(bits: u8) -> Self {
        match bits & 0x03 {
            0 => Self::None,
            1 => Self::FastPfor,
            2 => Self::Varint,
            _ => Self::Alp,
        }
    }
}

impl fmt::Display for LogicalLevelTechnique {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::None => "NONE",
            Self::Delta => "DELTA",
            Self::ComponentwiseDelta => "COMPONENTWISE_DELTA",
            Self::Rle => "RLE",
            Self::Morton => "MORTON",
            Self::Pde => "PDE",
        };
        f.write_str(name)
    }
}

impl fmt::Display for PhysicalLevelTechnique {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::None => "NONE",
            Self::FastPfor => "FAST_PFOR",
            Self::Varint => "VARINT",
            Self::Alp => "ALP",
        };
        f.write_str(name)
    }
}

fn invalid(field: &'static str, bits: u8, offset: usize) -> DecodeError {
    DecodeError::InvalidHeader {
        field,
        value: u32::from(bits),
        offset,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_plain_header() {
        // DATA / SINGLE, DELTA + NONE + VARINT, 3 values, 4 bytes.
        let data = [0x11, 0b001_000_10, 3, 4];
        let mut cursor = Cursor::new(&data);
        let metadata = StreamMetadata::decode(&mut cursor).unwrap();
        assert_eq!(metadata.physical_stream_type, PhysicalStreamType::Data);
        assert_eq!(metadata.dictionary_type(), Some(DictionaryType::Single));
        assert_eq!(metadata.logical_level_technique1, LogicalLevelTechnique::Delta);
        assert_eq!(metadata.logical_level_technique2, LogicalLevelTechnique::None);
        assert_eq!(metadata.physical_level_technique, PhysicalLevelTechnique::Varint);
        assert_eq!(metadata.num_values, 3);
        assert_eq!(metadata.byte_length, 4);
        assert_eq!(metadata.encoding, StreamEncoding::Plain);
        assert!(cursor.is_at_end());
    }

    #[test]
    fn present_stream_has_no_logical_type() {
        let data = [0x00, 0x00, 5, 2];
        let mut cursor = Cursor::new(&data);
        let metadata = StreamMetadata::decode(&mut cursor).unwrap();
        assert_eq!(metadata.physical_stream_type, PhysicalStreamType::Present);
        assert_eq!(metadata.logical_stream_type, None);
        assert_eq!(metadata.encoding, StreamEncoding::Plain);
    }

    #[test]
    fn rle_header_reads_run_fields() {
        // LENGTH / DICTIONARY, RLE + NONE + VARINT, then runs and value count.
        let data = [0x36, 0b011_000_10, 4, 4, 2, 5];
        let mut cursor = Cursor::new(&data);
        let metadata = StreamMetadata::decode(&mut cursor).unwrap();
        assert_eq!(metadata.length_type(), Some(LengthType::Dictionary));
        assert_eq!(
            metadata.encoding,
            StreamEncoding::Rle {
                runs: 2,
                num_rle_values: 5
            }
        );
        assert_eq!(metadata.num_logical_values(), 5);
        assert!(cursor.is_at_end());
    }

    #[test]
    fn delta_rle_header_reads_run_fields() {
        let data = [0x10, 0b001_011_10, 4, 4, 2, 9];
        let mut cursor = Cursor::new(&data);
        let metadata = StreamMetadata::decode(&mut cursor).unwrap();
        assert_eq!(metadata.logical_level_technique2, LogicalLevelTechnique::Rle);
        assert_eq!(metadata.num_logical_values(), 9);
    }

    #[test]
    fn morton_header_reads_curve_fields() {
        // DATA / MORTON, MORTON + NONE + VARINT.
        let data = [0x14, 0b100_000_10, 2, 2, 12, 0x80, 0x01];
        let mut cursor = Cursor::new(&data);
        let metadata = StreamMetadata::decode(&mut cursor).unwrap();
        assert_eq!(metadata.dictionary_type(), Some(DictionaryType::Morton));
        assert_eq!(
            metadata.encoding,
            StreamEncoding::Morton {
                num_bits: 12,
                coordinate_shift: 128
            }
        );
        assert!(cursor.is_at_end());
    }

    #[test]
    fn rejects_unknown_physical_stream_type() {
        let data = [0x40, 0x02, 0, 0];
        let mut cursor = Cursor::new(&data);
        let err = StreamMetadata::decode(&mut cursor).unwrap_err();
        assert!(matches!(
            err,
            DecodeError::InvalidHeader {
                field: "physical stream type",
                value: 4,
                offset: 0
            }
        ));
    }

    #[test]
    fn rejects_unknown_logical_technique() {
        let data = [0x10, 0b110_000_10, 0, 0];
        let mut cursor = Cursor::new(&data);
        let err = StreamMetadata::decode(&mut cursor).unwrap_err();
        assert!(matches!(
            err,
            DecodeError::InvalidHeader {
                field: "logical level technique",
                value: 6,
                offset: 1
            }
        ));
    }

    #[test]
    fn byte_layouts_reject_transformed_streams() {
        fn header(encodings: u8) -> StreamMetadata {
            let data = [0x10, encodings, 0, 0];
            StreamMetadata::decode(&mut Cursor::new(&data)).unwrap()
        }
        let unsupported = |metadata: StreamMetadata, layout| {
            matches!(
                metadata.expect_byte_layout(layout, "test stream"),
                Err(DecodeError::UnsupportedTechnique { .. })
            )
        };

        // NONE + NONE + NONE is accepted for every layout.
        for layout in [ByteLayout::Boolean, ByteLayout::Bytes, ByteLayout::FixedWidth] {
            assert!(header(0b000_000_00).expect_byte_layout(layout, "x").is_ok());
        }
        // VARINT is tolerated for byte streams but not for floats.
        assert!(header(0b000_000_10).expect_byte_layout(ByteLayout::Bytes, "x").is_ok());
        assert!(unsupported(header(0b000_000_10), ByteLayout::FixedWidth));
        // ALP and FastPFOR.
        assert!(unsupported(header(0b000_000_11), ByteLayout::FixedWidth));
        assert!(unsupported(header(0b000_000_01), ByteLayout::Boolean));
        // PDE and DELTA.
        assert!(unsupported(header(0b101_000_00), ByteLayout::FixedWidth));
        assert!(unsupported(header(0b001_000_00), ByteLayout::Bytes));
        // An RLE label only fits boolean streams.
        assert!(header(0b011_000_00).expect_byte_layout(ByteLayout::Boolean, "x").is_ok());
        assert!(unsupported(header(0b011_000_00), ByteLayout::Bytes));
    }

    #[test]
    fn rejects_unknown_length_type() {
        let data = [0x37, 0x02, 0, 0];
        let mut cursor = Cursor::new(&data);
        assert!(matches!(
            StreamMetadata::decode(&mut cursor).unwrap_err(),
            DecodeError::InvalidHeader {
                field: "length type",
                ..
            }
        ));
    }
}
