//! Minimal tile encoder for building test fixtures.
//!
//! Only emits what the decoder reads: VARINT physical technique, literal-only
//! byte RLE, and layer blocks assembled from pre-encoded columns.

use crate::stream::{
    DictionaryType, LengthType, LogicalLevelTechnique, OffsetType, PhysicalLevelTechnique,
    StreamEncoding,
};

pub use crate::varint::{encode_zigzag, encode_zigzag_i64};

/// Append one LEB128 varint.
pub fn encode_varint(mut value: u64, out: &mut Vec<u8>) {
    loop {
        #[allow(clippy::cast_possible_truncation)]
        let byte = (value & 0x7f) as u8;
        value >>= 7;
        if value == 0 {
            out.push(byte);
            return;
        }
        out.push(byte | 0x80);
    }
}

#[must_use]
pub fn encode_varints(values: &[u32]) -> Vec<u8> {
    let mut out = Vec::new();
    for &value in values {
        encode_varint(u64::from(value), &mut out);
    }
    out
}

/// Byte RLE using literal groups only.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn encode_byte_rle_literals(bytes: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    for chunk in bytes.chunks(128) {
        out.push((256 - chunk.len()) as u8);
        out.extend_from_slice(chunk);
    }
    out
}

/// Pack booleans LSB-first and byte-RLE them.
#[must_use]
pub fn encode_boolean_rle(bits: &[bool]) -> Vec<u8> {
    let mut packed = vec![0u8; bits.len().div_ceil(8)];
    for (i, _) in bits.iter().enumerate().filter(|(_, bit)| **bit) {
        packed[i / 8] |= 1 << (i % 8);
    }
    encode_byte_rle_literals(&packed)
}

/// A complete present stream for `bits`.
#[must_use]
pub fn present_stream(bits: &[bool]) -> Vec<u8> {
    StreamBuilder::present().raw(count(bits.len()), &encode_boolean_rle(bits))
}

#[allow(clippy::cast_possible_truncation)]
fn count(len: usize) -> u32 {
    len as u32
}

/// Builds one stream: header followed by body.
#[derive(Debug, Clone, Copy)]
pub struct StreamBuilder {
    stream_type: u8,
    logical1: LogicalLevelTechnique,
    logical2: LogicalLevelTechnique,
    physical: PhysicalLevelTechnique,
    encoding: StreamEncoding,
}

impl StreamBuilder {
    fn with_type(stream_type: u8) -> Self {
        Self {
            stream_type,
            logical1: LogicalLevelTechnique::None,
            logical2: LogicalLevelTechnique::None,
            physical: PhysicalLevelTechnique::Varint,
            encoding: StreamEncoding::Plain,
        }
    }

    #[must_use]
    pub fn present() -> Self {
        Self::with_type(0x00)
    }

    /// Data stream with dictionary type `NONE`.
    #[must_use]
    pub fn data() -> Self {
        Self::dictionary(DictionaryType::None)
    }

    #[must_use]
    pub fn dictionary(dictionary: DictionaryType) -> Self {
        let bits = match dictionary {
            DictionaryType::None => 0,
            DictionaryType::Single => 1,
            DictionaryType::Shared => 2,
            DictionaryType::Vertex => 3,
            DictionaryType::Morton => 4,
            DictionaryType::Fsst => 5,
        };
        Self::with_type(0x10 | bits)
    }

    #[must_use]
    pub fn offset(offset: OffsetType) -> Self {
        let bits = match offset {
            OffsetType::Vertex => 0,
            OffsetType::Index => 1,
            OffsetType::String => 2,
            OffsetType::Key => 3,
        };
        Self::with_type(0x20 | bits)
    }

    #[must_use]
    pub fn length(length: LengthType) -> Self {
        let bits = match length {
            LengthType::VarBinary => 0,
            LengthType::Geometries => 1,
            LengthType::Parts => 2,
            LengthType::Rings => 3,
            LengthType::Triangles => 4,
            LengthType::Symbol => 5,
            LengthType::Dictionary => 6,
        };
        Self::with_type(0x30 | bits)
    }

    #[must_use]
    pub fn logical(mut self, technique: LogicalLevelTechnique) -> Self {
        self.logical1 = technique;
        self
    }

    #[must_use]
    pub fn logical2(mut self, technique: LogicalLevelTechnique) -> Self {
        self.logical2 = technique;
        self
    }

    #[must_use]
    pub fn physical(mut self, technique: PhysicalLevelTechnique) -> Self {
        self.physical = technique;
        self
    }

    #[must_use]
    pub fn rle(mut self, runs: u32, num_rle_values: u32) -> Self {
        self.encoding = StreamEncoding::Rle {
            runs,
            num_rle_values,
        };
        self
    }

    #[must_use]
    pub fn morton(mut self, num_bits: u32, coordinate_shift: u32) -> Self {
        self.encoding = StreamEncoding::Morton {
            num_bits,
            coordinate_shift,
        };
        self
    }

    /// Varint body holding `values`.
    #[must_use]
    pub fn varints(self, values: &[u32]) -> Vec<u8> {
        self.raw(count(values.len()), &encode_varints(values))
    }

    /// Varint body holding 64-bit `values`.
    #[must_use]
    pub fn varints_u64(self, values: &[u64]) -> Vec<u8> {
        let mut body = Vec::new();
        for &value in values {
            encode_varint(value, &mut body);
        }
        self.raw(count(values.len()), &body)
    }

    /// Arbitrary body declared to hold `num_values` values.
    #[must_use]
    pub fn raw(self, num_values: u32, body: &[u8]) -> Vec<u8> {
        let mut out = vec![self.stream_type, self.encodings_byte()];
        encode_varint(u64::from(num_values), &mut out);
        encode_varint(body.len() as u64, &mut out);
        match self.encoding {
            StreamEncoding::Plain => {}
            StreamEncoding::Rle {
                runs,
                num_rle_values,
            } => {
                encode_varint(u64::from(runs), &mut out);
                encode_varint(u64::from(num_rle_values), &mut out);
            }
            StreamEncoding::Morton {
                num_bits,
                coordinate_shift,
            } => {
                encode_varint(u64::from(num_bits), &mut out);
                encode_varint(u64::from(coordinate_shift), &mut out);
            }
        }
        out.extend_from_slice(body);
        out
    }

    fn encodings_byte(&self) -> u8 {
        let physical = match self.physical {
            PhysicalLevelTechnique::None => 0,
            PhysicalLevelTechnique::FastPfor => 1,
            PhysicalLevelTechnique::Varint => 2,
            PhysicalLevelTechnique::Alp => 3,
        };
        (logical_bits(self.logical1) << 5) | (logical_bits(self.logical2) << 2) | physical
    }
}

fn logical_bits(technique: LogicalLevelTechnique) -> u8 {
    match technique {
        LogicalLevelTechnique::None => 0,
        LogicalLevelTechnique::Delta => 1,
        LogicalLevelTechnique::ComponentwiseDelta => 2,
        LogicalLevelTechnique::Rle => 3,
        LogicalLevelTechnique::Morton => 4,
        LogicalLevelTechnique::Pde => 5,
    }
}

/// Builds one layer block from pre-encoded column streams.
#[derive(Debug, Clone)]
pub struct LayerBuilder {
    feature_table_id: u32,
    extent: u32,
    num_features: u32,
    columns: Vec<u8>,
}

impl LayerBuilder {
    #[must_use]
    pub fn new(feature_table_id: u32, extent: u32, num_features: u32) -> Self {
        Self {
            feature_table_id,
            extent,
            num_features,
            columns: Vec::new(),
        }
    }

    /// Append a column made of the given streams.
    #[must_use]
    pub fn column(mut self, streams: &[Vec<u8>]) -> Self {
        encode_varint(streams.len() as u64, &mut self.columns);
        for stream in streams {
            self.columns.extend_from_slice(stream);
        }
        self
    }

    #[must_use]
    pub fn build(self) -> Vec<u8> {
        let mut out = vec![1];
        for field in [self.feature_table_id, self.extent, 0, self.num_features] {
            encode_varint(u64::from(field), &mut out);
        }
        out.extend(self.columns);
        out
    }
}
