//! Error types for tile decoding.

use std::str::Utf8Error;

/// Result type for decode operations.
pub type DecodeResult<T> = Result<T, DecodeError>;

/// Errors that can occur while decoding a tile.
///
/// Every failure aborts the decode of the whole tile. Offsets are absolute
/// positions in the tile buffer.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    /// A read would go past the end of the buffer or of a stream.
    #[error("read of {needed} bytes at offset {offset} exceeds the {available} available")]
    BoundsViolation {
        offset: usize,
        needed: usize,
        available: usize,
    },

    /// A varint continuation chain is longer than the target integer allows.
    #[error("varint at offset {offset} does not fit in {bits} bits")]
    VarintOverflow { offset: usize, bits: u32 },

    /// A header field holds a bit pattern with no assigned meaning.
    #[error("invalid {field} value {value} at offset {offset}")]
    InvalidHeader {
        field: &'static str,
        value: u32,
        offset: usize,
    },

    /// The tile uses an encoding this decoder does not implement.
    #[error("unsupported {what} at offset {offset}")]
    UnsupportedTechnique { what: String, offset: usize },

    /// Counts, lengths or stream kinds are inconsistent.
    #[error("malformed stream at offset {offset}: {reason}")]
    MalformedStream { offset: usize, reason: String },

    /// The tile references a feature table missing from the tileset schema.
    #[error("no schema for feature table {feature_table_id} (layer block at offset {offset})")]
    SchemaMismatch { feature_table_id: u32, offset: usize },

    /// A string value is not valid UTF-8.
    #[error("invalid UTF-8 in string stream at offset {offset}")]
    InvalidUtf8 {
        offset: usize,
        #[source]
        source: Utf8Error,
    },

    /// A failure inside a specific column of a specific layer.
    #[error("layer `{layer}`, column `{column}`: {source}")]
    Column {
        layer: String,
        column: String,
        #[source]
        source: Box<DecodeError>,
    },
}

impl DecodeError {
    pub(crate) fn malformed(offset: usize, reason: impl Into<String>) -> Self {
        Self::MalformedStream {
            offset,
            reason: reason.into(),
        }
    }

    pub(crate) fn unsupported(offset: usize, what: impl Into<String>) -> Self {
        Self::UnsupportedTechnique {
            what: what.into(),
            offset,
        }
    }

    /// The underlying failure with any layer/column context removed.
    #[must_use]
    pub fn root_cause(&self) -> &DecodeError {
        match self {
            Self::Column { source, .. } => source.root_cause(),
            other => other,
        }
    }
}
