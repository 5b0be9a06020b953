//! Error types for the high-level decoder.

use mlt_decode::DecodeError;

/// Result type for decoder operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors returned by [`crate::Decoder`].
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The tile bytes could not be decoded.
    #[error("tile decode failed: {0}")]
    Decode(#[from] DecodeError),

    /// The tileset metadata message is not valid protobuf.
    #[error("tileset metadata decode failed: {0}")]
    Metadata(#[from] prost::DecodeError),

    /// A schema column has a type the decoder cannot represent.
    #[error("feature table `{table}`, column `{column}`: unsupported type {description}")]
    UnsupportedColumnType {
        table: String,
        column: String,
        description: String,
    },

    /// The tile exceeds the configured size limit.
    #[error("tile of {size} bytes exceeds the {limit} byte limit")]
    TileTooLarge { size: usize, limit: usize },
}
