//! Tile decoder bound to one tileset schema.

use mlt_decode::{Tile, TileSetSchema, decode_tile};
use mlt_proto::TileSetMetadata;
use prost::Message;
use tracing::{debug, debug_span};

use crate::error::{Error, Result};
use crate::metadata::schema_from_metadata;
use crate::options::DecoderOptions;

/// Decodes tiles of a single tileset.
///
/// The schema is resolved once and shared read-only across every
/// [`Decoder::decode`] call, so one decoder can serve many threads.
#[derive(Debug, Clone)]
pub struct Decoder {
    schema: TileSetSchema,
    options: DecoderOptions,
}

impl Decoder {
    /// Create a decoder for an already resolved schema with default options.
    #[must_use]
    pub fn new(schema: TileSetSchema) -> Self {
        Self {
            schema,
            options: DecoderOptions::default(),
        }
    }

    /// Create a decoder from an encoded `TileSetMetadata` message.
    pub fn from_metadata_bytes(bytes: &[u8]) -> Result<Self> {
        Self::from_metadata_bytes_with_options(bytes, DecoderOptions::default())
    }

    /// Create a decoder from an encoded `TileSetMetadata` message.
    pub fn from_metadata_bytes_with_options(
        bytes: &[u8],
        options: DecoderOptions,
    ) -> Result<Self> {
        let metadata = TileSetMetadata::decode(bytes)?;
        Self::from_metadata(&metadata, options)
    }

    /// Create a decoder from a decoded `TileSetMetadata` message.
    pub fn from_metadata(metadata: &TileSetMetadata, options: DecoderOptions) -> Result<Self> {
        let schema = schema_from_metadata(metadata, options.require_known_columns)?;
        debug!(
            feature_tables = schema.feature_tables.len(),
            "resolved tileset schema"
        );
        Ok(Self { schema, options })
    }

    /// Replace the decoder options.
    #[must_use]
    pub fn with_options(mut self, options: DecoderOptions) -> Self {
        self.options = options;
        self
    }

    #[must_use]
    pub fn schema(&self) -> &TileSetSchema {
        &self.schema
    }

    #[must_use]
    pub fn options(&self) -> &DecoderOptions {
        &self.options
    }

    /// Decode one tile.
    pub fn decode(&self, tile: &[u8]) -> Result<Tile> {
        let _span = debug_span!("decode_tile", size = tile.len()).entered();
        if let Some(limit) = self.options.max_tile_size.filter(|&limit| tile.len() > limit) {
            return Err(Error::TileTooLarge {
                size: tile.len(),
                limit,
            });
        }
        let tile = decode_tile(tile, &self.schema)?;
        debug!(layers = tile.layers.len(), "decoded tile");
        Ok(tile)
    }
}
