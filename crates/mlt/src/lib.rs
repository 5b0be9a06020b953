//! High-level decoder for MapLibre Tile (MLT) vector tiles.
//!
//! This crate ties together the tileset metadata messages from `mlt-proto`
//! and the decoding engine from `mlt-decode`:
//!
//! - **Schema resolution**: Convert `TileSetMetadata` into the decoder's
//!   feature table schemas once per tileset
//! - **Tile decoding**: Decode tiles into layers of features with ids,
//!   geometries and sparse properties
//! - **Limits**: Reject oversized tiles before decoding
//!
//! # Example
//!
//! ```no_run
//! # fn example(metadata: &[u8], tile: &[u8]) -> mlt::Result<()> {
//! let decoder = mlt::Decoder::from_metadata_bytes(metadata)?;
//! let tile = decoder.decode(tile)?;
//! for layer in &tile.layers {
//!     println!("{}: {} features", layer.name, layer.len());
//! }
//! # Ok(())
//! # }
//! ```

mod decoder;
mod error;
pub mod metadata;
mod options;

pub use decoder::Decoder;
pub use error::{Error, Result};
pub use options::{DEFAULT_MAX_TILE_SIZE, DecoderOptions};

// Re-export the decoded data model.
pub use mlt_decode::{
    ColumnSchema, ColumnType, DecodeError, Feature, FeatureTableSchema, Geometry, GeometryType,
    IVec2, Layer, Properties, PropertyValue, ScalarType, Tile, TileSetSchema,
};
pub use mlt_proto as proto;
