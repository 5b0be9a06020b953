//! Decode columnar MapLibre Tile (MLT) layers from packed stream buffers.
//!
//! This crate provides pure synchronous decoding of MLT tiles. A tile is a
//! sequence of layer blocks; each layer is a feature table whose columns are
//! stored as one or more self-describing streams. Every stream carries a header
//! naming its physical encoding and up to two chained logical transforms, which
//! the decoder undoes in reverse.
//!
//! # Design principles
//!
//! - **Synchronous**: No async, no threading primitives
//! - **User-controlled parallelism**: Client decides how to parallelize across tiles
//! - **Bounds-checked**: Every read goes through a single [`Cursor`]
//! - **All-or-nothing**: A failure anywhere aborts the whole tile
//!
//! # Key functions
//!
//! - [`decode_tile`]: Decode every layer of a tile against a [`TileSetSchema`]
//! - [`StreamMetadata::decode`]: Parse one stream header
//! - [`decode_int_stream`] / [`decode_long_stream`]: Integer streams with
//!   delta, RLE, Morton and componentwise-delta transforms
//! - [`decode_string_column`]: Plain and dictionary string columns
//! - [`decode_property_column`]: Sparse typed property columns
//! - [`decode_geometry_column`] / [`decode_geometries`]: Geometry topology

mod cursor;
mod error;
mod varint;

pub mod geometry;
pub mod integer;
pub mod property;
pub mod rle;
pub mod schema;
pub mod stream;
pub mod string;
pub mod tile;

#[cfg(any(test, feature = "test-tools"))]
pub mod test_utils;

pub use cursor::Cursor;
pub use error::{DecodeError, DecodeResult};
pub use geometry::{Geometry, GeometryColumn, GeometryType, decode_geometries, decode_geometry_column};
pub use integer::{decode_int_stream, decode_long_stream};
pub use property::{PropertyColumn, PropertyValue, decode_property_column};
pub use schema::{ColumnSchema, ColumnType, FeatureTableSchema, ScalarType, TileSetSchema};
pub use stream::StreamMetadata;
pub use string::decode_string_column;
pub use tile::{Feature, Layer, Properties, Tile, decode_tile};
pub use varint::{decode_zigzag, decode_zigzag_u64, read_varint, read_varint_u64};

/// Glam re-export so callers can name vertex types without a direct dependency.
pub use glam::IVec2;
