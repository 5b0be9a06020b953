//! Protobuf types for MapLibre Tile tileset metadata.
//!
//! The tileset metadata message is transmitted once per tileset, separately
//! from the tiles. It lists every feature table (layer schema) together with
//! the ordered columns a layer block of that table contains.
//!
//! The message types are declared with `prost` derives directly, mirroring
//! `mlt_tileset_metadata.proto`.

#![allow(clippy::doc_markdown, clippy::derive_partial_eq_without_eq)]

/// Top-level tileset metadata.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct TileSetMetadata {
    #[prost(int32, tag = "1")]
    pub version: i32,
    /// Indexed by the feature table id stored in each layer block.
    #[prost(message, repeated, tag = "2")]
    pub feature_tables: Vec<FeatureTableSchema>,
    #[prost(string, optional, tag = "3")]
    pub name: Option<String>,
    #[prost(string, optional, tag = "4")]
    pub description: Option<String>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct FeatureTableSchema {
    #[prost(string, tag = "1")]
    pub name: String,
    #[prost(message, repeated, tag = "2")]
    pub columns: Vec<Column>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Column {
    #[prost(string, tag = "1")]
    pub name: String,
    #[prost(bool, tag = "2")]
    pub nullable: bool,
    #[prost(enumeration = "ColumnScope", tag = "3")]
    pub column_scope: i32,
    #[prost(oneof = "column::Type", tags = "4, 5")]
    pub r#type: Option<column::Type>,
}

/// Nested types for [`Column`].
pub mod column {
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum Type {
        #[prost(message, tag = "4")]
        ScalarType(super::ScalarColumn),
        #[prost(message, tag = "5")]
        ComplexType(super::ComplexColumn),
    }
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ScalarColumn {
    #[prost(oneof = "scalar_column::Type", tags = "4, 5")]
    pub r#type: Option<scalar_column::Type>,
}

/// Nested types for [`ScalarColumn`].
pub mod scalar_column {
    #[derive(Clone, Copy, PartialEq, ::prost::Oneof)]
    pub enum Type {
        #[prost(enumeration = "super::ScalarType", tag = "4")]
        PhysicalType(i32),
        #[prost(enumeration = "super::LogicalScalarType", tag = "5")]
        LogicalType(i32),
    }
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ComplexColumn {
    #[prost(oneof = "complex_column::Type", tags = "4, 5")]
    pub r#type: Option<complex_column::Type>,
    /// Child fields of nested columns.
    #[prost(message, repeated, tag = "6")]
    pub children: Vec<Field>,
}

/// Nested types for [`ComplexColumn`].
pub mod complex_column {
    #[derive(Clone, Copy, PartialEq, ::prost::Oneof)]
    pub enum Type {
        #[prost(enumeration = "super::ComplexType", tag = "4")]
        PhysicalType(i32),
        #[prost(enumeration = "super::LogicalComplexType", tag = "5")]
        LogicalType(i32),
    }
}

/// A child of a nested column.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Field {
    #[prost(string, optional, tag = "1")]
    pub name: Option<String>,
    #[prost(bool, optional, tag = "2")]
    pub nullable: Option<bool>,
    #[prost(oneof = "field::Type", tags = "3, 4")]
    pub r#type: Option<field::Type>,
}

/// Nested types for [`Field`].
pub mod field {
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum Type {
        #[prost(message, tag = "3")]
        ScalarField(super::ScalarColumn),
        #[prost(message, tag = "4")]
        ComplexField(super::ComplexColumn),
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum ColumnScope {
    /// One value per feature.
    Feature = 0,
    /// One value per vertex.
    Vertex = 1,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum ScalarType {
    Boolean = 0,
    Int8 = 1,
    Uint8 = 2,
    Int32 = 3,
    Uint32 = 4,
    Int64 = 5,
    Uint64 = 6,
    Float = 7,
    Double = 8,
    String = 9,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum ComplexType {
    Vec2 = 0,
    Vec3 = 1,
    Geometry = 2,
    GeometryZ = 3,
    List = 4,
    Map = 5,
    Struct = 6,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum LogicalScalarType {
    Timestamp = 0,
    Date = 1,
    Json = 2,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum LogicalComplexType {
    Binary = 0,
    RangeMap = 1,
}
