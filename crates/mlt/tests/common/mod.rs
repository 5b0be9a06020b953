//! Shared fixtures for integration tests.

#![allow(dead_code)]

use mlt::proto::{
    Column, ComplexColumn, ComplexType, FeatureTableSchema, ScalarColumn, ScalarType,
    TileSetMetadata, column, complex_column, scalar_column,
};
use mlt_decode::stream::{
    DictionaryType, LengthType, LogicalLevelTechnique, OffsetType, PhysicalLevelTechnique,
};
use mlt_decode::test_utils::{LayerBuilder, StreamBuilder, encode_zigzag, present_stream};
use prost::Message;

/// Install a test subscriber once so decode logs show up with `--nocapture`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

pub fn scalar_column(name: &str, scalar_type: ScalarType) -> Column {
    Column {
        name: name.into(),
        nullable: true,
        r#type: Some(column::Type::ScalarType(ScalarColumn {
            r#type: Some(scalar_column::Type::PhysicalType(scalar_type as i32)),
        })),
        ..Column::default()
    }
}

pub fn complex_column(name: &str, complex_type: ComplexType) -> Column {
    Column {
        name: name.into(),
        r#type: Some(column::Type::ComplexType(ComplexColumn {
            r#type: Some(complex_column::Type::PhysicalType(complex_type as i32)),
            children: Vec::new(),
        })),
        ..Column::default()
    }
}

/// Metadata with a `water` table (id, geometry, class, depth) and a
/// geometry-only `poi` table.
pub fn metadata_bytes() -> Vec<u8> {
    TileSetMetadata {
        version: 1,
        feature_tables: vec![
            FeatureTableSchema {
                name: "water".into(),
                columns: vec![
                    scalar_column("id", ScalarType::Uint64),
                    complex_column("geometry", ComplexType::Geometry),
                    scalar_column("class", ScalarType::String),
                    scalar_column("depth", ScalarType::Double),
                ],
            },
            FeatureTableSchema {
                name: "poi".into(),
                columns: vec![complex_column("geometry", ComplexType::Geometry)],
            },
        ],
        ..TileSetMetadata::default()
    }
    .encode_to_vec()
}

/// Streams of a geometry column holding one polygon per entry.
pub fn polygon_column(squares: &[(i32, i32, i32)]) -> Vec<Vec<u8>> {
    let mut previous = (0, 0);
    let mut vertices = Vec::new();
    for &(x, y, size) in squares {
        for (vx, vy) in [(x, y), (x + size, y), (x + size, y + size), (x, y + size)] {
            vertices.push(encode_zigzag(vx - previous.0));
            vertices.push(encode_zigzag(vy - previous.1));
            previous = (vx, vy);
        }
    }
    let count = squares.len();
    vec![
        StreamBuilder::data().varints(&vec![2; count]),
        StreamBuilder::length(LengthType::Parts).varints(&vec![1; count]),
        StreamBuilder::length(LengthType::Rings).varints(&vec![4; count]),
        StreamBuilder::dictionary(DictionaryType::Vertex)
            .logical(LogicalLevelTechnique::ComponentwiseDelta)
            .varints(&vertices),
    ]
}

/// A `water` layer of three square lakes with sparse properties.
pub fn water_layer() -> Vec<u8> {
    let depths: Vec<u8> = [12.5f64, 3.0].iter().flat_map(|d| d.to_le_bytes()).collect();
    LayerBuilder::new(0, 4096, 3)
        .column(&[
            present_stream(&[true, true, true]),
            StreamBuilder::data()
                .logical(LogicalLevelTechnique::Delta)
                .varints_u64(&[200, 2, 2]),
        ])
        .column(&polygon_column(&[(0, 0, 10), (20, 0, 5), (40, 40, 8)]))
        .column(&[
            present_stream(&[true, false, true]),
            StreamBuilder::offset(OffsetType::String).varints(&[1, 0]),
            StreamBuilder::length(LengthType::Dictionary).varints(&[4, 9]),
            StreamBuilder::dictionary(DictionaryType::Single).raw(2, b"lakereservoir"),
        ])
        .column(&[
            present_stream(&[true, true, false]),
            StreamBuilder::data()
                .physical(PhysicalLevelTechnique::None)
                .raw(2, &depths),
        ])
        .build()
}
