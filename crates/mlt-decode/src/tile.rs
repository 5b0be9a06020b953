//! Layer block decoding and feature assembly.
//!
//! # Format
//!
//! A tile is a sequence of layer blocks with no outer framing. Each block is:
//!
//! - 1 byte: layer version
//! - Varints: feature table id, extent, reserved, feature count
//! - Per schema column, in schema order: a varint stream count, then the
//!   column's streams

use tracing::{debug, trace, warn};

use crate::cursor::Cursor;
use crate::error::{DecodeError, DecodeResult};
use crate::geometry::{Geometry, decode_geometries, decode_geometry_column};
use crate::integer::{decode_long_stream, decode_uint_stream};
use crate::property::{
    PropertyColumn, PropertyValue, decode_present_stream, decode_property_column, scatter,
};
use crate::schema::{ColumnSchema, ColumnType, ScalarType, TileSetSchema};
use crate::stream::{PhysicalStreamType, StreamMetadata};
use crate::varint::read_varint;

/// Column name holding feature ids.
pub const ID_COLUMN: &str = "id";
/// Column name holding feature geometries.
pub const GEOMETRY_COLUMN: &str = "geometry";

/// A decoded tile: its layers in buffer order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Tile {
    pub layers: Vec<Layer>,
}

impl Tile {
    /// First layer with the given name.
    #[must_use]
    pub fn layer(&self, name: &str) -> Option<&Layer> {
        self.layers.iter().find(|layer| layer.name == name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Layer {
    pub name: String,
    pub version: u8,
    pub extent: u32,
    pub features: Vec<Feature>,
}

impl Layer {
    /// Number of features.
    #[must_use]
    pub fn len(&self) -> usize {
        self.features.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    #[must_use]
    pub fn feature(&self, index: usize) -> Option<&Feature> {
        self.features.get(index)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Feature {
    /// `None` when the id column is absent or marks this feature as having no id.
    pub id: Option<u64>,
    pub extent: u32,
    pub geometry: Geometry,
    pub properties: Properties,
}

/// Property values of one feature in schema order. Absent values have no entry.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Properties(Vec<(String, PropertyValue)>);

impl Properties {
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&PropertyValue> {
        self.0
            .iter()
            .find_map(|(key, value)| (key == name).then_some(value))
    }

    #[must_use]
    pub fn contains_key(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &PropertyValue)> {
        self.0.iter().map(|(key, value)| (key.as_str(), value))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(key, _)| key.as_str())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Decode every layer block in `data`.
///
/// Decoding is all-or-nothing: any failure aborts the whole tile.
pub fn decode_tile(data: &[u8], schema: &TileSetSchema) -> DecodeResult<Tile> {
    let mut cursor = Cursor::new(data);
    let mut layers = Vec::new();
    while !cursor.is_at_end() {
        layers.push(decode_layer(&mut cursor, schema)?);
    }
    Ok(Tile { layers })
}

enum DecodedColumn {
    Id(Vec<Option<u64>>),
    Geometry(Vec<Geometry>),
    Property(PropertyColumn),
}

fn decode_layer(cursor: &mut Cursor<'_>, schema: &TileSetSchema) -> DecodeResult<Layer> {
    let offset = cursor.position();
    let version = cursor.read_u8()?;
    let feature_table_id = read_varint(cursor)?;
    let extent = read_varint(cursor)?;
    let _reserved = read_varint(cursor)?;
    let num_features = read_varint(cursor)? as usize;

    let Some(table) = schema.feature_table(feature_table_id) else {
        warn!(feature_table_id, offset, "layer references unknown feature table");
        return Err(DecodeError::SchemaMismatch {
            feature_table_id,
            offset,
        });
    };
    debug!(layer = %table.name, version, num_features, extent, "decoding layer");

    let mut ids = None;
    let mut geometries = None;
    let mut properties = Vec::new();
    for column in &table.columns {
        let decoded = decode_column(cursor, column, num_features)
            .map_err(|source| DecodeError::Column {
                layer: table.name.clone(),
                column: column.name.clone(),
                source: Box::new(source),
            })?;
        match decoded {
            DecodedColumn::Id(values) => ids = Some(values),
            DecodedColumn::Geometry(values) => geometries = Some(values),
            DecodedColumn::Property(values) => {
                properties.push((column.name.as_str(), values.into_values().into_iter()));
            }
        }
    }

    let geometries = geometries.ok_or_else(|| {
        DecodeError::malformed(offset, format!("layer `{}` has no geometry column", table.name))
    })?;
    let mut ids = ids.map(Vec::into_iter);
    let features = geometries
        .into_iter()
        .map(|geometry| {
            let id = ids.as_mut().and_then(Iterator::next).flatten();
            let properties = properties
                .iter_mut()
                .filter_map(|(name, values)| {
                    values.next().flatten().map(|value| ((*name).to_owned(), value))
                })
                .collect();
            Feature {
                id,
                extent,
                geometry,
                properties: Properties(properties),
            }
        })
        .collect();

    Ok(Layer {
        name: table.name.clone(),
        version,
        extent,
        features,
    })
}

fn decode_column(
    cursor: &mut Cursor<'_>,
    column: &ColumnSchema,
    num_features: usize,
) -> DecodeResult<DecodedColumn> {
    let offset = cursor.position();
    let num_streams = read_varint(cursor)?;
    trace!(column = %column.name, num_streams, position = cursor.position(), "decoding column");

    let (decoded, len) = if column.name == ID_COLUMN {
        let ids = decode_id_column(cursor, &column.column_type, num_streams)?;
        let len = ids.len();
        (DecodedColumn::Id(ids), len)
    } else if column.name == GEOMETRY_COLUMN || column.column_type == ColumnType::Geometry {
        let geometry_column = decode_geometry_column(cursor, num_streams)?;
        let geometries = decode_geometries(&geometry_column)?;
        let len = geometries.len();
        (DecodedColumn::Geometry(geometries), len)
    } else {
        let values = decode_property_column(cursor, &column.column_type, num_streams)?;
        let len = values.len();
        (DecodedColumn::Property(values), len)
    };

    if len != num_features {
        return Err(DecodeError::malformed(
            offset,
            format!("column has {len} values, layer has {num_features} features"),
        ));
    }
    Ok(decoded)
}

fn decode_id_column(
    cursor: &mut Cursor<'_>,
    column_type: &ColumnType,
    num_streams: u32,
) -> DecodeResult<Vec<Option<u64>>> {
    let offset = cursor.position();
    if num_streams != 2 {
        return Err(DecodeError::malformed(
            offset,
            format!("id column with {num_streams} streams, expected 2"),
        ));
    }
    let present_metadata = StreamMetadata::decode(cursor)?;
    let present = decode_present_stream(cursor, &present_metadata)?;
    let metadata = StreamMetadata::decode(cursor)?;
    metadata.expect_type(PhysicalStreamType::Data)?;

    match column_type {
        ColumnType::Scalar(ScalarType::UInt32) => {
            let ids = decode_uint_stream(cursor, &metadata)?.into_iter().map(u64::from);
            scatter(&present, ids, &metadata)
        }
        #[allow(clippy::cast_sign_loss)]
        ColumnType::Scalar(ScalarType::UInt64) => {
            let ids = decode_long_stream(cursor, &metadata, false)?
                .into_iter()
                .map(|id| id as u64);
            scatter(&present, ids, &metadata)
        }
        other => Err(DecodeError::malformed(
            offset,
            format!("id column must be UInt32 or UInt64, found {other:?}"),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::FeatureTableSchema;
    use crate::stream::{DictionaryType, LengthType, LogicalLevelTechnique, OffsetType};
    use crate::test_utils::{LayerBuilder, StreamBuilder, present_stream};
    use crate::varint::encode_zigzag;

    fn schema() -> TileSetSchema {
        TileSetSchema::new(vec![
            FeatureTableSchema {
                name: "water".into(),
                columns: vec![
                    ColumnSchema::scalar("id", ScalarType::UInt32),
                    ColumnSchema::new("geometry", ColumnType::Geometry),
                    ColumnSchema::scalar("class", ScalarType::String),
                    ColumnSchema::scalar("depth", ScalarType::Int32),
                ],
            },
            FeatureTableSchema {
                name: "poi".into(),
                columns: vec![ColumnSchema::new("geometry", ColumnType::Geometry)],
            },
        ])
    }

    fn points(coords: &[(i32, i32)]) -> Vec<Vec<u8>> {
        let mut previous = (0, 0);
        let mut raw = Vec::new();
        for &(x, y) in coords {
            raw.push(encode_zigzag(x - previous.0));
            raw.push(encode_zigzag(y - previous.1));
            previous = (x, y);
        }
        let types = vec![0; coords.len()];
        vec![
            StreamBuilder::data().varints(&types),
            StreamBuilder::dictionary(DictionaryType::Vertex)
                .logical(LogicalLevelTechnique::ComponentwiseDelta)
                .varints(&raw),
        ]
    }

    fn water_layer() -> Vec<u8> {
        LayerBuilder::new(0, 4096, 3)
            .column(&[
                present_stream(&[true, true, false]),
                StreamBuilder::data()
                    .logical(LogicalLevelTechnique::Delta)
                    .varints(&[encode_zigzag(10), encode_zigzag(1)]),
            ])
            .column(&points(&[(1, 2), (3, 4), (5, 6)]))
            .column(&[
                present_stream(&[true, false, true]),
                StreamBuilder::offset(OffsetType::String).varints(&[0, 0]),
                StreamBuilder::length(LengthType::Dictionary).varints(&[4]),
                StreamBuilder::dictionary(DictionaryType::Single).raw(1, b"lake"),
            ])
            .column(&[
                present_stream(&[false, true, true]),
                StreamBuilder::data().varints(&[encode_zigzag(-5), encode_zigzag(12)]),
            ])
            .build()
    }

    #[test]
    fn decodes_layer_and_pivots_features() {
        let tile = decode_tile(&water_layer(), &schema()).unwrap();
        let layer = tile.layer("water").unwrap();
        assert_eq!(layer.len(), 3);
        assert_eq!(layer.version, 1);
        assert_eq!(layer.extent, 4096);

        let first = layer.feature(0).unwrap();
        assert_eq!(first.id, Some(10));
        assert_eq!(first.geometry, Geometry::Point(glam::IVec2::new(1, 2)));
        assert_eq!(first.properties.keys().collect::<Vec<_>>(), ["class"]);

        let second = layer.feature(1).unwrap();
        assert_eq!(second.id, Some(11));
        assert_eq!(second.properties.get("depth"), Some(&PropertyValue::Int32(-5)));
        assert!(!second.properties.contains_key("class"));

        let third = layer.feature(2).unwrap();
        assert_eq!(third.id, None);
        assert_eq!(third.properties.len(), 2);
        assert!(layer.feature(3).is_none());
    }

    #[test]
    fn decodes_consecutive_layers() {
        let mut data = water_layer();
        data.extend(LayerBuilder::new(1, 512, 1).column(&points(&[(7, 7)])).build());
        let tile = decode_tile(&data, &schema()).unwrap();
        assert_eq!(tile.layers.len(), 2);
        assert_eq!(tile.layers[1].name, "poi");
        assert_eq!(tile.layers[1].features[0].extent, 512);
        assert_eq!(tile.layers[1].features[0].id, None);
    }

    #[test]
    fn unknown_feature_table_is_schema_mismatch() {
        let data = LayerBuilder::new(7, 4096, 0).build();
        assert!(matches!(
            decode_tile(&data, &schema()).unwrap_err(),
            DecodeError::SchemaMismatch {
                feature_table_id: 7,
                offset: 0
            }
        ));
    }

    #[test]
    fn column_errors_name_layer_and_column() {
        let data = LayerBuilder::new(0, 4096, 1)
            .column(&[StreamBuilder::data().varints(&[1])])
            .build();
        match decode_tile(&data, &schema()).unwrap_err() {
            DecodeError::Column {
                layer,
                column,
                source,
            } => {
                assert_eq!(layer, "water");
                assert_eq!(column, "id");
                assert!(matches!(*source, DecodeError::MalformedStream { .. }));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn column_length_must_match_feature_count() {
        let data = LayerBuilder::new(1, 4096, 2).column(&points(&[(1, 1)])).build();
        let err = decode_tile(&data, &schema()).unwrap_err();
        assert!(matches!(err.root_cause(), DecodeError::MalformedStream { .. }));
    }

    #[test]
    fn present_bits_must_match_feature_count() {
        let id = [
            present_stream(&[true, true, true]),
            StreamBuilder::data().varints(&[1, 2, 3]),
        ];
        let geometry = points(&[(1, 2), (3, 4), (5, 6)]);
        let class = |present: &[bool]| {
            vec![
                present_stream(present),
                StreamBuilder::offset(OffsetType::String).varints(&[0]),
                StreamBuilder::length(LengthType::Dictionary).varints(&[4]),
                StreamBuilder::dictionary(DictionaryType::Single).raw(1, b"lake"),
            ]
        };
        let depth = |present: &[bool]| {
            vec![
                present_stream(present),
                StreamBuilder::data().varints(&[encode_zigzag(7)]),
            ]
        };

        let short_string = LayerBuilder::new(0, 4096, 3)
            .column(&id)
            .column(&geometry)
            .column(&class(&[true, false]))
            .column(&depth(&[true, false, false]))
            .build();
        let short_property = LayerBuilder::new(0, 4096, 3)
            .column(&id)
            .column(&geometry)
            .column(&class(&[true, false, false]))
            .column(&depth(&[true, false]))
            .build();

        for (data, expected_column) in [(short_string, "class"), (short_property, "depth")] {
            let err = decode_tile(&data, &schema()).unwrap_err();
            match &err {
                DecodeError::Column { column, .. } => assert_eq!(column, expected_column),
                other => panic!("unexpected error: {other}"),
            }
            assert!(matches!(err.root_cause(), DecodeError::MalformedStream { .. }));
        }
    }

    #[test]
    fn truncated_tile_is_bounds_violation() {
        let data = water_layer();
        let err = decode_tile(&data[..data.len() - 3], &schema()).unwrap_err();
        assert!(matches!(err.root_cause(), DecodeError::BoundsViolation { .. }));
    }

    #[test]
    fn empty_buffer_has_no_layers() {
        assert!(decode_tile(&[], &schema()).unwrap().layers.is_empty());
    }
}
