//! Conversion from tileset metadata messages to the decoder's schema.
//!
//! Converting is fallible: metadata may declare column types the decoder
//! cannot represent.

use mlt_decode::{ColumnSchema, ColumnType, FeatureTableSchema, ScalarType, TileSetSchema};
use mlt_proto::{
    Column, ComplexType, LogicalComplexType, LogicalScalarType, TileSetMetadata, column,
    complex_column, scalar_column,
};

use crate::error::{Error, Result};

/// Build a [`TileSetSchema`] from decoded tileset metadata.
///
/// With `require_known_columns` set, the first column the decoder cannot
/// decode fails the conversion. Otherwise such columns are kept as
/// [`ColumnType::Unsupported`] or [`ColumnType::Struct`].
pub fn schema_from_metadata(
    metadata: &TileSetMetadata,
    require_known_columns: bool,
) -> Result<TileSetSchema> {
    let feature_tables = metadata
        .feature_tables
        .iter()
        .map(|table| {
            let columns = table
                .columns
                .iter()
                .map(|column| {
                    let column_type = column_type(column);
                    if require_known_columns {
                        check_decodable(&table.name, column, &column_type)?;
                    }
                    Ok(ColumnSchema::new(column.name.clone(), column_type))
                })
                .collect::<Result<_>>()?;
            Ok(FeatureTableSchema {
                name: table.name.clone(),
                columns,
            })
        })
        .collect::<Result<_>>()?;
    Ok(TileSetSchema::new(feature_tables))
}

fn check_decodable(table: &str, column: &Column, column_type: &ColumnType) -> Result<()> {
    let description = match column_type {
        ColumnType::Scalar(_) | ColumnType::Geometry => return Ok(()),
        ColumnType::Struct => "STRUCT".to_owned(),
        ColumnType::Unsupported(description) => description.clone(),
    };
    Err(Error::UnsupportedColumnType {
        table: table.to_owned(),
        column: column.name.clone(),
        description,
    })
}

/// Resolve the decoder-side type of one metadata column.
#[must_use]
pub fn column_type(column: &Column) -> ColumnType {
    match &column.r#type {
        Some(column::Type::ScalarType(scalar)) => match scalar.r#type {
            Some(scalar_column::Type::PhysicalType(value)) => scalar_type(value),
            Some(scalar_column::Type::LogicalType(value)) => ColumnType::Unsupported(
                LogicalScalarType::try_from(value).map_or_else(
                    |_| format!("logical scalar type {value}"),
                    |logical| format!("logical scalar type {logical:?}"),
                ),
            ),
            None => ColumnType::Unsupported("scalar column without type".to_owned()),
        },
        Some(column::Type::ComplexType(complex)) => match complex.r#type {
            Some(complex_column::Type::PhysicalType(value)) => match ComplexType::try_from(value) {
                Ok(ComplexType::Geometry) => ColumnType::Geometry,
                Ok(ComplexType::Struct) => ColumnType::Struct,
                Ok(other) => ColumnType::Unsupported(format!("complex type {other:?}")),
                Err(_) => ColumnType::Unsupported(format!("complex type {value}")),
            },
            Some(complex_column::Type::LogicalType(value)) => ColumnType::Unsupported(
                LogicalComplexType::try_from(value).map_or_else(
                    |_| format!("logical complex type {value}"),
                    |logical| format!("logical complex type {logical:?}"),
                ),
            ),
            None => ColumnType::Unsupported("complex column without type".to_owned()),
        },
        None => ColumnType::Unsupported("column without type".to_owned()),
    }
}

fn scalar_type(value: i32) -> ColumnType {
    use mlt_proto::ScalarType as Proto;

    let scalar = match Proto::try_from(value) {
        Ok(Proto::Boolean) => ScalarType::Boolean,
        Ok(Proto::Int32) => ScalarType::Int32,
        Ok(Proto::Uint32) => ScalarType::UInt32,
        Ok(Proto::Int64) => ScalarType::Int64,
        Ok(Proto::Uint64) => ScalarType::UInt64,
        Ok(Proto::Float) => ScalarType::Float,
        Ok(Proto::Double) => ScalarType::Double,
        Ok(Proto::String) => ScalarType::String,
        Ok(other @ (Proto::Int8 | Proto::Uint8)) => {
            return ColumnType::Unsupported(format!("scalar type {other:?}"));
        }
        Err(_) => return ColumnType::Unsupported(format!("scalar type {value}")),
    };
    ColumnType::Scalar(scalar)
}
