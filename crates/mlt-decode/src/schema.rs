//! Tileset schema as seen by the decoder.
//!
//! The decoder never parses schema bytes itself; callers build a
//! [`TileSetSchema`] once and share it read-only across every tile.

/// Scalar property types a column may declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarType {
    Boolean,
    Int32,
    UInt32,
    Int64,
    UInt64,
    Float,
    Double,
    String,
}

/// Column type after schema resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnType {
    Scalar(ScalarType),
    /// The geometry column.
    Geometry,
    /// Nested struct columns. Decoding them is not supported.
    Struct,
    /// A type the decoder cannot represent, described for error messages.
    Unsupported(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSchema {
    pub name: String,
    pub column_type: ColumnType,
}

impl ColumnSchema {
    #[must_use]
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            column_type,
        }
    }

    #[must_use]
    pub fn scalar(name: impl Into<String>, scalar_type: ScalarType) -> Self {
        Self::new(name, ColumnType::Scalar(scalar_type))
    }
}

/// Columns of one feature table, in the order they appear in a layer block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureTableSchema {
    pub name: String,
    pub columns: Vec<ColumnSchema>,
}

/// Every feature table of a tileset, indexed by feature table id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TileSetSchema {
    pub feature_tables: Vec<FeatureTableSchema>,
}

impl TileSetSchema {
    #[must_use]
    pub fn new(feature_tables: Vec<FeatureTableSchema>) -> Self {
        Self { feature_tables }
    }

    /// Look up the schema for a feature table id read from a layer block.
    #[must_use]
    pub fn feature_table(&self, id: u32) -> Option<&FeatureTableSchema> {
        self.feature_tables.get(usize::try_from(id).ok()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn feature_table_lookup_by_id() {
        let schema = TileSetSchema::new(vec![
            FeatureTableSchema {
                name: "water".into(),
                columns: vec![ColumnSchema::new("geometry", ColumnType::Geometry)],
            },
            FeatureTableSchema {
                name: "roads".into(),
                columns: vec![ColumnSchema::scalar("class", ScalarType::String)],
            },
        ]);
        assert_eq!(schema.feature_table(1).map(|t| t.name.as_str()), Some("roads"));
        assert!(schema.feature_table(2).is_none());
    }
}
