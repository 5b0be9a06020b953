//! Decode an MLT tile and dump it as JSON.
//!
//! Run: `cargo run -p mlt --features test-tools --bin decode_tile -- <metadata.pb> <tile.mlt>`
//!
//! Set `RUST_LOG=debug` to see per-layer decode logs on stderr.

use std::env;
use std::fs;
use std::process;

use mlt::{Decoder, Feature, Geometry, IVec2, Layer, PropertyValue};
use serde_json::{Value, json};
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = env::args().collect();
    let (Some(metadata_path), Some(tile_path)) = (args.get(1), args.get(2)) else {
        eprintln!("usage: decode_tile <metadata.pb> <tile.mlt>");
        process::exit(2);
    };

    match run(metadata_path, tile_path) {
        Ok(output) => println!("{output:#}"),
        Err(e) => {
            eprintln!("error: {e}");
            process::exit(1);
        }
    }
}

fn run(metadata_path: &str, tile_path: &str) -> Result<Value, String> {
    let metadata = fs::read(metadata_path)
        .map_err(|e| format!("failed to read {metadata_path}: {e}"))?;
    let tile = fs::read(tile_path).map_err(|e| format!("failed to read {tile_path}: {e}"))?;

    let decoder = Decoder::from_metadata_bytes(&metadata).map_err(|e| e.to_string())?;
    let tile = decoder.decode(&tile).map_err(|e| e.to_string())?;

    Ok(json!({
        "layers": tile.layers.iter().map(layer_json).collect::<Vec<_>>(),
    }))
}

fn layer_json(layer: &Layer) -> Value {
    json!({
        "name": layer.name,
        "version": layer.version,
        "extent": layer.extent,
        "features": layer.features.iter().map(feature_json).collect::<Vec<_>>(),
    })
}

fn feature_json(feature: &Feature) -> Value {
    let properties: serde_json::Map<String, Value> = feature
        .properties
        .iter()
        .map(|(key, value)| (key.to_owned(), property_json(value)))
        .collect();
    json!({
        "id": feature.id,
        "geometry": geometry_json(&feature.geometry),
        "properties": properties,
    })
}

fn property_json(value: &PropertyValue) -> Value {
    match value {
        PropertyValue::Boolean(v) => json!(v),
        PropertyValue::Int32(v) => json!(v),
        PropertyValue::UInt32(v) => json!(v),
        PropertyValue::Int64(v) => json!(v),
        PropertyValue::UInt64(v) => json!(v),
        PropertyValue::Float(v) => json!(v),
        PropertyValue::Double(v) => json!(v),
        PropertyValue::String(v) => json!(v),
    }
}

fn geometry_json(geometry: &Geometry) -> Value {
    let coordinates = match geometry {
        Geometry::Point(point) => point_json(*point),
        Geometry::LineString(line) | Geometry::MultiPoint(line) => line_json(line),
        Geometry::Polygon(rings) | Geometry::MultiLineString(rings) => {
            Value::Array(rings.iter().map(|ring| line_json(ring)).collect())
        }
        Geometry::MultiPolygon(polygons) => Value::Array(
            polygons
                .iter()
                .map(|rings| Value::Array(rings.iter().map(|ring| line_json(ring)).collect()))
                .collect(),
        ),
    };
    json!({
        "type": format!("{:?}", geometry.geometry_type()),
        "coordinates": coordinates,
    })
}

fn line_json(line: &[IVec2]) -> Value {
    Value::Array(line.iter().copied().map(point_json).collect())
}

fn point_json(point: IVec2) -> Value {
    json!([point.x, point.y])
}
