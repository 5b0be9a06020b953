//! Geometry column decoding.
//!
//! # Format
//!
//! The first stream lists one geometry type per feature. The remaining streams
//! are identified by their headers:
//!
//! - `LENGTH` `GEOMETRIES`: sub-geometry count of each multi geometry
//! - `LENGTH` `PARTS`: ring count of each polygon, vertex count of each line
//! - `LENGTH` `RINGS`: vertex count of each polygon ring
//! - `OFFSET` `VERTEX`: index into the vertex stream for each vertex used,
//!   turning the vertex stream into a dictionary
//! - `DATA` `VERTEX`/`NONE`: componentwise-delta `x, y` pairs
//! - `DATA` `MORTON`: delta-coded Morton codes
//!
//! Features consume the topology streams in order, so the counts for feature
//! `i` follow directly after those of feature `i - 1`.

use std::slice;

use glam::IVec2;

use crate::cursor::Cursor;
use crate::error::{DecodeError, DecodeResult};
use crate::integer::{decode_int_stream, decode_uint_stream};
use crate::stream::{
    DictionaryType, LengthType, LogicalStreamType, OffsetType, PhysicalStreamType, StreamMetadata,
};

/// Geometry type tag stored per feature.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeometryType {
    Point,
    LineString,
    Polygon,
    MultiPoint,
    MultiLineString,
    MultiPolygon,
}

impl GeometryType {
    fn from_value(value: u32, offset: usize) -> DecodeResult<Self> {
        Ok(match value {
            0 => Self::Point,
            1 => Self::LineString,
            2 => Self::Polygon,
            3 => Self::MultiPoint,
            4 => Self::MultiLineString,
            5 => Self::MultiPolygon,
            _ => {
                return Err(DecodeError::InvalidHeader {
                    field: "geometry type",
                    value,
                    offset,
                });
            }
        })
    }
}

/// The raw streams of a geometry column.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GeometryColumn {
    pub geometry_types: Vec<GeometryType>,
    pub num_geometries: Vec<u32>,
    pub num_parts: Vec<u32>,
    pub num_rings: Vec<u32>,
    /// Present when `vertices` is a dictionary.
    pub vertex_offsets: Option<Vec<u32>>,
    pub vertices: Vec<IVec2>,
    /// Absolute offset of the column in the tile buffer.
    pub offset: usize,
}

/// A decoded feature geometry in tile coordinates.
///
/// Polygon rings are closed: the last vertex repeats the first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Geometry {
    Point(IVec2),
    LineString(Vec<IVec2>),
    Polygon(Vec<Vec<IVec2>>),
    MultiPoint(Vec<IVec2>),
    MultiLineString(Vec<Vec<IVec2>>),
    MultiPolygon(Vec<Vec<Vec<IVec2>>>),
}

impl Geometry {
    #[must_use]
    pub fn geometry_type(&self) -> GeometryType {
        match self {
            Self::Point(_) => GeometryType::Point,
            Self::LineString(_) => GeometryType::LineString,
            Self::Polygon(_) => GeometryType::Polygon,
            Self::MultiPoint(_) => GeometryType::MultiPoint,
            Self::MultiLineString(_) => GeometryType::MultiLineString,
            Self::MultiPolygon(_) => GeometryType::MultiPolygon,
        }
    }

    /// Flatten into the list-of-lines layout vector tile consumers expect.
    ///
    /// Points become single-vertex lines, polygons contribute their rings.
    #[must_use]
    pub fn load_geometry(&self) -> Vec<Vec<IVec2>> {
        match self {
            Self::Point(point) => vec![vec![*point]],
            Self::MultiPoint(points) => points.iter().map(|p| vec![*p]).collect(),
            Self::LineString(line) => vec![line.clone()],
            Self::Polygon(rings) | Self::MultiLineString(rings) => rings.clone(),
            Self::MultiPolygon(polygons) => polygons.iter().flatten().cloned().collect(),
        }
    }
}

/// Read the `num_streams` streams of a geometry column.
pub fn decode_geometry_column(
    cursor: &mut Cursor<'_>,
    num_streams: u32,
) -> DecodeResult<GeometryColumn> {
    let offset = cursor.position();
    if num_streams == 0 {
        return Err(DecodeError::malformed(offset, "geometry column without streams"));
    }

    let types_metadata = StreamMetadata::decode(cursor)?;
    types_metadata.expect_type(PhysicalStreamType::Data)?;
    let geometry_types = decode_uint_stream(cursor, &types_metadata)?
        .into_iter()
        .map(|value| GeometryType::from_value(value, types_metadata.offset))
        .collect::<DecodeResult<_>>()?;

    let mut column = GeometryColumn {
        geometry_types,
        offset,
        ..GeometryColumn::default()
    };
    for _ in 1..num_streams {
        let metadata = StreamMetadata::decode(cursor)?;
        match metadata.physical_stream_type {
            PhysicalStreamType::Length => {
                let counts = match metadata.length_type() {
                    Some(LengthType::Geometries) => &mut column.num_geometries,
                    Some(LengthType::Parts) => &mut column.num_parts,
                    Some(LengthType::Rings) => &mut column.num_rings,
                    Some(LengthType::Triangles) => {
                        return Err(DecodeError::unsupported(
                            metadata.offset,
                            "pre-tessellated triangle stream",
                        ));
                    }
                    other => return Err(unexpected(&metadata, other)),
                };
                *counts = decode_uint_stream(cursor, &metadata)?;
            }
            PhysicalStreamType::Offset => {
                if metadata.logical_stream_type
                    != Some(LogicalStreamType::Offset(OffsetType::Vertex))
                {
                    return Err(unexpected(&metadata, metadata.logical_stream_type));
                }
                column.vertex_offsets = Some(decode_uint_stream(cursor, &metadata)?);
            }
            PhysicalStreamType::Data => match metadata.dictionary_type() {
                Some(DictionaryType::None | DictionaryType::Vertex | DictionaryType::Morton) => {
                    column.vertices = decode_vertices(cursor, &metadata)?;
                }
                other => return Err(unexpected(&metadata, other)),
            },
            PhysicalStreamType::Present => {
                return Err(unexpected(&metadata, metadata.logical_stream_type));
            }
        }
    }
    Ok(column)
}

fn decode_vertices(cursor: &mut Cursor<'_>, metadata: &StreamMetadata) -> DecodeResult<Vec<IVec2>> {
    let values = decode_int_stream(cursor, metadata, true)?;
    if values.len() % 2 != 0 {
        return Err(DecodeError::malformed(
            metadata.offset,
            format!("vertex stream has odd length {}", values.len()),
        ));
    }
    Ok(values
        .chunks_exact(2)
        .map(|pair| IVec2::new(pair[0], pair[1]))
        .collect())
}

fn unexpected(metadata: &StreamMetadata, kind: impl std::fmt::Debug) -> DecodeError {
    DecodeError::malformed(
        metadata.offset,
        format!(
            "unexpected {:?} stream ({kind:?}) in geometry column",
            metadata.physical_stream_type
        ),
    )
}

/// Assemble one geometry per feature from the column's topology streams.
pub fn decode_geometries(column: &GeometryColumn) -> DecodeResult<Vec<Geometry>> {
    let mut topology = Topology {
        column,
        geometries: column.num_geometries.iter(),
        parts: column.num_parts.iter(),
        rings: column.num_rings.iter(),
        next_vertex: 0,
    };
    column
        .geometry_types
        .iter()
        .map(|&geometry_type| topology.geometry(geometry_type))
        .collect()
}

/// Walks the topology streams in lock-step with the geometry types.
struct Topology<'a> {
    column: &'a GeometryColumn,
    geometries: slice::Iter<'a, u32>,
    parts: slice::Iter<'a, u32>,
    rings: slice::Iter<'a, u32>,
    next_vertex: usize,
}

impl Topology<'_> {
    fn geometry(&mut self, geometry_type: GeometryType) -> DecodeResult<Geometry> {
        Ok(match geometry_type {
            GeometryType::Point => Geometry::Point(self.vertex()?),
            GeometryType::LineString => Geometry::LineString(self.line_string()?),
            GeometryType::Polygon => Geometry::Polygon(self.polygon()?),
            GeometryType::MultiPoint => {
                let n = self.count(Stream::Geometries)?;
                Geometry::MultiPoint((0..n).map(|_| self.vertex()).collect::<DecodeResult<_>>()?)
            }
            GeometryType::MultiLineString => {
                let n = self.count(Stream::Geometries)?;
                Geometry::MultiLineString(
                    (0..n)
                        .map(|_| self.line_string())
                        .collect::<DecodeResult<_>>()?,
                )
            }
            GeometryType::MultiPolygon => {
                let n = self.count(Stream::Geometries)?;
                Geometry::MultiPolygon((0..n).map(|_| self.polygon()).collect::<DecodeResult<_>>()?)
            }
        })
    }

    fn line_string(&mut self) -> DecodeResult<Vec<IVec2>> {
        let n = self.count(Stream::Parts)?;
        self.vertices(n)
    }

    fn polygon(&mut self) -> DecodeResult<Vec<Vec<IVec2>>> {
        let n = self.count(Stream::Parts)?;
        (0..n).map(|_| self.ring()).collect()
    }

    fn ring(&mut self) -> DecodeResult<Vec<IVec2>> {
        let n = self.count(Stream::Rings)?;
        let mut ring = self.vertices(n)?;
        if let Some(&first) = ring.first() {
            ring.push(first);
        }
        Ok(ring)
    }

    fn vertices(&mut self, n: usize) -> DecodeResult<Vec<IVec2>> {
        (0..n).map(|_| self.vertex()).collect()
    }

    fn vertex(&mut self) -> DecodeResult<IVec2> {
        let index = self.next_vertex;
        self.next_vertex += 1;
        let vertex_index = match &self.column.vertex_offsets {
            Some(offsets) => offsets.get(index).map(|&i| i as usize),
            None => Some(index),
        };
        vertex_index
            .and_then(|i| self.column.vertices.get(i))
            .copied()
            .ok_or_else(|| {
                DecodeError::malformed(
                    self.column.offset,
                    format!(
                        "vertex {index} out of range ({} vertices)",
                        self.column.vertices.len()
                    ),
                )
            })
    }

    fn count(&mut self, stream: Stream) -> DecodeResult<usize> {
        let counts = match stream {
            Stream::Geometries => &mut self.geometries,
            Stream::Parts => &mut self.parts,
            Stream::Rings => &mut self.rings,
        };
        counts.next().map(|&n| n as usize).ok_or_else(|| {
            DecodeError::malformed(
                self.column.offset,
                format!("{stream:?} stream exhausted"),
            )
        })
    }
}

#[derive(Debug, Clone, Copy)]
enum Stream {
    Geometries,
    Parts,
    Rings,
}
