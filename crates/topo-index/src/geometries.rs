//! Render buffers paired with entity maps.
//!
//! Each buffer type checks its invariants once at construction and keeps its
//! fields private, so a value in hand always has one map entry per render
//! primitive and only in-range indices.

use std::sync::Arc;

use joinery_kernel::geometry::{point_from_f32, to_f32_array, Point3, Vector3};

use crate::error::IndexError;
use crate::topology::{EdgeKey, EntityRef, FaceKey, VertexKey};

fn check_positions(buffer: &'static str, positions: &[f32]) -> Result<usize, IndexError> {
    if positions.len() % 3 != 0 {
        return Err(IndexError::MalformedBuffer {
            buffer,
            reason: format!("{} position floats is not a multiple of 3", positions.len()),
        });
    }
    Ok(positions.len() / 3)
}

fn check_indices(buffer: &'static str, indices: &[u32], vertex_count: usize) -> Result<(), IndexError> {
    match indices.iter().find(|&&i| i as usize >= vertex_count) {
        Some(&index) => Err(IndexError::IndexOutOfBounds {
            buffer,
            index,
            len: vertex_count,
        }),
        None => Ok(()),
    }
}

fn read_point(positions: &[f32], index: u32) -> Point3 {
    let i = index as usize * 3;
    point_from_f32(&positions[i..i + 3])
}

/// Primitive indices whose map entry equals `key`.
fn primitives_of<K: PartialEq>(map: &[K], key: &K) -> Vec<usize> {
    map.iter()
        .enumerate()
        .filter(|(_, k)| *k == key)
        .map(|(i, _)| i)
        .collect()
}

// ─── Faces ───────────────────────────────────────────────────────────────────

/// Triangles with per-vertex normals; `map[i]` is the face of triangle `i`.
#[derive(Debug, Clone, PartialEq)]
pub struct FaceGeometry {
    positions: Arc<[f32]>,
    normals: Arc<[f32]>,
    indices: Vec<u32>,
    map: Vec<FaceKey>,
}

impl FaceGeometry {
    pub fn try_new(
        positions: Arc<[f32]>,
        normals: Arc<[f32]>,
        indices: Vec<u32>,
        map: Vec<FaceKey>,
    ) -> Result<Self, IndexError> {
        let vertex_count = check_positions("face", &positions)?;
        if normals.len() != positions.len() {
            return Err(IndexError::MalformedBuffer {
                buffer: "face",
                reason: format!("{} normal floats for {} position floats", normals.len(), positions.len()),
            });
        }
        if indices.len() % 3 != 0 {
            return Err(IndexError::MalformedBuffer {
                buffer: "face",
                reason: format!("{} indices do not form whole triangles", indices.len()),
            });
        }
        if map.len() != indices.len() / 3 {
            return Err(IndexError::MapLengthMismatch {
                buffer: "face",
                primitives: indices.len() / 3,
                map: map.len(),
            });
        }
        check_indices("face", &indices, vertex_count)?;
        Ok(Self {
            positions,
            normals,
            indices,
            map,
        })
    }

    pub fn empty() -> Self {
        Self {
            positions: Vec::<f32>::new().into(),
            normals: Vec::<f32>::new().into(),
            indices: Vec::new(),
            map: Vec::new(),
        }
    }

    pub fn positions(&self) -> &[f32] {
        &self.positions
    }

    /// The position buffer itself, for sharing with edge geometry.
    pub fn shared_positions(&self) -> Arc<[f32]> {
        Arc::clone(&self.positions)
    }

    pub fn normals(&self) -> &[f32] {
        &self.normals
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    pub fn map(&self) -> &[FaceKey] {
        &self.map
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len() / 3
    }

    pub fn triangle_count(&self) -> usize {
        self.map.len()
    }

    pub fn triangle(&self, i: usize) -> Option<[Point3; 3]> {
        let tri = self.indices.get(i * 3..i * 3 + 3)?;
        Some([
            read_point(&self.positions, tri[0]),
            read_point(&self.positions, tri[1]),
            read_point(&self.positions, tri[2]),
        ])
    }

    pub fn face_of(&self, triangle: usize) -> Option<FaceKey> {
        self.map.get(triangle).copied()
    }

    /// Triangles produced from `face`.
    pub fn triangles_of(&self, face: FaceKey) -> Result<Vec<usize>, IndexError> {
        let found = primitives_of(&self.map, &face);
        if found.is_empty() {
            return Err(IndexError::EntityNotIndexed {
                entity: EntityRef::Face(face),
            });
        }
        Ok(found)
    }

    /// Append `other`, shifting its indices past this geometry's vertices.
    pub fn concat(&self, other: &FaceGeometry) -> Result<FaceGeometry, IndexError> {
        let offset = self.vertex_count() as u32;
        let positions: Vec<f32> = self.positions.iter().chain(other.positions.iter()).copied().collect();
        let normals: Vec<f32> = self.normals.iter().chain(other.normals.iter()).copied().collect();
        let indices = self
            .indices
            .iter()
            .copied()
            .chain(other.indices.iter().map(|i| i + offset))
            .collect();
        let map = self.map.iter().chain(other.map.iter()).copied().collect();
        FaceGeometry::try_new(positions.into(), normals.into(), indices, map)
    }
}

/// Accumulates faces into one [`FaceGeometry`], keeping index offsets.
#[derive(Debug, Default)]
pub struct FaceGeometryBuilder {
    positions: Vec<f32>,
    normals: Vec<f32>,
    indices: Vec<u32>,
    map: Vec<FaceKey>,
}

impl FaceGeometryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn vertex_count(&self) -> u32 {
        (self.positions.len() / 3) as u32
    }

    /// Append one face. `triangles` index `positions` from 0; the returned
    /// offset is where this face's first vertex landed in the shared buffer.
    pub fn push_face(
        &mut self,
        positions: &[Point3],
        normals: &[Vector3],
        triangles: &[[u32; 3]],
        face: FaceKey,
    ) -> Result<u32, IndexError> {
        if normals.len() != positions.len() {
            return Err(IndexError::MalformedBuffer {
                buffer: "face",
                reason: format!("{} normals for {} positions", normals.len(), positions.len()),
            });
        }
        for tri in triangles {
            check_indices("face", tri, positions.len())?;
        }

        let offset = self.vertex_count();
        for p in positions {
            self.positions.extend_from_slice(&to_f32_array(p));
        }
        for n in normals {
            self.normals.extend_from_slice(&[n.x as f32, n.y as f32, n.z as f32]);
        }
        for tri in triangles {
            self.indices.extend(tri.iter().map(|i| i + offset));
            self.map.push(face);
        }
        Ok(offset)
    }

    pub fn finish(self) -> Result<FaceGeometry, IndexError> {
        FaceGeometry::try_new(self.positions.into(), self.normals.into(), self.indices, self.map)
    }
}

// ─── Edges ───────────────────────────────────────────────────────────────────

/// Line segments as index pairs; `map[i]` is the edge of segment `i`.
#[derive(Debug, Clone, PartialEq)]
pub struct EdgeGeometry {
    positions: Arc<[f32]>,
    indices: Vec<u32>,
    map: Vec<EdgeKey>,
}

impl EdgeGeometry {
    pub fn try_new(positions: Arc<[f32]>, indices: Vec<u32>, map: Vec<EdgeKey>) -> Result<Self, IndexError> {
        let vertex_count = check_positions("edge", &positions)?;
        if indices.len() % 2 != 0 {
            return Err(IndexError::MalformedBuffer {
                buffer: "edge",
                reason: format!("{} indices do not form whole segments", indices.len()),
            });
        }
        if map.len() != indices.len() / 2 {
            return Err(IndexError::MapLengthMismatch {
                buffer: "edge",
                primitives: indices.len() / 2,
                map: map.len(),
            });
        }
        check_indices("edge", &indices, vertex_count)?;
        Ok(Self { positions, indices, map })
    }

    pub fn empty() -> Self {
        Self {
            positions: Vec::<f32>::new().into(),
            indices: Vec::new(),
            map: Vec::new(),
        }
    }

    pub fn positions(&self) -> &[f32] {
        &self.positions
    }

    /// Whether this geometry reads from exactly the buffer `positions`.
    pub fn shares_positions_with(&self, faces: &FaceGeometry) -> bool {
        Arc::ptr_eq(&self.positions, &faces.positions)
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    pub fn map(&self) -> &[EdgeKey] {
        &self.map
    }

    pub fn segment_count(&self) -> usize {
        self.map.len()
    }

    pub fn segment(&self, i: usize) -> Option<[Point3; 2]> {
        let seg = self.indices.get(i * 2..i * 2 + 2)?;
        Some([read_point(&self.positions, seg[0]), read_point(&self.positions, seg[1])])
    }

    pub fn edge_of(&self, segment: usize) -> Option<EdgeKey> {
        self.map.get(segment).copied()
    }

    /// Segments produced from `edge`.
    pub fn segments_of(&self, edge: EdgeKey) -> Result<Vec<usize>, IndexError> {
        let found = primitives_of(&self.map, &edge);
        if found.is_empty() {
            return Err(IndexError::EntityNotIndexed {
                entity: EntityRef::Edge(edge),
            });
        }
        Ok(found)
    }
}

/// Accumulates edge polylines into one [`EdgeGeometry`].
///
/// Started with [`sharing`](Self::sharing), polylines index an existing
/// position buffer; standalone segments append their own positions after it.
#[derive(Debug, Default)]
pub struct EdgeGeometryBuilder {
    shared: Option<Arc<[f32]>>,
    positions: Vec<f32>,
    indices: Vec<u32>,
    map: Vec<EdgeKey>,
}

impl EdgeGeometryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sharing(positions: Arc<[f32]>) -> Self {
        Self {
            shared: Some(positions),
            ..Self::default()
        }
    }

    fn vertex_count(&self) -> u32 {
        let shared = self.shared.as_ref().map_or(0, |p| p.len());
        ((shared + self.positions.len()) / 3) as u32
    }

    /// Append a polyline over already-present vertices, one segment per
    /// consecutive pair.
    pub fn push_polyline(&mut self, nodes: &[u32], edge: EdgeKey) {
        for pair in nodes.windows(2) {
            self.indices.extend_from_slice(pair);
            self.map.push(edge);
        }
    }

    /// Append a segment with its own two vertices.
    pub fn push_segment(&mut self, a: &Point3, b: &Point3, edge: EdgeKey) {
        let first = self.vertex_count();
        self.positions.extend_from_slice(&to_f32_array(a));
        self.positions.extend_from_slice(&to_f32_array(b));
        self.indices.extend_from_slice(&[first, first + 1]);
        self.map.push(edge);
    }

    pub fn finish(self) -> Result<EdgeGeometry, IndexError> {
        let positions: Arc<[f32]> = match self.shared {
            Some(shared) if self.positions.is_empty() => shared,
            Some(shared) => shared.iter().chain(self.positions.iter()).copied().collect(),
            None => self.positions.into(),
        };
        EdgeGeometry::try_new(positions, self.indices, self.map)
    }
}

// ─── Vertices ────────────────────────────────────────────────────────────────

/// One point per vertex; `map[i]` is the vertex of point `i`.
#[derive(Debug, Clone, PartialEq)]
pub struct VertexGeometry {
    positions: Arc<[f32]>,
    map: Vec<VertexKey>,
}

impl VertexGeometry {
    pub fn try_new(positions: Arc<[f32]>, map: Vec<VertexKey>) -> Result<Self, IndexError> {
        let count = check_positions("vertex", &positions)?;
        if map.len() != count {
            return Err(IndexError::MapLengthMismatch {
                buffer: "vertex",
                primitives: count,
                map: map.len(),
            });
        }
        Ok(Self { positions, map })
    }

    pub fn from_points(points: &[(VertexKey, Point3)]) -> Result<Self, IndexError> {
        let positions: Vec<f32> = points.iter().flat_map(|(_, p)| to_f32_array(p)).collect();
        let map = points.iter().map(|(k, _)| *k).collect();
        Self::try_new(positions.into(), map)
    }

    pub fn empty() -> Self {
        Self {
            positions: Vec::<f32>::new().into(),
            map: Vec::new(),
        }
    }

    pub fn positions(&self) -> &[f32] {
        &self.positions
    }

    pub fn map(&self) -> &[VertexKey] {
        &self.map
    }

    pub fn point_count(&self) -> usize {
        self.map.len()
    }

    pub fn point(&self, i: usize) -> Option<Point3> {
        (i < self.map.len()).then(|| read_point(&self.positions, i as u32))
    }

    pub fn vertex_of(&self, point: usize) -> Option<VertexKey> {
        self.map.get(point).copied()
    }

    pub fn point_of(&self, vertex: VertexKey) -> Result<usize, IndexError> {
        self.map
            .iter()
            .position(|k| *k == vertex)
            .ok_or(IndexError::EntityNotIndexed {
                entity: EntityRef::Vertex(vertex),
            })
    }
}

// ─── Bundle ──────────────────────────────────────────────────────────────────

/// Face, edge and vertex buffers of one root shape.
#[derive(Debug, Clone, PartialEq)]
pub struct Geometries {
    pub faces: FaceGeometry,
    pub edges: EdgeGeometry,
    pub vertices: VertexGeometry,
}

impl Geometries {
    pub fn empty() -> Self {
        Self {
            faces: FaceGeometry::empty(),
            edges: EdgeGeometry::empty(),
            vertices: VertexGeometry::empty(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.faces.triangle_count() == 0 && self.edges.segment_count() == 0 && self.vertices.point_count() == 0
    }
}
