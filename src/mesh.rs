use crate::element::QuadGeometry;
use crate::nalgebra::{Point2, Scalar};
use crate::{BoundaryId, Real};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

pub mod procedural;

/// Vertex indices of a quadrilateral cell, ordered counter-clockwise.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Quad4d2Connectivity(pub [usize; 4]);

impl Quad4d2Connectivity {
    pub fn vertex_indices(&self) -> &[usize] {
        &self.0
    }

    /// The two vertices of face `face`, which connects vertex `face` to vertex `(face + 1) % 4`.
    pub fn face_vertices(&self, face: usize) -> [usize; 2] {
        [self.0[face], self.0[(face + 1) % 4]]
    }
}

/// Conforming quadrilateral mesh in two dimensions with boundary identifiers on faces.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(bound(serialize = "T: Serialize", deserialize = "T: Deserialize<'de>"))]
pub struct QuadMesh2d<T: Scalar> {
    vertices: Vec<Point2<T>>,
    connectivity: Vec<Quad4d2Connectivity>,
    face_boundary_ids: Vec<[Option<BoundaryId>; 4]>,
}

impl<T: Scalar> QuadMesh2d<T> {
    /// Construct a mesh from vertices and connectivity.
    ///
    /// No face carries a boundary identifier initially.
    pub fn from_vertices_and_connectivity(vertices: Vec<Point2<T>>, connectivity: Vec<Quad4d2Connectivity>) -> Self {
        assert!(
            connectivity
                .iter()
                .flat_map(|cell| cell.vertex_indices())
                .all(|&v| v < vertices.len()),
            "Vertex index out of bounds in connectivity"
        );
        let face_boundary_ids = vec![[None; 4]; connectivity.len()];
        Self {
            vertices,
            connectivity,
            face_boundary_ids,
        }
    }

    pub fn vertices(&self) -> &[Point2<T>] {
        &self.vertices
    }

    pub fn connectivity(&self) -> &[Quad4d2Connectivity] {
        &self.connectivity
    }

    pub fn num_cells(&self) -> usize {
        self.connectivity.len()
    }

    pub fn face_boundary_id(&self, cell: usize, face: usize) -> Option<BoundaryId> {
        self.face_boundary_ids[cell][face]
    }

    pub fn set_face_boundary_id(&mut self, cell: usize, face: usize, id: Option<BoundaryId>) {
        self.face_boundary_ids[cell][face] = id;
    }

    /// Returns `(cell, face)` for every face that is not shared by two cells.
    pub fn find_boundary_faces(&self) -> Vec<(usize, usize)> {
        let mut face_count = FxHashMap::default();
        for cell in &self.connectivity {
            for face in 0..4 {
                *face_count.entry(sorted_edge(cell.face_vertices(face))).or_insert(0usize) += 1;
            }
        }

        let mut boundary_faces = Vec::new();
        for (cell_index, cell) in self.connectivity.iter().enumerate() {
            for face in 0..4 {
                if face_count[&sorted_edge(cell.face_vertices(face))] == 1 {
                    boundary_faces.push((cell_index, face));
                }
            }
        }
        boundary_faces
    }

    /// Enumerates the unique edges of the mesh.
    ///
    /// Returns a map from sorted vertex pairs to edge indices, numbered in order of first
    /// appearance when traversing cells and their faces.
    pub fn edge_indices(&self) -> FxHashMap<[usize; 2], usize> {
        let mut edges = FxHashMap::default();
        for cell in &self.connectivity {
            for face in 0..4 {
                let next_index = edges.len();
                edges.entry(sorted_edge(cell.face_vertices(face))).or_insert(next_index);
            }
        }
        edges
    }
}

impl<T: Real> QuadMesh2d<T> {
    pub fn cell_geometry(&self, cell: usize) -> QuadGeometry<T> {
        let [a, b, c, d] = self.connectivity[cell].0;
        QuadGeometry::from_vertices([self.vertices[a], self.vertices[b], self.vertices[c], self.vertices[d]])
    }

    pub fn face_center(&self, cell: usize, face: usize) -> Point2<T> {
        let [a, b] = self.connectivity[cell].face_vertices(face);
        nalgebra::center(&self.vertices[a], &self.vertices[b])
    }
}

pub(crate) fn sorted_edge([a, b]: [usize; 2]) -> [usize; 2] {
    if a < b {
        [a, b]
    } else {
        [b, a]
    }
}
