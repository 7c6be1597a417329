//! Basic procedural mesh generation routines.
use crate::mesh::{Quad4d2Connectivity, QuadMesh2d};
use crate::nalgebra::{convert, Point2};
use crate::{BoundaryId, Real};
use log::warn;
use serde::{Deserialize, Serialize};

/// Boundary identifiers assigned to the faces of a rectangular domain.
///
/// The top face is split into an `ice` part, which carries the surface load, and a free `up` part.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoundaryTags {
    pub left: BoundaryId,
    pub right: BoundaryId,
    pub bottom: BoundaryId,
    pub up: BoundaryId,
    pub ice: BoundaryId,
}

impl Default for BoundaryTags {
    fn default() -> Self {
        Self {
            left: 1,
            right: 1,
            bottom: 0,
            up: 3,
            ice: 2,
        }
    }
}

/// Creates a uniform quadrilateral mesh of the axis-aligned rectangle spanned by `bottom_left`
/// and `top_right`.
///
/// The rectangle is first subdivided into `subdivisions[0] x subdivisions[1]` cells, and
/// each cell is then uniformly refined `refinements` times, i.e. split into `4^refinements` cells.
/// Cells are ordered row by row from the bottom, and vertices of each cell are counter-clockwise
/// starting from the bottom-left corner.
pub fn create_rectangular_quad_mesh<T: Real>(
    bottom_left: &Point2<T>,
    top_right: &Point2<T>,
    subdivisions: [usize; 2],
    refinements: usize,
) -> QuadMesh2d<T> {
    let num_cells_x = subdivisions[0] << refinements;
    let num_cells_y = subdivisions[1] << refinements;
    if num_cells_x == 0 || num_cells_y == 0 {
        return QuadMesh2d::from_vertices_and_connectivity(Vec::new(), Vec::new());
    }

    let to_global_vertex_index = |i, j| (num_cells_x + 1) * j + i;
    // Interpolating between the end points reproduces them exactly for t = 0 and t = 1
    let lerp = |a: T, b: T, k: usize, n: usize| {
        let t: T = convert(k as f64 / n as f64);
        a * (T::one() - t) + b * t
    };

    let mut vertices = Vec::with_capacity((num_cells_x + 1) * (num_cells_y + 1));
    for j in 0..=num_cells_y {
        for i in 0..=num_cells_x {
            let x = lerp(bottom_left.x, top_right.x, i, num_cells_x);
            let y = lerp(bottom_left.y, top_right.y, j, num_cells_y);
            vertices.push(Point2::new(x, y));
        }
    }

    let mut cells = Vec::with_capacity(num_cells_x * num_cells_y);
    for j in 0..num_cells_y {
        for i in 0..num_cells_x {
            cells.push(Quad4d2Connectivity([
                to_global_vertex_index(i, j),
                to_global_vertex_index(i + 1, j),
                to_global_vertex_index(i + 1, j + 1),
                to_global_vertex_index(i, j + 1),
            ]));
        }
    }

    QuadMesh2d::from_vertices_and_connectivity(vertices, cells)
}

/// Assigns boundary identifiers to the boundary faces of a mesh of the given rectangle.
///
/// Faces are classified by their center: left (`x = x1`), right (`x = x2`), bottom (`y = y1`)
/// and top (`y = y2`), checked in this order. Top faces whose center satisfies `x <= ice_extent`
/// are tagged `ice`, the remaining top faces `up`.
pub fn tag_rectangle_boundary<T: Real>(
    mesh: &mut QuadMesh2d<T>,
    bottom_left: &Point2<T>,
    top_right: &Point2<T>,
    ice_extent: T,
    tags: &BoundaryTags,
) {
    let extent = (top_right - bottom_left).amax();
    let tol = extent * convert(1e-10);
    let coincides = |a: T, b: T| (a - b).abs() <= tol;

    let mut untagged = 0;
    for (cell, face) in mesh.find_boundary_faces() {
        let center = mesh.face_center(cell, face);
        let id = if coincides(center.x, bottom_left.x) {
            Some(tags.left)
        } else if coincides(center.x, top_right.x) {
            Some(tags.right)
        } else if coincides(center.y, bottom_left.y) {
            Some(tags.bottom)
        } else if coincides(center.y, top_right.y) {
            if center.x <= ice_extent {
                Some(tags.ice)
            } else {
                Some(tags.up)
            }
        } else {
            untagged += 1;
            None
        };
        mesh.set_face_boundary_id(cell, face, id);
    }

    if untagged > 0 {
        warn!("{untagged} boundary faces do not lie on the rectangle boundary and were left untagged");
    }
}
