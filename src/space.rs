//! Interfaces to the mesh, degree-of-freedom numbering and basis evaluation consumed by assembly.
use crate::allocators::DimAllocator;
use crate::assembly::buffers::{CellValues, FaceValues};
use crate::element::MixedElementLayout;
use crate::nalgebra::{DefaultAllocator, Scalar};
use crate::{BoundaryId, SmallDim};

mod taylor_hood;

pub use taylor_hood::*;

/// Geometric and topological queries on the cells of a mesh.
pub trait CellTopology<T: Scalar> {
    /// Diameter of the cell, i.e. the largest distance between two of its points.
    fn cell_diameter(&self, cell: usize) -> T;

    fn num_faces(&self, cell: usize) -> usize;

    /// Boundary identifier of the face, or `None` for interior or untagged faces.
    fn face_boundary_id(&self, cell: usize, face: usize) -> Option<BoundaryId>;
}

/// Global numbering of the degrees of freedom of a mixed finite element space.
pub trait DofMap {
    fn num_cells(&self) -> usize;

    fn n_dofs(&self) -> usize;

    fn dofs_per_cell(&self) -> usize;

    /// Number of global dofs of each vector component.
    ///
    /// Global dofs are numbered component-wise, so component `c` occupies a contiguous range
    /// starting at the sum of the counts of the preceding components.
    fn dofs_per_component(&self) -> &[usize];

    /// Writes the global indices of the dofs of `cell`, in the element's natural local order.
    fn populate_cell_dofs(&self, cell: usize, output: &mut [usize]);
}

/// Evaluation of the basis functions of a mixed element on cells and faces.
///
/// Each evaluator carries its own quadrature rules.
pub trait BasisEvaluator<T, D>
where
    T: Scalar,
    D: SmallDim,
    DefaultAllocator: DimAllocator<T, D>,
{
    fn element_layout(&self) -> &MixedElementLayout;

    /// Evaluates the basis on `cell` at the quadrature points of the cell rule.
    fn populate_cell_values(&self, cell: usize, values: &mut CellValues<T, D>) -> eyre::Result<()>;

    /// Evaluates the basis on face `face` of `cell` at the quadrature points of the face rule.
    fn populate_face_values(&self, cell: usize, face: usize, values: &mut FaceValues<T, D>) -> eyre::Result<()>;
}

/// A complete mixed finite element space.
pub trait MixedFiniteElementSpace<T, D>: CellTopology<T> + DofMap + BasisEvaluator<T, D>
where
    T: Scalar,
    D: SmallDim,
    DefaultAllocator: DimAllocator<T, D>,
{
}

impl<T, D, S> MixedFiniteElementSpace<T, D> for S
where
    T: Scalar,
    D: SmallDim,
    DefaultAllocator: DimAllocator<T, D>,
    S: CellTopology<T> + DofMap + BasisEvaluator<T, D>,
{
}
