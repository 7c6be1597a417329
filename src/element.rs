use crate::nalgebra::{Point2, Vector2};
use crate::Real;

mod mixed;
mod quadrilateral;

pub use mixed::*;
pub use quadrilateral::*;

/// A nodal Lagrange basis on the reference quadrilateral `[-1, 1]^2`.
pub trait ReferenceQuadrilateralBasis<T: Real> {
    fn num_nodes(&self) -> usize;

    /// Reference coordinates of the given node.
    fn node_reference_coords(&self, node: usize) -> Point2<T>;

    /// Evaluates all basis functions at the reference coordinates `xi`.
    ///
    /// The length of `basis_values` must be equal to `num_nodes()`.
    fn populate_basis(&self, basis_values: &mut [T], xi: &Point2<T>);

    /// Evaluates the gradients of all basis functions with respect to reference coordinates.
    fn populate_basis_gradients(&self, gradients: &mut [Vector2<T>], xi: &Point2<T>);
}
