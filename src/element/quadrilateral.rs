use itertools::Itertools;
use numeric_literals::replace_float_literals;

use crate::element::ReferenceQuadrilateralBasis;
use crate::nalgebra::{convert, distance, Matrix2, Point2, Scalar, Vector2};
use crate::Real;

/// Reference coordinates of the nodes of the bilinear quadrilateral, ordered counter-clockwise.
#[rustfmt::skip]
const QUAD4_NODES: [[f64; 2]; 4] = [
    [-1.0, -1.0],
    [ 1.0, -1.0],
    [ 1.0,  1.0],
    [-1.0,  1.0],
];

/// Reference coordinates of the nodes of the biquadratic quadrilateral.
///
/// Vertices come first (counter-clockwise), followed by the midpoints of the edges
/// `(0, 1)`, `(1, 2)`, `(2, 3)`, `(3, 0)` and finally the cell center.
#[rustfmt::skip]
const QUAD9_NODES: [[f64; 2]; 9] = [
    [-1.0, -1.0],
    [ 1.0, -1.0],
    [ 1.0,  1.0],
    [-1.0,  1.0],
    [ 0.0, -1.0],
    [ 1.0,  0.0],
    [ 0.0,  1.0],
    [-1.0,  0.0],
    [ 0.0,  0.0],
];

/// Bilinear (Q1) Lagrange basis on the reference quadrilateral.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct Quad4Basis;

/// Biquadratic (Q2) Lagrange basis on the reference quadrilateral.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct Quad9Basis;

fn node<T: Real>(coords: &[f64; 2]) -> Point2<T> {
    Point2::new(convert(coords[0]), convert(coords[1]))
}

impl<T: Real> ReferenceQuadrilateralBasis<T> for Quad4Basis {
    fn num_nodes(&self) -> usize {
        4
    }

    fn node_reference_coords(&self, node_index: usize) -> Point2<T> {
        node(&QUAD4_NODES[node_index])
    }

    #[replace_float_literals(T::from_f64(literal).expect("Literal must fit in T"))]
    fn populate_basis(&self, basis_values: &mut [T], xi: &Point2<T>) {
        assert_eq!(basis_values.len(), 4, "Basis value buffer must have length 4");
        // N_{alpha, beta}([alpha, beta]) = 1 with alpha, beta = 1 or -1
        let phi = |alpha: T, beta: T| (1.0 + alpha * xi[0]) * (1.0 + beta * xi[1]) / 4.0;
        for (value, coords) in basis_values.iter_mut().zip(&QUAD4_NODES) {
            *value = phi(convert(coords[0]), convert(coords[1]));
        }
    }

    #[rustfmt::skip]
    #[replace_float_literals(T::from_f64(literal).expect("Literal must fit in T"))]
    fn populate_basis_gradients(&self, gradients: &mut [Vector2<T>], xi: &Point2<T>) {
        assert_eq!(gradients.len(), 4, "Gradient buffer must have length 4");
        let phi_grad = |alpha: T, beta: T|
            Vector2::new(
                alpha * (1.0 + beta * xi[1]) / 4.0,
                beta * (1.0 + alpha * xi[0]) / 4.0,
            );
        for (gradient, coords) in gradients.iter_mut().zip(&QUAD4_NODES) {
            *gradient = phi_grad(convert(coords[0]), convert(coords[1]));
        }
    }
}

/// One-dimensional quadratic Lagrange polynomial with nodes `-1, 0, 1`, equal to one at `alpha`.
#[replace_float_literals(T::from_f64(literal).expect("Literal must fit in T"))]
fn quad9_phi_1d<T: Real>(alpha: T, xi: T) -> T {
    let alpha2 = alpha * alpha;
    let a = (3.0 / 2.0) * alpha2 - 1.0;
    let b = alpha / 2.0;
    let c = 1.0 - alpha2;
    a * xi * xi + b * xi + c
}

#[replace_float_literals(T::from_f64(literal).expect("Literal must fit in T"))]
fn quad9_phi_grad_1d<T: Real>(alpha: T, xi: T) -> T {
    let alpha2 = alpha * alpha;
    let a = (3.0 / 2.0) * alpha2 - 1.0;
    let b = alpha / 2.0;
    2.0 * a * xi + b
}

impl<T: Real> ReferenceQuadrilateralBasis<T> for Quad9Basis {
    fn num_nodes(&self) -> usize {
        9
    }

    fn node_reference_coords(&self, node_index: usize) -> Point2<T> {
        node(&QUAD9_NODES[node_index])
    }

    fn populate_basis(&self, basis_values: &mut [T], xi: &Point2<T>) {
        assert_eq!(basis_values.len(), 9, "Basis value buffer must have length 9");
        for (value, coords) in basis_values.iter_mut().zip(&QUAD9_NODES) {
            let (alpha, beta) = (convert(coords[0]), convert(coords[1]));
            *value = quad9_phi_1d(alpha, xi[0]) * quad9_phi_1d(beta, xi[1]);
        }
    }

    fn populate_basis_gradients(&self, gradients: &mut [Vector2<T>], xi: &Point2<T>) {
        assert_eq!(gradients.len(), 9, "Gradient buffer must have length 9");
        for (gradient, coords) in gradients.iter_mut().zip(&QUAD9_NODES) {
            let (alpha, beta) = (convert(coords[0]), convert(coords[1]));
            *gradient = Vector2::new(
                quad9_phi_grad_1d(alpha, xi[0]) * quad9_phi_1d(beta, xi[1]),
                quad9_phi_1d(alpha, xi[0]) * quad9_phi_grad_1d(beta, xi[1]),
            );
        }
    }
}

/// Reference coordinates of the two endpoints of the given face of the reference quadrilateral.
///
/// Face `f` connects vertex `f` to vertex `(f + 1) % 4`, so that traversing the faces in order
/// walks the boundary counter-clockwise.
pub fn reference_face_endpoints<T: Real>(face: usize) -> (Point2<T>, Point2<T>) {
    assert!(face < 4, "Quadrilaterals have exactly four faces");
    (node(&QUAD4_NODES[face]), node(&QUAD4_NODES[(face + 1) % 4]))
}

/// Bilinear geometric map from the reference quadrilateral to a physical quadrilateral.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct QuadGeometry<T>
where
    T: Scalar,
{
    vertices: [Point2<T>; 4],
}

impl<T> QuadGeometry<T>
where
    T: Scalar,
{
    pub fn from_vertices(vertices: [Point2<T>; 4]) -> Self {
        Self { vertices }
    }

    pub fn vertices(&self) -> &[Point2<T>; 4] {
        &self.vertices
    }
}

impl<T: Real> QuadGeometry<T> {
    pub fn map_reference_coords(&self, xi: &Point2<T>) -> Point2<T> {
        let mut basis = [T::zero(); 4];
        Quad4Basis.populate_basis(&mut basis, xi);
        let mut x = Vector2::zeros();
        for (n, vertex) in basis.iter().zip(&self.vertices) {
            x += vertex.coords * *n;
        }
        Point2::from(x)
    }

    /// The Jacobian `J_ij = dx_i / dxi_j` of the reference map.
    pub fn reference_jacobian(&self, xi: &Point2<T>) -> Matrix2<T> {
        let mut gradients = [Vector2::zeros(); 4];
        Quad4Basis.populate_basis_gradients(&mut gradients, xi);
        let mut jacobian = Matrix2::zeros();
        for (gradient, vertex) in gradients.iter().zip(&self.vertices) {
            jacobian += vertex.coords * gradient.transpose();
        }
        jacobian
    }

    /// The largest distance between any two vertices.
    pub fn diameter(&self) -> T {
        self.vertices
            .iter()
            .tuple_combinations()
            .map(|(x, y)| distance(x, y))
            .fold(T::zero(), |a, b| a.max(b))
    }
}
