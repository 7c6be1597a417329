use crate::nalgebra::RealField;
use crate::quadrature::{convert_quadrature_rule_from_2d_f64, QuadraturePair2d};

use fenris_quadrature::tensor;

/// Tensor-product Gauss rule on the reference quadrilateral `[-1, 1]^2`.
pub fn quadrilateral_gauss<T: RealField>(num_points_per_dim: usize) -> QuadraturePair2d<T> {
    let (weights, points) = tensor::quadrilateral_gauss(num_points_per_dim);
    convert_quadrature_rule_from_2d_f64((weights, points))
}
