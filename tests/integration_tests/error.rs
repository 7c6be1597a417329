use elastic_saddle::error::{compute_L2_errors, ExactSolution};
use elastic_saddle::mesh::procedural::create_rectangular_quad_mesh;
use elastic_saddle::nalgebra::{DVector, Point2, Vector2, U2};
use elastic_saddle::space::{DofMap, TaylorHoodSpace};
use matrixcompare::assert_scalar_eq;

/// u = (x^2, xy), p = x + y, which lie in the Taylor-Hood space.
struct PolynomialSolution;

impl ExactSolution<f64, U2> for PolynomialSolution {
    fn displacement(&self, x: &Point2<f64>) -> Vector2<f64> {
        Vector2::new(x.x * x.x, x.x * x.y)
    }

    fn pressure(&self, x: &Point2<f64>) -> f64 {
        x.x + x.y
    }
}

/// Same displacement, but a quadratic pressure that bilinear functions cannot represent.
struct QuadraticPressure;

impl ExactSolution<f64, U2> for QuadraticPressure {
    fn displacement(&self, x: &Point2<f64>) -> Vector2<f64> {
        PolynomialSolution.displacement(x)
    }

    fn pressure(&self, x: &Point2<f64>) -> f64 {
        x.x * x.x
    }
}

fn space() -> TaylorHoodSpace<f64> {
    let mesh = create_rectangular_quad_mesh(&Point2::new(-1.0, 0.0), &Point2::new(1.0, 0.5), [4, 1], 1);
    TaylorHoodSpace::new(mesh, 3).unwrap()
}

fn interpolate(space: &TaylorHoodSpace<f64>, exact: &impl ExactSolution<f64, U2>) -> DVector<f64> {
    let dofs = space.dof_handler();
    DVector::from_fn(space.n_dofs(), |dof, _| {
        let x = dofs.support_point(dof);
        match dofs.dof_component(dof) {
            2 => exact.pressure(x),
            component => exact.displacement(x)[component],
        }
    })
}

#[test]
fn interpolated_polynomials_have_zero_error() {
    let space = space();
    let solution = interpolate(&space, &PolynomialSolution);
    let errors = compute_L2_errors(&space, &solution, &PolynomialSolution).unwrap();
    assert_scalar_eq!(errors.displacement, 0.0, comp = abs, tol = 1e-12);
    assert_scalar_eq!(errors.pressure, 0.0, comp = abs, tol = 1e-12);
}

#[test]
fn zero_solution_error_is_norm_of_exact_solution() {
    let space = space();
    let solution = DVector::zeros(space.n_dofs());
    let errors = compute_L2_errors(&space, &solution, &PolynomialSolution).unwrap();

    // Integrals over [-1, 1] x [0, 1/2]
    let displacement_norm_squared: f64 = 1.0 / 5.0 + 1.0 / 36.0;
    let pressure_norm_squared: f64 = 5.0 / 12.0;
    assert_scalar_eq!(errors.displacement, displacement_norm_squared.sqrt(), comp = abs, tol = 1e-12);
    assert_scalar_eq!(errors.pressure, pressure_norm_squared.sqrt(), comp = abs, tol = 1e-12);
}

#[test]
fn unrepresentable_pressure_has_positive_error() {
    let space = space();
    let solution = interpolate(&space, &QuadraticPressure);
    let errors = compute_L2_errors(&space, &solution, &QuadraticPressure).unwrap();
    assert_scalar_eq!(errors.displacement, 0.0, comp = abs, tol = 1e-12);
    assert!(errors.pressure > 1e-4);
}

#[test]
fn solution_of_wrong_size_is_rejected() {
    let space = space();
    let solution = DVector::zeros(space.n_dofs() + 1);
    assert!(compute_L2_errors(&space, &solution, &PolynomialSolution).is_err());
}
