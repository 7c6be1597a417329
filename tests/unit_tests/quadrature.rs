use elastic_saddle::quadrature::tensor::quadrilateral_gauss;
use elastic_saddle::quadrature::univariate::gauss;
use elastic_saddle::quadrature::{Quadrature, QuadraturePair1d, QuadraturePair2d};
use matrixcompare::assert_scalar_eq;

#[test]
fn gauss_rules_integrate_polynomials_exactly() {
    for n in 1..=6 {
        let rule: QuadraturePair1d<f64> = gauss(n);
        assert_eq!(rule.weights().len(), n);
        assert_scalar_eq!(rule.weights().iter().sum::<f64>(), 2.0, comp = abs, tol = 1e-13);

        // Distinct points inside the reference interval
        let mut points: Vec<f64> = rule.points().iter().map(|p| p.x).collect();
        points.sort_by(|a, b| a.partial_cmp(b).unwrap());
        assert!(points.windows(2).all(|w| w[0] < w[1]));
        assert!(points.iter().all(|x| x.abs() < 1.0));

        for degree in 0..2 * n {
            let integral = rule.integrate(|p| p.x.powi(degree as i32));
            let expected = if degree % 2 == 0 { 2.0 / (degree as f64 + 1.0) } else { 0.0 };
            assert_scalar_eq!(integral, expected, comp = abs, tol = 1e-13);
        }
    }
}

#[test]
fn gauss_rule_with_two_points() {
    let (weights, points): QuadraturePair1d<f64> = gauss(2);
    let x = 1.0 / 3.0f64.sqrt();
    assert_scalar_eq!(weights[0], 1.0, comp = abs, tol = 1e-14);
    assert_scalar_eq!(weights[1], 1.0, comp = abs, tol = 1e-14);
    // The rule is symmetric about the origin
    assert_scalar_eq!(points[0].x.abs(), x, comp = abs, tol = 1e-14);
    assert_scalar_eq!(points[0].x + points[1].x, 0.0, comp = abs, tol = 1e-14);
}

#[test]
fn quadrilateral_gauss_integrates_tensor_polynomials() {
    let rule: QuadraturePair2d<f64> = quadrilateral_gauss(3);
    assert_eq!(rule.weights().len(), 9);
    assert_scalar_eq!(rule.weights().iter().sum::<f64>(), 4.0, comp = abs, tol = 1e-13);

    let integral = rule.integrate(|p| p.x.powi(4) * p.y.powi(2) + p.x * p.y.powi(5));
    assert_scalar_eq!(integral, (2.0 / 5.0) * (2.0 / 3.0), comp = abs, tol = 1e-13);
}

#[test]
fn quadrilateral_gauss_is_tensor_product_of_univariate_rule() {
    let (weights_1d, points_1d): QuadraturePair1d<f64> = gauss(3);
    let (weights, points): QuadraturePair2d<f64> = quadrilateral_gauss(3);
    assert_eq!(points.len(), 9);

    for (w, p) in weights.iter().zip(&points) {
        let ix = points_1d.iter().position(|x| x.x == p.x).unwrap();
        let iy = points_1d.iter().position(|y| y.x == p.y).unwrap();
        assert_scalar_eq!(*w, weights_1d[ix] * weights_1d[iy], comp = abs, tol = 1e-15);
    }
}
