use elastic_saddle::nalgebra::DMatrix;
use elastic_saddle::util::{gauss_jordan_in_place, sparsity_pattern_from_rows};
use std::collections::BTreeSet;
use matrixcompare::assert_matrix_eq;
use proptest::prelude::*;

#[test]
fn sparsity_pattern_from_row_sets() {
    let rows = vec![
        BTreeSet::from([2, 0]),
        BTreeSet::new(),
        BTreeSet::from([1, 2, 0]),
    ];
    let pattern = sparsity_pattern_from_rows(rows);
    assert_eq!(pattern.major_dim(), 3);
    assert_eq!(pattern.minor_dim(), 3);
    assert_eq!(pattern.major_offsets(), &[0, 2, 2, 5]);
    assert_eq!(pattern.minor_indices(), &[0, 2, 0, 1, 2]);
}

#[test]
fn gauss_jordan_inverts_matrix_requiring_pivoting() {
    #[rustfmt::skip]
    let matrix = DMatrix::from_row_slice(3, 3, &[
        0.0, 2.0, 1.0,
        1.0, 0.0, 0.0,
        3.0, 1.0, 4.0,
    ]);
    let mut inverse = matrix.clone();
    gauss_jordan_in_place(&mut inverse).unwrap();

    let expected = matrix.clone().try_inverse().unwrap();
    assert_matrix_eq!(inverse, expected, comp = abs, tol = 1e-13);
    assert_matrix_eq!(&matrix * &inverse, DMatrix::identity(3, 3), comp = abs, tol = 1e-13);
}

#[test]
fn gauss_jordan_of_empty_matrix() {
    let mut matrix = DMatrix::<f64>::zeros(0, 0);
    assert!(gauss_jordan_in_place(&mut matrix).is_ok());
}

#[test]
fn gauss_jordan_detects_singular_matrix() {
    #[rustfmt::skip]
    let mut matrix = DMatrix::from_row_slice(3, 3, &[
        1.0, 2.0, 3.0,
        2.0, 4.0, 6.0,
        0.0, 1.0, 1.0,
    ]);
    let error = gauss_jordan_in_place(&mut matrix).unwrap_err();
    assert_eq!(error.step, 2);

    let mut zero = DMatrix::<f64>::zeros(2, 2);
    let error = gauss_jordan_in_place(&mut zero).unwrap_err();
    assert_eq!(error.step, 0);
    assert_eq!(error.pivot, 0.0);
}

fn regularized_matrix(n: usize) -> impl Strategy<Value = DMatrix<f64>> {
    proptest::collection::vec(-1.0..1.0f64, n * n).prop_map(move |values| {
        let b = DMatrix::from_vec(n, n, values);
        // B^T B + I is symmetric positive definite
        b.transpose() * &b + DMatrix::identity(n, n)
    })
}

proptest! {
    #[test]
    fn gauss_jordan_matches_lu_inverse(matrix in (1..8usize).prop_flat_map(regularized_matrix)) {
        let n = matrix.nrows();
        let mut inverse = matrix.clone();
        gauss_jordan_in_place(&mut inverse).unwrap();
        let product = &matrix * &inverse;
        prop_assert!((product - DMatrix::identity(n, n)).amax() <= 1e-10);
    }
}
