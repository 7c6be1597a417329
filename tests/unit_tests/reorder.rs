use elastic_saddle::nalgebra::DMatrix;
use elastic_saddle::nalgebra_sparse::CsrMatrix;
use elastic_saddle::reorder::{cuthill_mckee, Permutation};
use proptest::prelude::*;

#[test]
fn cuthill_mckee_basic_examples() {
    // Basic example
    {
        let matrix = DMatrix::from_row_slice(4, 4, &[1, 0, 1, 1, 0, 1, 0, 1, 1, 0, 1, 0, 1, 1, 0, 1]);
        let pattern = CsrMatrix::from(&matrix).pattern().clone();
        let perm = cuthill_mckee(&pattern);

        assert_eq!(perm.perm(), &[1, 3, 0, 2]);
    }

    // Diagonal pattern
    {
        let matrix = DMatrix::from_row_slice(4, 4, &[1, 0, 0, 0, 0, 1, 0, 0, 0, 0, 1, 0, 0, 0, 0, 1]);
        let pattern = CsrMatrix::from(&matrix).pattern().clone();
        let perm = cuthill_mckee(&pattern);
        assert_eq!(perm.perm(), &[0, 1, 2, 3]);
    }
}

#[test]
fn cuthill_mckee_reduces_bandwidth_of_shuffled_path() {
    // The path 0 - 3 - 1 - 4 - 2 has bandwidth 3 in natural order
    let edges = [(0, 3), (3, 1), (1, 4), (4, 2)];
    let mut matrix = DMatrix::<i32>::identity(5, 5);
    for &(a, b) in &edges {
        matrix[(a, b)] = 1;
        matrix[(b, a)] = 1;
    }
    let pattern = CsrMatrix::from(&matrix).pattern().clone();
    let perm = cuthill_mckee(&pattern);
    let new_index = perm.inverse();

    let bandwidth = edges
        .iter()
        .map(|&(a, b)| new_index.source_index(a).abs_diff(new_index.source_index(b)))
        .max()
        .unwrap();
    assert_eq!(bandwidth, 1);
}

#[test]
fn permutation_from_vec_rejects_invalid_input() {
    assert!(Permutation::from_vec(vec![2, 0, 1]).is_ok());
    assert!(Permutation::from_vec(vec![0, 0, 1]).is_err());
    assert!(Permutation::from_vec(vec![0, 3, 1]).is_err());
    assert!(Permutation::from_vec(vec![]).unwrap().is_empty());
}

#[test]
fn permutation_apply_to_slice() {
    let perm = Permutation::from_vec(vec![2, 0, 1]).unwrap();
    assert_eq!(perm.apply_to_slice(&['a', 'b', 'c']), vec!['c', 'a', 'b']);
}

proptest! {
    #[test]
    fn permutation_inverse_undoes_permutation(perm in Just((0..20usize).collect::<Vec<_>>()).prop_shuffle()) {
        let perm = Permutation::from_vec(perm).unwrap();
        let data: Vec<usize> = (100..120).collect();
        let permuted = perm.apply_to_slice(&data);
        prop_assert_eq!(perm.inverse().apply_to_slice(&permuted), data);
        prop_assert_eq!(perm.inverse().inverse(), perm);
    }
}
