use super::dense;
use elastic_saddle::block::{BlockCsrMatrix, BlockIndices, BlockVector};
use elastic_saddle::constraints::{ConstraintError, ConstraintSet};
use elastic_saddle::nalgebra::{DMatrix, DVector};
use elastic_saddle::nalgebra_sparse::pattern::SparsityPattern;
use elastic_saddle::space::DofMap;
use matrixcompare::{assert_matrix_eq, assert_scalar_eq};

/// A single "cell" touching all dofs `0 .. n`.
struct SingleCellDofMap(usize);

impl DofMap for SingleCellDofMap {
    fn num_cells(&self) -> usize {
        1
    }

    fn n_dofs(&self) -> usize {
        self.0
    }

    fn dofs_per_cell(&self) -> usize {
        self.0
    }

    fn dofs_per_component(&self) -> &[usize] {
        &[]
    }

    fn populate_cell_dofs(&self, _cell: usize, output: &mut [usize]) {
        for (i, dof) in output.iter_mut().enumerate() {
            *dof = i;
        }
    }
}

fn full_system(n: usize) -> (BlockCsrMatrix<f64>, BlockVector<f64>) {
    let indices = BlockIndices::from_block_sizes(&[n]);
    let offsets = (0..=n).map(|i| i * n).collect();
    let column_indices = (0..n).flat_map(|_| 0..n).collect();
    let pattern = SparsityPattern::try_from_offsets_and_indices(n, n, offsets, column_indices).unwrap();
    (
        BlockCsrMatrix::zeros_from_pattern(indices.clone(), pattern),
        BlockVector::zeros(indices),
    )
}

#[rustfmt::skip]
fn local_matrix() -> DMatrix<f64> {
    DMatrix::from_row_slice(3, 3, &[
         4.0, -1.0,  0.5,
        -1.0,  5.0,  2.0,
         0.5,  2.0,  6.0,
    ])
}

#[test]
fn dirichlet_constraint_eliminates_row_and_column() {
    let mut constraints = ConstraintSet::new();
    constraints.add_dirichlet(1, 2.0).unwrap();
    constraints.close().unwrap();

    let (mut matrix, mut rhs) = full_system(3);
    let local_rhs = DVector::from_column_slice(&[1.0, 10.0, 3.0]);
    constraints
        .distribute_local_to_global(&local_matrix(), &local_rhs, &[0, 1, 2], &mut matrix, &mut rhs)
        .unwrap();

    #[rustfmt::skip]
    let expected = DMatrix::from_row_slice(3, 3, &[
        4.0, 0.0, 0.5,
        0.0, 1.0, 0.0,
        0.5, 0.0, 6.0,
    ]);
    assert_matrix_eq!(dense(&matrix), expected, comp = abs, tol = 1e-14);
    let expected_rhs = DVector::from_column_slice(&[1.0 + 2.0, 2.0, 3.0 - 4.0]);
    assert_matrix_eq!(rhs.as_vector().clone(), expected_rhs, comp = abs, tol = 1e-14);
}

#[test]
fn repeated_distribution_keeps_unit_diagonal() {
    let mut constraints = ConstraintSet::new();
    constraints.add_dirichlet(0, -1.0).unwrap();
    constraints.close().unwrap();

    let (mut matrix, mut rhs) = full_system(3);
    let local_rhs = DVector::from_column_slice(&[1.0, 1.0, 1.0]);
    for _ in 0..2 {
        constraints
            .distribute_local_to_global(&local_matrix(), &local_rhs, &[0, 1, 2], &mut matrix, &mut rhs)
            .unwrap();
    }
    assert_eq!(matrix.get(0, 0), Some(1.0));
    assert_eq!(rhs.as_vector()[0], -1.0);
    // Both distributions move -M(r, 0) * g to the right-hand side
    assert_scalar_eq!(rhs.as_vector()[1], 2.0 * (1.0 - 1.0), comp = abs, tol = 1e-14);
    assert_scalar_eq!(rhs.as_vector()[2], 2.0 * (1.0 + 0.5), comp = abs, tol = 1e-14);
}

#[test]
fn general_constraint_redistributes_contributions() {
    // x_2 = 0.5 x_0 + 0.5 x_1 + 1
    let mut constraints = ConstraintSet::new();
    constraints
        .add_constraint(2, vec![(0, 0.5), (1, 0.5)], 1.0)
        .unwrap();
    constraints.close().unwrap();

    let (mut matrix, mut rhs) = full_system(3);
    let local_rhs = DVector::from_column_slice(&[1.0, 2.0, 4.0]);
    constraints
        .distribute_local_to_global(&local_matrix(), &local_rhs, &[0, 1, 2], &mut matrix, &mut rhs)
        .unwrap();

    // C^T K C with x = C y + g for y = (x_0, x_1)
    let c = DMatrix::from_row_slice(3, 2, &[1.0, 0.0, 0.0, 1.0, 0.5, 0.5]);
    let g = DVector::from_column_slice(&[0.0, 0.0, 1.0]);
    let k = local_matrix();
    let reduced = c.transpose() * &k * &c;
    let reduced_rhs = c.transpose() * (local_rhs - &k * g);

    let global = dense(&matrix);
    assert_matrix_eq!(global.view((0, 0), (2, 2)).clone_owned(), reduced, comp = abs, tol = 1e-14);
    assert_matrix_eq!(rhs.as_vector().rows(0, 2).clone_owned(), reduced_rhs, comp = abs, tol = 1e-14);
    assert_eq!(global[(2, 2)], 1.0);
    assert_eq!(global[(2, 0)], 0.0);
    assert_eq!(global[(0, 2)], 0.0);
    assert_eq!(rhs.as_vector()[2], 1.0);
}

#[test]
fn close_resolves_chained_constraints() {
    let mut constraints = ConstraintSet::new();
    constraints.add_constraint(0, vec![(1, 2.0)], 1.0).unwrap();
    constraints.add_constraint(1, vec![(2, 3.0)], 0.5).unwrap();
    constraints.add_dirichlet(3, 4.0).unwrap();
    constraints.close().unwrap();

    // x_0 = 2 (3 x_2 + 0.5) + 1 = 6 x_2 + 2
    let line = constraints.line(0).unwrap();
    assert_eq!(line.entries(), &[(2, 6.0)]);
    assert_eq!(*line.inhomogeneity(), 2.0);
    assert_eq!(constraints.constrained_dofs(), vec![0, 1, 3]);

    let mut solution = DVector::from_column_slice(&[0.0, 0.0, 1.5, 0.0]);
    constraints.distribute(&mut solution).unwrap();
    assert_eq!(solution.as_slice(), &[11.0, 5.0, 1.5, 4.0]);
}

#[test]
fn invalid_constraints_are_rejected() {
    let mut constraints = ConstraintSet::<f64>::new();
    constraints.add_dirichlet(0, 1.0).unwrap();
    assert!(constraints.add_dirichlet(0, 1.0).is_ok());
    assert_eq!(constraints.add_dirichlet(0, 2.0), Err(ConstraintError::Conflicting { dof: 0 }));
    assert_eq!(
        constraints.add_constraint(0, vec![(1, 1.0)], 0.0),
        Err(ConstraintError::Conflicting { dof: 0 })
    );
    assert_eq!(
        constraints.add_constraint(5, vec![(5, 1.0)], 0.0),
        Err(ConstraintError::Cyclic { dof: 5 })
    );

    let mut cyclic = ConstraintSet::<f64>::new();
    cyclic.add_constraint(0, vec![(1, 1.0)], 0.0).unwrap();
    cyclic.add_constraint(1, vec![(0, 1.0)], 0.0).unwrap();
    assert!(matches!(cyclic.close(), Err(ConstraintError::Cyclic { .. })));
}

#[test]
fn distribution_requires_closed_set() {
    let mut constraints = ConstraintSet::new();
    constraints.add_dirichlet(0, 1.0).unwrap();
    let (mut matrix, mut rhs) = full_system(3);
    let local_rhs = DVector::zeros(3);
    assert_eq!(
        constraints.distribute_local_to_global(&local_matrix(), &local_rhs, &[0, 1, 2], &mut matrix, &mut rhs),
        Err(ConstraintError::NotClosed)
    );
    assert_eq!(
        constraints.make_sparsity_pattern(&SingleCellDofMap(3)).map(|_| ()),
        Err(ConstraintError::NotClosed)
    );

    constraints.close().unwrap();
    assert_eq!(constraints.add_dirichlet(1, 0.0), Err(ConstraintError::AlreadyClosed));
}

#[test]
fn missing_pattern_entry_is_reported() {
    let constraints = {
        let mut constraints = ConstraintSet::<f64>::new();
        constraints.close().unwrap();
        constraints
    };
    let indices = BlockIndices::from_block_sizes(&[3]);
    let diagonal = SparsityPattern::try_from_offsets_and_indices(3, 3, vec![0, 1, 2, 3], vec![0, 1, 2]).unwrap();
    let mut matrix = BlockCsrMatrix::zeros_from_pattern(indices.clone(), diagonal);
    let mut rhs = BlockVector::zeros(indices);
    let result =
        constraints.distribute_local_to_global(&local_matrix(), &DVector::zeros(3), &[0, 1, 2], &mut matrix, &mut rhs);
    assert_eq!(result, Err(ConstraintError::EntryNotInPattern { row: 0, col: 1 }));
}

#[test]
fn sparsity_pattern_contains_expanded_couplings_and_diagonal() {
    // Dof 3 is only coupled through the constraint on dof 2
    struct TwoCells;
    impl DofMap for TwoCells {
        fn num_cells(&self) -> usize {
            2
        }
        fn n_dofs(&self) -> usize {
            5
        }
        fn dofs_per_cell(&self) -> usize {
            2
        }
        fn dofs_per_component(&self) -> &[usize] {
            &[]
        }
        fn populate_cell_dofs(&self, cell: usize, output: &mut [usize]) {
            output.copy_from_slice(if cell == 0 { &[0, 1] } else { &[1, 2] });
        }
    }

    let mut constraints = ConstraintSet::new();
    constraints.add_constraint(2, vec![(3, 1.0)], 0.0).unwrap();
    constraints.close().unwrap();
    let pattern = constraints.make_sparsity_pattern(&TwoCells).unwrap();

    assert_eq!(pattern.lane(0), &[0, 1]);
    assert_eq!(pattern.lane(1), &[0, 1, 3]);
    assert_eq!(pattern.lane(2), &[2]);
    assert_eq!(pattern.lane(3), &[1, 3]);
    assert_eq!(pattern.lane(4), &[4]);
}

#[test]
fn local_vector_distribution_skips_constrained_entries() {
    let mut constraints = ConstraintSet::new();
    constraints.add_dirichlet(0, 3.0).unwrap();
    constraints.add_constraint(2, vec![(1, 0.25)], 0.0).unwrap();
    constraints.close().unwrap();

    let mut vector = BlockVector::zeros(BlockIndices::from_block_sizes(&[3]));
    let local = DVector::from_column_slice(&[1.0, 2.0, 4.0]);
    constraints
        .distribute_local_vector(&local, &[0, 1, 2], &mut vector)
        .unwrap();
    assert_eq!(vector.as_vector().as_slice(), &[0.0, 3.0, 0.0]);
}
