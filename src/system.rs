use crate::block::{BlockCsrMatrix, BlockIndices, BlockVector};
use crate::Real;
use nalgebra_sparse::pattern::SparsityPattern;

/// Global matrices and vectors of the mixed problem.
///
/// The system matrix and the preconditioner share one sparsity pattern and one block
/// partition. `system_rhs` pairs with the system matrix and `precond_rhs` with the
/// preconditioner; `body_force` and `load` hold the volume and surface parts of the right-hand side.
#[derive(Debug, Clone)]
pub struct SaddlePointSystem<T: Real> {
    pub system_matrix: BlockCsrMatrix<T>,
    pub system_preconditioner: BlockCsrMatrix<T>,
    pub system_rhs: BlockVector<T>,
    pub precond_rhs: BlockVector<T>,
    pub body_force: BlockVector<T>,
    pub load: BlockVector<T>,
    pub solution: BlockVector<T>,
}

impl<T: Real> SaddlePointSystem<T> {
    pub fn new(block_indices: BlockIndices, pattern: SparsityPattern) -> Self {
        let vector = BlockVector::zeros(block_indices.clone());
        Self {
            system_matrix: BlockCsrMatrix::zeros_from_pattern(block_indices.clone(), pattern.clone()),
            system_preconditioner: BlockCsrMatrix::zeros_from_pattern(block_indices, pattern),
            system_rhs: vector.clone(),
            precond_rhs: vector.clone(),
            body_force: vector.clone(),
            load: vector.clone(),
            solution: vector,
        }
    }

    pub fn block_indices(&self) -> &BlockIndices {
        self.system_matrix.block_indices()
    }

    /// Zeroes all matrices and right-hand sides. The solution is left untouched.
    pub fn zero_assembled(&mut self) {
        self.system_matrix.fill_zero();
        self.system_preconditioner.fill_zero();
        self.system_rhs.fill_zero();
        self.precond_rhs.fill_zero();
        self.body_force.fill_zero();
        self.load.fill_zero();
    }
}
