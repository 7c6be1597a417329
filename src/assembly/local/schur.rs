use crate::assembly::local::BlockPartition;
use crate::nalgebra::{DMatrix, Scalar};
use crate::util::{gauss_jordan_in_place, SingularMatrixError};
use crate::Real;

/// Element-local static condensation onto the pressure block.
///
/// With the cell matrix reordered into blocks
///
/// ```text
/// [ A   Bt ]
/// [ B   C  ]
/// ```
///
/// the local Schur complement is `S = C - B (A + h^2 I)^{-1} Bt`, where `h` is the cell diameter.
/// The buffers are sized once from the block partition and reused for every cell.
#[derive(Debug, Clone)]
pub struct LocalSchurComplement<T: Scalar> {
    ordered: DMatrix<T>,
    a: DMatrix<T>,
    bt: DMatrix<T>,
    b: DMatrix<T>,
    c: DMatrix<T>,
    a_reg_inverse: DMatrix<T>,
    a_inverse_bt: DMatrix<T>,
    s: DMatrix<T>,
}

impl<T: Real> LocalSchurComplement<T> {
    pub fn new(partition: &BlockPartition) -> Self {
        let (n, u, p) = (partition.dofs_per_cell(), partition.dim_u(), partition.dim_p());
        Self {
            ordered: DMatrix::zeros(n, n),
            a: DMatrix::zeros(u, u),
            bt: DMatrix::zeros(u, p),
            b: DMatrix::zeros(p, u),
            c: DMatrix::zeros(p, p),
            a_reg_inverse: DMatrix::zeros(u, u),
            a_inverse_bt: DMatrix::zeros(u, p),
            s: DMatrix::zeros(p, p),
        }
    }

    /// Computes the blocks and the local Schur complement of `cell_matrix`.
    pub fn compute(
        &mut self,
        partition: &BlockPartition,
        cell_matrix: &DMatrix<T>,
        h: T,
    ) -> Result<(), SingularMatrixError> {
        let order = partition.order();
        let (n, dim_u) = (partition.dofs_per_cell(), partition.dim_u());
        assert_eq!(cell_matrix.nrows(), n, "Cell matrix must match the block partition");
        assert_eq!(cell_matrix.ncols(), n, "Cell matrix must match the block partition");
        assert_eq!(self.ordered.nrows(), n, "Workspace was created for a different partition");

        for i in 0..n {
            for j in 0..n {
                self.ordered[(i, j)] = cell_matrix[(order[i], order[j])];
            }
        }

        self.a.copy_from(&self.ordered.view((0, 0), (dim_u, dim_u)));
        self.bt.copy_from(&self.ordered.view((0, dim_u), (dim_u, n - dim_u)));
        self.b.copy_from(&self.ordered.view((dim_u, 0), (n - dim_u, dim_u)));
        self.c.copy_from(&self.ordered.view((dim_u, dim_u), (n - dim_u, n - dim_u)));

        self.a_reg_inverse.copy_from(&self.a);
        let h2 = h * h;
        for k in 0..dim_u {
            self.a_reg_inverse[(k, k)] += h2;
        }
        gauss_jordan_in_place(&mut self.a_reg_inverse)?;

        // S = C - B A_reg^{-1} Bt
        self.a_inverse_bt
            .gemm(T::one(), &self.a_reg_inverse, &self.bt, T::zero());
        self.s.copy_from(&self.c);
        self.s.gemm(-T::one(), &self.b, &self.a_inverse_bt, T::one());
        Ok(())
    }

    /// Overwrites the displacement block of `cell_precond` with the unregularized `A` and its
    /// pressure block with `S`. The coupling blocks are left untouched.
    pub fn write_preconditioner_blocks(&self, partition: &BlockPartition, cell_precond: &mut DMatrix<T>) {
        let l_u = partition.displacement_indices();
        let l_p = partition.pressure_indices();
        for (i, &row) in l_u.iter().enumerate() {
            for (j, &col) in l_u.iter().enumerate() {
                cell_precond[(row, col)] = self.a[(i, j)];
            }
        }
        for (i, &row) in l_p.iter().enumerate() {
            for (j, &col) in l_p.iter().enumerate() {
                cell_precond[(row, col)] = self.s[(i, j)];
            }
        }
    }

    /// The cell matrix in block order.
    pub fn ordered(&self) -> &DMatrix<T> {
        &self.ordered
    }

    pub fn a(&self) -> &DMatrix<T> {
        &self.a
    }

    pub fn bt(&self) -> &DMatrix<T> {
        &self.bt
    }

    pub fn b(&self) -> &DMatrix<T> {
        &self.b
    }

    pub fn c(&self) -> &DMatrix<T> {
        &self.c
    }

    /// `(A + h^2 I)^{-1}`.
    pub fn regularized_a_inverse(&self) -> &DMatrix<T> {
        &self.a_reg_inverse
    }

    pub fn schur_complement(&self) -> &DMatrix<T> {
        &self.s
    }
}
