//! Block-partitioned vectors and sparse matrices.
//!
//! Degrees of freedom are numbered so that every block occupies a contiguous index range,
//! which lets block structures wrap a single global vector or CSR matrix and expose
//! block views on demand.
use nalgebra::{DVector, DVectorView, DVectorViewMut, Scalar};
use nalgebra_sparse::pattern::SparsityPattern;
use nalgebra_sparse::{CooMatrix, CsrMatrix};
use num::Zero;
use std::ops::Range;

/// Start offsets of the blocks of a block-partitioned index range.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BlockIndices {
    starts: Vec<usize>,
}

impl BlockIndices {
    pub fn from_block_sizes(sizes: &[usize]) -> Self {
        let mut starts = Vec::with_capacity(sizes.len() + 1);
        starts.push(0);
        for size in sizes {
            starts.push(starts[starts.len() - 1] + size);
        }
        Self { starts }
    }

    pub fn n_blocks(&self) -> usize {
        self.starts.len().saturating_sub(1)
    }

    pub fn total_size(&self) -> usize {
        self.starts.last().copied().unwrap_or(0)
    }

    pub fn block_size(&self, block: usize) -> usize {
        self.starts[block + 1] - self.starts[block]
    }

    pub fn block_sizes(&self) -> Vec<usize> {
        (0..self.n_blocks()).map(|b| self.block_size(b)).collect()
    }

    pub fn block_range(&self, block: usize) -> Range<usize> {
        self.starts[block]..self.starts[block + 1]
    }

    /// Maps a global index to `(block, index within block)`.
    pub fn global_to_local(&self, global_index: usize) -> (usize, usize) {
        assert!(global_index < self.total_size(), "Index out of bounds");
        // Index of the last start that is <= global_index, skipping empty blocks
        let block = self.starts.partition_point(|&start| start <= global_index) - 1;
        (block, global_index - self.starts[block])
    }
}

/// A vector partitioned into contiguous blocks.
#[derive(Debug, Clone, PartialEq)]
pub struct BlockVector<T: Scalar> {
    indices: BlockIndices,
    data: DVector<T>,
}

impl<T: Scalar + Zero> BlockVector<T> {
    pub fn zeros(indices: BlockIndices) -> Self {
        let data = DVector::zeros(indices.total_size());
        Self { indices, data }
    }

    pub fn fill_zero(&mut self) {
        self.data.fill(T::zero());
    }
}

impl<T: Scalar> BlockVector<T> {
    pub fn from_vector(indices: BlockIndices, data: DVector<T>) -> Self {
        assert_eq!(indices.total_size(), data.len(), "Vector length must match block indices");
        Self { indices, data }
    }

    pub fn block_indices(&self) -> &BlockIndices {
        &self.indices
    }

    pub fn n_blocks(&self) -> usize {
        self.indices.n_blocks()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn as_vector(&self) -> &DVector<T> {
        &self.data
    }

    pub fn as_vector_mut(&mut self) -> &mut DVector<T> {
        &mut self.data
    }

    pub fn block(&self, block: usize) -> DVectorView<'_, T> {
        let range = self.indices.block_range(block);
        self.data.rows_range(range)
    }

    pub fn block_mut(&mut self, block: usize) -> DVectorViewMut<'_, T> {
        let range = self.indices.block_range(block);
        self.data.rows_range_mut(range)
    }
}

/// A square sparse matrix in CSR format with a block partition of its rows and columns.
#[derive(Debug, Clone, PartialEq)]
pub struct BlockCsrMatrix<T> {
    indices: BlockIndices,
    matrix: CsrMatrix<T>,
}

impl<T: Scalar + Zero> BlockCsrMatrix<T> {
    /// Creates a matrix with the given sparsity pattern and all stored entries set to zero.
    pub fn zeros_from_pattern(indices: BlockIndices, pattern: SparsityPattern) -> Self {
        assert_eq!(pattern.major_dim(), indices.total_size(), "Pattern must match block indices");
        assert_eq!(pattern.minor_dim(), indices.total_size(), "Pattern must be square");
        let values = vec![T::zero(); pattern.nnz()];
        let matrix = CsrMatrix::try_from_pattern_and_values(pattern, values)
            .expect("Values have the same length as the pattern, which is therefore valid");
        Self { indices, matrix }
    }

    pub fn fill_zero(&mut self) {
        self.matrix.values_mut().fill(T::zero());
    }

    /// Extracts block `(block_row, block_col)` as a standalone CSR matrix.
    pub fn block(&self, block_row: usize, block_col: usize) -> CsrMatrix<T>
    where
        T: std::ops::AddAssign,
    {
        let rows = self.indices.block_range(block_row);
        let cols = self.indices.block_range(block_col);
        let mut coo = CooMatrix::new(rows.len(), cols.len());
        for i in rows.clone() {
            let row = self.matrix.row(i);
            for (&j, v) in row.col_indices().iter().zip(row.values()) {
                if cols.contains(&j) {
                    coo.push(i - rows.start, j - cols.start, v.clone());
                }
            }
        }
        CsrMatrix::from(&coo)
    }
}

impl<T> BlockCsrMatrix<T> {
    pub fn block_indices(&self) -> &BlockIndices {
        &self.indices
    }

    pub fn n_blocks(&self) -> usize {
        self.indices.n_blocks()
    }

    pub fn as_csr(&self) -> &CsrMatrix<T> {
        &self.matrix
    }

    pub fn as_csr_mut(&mut self) -> &mut CsrMatrix<T> {
        &mut self.matrix
    }
}

impl<T: Scalar> BlockCsrMatrix<T> {
    /// Returns the stored value at `(i, j)`, or `None` if the entry is not in the sparsity pattern.
    pub fn get(&self, i: usize, j: usize) -> Option<T> {
        let row = self.matrix.row(i);
        row.col_indices()
            .binary_search(&j)
            .ok()
            .map(|idx| row.values()[idx].clone())
    }

    /// Returns a mutable reference to the stored value at `(i, j)`, or `None` if the
    /// entry is not in the sparsity pattern.
    pub fn get_mut(&mut self, i: usize, j: usize) -> Option<&mut T> {
        let start = self.matrix.row_offsets()[i];
        let end = self.matrix.row_offsets()[i + 1];
        let idx = self.matrix.col_indices()[start..end].binary_search(&j).ok()?;
        Some(&mut self.matrix.values_mut()[start + idx])
    }
}
