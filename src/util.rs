use crate::Real;
use nalgebra::DMatrix;
use nalgebra_sparse::pattern::SparsityPattern;
use std::collections::BTreeSet;
use std::error::Error;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SingularMatrixError {
    /// Elimination step at which no acceptable pivot was found.
    pub step: usize,
    /// Magnitude of the largest pivot candidate.
    pub pivot: f64,
}

impl fmt::Display for SingularMatrixError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "Matrix is numerically singular: pivot magnitude {:e} at elimination step {}",
            self.pivot, self.step
        )
    }
}

impl Error for SingularMatrixError {}

/// Inverts a square matrix in place by Gauss-Jordan elimination with row pivoting.
///
/// Fails if the largest pivot candidate of some step does not exceed `1e-16` times the mean
/// magnitude of the diagonal of the input. The matrix content is unspecified on failure.
pub fn gauss_jordan_in_place<T: Real>(matrix: &mut DMatrix<T>) -> Result<(), SingularMatrixError> {
    assert!(matrix.is_square(), "Matrix must be square");
    let n = matrix.nrows();
    if n == 0 {
        return Ok(());
    }

    let diagonal_sum = matrix
        .diagonal()
        .iter()
        .fold(T::zero(), |sum, d| sum + d.abs());
    let typical_diagonal_element = diagonal_sum / nalgebra::convert(n as f64);
    let threshold = typical_diagonal_element * nalgebra::convert(1e-16);

    let mut p: Vec<usize> = (0..n).collect();
    for j in 0..n {
        // Pivot search on and below the diagonal of column j
        let (r, max) = (j..n)
            .map(|i| (i, matrix[(i, j)].abs()))
            .fold((j, T::zero()), |best, candidate| if candidate.1 > best.1 { candidate } else { best });
        if !(max > threshold) {
            return Err(SingularMatrixError {
                step: j,
                pivot: nalgebra::try_convert(max).unwrap_or(f64::NAN),
            });
        }

        if r > j {
            matrix.swap_rows(j, r);
            p.swap(j, r);
        }

        let hr = T::one() / matrix[(j, j)];
        matrix[(j, j)] = hr;
        for k in 0..n {
            if k == j {
                continue;
            }
            let a_jk = matrix[(j, k)];
            for i in 0..n {
                if i == j {
                    continue;
                }
                let a_ij = matrix[(i, j)];
                matrix[(i, k)] -= a_ij * a_jk * hr;
            }
        }
        for i in 0..n {
            matrix[(i, j)] *= hr;
            matrix[(j, i)] *= -hr;
        }
        matrix[(j, j)] = hr;
    }

    // Undo the row interchanges as column interchanges
    let mut row_buffer = vec![T::zero(); n];
    for i in 0..n {
        for k in 0..n {
            row_buffer[p[k]] = matrix[(i, k)];
        }
        for k in 0..n {
            matrix[(i, k)] = row_buffer[k];
        }
    }
    Ok(())
}

/// Builds a square sparsity pattern from the column sets of its rows.
///
/// Every column index must be smaller than the number of rows.
pub fn sparsity_pattern_from_rows(rows: Vec<BTreeSet<usize>>) -> SparsityPattern {
    let n = rows.len();
    let mut offsets = Vec::with_capacity(n + 1);
    let mut indices = Vec::new();
    offsets.push(0);
    for row in rows {
        indices.extend(row);
        offsets.push(indices.len());
    }
    SparsityPattern::try_from_offsets_and_indices(n, n, offsets, indices)
        .expect("Sorted, deduplicated rows always form a valid pattern")
}
