//! Linear constraints on degrees of freedom and constrained distribution of local contributions.
//!
//! A constraint on dof `i` has the form
//!
//! ```text
//! x_i = sum_k w_k x_k + g_i
//! ```
//!
//! Dirichlet conditions are constraints without entries. Constraints are eliminated while local
//! matrices and vectors are added to global structures: contributions to a constrained row are
//! redistributed to the rows it depends on, contributions to a constrained column are moved to the
//! right-hand side through the inhomogeneity, and the constrained row itself is replaced by
//! `x_i = g_i`.
use crate::block::{BlockCsrMatrix, BlockVector};
use crate::space::DofMap;
use crate::util::sparsity_pattern_from_rows;
use crate::Real;
use nalgebra::{DMatrix, DVector};
use nalgebra_sparse::pattern::SparsityPattern;
use rustc_hash::{FxHashMap, FxHashSet};
use std::collections::BTreeSet;
use std::error::Error;
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub struct ConstraintLine<T> {
    entries: Vec<(usize, T)>,
    inhomogeneity: T,
}

impl<T> ConstraintLine<T> {
    pub fn entries(&self) -> &[(usize, T)] {
        &self.entries
    }

    pub fn inhomogeneity(&self) -> &T {
        &self.inhomogeneity
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintError {
    /// The dof is already constrained in an incompatible way.
    Conflicting { dof: usize },
    /// Resolving the constraint on the dof leads back to the dof itself.
    Cyclic { dof: usize },
    /// Constraints were added after the set was closed.
    AlreadyClosed,
    /// Distribution was attempted before the set was closed.
    NotClosed,
    /// A constrained contribution targets an entry missing from the sparsity pattern.
    EntryNotInPattern { row: usize, col: usize },
}

impl fmt::Display for ConstraintError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Conflicting { dof } => write!(f, "Conflicting constraints on dof {dof}"),
            Self::Cyclic { dof } => write!(f, "Cyclic constraint dependency involving dof {dof}"),
            Self::AlreadyClosed => write!(f, "Cannot add constraints to a closed constraint set"),
            Self::NotClosed => write!(f, "Constraint set must be closed before distribution"),
            Self::EntryNotInPattern { row, col } => {
                write!(f, "Entry ({row}, {col}) is not part of the sparsity pattern")
            }
        }
    }
}

impl Error for ConstraintError {}

/// A set of linear constraints.
///
/// Constraints are added while the set is open. [`close`](Self::close) resolves chains of
/// constraints so that every line only refers to unconstrained dofs; only a closed set can be
/// used for distribution.
#[derive(Debug, Clone)]
pub struct ConstraintSet<T> {
    lines: FxHashMap<usize, ConstraintLine<T>>,
    closed: bool,
}

impl<T> Default for ConstraintSet<T> {
    fn default() -> Self {
        Self {
            lines: FxHashMap::default(),
            closed: false,
        }
    }
}

impl<T: Real> ConstraintSet<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Constrains `dof` to the fixed value `value`.
    ///
    /// Constraining an already constrained dof to the same fixed value is accepted.
    pub fn add_dirichlet(&mut self, dof: usize, value: T) -> Result<(), ConstraintError> {
        if self.closed {
            return Err(ConstraintError::AlreadyClosed);
        }
        match self.lines.get(&dof) {
            Some(line) if line.entries.is_empty() && line.inhomogeneity == value => Ok(()),
            Some(_) => Err(ConstraintError::Conflicting { dof }),
            None => {
                self.lines.insert(
                    dof,
                    ConstraintLine {
                        entries: Vec::new(),
                        inhomogeneity: value,
                    },
                );
                Ok(())
            }
        }
    }

    /// Adds the constraint `x_dof = sum_k w_k x_k + inhomogeneity`.
    pub fn add_constraint(
        &mut self,
        dof: usize,
        entries: Vec<(usize, T)>,
        inhomogeneity: T,
    ) -> Result<(), ConstraintError> {
        if self.closed {
            return Err(ConstraintError::AlreadyClosed);
        }
        if self.lines.contains_key(&dof) {
            return Err(ConstraintError::Conflicting { dof });
        }
        if entries.iter().any(|&(k, _)| k == dof) {
            return Err(ConstraintError::Cyclic { dof });
        }
        self.lines.insert(dof, ConstraintLine { entries, inhomogeneity });
        Ok(())
    }

    /// Resolves chained constraints and merges duplicate entries.
    pub fn close(&mut self) -> Result<(), ConstraintError> {
        if self.closed {
            return Ok(());
        }
        let mut dofs: Vec<_> = self.lines.keys().copied().collect();
        dofs.sort_unstable();

        let mut resolved = FxHashMap::default();
        let mut in_progress = FxHashSet::default();
        for dof in dofs {
            resolve_line(dof, &self.lines, &mut resolved, &mut in_progress)?;
        }
        self.lines = resolved;
        self.closed = true;
        Ok(())
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn is_constrained(&self, dof: usize) -> bool {
        self.lines.contains_key(&dof)
    }

    pub fn n_constraints(&self) -> usize {
        self.lines.len()
    }

    pub fn line(&self, dof: usize) -> Option<&ConstraintLine<T>> {
        self.lines.get(&dof)
    }

    /// Constrained dofs in ascending order.
    pub fn constrained_dofs(&self) -> Vec<usize> {
        let mut dofs: Vec<_> = self.lines.keys().copied().collect();
        dofs.sort_unstable();
        dofs
    }

    /// Builds the sparsity pattern of a global matrix assembled through these constraints.
    ///
    /// Every diagonal entry is part of the pattern, so that constrained rows can hold their
    /// unit diagonal.
    pub fn make_sparsity_pattern<Map>(&self, dof_map: &Map) -> Result<SparsityPattern, ConstraintError>
    where
        Map: ?Sized + DofMap,
    {
        if !self.closed {
            return Err(ConstraintError::NotClosed);
        }
        let n = dof_map.n_dofs();
        let mut rows: Vec<BTreeSet<usize>> = (0..n).map(|i| BTreeSet::from([i])).collect();
        let mut cell_dofs = vec![0; dof_map.dofs_per_cell()];
        for cell in 0..dof_map.num_cells() {
            dof_map.populate_cell_dofs(cell, &mut cell_dofs);
            for &i in &cell_dofs {
                for (r, _) in self.expand(i) {
                    for &j in &cell_dofs {
                        rows[r].extend(self.expand(j).map(|(c, _)| c));
                    }
                }
            }
        }

        Ok(sparsity_pattern_from_rows(rows))
    }

    /// Adds a local matrix and vector to global structures while eliminating constraints.
    ///
    /// `indices` maps local rows/columns to global dofs. Constrained rows end up with a unit
    /// diagonal and their inhomogeneity on the right-hand side; contributions to constrained
    /// columns are moved to the right-hand side.
    pub fn distribute_local_to_global(
        &self,
        local_matrix: &DMatrix<T>,
        local_vector: &DVector<T>,
        indices: &[usize],
        matrix: &mut BlockCsrMatrix<T>,
        vector: &mut BlockVector<T>,
    ) -> Result<(), ConstraintError> {
        if !self.closed {
            return Err(ConstraintError::NotClosed);
        }
        let n = indices.len();
        assert_eq!(local_matrix.nrows(), n, "Local matrix must match index list");
        assert_eq!(local_matrix.ncols(), n, "Local matrix must match index list");
        assert_eq!(local_vector.len(), n, "Local vector must match index list");

        let rhs = vector.as_vector_mut();
        for (a, &i) in indices.iter().enumerate() {
            for (r, w_r) in self.expand(i) {
                rhs[r] += w_r * local_vector[a];
            }

            for (b, &j) in indices.iter().enumerate() {
                let value = local_matrix[(a, b)];
                if value == T::zero() {
                    continue;
                }
                let column_inhomogeneity = self.lines.get(&j).map(|line| line.inhomogeneity);
                for (r, w_r) in self.expand(i) {
                    for (c, w_c) in self.expand(j) {
                        add_to_entry(matrix, r, c, w_r * value * w_c)?;
                    }
                    if let Some(g) = column_inhomogeneity {
                        rhs[r] -= w_r * value * g;
                    }
                }
            }
        }

        for &i in indices {
            if let Some(line) = self.lines.get(&i) {
                let diagonal = matrix
                    .get_mut(i, i)
                    .ok_or(ConstraintError::EntryNotInPattern { row: i, col: i })?;
                *diagonal = T::one();
                rhs[i] = line.inhomogeneity;
            }
        }
        Ok(())
    }

    /// Adds a local vector to a global vector, redistributing constrained entries.
    ///
    /// Constrained entries themselves receive nothing.
    pub fn distribute_local_vector(
        &self,
        local_vector: &DVector<T>,
        indices: &[usize],
        vector: &mut BlockVector<T>,
    ) -> Result<(), ConstraintError> {
        if !self.closed {
            return Err(ConstraintError::NotClosed);
        }
        assert_eq!(local_vector.len(), indices.len(), "Local vector must match index list");
        let global = vector.as_vector_mut();
        for (a, &i) in indices.iter().enumerate() {
            for (r, w_r) in self.expand(i) {
                global[r] += w_r * local_vector[a];
            }
        }
        Ok(())
    }

    /// Sets every constrained entry of `solution` to the value implied by its constraint.
    pub fn distribute(&self, solution: &mut DVector<T>) -> Result<(), ConstraintError> {
        if !self.closed {
            return Err(ConstraintError::NotClosed);
        }
        for (&dof, line) in &self.lines {
            let mut value = line.inhomogeneity;
            for &(k, w) in &line.entries {
                value += w * solution[k];
            }
            solution[dof] = value;
        }
        Ok(())
    }

    /// Rows that a contribution to dof `i` is distributed to, with weights.
    fn expand(&self, i: usize) -> impl Iterator<Item = (usize, T)> + '_ {
        let (unconstrained, entries) = match self.lines.get(&i) {
            Some(line) => (None, line.entries.as_slice()),
            None => (Some((i, T::one())), [].as_slice()),
        };
        unconstrained.into_iter().chain(entries.iter().copied())
    }
}

fn add_to_entry<T: Real>(matrix: &mut BlockCsrMatrix<T>, row: usize, col: usize, value: T) -> Result<(), ConstraintError> {
    let entry = matrix
        .get_mut(row, col)
        .ok_or(ConstraintError::EntryNotInPattern { row, col })?;
    *entry += value;
    Ok(())
}

fn resolve_line<T: Real>(
    dof: usize,
    lines: &FxHashMap<usize, ConstraintLine<T>>,
    resolved: &mut FxHashMap<usize, ConstraintLine<T>>,
    in_progress: &mut FxHashSet<usize>,
) -> Result<(), ConstraintError> {
    if resolved.contains_key(&dof) {
        return Ok(());
    }
    if !in_progress.insert(dof) {
        return Err(ConstraintError::Cyclic { dof });
    }

    let line = &lines[&dof];
    let mut entries = Vec::with_capacity(line.entries.len());
    let mut inhomogeneity = line.inhomogeneity;
    for &(k, w) in &line.entries {
        if lines.contains_key(&k) {
            resolve_line(k, lines, resolved, in_progress)?;
            let dependency = &resolved[&k];
            entries.extend(dependency.entries.iter().map(|&(m, w_m)| (m, w * w_m)));
            inhomogeneity += w * dependency.inhomogeneity;
        } else {
            entries.push((k, w));
        }
    }

    entries.sort_by_key(|&(k, _)| k);
    let mut merged: Vec<(usize, T)> = Vec::with_capacity(entries.len());
    for (k, w) in entries {
        match merged.last_mut() {
            Some((last, w_last)) if *last == k => *w_last += w,
            _ => merged.push((k, w)),
        }
    }

    in_progress.remove(&dof);
    resolved.insert(
        dof,
        ConstraintLine {
            entries: merged,
            inhomogeneity,
        },
    );
    Ok(())
}
