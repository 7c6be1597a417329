//! Functionality for error estimation.
use crate::allocators::DimAllocator;
use crate::assembly::buffers::CellValues;
use crate::element::MixedElementLayout;
use crate::nalgebra::{DVector, DefaultAllocator, OPoint, OVector};
use crate::space::MixedFiniteElementSpace;
use crate::{Real, SmallDim};
use eyre::eyre;

/// A reference solution of the mixed problem.
pub trait ExactSolution<T, D>
where
    T: Real,
    D: SmallDim,
    DefaultAllocator: DimAllocator<T, D>,
{
    fn displacement(&self, point: &OPoint<T, D>) -> OVector<T, D>;

    fn pressure(&self, point: &OPoint<T, D>) -> T;
}

/// $L^2$ norms of the displacement and pressure errors.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MixedL2Errors<T> {
    pub displacement: T,
    pub pressure: T,
}

/// Estimate the squared $L^2$ errors $\norm{u_h - u}^2_{L^2}$ and $\norm{p_h - p}^2_{L^2}$ on a single
/// cell.
///
/// `local_solution` holds the coefficients of the cell dofs in local order.
///
/// # Panics
///
/// Panics if `local_solution` does not have one entry per local dof.
#[allow(non_snake_case)]
pub fn estimate_cell_L2_errors_squared<T, D>(
    values: &CellValues<T, D>,
    layout: &MixedElementLayout,
    local_solution: &[T],
    exact: &(impl ?Sized + ExactSolution<T, D>),
) -> (T, T)
where
    T: Real,
    D: SmallDim,
    DefaultAllocator: DimAllocator<T, D>,
{
    let n = values.dofs_per_cell();
    assert_eq!(local_solution.len(), n);

    let mut u_error = T::zero();
    let mut p_error = T::zero();
    for (q, x) in values.points().iter().enumerate() {
        let mut u_h = OVector::<T, D>::zeros();
        let mut p_h = T::zero();
        for (i, &coefficient) in local_solution.iter().enumerate() {
            if layout.is_displacement(i) {
                u_h += values.displacement_value(i, q) * coefficient;
            } else {
                p_h += values.pressure_value(i, q) * coefficient;
            }
        }
        let jxw = values.jxw(q);
        u_error += (u_h - exact.displacement(x)).norm_squared() * jxw;
        let p_diff = p_h - exact.pressure(x);
        p_error += p_diff * p_diff * jxw;
    }
    (u_error, p_error)
}

/// Computes the global $L^2$ errors of a solution vector in the given space.
///
/// Each cell is integrated with the cell rule of the space's
/// [`BasisEvaluator`](crate::space::BasisEvaluator). For
/// [`TaylorHoodSpace`](crate::space::TaylorHoodSpace) this is the tensor-product Gauss rule
/// used for assembly.
#[allow(non_snake_case)]
pub fn compute_L2_errors<T, D, Space>(
    space: &Space,
    solution: &DVector<T>,
    exact: &(impl ?Sized + ExactSolution<T, D>),
) -> eyre::Result<MixedL2Errors<T>>
where
    T: Real,
    D: SmallDim,
    DefaultAllocator: DimAllocator<T, D>,
    Space: ?Sized + MixedFiniteElementSpace<T, D>,
{
    if solution.len() != space.n_dofs() {
        return Err(eyre!(
            "Solution has {} entries, but the space has {} dofs",
            solution.len(),
            space.n_dofs()
        ));
    }

    let mut values = CellValues::default();
    let mut dofs = vec![0; space.dofs_per_cell()];
    let mut local_solution = vec![T::zero(); space.dofs_per_cell()];
    let mut u_error_squared = T::zero();
    let mut p_error_squared = T::zero();
    for cell in 0..space.num_cells() {
        space.populate_cell_values(cell, &mut values)?;
        space.populate_cell_dofs(cell, &mut dofs);
        for (local, &global) in local_solution.iter_mut().zip(&dofs) {
            *local = solution[global];
        }
        let (u_error, p_error) =
            estimate_cell_L2_errors_squared(&values, space.element_layout(), &local_solution, exact);
        u_error_squared += u_error;
        p_error_squared += p_error;
    }

    Ok(MixedL2Errors {
        displacement: u_error_squared.sqrt(),
        pressure: p_error_squared.sqrt(),
    })
}
