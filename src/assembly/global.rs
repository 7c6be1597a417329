//! Global assembly of the saddle point system and its block preconditioner.
use crate::allocators::DimAllocator;
use crate::assembly::buffers::{CellValues, FaceValues};
use crate::assembly::local::{
    assemble_cell_saddle_point_form, assemble_cell_surface_load, BlockPartition, BlockPartitionError,
    CellContributions, LocalSchurComplement, QuadraturePointBasis, SaddlePointForm,
};
use crate::constraints::{ConstraintError, ConstraintSet};
use crate::element::MixedElementLayout;
use crate::materials::{BoundaryLoad, MaterialCoefficients};
use crate::nalgebra::DefaultAllocator;
use crate::space::MixedFiniteElementSpace;
use crate::system::SaddlePointSystem;
use crate::{Real, SmallDim};
use eyre::{eyre, WrapErr};
use log::debug;
use rayon::iter::{IntoParallelIterator, ParallelIterator};

/// Per-cell buffers, cleared and reused for every cell.
#[derive(Debug, Clone)]
pub struct CellScratch<T, D>
where
    T: Real,
    D: SmallDim,
    DefaultAllocator: DimAllocator<T, D>,
{
    cell_values: CellValues<T, D>,
    face_values: FaceValues<T, D>,
    basis: QuadraturePointBasis<T, D>,
    mu: Vec<T>,
    beta: Vec<T>,
    contributions: CellContributions<T>,
    schur: LocalSchurComplement<T>,
    local_dofs: Vec<usize>,
}

impl<T, D> CellScratch<T, D>
where
    T: Real,
    D: SmallDim,
    DefaultAllocator: DimAllocator<T, D>,
{
    pub fn new(partition: &BlockPartition) -> Self {
        Self {
            cell_values: CellValues::default(),
            face_values: FaceValues::default(),
            basis: QuadraturePointBasis::default(),
            mu: Vec::new(),
            beta: Vec::new(),
            contributions: CellContributions::zeros(partition.dofs_per_cell()),
            schur: LocalSchurComplement::new(partition),
            local_dofs: vec![0; partition.dofs_per_cell()],
        }
    }
}

/// Drives the cell loop that assembles the global system matrix, the global block
/// preconditioner and the load vectors.
///
/// For every cell, the local form and load are computed, the local Schur complement replaces the
/// pressure block of the local preconditioner, and both local systems are distributed through the
/// same constraints with the same global indices.
#[derive(Debug, Clone)]
pub struct SaddlePointAssembler<T, D>
where
    T: Real,
    D: SmallDim,
    DefaultAllocator: DimAllocator<T, D>,
{
    partition: BlockPartition,
    form: SaddlePointForm<T>,
    scratch: CellScratch<T, D>,
    capture_first_cell: bool,
    first_cell: Option<CellContributions<T>>,
}

impl<T, D> SaddlePointAssembler<T, D>
where
    T: Real,
    D: SmallDim,
    DefaultAllocator: DimAllocator<T, D>,
{
    pub fn new(layout: &MixedElementLayout, form: SaddlePointForm<T>) -> Result<Self, BlockPartitionError> {
        let partition = BlockPartition::from_layout(layout)?;
        let scratch = CellScratch::new(&partition);
        Ok(Self {
            partition,
            form,
            scratch,
            capture_first_cell: false,
            first_cell: None,
        })
    }

    /// Keep a copy of the local contributions of the first cell of every assembly.
    pub fn with_first_cell_capture(mut self, capture: bool) -> Self {
        self.capture_first_cell = capture;
        self
    }

    pub fn partition(&self) -> &BlockPartition {
        &self.partition
    }

    pub fn form(&self) -> &SaddlePointForm<T> {
        &self.form
    }

    pub fn first_cell_contributions(&self) -> Option<&CellContributions<T>> {
        self.first_cell.as_ref()
    }

    /// Local Schur complement data of the most recently computed cell.
    pub fn local_schur_complement(&self) -> &LocalSchurComplement<T> {
        &self.scratch.schur
    }

    /// Computes the local contributions of a single cell without distributing them.
    pub fn assemble_cell<Space, Coefficients, Load>(
        &mut self,
        space: &Space,
        coefficients: &Coefficients,
        load: &Load,
        cell: usize,
    ) -> eyre::Result<&CellContributions<T>>
    where
        Space: ?Sized + MixedFiniteElementSpace<T, D>,
        Coefficients: ?Sized + MaterialCoefficients<T, D>,
        Load: ?Sized + BoundaryLoad<T, D>,
    {
        check_space_compatibility::<T, D, _>(&self.partition, space)?;
        compute_cell_contributions(&self.partition, &self.form, space, coefficients, load, cell, &mut self.scratch)?;
        Ok(&self.scratch.contributions)
    }

    /// Assembles all cells in order.
    ///
    /// All matrices and right-hand sides of `system` are zeroed first, so repeated calls produce
    /// identical results.
    pub fn assemble_system<Space, Coefficients, Load>(
        &mut self,
        space: &Space,
        coefficients: &Coefficients,
        load: &Load,
        constraints: &ConstraintSet<T>,
        system: &mut SaddlePointSystem<T>,
    ) -> eyre::Result<()>
    where
        Space: ?Sized + MixedFiniteElementSpace<T, D>,
        Coefficients: ?Sized + MaterialCoefficients<T, D>,
        Load: ?Sized + BoundaryLoad<T, D>,
    {
        check_space_compatibility::<T, D, _>(&self.partition, space)?;
        check_system_compatibility::<T, D, _>(space, system)?;
        system.zero_assembled();
        self.first_cell = None;

        for cell in 0..space.num_cells() {
            compute_cell_contributions(&self.partition, &self.form, space, coefficients, load, cell, &mut self.scratch)?;
            let CellScratch {
                contributions,
                local_dofs,
                ..
            } = &self.scratch;
            distribute_cell(contributions, local_dofs, constraints, system)
                .wrap_err_with(|| format!("Failed to distribute contributions of cell {cell}"))?;
            if self.capture_first_cell && cell == 0 {
                self.first_cell = Some(contributions.clone());
            }
        }

        debug!(
            "Assembled {} cells into a system with {} dofs and {} stored entries",
            space.num_cells(),
            space.n_dofs(),
            system.system_matrix.as_csr().nnz()
        );
        Ok(())
    }

    /// Assembles all cells, computing local contributions in parallel.
    ///
    /// Contributions are distributed sequentially in cell order afterwards, so the result is
    /// identical to [`assemble_system`](Self::assemble_system).
    pub fn par_assemble_system<Space, Coefficients, Load>(
        &mut self,
        space: &Space,
        coefficients: &Coefficients,
        load: &Load,
        constraints: &ConstraintSet<T>,
        system: &mut SaddlePointSystem<T>,
    ) -> eyre::Result<()>
    where
        T: Send + Sync,
        Space: ?Sized + Sync + MixedFiniteElementSpace<T, D>,
        Coefficients: ?Sized + Sync + MaterialCoefficients<T, D>,
        Load: ?Sized + Sync + BoundaryLoad<T, D>,
        CellScratch<T, D>: Send,
    {
        check_space_compatibility::<T, D, _>(&self.partition, space)?;
        check_system_compatibility::<T, D, _>(space, system)?;
        system.zero_assembled();

        let partition = &self.partition;
        let form = &self.form;
        let cells = (0..space.num_cells())
            .into_par_iter()
            .map_init(
                || CellScratch::<T, D>::new(partition),
                |scratch, cell| -> eyre::Result<_> {
                    compute_cell_contributions(partition, form, space, coefficients, load, cell, scratch)?;
                    Ok((scratch.contributions.clone(), scratch.local_dofs.clone()))
                },
            )
            .collect::<eyre::Result<Vec<_>>>()?;

        for (cell, (contributions, local_dofs)) in cells.iter().enumerate() {
            distribute_cell(contributions, local_dofs, constraints, system)
                .wrap_err_with(|| format!("Failed to distribute contributions of cell {cell}"))?;
        }
        self.first_cell = match self.capture_first_cell {
            true => cells.into_iter().next().map(|(contributions, _)| contributions),
            false => None,
        };

        debug!(
            "Assembled {} cells in parallel into a system with {} dofs",
            space.num_cells(),
            space.n_dofs()
        );
        Ok(())
    }
}

fn check_space_compatibility<T, D, Space>(partition: &BlockPartition, space: &Space) -> eyre::Result<()>
where
    T: Real,
    D: SmallDim,
    DefaultAllocator: DimAllocator<T, D>,
    Space: ?Sized + MixedFiniteElementSpace<T, D>,
{
    let space_partition = BlockPartition::from_layout(space.element_layout())?;
    if &space_partition != partition || space.dofs_per_cell() != partition.dofs_per_cell() {
        return Err(eyre!(
            "Element of the space ({} dofs per cell) does not match the assembler's block partition ({} dofs per cell)",
            space.dofs_per_cell(),
            partition.dofs_per_cell()
        ));
    }
    Ok(())
}

fn check_system_compatibility<T, D, Space>(space: &Space, system: &SaddlePointSystem<T>) -> eyre::Result<()>
where
    T: Real,
    D: SmallDim,
    DefaultAllocator: DimAllocator<T, D>,
    Space: ?Sized + MixedFiniteElementSpace<T, D>,
{
    let n = system.block_indices().total_size();
    if n != space.n_dofs() {
        return Err(eyre!(
            "Global system has {n} rows, but the space has {} dofs",
            space.n_dofs()
        ));
    }
    Ok(())
}

fn compute_cell_contributions<T, D, Space, Coefficients, Load>(
    partition: &BlockPartition,
    form: &SaddlePointForm<T>,
    space: &Space,
    coefficients: &Coefficients,
    load: &Load,
    cell: usize,
    scratch: &mut CellScratch<T, D>,
) -> eyre::Result<()>
where
    T: Real,
    D: SmallDim,
    DefaultAllocator: DimAllocator<T, D>,
    Space: ?Sized + MixedFiniteElementSpace<T, D>,
    Coefficients: ?Sized + MaterialCoefficients<T, D>,
    Load: ?Sized + BoundaryLoad<T, D>,
{
    let n = partition.dofs_per_cell();
    scratch.contributions.clear(n);
    space
        .populate_cell_values(cell, &mut scratch.cell_values)
        .wrap_err_with(|| format!("Failed to evaluate basis on cell {cell}"))?;

    let n_points = scratch.cell_values.n_quadrature_points();
    scratch.mu.resize(n_points, T::zero());
    scratch.beta.resize(n_points, T::zero());
    coefficients.mu_value_list(scratch.cell_values.points(), &mut scratch.mu);
    coefficients.beta_value_list(scratch.cell_values.points(), &mut scratch.beta);

    assemble_cell_saddle_point_form(
        &mut scratch.contributions,
        &mut scratch.basis,
        &scratch.cell_values,
        &scratch.mu,
        &scratch.beta,
        form,
    );

    for face in 0..space.num_faces(cell) {
        if space.face_boundary_id(cell, face) == Some(form.surface_load_boundary) {
            space
                .populate_face_values(cell, face, &mut scratch.face_values)
                .wrap_err_with(|| format!("Failed to evaluate basis on face {face} of cell {cell}"))?;
            assemble_cell_surface_load(&mut scratch.contributions, space.element_layout(), &scratch.face_values, load);
        }
    }
    scratch.contributions.finalize_rhs();

    let h = space.cell_diameter(cell);
    scratch
        .schur
        .compute(partition, scratch.contributions.cell_matrix(), h)
        .wrap_err_with(|| format!("Failed to invert the regularized displacement block of cell {cell}"))?;
    scratch
        .schur
        .write_preconditioner_blocks(partition, scratch.contributions.cell_precond_mut());

    scratch.local_dofs.resize(n, 0);
    space.populate_cell_dofs(cell, &mut scratch.local_dofs);
    Ok(())
}

fn distribute_cell<T: Real>(
    contributions: &CellContributions<T>,
    local_dofs: &[usize],
    constraints: &ConstraintSet<T>,
    system: &mut SaddlePointSystem<T>,
) -> Result<(), ConstraintError> {
    constraints.distribute_local_to_global(
        contributions.cell_matrix(),
        contributions.cell_rhs(),
        local_dofs,
        &mut system.system_matrix,
        &mut system.system_rhs,
    )?;
    constraints.distribute_local_to_global(
        contributions.cell_precond(),
        contributions.cell_pre_rhs(),
        local_dofs,
        &mut system.system_preconditioner,
        &mut system.precond_rhs,
    )?;
    constraints.distribute_local_vector(contributions.cell_body_force(), local_dofs, &mut system.body_force)?;
    constraints.distribute_local_vector(contributions.cell_load(), local_dofs, &mut system.load)?;
    Ok(())
}
