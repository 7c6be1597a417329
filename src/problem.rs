//! Problem driver: geometry, dofs, assembly, solve and post-processing of the elastic problem.
use crate::assembly::global::SaddlePointAssembler;
use crate::assembly::local::CellContributions;
use crate::block::BlockIndices;
use crate::constraints::ConstraintSet;
use crate::dofs::block_sizes;
use crate::error::{compute_L2_errors, ExactSolution, MixedL2Errors};
use crate::io::write_matlab_study;
use crate::mesh::procedural::{create_rectangular_quad_mesh, tag_rectangle_boundary};
use crate::nalgebra::{convert, try_convert, DVector, Point2, U2};
use crate::nalgebra_sparse::convert::serial::convert_csr_dense;
use crate::parameters::Parameters;
use crate::space::{BasisEvaluator, DofMap, TaylorHoodSpace};
use crate::system::SaddlePointSystem;
use crate::Real;
use eyre::{eyre, WrapErr};
use log::info;
use std::time::{Duration, Instant};

/// Iteration counts and final residual reported by a solver.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SolverStatistics {
    pub outer_iterations: usize,
    pub inner_displacement_iterations: usize,
    pub inner_schur_iterations: usize,
    pub residual_norm: f64,
}

/// Strategy for solving an assembled saddle point system.
///
/// Implementations may use `system_preconditioner` in any way they see fit. The solution is
/// written to `system.solution`, before constraints are distributed.
pub trait SaddlePointSolver<T: Real> {
    fn setup_preconditioner(&mut self, system: &SaddlePointSystem<T>) -> eyre::Result<()>;

    fn solve(&mut self, system: &mut SaddlePointSystem<T>) -> eyre::Result<SolverStatistics>;
}

/// Solves the system with a dense LU factorization of the system matrix.
///
/// Only suitable for small problems. The preconditioner is not used.
#[derive(Debug, Clone, Copy, Default)]
pub struct DenseDirectSolver;

impl<T: Real> SaddlePointSolver<T> for DenseDirectSolver {
    fn setup_preconditioner(&mut self, _system: &SaddlePointSystem<T>) -> eyre::Result<()> {
        Ok(())
    }

    fn solve(&mut self, system: &mut SaddlePointSystem<T>) -> eyre::Result<SolverStatistics> {
        let matrix = convert_csr_dense(system.system_matrix.as_csr());
        let rhs = system.system_rhs.as_vector();
        let solution = matrix
            .clone()
            .lu()
            .solve(rhs)
            .ok_or_else(|| eyre!("System matrix is singular"))?;
        let residual: DVector<T> = &matrix * &solution - rhs;
        system.solution.as_vector_mut().copy_from(&solution);
        Ok(SolverStatistics {
            outer_iterations: 1,
            residual_norm: try_convert(residual.norm()).unwrap_or(f64::NAN),
            ..SolverStatistics::default()
        })
    }
}

/// Runs closures as named phases and records their wall clock time.
#[derive(Debug, Clone, Default)]
pub struct PhaseTimer {
    phases: Vec<(String, Duration)>,
}

impl PhaseTimer {
    pub fn time<R>(&mut self, name: &str, phase: impl FnOnce() -> eyre::Result<R>) -> eyre::Result<R> {
        let start = Instant::now();
        let result = phase().wrap_err_with(|| format!("{name} failed"));
        let elapsed = start.elapsed();
        info!("{name}: {:.3} s", elapsed.as_secs_f64());
        self.phases.push((name.to_string(), elapsed));
        result
    }

    pub fn phases(&self) -> &[(String, Duration)] {
        &self.phases
    }
}

#[derive(Debug, Clone)]
pub struct RunSummary<T> {
    pub num_cells: usize,
    pub n_dofs: usize,
    pub dofs_per_block: Vec<usize>,
    pub n_constraints: usize,
    pub solver: SolverStatistics,
    pub errors: Option<MixedL2Errors<T>>,
    pub timings: Vec<(String, Duration)>,
}

/// Everything produced by a run of [`ElasticProblem`].
#[derive(Debug, Clone)]
pub struct ElasticSolution<T: Real> {
    pub space: TaylorHoodSpace<T>,
    pub constraints: ConstraintSet<T>,
    pub system: SaddlePointSystem<T>,
    pub first_cell: Option<CellContributions<T>>,
    pub summary: RunSummary<T>,
}

/// Mixed displacement-pressure problem on a rectangle with a solver strategy `S`.
pub struct ElasticProblem<'a, T: Real, S> {
    parameters: Parameters,
    solver: S,
    exact_solution: Option<&'a (dyn ExactSolution<T, U2> + Sync)>,
}

impl<'a, T: Real, S: SaddlePointSolver<T>> ElasticProblem<'a, T, S> {
    pub fn new(parameters: Parameters, solver: S) -> eyre::Result<Self> {
        parameters.validate()?;
        Ok(Self {
            parameters,
            solver,
            exact_solution: None,
        })
    }

    /// Computes $L^2$ errors against `exact` after solving.
    pub fn with_exact_solution(mut self, exact: &'a (dyn ExactSolution<T, U2> + Sync)) -> Self {
        self.exact_solution = Some(exact);
        self
    }

    pub fn parameters(&self) -> &Parameters {
        &self.parameters
    }

    pub fn solver(&self) -> &S {
        &self.solver
    }

    pub fn run(&mut self) -> eyre::Result<ElasticSolution<T>>
    where
        T: Send + Sync,
    {
        let params = &self.parameters;
        let mut timer = PhaseTimer::default();

        let mesh = timer.time("Create geometry", || {
            let geometry = &params.geometry;
            let (bottom_left, top_right) = (geometry.bottom_left::<T>(), geometry.top_right::<T>());
            let mut mesh = create_rectangular_quad_mesh(
                &bottom_left,
                &top_right,
                [geometry.x_divisions, geometry.y_divisions],
                geometry.refinements,
            );
            let ice_extent = convert(geometry.ice_extent);
            tag_rectangle_boundary(&mut mesh, &bottom_left, &top_right, ice_extent, &params.boundary_tags);
            info!("Number of active cells: {}", mesh.num_cells());
            Ok(mesh)
        })?;

        let (space, constraints, mut system) = timer.time("Setup dofs", || {
            let space = TaylorHoodSpace::new(mesh, params.quadrature_points)?;
            let mut constraints = ConstraintSet::new();
            let zero = |_: &Point2<T>, _: usize| T::zero();
            space.interpolate_boundary_values(params.no_slip, zero, &[true, true, false], &mut constraints)?;
            space.interpolate_boundary_values(params.v_slip, zero, &[true, false, false], &mut constraints)?;
            constraints.close()?;

            let pattern = constraints.make_sparsity_pattern(&space)?;
            let sizes = block_sizes(space.dofs_per_component(), params.n_blocks)?;
            info!(
                "Number of degrees of freedom: {} ({}), {} constrained",
                space.n_dofs(),
                sizes.iter().map(ToString::to_string).collect::<Vec<_>>().join("+"),
                constraints.n_constraints()
            );
            let system = SaddlePointSystem::new(BlockIndices::from_block_sizes(&sizes), pattern);
            Ok((space, constraints, system))
        })?;

        let coefficients = params.coefficients::<T>();
        let traction = params.traction::<T>(space.element_layout().displacement_components());
        let first_cell = timer.time("Assemble system", || {
            let mut assembler = SaddlePointAssembler::<T, U2>::new(space.element_layout(), params.form::<T>())?
                .with_first_cell_capture(params.print_matrices);
            if params.parallel_assembly {
                assembler.par_assemble_system(&space, &coefficients, &traction, &constraints, &mut system)?;
            } else {
                assembler.assemble_system(&space, &coefficients, &traction, &constraints, &mut system)?;
            }
            Ok(assembler.first_cell_contributions().cloned())
        })?;

        let solver = &mut self.solver;
        timer.time("Setup preconditioner", || solver.setup_preconditioner(&system))?;
        let statistics = timer.time("Solve", || solver.solve(&mut system))?;
        timer.time("Distribute constraints", || {
            constraints.distribute(system.solution.as_vector_mut())?;
            Ok(())
        })?;
        info!(
            "Solver iterations: system {} (displacement {}, Schur {}), residual {:e}",
            statistics.outer_iterations,
            statistics.inner_displacement_iterations,
            statistics.inner_schur_iterations,
            statistics.residual_norm
        );

        let errors = match self.exact_solution {
            Some(exact) => {
                let errors = timer.time("Compute errors", || {
                    compute_L2_errors(&space, system.solution.as_vector(), exact)
                })?;
                info!(
                    "Errors: ||e_u||_L2 = {:?}, ||e_p||_L2 = {:?}",
                    errors.displacement, errors.pressure
                );
                Some(errors)
            }
            None => None,
        };

        if params.print_matrices {
            timer.time("Print matrices", || {
                write_matlab_study(
                    &params.output_directory,
                    &system,
                    space.dof_handler(),
                    first_cell.as_ref(),
                    &params.matlab_script_name(),
                )
            })?;
        }

        let summary = RunSummary {
            num_cells: space.num_cells(),
            n_dofs: space.n_dofs(),
            dofs_per_block: system.block_indices().block_sizes(),
            n_constraints: constraints.n_constraints(),
            solver: statistics,
            errors,
            timings: timer.phases().to_vec(),
        };
        Ok(ElasticSolution {
            space,
            constraints,
            system,
            first_cell,
            summary,
        })
    }
}
