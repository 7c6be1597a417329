use super::{create_system, empty_constraints, stokes_form, ICE};
use crate::unit_tests::{dense, two_cell_mesh, unit_square_mesh};
use elastic_saddle::assembly::global::SaddlePointAssembler;
use elastic_saddle::constraints::ConstraintSet;
use elastic_saddle::element::MixedElementLayout;
use elastic_saddle::materials::{CoefficientFunctions, MixedCoefficients, UniformTraction};
use elastic_saddle::nalgebra::{DMatrix, DVector, Point2, U2};
use elastic_saddle::space::{DofMap, TaylorHoodSpace};
use elastic_saddle::system::SaddlePointSystem;
use matrixcompare::assert_matrix_eq;

fn two_cell_space() -> TaylorHoodSpace<f64> {
    let mut mesh = two_cell_mesh();
    mesh.set_face_boundary_id(1, 2, Some(ICE));
    TaylorHoodSpace::new(mesh, 3).unwrap()
}

fn assembler() -> SaddlePointAssembler<f64, U2> {
    SaddlePointAssembler::new(&MixedElementLayout::taylor_hood_quad9_quad4(), stokes_form()).unwrap()
}

fn coefficients() -> MixedCoefficients<f64> {
    MixedCoefficients { mu: 1.3, beta: 0.2 }
}

fn load() -> UniformTraction<f64> {
    UniformTraction::vertical(2, -0.5)
}

/// Dense global matrices and vectors obtained by summing the local contributions of all cells.
struct ScatteredContributions {
    matrix: DMatrix<f64>,
    rhs: DVector<f64>,
    precond: DMatrix<f64>,
    body_force: DVector<f64>,
    load: DVector<f64>,
}

fn scatter_cells(space: &TaylorHoodSpace<f64>) -> ScatteredContributions {
    let n = space.n_dofs();
    let mut result = ScatteredContributions {
        matrix: DMatrix::zeros(n, n),
        rhs: DVector::zeros(n),
        precond: DMatrix::zeros(n, n),
        body_force: DVector::zeros(n),
        load: DVector::zeros(n),
    };
    let mut assembler = assembler();
    for cell in 0..space.num_cells() {
        let contributions = assembler
            .assemble_cell(space, &coefficients(), &load(), cell)
            .unwrap();
        let dofs = space.dof_handler().cell_dofs(cell);
        for (i, &row) in dofs.iter().enumerate() {
            for (j, &col) in dofs.iter().enumerate() {
                result.matrix[(row, col)] += contributions.cell_matrix()[(i, j)];
                result.precond[(row, col)] += contributions.cell_precond()[(i, j)];
            }
            result.rhs[row] += contributions.cell_rhs()[i];
            result.body_force[row] += contributions.cell_body_force()[i];
            result.load[row] += contributions.cell_load()[i];
        }
    }
    result
}

fn assemble(space: &TaylorHoodSpace<f64>, constraints: &ConstraintSet<f64>) -> SaddlePointSystem<f64> {
    let mut system = create_system(space, constraints);
    assembler()
        .assemble_system(space, &coefficients(), &load(), constraints, &mut system)
        .unwrap();
    system
}

#[test]
fn unconstrained_assembly_sums_cell_contributions() {
    let space = two_cell_space();
    assert_eq!(space.n_dofs(), 36);
    let system = assemble(&space, &empty_constraints());
    let expected = scatter_cells(&space);

    assert_matrix_eq!(dense(&system.system_matrix), expected.matrix, comp = abs, tol = 1e-13);
    assert_matrix_eq!(dense(&system.system_preconditioner), expected.precond, comp = abs, tol = 1e-13);
    assert_matrix_eq!(system.system_rhs.as_vector().clone(), expected.rhs, comp = abs, tol = 1e-13);
    assert_matrix_eq!(system.body_force.as_vector().clone(), expected.body_force, comp = abs, tol = 1e-13);
    assert_matrix_eq!(system.load.as_vector().clone(), expected.load, comp = abs, tol = 1e-13);
    assert!(system.precond_rhs.as_vector().iter().all(|&v| v == 0.0));

    // Total body force is weight * area along the vertical component
    let vertical = space.dofs_per_component()[0]..space.dofs_per_component()[0] + space.dofs_per_component()[1];
    let total: f64 = system.body_force.as_vector().rows_range(vertical).sum();
    assert!((total - (-2.0)).abs() <= 1e-12);
}

#[test]
fn dirichlet_constraint_in_both_global_systems() {
    let space = two_cell_space();
    let unconstrained = scatter_cells(&space);

    // Horizontal displacement at the bottom left corner
    let constrained_dof = space.dof_handler().cell_dofs(0)[0];
    let g = 0.7;
    let mut constraints = ConstraintSet::new();
    constraints.add_dirichlet(constrained_dof, g).unwrap();
    constraints.close().unwrap();
    let system = assemble(&space, &constraints);

    let n = space.n_dofs();
    let i = constrained_dof;
    let expected_system = |matrix: &DMatrix<f64>, rhs: &DVector<f64>| -> (DMatrix<f64>, DVector<f64>) {
        let mut matrix = matrix.clone();
        let mut rhs = rhs.clone();
        for r in 0..n {
            if r != i {
                rhs[r] -= matrix[(r, i)] * g;
                matrix[(r, i)] = 0.0;
                matrix[(i, r)] = 0.0;
            }
        }
        matrix[(i, i)] = 1.0;
        rhs[i] = g;
        (matrix, rhs)
    };

    let (matrix, rhs) = expected_system(&unconstrained.matrix, &unconstrained.rhs);
    assert_matrix_eq!(dense(&system.system_matrix), matrix, comp = abs, tol = 1e-13);
    assert_matrix_eq!(system.system_rhs.as_vector().clone(), rhs, comp = abs, tol = 1e-13);

    let (precond, precond_rhs) = expected_system(&unconstrained.precond, &DVector::zeros(n));
    assert_matrix_eq!(dense(&system.system_preconditioner), precond, comp = abs, tol = 1e-13);
    assert_matrix_eq!(system.precond_rhs.as_vector().clone(), precond_rhs, comp = abs, tol = 1e-13);

    let mut body_force = unconstrained.body_force.clone();
    body_force[i] = 0.0;
    assert_matrix_eq!(system.body_force.as_vector().clone(), body_force, comp = abs, tol = 1e-13);
}

#[test]
fn repeated_assembly_is_idempotent() {
    let space = two_cell_space();
    let constraints = {
        let mut constraints = ConstraintSet::new();
        constraints.add_dirichlet(0, 1.0).unwrap();
        constraints.close().unwrap();
        constraints
    };
    let mut system = create_system(&space, &constraints);
    let mut assembler = assembler();
    assembler
        .assemble_system(&space, &coefficients(), &load(), &constraints, &mut system)
        .unwrap();
    let first = system.clone();
    assembler
        .assemble_system(&space, &coefficients(), &load(), &constraints, &mut system)
        .unwrap();

    assert_eq!(system.system_matrix.as_csr().values(), first.system_matrix.as_csr().values());
    assert_eq!(
        system.system_preconditioner.as_csr().values(),
        first.system_preconditioner.as_csr().values()
    );
    assert_eq!(system.system_rhs.as_vector(), first.system_rhs.as_vector());
    assert_eq!(system.precond_rhs.as_vector(), first.precond_rhs.as_vector());
    assert_eq!(system.body_force.as_vector(), first.body_force.as_vector());
    assert_eq!(system.load.as_vector(), first.load.as_vector());
}

#[test]
fn parallel_assembly_matches_serial_assembly() {
    let mesh = elastic_saddle::mesh::procedural::create_rectangular_quad_mesh(
        &Point2::new(0.0, 0.0),
        &Point2::new(2.0, 1.0),
        [2, 1],
        2,
    );
    let space = TaylorHoodSpace::new(mesh, 3).unwrap();
    let constraints = {
        let mut constraints = ConstraintSet::new();
        for dof in space.dof_handler().cell_dofs(3).iter().take(6) {
            constraints.add_dirichlet(*dof, 0.25).unwrap();
        }
        constraints.close().unwrap();
        constraints
    };
    let coefficients = CoefficientFunctions {
        mu: |x: &Point2<f64>| 1.0 + x.x,
        beta: |x: &Point2<f64>| 0.1 * x.y,
    };

    let mut serial = create_system(&space, &constraints);
    assembler()
        .assemble_system(&space, &coefficients, &load(), &constraints, &mut serial)
        .unwrap();
    let mut parallel = create_system(&space, &constraints);
    assembler()
        .par_assemble_system(&space, &coefficients, &load(), &constraints, &mut parallel)
        .unwrap();

    assert_eq!(serial.system_matrix.as_csr().values(), parallel.system_matrix.as_csr().values());
    assert_eq!(
        serial.system_preconditioner.as_csr().values(),
        parallel.system_preconditioner.as_csr().values()
    );
    assert_eq!(serial.system_rhs.as_vector(), parallel.system_rhs.as_vector());
    assert_eq!(serial.precond_rhs.as_vector(), parallel.precond_rhs.as_vector());
    assert_eq!(serial.body_force.as_vector(), parallel.body_force.as_vector());
    assert_eq!(serial.load.as_vector(), parallel.load.as_vector());
}

#[test]
fn first_cell_contributions_are_captured_on_request() {
    let space = two_cell_space();
    let constraints = empty_constraints();
    let mut system = create_system(&space, &constraints);

    let mut assembler = assembler();
    assembler
        .assemble_system(&space, &coefficients(), &load(), &constraints, &mut system)
        .unwrap();
    assert!(assembler.first_cell_contributions().is_none());

    let mut assembler = assembler.with_first_cell_capture(true);
    assembler
        .assemble_system(&space, &coefficients(), &load(), &constraints, &mut system)
        .unwrap();
    let captured = assembler.first_cell_contributions().cloned().unwrap();
    let first_cell = assembler
        .assemble_cell(&space, &coefficients(), &load(), 0)
        .unwrap();
    assert_eq!(&captured, first_cell);

    assembler
        .par_assemble_system(&space, &coefficients(), &load(), &constraints, &mut system)
        .unwrap();
    assert_eq!(assembler.first_cell_contributions(), Some(&captured));
}

#[test]
fn mismatched_system_size_is_rejected() {
    let space = two_cell_space();
    let constraints = empty_constraints();
    let single_cell = TaylorHoodSpace::new(unit_square_mesh(), 3).unwrap();
    let mut system = create_system(&single_cell, &constraints);

    let mut assembler = assembler();
    assert!(assembler
        .assemble_system(&space, &coefficients(), &load(), &constraints, &mut system)
        .is_err());
    assert!(assembler
        .par_assemble_system(&space, &coefficients(), &load(), &constraints, &mut system)
        .is_err());
}

#[test]
fn unclosed_constraints_are_reported() {
    let space = two_cell_space();
    let mut system = create_system(&space, &empty_constraints());
    let open = ConstraintSet::new();
    assert!(assembler()
        .assemble_system(&space, &coefficients(), &load(), &open, &mut system)
        .is_err());
}
