use crate::allocators::DimAllocator;
use crate::assembly::buffers::{CellValues, FaceValues};
use crate::element::MixedElementLayout;
use crate::materials::BoundaryLoad;
use crate::nalgebra::{DMatrix, DVector, DefaultAllocator, OMatrix, OVector, Scalar};
use crate::{BoundaryId, Real, SmallDim};
use itertools::izip;

/// Scalar parameters of the mixed bilinear form and its load.
///
/// `adv_enabled` and `div_enabled` multiply the advection-like and divergence-like terms and are
/// expected to be either zero or one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SaddlePointForm<T> {
    /// Magnitude of the body force acting along the last axis.
    pub weight: T,
    /// Scale of the advection-like and divergence-like terms.
    pub scale: T,
    pub adv_enabled: T,
    pub div_enabled: T,
    /// Faces with this identifier receive the surface load.
    pub surface_load_boundary: BoundaryId,
}

/// Local matrices and vectors produced for a single cell.
#[derive(Debug, Clone, PartialEq)]
pub struct CellContributions<T: Scalar> {
    cell_matrix: DMatrix<T>,
    cell_rhs: DVector<T>,
    cell_precond: DMatrix<T>,
    cell_pre_rhs: DVector<T>,
    cell_body_force: DVector<T>,
    cell_load: DVector<T>,
}

impl<T: Real> CellContributions<T> {
    pub fn zeros(dofs_per_cell: usize) -> Self {
        Self {
            cell_matrix: DMatrix::zeros(dofs_per_cell, dofs_per_cell),
            cell_rhs: DVector::zeros(dofs_per_cell),
            cell_precond: DMatrix::zeros(dofs_per_cell, dofs_per_cell),
            cell_pre_rhs: DVector::zeros(dofs_per_cell),
            cell_body_force: DVector::zeros(dofs_per_cell),
            cell_load: DVector::zeros(dofs_per_cell),
        }
    }

    /// Resizes all buffers to `dofs_per_cell` and sets every entry to zero.
    pub fn clear(&mut self, dofs_per_cell: usize) {
        let n = dofs_per_cell;
        self.cell_matrix.resize_mut(n, n, T::zero());
        self.cell_precond.resize_mut(n, n, T::zero());
        self.cell_rhs.resize_vertically_mut(n, T::zero());
        self.cell_pre_rhs.resize_vertically_mut(n, T::zero());
        self.cell_body_force.resize_vertically_mut(n, T::zero());
        self.cell_load.resize_vertically_mut(n, T::zero());
        self.cell_matrix.fill(T::zero());
        self.cell_precond.fill(T::zero());
        self.cell_rhs.fill(T::zero());
        self.cell_pre_rhs.fill(T::zero());
        self.cell_body_force.fill(T::zero());
        self.cell_load.fill(T::zero());
    }

    pub fn dofs_per_cell(&self) -> usize {
        self.cell_rhs.len()
    }

    pub fn cell_matrix(&self) -> &DMatrix<T> {
        &self.cell_matrix
    }

    pub fn cell_rhs(&self) -> &DVector<T> {
        &self.cell_rhs
    }

    pub fn cell_precond(&self) -> &DMatrix<T> {
        &self.cell_precond
    }

    /// Right-hand side paired with the preconditioner. Always zero.
    pub fn cell_pre_rhs(&self) -> &DVector<T> {
        &self.cell_pre_rhs
    }

    /// Volume part of the right-hand side.
    pub fn cell_body_force(&self) -> &DVector<T> {
        &self.cell_body_force
    }

    /// Surface part of the right-hand side.
    pub fn cell_load(&self) -> &DVector<T> {
        &self.cell_load
    }

    pub(crate) fn cell_precond_mut(&mut self) -> &mut DMatrix<T> {
        &mut self.cell_precond
    }

    /// Sets the right-hand side to the sum of its volume and surface parts.
    pub fn finalize_rhs(&mut self) {
        self.cell_rhs.copy_from(&self.cell_body_force);
        self.cell_rhs += &self.cell_load;
    }
}

/// Basis quantities of all dofs at a single quadrature point.
#[derive(Debug, Clone)]
pub struct QuadraturePointBasis<T, D>
where
    T: Scalar,
    D: SmallDim,
    DefaultAllocator: DimAllocator<T, D>,
{
    phi_u: Vec<OVector<T, D>>,
    symgrad_phi_u: Vec<OMatrix<T, D, D>>,
    // grad(phi_u) * e
    grad_phi_u_e: Vec<OVector<T, D>>,
    div_phi_u: Vec<T>,
    phi_p: Vec<T>,
}

impl<T, D> Default for QuadraturePointBasis<T, D>
where
    T: Real,
    D: SmallDim,
    DefaultAllocator: DimAllocator<T, D>,
{
    fn default() -> Self {
        Self {
            phi_u: Vec::new(),
            symgrad_phi_u: Vec::new(),
            grad_phi_u_e: Vec::new(),
            div_phi_u: Vec::new(),
            phi_p: Vec::new(),
        }
    }
}

impl<T, D> QuadraturePointBasis<T, D>
where
    T: Real,
    D: SmallDim,
    DefaultAllocator: DimAllocator<T, D>,
{
    fn populate(&mut self, values: &CellValues<T, D>, q: usize, e: &OVector<T, D>) {
        let n = values.dofs_per_cell();
        self.phi_u.clear();
        self.symgrad_phi_u.clear();
        self.grad_phi_u_e.clear();
        self.div_phi_u.clear();
        self.phi_p.clear();
        for k in 0..n {
            let gradient = values.displacement_gradient(k, q);
            self.phi_u.push(values.displacement_value(k, q).clone());
            self.symgrad_phi_u.push(values.displacement_symmetric_gradient(k, q));
            self.grad_phi_u_e.push(gradient * e);
            self.div_phi_u.push(values.displacement_divergence(k, q));
            self.phi_p.push(values.pressure_value(k, q));
        }
    }
}

/// Unit vector along the last spatial axis.
pub fn vertical_unit_vector<T, D>() -> OVector<T, D>
where
    T: Real,
    D: SmallDim,
    DefaultAllocator: DimAllocator<T, D>,
{
    let mut e = OVector::<T, D>::zeros();
    e[D::dim() - 1] = T::one();
    e
}

/// Accumulates the cell integrals of the mixed bilinear form, the preconditioner seed and the
/// body force.
///
/// For basis functions `i`, `j` at each quadrature point:
///
/// ```text
/// cell_matrix(i, j)   += ( 2 mu (eps(u_i) : eps(u_j))
///                        - adv_enabled scale ((grad u_j) e) . u_i
///                        + div_enabled scale div(u_j) (u_i . e)
///                        + mu div(u_i) p_j + mu p_i div(u_j)
///                        - beta p_i p_j ) JxW
/// cell_precond(i, j)  += mu p_i div(u_j) JxW
/// cell_body_force(i)  += (u_i . e) weight JxW
/// ```
///
/// `mu` and `beta` hold the coefficient values at the quadrature points.
pub fn assemble_cell_saddle_point_form<T, D>(
    output: &mut CellContributions<T>,
    basis: &mut QuadraturePointBasis<T, D>,
    values: &CellValues<T, D>,
    mu: &[T],
    beta: &[T],
    form: &SaddlePointForm<T>,
) where
    T: Real,
    D: SmallDim,
    DefaultAllocator: DimAllocator<T, D>,
{
    let n = values.dofs_per_cell();
    assert_eq!(output.dofs_per_cell(), n, "Output buffers must match the number of dofs");
    assert_eq!(mu.len(), values.n_quadrature_points());
    assert_eq!(beta.len(), values.n_quadrature_points());

    let two = T::one() + T::one();
    let e = vertical_unit_vector::<T, D>();
    let advection = form.adv_enabled * form.scale;
    let divergence = form.div_enabled * form.scale;

    for (q, &mu_q, &beta_q) in izip!(0..values.n_quadrature_points(), mu, beta) {
        basis.populate(values, q, &e);
        let jxw = values.jxw(q);
        let QuadraturePointBasis {
            phi_u,
            symgrad_phi_u,
            grad_phi_u_e,
            div_phi_u,
            phi_p,
        } = &*basis;

        for i in 0..n {
            let u_i_e = phi_u[i].dot(&e);
            for j in 0..n {
                let value = two * mu_q * symgrad_phi_u[i].dot(&symgrad_phi_u[j])
                    - advection * grad_phi_u_e[j].dot(&phi_u[i])
                    + divergence * div_phi_u[j] * u_i_e
                    + mu_q * div_phi_u[i] * phi_p[j]
                    + mu_q * phi_p[i] * div_phi_u[j]
                    - beta_q * phi_p[i] * phi_p[j];
                output.cell_matrix[(i, j)] += value * jxw;
                output.cell_precond[(i, j)] += phi_p[i] * div_phi_u[j] * mu_q * jxw;
            }
            output.cell_body_force[i] += u_i_e * form.weight * jxw;
        }
    }
}

/// Accumulates the surface load of a single face.
///
/// `cell_load(i) += shape_value(i, q) g_c(x_q) JxW` where `c` is the component of dof `i` and `g`
/// the boundary load.
pub fn assemble_cell_surface_load<T, D, Load>(
    output: &mut CellContributions<T>,
    layout: &MixedElementLayout,
    values: &FaceValues<T, D>,
    load: &Load,
) where
    T: Real,
    D: SmallDim,
    DefaultAllocator: DimAllocator<T, D>,
    Load: ?Sized + BoundaryLoad<T, D>,
{
    let n = values.dofs_per_cell();
    assert_eq!(output.dofs_per_cell(), n, "Output buffers must match the number of dofs");
    for (q, point) in values.points().iter().enumerate() {
        let jxw = values.jxw(q);
        for i in 0..n {
            let component = layout.component(i);
            output.cell_load[i] += values.shape_value(i, q) * load.component_value(point, component) * jxw;
        }
    }
}
