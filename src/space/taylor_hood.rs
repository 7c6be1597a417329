use crate::assembly::buffers::{CellValues, FaceValues};
use crate::constraints::{ConstraintError, ConstraintSet};
use crate::dofs::DofHandler;
use crate::element::{
    reference_face_endpoints, MixedElementLayout, Quad4Basis, Quad9Basis, ReferenceQuadrilateralBasis,
};
use crate::mesh::QuadMesh2d;
use crate::nalgebra::{Matrix2, Point2, Vector2, U2};
use crate::quadrature::tensor::quadrilateral_gauss;
use crate::quadrature::univariate::gauss;
use crate::quadrature::{QuadraturePair1d, QuadraturePair2d};
use crate::space::{BasisEvaluator, CellTopology, DofMap};
use crate::{BoundaryId, Real};
use eyre::eyre;

/// Taylor-Hood space on a quadrilateral mesh: biquadratic displacement, bilinear pressure.
///
/// Cell integrals use a tensor Gauss rule and face integrals a Gauss rule, both with
/// `quadrature_points` points per direction.
#[derive(Debug, Clone)]
pub struct TaylorHoodSpace<T: Real> {
    mesh: QuadMesh2d<T>,
    layout: MixedElementLayout,
    dofs: DofHandler<T>,
    cell_quadrature: QuadraturePair2d<T>,
    face_quadrature: QuadraturePair1d<T>,
}

impl<T: Real> TaylorHoodSpace<T> {
    pub fn new(mesh: QuadMesh2d<T>, quadrature_points: usize) -> eyre::Result<Self> {
        if quadrature_points == 0 {
            return Err(eyre!("At least one quadrature point per direction is required"));
        }
        let layout = MixedElementLayout::taylor_hood_quad9_quad4();
        let dofs = DofHandler::distribute(&mesh, &layout)?;
        Ok(Self {
            mesh,
            layout,
            dofs,
            cell_quadrature: quadrilateral_gauss(quadrature_points),
            face_quadrature: gauss(quadrature_points),
        })
    }

    pub fn mesh(&self) -> &QuadMesh2d<T> {
        &self.mesh
    }

    pub fn dof_handler(&self) -> &DofHandler<T> {
        &self.dofs
    }

    /// Constrains the dofs of the selected components on faces with the given boundary identifier.
    ///
    /// The constrained value of each dof is `function(support_point, component)`.
    pub fn interpolate_boundary_values<F>(
        &self,
        boundary_id: BoundaryId,
        function: F,
        component_mask: &[bool],
        constraints: &mut ConstraintSet<T>,
    ) -> Result<(), ConstraintError>
    where
        F: Fn(&Point2<T>, usize) -> T,
    {
        let boundary_dofs = self
            .dofs
            .boundary_dofs(&self.mesh, &self.layout, boundary_id, component_mask);
        for dof in boundary_dofs {
            let value = function(self.dofs.support_point(dof), self.dofs.dof_component(dof));
            constraints.add_dirichlet(dof, value)?;
        }
        Ok(())
    }

    fn inverse_transposed_jacobian(&self, cell: usize, jacobian: &Matrix2<T>) -> eyre::Result<Matrix2<T>> {
        let det = jacobian.determinant();
        if det <= T::zero() {
            return Err(eyre!("Degenerate or inverted cell {cell}: Jacobian determinant {det:?}"));
        }
        let inverse = jacobian
            .try_inverse()
            .ok_or_else(|| eyre!("Singular Jacobian encountered on cell {cell}"))?;
        Ok(inverse.transpose())
    }
}

impl<T: Real> CellTopology<T> for TaylorHoodSpace<T> {
    fn cell_diameter(&self, cell: usize) -> T {
        self.mesh.cell_geometry(cell).diameter()
    }

    fn num_faces(&self, _cell: usize) -> usize {
        4
    }

    fn face_boundary_id(&self, cell: usize, face: usize) -> Option<BoundaryId> {
        self.mesh.face_boundary_id(cell, face)
    }
}

impl<T: Real> DofMap for TaylorHoodSpace<T> {
    fn num_cells(&self) -> usize {
        self.mesh.num_cells()
    }

    fn n_dofs(&self) -> usize {
        self.dofs.n_dofs()
    }

    fn dofs_per_cell(&self) -> usize {
        self.layout.dofs_per_cell()
    }

    fn dofs_per_component(&self) -> &[usize] {
        self.dofs.dofs_per_component()
    }

    fn populate_cell_dofs(&self, cell: usize, output: &mut [usize]) {
        output.copy_from_slice(self.dofs.cell_dofs(cell));
    }
}

impl<T: Real> BasisEvaluator<T, U2> for TaylorHoodSpace<T> {
    fn element_layout(&self) -> &MixedElementLayout {
        &self.layout
    }

    fn populate_cell_values(&self, cell: usize, values: &mut CellValues<T, U2>) -> eyre::Result<()> {
        let geometry = self.mesh.cell_geometry(cell);
        let (weights, points) = &self.cell_quadrature;
        values.reinit(self.layout.dofs_per_cell(), weights.len());

        let mut q2_values = [T::zero(); 9];
        let mut q2_gradients = [Vector2::zeros(); 9];
        let mut q1_values = [T::zero(); 4];

        for (q, (w, xi)) in weights.iter().zip(points).enumerate() {
            let jacobian = geometry.reference_jacobian(xi);
            let j_inv_t = self.inverse_transposed_jacobian(cell, &jacobian)?;
            let jxw = *w * jacobian.determinant();
            values.set_quadrature_point(q, geometry.map_reference_coords(xi), jxw);

            Quad9Basis.populate_basis(&mut q2_values, xi);
            Quad9Basis.populate_basis_gradients(&mut q2_gradients, xi);
            Quad4Basis.populate_basis(&mut q1_values, xi);
            for gradient in &mut q2_gradients {
                *gradient = j_inv_t * *gradient;
            }

            for i in 0..self.layout.dofs_per_cell() {
                let (component, base_index) = self.layout.system_to_component_index(i);
                if self.layout.is_displacement(i) {
                    let mut value = Vector2::zeros();
                    value[component] = q2_values[base_index];
                    let mut gradient = Matrix2::zeros();
                    gradient.set_row(component, &q2_gradients[base_index].transpose());
                    values.set_displacement_basis(i, q, value, gradient);
                } else {
                    values.set_pressure_basis(i, q, q1_values[base_index]);
                }
            }
        }
        Ok(())
    }

    fn populate_face_values(&self, cell: usize, face: usize, values: &mut FaceValues<T, U2>) -> eyre::Result<()> {
        let geometry = self.mesh.cell_geometry(cell);
        let (a, b) = reference_face_endpoints::<T>(face);
        let half = T::one() / (T::one() + T::one());
        let reference_midpoint = nalgebra::center(&a, &b);
        let reference_tangent = (b - a) * half;

        let (weights, points) = &self.face_quadrature;
        values.reinit(self.layout.dofs_per_cell(), weights.len());

        let mut q2_values = [T::zero(); 9];
        let mut q1_values = [T::zero(); 4];
        for (q, (w, t)) in weights.iter().zip(points).enumerate() {
            let xi = reference_midpoint + reference_tangent * t[0];
            let tangent = geometry.reference_jacobian(&xi) * reference_tangent;
            let length = tangent.norm();
            if length <= T::zero() {
                return Err(eyre!("Degenerate face {face} on cell {cell}"));
            }
            // Faces are traversed counter-clockwise, so the outward normal is the tangent rotated clockwise
            let normal = Vector2::new(tangent.y, -tangent.x) / length;
            values.set_quadrature_point(q, geometry.map_reference_coords(&xi), *w * length, normal);

            Quad9Basis.populate_basis(&mut q2_values, &xi);
            Quad4Basis.populate_basis(&mut q1_values, &xi);
            for i in 0..self.layout.dofs_per_cell() {
                let (_, base_index) = self.layout.system_to_component_index(i);
                let value = if self.layout.is_displacement(i) {
                    q2_values[base_index]
                } else {
                    q1_values[base_index]
                };
                values.set_shape_value(i, q, value);
            }
        }
        Ok(())
    }
}
