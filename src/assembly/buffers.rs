//! Buffers holding basis function data of a single cell or face.
use crate::allocators::DimAllocator;
use crate::nalgebra::{DefaultAllocator, OMatrix, OPoint, OVector, Scalar};
use crate::{Real, SmallDim};

/// Values and gradients of the basis functions of a mixed element at the quadrature points of a cell.
///
/// Displacement basis functions are vector-valued, pressure basis functions scalar-valued.
/// A basis function belonging to a displacement component has zero pressure value and vice versa.
/// Gradients follow the convention `grad[(c, d)] = d phi_c / d x_d`.
#[derive(Debug, Clone)]
pub struct CellValues<T, D>
where
    T: Scalar,
    D: SmallDim,
    DefaultAllocator: DimAllocator<T, D>,
{
    dofs_per_cell: usize,
    points: Vec<OPoint<T, D>>,
    jxw: Vec<T>,
    // Basis data is stored point-major, i.e. at index `q * dofs_per_cell + i`
    displacement_values: Vec<OVector<T, D>>,
    displacement_gradients: Vec<OMatrix<T, D, D>>,
    pressure_values: Vec<T>,
}

impl<T, D> Default for CellValues<T, D>
where
    T: Real,
    D: SmallDim,
    DefaultAllocator: DimAllocator<T, D>,
{
    fn default() -> Self {
        Self {
            dofs_per_cell: 0,
            points: Vec::new(),
            jxw: Vec::new(),
            displacement_values: Vec::new(),
            displacement_gradients: Vec::new(),
            pressure_values: Vec::new(),
        }
    }
}

impl<T, D> CellValues<T, D>
where
    T: Real,
    D: SmallDim,
    DefaultAllocator: DimAllocator<T, D>,
{
    /// Resizes the buffer and sets all data to zero.
    pub fn reinit(&mut self, dofs_per_cell: usize, n_quadrature_points: usize) {
        let n = dofs_per_cell * n_quadrature_points;
        self.dofs_per_cell = dofs_per_cell;
        self.points.clear();
        self.points.resize(n_quadrature_points, OPoint::origin());
        self.jxw.clear();
        self.jxw.resize(n_quadrature_points, T::zero());
        self.displacement_values.clear();
        self.displacement_values.resize(n, OVector::<T, D>::zeros());
        self.displacement_gradients.clear();
        self.displacement_gradients.resize(n, OMatrix::<T, D, D>::zeros());
        self.pressure_values.clear();
        self.pressure_values.resize(n, T::zero());
    }

    pub fn dofs_per_cell(&self) -> usize {
        self.dofs_per_cell
    }

    pub fn n_quadrature_points(&self) -> usize {
        self.points.len()
    }

    /// Physical coordinates of the quadrature points.
    pub fn points(&self) -> &[OPoint<T, D>] {
        &self.points
    }

    /// Quadrature weight times the Jacobian determinant at point `q`.
    pub fn jxw(&self, q: usize) -> T {
        self.jxw[q]
    }

    pub fn set_quadrature_point(&mut self, q: usize, point: OPoint<T, D>, jxw: T) {
        self.points[q] = point;
        self.jxw[q] = jxw;
    }

    pub fn set_displacement_basis(&mut self, i: usize, q: usize, value: OVector<T, D>, gradient: OMatrix<T, D, D>) {
        let idx = self.index(i, q);
        self.displacement_values[idx] = value;
        self.displacement_gradients[idx] = gradient;
    }

    pub fn set_pressure_basis(&mut self, i: usize, q: usize, value: T) {
        let idx = self.index(i, q);
        self.pressure_values[idx] = value;
    }

    pub fn displacement_value(&self, i: usize, q: usize) -> &OVector<T, D> {
        &self.displacement_values[self.index(i, q)]
    }

    pub fn displacement_gradient(&self, i: usize, q: usize) -> &OMatrix<T, D, D> {
        &self.displacement_gradients[self.index(i, q)]
    }

    pub fn displacement_symmetric_gradient(&self, i: usize, q: usize) -> OMatrix<T, D, D> {
        self.displacement_gradient(i, q).symmetric_part()
    }

    pub fn displacement_divergence(&self, i: usize, q: usize) -> T {
        self.displacement_gradient(i, q).trace()
    }

    pub fn pressure_value(&self, i: usize, q: usize) -> T {
        self.pressure_values[self.index(i, q)]
    }

    fn index(&self, i: usize, q: usize) -> usize {
        debug_assert!(i < self.dofs_per_cell);
        q * self.dofs_per_cell + i
    }
}

/// Values of the basis functions of a mixed element at the quadrature points of a face.
///
/// The shape value of basis function `i` is the value of its single nonzero component.
#[derive(Debug, Clone)]
pub struct FaceValues<T, D>
where
    T: Scalar,
    D: SmallDim,
    DefaultAllocator: DimAllocator<T, D>,
{
    dofs_per_cell: usize,
    points: Vec<OPoint<T, D>>,
    jxw: Vec<T>,
    normals: Vec<OVector<T, D>>,
    shape_values: Vec<T>,
}

impl<T, D> Default for FaceValues<T, D>
where
    T: Real,
    D: SmallDim,
    DefaultAllocator: DimAllocator<T, D>,
{
    fn default() -> Self {
        Self {
            dofs_per_cell: 0,
            points: Vec::new(),
            jxw: Vec::new(),
            normals: Vec::new(),
            shape_values: Vec::new(),
        }
    }
}

impl<T, D> FaceValues<T, D>
where
    T: Real,
    D: SmallDim,
    DefaultAllocator: DimAllocator<T, D>,
{
    /// Resizes the buffer and sets all data to zero.
    pub fn reinit(&mut self, dofs_per_cell: usize, n_quadrature_points: usize) {
        self.dofs_per_cell = dofs_per_cell;
        self.points.clear();
        self.points.resize(n_quadrature_points, OPoint::origin());
        self.jxw.clear();
        self.jxw.resize(n_quadrature_points, T::zero());
        self.normals.clear();
        self.normals.resize(n_quadrature_points, OVector::<T, D>::zeros());
        self.shape_values.clear();
        self.shape_values
            .resize(dofs_per_cell * n_quadrature_points, T::zero());
    }

    pub fn dofs_per_cell(&self) -> usize {
        self.dofs_per_cell
    }

    pub fn n_quadrature_points(&self) -> usize {
        self.points.len()
    }

    pub fn points(&self) -> &[OPoint<T, D>] {
        &self.points
    }

    pub fn jxw(&self, q: usize) -> T {
        self.jxw[q]
    }

    /// Outward unit normal at point `q`.
    pub fn normal(&self, q: usize) -> &OVector<T, D> {
        &self.normals[q]
    }

    pub fn set_quadrature_point(&mut self, q: usize, point: OPoint<T, D>, jxw: T, normal: OVector<T, D>) {
        self.points[q] = point;
        self.jxw[q] = jxw;
        self.normals[q] = normal;
    }

    pub fn set_shape_value(&mut self, i: usize, q: usize, value: T) {
        self.shape_values[q * self.dofs_per_cell + i] = value;
    }

    pub fn shape_value(&self, i: usize, q: usize) -> T {
        self.shape_values[q * self.dofs_per_cell + i]
    }
}
