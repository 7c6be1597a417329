//! Material coefficients and boundary loads of the mixed formulation.
use crate::allocators::DimAllocator;
use crate::nalgebra::{DefaultAllocator, OPoint, RealField, Scalar};
use crate::{Real, SmallDim};
use numeric_literals::replace_float_literals;
use serde::{Deserialize, Serialize};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LameParameters<T> {
    pub mu: T,
    pub lambda: T,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct YoungPoisson<T> {
    pub young: T,
    pub poisson: T,
}

impl<T> From<YoungPoisson<T>> for LameParameters<T>
where
    T: RealField,
{
    #[replace_float_literals(T::from_f64(literal).expect("literal must fit in T"))]
    fn from(params: YoungPoisson<T>) -> Self {
        let YoungPoisson { young, poisson } = params;
        let mu = 0.5 * young / (1.0 + poisson.clone());
        let lambda = 2.0 * mu.clone() * poisson.clone() / (1.0 - 2.0 * poisson);
        Self { mu, lambda }
    }
}

/// Coefficients of the mixed displacement-pressure formulation at a point.
///
/// The pressure is scaled so that `p = mu div(u) / beta`. Eliminating it recovers the
/// volumetric term of linear elasticity when `beta = mu^2 / lambda`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MixedCoefficients<T> {
    pub mu: T,
    pub beta: T,
}

impl<T> From<YoungPoisson<T>> for MixedCoefficients<T>
where
    T: RealField,
{
    /// Converts Young's modulus and Poisson's ratio.
    ///
    /// `beta = mu (1 - 2 nu) / (2 nu)`, which equals `mu^2 / lambda` and vanishes in the
    /// incompressible limit `nu = 1/2`.
    #[replace_float_literals(T::from_f64(literal).expect("literal must fit in T"))]
    fn from(params: YoungPoisson<T>) -> Self {
        let poisson = params.poisson.clone();
        let LameParameters { mu, .. } = LameParameters::from(params);
        let beta = mu.clone() * (1.0 - 2.0 * poisson.clone()) / (2.0 * poisson);
        Self { mu, beta }
    }
}

/// Provides the coefficients `mu` and `beta` at batches of points.
pub trait MaterialCoefficients<T, D>
where
    T: Scalar,
    D: SmallDim,
    DefaultAllocator: DimAllocator<T, D>,
{
    fn mu_value_list(&self, points: &[OPoint<T, D>], values: &mut [T]);

    fn beta_value_list(&self, points: &[OPoint<T, D>], values: &mut [T]);
}

/// Spatially constant coefficients.
impl<T, D> MaterialCoefficients<T, D> for MixedCoefficients<T>
where
    T: Real,
    D: SmallDim,
    DefaultAllocator: DimAllocator<T, D>,
{
    fn mu_value_list(&self, points: &[OPoint<T, D>], values: &mut [T]) {
        assert_eq!(points.len(), values.len());
        values.fill(self.mu);
    }

    fn beta_value_list(&self, points: &[OPoint<T, D>], values: &mut [T]) {
        assert_eq!(points.len(), values.len());
        values.fill(self.beta);
    }
}

/// Coefficients given by functions of position.
#[derive(Debug, Clone)]
pub struct CoefficientFunctions<Mu, Beta> {
    pub mu: Mu,
    pub beta: Beta,
}

impl<T, D, Mu, Beta> MaterialCoefficients<T, D> for CoefficientFunctions<Mu, Beta>
where
    T: Real,
    D: SmallDim,
    DefaultAllocator: DimAllocator<T, D>,
    Mu: Fn(&OPoint<T, D>) -> T,
    Beta: Fn(&OPoint<T, D>) -> T,
{
    fn mu_value_list(&self, points: &[OPoint<T, D>], values: &mut [T]) {
        assert_eq!(points.len(), values.len());
        for (value, point) in values.iter_mut().zip(points) {
            *value = (self.mu)(point);
        }
    }

    fn beta_value_list(&self, points: &[OPoint<T, D>], values: &mut [T]) {
        assert_eq!(points.len(), values.len());
        for (value, point) in values.iter_mut().zip(points) {
            *value = (self.beta)(point);
        }
    }
}

/// Vector-valued boundary function applied on surface-load faces.
///
/// Components are those of the mixed element, i.e. displacement components followed by the
/// pressure component.
pub trait BoundaryLoad<T, D>
where
    T: Scalar,
    D: SmallDim,
    DefaultAllocator: DimAllocator<T, D>,
{
    fn component_value(&self, point: &OPoint<T, D>, component: usize) -> T;
}

/// A boundary load with the same value everywhere.
#[derive(Debug, Clone, PartialEq)]
pub struct UniformTraction<T> {
    values: Vec<T>,
}

impl<T: Real> UniformTraction<T> {
    pub fn new(values: Vec<T>) -> Self {
        Self { values }
    }

    /// A load acting along the last spatial axis with the given magnitude.
    pub fn vertical(displacement_components: usize, magnitude: T) -> Self {
        let mut values = vec![T::zero(); displacement_components + 1];
        values[displacement_components - 1] = magnitude;
        Self { values }
    }

    pub fn zero(n_components: usize) -> Self {
        Self {
            values: vec![T::zero(); n_components],
        }
    }

    pub fn values(&self) -> &[T] {
        &self.values
    }
}

impl<T, D> BoundaryLoad<T, D> for UniformTraction<T>
where
    T: Real,
    D: SmallDim,
    DefaultAllocator: DimAllocator<T, D>,
{
    fn component_value(&self, _point: &OPoint<T, D>, component: usize) -> T {
        self.values[component]
    }
}
