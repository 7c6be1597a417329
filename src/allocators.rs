//! Helper traits for allocator trait bounds.
use nalgebra::allocator::Allocator;
use nalgebra::{DimName, Scalar};

/// Allocator for points, vectors and square matrices of dimension `D`.
pub trait DimAllocator<T: Scalar, D: DimName>: Allocator<T, D> + Allocator<T, D, D> {}

impl<T, D, X> DimAllocator<T, D> for X
where
    T: Scalar,
    D: DimName,
    X: Allocator<T, D> + Allocator<T, D, D>,
{
}
