//! Assembly of mixed displacement-pressure finite element systems for Stokes-type and
//! nearly incompressible linear elasticity problems.
//!
//! Every cell contributes to a global saddle point system and to a block preconditioner whose
//! pressure block is built from element-local, regularized Schur complements.
use nalgebra::{DimMin, DimName, RealField};

pub mod allocators;
pub mod assembly;
pub mod block;
pub mod constraints;
pub mod dofs;
pub mod element;
pub mod error;
pub mod io;
pub mod materials;
pub mod mesh;
pub mod parameters;
pub mod problem;
pub mod quadrature;
pub mod reorder;
pub mod space;
pub mod system;
pub mod util;

pub extern crate nalgebra;
pub extern crate nalgebra_sparse;

/// Scalar type used throughout the crate.
pub trait Real: RealField + Copy {}

impl<T> Real for T where T: RealField + Copy {}

/// A small, fixed-size dimension.
///
/// Used as a trait alias for various traits frequently needed by generic routines.
pub trait SmallDim: DimName + DimMin<Self, Output = Self> {}

impl<D> SmallDim for D where D: DimName + DimMin<Self, Output = Self> {}

/// Identifier attached to boundary faces of a mesh.
pub type BoundaryId = u32;
