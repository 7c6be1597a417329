//! Per-cell computations: the mixed bilinear form, its load and the local Schur complement.
mod block_partition;
mod saddle_point;
mod schur;

pub use block_partition::*;
pub use saddle_point::*;
pub use schur::*;
