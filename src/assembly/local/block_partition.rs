use crate::element::MixedElementLayout;
use std::error::Error;
use std::fmt;

/// Split of the local dofs of a mixed element into a displacement block and a pressure block.
///
/// `order[k]` is the natural index of the dof at position `k` in block order. The displacement
/// dofs occupy positions `0 .. dim_u`, the pressure dofs positions `dim_u .. dim_u + dim_p`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockPartition {
    order: Vec<usize>,
    dim_u: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockPartitionError {
    /// The block sizes do not add up to the number of local dofs.
    SizeMismatch {
        dim_u: usize,
        dim_p: usize,
        dofs_per_cell: usize,
    },
    /// One of the two blocks is empty.
    EmptyBlock { dim_u: usize, dim_p: usize },
    /// The renumbering maps two dofs to the same position, or a dof out of range.
    NotABijection { local_dof: usize, position: usize },
}

impl fmt::Display for BlockPartitionError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::SizeMismatch {
                dim_u,
                dim_p,
                dofs_per_cell,
            } => write!(
                f,
                "Block sizes {dim_u} + {dim_p} do not match {dofs_per_cell} dofs per cell"
            ),
            Self::EmptyBlock { dim_u, dim_p } => {
                write!(f, "Both blocks must be non-empty (displacement: {dim_u}, pressure: {dim_p})")
            }
            Self::NotABijection { local_dof, position } => write!(
                f,
                "Block renumbering is not a bijection: dof {local_dof} maps to invalid or repeated position {position}"
            ),
        }
    }
}

impl Error for BlockPartitionError {}

impl BlockPartition {
    /// Builds the partition from the block renumbering `renumber[i]` (the block-order position
    /// of natural dof `i`) and the block sizes.
    pub fn from_renumbering(renumber: &[usize], dim_u: usize, dim_p: usize) -> Result<Self, BlockPartitionError> {
        let dofs_per_cell = renumber.len();
        if dim_u + dim_p != dofs_per_cell {
            return Err(BlockPartitionError::SizeMismatch {
                dim_u,
                dim_p,
                dofs_per_cell,
            });
        }
        if dim_u == 0 || dim_p == 0 {
            return Err(BlockPartitionError::EmptyBlock { dim_u, dim_p });
        }

        let mut order = vec![usize::MAX; dofs_per_cell];
        for (local_dof, &position) in renumber.iter().enumerate() {
            match order.get_mut(position) {
                Some(slot) if *slot == usize::MAX => *slot = local_dof,
                _ => return Err(BlockPartitionError::NotABijection { local_dof, position }),
            }
        }
        Ok(Self { order, dim_u })
    }

    /// Builds the partition of a mixed element, with all displacement components in the first block.
    pub fn from_layout(layout: &MixedElementLayout) -> Result<Self, BlockPartitionError> {
        let dim_u = (0..layout.dofs_per_cell())
            .filter(|&i| layout.is_displacement(i))
            .count();
        let dim_p = layout.dofs_per_cell() - dim_u;
        Self::from_renumbering(&layout.block_renumbering(), dim_u, dim_p)
    }

    pub fn dofs_per_cell(&self) -> usize {
        self.order.len()
    }

    pub fn dim_u(&self) -> usize {
        self.dim_u
    }

    pub fn dim_p(&self) -> usize {
        self.order.len() - self.dim_u
    }

    /// Natural index of the dof at each block-order position.
    pub fn order(&self) -> &[usize] {
        &self.order
    }

    /// Natural indices of the displacement dofs, in block order.
    pub fn displacement_indices(&self) -> &[usize] {
        &self.order[..self.dim_u]
    }

    /// Natural indices of the pressure dofs, in block order.
    pub fn pressure_indices(&self) -> &[usize] {
        &self.order[self.dim_u..]
    }
}
