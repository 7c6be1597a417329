//! Distribution and numbering of the degrees of freedom of the Taylor-Hood space.
use crate::element::MixedElementLayout;
use crate::mesh::{sorted_edge, QuadMesh2d};
use crate::nalgebra::{Point2, Scalar};
use crate::reorder::{cuthill_mckee, Permutation};
use crate::util::sparsity_pattern_from_rows;
use crate::{BoundaryId, Real};
use eyre::eyre;
use log::debug;
use nalgebra_sparse::pattern::SparsityPattern;
use rustc_hash::FxHashMap;
use std::collections::BTreeSet;
use std::error::Error;
use std::fmt;

/// Number of nodes of the biquadratic element.
const QUAD9_NODES: usize = 9;

/// Global degrees of freedom of a biquadratic-displacement, bilinear-pressure space on a
/// quadrilateral mesh.
///
/// Dofs are first numbered by Cuthill-McKee on the cell coupling graph and then sorted
/// component-wise (stable with respect to the Cuthill-McKee order), so that each vector
/// component occupies a contiguous index range.
#[derive(Debug, Clone)]
pub struct DofHandler<T: Scalar> {
    dofs_per_cell: usize,
    cell_dofs: Vec<usize>,
    dof_components: Vec<usize>,
    support_points: Vec<Point2<T>>,
    dofs_per_component: Vec<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockStructureError {
    pub n_blocks: usize,
    pub n_components: usize,
}

impl fmt::Display for BlockStructureError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "Unsupported number of blocks {} for an element with {} components (expected 2 or {})",
            self.n_blocks, self.n_components, self.n_components
        )
    }
}

impl Error for BlockStructureError {}

/// Groups the per-component dof counts into blocks.
///
/// With two blocks, all displacement components form the first block and the pressure the second.
/// With one block per component, the counts are returned unchanged.
pub fn block_sizes(dofs_per_component: &[usize], n_blocks: usize) -> Result<Vec<usize>, BlockStructureError> {
    let n_components = dofs_per_component.len();
    if n_blocks == n_components {
        Ok(dofs_per_component.to_vec())
    } else if n_blocks == 2 && n_components >= 2 {
        let (pressure, displacement) = dofs_per_component
            .split_last()
            .expect("At least two components present");
        Ok(vec![displacement.iter().sum(), *pressure])
    } else {
        Err(BlockStructureError { n_blocks, n_components })
    }
}

impl<T: Real> DofHandler<T> {
    pub fn distribute(mesh: &QuadMesh2d<T>, layout: &MixedElementLayout) -> eyre::Result<Self> {
        if layout.displacement_components() != 2 {
            return Err(eyre!(
                "Quadrilateral meshes require 2 displacement components, layout has {}",
                layout.displacement_components()
            ));
        }
        for i in 0..layout.dofs_per_cell() {
            let (component, base_index) = layout.system_to_component_index(i);
            let n_base_nodes = if layout.is_displacement(i) { QUAD9_NODES } else { 4 };
            if base_index >= n_base_nodes {
                return Err(eyre!(
                    "Base index {base_index} of component {component} exceeds the element's {n_base_nodes} nodes"
                ));
            }
        }

        let dofs_per_cell = layout.dofs_per_cell();
        let edges = mesh.edge_indices();
        let n_vertices = mesh.vertices().len();
        let n_edges = edges.len();

        // Global index and position of local node `k` of the biquadratic element on `cell`
        let node = |cell: usize, k: usize| -> (usize, Point2<T>) {
            let conn = &mesh.connectivity()[cell];
            if k < 4 {
                let v = conn.0[k];
                (v, mesh.vertices()[v])
            } else if k < 8 {
                let [a, b] = conn.face_vertices(k - 4);
                let edge = edges[&sorted_edge([a, b])];
                (n_vertices + edge, nalgebra::center(&mesh.vertices()[a], &mesh.vertices()[b]))
            } else {
                let center = mesh.cell_geometry(cell).map_reference_coords(&Point2::origin());
                (n_vertices + n_edges + cell, center)
            }
        };

        let mut numbering = FxHashMap::default();
        let mut components = Vec::new();
        let mut support_points = Vec::new();
        let mut initial_cell_dofs = Vec::with_capacity(mesh.num_cells() * dofs_per_cell);
        for cell in 0..mesh.num_cells() {
            for i in 0..dofs_per_cell {
                let (component, base_index) = layout.system_to_component_index(i);
                let (global_node, position) = node(cell, base_index);
                let dof = *numbering.entry((component, global_node)).or_insert_with(|| {
                    components.push(component);
                    support_points.push(position);
                    components.len() - 1
                });
                initial_cell_dofs.push(dof);
            }
        }
        let n_dofs = components.len();

        let coupling = cell_coupling_pattern(n_dofs, dofs_per_cell, &initial_cell_dofs);
        let cm_rank = cuthill_mckee(&coupling).inverse();
        let mut order: Vec<usize> = (0..n_dofs).collect();
        order.sort_by_key(|&dof| (components[dof], cm_rank.source_index(dof)));
        let renumbering = Permutation::from_vec(order)?;
        let new_index = renumbering.inverse();

        let cell_dofs = initial_cell_dofs
            .iter()
            .map(|&dof| new_index.source_index(dof))
            .collect();
        let dof_components = renumbering.apply_to_slice(&components);
        let support_points = renumbering.apply_to_slice(&support_points);
        let mut dofs_per_component = vec![0; layout.n_components()];
        for &component in &dof_components {
            dofs_per_component[component] += 1;
        }
        debug!("Distributed {n_dofs} dofs, per component: {dofs_per_component:?}");

        Ok(Self {
            dofs_per_cell,
            cell_dofs,
            dof_components,
            support_points,
            dofs_per_component,
        })
    }
}

impl<T: Scalar> DofHandler<T> {
    pub fn n_dofs(&self) -> usize {
        self.dof_components.len()
    }

    pub fn dofs_per_cell(&self) -> usize {
        self.dofs_per_cell
    }

    pub fn num_cells(&self) -> usize {
        self.cell_dofs.len() / self.dofs_per_cell.max(1)
    }

    pub fn cell_dofs(&self, cell: usize) -> &[usize] {
        let begin = cell * self.dofs_per_cell;
        &self.cell_dofs[begin..begin + self.dofs_per_cell]
    }

    pub fn dofs_per_component(&self) -> &[usize] {
        &self.dofs_per_component
    }

    pub fn dof_component(&self, dof: usize) -> usize {
        self.dof_components[dof]
    }

    /// Location of the node that a dof is attached to.
    pub fn support_point(&self, dof: usize) -> &Point2<T> {
        &self.support_points[dof]
    }

    /// Dofs on faces with the given boundary identifier whose component is selected by `component_mask`.
    pub fn boundary_dofs(
        &self,
        mesh: &QuadMesh2d<T>,
        layout: &MixedElementLayout,
        boundary_id: BoundaryId,
        component_mask: &[bool],
    ) -> BTreeSet<usize> {
        assert_eq!(component_mask.len(), layout.n_components(), "Mask must have one entry per component");
        let mut dofs = BTreeSet::new();
        for cell in 0..mesh.num_cells() {
            for face in 0..4 {
                if mesh.face_boundary_id(cell, face) != Some(boundary_id) {
                    continue;
                }
                let face_nodes = [face, (face + 1) % 4, 4 + face];
                for (i, &dof) in self.cell_dofs(cell).iter().enumerate() {
                    let (component, base_index) = layout.system_to_component_index(i);
                    if component_mask[component] && face_nodes.contains(&base_index) {
                        dofs.insert(dof);
                    }
                }
            }
        }
        dofs
    }
}

/// Pattern coupling all dofs that share a cell.
fn cell_coupling_pattern(n_dofs: usize, dofs_per_cell: usize, cell_dofs: &[usize]) -> SparsityPattern {
    let mut rows = vec![BTreeSet::new(); n_dofs];
    for dofs in cell_dofs.chunks_exact(dofs_per_cell) {
        for &i in dofs {
            rows[i].extend(dofs.iter().copied());
        }
    }
    sparsity_pattern_from_rows(rows)
}
