use std::error::Error;
use std::fmt;

const QUAD9_NODES: usize = 9;
const QUAD4_NODES: usize = 4;

/// Describes how the degrees of freedom of a mixed (vector-valued) element map to components.
///
/// Each local degree of freedom of the system element belongs to exactly one vector component and
/// corresponds to one node of the scalar base element used for that component. The first
/// `displacement_components` components form the displacement field, the remaining component
/// is the pressure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MixedElementLayout {
    /// For each local dof, the pair `(component, base_index)`.
    system_dofs: Vec<(usize, usize)>,
    displacement_components: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidLayout {
    message: String,
}

impl fmt::Display for InvalidLayout {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Invalid mixed element layout: {}", self.message)
    }
}

impl Error for InvalidLayout {}

impl MixedElementLayout {
    /// Creates a layout from an explicit list of `(component, base_index)` pairs.
    ///
    /// Every component in `0 ..= displacement_components` must be present, and within each component
    /// the base indices must be exactly `0 .. n` for some `n`.
    pub fn from_system_dofs(
        system_dofs: Vec<(usize, usize)>,
        displacement_components: usize,
    ) -> Result<Self, InvalidLayout> {
        let n_components = displacement_components + 1;
        let mut base_indices = vec![Vec::new(); n_components];
        for &(component, base_index) in &system_dofs {
            if component >= n_components {
                return Err(InvalidLayout {
                    message: format!("component {component} out of bounds ({n_components} components)"),
                });
            }
            base_indices[component].push(base_index);
        }
        for (component, indices) in base_indices.iter_mut().enumerate() {
            indices.sort_unstable();
            if indices.is_empty() || indices.iter().enumerate().any(|(k, &idx)| k != idx) {
                return Err(InvalidLayout {
                    message: format!("base indices of component {component} are not contiguous"),
                });
            }
        }
        Ok(Self {
            system_dofs,
            displacement_components,
        })
    }

    /// Taylor-Hood element on quadrilaterals: biquadratic displacement in 2D, bilinear pressure.
    ///
    /// Natural order: for each vertex `(ux, uy, p)`, then for each edge midpoint `(ux, uy)`,
    /// then `(ux, uy)` for the cell center.
    pub fn taylor_hood_quad9_quad4() -> Self {
        let mut system_dofs = Vec::with_capacity(2 * QUAD9_NODES + QUAD4_NODES);
        for vertex in 0..QUAD4_NODES {
            system_dofs.push((0, vertex));
            system_dofs.push((1, vertex));
            system_dofs.push((2, vertex));
        }
        for node in QUAD4_NODES..QUAD9_NODES {
            system_dofs.push((0, node));
            system_dofs.push((1, node));
        }
        Self {
            system_dofs,
            displacement_components: 2,
        }
    }

    pub fn dofs_per_cell(&self) -> usize {
        self.system_dofs.len()
    }

    pub fn n_components(&self) -> usize {
        self.displacement_components + 1
    }

    pub fn displacement_components(&self) -> usize {
        self.displacement_components
    }

    pub fn pressure_component(&self) -> usize {
        self.displacement_components
    }

    /// Returns `(component, base_index)` of the given local dof.
    pub fn system_to_component_index(&self, local_dof: usize) -> (usize, usize) {
        self.system_dofs[local_dof]
    }

    pub fn component(&self, local_dof: usize) -> usize {
        self.system_dofs[local_dof].0
    }

    pub fn is_displacement(&self, local_dof: usize) -> bool {
        self.component(local_dof) < self.displacement_components
    }

    pub fn dofs_per_component(&self) -> Vec<usize> {
        let mut counts = vec![0; self.n_components()];
        for &(component, _) in &self.system_dofs {
            counts[component] += 1;
        }
        counts
    }

    /// Position of each local dof in the component-wise block order.
    ///
    /// Block order sorts dofs by component and then by base index, so that all displacement dofs
    /// precede all pressure dofs.
    pub fn block_renumbering(&self) -> Vec<usize> {
        let counts = self.dofs_per_component();
        let mut offsets = vec![0; counts.len()];
        for c in 1..counts.len() {
            offsets[c] = offsets[c - 1] + counts[c - 1];
        }
        self.system_dofs
            .iter()
            .map(|&(component, base_index)| offsets[component] + base_index)
            .collect()
    }
}
