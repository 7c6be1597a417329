//! Index permutations and bandwidth-reducing orderings of degree-of-freedom graphs.
use core::fmt;
use nalgebra_sparse::pattern::SparsityPattern;
use std::collections::VecDeque;
use std::error::Error;

/// A representation of an index permutation.
///
/// Given `n` objects stored contiguously, the permutation stores an array `perm` such that
/// for *target index* `i` in `0 .. n` the corresponding *source index* is `perm[i]`:
///
/// ```ignore
/// target[i] = source[perm[i]]
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Permutation {
    perm: Vec<usize>,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct InvalidPermutation {
    index: usize,
}

impl fmt::Display for InvalidPermutation {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Invalid permutation: index {} is repeated or out of bounds", self.index)
    }
}

impl Error for InvalidPermutation {}

impl Permutation {
    pub fn from_vec(perm: Vec<usize>) -> Result<Self, InvalidPermutation> {
        let mut visited = vec![false; perm.len()];
        for &index in &perm {
            match visited.get_mut(index) {
                Some(seen) if !*seen => *seen = true,
                _ => return Err(InvalidPermutation { index }),
            }
        }
        Ok(Self { perm })
    }

    pub fn len(&self) -> usize {
        self.perm.len()
    }

    pub fn is_empty(&self) -> bool {
        self.perm.is_empty()
    }

    pub fn perm(&self) -> &[usize] {
        &self.perm
    }

    pub fn source_index(&self, target_index: usize) -> usize {
        self.perm[target_index]
    }

    pub fn inverse(&self) -> Permutation {
        let mut inverse_perm = vec![usize::MAX; self.len()];
        for (target_idx, &source_idx) in self.perm.iter().enumerate() {
            inverse_perm[source_idx] = target_idx;
        }
        Self { perm: inverse_perm }
    }

    pub fn apply_to_slice<T: Clone>(&self, slice: &[T]) -> Vec<T> {
        assert_eq!(slice.len(), self.len(), "Slice and permutation must have the same size.");
        self.perm
            .iter()
            .map(|&source_idx| slice[source_idx].clone())
            .collect()
    }
}

/// Computes a Cuthill-McKee ordering of the graph described by a square, structurally symmetric
/// sparsity pattern.
///
/// The returned permutation lists the vertices in the order in which they are visited,
/// i.e. the new index of vertex `perm[i]` is `i`. Disconnected components are handled by
/// restarting from the unvisited vertex of least degree.
pub fn cuthill_mckee(pattern: &SparsityPattern) -> Permutation {
    assert_eq!(pattern.major_dim(), pattern.minor_dim(), "Pattern must be square.");
    let n = pattern.major_dim();
    let degree = |vertex: usize| pattern.lane(vertex).len();

    let mut order = Vec::with_capacity(n);
    let mut visited = vec![false; n];
    let mut queue = VecDeque::new();
    let mut neighbors = Vec::new();

    while order.len() < n {
        let start = (0..n)
            .filter(|&vertex| !visited[vertex])
            .min_by_key(|&vertex| degree(vertex));
        let Some(start) = start else { break };

        visited[start] = true;
        queue.push_back(start);
        while let Some(vertex) = queue.pop_front() {
            order.push(vertex);
            neighbors.clear();
            neighbors.extend(pattern.lane(vertex).iter().copied().filter(|&v| !visited[v]));
            // Stable sort keeps ties in index order
            neighbors.sort_by_key(|&v| degree(v));
            for &neighbor in &neighbors {
                visited[neighbor] = true;
                queue.push_back(neighbor);
            }
        }
    }

    debug_assert_eq!(order.len(), n);
    Permutation { perm: order }
}
