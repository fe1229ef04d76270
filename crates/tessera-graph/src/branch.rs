//! Pruned graph branches

use slotmap::Key;

/// Nodes removed from a graph together with every edge that touched them.
///
/// Held by whoever removed the branch (usually an undo command) so the same
/// nodes can be re-inserted with their dependencies intact.
#[derive(Debug, Clone)]
pub struct PrunedBranch<K: Key> {
    /// Root first, then depth-first
    pub nodes: Vec<K>,
    /// `(descendant, ancestor)` pairs
    pub edges: Vec<(K, K)>,
}

impl<K: Key> Default for PrunedBranch<K> {
    fn default() -> Self {
        Self {
            nodes: Vec::new(),
            edges: Vec::new(),
        }
    }
}

impl<K: Key> PrunedBranch<K> {
    pub fn root(&self) -> Option<K> {
        self.nodes.first().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, key: K) -> bool {
        self.nodes.contains(&key)
    }

    pub(crate) fn record_edge(&mut self, descendant: K, ancestor: K) {
        if !self.edges.contains(&(descendant, ancestor)) {
            self.edges.push((descendant, ancestor));
        }
    }
}
