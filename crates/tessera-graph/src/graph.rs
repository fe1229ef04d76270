//! Dependency graph with two-direction dirty propagation

use crate::branch::PrunedBranch;
use slotmap::{Key, SecondaryMap};
use std::collections::VecDeque;
use tessera_core::{Result, TesseraError};

/// Direction of an evaluation pass
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GraphDirection {
    /// From ancestors to descendants (visibility, global matrices)
    Downstream,
    /// From descendants to ancestors (bounds aggregation)
    Upstream,
}

impl GraphDirection {
    pub const ALL: [GraphDirection; 2] = [GraphDirection::Downstream, GraphDirection::Upstream];

    fn index(self) -> usize {
        match self {
            GraphDirection::Downstream => 0,
            GraphDirection::Upstream => 1,
        }
    }
}

/// Counts of nodes evaluated by a single pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EvaluationReport {
    pub downstream: usize,
    pub upstream: usize,
}

impl EvaluationReport {
    pub fn total(&self) -> usize {
        self.downstream + self.upstream
    }
}

#[derive(Debug, Clone)]
struct NodeEntry<K: Key> {
    ancestors: Vec<K>,
    descendants: Vec<K>,
    dirty: [bool; 2],
    visited: u32,
}

/// Registration, dependency edges and dirty state for a set of nodes.
///
/// An edge `(descendant, ancestor)` means the descendant is evaluated after
/// the ancestor downstream, and before it upstream. Edges are kept symmetric:
/// every entry in one node's descendant list has a matching entry in the
/// other node's ancestor list.
#[derive(Debug)]
pub struct DependencyGraph<K: Key> {
    nodes: SecondaryMap<K, NodeEntry<K>>,
    dirty: [Vec<K>; 2],
    epoch: u32,
}

impl<K: Key> Default for DependencyGraph<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Key> DependencyGraph<K> {
    pub fn new() -> Self {
        Self {
            nodes: SecondaryMap::new(),
            dirty: [Vec::new(), Vec::new()],
            epoch: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, key: K) -> bool {
        self.nodes.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = K> + '_ {
        self.nodes.keys()
    }

    /// Register a node. Returns false if it was already registered.
    pub fn add_node(&mut self, key: K) -> bool {
        if self.nodes.contains_key(key) {
            log::debug!("add_node: {:?} already registered", key);
            return false;
        }
        self.nodes.insert(
            key,
            NodeEntry {
                ancestors: Vec::new(),
                descendants: Vec::new(),
                dirty: [false; 2],
                visited: 0,
            },
        );
        true
    }

    /// Unregister a node, severing all of its edges first.
    /// Returns false if it was not registered.
    pub fn remove_node(&mut self, key: K) -> bool {
        let Some(entry) = self.nodes.remove(key) else {
            log::debug!("remove_node: {:?} not registered", key);
            return false;
        };
        for ancestor in entry.ancestors {
            if let Some(a) = self.nodes.get_mut(ancestor) {
                a.descendants.retain(|d| *d != key);
            }
        }
        for descendant in entry.descendants {
            if let Some(d) = self.nodes.get_mut(descendant) {
                d.ancestors.retain(|a| *a != key);
            }
        }
        for list in &mut self.dirty {
            list.retain(|k| *k != key);
        }
        true
    }

    pub fn ancestors(&self, key: K) -> &[K] {
        self.nodes
            .get(key)
            .map(|e| e.ancestors.as_slice())
            .unwrap_or(&[])
    }

    pub fn descendants(&self, key: K) -> &[K] {
        self.nodes
            .get(key)
            .map(|e| e.descendants.as_slice())
            .unwrap_or(&[])
    }

    pub fn has_dependency(&self, descendant: K, ancestor: K) -> bool {
        self.ancestors(descendant).contains(&ancestor)
    }

    /// True if `target` is reachable from `from` by following descendant edges
    pub fn reaches(&self, from: K, target: K) -> bool {
        if from == target {
            return true;
        }
        let mut stack = vec![from];
        let mut seen: SecondaryMap<K, ()> = SecondaryMap::new();
        while let Some(k) = stack.pop() {
            for &d in self.descendants(k) {
                if d == target {
                    return true;
                }
                if seen.insert(d, ()).is_none() {
                    stack.push(d);
                }
            }
        }
        false
    }

    /// Make `descendant` depend on `ancestor`.
    ///
    /// Returns `Ok(false)` if the edge already exists. Self-edges and edges
    /// that would close a cycle are rejected.
    pub fn create_dependency(&mut self, descendant: K, ancestor: K) -> Result<bool> {
        if !self.nodes.contains_key(descendant) {
            return Err(TesseraError::NodeNotFound(format!("{:?}", descendant)));
        }
        if !self.nodes.contains_key(ancestor) {
            return Err(TesseraError::NodeNotFound(format!("{:?}", ancestor)));
        }
        if self.has_dependency(descendant, ancestor) {
            return Ok(false);
        }
        if self.reaches(descendant, ancestor) {
            return Err(TesseraError::CyclicDependency(format!(
                "{:?} cannot depend on {:?}",
                descendant, ancestor
            )));
        }

        if let Some(d) = self.nodes.get_mut(descendant) {
            d.ancestors.push(ancestor);
        }
        if let Some(a) = self.nodes.get_mut(ancestor) {
            a.descendants.push(descendant);
        }
        Ok(true)
    }

    /// Remove the edge between `descendant` and `ancestor`, if any
    pub fn remove_dependency(&mut self, descendant: K, ancestor: K) -> bool {
        let mut removed = false;
        if let Some(d) = self.nodes.get_mut(descendant) {
            let before = d.ancestors.len();
            d.ancestors.retain(|a| *a != ancestor);
            removed = d.ancestors.len() != before;
        }
        if let Some(a) = self.nodes.get_mut(ancestor) {
            a.descendants.retain(|d| *d != descendant);
        }
        removed
    }

    fn next_epoch(&mut self) -> u32 {
        self.epoch = self.epoch.wrapping_add(1);
        if self.epoch == 0 {
            // Wrapped: stale visit marks could collide, so clear them.
            for (_, entry) in self.nodes.iter_mut() {
                entry.visited = 0;
            }
            self.epoch = 1;
        }
        self.epoch
    }

    /// Mark `key` and everything depending on it in `direction` dirty.
    ///
    /// Downstream follows descendant edges, Upstream follows ancestor edges.
    /// Returns how many nodes were newly dirtied.
    pub fn dirty_node(&mut self, key: K, direction: GraphDirection) -> u32 {
        if !self.nodes.contains_key(key) {
            return 0;
        }
        let epoch = self.next_epoch();
        let index = direction.index();
        let mut count = 0;
        let mut stack = vec![key];

        while let Some(k) = stack.pop() {
            let Some(entry) = self.nodes.get_mut(k) else {
                continue;
            };
            if entry.visited == epoch {
                continue;
            }
            entry.visited = epoch;
            if !entry.dirty[index] {
                entry.dirty[index] = true;
                self.dirty[index].push(k);
                count += 1;
            }
            match direction {
                GraphDirection::Downstream => stack.extend(entry.descendants.iter().copied()),
                GraphDirection::Upstream => stack.extend(entry.ancestors.iter().copied()),
            }
        }
        count
    }

    pub fn is_dirty(&self, key: K, direction: GraphDirection) -> bool {
        self.nodes
            .get(key)
            .map(|e| e.dirty[direction.index()])
            .unwrap_or(false)
    }

    pub fn dirty_count(&self, direction: GraphDirection) -> usize {
        self.dirty[direction.index()].len()
    }

    /// Take the dirty set for `direction` in evaluation order and mark those
    /// nodes clean.
    ///
    /// Downstream order puts every node after its dirty ancestors, Upstream
    /// order after its dirty descendants. If the set contains a cycle the
    /// nodes that could not be ordered stay dirty and an error is returned.
    pub fn take_sorted(&mut self, direction: GraphDirection) -> Result<Vec<K>> {
        let index = direction.index();
        let pending = std::mem::take(&mut self.dirty[index]);
        if pending.is_empty() {
            return Ok(pending);
        }

        let mut in_set: SecondaryMap<K, usize> = SecondaryMap::new();
        for &k in &pending {
            in_set.insert(k, 0);
        }

        // In-degree counts only predecessors that are themselves dirty.
        for &k in &pending {
            let preds = match direction {
                GraphDirection::Downstream => self.ancestors(k),
                GraphDirection::Upstream => self.descendants(k),
            };
            let degree = preds.iter().filter(|p| in_set.contains_key(**p)).count();
            in_set.insert(k, degree);
        }

        let mut queue: VecDeque<K> = pending
            .iter()
            .copied()
            .filter(|k| in_set.get(*k).copied() == Some(0))
            .collect();
        let mut order = Vec::with_capacity(pending.len());

        while let Some(k) = queue.pop_front() {
            order.push(k);
            let succs = match direction {
                GraphDirection::Downstream => self.descendants(k),
                GraphDirection::Upstream => self.ancestors(k),
            };
            for &s in succs {
                if let Some(degree) = in_set.get_mut(s) {
                    *degree -= 1;
                    if *degree == 0 {
                        queue.push_back(s);
                    }
                }
            }
        }

        for &k in &order {
            if let Some(entry) = self.nodes.get_mut(k) {
                entry.dirty[index] = false;
            }
        }

        if order.len() != pending.len() {
            let stuck: Vec<K> = pending
                .into_iter()
                .filter(|k| in_set.get(*k).copied().unwrap_or(0) > 0)
                .collect();
            let message = format!("{} node(s) in a {:?} cycle: {:?}", stuck.len(), direction, stuck);
            self.dirty[index] = stuck;
            return Err(TesseraError::CyclicDependency(message));
        }

        Ok(order)
    }

    /// Evaluate every dirty node, Downstream first and then Upstream.
    pub fn evaluate<F>(&mut self, mut f: F) -> Result<EvaluationReport>
    where
        F: FnMut(K, GraphDirection),
    {
        let mut report = EvaluationReport::default();
        for direction in GraphDirection::ALL {
            let order = self.take_sorted(direction)?;
            for &k in &order {
                f(k, direction);
            }
            match direction {
                GraphDirection::Downstream => report.downstream = order.len(),
                GraphDirection::Upstream => report.upstream = order.len(),
            }
        }
        Ok(report)
    }

    /// Remove `root` and every node reachable from it through descendant
    /// edges accepted by `follow(ancestor, descendant)`.
    ///
    /// Every edge touching a removed node is recorded so `insert` can put the
    /// branch back exactly as it was.
    pub fn prune<F>(&mut self, root: K, follow: F) -> PrunedBranch<K>
    where
        F: Fn(K, K) -> bool,
    {
        let mut branch = PrunedBranch::default();
        if !self.nodes.contains_key(root) {
            return branch;
        }

        let epoch = self.next_epoch();
        let mut stack = vec![root];
        while let Some(k) = stack.pop() {
            let Some(entry) = self.nodes.get_mut(k) else {
                continue;
            };
            if entry.visited == epoch {
                continue;
            }
            entry.visited = epoch;
            branch.nodes.push(k);
            let next: Vec<K> = entry
                .descendants
                .iter()
                .rev()
                .copied()
                .filter(|d| follow(k, *d))
                .collect();
            stack.extend(next);
        }

        let mut edges = Vec::new();
        for &k in &branch.nodes {
            edges.extend(self.ancestors(k).iter().map(|&a| (k, a)));
            edges.extend(self.descendants(k).iter().map(|&d| (d, k)));
        }
        for (descendant, ancestor) in edges {
            branch.record_edge(descendant, ancestor);
        }

        for &k in &branch.nodes {
            self.remove_node(k);
        }
        branch
    }

    /// Re-register a pruned branch and restore its edges.
    ///
    /// Edges whose other end has since left the graph are dropped.
    pub fn insert(&mut self, branch: &PrunedBranch<K>) -> usize {
        let mut added = 0;
        for &k in &branch.nodes {
            if self.add_node(k) {
                added += 1;
            }
        }
        for &(descendant, ancestor) in &branch.edges {
            if !self.contains(descendant) || !self.contains(ancestor) {
                log::debug!(
                    "insert: dropping edge {:?} -> {:?}, endpoint no longer registered",
                    descendant,
                    ancestor
                );
                continue;
            }
            if let Err(err) = self.create_dependency(descendant, ancestor) {
                log::warn!("insert: could not restore edge: {}", err);
            }
        }
        added
    }

    /// Check edge symmetry, registration of edge endpoints, and acyclicity
    pub fn validate(&self) -> Result<()> {
        for (k, entry) in self.nodes.iter() {
            for &a in &entry.ancestors {
                if !self.descendants(a).contains(&k) {
                    return Err(TesseraError::InvalidHierarchy(format!(
                        "edge {:?} -> {:?} has no matching descendant entry",
                        k, a
                    )));
                }
            }
            for &d in &entry.descendants {
                if !self.ancestors(d).contains(&k) {
                    return Err(TesseraError::InvalidHierarchy(format!(
                        "edge {:?} -> {:?} has no matching ancestor entry",
                        d, k
                    )));
                }
            }
        }

        let mut degree: SecondaryMap<K, usize> = SecondaryMap::new();
        for (k, entry) in self.nodes.iter() {
            degree.insert(k, entry.ancestors.len());
        }
        let mut queue: VecDeque<K> = degree
            .iter()
            .filter(|(_, d)| **d == 0)
            .map(|(k, _)| k)
            .collect();
        let mut seen = 0;
        while let Some(k) = queue.pop_front() {
            seen += 1;
            for &d in self.descendants(k) {
                if let Some(n) = degree.get_mut(d) {
                    *n -= 1;
                    if *n == 0 {
                        queue.push_back(d);
                    }
                }
            }
        }
        if seen != self.nodes.len() {
            return Err(TesseraError::CyclicDependency(format!(
                "{} node(s) are part of a cycle",
                self.nodes.len() - seen
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slotmap::{DefaultKey, SlotMap};

    fn keys(n: usize) -> (SlotMap<DefaultKey, ()>, Vec<DefaultKey>) {
        let mut store = SlotMap::new();
        let ks = (0..n).map(|_| store.insert(())).collect();
        (store, ks)
    }

    fn graph_with(ks: &[DefaultKey]) -> DependencyGraph<DefaultKey> {
        let mut g = DependencyGraph::new();
        for &k in ks {
            g.add_node(k);
        }
        g
    }

    #[test]
    fn test_add_remove_are_idempotent() {
        let (_s, ks) = keys(1);
        let mut g = DependencyGraph::new();
        assert!(g.add_node(ks[0]));
        assert!(!g.add_node(ks[0]));
        assert_eq!(g.len(), 1);
        assert!(g.remove_node(ks[0]));
        assert!(!g.remove_node(ks[0]));
        assert!(g.is_empty());
    }

    #[test]
    fn test_edges_are_symmetric() {
        let (_s, ks) = keys(2);
        let mut g = graph_with(&ks);
        assert!(g.create_dependency(ks[1], ks[0]).unwrap());
        assert!(!g.create_dependency(ks[1], ks[0]).unwrap());
        assert_eq!(g.ancestors(ks[1]), &[ks[0]]);
        assert_eq!(g.descendants(ks[0]), &[ks[1]]);
        g.validate().unwrap();

        g.remove_node(ks[0]);
        assert!(g.ancestors(ks[1]).is_empty());
        g.validate().unwrap();
    }

    #[test]
    fn test_cycles_rejected() {
        let (_s, ks) = keys(3);
        let mut g = graph_with(&ks);
        g.create_dependency(ks[1], ks[0]).unwrap();
        g.create_dependency(ks[2], ks[1]).unwrap();
        assert!(matches!(
            g.create_dependency(ks[0], ks[2]),
            Err(TesseraError::CyclicDependency(_))
        ));
        assert!(g.create_dependency(ks[0], ks[0]).is_err());
        g.validate().unwrap();
    }

    #[test]
    fn test_dirty_counts_new_nodes_only() {
        let (_s, ks) = keys(3);
        let mut g = graph_with(&ks);
        g.create_dependency(ks[1], ks[0]).unwrap();
        g.create_dependency(ks[2], ks[1]).unwrap();

        assert_eq!(g.dirty_node(ks[0], GraphDirection::Downstream), 3);
        assert_eq!(g.dirty_node(ks[1], GraphDirection::Downstream), 0);
        assert_eq!(g.dirty_node(ks[2], GraphDirection::Upstream), 3);
        assert_eq!(g.dirty_node(ks[0], GraphDirection::Upstream), 0);
    }

    #[test]
    fn test_dirty_direction() {
        let (_s, ks) = keys(3);
        let mut g = graph_with(&ks);
        g.create_dependency(ks[1], ks[0]).unwrap();
        g.create_dependency(ks[2], ks[1]).unwrap();

        assert_eq!(g.dirty_node(ks[1], GraphDirection::Downstream), 2);
        assert!(!g.is_dirty(ks[0], GraphDirection::Downstream));
        assert_eq!(g.dirty_node(ks[1], GraphDirection::Upstream), 2);
        assert!(!g.is_dirty(ks[2], GraphDirection::Upstream));
    }

    #[test]
    fn test_downstream_order_respects_all_ancestors() {
        // Diamond plus a dependency edge that bypasses the tree order:
        // 0 -> 1 -> 3, 0 -> 2 -> 3, and 4 -> 1 where 4 is dirtied last.
        let (_s, ks) = keys(5);
        let mut g = graph_with(&ks);
        g.create_dependency(ks[1], ks[0]).unwrap();
        g.create_dependency(ks[2], ks[0]).unwrap();
        g.create_dependency(ks[3], ks[1]).unwrap();
        g.create_dependency(ks[3], ks[2]).unwrap();
        g.create_dependency(ks[1], ks[4]).unwrap();

        g.dirty_node(ks[3], GraphDirection::Downstream);
        g.dirty_node(ks[0], GraphDirection::Downstream);
        g.dirty_node(ks[4], GraphDirection::Downstream);

        let mut order = Vec::new();
        let report = g.evaluate(|k, _| order.push(k)).unwrap();
        assert_eq!(report.downstream, 5);
        let pos = |k: DefaultKey| order.iter().position(|o| *o == k).unwrap();
        assert!(pos(ks[0]) < pos(ks[1]));
        assert!(pos(ks[4]) < pos(ks[1]));
        assert!(pos(ks[1]) < pos(ks[3]));
        assert!(pos(ks[2]) < pos(ks[3]));
        assert_eq!(g.dirty_count(GraphDirection::Downstream), 0);
    }

    #[test]
    fn test_upstream_order_children_first() {
        let (_s, ks) = keys(3);
        let mut g = graph_with(&ks);
        g.create_dependency(ks[1], ks[0]).unwrap();
        g.create_dependency(ks[2], ks[1]).unwrap();

        g.dirty_node(ks[0], GraphDirection::Upstream);
        g.dirty_node(ks[2], GraphDirection::Upstream);
        let mut order = Vec::new();
        g.evaluate(|k, dir| {
            assert_eq!(dir, GraphDirection::Upstream);
            order.push(k);
        })
        .unwrap();
        assert_eq!(order, vec![ks[2], ks[1], ks[0]]);
    }

    #[test]
    fn test_prune_and_insert_restore_edges() {
        // 0 <- 1 <- 2 tree, plus 3 (layer-like) <- 1.
        let (_s, ks) = keys(4);
        let mut g = graph_with(&ks);
        g.create_dependency(ks[1], ks[0]).unwrap();
        g.create_dependency(ks[2], ks[1]).unwrap();
        g.create_dependency(ks[1], ks[3]).unwrap();

        let tree = |a: DefaultKey, d: DefaultKey| !(a == ks[3] || d == ks[3]);
        let branch = g.prune(ks[1], tree);
        assert_eq!(branch.nodes, vec![ks[1], ks[2]]);
        assert!(!g.contains(ks[1]));
        assert!(!g.contains(ks[2]));
        assert!(g.contains(ks[3]));
        assert!(g.descendants(ks[0]).is_empty());
        assert!(g.descendants(ks[3]).is_empty());
        assert_eq!(branch.edges.len(), 3);

        assert_eq!(g.insert(&branch), 2);
        assert!(g.has_dependency(ks[1], ks[0]));
        assert!(g.has_dependency(ks[2], ks[1]));
        assert!(g.has_dependency(ks[1], ks[3]));
        g.validate().unwrap();
    }

    #[test]
    fn test_prune_records_every_touching_edge() {
        // 0 <- 1 <- 2, 1 <- 3, and 4 depends on 2 outside the tree.
        let (_s, ks) = keys(5);
        let mut g = graph_with(&ks);
        g.create_dependency(ks[1], ks[0]).unwrap();
        g.create_dependency(ks[2], ks[1]).unwrap();
        g.create_dependency(ks[3], ks[1]).unwrap();
        g.create_dependency(ks[4], ks[2]).unwrap();

        let branch = g.prune(ks[1], |_, d| d != ks[4]);
        assert_eq!(branch.root(), Some(ks[1]));
        assert_eq!(branch.nodes.len(), 3);
        assert!(branch.contains(ks[2]) && branch.contains(ks[3]));

        let mut edges = branch.edges.clone();
        edges.sort();
        let mut expected = vec![(ks[1], ks[0]), (ks[2], ks[1]), (ks[3], ks[1]), (ks[4], ks[2])];
        expected.sort();
        assert_eq!(edges, expected);
        assert!(g.ancestors(ks[4]).is_empty());
        g.validate().unwrap();

        g.insert(&branch);
        assert!(g.has_dependency(ks[4], ks[2]));
        g.validate().unwrap();
    }

    #[test]
    fn test_take_sorted_reports_cycles() {
        let (_s, ks) = keys(3);
        let mut g = graph_with(&ks);
        g.create_dependency(ks[1], ks[0]).unwrap();
        g.create_dependency(ks[2], ks[1]).unwrap();
        // Close 0 -> 1 -> 2 -> 0 behind create_dependency's back.
        g.nodes[ks[0]].ancestors.push(ks[2]);
        g.nodes[ks[2]].descendants.push(ks[0]);
        assert!(g.validate().is_err());

        g.dirty_node(ks[0], GraphDirection::Downstream);
        assert!(matches!(
            g.take_sorted(GraphDirection::Downstream),
            Err(TesseraError::CyclicDependency(_))
        ));
        assert_eq!(g.dirty_count(GraphDirection::Downstream), 3);
        assert!(g.evaluate(|_, _| {}).is_err());
    }

    #[test]
    fn test_insert_drops_edges_to_missing_nodes() {
        let (_s, ks) = keys(2);
        let mut g = graph_with(&ks);
        g.create_dependency(ks[1], ks[0]).unwrap();
        let branch = g.prune(ks[1], |_, _| true);
        g.remove_node(ks[0]);
        g.insert(&branch);
        assert!(g.contains(ks[1]));
        assert!(g.ancestors(ks[1]).is_empty());
    }

    #[test]
    fn test_removed_nodes_leave_dirty_sets() {
        let (_s, ks) = keys(2);
        let mut g = graph_with(&ks);
        g.create_dependency(ks[1], ks[0]).unwrap();
        g.dirty_node(ks[0], GraphDirection::Downstream);
        g.remove_node(ks[1]);
        let order = g.take_sorted(GraphDirection::Downstream).unwrap();
        assert_eq!(order, vec![ks[0]]);
    }
}
