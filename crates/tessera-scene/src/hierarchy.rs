//! Ordered parent/child tree with sibling links

use slotmap::{Key, SecondaryMap};
use tessera_core::{Result, TesseraError};

/// Result of visiting a node during a hierarchy walk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraversalAction {
    /// Descend into the node's children
    Continue,
    /// Skip the node's children, carry on with its siblings
    Prune,
    /// Stop the whole walk
    Abort,
}

#[derive(Debug, Clone)]
struct TreeLinks<K: Key> {
    parent: Option<K>,
    children: Vec<K>,
    previous: Option<K>,
    next: Option<K>,
}

impl<K: Key> TreeLinks<K> {
    fn new() -> Self {
        Self {
            parent: None,
            children: Vec::new(),
            previous: None,
            next: None,
        }
    }
}

/// Parent pointers, ordered children, and previous/next sibling links for
/// every node that has taken part in the tree.
///
/// A detached node keeps its last previous/next links as position hints, so
/// reconnecting it to the same parent puts it back where it was.
#[derive(Debug)]
pub struct Hierarchy<K: Key> {
    links: SecondaryMap<K, TreeLinks<K>>,
}

impl<K: Key> Default for Hierarchy<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Key> Hierarchy<K> {
    pub fn new() -> Self {
        Self {
            links: SecondaryMap::new(),
        }
    }

    fn entry(&mut self, key: K) -> &mut TreeLinks<K> {
        if !self.links.contains_key(key) {
            self.links.insert(key, TreeLinks::new());
        }
        // Inserted above when missing.
        &mut self.links[key]
    }

    /// Forget a node entirely, detaching it from its parent first.
    ///
    /// Children keep their entries but lose their parent pointer; callers
    /// forget whole subtrees at once.
    pub fn forget(&mut self, key: K) {
        if let Some(parent) = self.parent(key) {
            self.disconnect_child(parent, key);
        }
        if let Some(links) = self.links.remove(key) {
            for child in links.children {
                if let Some(l) = self.links.get_mut(child) {
                    l.parent = None;
                }
            }
        }
    }

    pub fn parent(&self, key: K) -> Option<K> {
        self.links.get(key).and_then(|l| l.parent)
    }

    pub fn children(&self, key: K) -> &[K] {
        self.links
            .get(key)
            .map(|l| l.children.as_slice())
            .unwrap_or(&[])
    }

    pub fn previous(&self, key: K) -> Option<K> {
        self.links.get(key).and_then(|l| l.previous)
    }

    pub fn next(&self, key: K) -> Option<K> {
        self.links.get(key).and_then(|l| l.next)
    }

    /// Current `(previous, next)` links, used as position hints on reconnect
    pub fn hints(&self, key: K) -> (Option<K>, Option<K>) {
        (self.previous(key), self.next(key))
    }

    /// Overwrite the position hints of a node.
    ///
    /// Hints only matter while the node is detached; a connected node gets
    /// its links re-derived on the next change to its parent's children.
    pub fn set_hints(&mut self, key: K, previous: Option<K>, next: Option<K>) {
        let links = self.entry(key);
        links.previous = previous;
        links.next = next;
    }

    /// True if `ancestor` is a proper ancestor of `node`
    pub fn is_ancestor(&self, ancestor: K, node: K) -> bool {
        let mut current = self.parent(node);
        while let Some(p) = current {
            if p == ancestor {
                return true;
            }
            current = self.parent(p);
        }
        false
    }

    /// `key` followed by all of its descendants, depth-first in child order
    pub fn subtree(&self, key: K) -> Vec<K> {
        let mut out = Vec::new();
        let mut stack = vec![key];
        while let Some(k) = stack.pop() {
            out.push(k);
            stack.extend(self.children(k).iter().rev().copied());
        }
        out
    }

    fn relink(&mut self, parent: K) {
        let children = self.children(parent).to_vec();
        for (i, &child) in children.iter().enumerate() {
            let links = self.entry(child);
            links.previous = if i > 0 { Some(children[i - 1]) } else { None };
            links.next = children.get(i + 1).copied();
        }
    }

    /// Attach `child` under `parent`.
    ///
    /// The child is placed before its `next` hint if that is a current child,
    /// else after its `previous` hint, else appended. Stale hints are dropped.
    pub fn connect_child(&mut self, parent: K, child: K) -> bool {
        if parent == child {
            return false;
        }
        if let Some(existing) = self.parent(child) {
            debug_assert!(false, "connect_child: {:?} already has parent {:?}", child, existing);
            log::warn!("connect_child: {:?} already has parent {:?}", child, existing);
            return false;
        }

        let (previous, next) = self.hints(child);
        let siblings = self.children(parent);
        let index = if let Some(i) = next.and_then(|n| siblings.iter().position(|s| *s == n)) {
            i
        } else if let Some(i) = previous.and_then(|p| siblings.iter().position(|s| *s == p)) {
            i + 1
        } else {
            if previous.is_some() || next.is_some() {
                log::debug!("connect_child: discarding stale sibling hints for {:?}", child);
            }
            siblings.len()
        };

        self.entry(parent).children.insert(index, child);
        self.entry(child).parent = Some(parent);
        self.relink(parent);
        true
    }

    /// Detach `child` from `parent`, repairing the neighbours' links.
    ///
    /// The child's own previous/next links are left in place as hints.
    pub fn disconnect_child(&mut self, parent: K, child: K) -> bool {
        if self.parent(child) != Some(parent) {
            return false;
        }
        self.entry(parent).children.retain(|c| *c != child);
        self.entry(child).parent = None;
        self.relink(parent);
        true
    }

    pub fn reverse_children(&mut self, parent: K) {
        self.entry(parent).children.reverse();
        self.relink(parent);
    }

    /// Depth-first walk starting at (and including) `start`
    pub fn traverse<F>(&self, start: K, visit: &mut F) -> TraversalAction
    where
        F: FnMut(K) -> TraversalAction,
    {
        match visit(start) {
            TraversalAction::Abort => return TraversalAction::Abort,
            TraversalAction::Prune => return TraversalAction::Continue,
            TraversalAction::Continue => {}
        }
        for &child in self.children(start) {
            if self.traverse(child, visit) == TraversalAction::Abort {
                return TraversalAction::Abort;
            }
        }
        TraversalAction::Continue
    }

    /// Check parent/child agreement and the sibling chains
    pub fn validate(&self) -> Result<()> {
        for (key, links) in self.links.iter() {
            if let Some(parent) = links.parent {
                let count = self.children(parent).iter().filter(|c| **c == key).count();
                if count != 1 {
                    return Err(TesseraError::InvalidHierarchy(format!(
                        "{:?} appears {} times under its parent {:?}",
                        key, count, parent
                    )));
                }
            }
            for (i, &child) in links.children.iter().enumerate() {
                if self.parent(child) != Some(key) {
                    return Err(TesseraError::InvalidHierarchy(format!(
                        "child {:?} of {:?} points at parent {:?}",
                        child,
                        key,
                        self.parent(child)
                    )));
                }
                let expected_previous = if i > 0 { Some(links.children[i - 1]) } else { None };
                let expected_next = links.children.get(i + 1).copied();
                if self.previous(child) != expected_previous || self.next(child) != expected_next {
                    return Err(TesseraError::InvalidHierarchy(format!(
                        "sibling links of {:?} under {:?} are out of order",
                        child, key
                    )));
                }
            }
        }
        Ok(())
    }
}
