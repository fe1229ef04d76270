//! The scene: node store, registration, tree and graph bookkeeping

use crate::commands::SceneCommand;
use crate::events::{
    curve_point_veto, EventListener, ListenerId, ParentChangingArgs, ParentChangingListener,
    ParentVerdict, SceneEvent,
};
use crate::hierarchy::{Hierarchy, TraversalAction};
use crate::node::{NodeKey, NodeKind, NodeKindTag, SceneNode};
use crate::settings::{SceneSettings, ViewColorMode};
use slotmap::SlotMap;
use std::collections::HashMap;
use tessera_core::{Color, Result, SceneId, TesseraError};
use tessera_graph::{DependencyGraph, GraphDirection, PrunedBranch};
use tessera_undo::UndoQueue;

/// A removed subtree, kept so undo can put it back
#[derive(Debug)]
pub(crate) struct DetachedBranch {
    pub(crate) branch: PrunedBranch<NodeKey>,
    pub(crate) parent: Option<NodeKey>,
}

/// Visitor for `Scene::traverse_hierarchy`, used by render and pick passes
pub trait HierarchyVisitor {
    fn visit(&mut self, scene: &Scene, node: NodeKey) -> TraversalAction;
}

impl<F> HierarchyVisitor for F
where
    F: FnMut(&Scene, NodeKey) -> TraversalAction,
{
    fn visit(&mut self, scene: &Scene, node: NodeKey) -> TraversalAction {
        self(scene, node)
    }
}

/// An editable scene.
///
/// Nodes live in a slot map for as long as anything may refer to them:
/// removing a node only unregisters it, so undo can bring it back. A detached
/// branch is dropped when the command that detached it leaves undo history,
/// or all at once by `purge_detached`.
pub struct Scene {
    pub(crate) settings: SceneSettings,
    pub(crate) nodes: SlotMap<NodeKey, SceneNode>,
    pub(crate) ids: HashMap<SceneId, NodeKey>,
    /// Lowercased name -> node, for registered nodes
    pub(crate) names: HashMap<String, NodeKey>,
    pub(crate) graph: DependencyGraph<NodeKey>,
    pub(crate) hierarchy: Hierarchy<NodeKey>,
    pub(crate) root: NodeKey,
    pub(crate) detached: HashMap<NodeKey, DetachedBranch>,
    pub(crate) selection: Vec<NodeKey>,
    pub(crate) last_hidden: Vec<NodeKey>,
    /// Last duplicated `(source, copy)` pair
    pub(crate) smart_duplicate: Option<(NodeKey, NodeKey)>,
    pub(crate) remapped_ids: HashMap<SceneId, SceneId>,
    pub(crate) importing: bool,
    pub(crate) pending_events: Vec<SceneEvent>,
    edit_locks: u32,
    undo_queue: UndoQueue<Scene>,
    listeners: Vec<(ListenerId, EventListener)>,
    parent_listeners: Vec<(ListenerId, ParentChangingListener)>,
    next_listener: u64,
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

impl Scene {
    pub fn new() -> Self {
        Self::with_settings(SceneSettings::default())
    }

    pub fn with_settings(settings: SceneSettings) -> Self {
        let mut nodes = SlotMap::with_key();
        let mut root_node = SceneNode::new(NodeKind::group(), "root");
        root_node.selectable = false;
        let root_id = root_node.id;
        let root = nodes.insert(root_node);

        let mut graph = DependencyGraph::new();
        graph.add_node(root);
        let mut ids = HashMap::new();
        ids.insert(root_id, root);
        let mut names = HashMap::new();
        names.insert(String::from("root"), root);

        let undo_queue = UndoQueue::with_max_depth(settings.undo_depth);

        Self {
            settings,
            nodes,
            ids,
            names,
            graph,
            hierarchy: Hierarchy::new(),
            root,
            detached: HashMap::new(),
            selection: Vec::new(),
            last_hidden: Vec::new(),
            smart_duplicate: None,
            remapped_ids: HashMap::new(),
            importing: false,
            pending_events: Vec::new(),
            edit_locks: 0,
            undo_queue,
            listeners: Vec::new(),
            parent_listeners: Vec::new(),
            next_listener: 1,
        }
    }

    pub fn settings(&self) -> &SceneSettings {
        &self.settings
    }

    pub fn root(&self) -> NodeKey {
        self.root
    }

    pub fn graph(&self) -> &DependencyGraph<NodeKey> {
        &self.graph
    }

    pub fn hierarchy(&self) -> &Hierarchy<NodeKey> {
        &self.hierarchy
    }

    pub fn get(&self, key: NodeKey) -> Option<&SceneNode> {
        self.nodes.get(key)
    }

    pub fn node(&self, key: NodeKey) -> Result<&SceneNode> {
        self.nodes
            .get(key)
            .ok_or_else(|| TesseraError::NodeNotFound(format!("{:?}", key)))
    }

    pub(crate) fn node_mut(&mut self, key: NodeKey) -> Result<&mut SceneNode> {
        self.nodes
            .get_mut(key)
            .ok_or_else(|| TesseraError::NodeNotFound(format!("{:?}", key)))
    }

    /// True if the node is currently part of the scene (not detached)
    pub fn is_registered(&self, key: NodeKey) -> bool {
        self.nodes
            .get(key)
            .map(|n| self.ids.get(&n.id) == Some(&key))
            .unwrap_or(false)
    }

    /// Number of registered nodes, root included
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.len() <= 1
    }

    /// Registered nodes, in no particular order
    pub fn node_keys(&self) -> impl Iterator<Item = NodeKey> + '_ {
        self.ids.values().copied()
    }

    pub fn parent(&self, key: NodeKey) -> Option<NodeKey> {
        self.hierarchy.parent(key)
    }

    pub fn children(&self, key: NodeKey) -> &[NodeKey] {
        self.hierarchy.children(key)
    }

    pub fn is_importing(&self) -> bool {
        self.importing
    }

    // ------------------------------------------------------------------
    // Events
    // ------------------------------------------------------------------

    pub fn add_listener<F>(&mut self, listener: F) -> ListenerId
    where
        F: FnMut(&SceneEvent) + 'static,
    {
        let id = ListenerId(self.next_listener);
        self.next_listener += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    pub fn remove_listener(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(l, _)| *l != id);
        self.listeners.len() != before
    }

    /// Register an observer that may veto reparenting
    pub fn add_parent_changing_listener<F>(&mut self, listener: F) -> ListenerId
    where
        F: Fn(&ParentChangingArgs) -> ParentVerdict + 'static,
    {
        let id = ListenerId(self.next_listener);
        self.next_listener += 1;
        self.parent_listeners.push((id, Box::new(listener)));
        id
    }

    pub fn remove_parent_changing_listener(&mut self, id: ListenerId) -> bool {
        let before = self.parent_listeners.len();
        self.parent_listeners.retain(|(l, _)| *l != id);
        self.parent_listeners.len() != before
    }

    pub(crate) fn raise(&mut self, event: SceneEvent) {
        log::trace!("scene event: {:?}", event);
        for (_, listener) in self.listeners.iter_mut() {
            listener(&event);
        }
    }

    pub(crate) fn status(&mut self, message: impl Into<String>) {
        self.raise(SceneEvent::StatusChanged(message.into()));
    }

    fn parent_changing(&self, args: &ParentChangingArgs) -> ParentVerdict {
        let builtin = curve_point_veto(args);
        if !builtin.is_allowed() {
            return builtin;
        }
        for (_, listener) in &self.parent_listeners {
            let verdict = listener(args);
            if !verdict.is_allowed() {
                return verdict;
            }
        }
        ParentVerdict::Allow
    }

    // ------------------------------------------------------------------
    // Names and paths
    // ------------------------------------------------------------------

    fn sanitize_name(name: &str, tag: NodeKindTag) -> String {
        let cleaned: String = name
            .trim()
            .chars()
            .map(|c| if c.is_alphanumeric() || c == '_' { c } else { '_' })
            .collect();
        if cleaned.is_empty() {
            format!("{}1", tag.default_name())
        } else {
            cleaned
        }
    }

    /// First free variant of `name`, bumping its numeric suffix
    fn unique_name(&self, name: &str, owner: Option<NodeKey>) -> String {
        let taken = |candidate: &str| match self.names.get(&candidate.to_lowercase()) {
            Some(k) => Some(*k) != owner,
            None => false,
        };
        if !taken(name) {
            return name.to_string();
        }
        let (base, number) = split_name(name);
        let mut n = number.map(|n| n + 1).unwrap_or(1);
        loop {
            let candidate = format!("{}{}", base, n);
            if !taken(&candidate) {
                return candidate;
            }
            n += 1;
        }
    }

    /// Rename a node, returning the name it actually got
    pub fn rename(&mut self, key: NodeKey, name: &str) -> Result<String> {
        if key == self.root {
            return Err(TesseraError::InvalidOperation(String::from(
                "the root cannot be renamed",
            )));
        }
        if name.trim().is_empty() {
            return Err(TesseraError::InvalidName(String::from("names cannot be empty")));
        }
        let node = self.node(key)?;
        let tag = node.tag();
        let old_name = node.name.clone();
        let registered = self.is_registered(key);

        let sanitized = Self::sanitize_name(name, tag);
        let new_name = if registered {
            self.unique_name(&sanitized, Some(key))
        } else {
            sanitized
        };
        if new_name == old_name {
            return Ok(new_name);
        }

        if registered {
            let old_lower = old_name.to_lowercase();
            if self.names.get(&old_lower) == Some(&key) {
                self.names.remove(&old_lower);
            }
            self.names.insert(new_name.to_lowercase(), key);
        }
        self.node_mut(key)?.name = new_name.clone();
        self.invalidate_paths(key);
        if registered {
            self.raise(SceneEvent::Renamed {
                node: key,
                old_name,
            });
        }
        Ok(new_name)
    }

    pub(crate) fn invalidate_paths(&mut self, key: NodeKey) {
        for k in self.hierarchy.subtree(key) {
            if let Some(node) = self.nodes.get_mut(k) {
                node.path.take();
            }
        }
    }

    /// `|parent|child` path below the root; the root's path is empty
    pub fn path(&self, key: NodeKey) -> String {
        let Some(node) = self.nodes.get(key) else {
            return String::new();
        };
        node.path.get_or_init(|| self.compute_path(key)).clone()
    }

    fn compute_path(&self, key: NodeKey) -> String {
        let mut segments = Vec::new();
        let mut current = Some(key);
        while let Some(k) = current {
            if k == self.root {
                break;
            }
            if let Some(node) = self.nodes.get(k) {
                segments.push(node.name.as_str());
            }
            current = self.hierarchy.parent(k);
        }
        segments
            .iter()
            .rev()
            .map(|s| format!("|{}", s))
            .collect()
    }

    pub fn find_by_id(&self, id: SceneId) -> Option<NodeKey> {
        self.ids.get(&id).copied()
    }

    /// Case-insensitive lookup among registered nodes
    pub fn find_by_name(&self, name: &str) -> Option<NodeKey> {
        self.names.get(&name.to_lowercase()).copied()
    }

    /// Resolve a `|a|b` path; layers resolve by their bare name
    pub fn find_by_path(&self, path: &str) -> Option<NodeKey> {
        let segments: Vec<&str> = path.split('|').filter(|s| !s.is_empty()).collect();
        if segments.is_empty() {
            return Some(self.root);
        }
        let mut current = self.root;
        for segment in &segments {
            let next = self.hierarchy.children(current).iter().copied().find(|c| {
                self.nodes
                    .get(*c)
                    .map(|n| n.name.eq_ignore_ascii_case(segment))
                    .unwrap_or(false)
            });
            match next {
                Some(k) => current = k,
                None if segments.len() == 1 => {
                    return self
                        .find_by_name(segment)
                        .filter(|k| self.nodes.get(*k).map(|n| !n.is_hierarchy()).unwrap_or(false));
                }
                None => return None,
            }
        }
        Some(current)
    }

    /// Identifier an imported node was given in place of its persisted one
    pub fn remapped_id(&self, persisted: SceneId) -> Option<SceneId> {
        self.remapped_ids.get(&persisted).copied()
    }

    // ------------------------------------------------------------------
    // Creation, registration and removal
    // ------------------------------------------------------------------

    /// Create a detached node. It joins the scene through `add_object`.
    pub fn create_node(&mut self, kind: NodeKind, name: &str) -> NodeKey {
        self.create_node_with_id(SceneId::new(), kind, name)
    }

    /// `create_node` keeping a persisted identifier
    pub(crate) fn create_node_with_id(&mut self, id: SceneId, kind: NodeKind, name: &str) -> NodeKey {
        let name = Self::sanitize_name(name, kind.tag());
        let mut node = SceneNode::with_id(id, kind, name);
        if let NodeKind::PivotTransform(t) = &mut node.kind {
            t.snap_pivots = self.settings.snap_pivots;
        }
        self.insert_detached(node)
    }

    pub(crate) fn insert_detached(&mut self, node: SceneNode) -> NodeKey {
        self.nodes.insert(node)
    }

    fn register_node(&mut self, key: NodeKey) -> Result<()> {
        let node = self.node(key)?;
        let id = node.id;
        let name = node.name.clone();
        if let Some(&other) = self.ids.get(&id) {
            if other != key {
                debug_assert!(false, "duplicate id {} registered", id);
                return Err(TesseraError::DuplicateId(id.to_string()));
            }
        }
        self.ids.insert(id, key);
        let unique = self.unique_name(&name, Some(key));
        self.names.insert(unique.to_lowercase(), key);
        if unique != name {
            self.node_mut(key)?.name = unique;
        }
        Ok(())
    }

    fn unregister_node(&mut self, key: NodeKey) {
        let Some(node) = self.nodes.get_mut(key) else {
            return;
        };
        node.selected = false;
        node.highlighted = false;
        node.reactive = false;
        let id = node.id;
        let lower = node.name.to_lowercase();
        if self.ids.get(&id) == Some(&key) {
            self.ids.remove(&id);
        }
        if self.names.get(&lower) == Some(&key) {
            self.names.remove(&lower);
        }
        let before = self.selection.len();
        self.selection.retain(|k| *k != key);
        if self.selection.len() != before {
            self.raise(SceneEvent::SelectionChanged);
        }
        self.last_hidden.retain(|k| *k != key);
        if let Some((source, copy)) = self.smart_duplicate {
            if source == key || copy == key {
                self.smart_duplicate = None;
            }
        }
    }

    /// Add `key` and everything below it in the tree to the graph
    fn join_graph(&mut self, key: NodeKey) -> Result<()> {
        let subtree = self.hierarchy.subtree(key);
        for &k in &subtree {
            self.graph.add_node(k);
        }
        for &k in subtree.iter().skip(1) {
            if let Some(p) = self.hierarchy.parent(k) {
                self.graph.create_dependency(k, p)?;
            }
        }
        Ok(())
    }

    fn attach(&mut self, key: NodeKey, parent: NodeKey) -> Result<()> {
        self.hierarchy.connect_child(parent, key);
        self.graph.create_dependency(key, parent)?;
        let parent_id = self.node(parent)?.id;
        self.node_mut(key)?.parent_id = parent_id;
        Ok(())
    }

    /// Bring a node (and its subtree) into the scene.
    ///
    /// Used both for first insertion and for restoring a removed node, so
    /// redo of a removal behaves exactly like the first insertion.
    /// Hierarchy nodes without a registered parent go under the root.
    pub fn add_object(&mut self, key: NodeKey) -> Result<()> {
        if self.is_registered(key) {
            log::debug!("add_object: {:?} already in the scene", key);
            return Ok(());
        }
        let is_hierarchy = self.node(key)?.is_hierarchy();

        let subtree = if let Some(detached) = self.detached.remove(&key) {
            self.graph.insert(&detached.branch);
            if is_hierarchy {
                let parent = detached
                    .parent
                    .filter(|p| self.is_registered(*p))
                    .unwrap_or(self.root);
                self.attach(key, parent)?;
            }
            detached.branch.nodes
        } else {
            self.join_graph(key)?;
            if is_hierarchy {
                match self.hierarchy.parent(key) {
                    Some(p) if self.is_registered(p) => {
                        self.graph.create_dependency(key, p)?;
                    }
                    Some(p) => {
                        self.hierarchy.disconnect_child(p, key);
                        self.attach(key, self.root)?;
                    }
                    None => self.attach(key, self.root)?,
                }
            }
            if is_hierarchy {
                self.hierarchy.subtree(key)
            } else {
                vec![key]
            }
        };

        for &k in &subtree {
            self.register_node(k)?;
        }
        for &k in &subtree {
            self.dirty_hierarchy(k);
        }
        if !self.importing {
            for &k in &subtree {
                if !self.nodes.get(k).map(|n| n.transient).unwrap_or(true) {
                    self.raise(SceneEvent::NodeAdded(k));
                }
            }
        }
        Ok(())
    }

    /// Take a node and its subtree out of the scene.
    ///
    /// Every removed non-transient node gets one `NodeRemoving` and one
    /// `NodeRemoved` notification, root first. Like additions, removals are
    /// silent while importing.
    pub fn remove_object(&mut self, key: NodeKey) -> Result<()> {
        if key == self.root {
            return Err(TesseraError::InvalidOperation(String::from(
                "the root cannot be removed",
            )));
        }
        if !self.is_registered(key) {
            log::debug!("remove_object: {:?} is not in the scene", key);
            return Ok(());
        }
        let is_hierarchy = self.node(key)?.is_hierarchy();
        let subtree = if is_hierarchy {
            self.hierarchy.subtree(key)
        } else {
            vec![key]
        };
        let notify: Vec<NodeKey> = if self.importing {
            Vec::new()
        } else {
            subtree
                .iter()
                .copied()
                .filter(|k| !self.nodes.get(*k).map(|n| n.transient).unwrap_or(true))
                .collect()
        };

        for &k in &notify {
            self.raise(SceneEvent::NodeRemoving(k));
        }

        // Members of a layer and the old parent's bounds need another pass.
        self.dirty(key, GraphDirection::Downstream);
        let parent = self.hierarchy.parent(key);
        if let Some(p) = parent {
            self.dirty(p, GraphDirection::Upstream);
            self.hierarchy.disconnect_child(p, key);
        }

        let hierarchy = &self.hierarchy;
        let branch = self
            .graph
            .prune(key, |ancestor, descendant| hierarchy.parent(descendant) == Some(ancestor));
        debug_assert_eq!(branch.nodes.len(), subtree.len());

        for &k in &subtree {
            self.unregister_node(k);
        }
        self.detached.insert(key, DetachedBranch { branch, parent });

        for &k in &notify {
            self.raise(SceneEvent::NodeRemoved(k));
        }
        Ok(())
    }

    /// Drop the branch detached at `key`, if it is still out of the scene.
    /// Commands leaving undo history call this for the nodes they removed.
    pub fn drop_detached(&mut self, key: NodeKey) -> usize {
        if self.is_registered(key) {
            return 0;
        }
        let Some(detached) = self.detached.remove(&key) else {
            return 0;
        };
        let mut dropped = 0;
        for &k in &detached.branch.nodes {
            if self.is_registered(k) {
                continue;
            }
            self.hierarchy.forget(k);
            self.graph.remove_node(k);
            if self.nodes.remove(k).is_some() {
                dropped += 1;
            }
        }
        log::debug!("dropped detached branch of {} node(s)", dropped);
        dropped
    }

    /// Drop every node that is no longer part of the scene
    pub fn purge_detached(&mut self) -> usize {
        let garbage: Vec<NodeKey> = self
            .nodes
            .keys()
            .filter(|k| !self.is_registered(*k))
            .collect();
        for &k in &garbage {
            self.hierarchy.forget(k);
            self.graph.remove_node(k);
            self.nodes.remove(k);
        }
        self.detached.clear();
        if !garbage.is_empty() {
            log::debug!("purged {} detached node(s)", garbage.len());
        }
        garbage.len()
    }

    // ------------------------------------------------------------------
    // Parenting
    // ------------------------------------------------------------------

    /// Move `key` under `parent`.
    ///
    /// `None` detaches a node that is not yet part of the scene; a registered
    /// node is moved under the root instead, so it stays reachable.
    /// Returns `Ok(false)` when nothing changed: same parent, or a
    /// parent-changing listener vetoed the move.
    pub fn set_parent(&mut self, key: NodeKey, parent: Option<NodeKey>) -> Result<bool> {
        self.reparent(key, parent, None)
    }

    pub(crate) fn reparent(
        &mut self,
        key: NodeKey,
        new_parent: Option<NodeKey>,
        hints: Option<(Option<NodeKey>, Option<NodeKey>)>,
    ) -> Result<bool> {
        let node_kind = self.node(key)?.tag();
        if !node_kind.is_hierarchy() {
            return Err(TesseraError::InvalidOperation(format!(
                "{} nodes are not part of the hierarchy",
                node_kind
            )));
        }
        if key == self.root {
            return Err(TesseraError::InvalidOperation(String::from(
                "the root cannot be reparented",
            )));
        }

        let new_parent = match new_parent {
            None if self.is_registered(key) => Some(self.root),
            other => other,
        };
        let old_parent = self.hierarchy.parent(key);
        if old_parent == new_parent {
            return Ok(false);
        }

        let new_parent_kind = match new_parent {
            Some(p) => {
                let kind = self.node(p)?.tag();
                if !kind.is_hierarchy() {
                    return Err(TesseraError::InvalidHierarchy(format!(
                        "a {} cannot be a parent",
                        kind
                    )));
                }
                if p == key || self.hierarchy.is_ancestor(key, p) {
                    return Err(TesseraError::InvalidHierarchy(format!(
                        "{} cannot be parented under its own descendant",
                        self.node(key)?.name
                    )));
                }
                Some(kind)
            }
            None => None,
        };

        let args = ParentChangingArgs {
            node: key,
            node_kind,
            old_parent,
            old_parent_kind: old_parent.and_then(|p| self.nodes.get(p)).map(|n| n.tag()),
            new_parent,
            new_parent_kind,
        };
        if let ParentVerdict::Deny(reason) = self.parent_changing(&args) {
            log::info!("reparent of {:?} vetoed: {}", key, reason);
            self.status(reason);
            return Ok(false);
        }

        if let Some(p) = new_parent {
            if self.graph.contains(p) && !self.graph.contains(key) {
                self.join_graph(key)?;
            }
        }

        if let Some(o) = old_parent {
            self.graph.remove_dependency(key, o);
            self.dirty(o, GraphDirection::Upstream);
        }
        if let Some(p) = new_parent {
            if self.graph.contains(p) && self.graph.contains(key) {
                if let Err(err) = self.graph.create_dependency(key, p) {
                    if let Some(o) = old_parent {
                        self.graph.create_dependency(key, o)?;
                    }
                    return Err(err);
                }
            }
        }

        if let Some(o) = old_parent {
            self.hierarchy.disconnect_child(o, key);
        }
        if let Some((previous, next)) = hints {
            self.hierarchy.set_hints(key, previous, next);
        }
        let parent_id = match new_parent {
            Some(p) => {
                self.hierarchy.connect_child(p, key);
                self.node(p)?.id
            }
            None => SceneId::NULL,
        };
        self.node_mut(key)?.parent_id = parent_id;

        self.invalidate_paths(key);
        self.dirty_hierarchy(key);
        self.raise(SceneEvent::ParentChanged {
            node: key,
            old_parent,
        });
        Ok(true)
    }

    /// The shared parent of `nodes`, or the root when they differ
    pub fn common_parent(&self, nodes: &[NodeKey]) -> NodeKey {
        let mut parents = nodes.iter().map(|k| self.hierarchy.parent(*k));
        match parents.next().flatten() {
            Some(first) if parents.all(|p| p == Some(first)) => first,
            _ => self.root,
        }
    }

    /// Distinct parents of `nodes`, in first-seen order
    pub fn common_parents(&self, nodes: &[NodeKey]) -> Vec<NodeKey> {
        let mut out = Vec::new();
        for &k in nodes {
            if let Some(p) = self.hierarchy.parent(k) {
                if !out.contains(&p) {
                    out.push(p);
                }
            }
        }
        out
    }

    // ------------------------------------------------------------------
    // Dirty marking
    // ------------------------------------------------------------------

    pub(crate) fn dirty(&mut self, key: NodeKey, direction: GraphDirection) -> u32 {
        self.graph.dirty_node(key, direction)
    }

    /// Hierarchy nodes affect both passes; layers only feed members downstream
    pub(crate) fn dirty_hierarchy(&mut self, key: NodeKey) -> u32 {
        let is_hierarchy = self.nodes.get(key).map(|n| n.is_hierarchy()).unwrap_or(false);
        let mut count = self.dirty(key, GraphDirection::Downstream);
        if is_hierarchy {
            count += self.dirty(key, GraphDirection::Upstream);
        }
        count
    }

    // ------------------------------------------------------------------
    // Simple node state
    // ------------------------------------------------------------------

    pub fn set_hidden(&mut self, key: NodeKey, hidden: bool) -> Result<()> {
        let node = self.node_mut(key)?;
        if node.hidden == hidden {
            return Ok(());
        }
        node.hidden = hidden;
        self.dirty(key, GraphDirection::Downstream);
        Ok(())
    }

    /// Transient state applies to the whole subtree
    pub fn set_transient(&mut self, key: NodeKey, transient: bool) -> Result<()> {
        self.node(key)?;
        for k in self.hierarchy.subtree(key) {
            if let Some(node) = self.nodes.get_mut(k) {
                node.transient = transient;
            }
        }
        Ok(())
    }

    pub fn set_live(&mut self, key: NodeKey, live: bool) -> Result<()> {
        self.node_mut(key)?.live = live;
        Ok(())
    }

    pub fn set_highlighted(&mut self, key: NodeKey, highlighted: bool) -> Result<()> {
        self.node_mut(key)?.highlighted = highlighted;
        Ok(())
    }

    pub fn is_selected(&self, key: NodeKey) -> bool {
        self.nodes.get(key).map(|n| n.selected).unwrap_or(false)
    }

    pub fn is_highlighted(&self, key: NodeKey) -> bool {
        self.nodes.get(key).map(|n| n.highlighted).unwrap_or(false)
    }

    // ------------------------------------------------------------------
    // Selection
    // ------------------------------------------------------------------

    pub fn selection(&self) -> &[NodeKey] {
        &self.selection
    }

    /// Replace the selection, returning the previous one
    pub(crate) fn apply_selection(&mut self, keys: Vec<NodeKey>) -> Vec<NodeKey> {
        let mut selection = Vec::with_capacity(keys.len());
        for k in keys {
            if k != self.root && self.is_registered(k) && !selection.contains(&k) {
                selection.push(k);
            }
        }

        let previous = std::mem::replace(&mut self.selection, selection);
        for &k in &previous {
            for r in self.hierarchy.subtree(k) {
                if let Some(node) = self.nodes.get_mut(r) {
                    node.selected = false;
                    node.reactive = false;
                }
            }
        }
        let current = self.selection.clone();
        for &k in &current {
            for r in self.hierarchy.subtree(k).into_iter().skip(1) {
                if let Some(node) = self.nodes.get_mut(r) {
                    node.reactive = true;
                }
            }
        }
        for &k in &current {
            if let Some(node) = self.nodes.get_mut(k) {
                node.selected = true;
            }
        }
        if previous != current {
            self.raise(SceneEvent::SelectionChanged);
        }
        previous
    }

    /// Selected hierarchy nodes that have no selected ancestor
    pub fn selection_parents(&self) -> Vec<NodeKey> {
        self.selection
            .iter()
            .copied()
            .filter(|k| self.nodes.get(*k).map(|n| n.is_hierarchy()).unwrap_or(false))
            .filter(|k| {
                !self
                    .selection
                    .iter()
                    .any(|other| self.hierarchy.is_ancestor(*other, *k))
            })
            .collect()
    }

    // ------------------------------------------------------------------
    // Undo history and the editable gate
    // ------------------------------------------------------------------

    /// False while importing, while an edit lock is held, or when the
    /// settings mark the scene read-only
    pub fn is_editable(&self) -> bool {
        !self.importing && self.edit_locks == 0 && !self.settings.read_only
    }

    fn ensure_editable(&self, action: &str) -> Result<()> {
        if self.is_editable() {
            return Ok(());
        }
        let reason = if self.importing {
            "an import is in progress"
        } else if self.settings.read_only {
            "the scene is read-only"
        } else {
            "editing is locked"
        };
        log::warn!("refusing {}: {}", action, reason);
        Err(TesseraError::NotEditable(format!("cannot {}: {}", action, reason)))
    }

    /// Hold off significant edits (e.g. while saving)
    pub fn lock_editing(&mut self) {
        self.edit_locks += 1;
    }

    pub fn unlock_editing(&mut self) {
        self.edit_locks = self.edit_locks.saturating_sub(1);
    }

    /// Record an already-applied command.
    ///
    /// A significant command pushed while the scene is not editable is undone
    /// on the spot and `false` is returned.
    pub fn push(&mut self, mut command: SceneCommand) -> bool {
        if command.is_significant() && !self.is_editable() {
            log::warn!("rejecting '{}': scene is not editable", command.description());
            if let Err(err) = command.undo(self) {
                log::error!("rollback of '{}' failed: {}", command.description(), err);
            }
            self.status(format!("Cannot {}: the scene is not editable", command.description()));
            if let Err(err) = self.evaluate(true) {
                log::error!("evaluation after rollback failed: {}", err);
            }
            return false;
        }
        for mut dropped in self.undo_queue.push(command) {
            dropped.discard(self);
        }
        if let Err(err) = self.execute(false) {
            log::error!("evaluation after edit failed: {}", err);
        }
        true
    }

    /// `push` for operations that may have had nothing to do
    pub fn push_opt(&mut self, command: Option<SceneCommand>) -> bool {
        match command {
            Some(command) => self.push(command),
            None => false,
        }
    }

    /// Undo the last command. History cannot move while the scene is not
    /// editable.
    pub fn undo(&mut self) -> Result<bool> {
        self.ensure_editable("undo")?;
        let Some(mut command) = self.undo_queue.take_undo() else {
            return Ok(false);
        };
        if let Err(err) = command.undo(self) {
            log::error!("undo of '{}' failed: {}", command.description(), err);
            self.undo_queue.finish_redo(command);
            return Err(err);
        }
        self.undo_queue.finish_undo(command);
        self.execute(false)?;
        Ok(true)
    }

    pub fn redo(&mut self) -> Result<bool> {
        self.ensure_editable("redo")?;
        let Some(mut command) = self.undo_queue.take_redo() else {
            return Ok(false);
        };
        if let Err(err) = command.redo(self) {
            log::error!("redo of '{}' failed: {}", command.description(), err);
            self.undo_queue.finish_undo(command);
            return Err(err);
        }
        self.undo_queue.finish_redo(command);
        self.execute(false)?;
        Ok(true)
    }

    pub fn can_undo(&self) -> bool {
        self.undo_queue.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.undo_queue.can_redo()
    }

    pub fn undo_description(&self) -> Option<&str> {
        self.undo_queue.undo_description()
    }

    /// Forget history; nodes only reachable from it are dropped too
    pub fn clear_undo(&mut self) {
        self.undo_queue.clear();
        self.purge_detached();
    }

    /// Empty the scene down to its root and forget history
    pub fn reset(&mut self) -> Result<()> {
        let top = self.children(self.root).to_vec();
        for key in top.into_iter().chain(self.layers()) {
            self.remove_object(key)?;
        }
        self.last_hidden.clear();
        self.smart_duplicate = None;
        self.remapped_ids.clear();
        self.clear_undo();
        self.evaluate(true)?;
        Ok(())
    }

    /// Evaluate and tell listeners an edit finished
    pub fn execute(&mut self, interactive: bool) -> Result<()> {
        self.evaluate(false)?;
        self.raise(SceneEvent::Executed { interactive });
        Ok(())
    }

    // ------------------------------------------------------------------
    // Queries for render and pick passes
    // ------------------------------------------------------------------

    /// Depth-first walk from `start` with a three-way visitor result
    pub fn traverse_hierarchy<V>(&self, start: NodeKey, visitor: &mut V) -> TraversalAction
    where
        V: HierarchyVisitor + ?Sized,
    {
        let hierarchy = &self.hierarchy;
        hierarchy.traverse(start, &mut |k| visitor.visit(self, k))
    }

    /// Display color given the node's state and the scene's color mode
    pub fn material_color(&self, key: NodeKey, default: Color) -> Color {
        let Some(node) = self.nodes.get(key) else {
            return default;
        };
        if node.selected {
            return Color::SELECTED;
        }
        if node.highlighted {
            return Color::HIGHLIGHTED;
        }
        if node.reactive {
            return Color::REACTIVE;
        }
        if node.live {
            return Color::LIVE;
        }
        if !node.selectable {
            return Color::UNSELECTABLE;
        }
        match self.settings.color_mode {
            ViewColorMode::Layer => self
                .layers_of(key)
                .first()
                .and_then(|l| self.nodes.get(*l))
                .and_then(|l| l.kind.layer_data())
                .map(|l| l.color)
                .unwrap_or(default),
            ViewColorMode::Type => kind_color(node.tag()),
            ViewColorMode::Scene => self.settings.scene_color(),
        }
    }

    /// Check graph symmetry/acyclicity, the sibling chains, and that every
    /// tree edge is mirrored by a dependency edge
    pub fn validate(&self) -> Result<()> {
        self.graph.validate()?;
        self.hierarchy.validate()?;
        for &key in self.ids.values() {
            let Some(node) = self.nodes.get(key) else {
                return Err(TesseraError::NodeNotFound(format!("{:?}", key)));
            };
            if !self.graph.contains(key) {
                return Err(TesseraError::InvalidHierarchy(format!(
                    "{} is registered but not in the graph",
                    node.name
                )));
            }
            if key == self.root || !node.is_hierarchy() {
                continue;
            }
            match self.hierarchy.parent(key) {
                Some(p) if self.is_registered(p) => {
                    if !self.graph.has_dependency(key, p) {
                        return Err(TesseraError::InvalidHierarchy(format!(
                            "{} has no dependency on its parent",
                            node.name
                        )));
                    }
                }
                _ => {
                    return Err(TesseraError::InvalidHierarchy(format!(
                        "{} has no registered parent",
                        node.name
                    )))
                }
            }
        }
        Ok(())
    }
}

fn kind_color(tag: NodeKindTag) -> Color {
    match tag {
        NodeKindTag::Transform | NodeKindTag::PivotTransform => Color::from_hex(0xB0B0B0),
        NodeKindTag::Locator => Color::from_hex(0x40C040),
        NodeKindTag::Curve | NodeKindTag::CurvePoint => Color::from_hex(0x4080FF),
        NodeKindTag::Layer => Color::WHITE,
    }
}

/// Split a trailing number off a name: `group12` -> (`group`, Some(12))
pub(crate) fn split_name(name: &str) -> (&str, Option<u64>) {
    let digits = name.chars().rev().take_while(|c| c.is_ascii_digit()).count();
    if digits == 0 || digits == name.len() {
        return (name, None);
    }
    let (base, number) = name.split_at(name.len() - digits);
    match number.parse() {
        Ok(n) => (base, Some(n)),
        Err(_) => (name, None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn scene_with(names: &[&str]) -> (Scene, Vec<NodeKey>) {
        let mut scene = Scene::new();
        let keys = names
            .iter()
            .map(|n| {
                let k = scene.create_node(NodeKind::transform(), n);
                scene.add_object(k).unwrap();
                k
            })
            .collect();
        (scene, keys)
    }

    fn record_events(scene: &mut Scene) -> Rc<RefCell<Vec<SceneEvent>>> {
        let events = Rc::new(RefCell::new(Vec::new()));
        let sink = events.clone();
        scene.add_listener(move |e| sink.borrow_mut().push(e.clone()));
        events
    }

    #[test]
    fn test_split_name() {
        assert_eq!(split_name("group12"), ("group", Some(12)));
        assert_eq!(split_name("group"), ("group", None));
        assert_eq!(split_name("123"), ("123", None));
    }

    #[test]
    fn test_new_nodes_go_under_root() {
        let (scene, keys) = scene_with(&["a", "b"]);
        assert_eq!(scene.children(scene.root()), &keys[..]);
        assert!(scene.graph().has_dependency(keys[0], scene.root()));
        assert_eq!(scene.node(keys[0]).unwrap().parent_id(), scene.node(scene.root()).unwrap().id());
        scene.validate().unwrap();
    }

    #[test]
    fn test_names_are_unique() {
        let (mut scene, keys) = scene_with(&["box", "box", "Box", "box7"]);
        assert_eq!(scene.node(keys[0]).unwrap().name(), "box");
        assert_eq!(scene.node(keys[1]).unwrap().name(), "box1");
        assert_eq!(scene.node(keys[2]).unwrap().name(), "Box2");
        assert_eq!(scene.node(keys[3]).unwrap().name(), "box7");

        assert_eq!(scene.rename(keys[0], "box7").unwrap(), "box8");
        assert_eq!(scene.find_by_name("BOX8"), Some(keys[0]));
        assert_eq!(scene.find_by_name("box"), None);
        assert_eq!(scene.rename(keys[1], "  my node! ").unwrap(), "my_node_");
        assert!(scene.rename(scene.root(), "other").is_err());
        assert!(matches!(
            scene.rename(keys[2], "   "),
            Err(TesseraError::InvalidName(_))
        ));
        assert_eq!(scene.node(keys[2]).unwrap().name(), "Box2");
    }

    #[test]
    fn test_set_parent_keeps_tree_and_graph_in_step() {
        let (mut scene, k) = scene_with(&["a", "b", "c"]);
        assert!(scene.set_parent(k[1], Some(k[0])).unwrap());
        assert!(scene.set_parent(k[2], Some(k[0])).unwrap());
        assert!(!scene.set_parent(k[2], Some(k[0])).unwrap());

        assert_eq!(scene.children(k[0]), &[k[1], k[2]]);
        assert_eq!(scene.hierarchy().next(k[1]), Some(k[2]));
        assert_eq!(scene.hierarchy().previous(k[2]), Some(k[1]));
        assert!(scene.graph().has_dependency(k[1], k[0]));
        assert!(!scene.graph().has_dependency(k[1], scene.root()));
        assert_eq!(scene.path(k[2]), "|a|c");
        assert_eq!(scene.find_by_path("|A|c"), Some(k[2]));
        scene.validate().unwrap();
    }

    #[test]
    fn test_set_parent_rejects_cycles() {
        let (mut scene, k) = scene_with(&["a", "b"]);
        scene.set_parent(k[1], Some(k[0])).unwrap();
        assert!(matches!(
            scene.set_parent(k[0], Some(k[1])),
            Err(TesseraError::InvalidHierarchy(_))
        ));
        assert!(scene.set_parent(k[0], Some(k[0])).is_err());
        assert!(scene.set_parent(scene.root(), Some(k[0])).is_err());
        scene.validate().unwrap();
    }

    #[test]
    fn test_unparenting_a_registered_node_moves_it_to_root() {
        let (mut scene, k) = scene_with(&["a", "b"]);
        scene.set_parent(k[1], Some(k[0])).unwrap();

        assert!(scene.set_parent(k[1], None).unwrap());
        assert_eq!(scene.parent(k[1]), Some(scene.root()));
        assert!(!scene.set_parent(k[0], None).unwrap());
        assert!(scene.is_registered(k[1]));
        assert_eq!(scene.path(k[1]), "|b");
        scene.validate().unwrap();
        assert_eq!(scene.export().nodes.len(), 2);

        let loose = scene.create_node(NodeKind::transform(), "loose");
        scene.set_parent(loose, Some(k[0])).unwrap();
        assert!(scene.set_parent(loose, None).unwrap());
        assert_eq!(scene.parent(loose), None);
    }

    #[test]
    fn test_path_cache_invalidated() {
        let (mut scene, k) = scene_with(&["a", "b"]);
        scene.set_parent(k[1], Some(k[0])).unwrap();
        assert_eq!(scene.path(k[1]), "|a|b");
        scene.rename(k[0], "top").unwrap();
        assert_eq!(scene.path(k[1]), "|top|b");
        scene.set_parent(k[1], Some(scene.root())).unwrap();
        assert_eq!(scene.path(k[1]), "|b");
    }

    #[test]
    fn test_parent_changing_veto() {
        let (mut scene, k) = scene_with(&["a", "b"]);
        let events = record_events(&mut scene);
        let locked = k[1];
        let id = scene.add_parent_changing_listener(move |args| {
            if args.node == locked {
                ParentVerdict::Deny("locked".into())
            } else {
                ParentVerdict::Allow
            }
        });
        assert!(!scene.set_parent(k[1], Some(k[0])).unwrap());
        assert_eq!(scene.parent(k[1]), Some(scene.root()));
        assert!(events
            .borrow()
            .iter()
            .any(|e| matches!(e, SceneEvent::StatusChanged(s) if s == "locked")));

        assert!(scene.remove_parent_changing_listener(id));
        assert!(scene.set_parent(k[1], Some(k[0])).unwrap());
    }

    #[test]
    fn test_curve_points_stay_on_their_curve() {
        let mut scene = Scene::new();
        let curve = scene.create_node(NodeKind::curve(false), "curve");
        scene.add_object(curve).unwrap();
        let point = scene.create_node(NodeKind::curve_point(Vec3::ZERO), "point");
        scene.add_object(point).unwrap();
        assert!(scene.set_parent(point, Some(curve)).unwrap());
        assert!(!scene.set_parent(point, Some(scene.root())).unwrap());
        assert_eq!(scene.parent(point), Some(curve));
    }

    #[test]
    fn test_detached_node_auto_joins_graph() {
        let (mut scene, k) = scene_with(&["a"]);
        let child = scene.create_node(NodeKind::transform(), "child");
        let grandchild = scene.create_node(NodeKind::transform(), "grandchild");
        scene.set_parent(grandchild, Some(child)).unwrap();
        assert!(!scene.graph().contains(child));

        scene.set_parent(child, Some(k[0])).unwrap();
        assert!(scene.graph().contains(child));
        assert!(scene.graph().has_dependency(grandchild, child));
        assert!(!scene.is_registered(child));

        scene.add_object(child).unwrap();
        assert!(scene.is_registered(grandchild));
        assert_eq!(scene.parent(child), Some(k[0]));
        scene.validate().unwrap();
    }

    #[test]
    fn test_remove_subtree_notifies_once_per_node() {
        let (mut scene, k) = scene_with(&["a", "b", "c", "temp"]);
        scene.set_parent(k[1], Some(k[0])).unwrap();
        scene.set_parent(k[2], Some(k[1])).unwrap();
        scene.set_parent(k[3], Some(k[1])).unwrap();
        scene.set_transient(k[3], true).unwrap();
        let events = record_events(&mut scene);

        scene.remove_object(k[0]).unwrap();
        let removed: Vec<NodeKey> = events
            .borrow()
            .iter()
            .filter_map(|e| match e {
                SceneEvent::NodeRemoved(n) => Some(*n),
                _ => None,
            })
            .collect();
        let removing = events
            .borrow()
            .iter()
            .filter(|e| matches!(e, SceneEvent::NodeRemoving(_)))
            .count();
        assert_eq!(removed, vec![k[0], k[1], k[2]]);
        assert_eq!(removing, 3);

        for key in &k {
            assert!(!scene.graph().contains(*key));
            assert!(!scene.is_registered(*key));
        }
        assert!(scene.children(scene.root()).is_empty());
        scene.validate().unwrap();
    }

    #[test]
    fn test_remove_then_add_restores_position_and_edges() {
        let (mut scene, k) = scene_with(&["a", "b", "c"]);
        let layer = scene.create_node(NodeKind::layer(), "layer");
        scene.add_object(layer).unwrap();
        scene.join_layer(k[1], layer).unwrap();

        scene.remove_object(k[1]).unwrap();
        assert_eq!(scene.children(scene.root()), &[k[0], k[2]]);
        assert!(scene.graph().descendants(layer).is_empty());

        scene.add_object(k[1]).unwrap();
        assert_eq!(scene.children(scene.root()), &[k[0], k[1], k[2]]);
        assert!(scene.graph().has_dependency(k[1], layer));
        assert_eq!(scene.find_by_name("b"), Some(k[1]));
        scene.validate().unwrap();
    }

    #[test]
    fn test_removing_a_layer_keeps_members() {
        let (mut scene, k) = scene_with(&["a"]);
        let layer = scene.create_node(NodeKind::layer(), "layer");
        scene.add_object(layer).unwrap();
        scene.join_layer(k[0], layer).unwrap();
        scene.remove_object(layer).unwrap();
        assert!(scene.is_registered(k[0]));
        assert!(scene.graph().ancestors(k[0]).iter().all(|a| *a != layer));
        scene.validate().unwrap();
    }

    #[test]
    fn test_purge_detached() {
        let (mut scene, k) = scene_with(&["a", "b"]);
        scene.remove_object(k[0]).unwrap();
        let orphan = scene.create_node(NodeKind::transform(), "never_added");
        assert_eq!(scene.purge_detached(), 2);
        assert!(scene.get(k[0]).is_none());
        assert!(scene.get(orphan).is_none());
        assert!(scene.get(k[1]).is_some());
        scene.validate().unwrap();
    }

    #[test]
    fn test_history_eviction_drops_detached_branches() {
        use crate::commands::SceneNodeExistenceCommand;

        let mut scene = Scene::with_settings(SceneSettings {
            undo_depth: 1,
            ..SceneSettings::default()
        });
        let a = scene.create_node(NodeKind::transform(), "a");
        let b = scene.create_node(NodeKind::transform(), "b");
        scene.add_object(a).unwrap();
        scene.add_object(b).unwrap();
        scene.set_parent(b, Some(a)).unwrap();
        let keep = scene.create_node(NodeKind::transform(), "keep");
        scene.add_object(keep).unwrap();

        let command = SceneNodeExistenceCommand::remove(&mut scene, a).unwrap();
        assert!(scene.push(command));
        assert!(scene.detached.contains_key(&a));

        // evicting the removal releases its branch
        let command = SceneNodeExistenceCommand::remove(&mut scene, keep).unwrap();
        assert!(scene.push(command));
        assert!(scene.get(a).is_none());
        assert!(scene.get(b).is_none());
        assert!(!scene.detached.contains_key(&a));
        assert!(scene.detached.contains_key(&keep));
        scene.validate().unwrap();

        // an undone removal is back in the scene when redo history is cleared
        assert!(scene.undo().unwrap());
        assert!(scene.is_registered(keep));
        let c = scene.create_node(NodeKind::transform(), "c");
        let command = SceneNodeExistenceCommand::add(&mut scene, c).unwrap();
        assert!(scene.push(command));
        assert!(scene.is_registered(keep));
        assert!(scene.get(keep).is_some());
        scene.validate().unwrap();

        // an undone addition is dropped along with the redo stack
        assert!(scene.undo().unwrap());
        assert!(!scene.is_registered(c));
        let command = SceneNodeExistenceCommand::remove(&mut scene, keep).unwrap();
        assert!(scene.push(command));
        assert!(scene.get(c).is_none());
        assert!(scene.detached.contains_key(&keep));
        scene.validate().unwrap();
    }

    #[test]
    fn test_selection_flags() {
        let (mut scene, k) = scene_with(&["a", "b"]);
        scene.set_parent(k[1], Some(k[0])).unwrap();
        scene.apply_selection(vec![k[0], k[1], k[0], scene.root()]);
        assert_eq!(scene.selection(), &[k[0], k[1]]);
        assert_eq!(scene.selection_parents(), vec![k[0]]);
        assert!(scene.is_selected(k[0]));
        assert!(scene.node(k[1]).unwrap().is_reactive());

        scene.apply_selection(Vec::new());
        assert!(!scene.is_selected(k[0]));
        assert!(!scene.node(k[1]).unwrap().is_reactive());
    }

    #[test]
    fn test_common_parent() {
        let (mut scene, k) = scene_with(&["a", "b", "c"]);
        scene.set_parent(k[1], Some(k[0])).unwrap();
        scene.set_parent(k[2], Some(k[0])).unwrap();
        assert_eq!(scene.common_parent(&[k[1], k[2]]), k[0]);
        assert_eq!(scene.common_parent(&[k[0], k[1]]), scene.root());
        assert_eq!(scene.common_parents(&[k[0], k[1], k[2]]), vec![scene.root(), k[0]]);
    }

    #[test]
    fn test_traverse_hierarchy_visitor() {
        let (mut scene, k) = scene_with(&["a", "b", "c"]);
        scene.set_parent(k[1], Some(k[0])).unwrap();
        let mut names = Vec::new();
        scene.traverse_hierarchy(scene.root(), &mut |s: &Scene, n: NodeKey| {
            names.push(s.node(n).unwrap().name().to_string());
            TraversalAction::Continue
        });
        assert_eq!(names, vec!["root", "a", "b", "c"]);
    }

    #[test]
    fn test_material_color_states() {
        let (mut scene, k) = scene_with(&["a"]);
        scene.evaluate(true).unwrap();
        let default = Color::new(0.1, 0.2, 0.3, 1.0);
        assert_eq!(scene.material_color(k[0], default), default);
        scene.set_highlighted(k[0], true).unwrap();
        assert_eq!(scene.material_color(k[0], default), Color::HIGHLIGHTED);
        scene.apply_selection(vec![k[0]]);
        assert_eq!(scene.material_color(k[0], default), Color::SELECTED);
    }
}
