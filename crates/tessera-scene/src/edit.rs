//! Selection-driven editing operations
//!
//! Each operation applies its change immediately and returns the command
//! that reverts it, or `None` when there was nothing to do. Callers record
//! the command with `Scene::push`.

use crate::commands::{
    self, ParentCommand, SceneCommand, SceneNodeExistenceCommand, SelectionCommand,
};
use crate::node::{NodeKey, NodeKind};
use crate::scene::Scene;
use glam::Mat4;
use tessera_core::Result;
use tessera_undo::BatchUndoCommand;

impl Scene {
    /// Put the selected nodes under a new group.
    ///
    /// The group goes under the nodes' common parent (or the root) and sits
    /// at the world position of the last selected node.
    pub fn group_selected(&mut self) -> Result<Option<SceneCommand>> {
        let nodes = self.selection_parents();
        let Some(&last) = nodes.last() else {
            return Ok(None);
        };
        let parent = self.common_parent(&nodes);
        let translation = self.global_transform(last).w_axis.truncate();

        let mut batch = BatchUndoCommand::new().with_description("Group");
        let group = self.create_node(NodeKind::group(), "group1");
        self.set_parent(group, Some(parent))?;
        self.set_global_transform(group, Mat4::from_translation(translation))?;
        batch.push(SceneNodeExistenceCommand::add(self, group)?);

        for &node in &nodes {
            batch.push_opt(ParentCommand::apply(self, node, Some(group))?);
        }
        batch.push(SelectionCommand::apply(self, vec![group]));
        log::debug!("grouped {} node(s)", nodes.len());
        Ok(batch.into_command())
    }

    /// Dissolve selected groups, moving their children up one level
    pub fn ungroup_selected(&mut self) -> Result<Option<SceneCommand>> {
        let groups: Vec<NodeKey> = self
            .selection_parents()
            .into_iter()
            .filter(|k| matches!(self.nodes.get(*k).map(|n| &n.kind), Some(NodeKind::PivotTransform(_))))
            .collect();
        if groups.is_empty() {
            return Ok(None);
        }

        let mut batch = BatchUndoCommand::new().with_description("Ungroup");
        let mut released = Vec::new();
        for group in groups {
            let parent = self.parent(group).unwrap_or(self.root);
            let children = self.children(group).to_vec();
            for child in children {
                if let Some(command) = ParentCommand::apply(self, child, Some(parent))? {
                    batch.push(command);
                    released.push(child);
                }
            }
            if self.children(group).is_empty() {
                batch.push(SceneNodeExistenceCommand::remove(self, group)?);
            }
        }
        batch.push(SelectionCommand::apply(self, released));
        Ok(batch.into_command())
    }

    /// Parent the selection under the last selected node
    pub fn parent_selected(&mut self) -> Result<Option<SceneCommand>> {
        let Some((&parent, others)) = self.selection.split_last() else {
            return Ok(None);
        };
        let others = others.to_vec();
        let mut batch = BatchUndoCommand::new().with_description("Parent");
        for node in others {
            if !self.node(node)?.is_hierarchy() || self.hierarchy.is_ancestor(node, parent) {
                log::debug!("parent_selected: skipping {:?}", node);
                continue;
            }
            batch.push_opt(ParentCommand::apply(self, node, Some(parent))?);
        }
        Ok(batch.into_command())
    }

    /// Move the selection directly under the root
    pub fn unparent_selected(&mut self) -> Result<Option<SceneCommand>> {
        let nodes = self.selection_parents();
        let root = self.root;
        let mut batch = BatchUndoCommand::new().with_description("Unparent");
        for node in nodes {
            batch.push_opt(ParentCommand::apply(self, node, Some(root))?);
        }
        Ok(batch.into_command())
    }

    /// Copy `key` and its subtree.
    ///
    /// The copy gets fresh ids and joins the graph with the same
    /// non-hierarchy dependencies as the source; copied children are
    /// parented under the copy. The copy itself has no parent and is not yet
    /// part of the scene.
    pub fn duplicate(&mut self, key: NodeKey) -> Result<NodeKey> {
        let copy = self.node(key)?.duplicate();
        let duplicate = self.insert_detached(copy);
        self.graph.add_node(duplicate);

        let parent = self.hierarchy.parent(key);
        let ancestors: Vec<NodeKey> = self
            .graph
            .ancestors(key)
            .iter()
            .copied()
            .filter(|a| Some(*a) != parent)
            .collect();
        for ancestor in ancestors {
            self.graph.create_dependency(duplicate, ancestor)?;
        }
        let descendants: Vec<NodeKey> = self
            .graph
            .descendants(key)
            .iter()
            .copied()
            .filter(|d| self.hierarchy.parent(*d) != Some(key))
            .collect();
        for descendant in descendants {
            self.graph.create_dependency(descendant, duplicate)?;
        }

        for child in self.children(key).to_vec() {
            let child_copy = self.duplicate(child)?;
            self.set_parent(child_copy, Some(duplicate))?;
        }
        Ok(duplicate)
    }

    /// Duplicate the selection next to their sources and select the copies
    pub fn duplicate_selected(&mut self) -> Result<Option<SceneCommand>> {
        let sources = self.selection_parents();
        if sources.is_empty() {
            return Ok(None);
        }

        let mut batch = BatchUndoCommand::new().with_description("Duplicate");
        let mut copies = Vec::with_capacity(sources.len());
        for &source in &sources {
            let copy = self.duplicate(source)?;
            let parent = self.parent(source);
            let hints = (Some(source), self.hierarchy.next(source));
            self.reparent(copy, parent, Some(hints))?;
            batch.push(SceneNodeExistenceCommand::add(self, copy)?);
            copies.push(copy);
        }

        self.smart_duplicate = match (sources.as_slice(), copies.as_slice()) {
            ([source], [copy]) => Some((*source, *copy)),
            _ => None,
        };
        batch.push(SelectionCommand::apply(self, copies));
        Ok(batch.into_command())
    }

    /// Duplicate again, applying the offset between the last copy and its
    /// source. Falls back to a plain duplicate when there is no such pair.
    pub fn smart_duplicate_selected(&mut self) -> Result<Option<SceneCommand>> {
        let pair = self
            .smart_duplicate
            .filter(|(source, copy)| {
                self.is_registered(*source)
                    && self.is_registered(*copy)
                    && self.selection == [*copy]
                    && self.node(*copy).map(|n| n.transform().is_some()).unwrap_or(false)
            });
        let Some((source, last)) = pair else {
            return self.duplicate_selected();
        };

        let last_global = self.global_transform(last);
        let offset = last_global * self.inverse_global_transform(source);

        let mut batch = BatchUndoCommand::new().with_description("Smart Duplicate");
        let copy = self.duplicate(last)?;
        let hints = (Some(last), self.hierarchy.next(last));
        self.reparent(copy, self.parent(last), Some(hints))?;
        self.set_global_transform(copy, offset * last_global)?;
        batch.push(SceneNodeExistenceCommand::add(self, copy)?);
        batch.push(SelectionCommand::apply(self, vec![copy]));
        self.smart_duplicate = Some((last, copy));
        Ok(batch.into_command())
    }

    pub fn delete_selected(&mut self) -> Result<Option<SceneCommand>> {
        let mut nodes = self.selection_parents();
        nodes.extend(
            self.selection
                .iter()
                .copied()
                .filter(|k| self.nodes.get(*k).map(|n| !n.is_hierarchy()).unwrap_or(false)),
        );
        if nodes.is_empty() {
            return Ok(None);
        }

        let mut batch = BatchUndoCommand::new().with_description("Delete");
        batch.push(SelectionCommand::apply(self, Vec::new()));
        for node in nodes {
            batch.push(SceneNodeExistenceCommand::remove(self, node)?);
        }
        Ok(batch.into_command())
    }

    /// Move each selected node's origin to the centre of its content
    pub fn center_selected(&mut self) -> Result<Option<SceneCommand>> {
        let nodes: Vec<NodeKey> = self
            .selection
            .iter()
            .copied()
            .filter(|k| self.nodes.get(*k).map(|n| n.transform().is_some()).unwrap_or(false))
            .collect();
        let mut batch = BatchUndoCommand::new().with_description("Center");
        for node in nodes {
            batch.push(self.center_transform(node)?);
        }
        Ok(batch.into_command())
    }

    fn set_hidden_many(&mut self, nodes: &[NodeKey], hidden: bool) -> Result<Option<SceneCommand>> {
        let mut batch = BatchUndoCommand::new().with_description(if hidden { "Hide" } else { "Show" });
        for &node in nodes {
            if self.node(node)?.is_hidden() == hidden {
                continue;
            }
            batch.push(commands::hidden_command(self, node)?);
            self.set_hidden(node, hidden)?;
        }
        Ok(batch.into_command())
    }

    pub fn set_hidden_selected(&mut self, hidden: bool) -> Result<Option<SceneCommand>> {
        let nodes = self.selection.clone();
        let command = self.set_hidden_many(&nodes, hidden)?;
        if hidden && command.is_some() {
            self.last_hidden = nodes;
        }
        Ok(command)
    }

    /// Hide (or show) everything not above or below the selection
    pub fn set_hidden_unrelated(&mut self, hidden: bool) -> Result<Option<SceneCommand>> {
        let selection = self.selection.clone();
        if selection.is_empty() {
            return Ok(None);
        }
        let related = |scene: &Scene, k: NodeKey| {
            selection.iter().any(|s| {
                *s == k || scene.hierarchy.is_ancestor(*s, k) || scene.hierarchy.is_ancestor(k, *s)
            })
        };

        // Only the topmost unrelated nodes need their flag changed.
        let mut unrelated = Vec::new();
        let mut stack = vec![self.root];
        while let Some(k) = stack.pop() {
            for &child in self.hierarchy.children(k) {
                if !self.is_registered(child) || self.nodes.get(child).map(|n| n.transient).unwrap_or(true) {
                    continue;
                }
                if related(self, child) {
                    stack.push(child);
                } else {
                    unrelated.push(child);
                }
            }
        }

        let command = self.set_hidden_many(&unrelated, hidden)?;
        if hidden && command.is_some() {
            self.last_hidden = unrelated;
        }
        Ok(command)
    }

    pub fn show_last_hidden(&mut self) -> Result<Option<SceneCommand>> {
        let nodes = std::mem::take(&mut self.last_hidden);
        self.set_hidden_many(&nodes, false)
    }

    /// Select every node of the same kind as something already selected
    pub fn select_similar(&mut self) -> Option<SceneCommand> {
        let tags: Vec<_> = self
            .selection
            .iter()
            .filter_map(|k| self.nodes.get(*k).map(|n| n.tag()))
            .collect();
        if tags.is_empty() {
            return None;
        }
        let mut similar: Vec<NodeKey> = self
            .hierarchy
            .subtree(self.root)
            .into_iter()
            .chain(self.layers())
            .filter(|k| *k != self.root)
            .filter(|k| {
                self.nodes
                    .get(*k)
                    .map(|n| !n.transient && tags.contains(&n.tag()))
                    .unwrap_or(false)
            })
            .collect();
        similar.dedup();
        Some(SelectionCommand::apply(self, similar))
    }

    /// Place the selected transform nodes at the given world matrices, in
    /// selection order
    pub fn set_selected_transforms(&mut self, transforms: &[Mat4]) -> Result<Option<SceneCommand>> {
        let nodes: Vec<NodeKey> = self
            .selection
            .iter()
            .copied()
            .filter(|k| self.nodes.get(*k).map(|n| n.transform().is_some()).unwrap_or(false))
            .collect();
        let mut batch = BatchUndoCommand::new().with_description("Transform");
        for (node, transform) in nodes.into_iter().zip(transforms) {
            batch.push(commands::components_command(self, node)?);
            self.set_global_transform(node, *transform)?;
        }
        Ok(batch.into_command())
    }
}
