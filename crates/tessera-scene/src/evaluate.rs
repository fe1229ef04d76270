//! Incremental evaluation of dirty nodes

use crate::events::SceneEvent;
use crate::node::{NodeKey, NodeKind, SceneNode};
use crate::scene::Scene;
use glam::Vec3;
use tessera_core::{AlignedBox, Result};
use tessera_graph::{EvaluationReport, GraphDirection};

impl Scene {
    /// Bring every dirty node up to date.
    ///
    /// The downstream pass refreshes matrices, visibility and selectability
    /// from parents and layers; the upstream pass rebuilds bounds from
    /// children. With `silent` set, visibility notifications are dropped.
    pub fn evaluate(&mut self, silent: bool) -> Result<EvaluationReport> {
        let downstream = self.graph.take_sorted(GraphDirection::Downstream)?;
        for &key in &downstream {
            self.evaluate_downstream(key);
        }

        let upstream = self.graph.take_sorted(GraphDirection::Upstream)?;
        for &key in &upstream {
            self.evaluate_upstream(key);
        }

        let events = std::mem::take(&mut self.pending_events);
        if !silent {
            for event in events {
                self.raise(event);
            }
        }

        let report = EvaluationReport {
            downstream: downstream.len(),
            upstream: upstream.len(),
        };
        if report.total() > 0 {
            log::trace!(
                "evaluated {} downstream, {} upstream",
                report.downstream,
                report.upstream
            );
        }
        Ok(report)
    }

    /// Layer nodes this node is a member of
    fn member_layers(&self, key: NodeKey) -> impl Iterator<Item = &SceneNode> + '_ {
        self.graph
            .ancestors(key)
            .iter()
            .filter_map(|a| self.nodes.get(*a))
            .filter(|n| n.kind.layer_data().is_some())
    }

    fn downstream_flags(&self, key: NodeKey) -> (bool, bool) {
        let Some(node) = self.nodes.get(key) else {
            return (false, false);
        };
        if let Some(layer) = node.kind.layer_data() {
            return (layer.visible && !node.hidden, layer.selectable);
        }

        let parent_visible = self
            .hierarchy
            .parent(key)
            .and_then(|p| self.nodes.get(p))
            .map(|p| p.visible)
            .unwrap_or(true);
        let layers_visible = self.member_layers(key).all(|l| l.visible);
        let visible = !node.hidden && parent_visible && layers_visible;

        let selectable = key != self.root && self.member_layers(key).all(|l| l.selectable);
        (visible, selectable)
    }

    fn evaluate_downstream(&mut self, key: NodeKey) {
        let parent_global = self.parent_global(key);
        let (visible, selectable) = self.downstream_flags(key);

        let Some(node) = self.nodes.get_mut(key) else {
            return;
        };
        if let Some(transform) = node.kind.transform_data_mut() {
            transform.update_object();
            transform.update_global(parent_global);
        }
        let changed = node.visible != visible;
        node.visible = visible;
        node.selectable = selectable;

        if changed && !node.transient {
            self.pending_events
                .push(SceneEvent::VisibilityChanged { node: key, visible });
        }
    }

    fn own_bounds(&self, key: NodeKey) -> Option<AlignedBox> {
        let node = self.nodes.get(key)?;
        let bounds = match &node.kind {
            NodeKind::Transform(_) => AlignedBox::cube(self.settings.transform_bounds_size),
            NodeKind::PivotTransform(_) => AlignedBox::EMPTY,
            NodeKind::Locator { size, .. } => AlignedBox::cube(*size),
            NodeKind::Curve { .. } => AlignedBox::from_points(
                self.hierarchy
                    .children(key)
                    .iter()
                    .filter_map(|c| match self.nodes.get(*c).map(|n| &n.kind) {
                        Some(NodeKind::CurvePoint { position }) => Some(*position),
                        _ => None,
                    }),
            ),
            NodeKind::CurvePoint { position } => AlignedBox::new(*position, *position),
            NodeKind::Layer(_) => return None,
        };
        Some(bounds)
    }

    fn evaluate_upstream(&mut self, key: NodeKey) {
        let Some(object_bounds) = self.own_bounds(key) else {
            return;
        };

        // Children's hierarchy bounds are in their own space; bring them into
        // the space of this node's transform owner.
        let inverse_global = self.inverse_global_transform(key);
        let mut hierarchy_bounds = object_bounds;
        for &child in self.hierarchy.children(key) {
            let Some(node) = self.nodes.get(child) else {
                continue;
            };
            let child_bounds = match node.transform() {
                Some(t) => node
                    .hierarchy_bounds
                    .transformed(&(inverse_global * t.global_transform())),
                None => node.hierarchy_bounds,
            };
            hierarchy_bounds.merge(&child_bounds);
        }

        if let Some(node) = self.nodes.get_mut(key) {
            node.object_bounds = object_bounds;
            node.hierarchy_bounds = hierarchy_bounds;
        }
    }

    /// World-space bounds of a node and everything below it
    pub fn world_bounds(&self, key: NodeKey) -> AlignedBox {
        self.nodes
            .get(key)
            .map(|n| n.hierarchy_bounds.transformed(&self.global_transform(key)))
            .unwrap_or(AlignedBox::EMPTY)
    }

    /// Centre of the world bounds of the given nodes
    pub fn world_center(&self, keys: &[NodeKey]) -> Vec3 {
        let mut bounds = AlignedBox::EMPTY;
        for &k in keys {
            bounds.merge(&self.world_bounds(k));
        }
        bounds.center()
    }
}
