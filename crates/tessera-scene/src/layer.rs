//! Layer membership
//!
//! A layer is a plain node outside the tree. Its members depend on it in the
//! graph, so a change to the layer flows downstream into their visibility and
//! selectability.

use crate::commands::{self, LayerMembershipCommand, SceneCommand};
use crate::node::{LayerData, NodeKey, NodeKind, NodeKindTag};
use crate::scene::Scene;
use tessera_core::{Color, Result, TesseraError};
use tessera_graph::GraphDirection;

impl Scene {
    pub fn create_layer(&mut self, name: &str) -> Result<NodeKey> {
        let key = self.create_node(NodeKind::layer(), name);
        self.add_object(key)?;
        Ok(key)
    }

    fn expect_layer(&self, layer: NodeKey) -> Result<()> {
        let tag = self.node(layer)?.tag();
        if tag != NodeKindTag::Layer {
            return Err(TesseraError::InvalidOperation(format!("{} is not a layer", tag)));
        }
        Ok(())
    }

    /// Make `node` a member of `layer`. Returns false if it already was.
    pub fn join_layer(&mut self, node: NodeKey, layer: NodeKey) -> Result<bool> {
        self.expect_layer(layer)?;
        if !self.node(node)?.is_hierarchy() {
            return Err(TesseraError::InvalidOperation(String::from(
                "only hierarchy nodes can join a layer",
            )));
        }
        let joined = self.graph.create_dependency(node, layer)?;
        if joined {
            self.dirty(node, GraphDirection::Downstream);
        }
        Ok(joined)
    }

    pub fn leave_layer(&mut self, node: NodeKey, layer: NodeKey) -> Result<bool> {
        self.expect_layer(layer)?;
        let left = self.graph.remove_dependency(node, layer);
        if left {
            self.dirty(node, GraphDirection::Downstream);
        }
        Ok(left)
    }

    /// `join_layer` with an undo command, or `None` if nothing changed
    pub fn add_to_layer(&mut self, node: NodeKey, layer: NodeKey) -> Result<Option<SceneCommand>> {
        if !self.join_layer(node, layer)? {
            return Ok(None);
        }
        Ok(Some(Box::new(LayerMembershipCommand::new(node, layer, true))))
    }

    pub fn remove_from_layer(
        &mut self,
        node: NodeKey,
        layer: NodeKey,
    ) -> Result<Option<SceneCommand>> {
        if !self.leave_layer(node, layer)? {
            return Ok(None);
        }
        Ok(Some(Box::new(LayerMembershipCommand::new(node, layer, false))))
    }

    pub fn layer_members(&self, layer: NodeKey) -> Vec<NodeKey> {
        self.graph
            .descendants(layer)
            .iter()
            .copied()
            .filter(|k| self.nodes.get(*k).map(|n| n.is_hierarchy()).unwrap_or(false))
            .collect()
    }

    /// Layers `node` belongs to, in joining order
    pub fn layers_of(&self, node: NodeKey) -> Vec<NodeKey> {
        self.graph
            .ancestors(node)
            .iter()
            .copied()
            .filter(|k| {
                self.nodes
                    .get(*k)
                    .map(|n| n.tag() == NodeKindTag::Layer)
                    .unwrap_or(false)
            })
            .collect()
    }

    /// Registered layers, in no particular order
    pub fn layers(&self) -> Vec<NodeKey> {
        self.node_keys()
            .filter(|k| self.nodes.get(*k).map(|n| n.tag() == NodeKindTag::Layer).unwrap_or(false))
            .collect()
    }

    pub fn layer_data(&self, layer: NodeKey) -> Result<LayerData> {
        let node = self.node(layer)?;
        node.kind
            .layer_data()
            .copied()
            .ok_or_else(|| TesseraError::InvalidOperation(format!("{} is not a layer", node.tag())))
    }

    pub fn set_layer_data(&mut self, layer: NodeKey, data: LayerData) -> Result<()> {
        let node = self.node_mut(layer)?;
        let tag = node.tag();
        let current = node
            .kind
            .layer_data_mut()
            .ok_or_else(|| TesseraError::InvalidOperation(format!("{} is not a layer", tag)))?;
        *current = data;
        self.dirty(layer, GraphDirection::Downstream);
        Ok(())
    }

    pub fn set_layer_visible(&mut self, layer: NodeKey, visible: bool) -> Result<SceneCommand> {
        let command = commands::layer_data_command(self, layer)?;
        let mut data = self.layer_data(layer)?;
        data.visible = visible;
        self.set_layer_data(layer, data)?;
        Ok(command)
    }

    pub fn set_layer_selectable(&mut self, layer: NodeKey, selectable: bool) -> Result<SceneCommand> {
        let command = commands::layer_data_command(self, layer)?;
        let mut data = self.layer_data(layer)?;
        data.selectable = selectable;
        self.set_layer_data(layer, data)?;
        Ok(command)
    }

    pub fn set_layer_color(&mut self, layer: NodeKey, color: Color) -> Result<SceneCommand> {
        let command = commands::layer_data_command(self, layer)?;
        let mut data = self.layer_data(layer)?;
        data.color = color;
        self.set_layer_data(layer, data)?;
        Ok(command)
    }
}
