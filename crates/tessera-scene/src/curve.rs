//! Curves and their control points

use crate::commands::{SceneCommand, SceneNodeExistenceCommand};
use crate::node::{NodeKey, NodeKind};
use crate::scene::Scene;
use glam::Vec3;
use tessera_core::{Result, TesseraError};
use tessera_graph::GraphDirection;

impl Scene {
    /// Position of a control point in its curve's space
    pub fn point_position(&self, key: NodeKey) -> Result<Vec3> {
        match &self.node(key)?.kind {
            NodeKind::CurvePoint { position } => Ok(*position),
            other => Err(TesseraError::InvalidOperation(format!(
                "{} is not a curve point",
                other.tag()
            ))),
        }
    }

    pub fn set_point_position(&mut self, key: NodeKey, value: Vec3) -> Result<()> {
        match &mut self.node_mut(key)?.kind {
            NodeKind::CurvePoint { position } => *position = value,
            other => {
                return Err(TesseraError::InvalidOperation(format!(
                    "{} is not a curve point",
                    other.tag()
                )))
            }
        }
        self.dirty(key, GraphDirection::Upstream);
        Ok(())
    }

    /// Append a control point to `curve`
    pub fn add_curve_point(&mut self, curve: NodeKey, position: Vec3) -> Result<(NodeKey, SceneCommand)> {
        if !matches!(self.node(curve)?.kind, NodeKind::Curve { .. }) {
            return Err(TesseraError::InvalidOperation(String::from(
                "control points can only be added to curves",
            )));
        }
        let point = self.create_node(NodeKind::curve_point(position), "point");
        self.set_parent(point, Some(curve))?;
        let command = SceneNodeExistenceCommand::add(self, point)?;
        Ok((point, command))
    }

    pub fn curve_points(&self, curve: NodeKey) -> Vec<NodeKey> {
        self.hierarchy
            .children(curve)
            .iter()
            .copied()
            .filter(|k| matches!(self.nodes.get(*k).map(|n| &n.kind), Some(NodeKind::CurvePoint { .. })))
            .collect()
    }

    pub fn is_curve_closed(&self, curve: NodeKey) -> Result<bool> {
        match &self.node(curve)?.kind {
            NodeKind::Curve { closed, .. } => Ok(*closed),
            other => Err(TesseraError::InvalidOperation(format!("{} is not a curve", other.tag()))),
        }
    }

    pub fn set_curve_closed(&mut self, curve: NodeKey, value: bool) -> Result<()> {
        match &mut self.node_mut(curve)?.kind {
            NodeKind::Curve { closed, .. } => {
                *closed = value;
                Ok(())
            }
            other => Err(TesseraError::InvalidOperation(format!("{} is not a curve", other.tag()))),
        }
    }

    /// Length of the polyline through the control points, in world units
    pub fn curve_length(&self, curve: NodeKey) -> Result<f32> {
        let closed = self.is_curve_closed(curve)?;
        let global = self.global_transform(curve);
        let points: Vec<Vec3> = self
            .curve_points(curve)
            .into_iter()
            .filter_map(|p| self.point_position(p).ok())
            .map(|p| global.transform_point3(p))
            .collect();

        let mut length: f32 = points.windows(2).map(|w| w[0].distance(w[1])).sum();
        if closed && points.len() > 2 {
            if let (Some(first), Some(last)) = (points.first(), points.last()) {
                length += last.distance(*first);
            }
        }
        Ok(length)
    }
}
