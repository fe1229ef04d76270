//! Local-to-global matrix pipeline

use crate::commands::{self, SceneCommand};
use crate::node::{NodeKey, NodeKind};
use crate::scene::Scene;
use glam::{Mat3, Mat4, Vec3};
use tessera_core::{PivotComponents, Result, TesseraError};
use tessera_undo::BatchUndoCommand;

/// Components and cached matrices of a transform-bearing node.
///
/// `object` is composed from the components in the fixed pivot order;
/// `global` is `parent_global * object` when inheriting. Both caches and
/// their inverses are refreshed by downstream evaluation, or immediately by
/// the setters that take a matrix.
#[derive(Debug, Clone)]
pub struct TransformData {
    pub(crate) components: PivotComponents,
    pub(crate) inherit_transform: bool,
    pub(crate) snap_pivots: bool,
    pub(crate) object: Mat4,
    pub(crate) object_inverse: Mat4,
    pub(crate) global: Mat4,
    pub(crate) global_inverse: Mat4,
}

impl Default for TransformData {
    fn default() -> Self {
        Self::new()
    }
}

impl TransformData {
    pub fn new() -> Self {
        Self {
            components: PivotComponents::IDENTITY,
            inherit_transform: true,
            snap_pivots: true,
            object: Mat4::IDENTITY,
            object_inverse: Mat4::IDENTITY,
            global: Mat4::IDENTITY,
            global_inverse: Mat4::IDENTITY,
        }
    }

    pub fn with_components(mut self, components: PivotComponents) -> Self {
        self.components = components;
        self.update_object();
        self
    }

    pub fn with_inherit_transform(mut self, inherit: bool) -> Self {
        self.inherit_transform = inherit;
        self
    }

    pub fn components(&self) -> &PivotComponents {
        &self.components
    }

    pub fn inherit_transform(&self) -> bool {
        self.inherit_transform
    }

    pub fn snap_pivots(&self) -> bool {
        self.snap_pivots
    }

    pub fn object_transform(&self) -> Mat4 {
        self.object
    }

    pub fn inverse_object_transform(&self) -> Mat4 {
        self.object_inverse
    }

    pub fn global_transform(&self) -> Mat4 {
        self.global
    }

    pub fn inverse_global_transform(&self) -> Mat4 {
        self.global_inverse
    }

    pub(crate) fn update_object(&mut self) {
        self.object = self.components.compose();
        self.object_inverse = self.object.inverse();
    }

    pub(crate) fn update_global(&mut self, parent_global: Option<Mat4>) {
        self.global = match parent_global {
            Some(parent) if self.inherit_transform => parent * self.object,
            _ => self.object,
        };
        self.global_inverse = self.global.inverse();
    }

    pub(crate) fn set_object_transform(&mut self, m: &Mat4) {
        self.components = self.components.decompose_fixed_pivots(m);
        self.update_object();
    }

    /// Store a new global matrix and solve the components from it
    pub(crate) fn set_global_transform(&mut self, m: Mat4, parent_global_inverse: Option<Mat4>) {
        self.global = m;
        self.global_inverse = m.inverse();
        self.localize(parent_global_inverse);
    }

    /// Recompute components from the cached global matrix
    pub(crate) fn localize(&mut self, parent_global_inverse: Option<Mat4>) {
        let local = match parent_global_inverse {
            Some(inverse) if self.inherit_transform => inverse * self.global,
            _ => self.global,
        };
        self.set_object_transform(&local);
    }

    fn scale_linear(&self) -> Mat3 {
        self.components.shear.to_mat3() * Mat3::from_diagonal(self.components.scale)
    }

    /// Move the scale pivot, compensating so the object does not move
    pub(crate) fn set_scale_pivot(&mut self, value: Vec3, snap_siblings: bool) {
        let delta = value - self.components.scale_pivot;
        let linear = self.scale_linear();
        self.components.scale_pivot_translate += linear * delta - delta;
        self.components.scale_pivot = value;
        if snap_siblings {
            self.set_rotate_pivot(value, false);
            self.set_translate_pivot(value, false);
        }
        self.update_object();
    }

    /// Move the rotate pivot, compensating so the object does not move
    pub(crate) fn set_rotate_pivot(&mut self, value: Vec3, snap_siblings: bool) {
        let delta = value - self.components.rotate_pivot;
        let rotation = tessera_core::math::rotation_matrix(self.components.rotate);
        self.components.rotate_pivot_translate += rotation * delta - delta;
        self.components.rotate_pivot = value;
        if snap_siblings {
            self.set_scale_pivot(value, false);
            self.set_translate_pivot(value, false);
        }
        self.update_object();
    }

    /// Move the translate pivot, compensating `translate`
    pub(crate) fn set_translate_pivot(&mut self, value: Vec3, snap_siblings: bool) {
        self.components.translate += self.components.translate_pivot - value;
        self.components.translate_pivot = value;
        if snap_siblings {
            self.set_scale_pivot(value, false);
            self.set_rotate_pivot(value, false);
        }
        self.update_object();
    }

    pub(crate) fn reset(&mut self) {
        self.components = PivotComponents::IDENTITY;
        self.update_object();
    }
}

/// Which pivot a setter targets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pivot {
    Scale,
    Rotate,
    Translate,
}

impl Scene {
    /// Nearest node at or above `key` that carries a transform
    pub fn transform_owner(&self, key: NodeKey) -> Option<NodeKey> {
        let mut current = Some(key);
        while let Some(k) = current {
            if self.nodes.get(k)?.transform().is_some() {
                return Some(k);
            }
            current = self.hierarchy.parent(k);
        }
        None
    }

    /// Cached global matrix of the node's transform owner
    pub fn global_transform(&self, key: NodeKey) -> Mat4 {
        self.transform_owner(key)
            .and_then(|k| self.nodes.get(k))
            .and_then(|n| n.transform())
            .map(|t| t.global)
            .unwrap_or(Mat4::IDENTITY)
    }

    pub fn inverse_global_transform(&self, key: NodeKey) -> Mat4 {
        self.transform_owner(key)
            .and_then(|k| self.nodes.get(k))
            .and_then(|n| n.transform())
            .map(|t| t.global_inverse)
            .unwrap_or(Mat4::IDENTITY)
    }

    /// Global matrix the node inherits from above, if any
    pub(crate) fn parent_global(&self, key: NodeKey) -> Option<Mat4> {
        let parent = self.hierarchy.parent(key)?;
        let owner = self.transform_owner(parent)?;
        self.nodes.get(owner)?.transform().map(|t| t.global)
    }

    fn parent_global_inverse(&self, key: NodeKey) -> Option<Mat4> {
        let parent = self.hierarchy.parent(key)?;
        let owner = self.transform_owner(parent)?;
        self.nodes.get(owner)?.transform().map(|t| t.global_inverse)
    }

    pub(crate) fn transform_mut(&mut self, key: NodeKey) -> Result<&mut TransformData> {
        let node = self.node_mut(key)?;
        let tag = node.tag();
        node.kind
            .transform_data_mut()
            .ok_or_else(|| TesseraError::InvalidOperation(format!("{} has no transform", tag)))
    }

    pub fn components(&self, key: NodeKey) -> Result<PivotComponents> {
        let node = self.node(key)?;
        node.transform()
            .map(|t| t.components)
            .ok_or_else(|| TesseraError::InvalidOperation(format!("{} has no transform", node.tag())))
    }

    pub fn set_components(&mut self, key: NodeKey, components: PivotComponents) -> Result<()> {
        let data = self.transform_mut(key)?;
        data.components = components;
        data.update_object();
        self.dirty_hierarchy(key);
        Ok(())
    }

    pub fn set_scale(&mut self, key: NodeKey, scale: Vec3) -> Result<()> {
        let mut c = self.components(key)?;
        c.scale = scale;
        self.set_components(key, c)
    }

    /// Euler XYZ, radians
    pub fn set_rotate(&mut self, key: NodeKey, rotate: Vec3) -> Result<()> {
        let mut c = self.components(key)?;
        c.rotate = rotate;
        self.set_components(key, c)
    }

    pub fn set_translate(&mut self, key: NodeKey, translate: Vec3) -> Result<()> {
        let mut c = self.components(key)?;
        c.translate = translate;
        self.set_components(key, c)
    }

    /// Move a pivot without moving the object. Groups snap the other pivots
    /// along when their snap flag is set.
    pub fn set_pivot(&mut self, key: NodeKey, pivot: Pivot, value: Vec3) -> Result<()> {
        let is_group = matches!(self.node(key)?.kind, NodeKind::PivotTransform(_));
        let data = self.transform_mut(key)?;
        let snap = is_group && data.snap_pivots;
        match pivot {
            Pivot::Scale => data.set_scale_pivot(value, snap),
            Pivot::Rotate => data.set_rotate_pivot(value, snap),
            Pivot::Translate => data.set_translate_pivot(value, snap),
        }
        self.dirty_hierarchy(key);
        Ok(())
    }

    pub fn set_snap_pivots(&mut self, key: NodeKey, snap: bool) -> Result<()> {
        self.transform_mut(key)?.snap_pivots = snap;
        Ok(())
    }

    /// Toggle inheritance while keeping the node where it is in world space
    pub fn set_inherit_transform(&mut self, key: NodeKey, inherit: bool) -> Result<()> {
        let parent_inverse = self.parent_global_inverse(key);
        let data = self.transform_mut(key)?;
        data.inherit_transform = inherit;
        data.localize(parent_inverse);
        self.dirty_hierarchy(key);
        Ok(())
    }

    pub fn set_object_transform(&mut self, key: NodeKey, m: Mat4) -> Result<()> {
        self.transform_mut(key)?.set_object_transform(&m);
        self.dirty_hierarchy(key);
        Ok(())
    }

    /// Place the node at `m` in world space.
    ///
    /// Only this node's components are solved; descendants are marked dirty
    /// and pick up the change on the next evaluation.
    pub fn set_global_transform(&mut self, key: NodeKey, m: Mat4) -> Result<()> {
        let parent_inverse = self.parent_global_inverse(key);
        self.transform_mut(key)?.set_global_transform(m, parent_inverse);
        self.dirty_hierarchy(key);
        Ok(())
    }

    /// Re-solve components from the cached global matrix against the current
    /// parent, returning a command that restores the previous components.
    pub fn compute_object_components(&mut self, key: NodeKey) -> Result<SceneCommand> {
        let command = commands::components_command(self, key)?;
        let parent_inverse = self.parent_global_inverse(key);
        self.transform_mut(key)?.localize(parent_inverse);
        self.dirty_hierarchy(key);
        Ok(command)
    }

    pub fn reset_transform(&mut self, key: NodeKey) -> Result<SceneCommand> {
        let command = commands::components_command(self, key)?;
        self.transform_mut(key)?.reset();
        self.dirty_hierarchy(key);
        Ok(command)
    }

    /// Move the node's origin to the middle of its content, leaving the
    /// content where it is in world space.
    ///
    /// Nodes without children just have their components re-solved from the
    /// global matrix, which folds pivots and compensation into plain values.
    pub fn center_transform(&mut self, key: NodeKey) -> Result<SceneCommand> {
        let node = self.node(key)?;
        let data = node
            .transform()
            .ok_or_else(|| TesseraError::InvalidOperation(format!("{} has no transform", node.tag())))?;
        let old_global = data.global;
        let is_curve = matches!(node.kind, NodeKind::Curve { .. });
        let bounds_center = node.hierarchy_bounds.center();
        let children: Vec<NodeKey> = self.hierarchy.children(key).to_vec();

        let mut batch = BatchUndoCommand::new().with_description("Center Transform");
        batch.push(commands::components_command(self, key)?);

        if children.is_empty() {
            self.transform_mut(key)?.reset();
            self.set_global_transform(key, old_global)?;
            return Ok(Box::new(batch));
        }

        let local_center = if is_curve {
            let points: Vec<Vec3> = children
                .iter()
                .filter_map(|c| self.point_position(*c).ok())
                .collect();
            if points.is_empty() {
                Vec3::ZERO
            } else {
                points.iter().copied().sum::<Vec3>() / points.len() as f32
            }
        } else {
            bounds_center
        };
        let world_center = old_global.transform_point3(local_center);

        let mut new_global = old_global;
        new_global.w_axis = world_center.extend(1.0);

        // Curve points live in the curve's space, so carry them over.
        let to_new = new_global.inverse() * old_global;
        for &child in &children {
            if let Ok(position) = self.point_position(child) {
                batch.push(commands::point_position_command(self, child)?);
                self.set_point_position(child, to_new.transform_point3(position))?;
            }
        }

        self.transform_mut(key)?.reset();
        self.set_global_transform(key, new_global)?;

        for &child in &children {
            if self.node(child)?.transform().is_some() {
                batch.push(self.compute_object_components(child)?);
            }
        }

        Ok(Box::new(batch))
    }
}
