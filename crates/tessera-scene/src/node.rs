//! Scene nodes: a common record plus a kind-specific payload

use crate::transform::TransformData;
use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::cell::OnceCell;
use std::fmt;
use tessera_core::{AlignedBox, Color, SceneId};

slotmap::new_key_type! {
    /// Handle to a node in a `Scene`'s node store
    pub struct NodeKey;
}

/// Discriminant of `NodeKind`, cheap to copy and compare
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKindTag {
    Transform,
    PivotTransform,
    Locator,
    Curve,
    CurvePoint,
    Layer,
}

impl NodeKindTag {
    /// Base used when a node is created without a usable name
    pub fn default_name(&self) -> &'static str {
        match self {
            NodeKindTag::Transform => "transform",
            NodeKindTag::PivotTransform => "group",
            NodeKindTag::Locator => "locator",
            NodeKindTag::Curve => "curve",
            NodeKindTag::CurvePoint => "point",
            NodeKindTag::Layer => "layer",
        }
    }

    /// Hierarchy nodes live in the parent/child tree; layers do not
    pub fn is_hierarchy(&self) -> bool {
        !matches!(self, NodeKindTag::Layer)
    }
}

impl fmt::Display for NodeKindTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NodeKindTag::Transform => "Transform",
            NodeKindTag::PivotTransform => "PivotTransform",
            NodeKindTag::Locator => "Locator",
            NodeKindTag::Curve => "Curve",
            NodeKindTag::CurvePoint => "CurvePoint",
            NodeKindTag::Layer => "Layer",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LocatorShape {
    #[default]
    Cross,
    Cube,
}

/// Display state shared by every member of a layer
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayerData {
    pub visible: bool,
    pub selectable: bool,
    pub color: Color,
}

impl Default for LayerData {
    fn default() -> Self {
        Self {
            visible: true,
            selectable: true,
            color: Color::WHITE,
        }
    }
}

/// Kind-specific payload of a node
#[derive(Debug, Clone)]
pub enum NodeKind {
    Transform(TransformData),
    /// Groups; the scene root is one of these
    PivotTransform(TransformData),
    Locator {
        transform: TransformData,
        shape: LocatorShape,
        size: f32,
    },
    Curve {
        transform: TransformData,
        closed: bool,
    },
    /// Control point of the parent curve, in the curve's local space
    CurvePoint { position: Vec3 },
    Layer(LayerData),
}

impl NodeKind {
    pub fn transform() -> Self {
        NodeKind::Transform(TransformData::new())
    }

    pub fn group() -> Self {
        NodeKind::PivotTransform(TransformData::new())
    }

    pub fn locator(shape: LocatorShape, size: f32) -> Self {
        NodeKind::Locator {
            transform: TransformData::new(),
            shape,
            size,
        }
    }

    pub fn curve(closed: bool) -> Self {
        NodeKind::Curve {
            transform: TransformData::new(),
            closed,
        }
    }

    pub fn curve_point(position: Vec3) -> Self {
        NodeKind::CurvePoint { position }
    }

    pub fn layer() -> Self {
        NodeKind::Layer(LayerData::default())
    }

    pub fn tag(&self) -> NodeKindTag {
        match self {
            NodeKind::Transform(_) => NodeKindTag::Transform,
            NodeKind::PivotTransform(_) => NodeKindTag::PivotTransform,
            NodeKind::Locator { .. } => NodeKindTag::Locator,
            NodeKind::Curve { .. } => NodeKindTag::Curve,
            NodeKind::CurvePoint { .. } => NodeKindTag::CurvePoint,
            NodeKind::Layer(_) => NodeKindTag::Layer,
        }
    }

    pub fn transform_data(&self) -> Option<&TransformData> {
        match self {
            NodeKind::Transform(t) | NodeKind::PivotTransform(t) => Some(t),
            NodeKind::Locator { transform, .. } | NodeKind::Curve { transform, .. } => {
                Some(transform)
            }
            NodeKind::CurvePoint { .. } | NodeKind::Layer(_) => None,
        }
    }

    pub fn transform_data_mut(&mut self) -> Option<&mut TransformData> {
        match self {
            NodeKind::Transform(t) | NodeKind::PivotTransform(t) => Some(t),
            NodeKind::Locator { transform, .. } | NodeKind::Curve { transform, .. } => {
                Some(transform)
            }
            NodeKind::CurvePoint { .. } | NodeKind::Layer(_) => None,
        }
    }

    pub fn layer_data(&self) -> Option<&LayerData> {
        match self {
            NodeKind::Layer(l) => Some(l),
            _ => None,
        }
    }

    pub fn layer_data_mut(&mut self) -> Option<&mut LayerData> {
        match self {
            NodeKind::Layer(l) => Some(l),
            _ => None,
        }
    }
}

/// The common record every node carries
#[derive(Debug, Clone)]
pub struct SceneNode {
    pub(crate) id: SceneId,
    pub(crate) name: String,
    /// Persisted parent reference; `SceneId::NULL` when parentless
    pub(crate) parent_id: SceneId,
    pub(crate) transient: bool,
    pub(crate) selected: bool,
    pub(crate) highlighted: bool,
    pub(crate) reactive: bool,
    pub(crate) hidden: bool,
    pub(crate) live: bool,
    pub(crate) visible: bool,
    pub(crate) selectable: bool,
    pub(crate) object_bounds: AlignedBox,
    pub(crate) hierarchy_bounds: AlignedBox,
    pub(crate) path: OnceCell<String>,
    pub(crate) kind: NodeKind,
}

impl SceneNode {
    pub fn new(kind: NodeKind, name: impl Into<String>) -> Self {
        Self::with_id(SceneId::new(), kind, name)
    }

    pub fn with_id(id: SceneId, kind: NodeKind, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            parent_id: SceneId::NULL,
            transient: false,
            selected: false,
            highlighted: false,
            reactive: false,
            hidden: false,
            live: false,
            visible: true,
            selectable: true,
            object_bounds: AlignedBox::EMPTY,
            hierarchy_bounds: AlignedBox::EMPTY,
            path: OnceCell::new(),
            kind,
        }
    }

    /// Copy of the persisted state under a new identity
    pub(crate) fn duplicate(&self) -> Self {
        let mut copy = Self::with_id(SceneId::new(), self.kind.clone(), self.name.clone());
        copy.hidden = self.hidden;
        copy.live = self.live;
        copy.transient = self.transient;
        copy
    }

    pub fn id(&self) -> SceneId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parent_id(&self) -> SceneId {
        self.parent_id
    }

    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    pub fn tag(&self) -> NodeKindTag {
        self.kind.tag()
    }

    pub fn is_hierarchy(&self) -> bool {
        self.tag().is_hierarchy()
    }

    pub fn is_transient(&self) -> bool {
        self.transient
    }

    pub fn is_selected(&self) -> bool {
        self.selected
    }

    pub fn is_highlighted(&self) -> bool {
        self.highlighted
    }

    pub fn is_reactive(&self) -> bool {
        self.reactive
    }

    pub fn is_hidden(&self) -> bool {
        self.hidden
    }

    pub fn is_live(&self) -> bool {
        self.live
    }

    /// Computed during downstream evaluation
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Computed during downstream evaluation
    pub fn is_selectable(&self) -> bool {
        self.selectable
    }

    pub fn object_bounds(&self) -> AlignedBox {
        self.object_bounds
    }

    /// Own bounds merged with every child's, in this node's local space
    pub fn hierarchy_bounds(&self) -> AlignedBox {
        self.hierarchy_bounds
    }

    pub fn transform(&self) -> Option<&TransformData> {
        self.kind.transform_data()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_tags() {
        assert_eq!(NodeKind::group().tag(), NodeKindTag::PivotTransform);
        assert!(NodeKind::curve_point(Vec3::ZERO).tag().is_hierarchy());
        assert!(!NodeKind::layer().tag().is_hierarchy());
        assert!(NodeKind::curve(false).transform_data().is_some());
        assert!(NodeKind::curve_point(Vec3::ONE).transform_data().is_none());
    }

    #[test]
    fn test_duplicate_gets_fresh_id() {
        let mut node = SceneNode::new(NodeKind::transform(), "box");
        node.hidden = true;
        node.selected = true;
        let copy = node.duplicate();
        assert_ne!(copy.id(), node.id());
        assert_eq!(copy.name(), "box");
        assert!(copy.is_hidden());
        assert!(!copy.is_selected());
        assert!(copy.parent_id().is_null());
    }
}
