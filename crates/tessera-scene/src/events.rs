//! Scene notifications and parent-change vetoes

use crate::node::{NodeKey, NodeKindTag};

/// Handle returned when registering a listener, used to remove it again
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(pub(crate) u64);

/// Notifications raised by a `Scene`
#[derive(Debug, Clone, PartialEq)]
pub enum SceneEvent {
    NodeAdded(NodeKey),
    /// Raised before the node leaves the scene
    NodeRemoving(NodeKey),
    NodeRemoved(NodeKey),
    ParentChanged {
        node: NodeKey,
        old_parent: Option<NodeKey>,
    },
    VisibilityChanged {
        node: NodeKey,
        visible: bool,
    },
    Renamed {
        node: NodeKey,
        old_name: String,
    },
    SelectionChanged,
    StatusChanged(String),
    Executed {
        interactive: bool,
    },
}

/// Arguments passed to parent-changing listeners before a reparent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParentChangingArgs {
    pub node: NodeKey,
    pub node_kind: NodeKindTag,
    pub old_parent: Option<NodeKey>,
    pub old_parent_kind: Option<NodeKindTag>,
    pub new_parent: Option<NodeKey>,
    pub new_parent_kind: Option<NodeKindTag>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParentVerdict {
    Allow,
    Deny(String),
}

impl ParentVerdict {
    pub fn is_allowed(&self) -> bool {
        matches!(self, ParentVerdict::Allow)
    }
}

pub(crate) type EventListener = Box<dyn FnMut(&SceneEvent)>;
pub(crate) type ParentChangingListener = Box<dyn Fn(&ParentChangingArgs) -> ParentVerdict>;

/// Control points stay with the curve they were attached to.
pub(crate) fn curve_point_veto(args: &ParentChangingArgs) -> ParentVerdict {
    if args.node_kind == NodeKindTag::CurvePoint
        && args.old_parent_kind == Some(NodeKindTag::Curve)
    {
        return ParentVerdict::Deny(String::from("curve points cannot be moved to another parent"));
    }
    ParentVerdict::Allow
}
