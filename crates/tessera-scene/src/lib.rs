//! Tessera Scene - The editable scene graph
//!
//! A `Scene` owns every node, the ordered parent/child tree, the dependency
//! graph that orders evaluation, and the undo history. Mutations that change
//! topology return undo commands; `Scene::push` records them.

mod commands;
mod curve;
mod edit;
mod evaluate;
mod events;
mod hierarchy;
mod layer;
mod node;
mod persist;
mod scene;
mod settings;
mod transform;

pub use commands::{
    ExistenceAction, HiddenCommand, LayerMembershipCommand, ParentCommand, RenameCommand,
    SceneCommand, SceneNodeExistenceCommand, SelectionCommand, TransformComponentsCommand,
};
pub use events::{ListenerId, ParentChangingArgs, ParentVerdict, SceneEvent};
pub use hierarchy::{Hierarchy, TraversalAction};
pub use node::{LayerData, LocatorShape, NodeKey, NodeKind, NodeKindTag, SceneNode};
pub use persist::{
    DocumentFormat, ImportAction, ImportFlags, KindRecord, NodeRecord, SceneDocument,
    TransformRecord,
};
pub use scene::{HierarchyVisitor, Scene};
pub use settings::{SceneSettings, ViewColorMode};
pub use transform::{Pivot, TransformData};

pub use tessera_graph::GraphDirection;
