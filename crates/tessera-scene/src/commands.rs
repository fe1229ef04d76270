//! Undo commands for scene edits

use crate::node::{LayerData, NodeKey};
use crate::scene::Scene;
use glam::Vec3;
use tessera_core::{PivotComponents, Result, TesseraError};
use tessera_undo::{BoxedCommand, PropertyUndoCommand, UndoCommand};

pub type SceneCommand = BoxedCommand<Scene>;

/// Snapshot of a node's transform components
pub type TransformComponentsCommand = PropertyUndoCommand<Scene, PivotComponents>;
/// Snapshot of a node's hidden flag; never blocked by the editable gate
pub type HiddenCommand = PropertyUndoCommand<Scene, bool>;
pub type RenameCommand = PropertyUndoCommand<Scene, String>;

/// Moves a node between parents.
///
/// Holds the parent to move to next plus the sibling position to take
/// there. Undo and redo are the same swap, each storing where the node came
/// from. Transform nodes keep their world placement.
pub struct ParentCommand {
    node: NodeKey,
    parent: Option<NodeKey>,
    hints: (Option<NodeKey>, Option<NodeKey>),
}

impl ParentCommand {
    /// Reparent `node` now. Returns `None` if it was already under `parent`
    /// or a listener vetoed the move.
    pub fn apply(
        scene: &mut Scene,
        node: NodeKey,
        parent: Option<NodeKey>,
    ) -> Result<Option<SceneCommand>> {
        let mut command = ParentCommand {
            node,
            parent,
            hints: (None, None),
        };
        if command.swap(scene)? {
            Ok(Some(Box::new(command)))
        } else {
            Ok(None)
        }
    }

    pub fn node(&self) -> NodeKey {
        self.node
    }

    fn swap(&mut self, scene: &mut Scene) -> Result<bool> {
        let previous_parent = scene.parent(self.node);
        let previous_hints = scene.hierarchy.hints(self.node);
        let global = scene
            .node(self.node)?
            .transform()
            .map(|t| t.global_transform());

        if !scene.reparent(self.node, self.parent, Some(self.hints))? {
            return Ok(false);
        }
        if let Some(global) = global {
            scene.set_global_transform(self.node, global)?;
        }

        self.parent = previous_parent;
        self.hints = previous_hints;
        Ok(true)
    }

    fn swap_or_veto(&mut self, scene: &mut Scene) -> Result<()> {
        if self.swap(scene)? {
            Ok(())
        } else {
            Err(TesseraError::ParentVetoed(
                scene
                    .get(self.node)
                    .map(|n| n.name().to_string())
                    .unwrap_or_default(),
            ))
        }
    }
}

impl UndoCommand<Scene> for ParentCommand {
    fn undo(&mut self, scene: &mut Scene) -> Result<()> {
        self.swap_or_veto(scene)
    }

    fn redo(&mut self, scene: &mut Scene) -> Result<()> {
        self.swap_or_veto(scene)
    }

    fn description(&self) -> &str {
        "Parent"
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExistenceAction {
    Add,
    Remove,
}

impl ExistenceAction {
    fn inverse(self) -> Self {
        match self {
            ExistenceAction::Add => ExistenceAction::Remove,
            ExistenceAction::Remove => ExistenceAction::Add,
        }
    }
}

/// Adds a node to the scene or takes it out.
///
/// Both directions go through `Scene::add_object` / `Scene::remove_object`,
/// so bringing a node back re-registers it and fires the same notifications
/// as creating it did.
pub struct SceneNodeExistenceCommand {
    node: NodeKey,
    action: ExistenceAction,
}

impl SceneNodeExistenceCommand {
    pub fn add(scene: &mut Scene, node: NodeKey) -> Result<SceneCommand> {
        Self::apply(scene, node, ExistenceAction::Add)
    }

    pub fn remove(scene: &mut Scene, node: NodeKey) -> Result<SceneCommand> {
        Self::apply(scene, node, ExistenceAction::Remove)
    }

    fn apply(scene: &mut Scene, node: NodeKey, action: ExistenceAction) -> Result<SceneCommand> {
        run(scene, node, action)?;
        Ok(Box::new(Self { node, action }))
    }

    pub fn node(&self) -> NodeKey {
        self.node
    }

    pub fn action(&self) -> ExistenceAction {
        self.action
    }
}

fn run(scene: &mut Scene, node: NodeKey, action: ExistenceAction) -> Result<()> {
    match action {
        ExistenceAction::Add => scene.add_object(node),
        ExistenceAction::Remove => scene.remove_object(node),
    }
}

impl UndoCommand<Scene> for SceneNodeExistenceCommand {
    fn undo(&mut self, scene: &mut Scene) -> Result<()> {
        run(scene, self.node, self.action.inverse())
    }

    fn redo(&mut self, scene: &mut Scene) -> Result<()> {
        run(scene, self.node, self.action)
    }

    fn description(&self) -> &str {
        match self.action {
            ExistenceAction::Add => "Add",
            ExistenceAction::Remove => "Delete",
        }
    }

    fn discard(&mut self, scene: &mut Scene) {
        scene.drop_detached(self.node);
    }
}

/// Selection change; recorded so undo restores it, but never blocked
pub struct SelectionCommand {
    selection: Vec<NodeKey>,
}

impl SelectionCommand {
    pub fn apply(scene: &mut Scene, selection: Vec<NodeKey>) -> SceneCommand {
        let previous = scene.apply_selection(selection);
        Box::new(Self {
            selection: previous,
        })
    }

    fn swap(&mut self, scene: &mut Scene) {
        let selection = std::mem::take(&mut self.selection);
        self.selection = scene.apply_selection(selection);
    }
}

impl UndoCommand<Scene> for SelectionCommand {
    fn undo(&mut self, scene: &mut Scene) -> Result<()> {
        self.swap(scene);
        Ok(())
    }

    fn redo(&mut self, scene: &mut Scene) -> Result<()> {
        self.swap(scene);
        Ok(())
    }

    fn is_significant(&self) -> bool {
        false
    }

    fn description(&self) -> &str {
        "Select"
    }
}

/// A node joining or leaving a layer
pub struct LayerMembershipCommand {
    node: NodeKey,
    layer: NodeKey,
    joined: bool,
}

impl LayerMembershipCommand {
    pub(crate) fn new(node: NodeKey, layer: NodeKey, joined: bool) -> Self {
        Self {
            node,
            layer,
            joined,
        }
    }

    fn set(&self, scene: &mut Scene, member: bool) -> Result<()> {
        if member {
            scene.join_layer(self.node, self.layer)?;
        } else {
            scene.leave_layer(self.node, self.layer)?;
        }
        Ok(())
    }
}

impl UndoCommand<Scene> for LayerMembershipCommand {
    fn undo(&mut self, scene: &mut Scene) -> Result<()> {
        self.set(scene, !self.joined)
    }

    fn redo(&mut self, scene: &mut Scene) -> Result<()> {
        self.set(scene, self.joined)
    }

    fn description(&self) -> &str {
        if self.joined {
            "Add to Layer"
        } else {
            "Remove from Layer"
        }
    }
}

pub(crate) fn components_command(scene: &Scene, key: NodeKey) -> Result<SceneCommand> {
    let command: TransformComponentsCommand = PropertyUndoCommand::capture(
        scene,
        move |s: &Scene| s.components(key),
        move |s: &mut Scene, c| s.set_components(key, c),
    )?;
    Ok(Box::new(command.with_description("Transform")))
}

pub(crate) fn point_position_command(scene: &Scene, key: NodeKey) -> Result<SceneCommand> {
    let command: PropertyUndoCommand<Scene, Vec3> = PropertyUndoCommand::capture(
        scene,
        move |s: &Scene| s.point_position(key),
        move |s: &mut Scene, p| s.set_point_position(key, p),
    )?;
    Ok(Box::new(command.with_description("Move Point")))
}

pub(crate) fn hidden_command(scene: &Scene, key: NodeKey) -> Result<SceneCommand> {
    let command: HiddenCommand = PropertyUndoCommand::capture(
        scene,
        move |s: &Scene| s.node(key).map(|n| n.is_hidden()),
        move |s: &mut Scene, hidden| s.set_hidden(key, hidden),
    )?;
    Ok(Box::new(
        command
            .with_significance(false)
            .with_description("Show/Hide"),
    ))
}

pub(crate) fn rename_command(scene: &Scene, key: NodeKey) -> Result<SceneCommand> {
    let command: RenameCommand = PropertyUndoCommand::capture(
        scene,
        move |s: &Scene| s.node(key).map(|n| n.name().to_string()),
        move |s: &mut Scene, name: String| s.rename(key, &name).map(|_| ()),
    )?;
    Ok(Box::new(command.with_description("Rename")))
}

pub(crate) fn layer_data_command(scene: &Scene, key: NodeKey) -> Result<SceneCommand> {
    let command: PropertyUndoCommand<Scene, LayerData> = PropertyUndoCommand::capture(
        scene,
        move |s: &Scene| s.layer_data(key),
        move |s: &mut Scene, data| s.set_layer_data(key, data),
    )?;
    Ok(Box::new(command.with_description("Layer")))
}

impl Scene {
    /// Rename through the undo history
    pub fn rename_node(&mut self, key: NodeKey, name: &str) -> Result<String> {
        let command = rename_command(self, key)?;
        let name = self.rename(key, name)?;
        self.push(command);
        Ok(name)
    }

    /// Replace the selection, returning the command that restores it
    pub fn set_selection(&mut self, selection: Vec<NodeKey>) -> SceneCommand {
        SelectionCommand::apply(self, selection)
    }
}
