//! Scene documents: export and import of node records
//!
//! A document is a flat list of nodes. Tree structure is carried only by each
//! record's `parent_id`, so records may appear in any order.

use crate::commands::{SceneCommand, SceneNodeExistenceCommand, SelectionCommand};
use crate::events::SceneEvent;
use crate::hierarchy::TraversalAction;
use crate::node::{LayerData, LocatorShape, NodeKey, NodeKind};
use crate::scene::Scene;
use crate::transform::TransformData;
use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;
use tessera_core::{Color, PivotComponents, Result, SceneId, Shear, TesseraError};
use tessera_undo::{BatchUndoCommand, UndoCommand};

/// Text encodings a document can be read from or written to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Toml,
    Json,
}

impl DocumentFormat {
    /// Pick a format from a file extension (`.json`, anything else is TOML)
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => DocumentFormat::Json,
            _ => DocumentFormat::Toml,
        }
    }
}

/// Root of a scene file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SceneDocument {
    #[serde(default)]
    pub nodes: Vec<NodeRecord>,
}

/// One persisted node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeRecord {
    pub id: SceneId,
    /// Null for nodes directly under the root, and for layers
    #[serde(default, skip_serializing_if = "SceneId::is_null")]
    pub parent_id: SceneId,
    pub name: String,
    #[serde(default, skip_serializing_if = "is_false")]
    pub hidden: bool,
    #[serde(flatten)]
    pub kind: KindRecord,
}

fn is_false(value: &bool) -> bool {
    !*value
}

fn default_true() -> bool {
    true
}

fn default_locator_size() -> f32 {
    1.0
}

fn default_layer_color() -> [f32; 4] {
    Color::WHITE.to_array()
}

/// Kind-specific part of a record, tagged by `type`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum KindRecord {
    Transform {
        #[serde(default)]
        transform: TransformRecord,
    },
    PivotTransform {
        #[serde(default)]
        transform: TransformRecord,
    },
    Locator {
        #[serde(default)]
        transform: TransformRecord,
        #[serde(default)]
        shape: LocatorShape,
        #[serde(default = "default_locator_size")]
        size: f32,
    },
    Curve {
        #[serde(default)]
        transform: TransformRecord,
        #[serde(default)]
        closed: bool,
    },
    CurvePoint {
        position: [f32; 3],
    },
    Layer {
        #[serde(default = "default_true")]
        visible: bool,
        #[serde(default = "default_true")]
        selectable: bool,
        #[serde(default = "default_layer_color")]
        color: [f32; 4],
        /// Ids of member nodes
        #[serde(default)]
        members: Vec<SceneId>,
    },
}

/// Transform components; rotation in radians
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransformRecord {
    pub scale: [f32; 3],
    pub shear: [f32; 3],
    pub rotate: [f32; 3],
    pub translate: [f32; 3],
    pub scale_pivot: [f32; 3],
    pub scale_pivot_translate: [f32; 3],
    pub rotate_pivot: [f32; 3],
    pub rotate_pivot_translate: [f32; 3],
    pub translate_pivot: [f32; 3],
    pub inherit_transform: bool,
}

impl Default for TransformRecord {
    fn default() -> Self {
        Self::from(&TransformData::new())
    }
}

impl From<&TransformData> for TransformRecord {
    fn from(data: &TransformData) -> Self {
        let c = data.components();
        Self {
            scale: c.scale.to_array(),
            shear: c.shear.to_array(),
            rotate: c.rotate.to_array(),
            translate: c.translate.to_array(),
            scale_pivot: c.scale_pivot.to_array(),
            scale_pivot_translate: c.scale_pivot_translate.to_array(),
            rotate_pivot: c.rotate_pivot.to_array(),
            rotate_pivot_translate: c.rotate_pivot_translate.to_array(),
            translate_pivot: c.translate_pivot.to_array(),
            inherit_transform: data.inherit_transform(),
        }
    }
}

impl TransformRecord {
    pub fn to_data(&self) -> TransformData {
        let components = PivotComponents {
            scale: Vec3::from_array(self.scale),
            shear: Shear::from_array(self.shear),
            rotate: Vec3::from_array(self.rotate),
            translate: Vec3::from_array(self.translate),
            scale_pivot: Vec3::from_array(self.scale_pivot),
            scale_pivot_translate: Vec3::from_array(self.scale_pivot_translate),
            rotate_pivot: Vec3::from_array(self.rotate_pivot),
            rotate_pivot_translate: Vec3::from_array(self.rotate_pivot_translate),
            translate_pivot: Vec3::from_array(self.translate_pivot),
        };
        TransformData::new()
            .with_components(components)
            .with_inherit_transform(self.inherit_transform)
    }
}

impl KindRecord {
    fn from_kind(kind: &NodeKind, members: Vec<SceneId>) -> Self {
        match kind {
            NodeKind::Transform(t) => KindRecord::Transform {
                transform: t.into(),
            },
            NodeKind::PivotTransform(t) => KindRecord::PivotTransform {
                transform: t.into(),
            },
            NodeKind::Locator {
                transform,
                shape,
                size,
            } => KindRecord::Locator {
                transform: transform.into(),
                shape: *shape,
                size: *size,
            },
            NodeKind::Curve { transform, closed } => KindRecord::Curve {
                transform: transform.into(),
                closed: *closed,
            },
            NodeKind::CurvePoint { position } => KindRecord::CurvePoint {
                position: position.to_array(),
            },
            NodeKind::Layer(data) => KindRecord::Layer {
                visible: data.visible,
                selectable: data.selectable,
                color: data.color.to_array(),
                members,
            },
        }
    }

    pub fn to_kind(&self) -> NodeKind {
        match self {
            KindRecord::Transform { transform } => NodeKind::Transform(transform.to_data()),
            KindRecord::PivotTransform { transform } => NodeKind::PivotTransform(transform.to_data()),
            KindRecord::Locator {
                transform,
                shape,
                size,
            } => NodeKind::Locator {
                transform: transform.to_data(),
                shape: *shape,
                size: *size,
            },
            KindRecord::Curve { transform, closed } => NodeKind::Curve {
                transform: transform.to_data(),
                closed: *closed,
            },
            KindRecord::CurvePoint { position } => NodeKind::CurvePoint {
                position: Vec3::from_array(*position),
            },
            KindRecord::Layer {
                visible,
                selectable,
                color,
                ..
            } => NodeKind::Layer(LayerData {
                visible: *visible,
                selectable: *selectable,
                color: Color::new(color[0], color[1], color[2], color[3]),
            }),
        }
    }

    fn is_layer(&self) -> bool {
        matches!(self, KindRecord::Layer { .. })
    }
}

impl SceneDocument {
    pub fn parse(content: &str, format: DocumentFormat) -> Result<Self> {
        Ok(match format {
            DocumentFormat::Toml => toml::from_str(content)?,
            DocumentFormat::Json => serde_json::from_str(content)?,
        })
    }

    pub fn to_string(&self, format: DocumentFormat) -> Result<String> {
        Ok(match format {
            DocumentFormat::Toml => toml::to_string_pretty(self)?,
            DocumentFormat::Json => serde_json::to_string_pretty(self)?,
        })
    }

    /// Load a document, picking the format from the extension
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        Self::parse(&content, DocumentFormat::from_path(path))
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let content = self.to_string(DocumentFormat::from_path(path))?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Reject documents that cannot be imported without leaving the scene
    /// half built: null or repeated ids, and parent cycles
    pub fn validate(&self) -> Result<()> {
        let mut parents = HashMap::with_capacity(self.nodes.len());
        for record in &self.nodes {
            if record.id.is_null() {
                return Err(TesseraError::ImportError(format!(
                    "node '{}' has a null id",
                    record.name
                )));
            }
            if parents.insert(record.id, record.parent_id).is_some() {
                return Err(TesseraError::DuplicateId(record.id.to_string()));
            }
        }

        for record in &self.nodes {
            let mut seen = HashSet::new();
            let mut current = record.id;
            while let Some(&parent) = parents.get(&current) {
                if !seen.insert(current) {
                    return Err(TesseraError::ImportError(format!(
                        "parent cycle through '{}'",
                        record.name
                    )));
                }
                if parent.is_null() {
                    break;
                }
                current = parent;
            }
        }
        Ok(())
    }
}

/// How imported ids are treated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportAction {
    /// Keep persisted ids; only ids already in use are replaced
    Load,
    /// Give every imported node a fresh id
    Import,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportFlags {
    /// With `Load`, replace scene nodes that share an id instead of
    /// remapping the incoming ones
    pub merge: bool,
    /// Select the imported top-level nodes
    pub select: bool,
}

impl Scene {
    /// Parse and import a document. On a parse error nothing changes.
    pub fn import_str(
        &mut self,
        content: &str,
        format: DocumentFormat,
        action: ImportAction,
        flags: ImportFlags,
    ) -> Result<Option<SceneCommand>> {
        let document = match SceneDocument::parse(content, format) {
            Ok(document) => document,
            Err(err) => {
                log::error!("import aborted: {}", err);
                self.status(format!("Import failed: {}", err));
                return Err(err);
            }
        };
        self.import_scene_nodes(&document.nodes, action, flags)
    }

    /// Build nodes from records in two passes: create everything, then link
    /// by persisted parent id.
    ///
    /// Returns the command that takes the imported nodes out again.
    pub fn import_scene_nodes(
        &mut self,
        records: &[NodeRecord],
        action: ImportAction,
        flags: ImportFlags,
    ) -> Result<Option<SceneCommand>> {
        let document = SceneDocument {
            nodes: records.to_vec(),
        };
        if let Err(err) = document.validate() {
            log::error!("import aborted: {}", err);
            self.status(format!("Import failed: {}", err));
            return Err(err);
        }
        if records.is_empty() {
            return Ok(None);
        }

        // Replaced nodes leave through the normal path so listeners hear
        // about it; everything created below stays silent until it is done.
        let mut replaced = BatchUndoCommand::new();
        if action == ImportAction::Load && flags.merge {
            if let Err(err) = self.remove_replaced(records, &mut replaced) {
                return Err(self.abort_import(err, replaced, BatchUndoCommand::new(), &[]));
            }
        }

        let remapped_before = self.remapped_ids.clone();
        let mut created = BatchUndoCommand::new();
        let mut imported = Vec::with_capacity(records.len());
        self.importing = true;
        let result = self.import_records(records, action, &mut created, &mut imported);
        if let Err(err) = result {
            self.remapped_ids = remapped_before;
            return Err(self.abort_import(err, replaced, created, &imported));
        }
        self.importing = false;

        let mut batch = BatchUndoCommand::new().with_description("Import");
        batch.push_opt(replaced.into_command());
        batch.push_opt(created.into_command());

        self.evaluate(true)?;
        if flags.select {
            let top: Vec<NodeKey> = imported
                .iter()
                .copied()
                .filter(|k| self.parent(*k) == Some(self.root))
                .collect();
            batch.push(SelectionCommand::apply(self, top));
        }

        for &key in &imported {
            if !self.nodes.get(key).map(|n| n.transient).unwrap_or(true) {
                self.raise(SceneEvent::NodeAdded(key));
            }
        }
        log::info!("imported {} node(s)", imported.len());
        self.status(format!("Imported {} node(s)", imported.len()));
        Ok(batch.into_command())
    }

    fn import_records(
        &mut self,
        records: &[NodeRecord],
        action: ImportAction,
        batch: &mut BatchUndoCommand<Scene>,
        keys: &mut Vec<NodeKey>,
    ) -> Result<()> {
        let mut ids = HashMap::with_capacity(records.len());
        for record in records {
            let id = match action {
                ImportAction::Import => SceneId::new(),
                ImportAction::Load if self.ids.contains_key(&record.id) => SceneId::new(),
                ImportAction::Load => record.id,
            };
            if id != record.id {
                self.remapped_ids.insert(record.id, id);
            }
            ids.insert(record.id, id);
        }

        // Pass 1: create every node, detached
        let mut created = HashMap::with_capacity(records.len());
        for record in records {
            let key = self.create_node_with_id(ids[&record.id], record.kind.to_kind(), &record.name);
            self.node_mut(key)?.hidden = record.hidden;
            created.insert(record.id, key);
            keys.push(key);
        }

        // Pass 2: link children to parents from the document or the scene
        let mut top = Vec::new();
        for (record, &key) in records.iter().zip(keys.iter()) {
            if record.kind.is_layer() {
                top.push(key);
                continue;
            }
            let parent = if record.parent_id.is_null() {
                None
            } else {
                created
                    .get(&record.parent_id)
                    .copied()
                    .or_else(|| self.find_by_id(record.parent_id))
            };
            match parent {
                Some(parent) if created.contains_key(&record.parent_id) => {
                    self.set_parent(key, Some(parent))?;
                }
                Some(parent) => {
                    self.set_parent(key, Some(parent))?;
                    top.push(key);
                }
                None => {
                    if !record.parent_id.is_null() {
                        log::debug!(
                            "import: parent {} of '{}' not found, using root",
                            record.parent_id,
                            record.name
                        );
                    }
                    top.push(key);
                }
            }
        }

        for &key in &top {
            batch.push(SceneNodeExistenceCommand::add(self, key)?);
        }

        for (record, &key) in records.iter().zip(keys.iter()) {
            let KindRecord::Layer { members, .. } = &record.kind else {
                continue;
            };
            for member in members {
                let target = created
                    .get(member)
                    .copied()
                    .or_else(|| self.find_by_id(*member));
                match target {
                    Some(target) => {
                        self.join_layer(target, key)?;
                    }
                    None => log::debug!("import: layer member {} not found", member),
                }
            }
        }

        Ok(())
    }

    /// Take out scene nodes whose ids the incoming records claim
    fn remove_replaced(
        &mut self,
        records: &[NodeRecord],
        batch: &mut BatchUndoCommand<Scene>,
    ) -> Result<()> {
        for record in records {
            if let Some(existing) = self.find_by_id(record.id) {
                if existing != self.root {
                    log::debug!("import: replacing '{}'", record.name);
                    batch.push(SceneNodeExistenceCommand::remove(self, existing)?);
                }
            }
        }
        Ok(())
    }

    /// Undo a failed import and hand back its error.
    ///
    /// Created nodes are taken out while `importing` is still set, so
    /// listeners never hear about nodes they were never told were added.
    /// Replaced nodes come back with the usual notifications.
    fn abort_import(
        &mut self,
        err: TesseraError,
        mut replaced: BatchUndoCommand<Scene>,
        mut created: BatchUndoCommand<Scene>,
        keys: &[NodeKey],
    ) -> TesseraError {
        log::error!("import aborted, rolling back: {}", err);
        self.importing = true;
        if let Err(rollback) = created.undo(self) {
            log::error!("import rollback failed: {}", rollback);
        }
        self.discard_unregistered(keys);
        self.importing = false;
        if let Err(rollback) = replaced.undo(self) {
            log::error!("restoring replaced nodes failed: {}", rollback);
        }
        if let Err(eval) = self.evaluate(true) {
            log::error!("evaluation after import rollback failed: {}", eval);
        }
        self.status(format!("Import failed: {}", err));
        err
    }

    /// Drop nodes a failed import created but never registered
    fn discard_unregistered(&mut self, keys: &[NodeKey]) {
        for &key in keys.iter().rev() {
            if self.is_registered(key) {
                continue;
            }
            self.detached.remove(&key);
            self.hierarchy.forget(key);
            self.graph.remove_node(key);
            self.nodes.remove(key);
        }
    }

    /// Records for every persisted node, depth first from the root, then
    /// the layers
    pub fn export(&self) -> SceneDocument {
        let mut nodes = Vec::new();
        self.hierarchy.traverse(self.root, &mut |key| {
            if key == self.root {
                return TraversalAction::Continue;
            }
            let Some(node) = self.nodes.get(key) else {
                return TraversalAction::Prune;
            };
            if node.transient {
                return TraversalAction::Prune;
            }
            let parent_id = match self.hierarchy.parent(key) {
                Some(p) if p != self.root => self.nodes.get(p).map(|n| n.id).unwrap_or_default(),
                _ => SceneId::NULL,
            };
            nodes.push(NodeRecord {
                id: node.id,
                parent_id,
                name: node.name.clone(),
                hidden: node.hidden,
                kind: KindRecord::from_kind(&node.kind, Vec::new()),
            });
            TraversalAction::Continue
        });

        let mut layers = self.layers();
        layers.sort_by_key(|k| self.nodes.get(*k).map(|n| n.name.clone()));
        for layer in layers {
            let Some(node) = self.nodes.get(layer) else {
                continue;
            };
            if node.transient {
                continue;
            }
            let members = self
                .layer_members(layer)
                .into_iter()
                .filter_map(|m| self.nodes.get(m))
                .filter(|m| !m.transient)
                .map(|m| m.id)
                .collect();
            nodes.push(NodeRecord {
                id: node.id,
                parent_id: SceneId::NULL,
                name: node.name.clone(),
                hidden: node.hidden,
                kind: KindRecord::from_kind(&node.kind, members),
            });
        }
        SceneDocument { nodes }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn record(id: u128, parent: u128, name: &str, kind: KindRecord) -> NodeRecord {
        NodeRecord {
            id: SceneId::from_u128(id),
            parent_id: SceneId::from_u128(parent),
            name: name.to_string(),
            hidden: false,
            kind,
        }
    }

    fn transform(x: f32) -> KindRecord {
        KindRecord::Transform {
            transform: TransformRecord {
                translate: [x, 0.0, 0.0],
                ..TransformRecord::default()
            },
        }
    }

    fn names(scene: &Scene, keys: &[NodeKey]) -> Vec<String> {
        keys.iter()
            .map(|k| scene.node(*k).unwrap().name().to_string())
            .collect()
    }

    #[test]
    fn test_children_before_parents() {
        let records = vec![
            record(3, 2, "grandchild", transform(1.0)),
            record(2, 1, "child", transform(1.0)),
            record(1, 0, "top", transform(1.0)),
        ];
        let mut scene = Scene::new();
        let command = scene
            .import_scene_nodes(&records, ImportAction::Load, ImportFlags::default())
            .unwrap()
            .unwrap();
        assert!(scene.push(command));

        let top = scene.find_by_id(SceneId::from_u128(1)).unwrap();
        let child = scene.find_by_id(SceneId::from_u128(2)).unwrap();
        let grandchild = scene.find_by_id(SceneId::from_u128(3)).unwrap();
        assert_eq!(scene.children(scene.root()), &[top]);
        assert_eq!(scene.children(top), &[child]);
        assert_eq!(scene.children(child), &[grandchild]);
        assert_eq!(scene.path(grandchild), "|top|child|grandchild");
        let x = scene.global_transform(grandchild).w_axis.x;
        assert!((x - 3.0).abs() < 0.001);
        scene.validate().unwrap();

        scene.undo().unwrap();
        assert!(scene.is_empty());
        scene.validate().unwrap();
    }

    #[test]
    fn test_import_remaps_ids() {
        let records = vec![
            record(1, 0, "a", transform(0.0)),
            record(2, 1, "b", transform(0.0)),
        ];
        let mut scene = Scene::new();
        scene
            .import_scene_nodes(&records, ImportAction::Load, ImportFlags::default())
            .unwrap();
        let events = Rc::new(RefCell::new(0));
        let counter = events.clone();
        scene.add_listener(move |e| {
            if matches!(e, SceneEvent::NodeAdded(_)) {
                *counter.borrow_mut() += 1;
            }
        });

        let flags = ImportFlags {
            select: true,
            ..ImportFlags::default()
        };
        scene
            .import_scene_nodes(&records, ImportAction::Load, flags)
            .unwrap();
        assert_eq!(*events.borrow(), 2);
        assert_eq!(scene.len(), 5);

        let new_a = scene.remapped_id(SceneId::from_u128(1)).unwrap();
        let new_b = scene.remapped_id(SceneId::from_u128(2)).unwrap();
        let a1 = scene.find_by_id(new_a).unwrap();
        let b1 = scene.find_by_id(new_b).unwrap();
        assert_eq!(names(&scene, &[a1, b1]), vec!["a1", "b1"]);
        assert_eq!(scene.parent(b1), Some(a1));
        assert_eq!(scene.selection(), &[a1]);

        scene
            .import_scene_nodes(&records, ImportAction::Import, ImportFlags::default())
            .unwrap();
        assert_eq!(scene.len(), 7);
        scene.validate().unwrap();
    }

    #[test]
    fn test_merge_replaces_existing_nodes() {
        let mut scene = Scene::new();
        scene
            .import_scene_nodes(
                &[record(1, 0, "a", transform(0.0))],
                ImportAction::Load,
                ImportFlags::default(),
            )
            .unwrap();
        let old = scene.find_by_id(SceneId::from_u128(1)).unwrap();

        let flags = ImportFlags {
            merge: true,
            ..ImportFlags::default()
        };
        let mut command = scene
            .import_scene_nodes(&[record(1, 0, "a", transform(5.0))], ImportAction::Load, flags)
            .unwrap()
            .unwrap();
        let new = scene.find_by_id(SceneId::from_u128(1)).unwrap();
        assert_ne!(new, old);
        assert_eq!(scene.node(new).unwrap().name(), "a");
        assert_eq!(scene.len(), 2);

        command.undo(&mut scene).unwrap();
        assert_eq!(scene.find_by_id(SceneId::from_u128(1)), Some(old));
        scene.validate().unwrap();
    }

    #[test]
    fn test_invalid_documents_change_nothing() {
        let mut scene = Scene::new();
        let duplicate = vec![
            record(1, 0, "a", transform(0.0)),
            record(1, 0, "b", transform(0.0)),
        ];
        assert!(matches!(
            scene.import_scene_nodes(&duplicate, ImportAction::Load, ImportFlags::default()),
            Err(TesseraError::DuplicateId(_))
        ));

        let cycle = vec![
            record(1, 2, "a", transform(0.0)),
            record(2, 1, "b", transform(0.0)),
        ];
        assert!(scene
            .import_scene_nodes(&cycle, ImportAction::Load, ImportFlags::default())
            .is_err());

        let null = vec![record(0, 0, "a", transform(0.0))];
        assert!(scene
            .import_scene_nodes(&null, ImportAction::Load, ImportFlags::default())
            .is_err());

        assert!(scene
            .import_str("nodes = [", DocumentFormat::Toml, ImportAction::Load, ImportFlags::default())
            .is_err());
        assert!(scene
            .import_str("{\"nodes\": 3}", DocumentFormat::Json, ImportAction::Load, ImportFlags::default())
            .is_err());

        assert!(scene.is_empty());
        assert!(scene.is_editable());
        assert_eq!(scene.graph().len(), 1);
    }

    fn layer(id: u128, name: &str, members: &[u128]) -> NodeRecord {
        record(
            id,
            0,
            name,
            KindRecord::Layer {
                visible: true,
                selectable: true,
                color: Color::WHITE.to_array(),
                members: members.iter().map(|m| SceneId::from_u128(*m)).collect(),
            },
        )
    }

    fn node_events(scene: &mut Scene) -> Rc<RefCell<Vec<SceneEvent>>> {
        let events = Rc::new(RefCell::new(Vec::new()));
        let sink = events.clone();
        scene.add_listener(move |e| {
            if matches!(
                e,
                SceneEvent::NodeAdded(_) | SceneEvent::NodeRemoving(_) | SceneEvent::NodeRemoved(_)
            ) {
                sink.borrow_mut().push(e.clone());
            }
        });
        events
    }

    #[test]
    fn test_failed_import_leaves_no_trace() {
        let mut scene = Scene::new();
        scene
            .import_scene_nodes(
                &[record(1, 0, "a", transform(0.0))],
                ImportAction::Load,
                ImportFlags::default(),
            )
            .unwrap();
        let events = node_events(&mut scene);

        // A layer cannot be a member of another layer; that is only found
        // once the nodes exist.
        let records = vec![
            record(1, 0, "a", transform(1.0)),
            layer(2, "l1", &[]),
            layer(3, "l2", &[2]),
        ];
        assert!(matches!(
            scene.import_scene_nodes(&records, ImportAction::Load, ImportFlags::default()),
            Err(TesseraError::InvalidOperation(_))
        ));

        assert!(events.borrow().is_empty());
        assert_eq!(scene.len(), 2);
        assert!(scene.detached.is_empty());
        assert!(scene.remapped_id(SceneId::from_u128(1)).is_none());
        assert!(scene.find_by_name("l1").is_none());
        assert!(scene.layers().is_empty());
        assert!(!scene.is_importing());
        assert_eq!(scene.graph().len(), 2);
        assert_eq!(scene.nodes.len(), 2);
        scene.validate().unwrap();
    }

    #[test]
    fn test_failed_merge_restores_replaced_nodes() {
        let mut scene = Scene::new();
        scene
            .import_scene_nodes(
                &[record(1, 0, "a", transform(0.0))],
                ImportAction::Load,
                ImportFlags::default(),
            )
            .unwrap();
        let old = scene.find_by_id(SceneId::from_u128(1)).unwrap();
        let events = node_events(&mut scene);

        let flags = ImportFlags {
            merge: true,
            ..ImportFlags::default()
        };
        let records = vec![record(1, 0, "a", transform(1.0)), layer(2, "l1", &[1, 3]), layer(3, "l2", &[])];
        assert!(scene
            .import_scene_nodes(&records, ImportAction::Load, flags)
            .is_err());

        assert_eq!(scene.find_by_id(SceneId::from_u128(1)), Some(old));
        assert_eq!(scene.parent(old), Some(scene.root()));
        assert_eq!(
            *events.borrow(),
            vec![
                SceneEvent::NodeRemoving(old),
                SceneEvent::NodeRemoved(old),
                SceneEvent::NodeAdded(old),
            ]
        );
        assert!(scene.detached.is_empty());
        assert_eq!(scene.len(), 2);
        scene.validate().unwrap();
    }

    #[test]
    fn test_toml_document() {
        let content = r#"
[[nodes]]
id = "00000000-0000-0000-0000-000000000002"
parent_id = "00000000-0000-0000-0000-000000000001"
name = "marker"
type = "locator"
shape = "cube"
size = 2.0

[[nodes]]
id = "00000000-0000-0000-0000-000000000001"
name = "rig"
type = "pivot_transform"

[nodes.transform]
translate = [0.0, 3.0, 0.0]

[[nodes]]
id = "00000000-0000-0000-0000-000000000003"
name = "props"
type = "layer"
visible = false
members = ["00000000-0000-0000-0000-000000000002"]
"#;
        let mut scene = Scene::new();
        scene
            .import_str(content, DocumentFormat::Toml, ImportAction::Load, ImportFlags::default())
            .unwrap();

        let rig = scene.find_by_name("rig").unwrap();
        let marker = scene.find_by_path("|rig|marker").unwrap();
        let layer = scene.find_by_name("props").unwrap();
        assert_eq!(scene.parent(marker), Some(rig));
        assert_eq!(scene.layer_members(layer), vec![marker]);
        assert!(!scene.node(marker).unwrap().is_visible());
        assert!(scene.node(rig).unwrap().is_visible());
        assert!((scene.components(rig).unwrap().translate.y - 3.0).abs() < 0.001);
        assert!(matches!(
            scene.node(marker).unwrap().kind(),
            NodeKind::Locator { shape: LocatorShape::Cube, .. }
        ));
    }

    #[test]
    fn test_export_round_trip() {
        let mut scene = Scene::new();
        let a = scene.create_node(NodeKind::group(), "a");
        scene.add_object(a).unwrap();
        let b = scene.create_node(NodeKind::locator(LocatorShape::Cross, 3.0), "b");
        scene.add_object(b).unwrap();
        scene.set_parent(b, Some(a)).unwrap();
        scene.set_translate(b, Vec3::new(1.0, 2.0, 3.0)).unwrap();
        scene.set_hidden(b, true).unwrap();
        let temp = scene.create_node(NodeKind::transform(), "temp");
        scene.add_object(temp).unwrap();
        scene.set_transient(temp, true).unwrap();
        let layer = scene.create_layer("layer").unwrap();
        scene.join_layer(a, layer).unwrap();
        let curve = scene.create_node(NodeKind::curve(true), "curve");
        scene.add_object(curve).unwrap();
        scene.add_curve_point(curve, Vec3::ONE).unwrap();

        let document = scene.export();
        assert_eq!(document.nodes.len(), 5);
        assert!(document.nodes.iter().all(|n| n.name != "temp"));

        for format in [DocumentFormat::Toml, DocumentFormat::Json] {
            let text = document.to_string(format).unwrap();
            let parsed = SceneDocument::parse(&text, format).unwrap();
            assert_eq!(parsed, document);

            let mut copy = Scene::new();
            copy.import_str(&text, format, ImportAction::Load, ImportFlags::default())
                .unwrap();
            assert_eq!(copy.export(), document);
            let b = copy.find_by_path("|a|b").unwrap();
            assert!(copy.node(b).unwrap().is_hidden());
            assert_eq!(copy.components(b).unwrap().translate, Vec3::new(1.0, 2.0, 3.0));
            copy.validate().unwrap();
        }
    }

    #[test]
    fn test_document_file_round_trip() {
        let mut scene = Scene::new();
        let a = scene.create_node(NodeKind::transform(), "a");
        scene.add_object(a).unwrap();
        let document = scene.export();

        let path = std::env::temp_dir().join(format!("tessera-{}.json", SceneId::new()));
        document.save(&path).unwrap();
        let loaded = SceneDocument::load(&path).unwrap();
        let _ = fs::remove_file(&path);
        assert_eq!(loaded, document);
        assert_eq!(DocumentFormat::from_path(&path), DocumentFormat::Json);
    }
}
