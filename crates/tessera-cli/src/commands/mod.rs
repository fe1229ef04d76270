//! CLI command implementations

pub mod check;
pub mod export;
pub mod info;
pub mod tree;

use anyhow::{Context, Result};
use std::path::Path;
use tessera_scene::{ImportAction, ImportFlags, Scene, SceneDocument, SceneSettings};

/// Load settings (if given) and build a scene from the document at `path`
pub fn load_scene(path: &str, settings: Option<&str>) -> Result<Scene> {
    let mut settings = match settings {
        Some(file) => SceneSettings::load_from_file(Path::new(file))
            .with_context(|| format!("Failed to load settings: {}", file))?,
        None => SceneSettings::default(),
    };
    settings.apply_env_overrides();

    let document =
        SceneDocument::load(path).with_context(|| format!("Failed to read scene: {}", path))?;

    log::debug!("loaded {} record(s) from {}", document.nodes.len(), path);

    let mut scene = Scene::with_settings(settings);
    scene
        .import_scene_nodes(&document.nodes, ImportAction::Load, ImportFlags::default())
        .with_context(|| format!("Failed to import scene: {}", path))?;
    Ok(scene)
}
