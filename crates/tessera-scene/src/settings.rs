//! Per-scene editor settings
//!
//! Settings come from a TOML file (`scene.toml` next to the project by
//! convention); missing keys fall back to defaults, and a couple of
//! environment variables override the file:
//! - `TESSERA_READ_ONLY` - any value other than `0`/`false` locks editing
//! - `TESSERA_UNDO_DEPTH` - history length

use serde::{Deserialize, Serialize};
use std::path::Path;
use tessera_core::{Color, Result, TesseraError};

/// How nodes pick their display color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewColorMode {
    /// Color of the first layer the node belongs to
    #[default]
    Layer,
    /// Fixed color per node kind
    Type,
    /// One color for the whole scene
    Scene,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneSettings {
    #[serde(default = "default_undo_depth")]
    pub undo_depth: usize,
    /// Moving one pivot of a group moves the others with it
    #[serde(default = "default_true")]
    pub snap_pivots: bool,
    /// Edge length of the box used as a plain transform's own bounds
    #[serde(default = "default_transform_bounds_size")]
    pub transform_bounds_size: f32,
    #[serde(default)]
    pub color_mode: ViewColorMode,
    #[serde(default = "default_scene_color")]
    pub scene_color: [f32; 3],
    #[serde(default)]
    pub read_only: bool,
}

fn default_undo_depth() -> usize {
    100
}

fn default_true() -> bool {
    true
}

fn default_transform_bounds_size() -> f32 {
    1.0
}

fn default_scene_color() -> [f32; 3] {
    [0.6, 0.6, 0.6]
}

impl Default for SceneSettings {
    fn default() -> Self {
        Self {
            undo_depth: default_undo_depth(),
            snap_pivots: true,
            transform_bounds_size: default_transform_bounds_size(),
            color_mode: ViewColorMode::default(),
            scene_color: default_scene_color(),
            read_only: false,
        }
    }
}

impl SceneSettings {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Load settings from a file, then apply environment overrides
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let mut settings: SceneSettings = toml::from_str(&content).map_err(|e| {
            TesseraError::TomlParseError(format!("Failed to parse settings {}: {}", path.display(), e))
        })?;
        settings.apply_env_overrides();
        Ok(settings)
    }

    pub fn to_toml_string(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn apply_env_overrides(&mut self) {
        if let Ok(value) = std::env::var("TESSERA_READ_ONLY") {
            self.read_only = !matches!(value.trim(), "0" | "false" | "");
        }
        if let Ok(value) = std::env::var("TESSERA_UNDO_DEPTH") {
            match value.trim().parse::<usize>() {
                Ok(depth) => self.undo_depth = depth,
                Err(_) => log::warn!("ignoring TESSERA_UNDO_DEPTH={:?}", value),
            }
        }
    }

    pub fn scene_color(&self) -> Color {
        let [r, g, b] = self.scene_color;
        Color::new(r, g, b, 1.0)
    }
}
