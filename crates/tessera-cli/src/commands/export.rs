//! Document conversion command

use super::load_scene;
use anyhow::{Context, Result};
use std::fs;
use tessera_scene::DocumentFormat;

pub fn run(path: &str, settings: Option<&str>, format: &str, output: Option<&str>) -> Result<()> {
    let scene = load_scene(path, settings)?;
    let format = match format {
        "json" => DocumentFormat::Json,
        _ => DocumentFormat::Toml,
    };
    let content = scene.export().to_string(format)?;

    match output {
        Some(out) => {
            fs::write(out, content).with_context(|| format!("Failed to write {}", out))?;
            println!("Exported {} node(s) to {}", scene.len() - 1, out);
        }
        None => print!("{}", content),
    }
    Ok(())
}
