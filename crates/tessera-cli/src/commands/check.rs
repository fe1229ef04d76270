//! Integrity check command

use super::load_scene;
use anyhow::Result;

pub fn run(path: &str, settings: Option<&str>) -> Result<()> {
    let scene = load_scene(path, settings)?;

    match scene.validate() {
        Ok(()) => {
            println!(
                "{}: {} node(s), graph and hierarchy consistent",
                path,
                scene.len() - 1
            );
            Ok(())
        }
        Err(err) => anyhow::bail!("{}: integrity check failed: {}", path, err),
    }
}
