//! Scene summary command

use super::load_scene;
use anyhow::Result;
use std::collections::BTreeMap;

pub fn run(path: &str, settings: Option<&str>) -> Result<()> {
    let scene = load_scene(path, settings)?;

    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    let mut hidden = 0;
    for key in scene.node_keys() {
        if key == scene.root() {
            continue;
        }
        let Ok(node) = scene.node(key) else {
            continue;
        };
        *counts.entry(node.tag().to_string()).or_default() += 1;
        if node.is_hidden() {
            hidden += 1;
        }
    }

    println!("Scene: {}", path);
    println!("Nodes: {}", scene.len() - 1);
    println!("Hidden: {}", hidden);
    println!("Layers: {}", scene.layers().len());
    if !counts.is_empty() {
        println!("By kind:");
        for (kind, count) in &counts {
            println!("  {:<16} {}", kind, count);
        }
    }

    let bounds = scene.world_bounds(scene.root());
    if !bounds.is_empty() {
        println!(
            "Bounds: [{:.3}, {:.3}, {:.3}] .. [{:.3}, {:.3}, {:.3}]",
            bounds.min.x, bounds.min.y, bounds.min.z, bounds.max.x, bounds.max.y, bounds.max.z
        );
    }
    Ok(())
}
