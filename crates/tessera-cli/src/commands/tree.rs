//! Hierarchy listing command

use super::load_scene;
use anyhow::Result;
use tessera_scene::{NodeKey, Scene, TraversalAction};

pub fn run(path: &str, settings: Option<&str>, all: bool) -> Result<()> {
    let scene = load_scene(path, settings)?;
    let root = scene.root();

    scene.traverse_hierarchy(root, &mut |scene: &Scene, key: NodeKey| {
        if key == root {
            return TraversalAction::Continue;
        }
        let Ok(node) = scene.node(key) else {
            return TraversalAction::Prune;
        };
        if node.is_hidden() && !all {
            return TraversalAction::Prune;
        }

        let depth = depth_below(scene, key, root);
        let bounds = scene.world_bounds(key);
        let extent = if bounds.is_empty() {
            String::from("(empty)")
        } else {
            let c = bounds.center();
            let size = bounds.max - bounds.min;
            format!(
                "center [{:.2}, {:.2}, {:.2}] size [{:.2}, {:.2}, {:.2}]",
                c.x, c.y, c.z, size.x, size.y, size.z
            )
        };
        let flag = if node.is_hidden() { " hidden" } else { "" };
        println!(
            "{}{} ({}{}) {}",
            "  ".repeat(depth),
            node.name(),
            node.tag(),
            flag,
            extent
        );
        TraversalAction::Continue
    });

    let layers = scene.layers();
    if !layers.is_empty() {
        println!("Layers:");
        for layer in layers {
            let Ok(node) = scene.node(layer) else {
                continue;
            };
            println!("  {} ({} member(s))", node.name(), scene.layer_members(layer).len());
        }
    }
    Ok(())
}

fn depth_below(scene: &Scene, key: NodeKey, root: NodeKey) -> usize {
    let mut depth = 0;
    let mut current = scene.parent(key);
    while let Some(parent) = current {
        if parent == root {
            break;
        }
        depth += 1;
        current = scene.parent(parent);
    }
    depth
}
