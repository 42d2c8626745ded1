//! `tree` command: node hierarchy

use anyhow::{Context, Result};
use glb_scene::{LoadOptions, Scene};
use std::collections::HashSet;
use std::path::Path;

use crate::utils::{NodeType, TreeNode, TreeOptions, format_quat, format_vec3, render_tree};

pub fn execute(
    path: &Path,
    max_depth: Option<usize>,
    show_metadata: bool,
    no_color: bool,
    options: &LoadOptions,
) -> Result<()> {
    let scene = Scene::load(path, options)
        .with_context(|| format!("Failed to load GLB file from {}", path.display()))?;

    let root = build_tree(&scene, &file_label(path));
    let tree_options = TreeOptions {
        max_depth,
        no_color,
        show_metadata,
    };
    print!("{}", render_tree(&root, &tree_options));
    Ok(())
}

fn file_label(path: &Path) -> String {
    path.file_name()
        .map_or_else(|| path.display().to_string(), |name| name.to_string_lossy().into_owned())
}

/// Build the display tree of the scene's root nodes
pub fn build_tree(scene: &Scene, label: &str) -> TreeNode {
    let joints: HashSet<usize> = scene
        .skins()
        .iter()
        .flat_map(|skin| skin.joints().iter().copied())
        .collect();

    scene
        .roots()
        .iter()
        .fold(TreeNode::new(label, NodeType::Scene), |tree, &root| {
            tree.add_child(build_node(scene, root, &joints))
        })
}

fn build_node(scene: &Scene, index: usize, joints: &HashSet<usize>) -> TreeNode {
    let node = &scene.nodes()[index];
    let name = match &node.name {
        Some(name) => format!("{name} (#{index})"),
        None => format!("#{index}"),
    };

    let node_type = if joints.contains(&index) {
        NodeType::Joint
    } else if !node.meshes.is_empty() {
        NodeType::Mesh
    } else {
        NodeType::Node
    };

    let mut tree = TreeNode::new(name, node_type);
    if node.matrix.is_some() {
        tree = tree.with_metadata("matrix", "explicit");
    } else {
        tree = tree
            .with_metadata("translation", format_vec3(node.translation))
            .with_metadata("rotation", format_quat(node.rotation))
            .with_metadata("scale", format_vec3(node.scale));
    }
    for &mesh in &node.meshes {
        let mesh_name = scene.meshes()[mesh].name.as_deref().unwrap_or("<unnamed>");
        tree = tree.with_metadata("mesh", format!("{mesh} {mesh_name}"));
    }
    if let Some(skin) = node.skin {
        tree = tree.with_metadata("skin", skin.to_string());
    }

    node.children().iter().fold(tree, |tree, &child| {
        tree.add_child(build_node(scene, child, joints))
    })
}
