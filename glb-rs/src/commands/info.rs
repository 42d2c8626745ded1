//! `info` command: container header and scene summary

use anyhow::{Context, Result};
use glb_scene::container::{CHUNK_TYPE_BIN, CHUNK_TYPE_JSON};
use glb_scene::{GlbContainer, LoadOptions, Scene};
use std::path::Path;

use crate::utils::{format_bytes, format_chunk_tag};

pub fn execute(path: &Path, detailed: bool, options: &LoadOptions) -> Result<()> {
    log::info!("Loading GLB file: {}", path.display());

    let container = GlbContainer::load_with_options(path, options)
        .with_context(|| format!("Failed to read GLB container from {}", path.display()))?;
    let scene = Scene::from_container(&container, options)
        .with_context(|| format!("Failed to assemble scene from {}", path.display()))?;

    let header = container.header();
    let document = container.document();

    println!("=== GLB Information ===");
    println!("File: {}", path.display());
    println!("Version: {}", header.version);
    println!("Total length: {}", format_bytes(u64::from(header.length)));
    println!(
        "{} chunk: {}",
        format_chunk_tag(CHUNK_TYPE_JSON),
        format_bytes(container.json_chunk().len() as u64)
    );
    match container.binary_chunk() {
        Some(binary) => println!(
            "{} chunk: {}",
            format_chunk_tag(CHUNK_TYPE_BIN).trim_end_matches('.'),
            format_bytes(binary.len() as u64)
        ),
        None => println!("BIN chunk: none"),
    }
    println!("Asset version: {}", document.asset.version);
    if let Some(generator) = &document.asset.generator {
        println!("Generator: {generator}");
    }

    println!("\n=== Scene ===");
    println!("Nodes: {}", scene.nodes().len());
    println!("Root nodes: {}", scene.roots().len());
    let primitives: usize = scene.meshes().iter().map(|mesh| mesh.primitives.len()).sum();
    println!("Meshes: {} ({} primitives)", scene.meshes().len(), primitives);
    println!("Skins: {}", scene.skins().len());
    for (index, skin) in scene.skins().iter().enumerate() {
        println!(
            "  [{}] {} - {} joints, root node {}",
            index,
            skin.name().unwrap_or("<unnamed>"),
            skin.joint_count(),
            scene
                .skin_root(index)
                .map_or_else(|| "none".to_string(), |root| root.to_string())
        );
    }
    println!("Animations: {}", scene.animations().len());
    for clip in scene.animations() {
        println!(
            "  {} - {:.3}s, {} channels",
            clip.name(),
            clip.duration(),
            clip.channels().len()
        );
    }

    if detailed {
        println!("\n=== Buffer Views ===");
        for view in scene.buffer_views() {
            println!(
                "  [{}] offset {}, {} bytes, stride {}, usage {:?}",
                view.index(),
                view.byte_offset(),
                view.byte_length(),
                view.byte_stride(),
                view.usage()
            );
        }

        println!("\n=== Accessors ===");
        for accessor in scene.accessors() {
            println!(
                "  [{}] {} x {} {:?} (view {}, offset {}, stride {})",
                accessor.index(),
                accessor.count(),
                accessor.structure_type(),
                accessor.component_type(),
                accessor.buffer_view(),
                accessor.byte_offset(),
                accessor.byte_stride()
            );
        }

        println!("\n=== Animation Channels ===");
        for clip in scene.animations() {
            println!("  {}:", clip.name());
            for channel in clip.channels() {
                let sampler = &clip.samplers()[channel.sampler];
                println!(
                    "    node {} {:?} <- {} keyframes, {:?}",
                    channel.target_node,
                    channel.target_property,
                    sampler.input().len(),
                    sampler.interpolation()
                );
            }
        }
    }

    Ok(())
}
