//! `animate` command: simulate playback and dump joint matrices

use anyhow::{Context, Result, bail, ensure};
use glb_scene::{AnimatedInstance, GltfError, LoadOptions, Scene};
use std::path::Path;

use crate::utils::{format_mat4, format_quat, format_vec3};

/// Playback settings taken from the command line
#[derive(Debug, Clone)]
pub struct AnimateArgs {
    pub clip: Option<String>,
    pub time: f32,
    pub fps: f32,
    pub speed: f32,
    pub looping: bool,
}

pub fn execute(path: &Path, args: &AnimateArgs, options: &LoadOptions) -> Result<()> {
    ensure!(
        args.fps.is_finite() && args.fps > 0.0,
        "--fps must be a positive finite number, got {}",
        args.fps
    );
    ensure!(
        args.time.is_finite() && args.time >= 0.0,
        "--time must be a non-negative number of seconds, got {}",
        args.time
    );

    let scene = Scene::load(path, options)
        .with_context(|| format!("Failed to load GLB file from {}", path.display()))?;
    let mut instance = AnimatedInstance::new(scene);

    if let Some(clip) = &args.clip {
        match instance.set_clip(clip) {
            Ok(()) => {}
            Err(GltfError::UnknownClip(name)) => {
                let available: Vec<_> = instance.scene().clip_names().collect();
                bail!(
                    "No clip named '{}'. Available clips: {}",
                    name,
                    if available.is_empty() {
                        "none".to_string()
                    } else {
                        available.join(", ")
                    }
                );
            }
            Err(err) => return Err(err).context("Cannot select a clip"),
        }
    }

    let Some(player) = instance.player() else {
        println!("{} has no animations", path.display());
        return print_skins(&instance);
    };
    let clip_name = player.current_clip().name().to_string();

    instance.set_speed(args.speed);
    instance.set_looping(args.looping);
    instance.play();

    let total = args.time * args.fps;
    ensure!(
        total.is_finite(),
        "--time {} at --fps {} is too many frames",
        args.time,
        args.fps
    );
    let frames = total.ceil() as usize;
    let delta = if frames == 0 { 0.0 } else { args.time / frames as f32 };
    log::info!(
        "Playing '{}' for {} frames of {:.4}s",
        clip_name,
        frames,
        delta
    );
    for _ in 0..frames {
        instance.update(delta);
    }

    let Some(player) = instance.player() else {
        return Ok(());
    };
    println!("=== Playback ===");
    println!("Clip: {clip_name}");
    println!(
        "Time: {:.4}s / {:.4}s",
        player.time(),
        player.current_clip().duration()
    );
    println!("Status: {:?}", player.status());
    println!("Frames: {frames}");

    println!("\n=== Animated Nodes ===");
    let mut targets: Vec<usize> = player
        .current_clip()
        .channels()
        .iter()
        .map(|channel| channel.target_node)
        .collect();
    targets.sort_unstable();
    targets.dedup();
    for index in targets {
        let node = &instance.scene().nodes()[index];
        println!(
            "  #{} {}: t={} r={} s={}",
            index,
            node.name.as_deref().unwrap_or(""),
            format_vec3(node.translation),
            format_quat(node.rotation),
            format_vec3(node.scale)
        );
    }

    print_skins(&instance)
}

fn print_skins(instance: &AnimatedInstance) -> Result<()> {
    let scene = instance.scene();
    for (index, skin) in scene.skins().iter().enumerate() {
        println!(
            "\n=== Skin {} {} ===",
            index,
            skin.name().unwrap_or("<unnamed>")
        );
        for (joint, matrix) in skin.joints().iter().zip(skin.joint_matrices()) {
            let name = scene.nodes()[*joint].name.as_deref().unwrap_or("");
            println!("  joint #{joint} {name}");
            println!("{}", format_mat4(*matrix, "    "));
        }
    }
    Ok(())
}
