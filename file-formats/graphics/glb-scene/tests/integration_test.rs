//! Integration tests for loading and animating GLB scenes

mod common;

use common::*;
use glam::{Mat4, Quat, Vec3};
use pretty_assertions::assert_eq;
use serde_json::json;

use glb_scene::{
    AnimatedInstance, BufferUsage, GlbContainer, GltfError, GpuDevice, LoadOptions,
    PlaybackStatus, Scene,
};

fn load(data: Vec<u8>) -> glb_scene::Result<Scene> {
    Scene::from_glb(data, &LoadOptions::default())
}

fn character() -> Scene {
    load(skinned_character()).expect("character loads")
}

#[derive(Default)]
struct RecordingDevice {
    buffers: Vec<(String, BufferUsage, usize)>,
}

impl GpuDevice for RecordingDevice {
    type Buffer = usize;

    fn create_buffer(&mut self, label: &str, usage: BufferUsage, contents: &[u8]) -> usize {
        self.buffers.push((label.to_string(), usage, contents.len()));
        self.buffers.len() - 1
    }
}

#[test]
fn test_container_header_words() {
    let json = br#"{"asset":{"version":"2.0"}}"#;
    let data = glb(json, Some(&[1, 2, 3, 4]));

    let words: Vec<u32> = data[..20]
        .chunks_exact(4)
        .map(|w| u32::from_le_bytes([w[0], w[1], w[2], w[3]]))
        .collect();
    assert_eq!(words[0], 0x4654_6C67);
    assert_eq!(words[1], 2);
    assert_eq!(words[2] as usize, data.len());
    assert_eq!(words[4], 0x4E4F_534A);

    let container = GlbContainer::parse(data).unwrap();
    assert_eq!(container.header().version, 2);
    assert_eq!(container.document().asset.version, "2.0");
    assert_eq!(container.binary_chunk().unwrap().as_ref(), &[1, 2, 3, 4]);
}

#[test]
fn test_wrong_json_chunk_tag_fails() {
    let mut data = glb(br#"{"asset":{"version":"2.0"}}"#, None);
    data[16..20].copy_from_slice(&0x4E4F_534Bu32.to_le_bytes());

    match GlbContainer::parse(data) {
        Err(GltfError::InvalidChunkType { expected, actual }) => {
            assert_eq!(expected, 0x4E4F_534A);
            assert_eq!(actual, 0x4E4F_534B);
        }
        other => panic!("expected InvalidChunkType, got {other:?}"),
    }
}

#[test]
fn test_load_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("character.glb");
    std::fs::write(&path, skinned_character()).unwrap();

    let scene = Scene::load(&path, &LoadOptions::default()).unwrap();
    assert_eq!(scene.nodes().len(), 4);

    assert!(matches!(
        Scene::load(dir.path().join("missing.glb"), &LoadOptions::default()),
        Err(GltfError::Io(_))
    ));
}

#[test]
fn test_scene_structure() {
    let scene = character();

    assert_eq!(scene.nodes().len(), 4);
    assert_eq!(scene.roots(), &[0]);
    assert_eq!(scene.meshes().len(), 1);
    assert_eq!(scene.skins().len(), 1);
    assert_eq!(scene.animations().len(), 2);
    assert_eq!(scene.clip_names().collect::<Vec<_>>(), vec!["Bend", "Grow"]);

    assert_eq!(scene.node_by_name("knee"), Some(2));
    assert_eq!(scene.node_by_name("tail"), None);
    assert_eq!(scene.nodes()[0].children(), &[1, 3]);
    assert_eq!(scene.nodes()[2].parent(), Some(1));

    let skin = scene.skin(0).unwrap();
    assert_eq!(skin.name(), Some("rig"));
    assert_eq!(skin.joints(), &[1, 2]);
    assert_eq!(scene.skin_root(0), Some(3));

    let primitive = &scene.meshes()[0].primitives[0];
    assert!(primitive.is_skinned());
    assert_eq!(primitive.indices, Some(3));

    let clip = scene.clip_by_name("Bend").unwrap();
    assert_eq!(clip.duration(), 1.0);
    assert_eq!(clip.channels().len(), 2);
}

#[test]
fn test_world_matrix_composition() {
    let scene = character();
    let nodes = scene.nodes();

    for node in nodes {
        let expected = match node.parent() {
            Some(parent) => nodes[parent].world_matrix() * node.local_matrix(),
            None => node.local_matrix(),
        };
        assert_mat4_near(node.world_matrix(), expected);
    }

    assert_mat4_near(
        nodes[2].world_matrix(),
        Mat4::from_translation(Vec3::new(0.0, 2.0, 0.0)),
    );
}

#[test]
fn test_initial_joint_matrices() {
    let scene = character();
    let skin = scene.skin(0).unwrap();

    // Relative to the body node at x = 2
    assert_mat4_near(
        skin.joint_matrices()[0],
        Mat4::from_translation(Vec3::new(-2.0, 1.0, 0.0)),
    );
    assert_mat4_near(
        skin.joint_matrices()[1],
        Mat4::from_translation(Vec3::new(-2.0, 2.0, 0.0)),
    );

    // Bind pose relative to the body node leaves only the body offset
    for matrix in skin.skinning_matrices() {
        assert_mat4_near(matrix, Mat4::from_translation(Vec3::new(-2.0, 0.0, 0.0)));
    }
    assert_eq!(skin.joint_matrix_bytes().len(), 2 * 16 * 4);
}

#[test]
fn test_identity_skin_yields_identity_joints() {
    let mut builder = GlbBuilder::new();
    let inverse_bind = builder.add_mat4(&[Mat4::IDENTITY, Mat4::IDENTITY]);
    let scene = load(builder.finish(json!({
        "nodes": [
            { "name": "owner", "skin": 0 },
            { "name": "a" },
            { "name": "b" }
        ],
        "skins": [{ "joints": [1, 2], "inverseBindMatrices": inverse_bind }]
    })))
    .unwrap();

    let skin = scene.skin(0).unwrap();
    assert_eq!(skin.joint_matrices(), &[Mat4::IDENTITY, Mat4::IDENTITY]);
    // No scenes: every parentless node is a root
    assert_eq!(scene.roots(), &[0, 1, 2]);
}

#[test]
fn test_accessor_reads() {
    let scene = character();
    let primitive = &scene.meshes()[0].primitives[0];

    let positions = scene.accessor(primitive.position).unwrap().read_vec3().unwrap();
    assert_eq!(positions[2], Vec3::new(0.0, 2.0, 0.0));

    let indices = scene
        .accessor(primitive.indices.unwrap())
        .unwrap()
        .read_as_u32();
    assert_eq!(indices, vec![0, 1, 2]);

    let joints = scene.accessor(primitive.joints.unwrap()).unwrap().read_as_f32();
    assert_eq!(&joints[4..8], &[0.0, 1.0, 0.0, 0.0]);
}

#[test]
fn test_buffer_usage_and_upload() {
    let mut scene = character();
    let primitive = scene.meshes()[0].primitives[0].clone();
    let position_view = scene.accessor(primitive.position).unwrap().buffer_view();
    let index_view = scene.accessor(primitive.indices.unwrap()).unwrap().buffer_view();

    assert_eq!(
        scene.buffer_view(position_view).unwrap().usage(),
        BufferUsage::VERTEX
    );
    assert_eq!(
        scene.buffer_view(index_view).unwrap().usage(),
        BufferUsage::INDEX
    );

    let mut device = RecordingDevice::default();
    let uploaded = scene.upload_buffers(&mut device);
    // positions, joints, weights, indices
    assert_eq!(uploaded.len(), 4);
    assert!(device.buffers.iter().all(|(_, _, len)| len % 4 == 0));
    assert!(scene.buffer_view(index_view).unwrap().is_uploaded());

    // Animation and skin data stay on the CPU
    let inverse_bind_view = scene.accessor(4).unwrap().buffer_view();
    assert!(!scene.buffer_view(inverse_bind_view).unwrap().is_uploaded());

    assert!(scene.upload_buffers(&mut device).is_empty());
    assert_eq!(device.buffers.len(), 4);
}

#[test]
fn test_update_order_animation_world_skin() {
    let mut instance = AnimatedInstance::new(character());
    instance.set_clip("Bend").unwrap();
    instance.play();
    assert!(instance.update(0.5));

    let scene = instance.scene();
    // Exactly on the middle keyframe
    assert_eq!(scene.nodes()[1].translation, Vec3::new(0.0, 2.0, 0.0));

    let knee = scene.nodes()[2].rotation;
    let expected = Quat::from_rotation_z(std::f32::consts::FRAC_PI_4);
    assert!(knee.abs_diff_eq(expected, 1e-5), "{knee:?} != {expected:?}");

    // World matrices and joint matrices reflect the new pose
    assert!(
        scene.nodes()[2]
            .world_matrix()
            .w_axis
            .truncate()
            .abs_diff_eq(Vec3::new(0.0, 3.0, 0.0), 1e-5)
    );
    let joint = scene.skin(0).unwrap().joint_matrices()[1];
    assert!(
        joint
            .w_axis
            .truncate()
            .abs_diff_eq(Vec3::new(-2.0, 3.0, 0.0), 1e-5)
    );
}

#[test]
fn test_stop_restores_first_keyframe() {
    let mut instance = AnimatedInstance::new(character());
    instance.play();
    instance.update(0.3);
    instance.stop();

    assert_eq!(instance.status(), PlaybackStatus::Stopped);
    assert_eq!(instance.player().unwrap().time(), 0.0);

    let nodes = instance.scene().nodes();
    assert_eq!(nodes[1].translation, Vec3::new(0.0, 1.0, 0.0));
    assert_eq!(nodes[2].rotation, Quat::IDENTITY);
    assert_mat4_near(
        instance.scene().skin(0).unwrap().joint_matrices()[0],
        Mat4::from_translation(Vec3::new(-2.0, 1.0, 0.0)),
    );
}

#[test]
fn test_looping_wraps_time() {
    let mut instance = AnimatedInstance::new(character());
    instance.play();
    instance.update(1.25);

    let player = instance.player().unwrap();
    assert!((player.time() - 0.25).abs() < 1e-6);
    assert_eq!(player.status(), PlaybackStatus::Playing);

    for _ in 0..100 {
        instance.update(0.37);
    }
    let time = instance.player().unwrap().time();
    assert!((0.0..=1.0).contains(&time));
}

#[test]
fn test_non_looping_clamps_and_pauses() {
    let mut instance = AnimatedInstance::new(character());
    instance.set_looping(false);
    instance.play();
    instance.update(1.5);

    let player = instance.player().unwrap();
    assert_eq!(player.time(), 1.0);
    assert_eq!(player.status(), PlaybackStatus::Paused);
    assert_eq!(instance.scene().nodes()[1].translation, Vec3::new(0.0, 1.0, 0.0));

    // Paused instances do not advance
    assert!(!instance.update(0.1));
}

#[test]
fn test_pause_keeps_time() {
    let mut instance = AnimatedInstance::new(character());
    instance.play();
    instance.update(0.25);
    instance.pause();
    instance.update(0.25);

    assert_eq!(instance.status(), PlaybackStatus::Paused);
    assert_eq!(instance.player().unwrap().time(), 0.25);

    instance.play();
    instance.update(0.25);
    assert_eq!(instance.player().unwrap().time(), 0.5);
}

#[test]
fn test_speed_multiplier() {
    let mut instance = AnimatedInstance::new(character());
    instance.set_speed(0.5);
    instance.play();
    instance.update(1.0);
    assert_eq!(instance.player().unwrap().time(), 0.5);
    assert_eq!(instance.scene().nodes()[1].translation, Vec3::new(0.0, 2.0, 0.0));
}

#[test]
fn test_step_clip() {
    let mut instance = AnimatedInstance::new(character());
    instance.set_clip("Grow").unwrap();
    instance.play();

    instance.update(0.9);
    assert_eq!(instance.scene().nodes()[1].scale, Vec3::ONE);

    instance.set_looping(false);
    instance.update(0.2);
    assert_eq!(instance.scene().nodes()[1].scale, Vec3::splat(2.0));
}

#[test]
fn test_unknown_clip_is_recoverable() {
    let mut instance = AnimatedInstance::new(character());
    instance.play();
    instance.update(0.25);

    let err = instance.set_clip("Fly").unwrap_err();
    assert!(matches!(err, GltfError::UnknownClip(_)));
    assert!(err.is_recoverable());

    let player = instance.player().unwrap();
    assert_eq!(player.current_clip().name(), "Bend");
    assert_eq!(player.time(), 0.25);
    assert_eq!(player.status(), PlaybackStatus::Playing);
}

#[test]
fn test_static_instance_has_no_player() {
    let scene = load(GlbBuilder::new().finish(json!({ "nodes": [{ "name": "lonely" }] }))).unwrap();
    let mut instance = AnimatedInstance::new(scene);

    assert!(instance.player().is_none());
    assert!(matches!(
        instance.set_clip("Walk"),
        Err(GltfError::NoAnimationPlayer)
    ));
    instance.play();
    assert!(!instance.update(1.0));
    assert_eq!(instance.status(), PlaybackStatus::Stopped);
}

#[test]
fn test_paused_instance_refreshes_matrices() {
    let mut instance = AnimatedInstance::new(character());
    instance.play();
    instance.update(0.1);
    instance.pause();

    instance.scene_mut().nodes_mut()[1].translation = Vec3::new(0.0, 5.0, 0.0);
    assert!(!instance.update(1.0 / 60.0));

    let scene = instance.scene();
    assert_eq!(instance.player().unwrap().time(), 0.1);
    assert_mat4_near(
        scene.nodes()[1].world_matrix(),
        Mat4::from_translation(Vec3::new(0.0, 5.0, 0.0)),
    );
    assert_mat4_near(
        scene.skins()[0].joint_matrices()[0],
        Mat4::from_translation(Vec3::new(-2.0, 5.0, 0.0)),
    );
}

#[test]
fn test_static_instance_refreshes_matrices() {
    let scene = load(GlbBuilder::new().finish(json!({
        "nodes": [{ "name": "parent", "children": [1] }, { "name": "child" }]
    })))
    .unwrap();
    let mut instance = AnimatedInstance::new(scene);

    instance.scene_mut().nodes_mut()[0].translation = Vec3::new(1.0, 2.0, 3.0);
    assert!(!instance.update(0.0));

    let scene = instance.into_scene();
    assert_mat4_near(
        scene.nodes()[1].world_matrix(),
        Mat4::from_translation(Vec3::new(1.0, 2.0, 3.0)),
    );
}

#[test]
fn test_cubic_spline_clip() {
    let mut builder = GlbBuilder::new();
    let times = builder.add_f32(&[0.0, 1.0], "SCALAR", None);
    // (in-tangent, value, out-tangent) per keyframe, flat tangents
    let values = builder.add_vec3(&[
        Vec3::ZERO,
        Vec3::ZERO,
        Vec3::ZERO,
        Vec3::ZERO,
        Vec3::new(2.0, 0.0, 0.0),
        Vec3::ZERO,
    ]);
    let scene = load(builder.finish(json!({
        "nodes": [{ "name": "mover" }],
        "animations": [{
            "channels": [{ "sampler": 0, "target": { "node": 0, "path": "translation" } }],
            "samplers": [{ "input": times, "output": values, "interpolation": "CUBICSPLINE" }]
        }]
    })))
    .unwrap();
    assert_eq!(scene.clip_names().collect::<Vec<_>>(), vec!["animation_0"]);

    let mut instance = AnimatedInstance::new(scene);
    instance.play();
    instance.update(0.5);
    let x = instance.scene().nodes()[0].translation.x;
    assert!((x - 1.0).abs() < 1e-5, "{x}");
}

#[test]
fn test_weights_channel_is_skipped() {
    let mut builder = GlbBuilder::new();
    let times = builder.add_f32(&[0.0, 1.0], "SCALAR", None);
    let weights = builder.add_f32(&[0.0, 1.0], "SCALAR", None);
    let scene = load(builder.finish(json!({
        "nodes": [{ "name": "face" }],
        "animations": [{
            "name": "Blink",
            "channels": [{ "sampler": 0, "target": { "node": 0, "path": "weights" } }],
            "samplers": [{ "input": times, "output": weights }]
        }]
    })))
    .unwrap();

    let clip = scene.clip_by_name("Blink").unwrap();
    assert!(clip.channels().is_empty());
}

#[test]
fn test_animated_matrix_is_decomposed() {
    let mut builder = GlbBuilder::new();
    let times = builder.add_f32(&[0.0, 1.0], "SCALAR", None);
    let scale = builder.add_vec3(&[Vec3::ONE, Vec3::splat(3.0)]);
    let document = json!({
        "nodes": [{
            "name": "m",
            "matrix": [1.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 4.0, 5.0, 6.0, 1.0]
        }],
        "animations": [{
            "channels": [{ "sampler": 0, "target": { "node": 0, "path": "scale" } }],
            "samplers": [{ "input": times, "output": scale }]
        }]
    });
    let data = builder.finish(document);

    let scene = load(data.clone()).unwrap();
    let node = &scene.nodes()[0];
    assert!(node.matrix.is_none());
    assert!(node.translation.abs_diff_eq(Vec3::new(4.0, 5.0, 6.0), 1e-6));

    let options = LoadOptions {
        decompose_animated_matrices: false,
        ..Default::default()
    };
    let scene = Scene::from_glb(data, &options).unwrap();
    assert!(scene.nodes()[0].matrix.is_some());
}

mod errors {
    use super::*;

    fn positions(builder: &mut GlbBuilder) -> usize {
        builder.add_f32(&[0.0; 9], "VEC3", Some(34962))
    }

    #[test]
    fn test_unsupported_component_type() {
        let mut builder = GlbBuilder::new();
        let accessor = positions(&mut builder);
        builder.patch_accessor(accessor, "componentType", json!(5130));
        let err = load(builder.finish(json!({}))).unwrap_err();
        assert!(matches!(err, GltfError::UnsupportedComponentType(5130)));
        assert!(err.to_string().contains("Unsupported accessor type"));
    }

    #[test]
    fn test_unsupported_structure_type() {
        let mut builder = GlbBuilder::new();
        let accessor = positions(&mut builder);
        builder.patch_accessor(accessor, "type", json!("VEC5"));
        assert!(matches!(
            load(builder.finish(json!({}))),
            Err(GltfError::UnsupportedStructureType(_))
        ));
    }

    #[test]
    fn test_unsupported_topology() {
        let mut builder = GlbBuilder::new();
        let accessor = positions(&mut builder);
        let err = load(builder.finish(json!({
            "meshes": [{ "primitives": [{ "attributes": { "POSITION": accessor }, "mode": 1 }] }]
        })))
        .unwrap_err();
        assert!(matches!(err, GltfError::UnsupportedTopology(1)));
    }

    #[test]
    fn test_missing_inverse_bind_matrices() {
        let err = load(GlbBuilder::new().finish(json!({
            "nodes": [{ "skin": 0 }, {}],
            "skins": [{ "joints": [1] }]
        })))
        .unwrap_err();
        assert!(matches!(err, GltfError::UnsupportedFeature(_)));
    }

    #[test]
    fn test_inverse_bind_matrices_wrong_type() {
        let mut builder = GlbBuilder::new();
        let not_matrices = builder.add_f32(&[0.0; 16], "VEC4", None);
        let err = load(builder.finish(json!({
            "nodes": [{ "skin": 0 }, {}],
            "skins": [{ "joints": [1], "inverseBindMatrices": not_matrices }]
        })))
        .unwrap_err();
        assert!(matches!(err, GltfError::UnsupportedFeature(_)));
    }

    #[test]
    fn test_undefined_joint() {
        let mut builder = GlbBuilder::new();
        let inverse_bind = builder.add_mat4(&[Mat4::IDENTITY]);
        let err = load(builder.finish(json!({
            "nodes": [{ "skin": 0 }],
            "skins": [{ "joints": [7], "inverseBindMatrices": inverse_bind }]
        })))
        .unwrap_err();
        assert!(matches!(err, GltfError::ReferenceError(_)));
    }

    #[test]
    fn test_too_many_joints() {
        let mut builder = GlbBuilder::new();
        let inverse_bind = builder.add_mat4(&[Mat4::IDENTITY; 3]);
        let data = builder.finish(json!({
            "nodes": [{ "skin": 0 }, {}, {}, {}],
            "skins": [{ "joints": [1, 2, 3], "inverseBindMatrices": inverse_bind }]
        }));
        let options = LoadOptions {
            max_joints: 2,
            ..Default::default()
        };
        assert!(matches!(
            Scene::from_glb(data, &options),
            Err(GltfError::ValidationError(_))
        ));
    }

    #[test]
    fn test_accessor_references_missing_view() {
        let mut builder = GlbBuilder::new();
        let accessor = positions(&mut builder);
        builder.patch_accessor(accessor, "bufferView", json!(9));
        assert!(matches!(
            load(builder.finish(json!({}))),
            Err(GltfError::ReferenceError(_))
        ));
    }

    #[test]
    fn test_accessor_overruns_view() {
        let mut builder = GlbBuilder::new();
        let accessor = positions(&mut builder);
        builder.patch_accessor(accessor, "count", json!(4));
        assert!(matches!(
            load(builder.finish(json!({}))),
            Err(GltfError::ValidationError(_))
        ));
    }

    #[test]
    fn test_missing_binary_chunk() {
        let data = glb(
            br#"{"asset":{"version":"2.0"},"buffers":[{"byteLength":4}]}"#,
            None,
        );
        assert!(matches!(load(data), Err(GltfError::MissingBinaryChunk(_))));
    }

    #[test]
    fn test_external_buffer_uri() {
        let data = glb(
            br#"{"asset":{"version":"2.0"},"buffers":[{"byteLength":4,"uri":"data.bin"}]}"#,
            None,
        );
        assert!(matches!(load(data), Err(GltfError::UnsupportedFeature(_))));
    }

    #[test]
    fn test_multiple_parents() {
        let err = load(GlbBuilder::new().finish(json!({
            "nodes": [{ "children": [2] }, { "children": [2] }, {}]
        })))
        .unwrap_err();
        assert!(matches!(err, GltfError::ValidationError(_)));
    }

    #[test]
    fn test_cycle() {
        let err = load(GlbBuilder::new().finish(json!({
            "nodes": [{ "children": [1] }, { "children": [0] }]
        })))
        .unwrap_err();
        assert!(matches!(err, GltfError::ValidationError(_)));
    }

    #[test]
    fn test_missing_mesh() {
        assert!(matches!(
            load(GlbBuilder::new().finish(json!({ "nodes": [{ "mesh": 0 }] }))),
            Err(GltfError::ReferenceError(_))
        ));
    }

    #[test]
    fn test_invalid_json() {
        let data = glb(br#"{"asset":"#, None);
        assert!(matches!(load(data), Err(GltfError::Json(_))));
    }
}
