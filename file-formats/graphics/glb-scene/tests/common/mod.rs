//! Common test utilities: in-memory GLB construction

#![allow(dead_code)]

use glam::{Mat4, Quat, Vec3};
use serde_json::{Value, json};

pub const COMPONENT_U8: u32 = 5121;
pub const COMPONENT_U16: u32 = 5123;
pub const COMPONENT_F32: u32 = 5126;

/// Route library logs to the test harness; set `RUST_LOG` to see them
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Assemble a GLB container from a JSON payload and an optional binary payload
///
/// The JSON chunk is padded with spaces and the binary chunk with zeros, as
/// the format requires.
pub fn glb(json: &[u8], bin: Option<&[u8]>) -> Vec<u8> {
    let mut json = json.to_vec();
    while json.len() % 4 != 0 {
        json.push(b' ');
    }
    let bin = bin.map(|bin| {
        let mut bin = bin.to_vec();
        while bin.len() % 4 != 0 {
            bin.push(0);
        }
        bin
    });

    let total = 12 + 8 + json.len() + bin.as_ref().map_or(0, |bin| 8 + bin.len());
    let mut data = Vec::with_capacity(total);
    data.extend_from_slice(&0x4654_6C67u32.to_le_bytes());
    data.extend_from_slice(&2u32.to_le_bytes());
    data.extend_from_slice(&(total as u32).to_le_bytes());
    data.extend_from_slice(&(json.len() as u32).to_le_bytes());
    data.extend_from_slice(&0x4E4F_534Au32.to_le_bytes());
    data.extend_from_slice(&json);
    if let Some(bin) = bin {
        data.extend_from_slice(&(bin.len() as u32).to_le_bytes());
        data.extend_from_slice(&0x004E_4942u32.to_le_bytes());
        data.extend_from_slice(&bin);
    }
    data
}

/// Builds the binary chunk together with its buffer views and accessors
#[derive(Default)]
pub struct GlbBuilder {
    bin: Vec<u8>,
    views: Vec<Value>,
    accessors: Vec<Value>,
}

impl GlbBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append raw bytes as a new buffer view plus one accessor over it
    pub fn add_raw(
        &mut self,
        bytes: &[u8],
        component_type: u32,
        count: usize,
        structure_type: &str,
        target: Option<u32>,
    ) -> usize {
        while self.bin.len() % 4 != 0 {
            self.bin.push(0);
        }
        let mut view = json!({
            "buffer": 0,
            "byteOffset": self.bin.len(),
            "byteLength": bytes.len(),
        });
        if let Some(target) = target {
            view["target"] = json!(target);
        }
        self.bin.extend_from_slice(bytes);
        self.views.push(view);

        self.accessors.push(json!({
            "bufferView": self.views.len() - 1,
            "componentType": component_type,
            "count": count,
            "type": structure_type,
        }));
        self.accessors.len() - 1
    }

    pub fn add_f32(&mut self, values: &[f32], structure_type: &str, target: Option<u32>) -> usize {
        let width = components(structure_type);
        let bytes: Vec<u8> = values.iter().flat_map(|v| v.to_le_bytes()).collect();
        self.add_raw(&bytes, COMPONENT_F32, values.len() / width, structure_type, target)
    }

    pub fn add_u16(&mut self, values: &[u16], structure_type: &str, target: Option<u32>) -> usize {
        let width = components(structure_type);
        let bytes: Vec<u8> = values.iter().flat_map(|v| v.to_le_bytes()).collect();
        self.add_raw(&bytes, COMPONENT_U16, values.len() / width, structure_type, target)
    }

    pub fn add_vec3(&mut self, values: &[Vec3]) -> usize {
        let floats: Vec<f32> = values.iter().flat_map(|v| v.to_array()).collect();
        self.add_f32(&floats, "VEC3", None)
    }

    pub fn add_quats(&mut self, values: &[Quat]) -> usize {
        let floats: Vec<f32> = values.iter().flat_map(|q| q.to_array()).collect();
        self.add_f32(&floats, "VEC4", None)
    }

    pub fn add_mat4(&mut self, values: &[Mat4]) -> usize {
        let floats: Vec<f32> = values.iter().flat_map(|m| m.to_cols_array()).collect();
        self.add_f32(&floats, "MAT4", None)
    }

    /// Override a field of an accessor already added
    pub fn patch_accessor(&mut self, index: usize, key: &str, value: Value) {
        self.accessors[index][key] = value;
    }

    /// Merge `document` (nodes, meshes, skins, ...) with the accumulated
    /// buffer data and produce the container bytes
    pub fn finish(self, document: Value) -> Vec<u8> {
        let mut root = json!({ "asset": { "version": "2.0", "generator": "glb-scene tests" } });
        if let (Some(root), Value::Object(extra)) = (root.as_object_mut(), document) {
            root.extend(extra);
        }

        if self.bin.is_empty() {
            return glb(root.to_string().as_bytes(), None);
        }

        root["buffers"] = json!([{ "byteLength": self.bin.len() }]);
        root["bufferViews"] = Value::Array(self.views);
        root["accessors"] = Value::Array(self.accessors);
        glb(root.to_string().as_bytes(), Some(&self.bin))
    }
}

fn components(structure_type: &str) -> usize {
    match structure_type {
        "SCALAR" => 1,
        "VEC2" => 2,
        "VEC3" => 3,
        "VEC4" | "MAT2" => 4,
        "MAT3" => 9,
        "MAT4" => 16,
        other => panic!("unknown structure type {other}"),
    }
}

/// A small skinned character:
///
/// ```text
/// 0 root
/// +-- 1 hip   (joint 0, translation 0,1,0)
/// |   +-- 2 knee  (joint 1, translation 0,1,0)
/// +-- 3 body  (mesh 0, skin 0, translation 2,0,0)
/// ```
///
/// Clips: "Bend" (hip translation + knee rotation, 1s, linear) and
/// "Grow" (hip scale, 1s, step).
pub fn skinned_character() -> Vec<u8> {
    init_logging();
    let mut builder = GlbBuilder::new();

    let positions = builder.add_f32(
        &[0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 2.0, 0.0],
        "VEC3",
        Some(34962),
    );
    let joints = builder.add_u16(&[0, 0, 0, 0, 0, 1, 0, 0, 1, 0, 0, 0], "VEC4", Some(34962));
    let weights = builder.add_f32(
        &[1.0, 0.0, 0.0, 0.0, 0.5, 0.5, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0],
        "VEC4",
        Some(34962),
    );
    let indices = builder.add_u16(&[0, 1, 2], "SCALAR", Some(34963));
    let inverse_bind = builder.add_mat4(&[
        Mat4::from_translation(Vec3::new(0.0, -1.0, 0.0)),
        Mat4::from_translation(Vec3::new(0.0, -2.0, 0.0)),
    ]);

    let times = builder.add_f32(&[0.0, 0.5, 1.0], "SCALAR", None);
    let hip_translation = builder.add_vec3(&[
        Vec3::new(0.0, 1.0, 0.0),
        Vec3::new(0.0, 2.0, 0.0),
        Vec3::new(0.0, 1.0, 0.0),
    ]);
    let rotation_times = builder.add_f32(&[0.0, 1.0], "SCALAR", None);
    let knee_rotation = builder.add_quats(&[
        Quat::IDENTITY,
        Quat::from_rotation_z(std::f32::consts::FRAC_PI_2),
    ]);
    let hip_scale = builder.add_vec3(&[Vec3::ONE, Vec3::splat(2.0)]);

    builder.finish(json!({
        "scene": 0,
        "scenes": [{ "nodes": [0] }],
        "nodes": [
            { "name": "root", "children": [1, 3] },
            { "name": "hip", "translation": [0.0, 1.0, 0.0], "children": [2] },
            { "name": "knee", "translation": [0.0, 1.0, 0.0] },
            { "name": "body", "mesh": 0, "skin": 0, "translation": [2.0, 0.0, 0.0] }
        ],
        "meshes": [{
            "name": "body",
            "primitives": [{
                "attributes": { "POSITION": positions, "JOINTS_0": joints, "WEIGHTS_0": weights },
                "indices": indices
            }]
        }],
        "skins": [{ "name": "rig", "joints": [1, 2], "inverseBindMatrices": inverse_bind }],
        "animations": [
            {
                "name": "Bend",
                "channels": [
                    { "sampler": 0, "target": { "node": 1, "path": "translation" } },
                    { "sampler": 1, "target": { "node": 2, "path": "rotation" } }
                ],
                "samplers": [
                    { "input": times, "output": hip_translation },
                    { "input": rotation_times, "output": knee_rotation, "interpolation": "LINEAR" }
                ]
            },
            {
                "name": "Grow",
                "channels": [
                    { "sampler": 0, "target": { "node": 1, "path": "scale" } }
                ],
                "samplers": [
                    { "input": rotation_times, "output": hip_scale, "interpolation": "STEP" }
                ]
            }
        ]
    }))
}

/// Assert two matrices agree to 1e-5 per element
pub fn assert_mat4_near(actual: Mat4, expected: Mat4) {
    assert!(
        actual.abs_diff_eq(expected, 1e-5),
        "matrices differ:\n  actual:   {actual:?}\n  expected: {expected:?}"
    );
}
