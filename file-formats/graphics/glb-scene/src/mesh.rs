//! Meshes and their drawable primitives

use std::collections::BTreeMap;

use crate::error::{GltfError, Result};
use crate::schema;

/// Topology code for triangle lists, the only supported mode
pub const MODE_TRIANGLES: u32 = 4;

/// A drawable piece of a mesh, referencing accessors by index
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Primitive {
    /// `POSITION` accessor
    pub position: usize,
    /// `NORMAL` accessor
    pub normal: Option<usize>,
    /// `JOINTS_0` accessor
    pub joints: Option<usize>,
    /// `WEIGHTS_0` accessor
    pub weights: Option<usize>,
    /// Every attribute semantic to accessor index, including the ones above
    pub attributes: BTreeMap<String, usize>,
    /// Index accessor, if the primitive is indexed
    pub indices: Option<usize>,
    pub material: Option<usize>,
}

impl Primitive {
    /// Build a primitive from its document description
    pub fn from_schema(mesh: usize, index: usize, primitive: &schema::Primitive) -> Result<Self> {
        let mode = primitive.mode.unwrap_or(MODE_TRIANGLES);
        if mode != MODE_TRIANGLES {
            log::error!(
                "Mesh {} primitive {} uses topology mode {}",
                mesh,
                index,
                mode
            );
            return Err(GltfError::UnsupportedTopology(mode));
        }
        let Some(&position) = primitive.attributes.get("POSITION") else {
            return Err(GltfError::ValidationError(format!(
                "mesh {} primitive {} has no POSITION attribute",
                mesh, index
            )));
        };

        Ok(Self {
            position,
            normal: primitive.attributes.get("NORMAL").copied(),
            joints: primitive.attributes.get("JOINTS_0").copied(),
            weights: primitive.attributes.get("WEIGHTS_0").copied(),
            attributes: primitive.attributes.clone(),
            indices: primitive.indices,
            material: primitive.material,
        })
    }

    /// Accessor index of an attribute semantic
    pub fn attribute(&self, semantic: &str) -> Option<usize> {
        self.attributes.get(semantic).copied()
    }

    /// Whether the primitive carries joint indices and weights
    pub fn is_skinned(&self) -> bool {
        self.joints.is_some() && self.weights.is_some()
    }
}

/// A named list of primitives
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mesh {
    pub name: Option<String>,
    pub primitives: Vec<Primitive>,
}

impl Mesh {
    pub fn from_schema(index: usize, mesh: &schema::Mesh) -> Result<Self> {
        let primitives = mesh
            .primitives
            .iter()
            .enumerate()
            .map(|(i, primitive)| Primitive::from_schema(index, i, primitive))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            name: mesh.name.clone(),
            primitives,
        })
    }

    /// Every accessor referenced by the primitives, attributes first
    pub fn accessors(&self) -> impl Iterator<Item = usize> + '_ {
        self.primitives.iter().flat_map(|primitive| {
            primitive
                .attributes
                .values()
                .copied()
                .chain(primitive.indices)
        })
    }
}
