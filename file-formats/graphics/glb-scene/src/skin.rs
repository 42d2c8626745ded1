//! Skeletal skins
//!
//! A skin lists the nodes acting as joints together with one inverse bind
//! matrix per joint. Every frame, after world matrices are up to date, the
//! joint matrices are recomputed relative to the node that owns the skinned
//! mesh:
//!
//! ```text
//! joint_matrix[j] = inverse(world(root)) * world(joints[j])
//! ```
//!
//! The renderer combines them with the inverse bind matrices; see
//! [`Skin::skinning_matrices`].

use glam::Mat4;

use crate::error::{GltfError, Result};
use crate::node::SceneGraph;

/// A set of joints and their bind pose
#[derive(Debug, Clone)]
pub struct Skin {
    name: Option<String>,
    joints: Vec<usize>,
    inverse_bind_matrices: Vec<Mat4>,
    skeleton: Option<usize>,
    joint_matrices: Vec<Mat4>,
}

impl Skin {
    /// Create a skin with identity joint matrices
    ///
    /// There must be exactly one inverse bind matrix per joint.
    pub fn new(
        name: Option<String>,
        joints: Vec<usize>,
        inverse_bind_matrices: Vec<Mat4>,
        skeleton: Option<usize>,
    ) -> Result<Self> {
        if joints.len() != inverse_bind_matrices.len() {
            return Err(GltfError::ValidationError(format!(
                "skin {} has {} joints but {} inverse bind matrices",
                name.as_deref().unwrap_or("<unnamed>"),
                joints.len(),
                inverse_bind_matrices.len()
            )));
        }

        let joint_matrices = vec![Mat4::IDENTITY; joints.len()];
        Ok(Self {
            name,
            joints,
            inverse_bind_matrices,
            skeleton,
            joint_matrices,
        })
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Node indices acting as joints, in joint order
    pub fn joints(&self) -> &[usize] {
        &self.joints
    }

    pub fn joint_count(&self) -> usize {
        self.joints.len()
    }

    pub fn inverse_bind_matrices(&self) -> &[Mat4] {
        &self.inverse_bind_matrices
    }

    /// The document's skeleton root hint
    pub fn skeleton(&self) -> Option<usize> {
        self.skeleton
    }

    /// Joint matrices as of the last [`Skin::update`]
    pub fn joint_matrices(&self) -> &[Mat4] {
        &self.joint_matrices
    }

    /// Recompute joint matrices relative to `root`
    ///
    /// World matrices in `graph` must be current. Joints that do not exist
    /// in `graph` keep their previous matrix. A singular root matrix leaves
    /// all joint matrices untouched.
    pub fn update(&mut self, root: usize, graph: &SceneGraph) {
        let Some(root_world) = graph.world_matrix(root) else {
            log::warn!("Skin root node {} does not exist", root);
            return;
        };

        let determinant = root_world.determinant();
        if determinant == 0.0 || !determinant.is_finite() {
            log::warn!("Skin root node {} has a singular world matrix", root);
            return;
        }
        let inverse_root = root_world.inverse();

        for (matrix, &joint) in self.joint_matrices.iter_mut().zip(&self.joints) {
            if let Some(joint_world) = graph.world_matrix(joint) {
                *matrix = inverse_root * joint_world;
            }
        }
    }

    /// Joint matrices multiplied by their inverse bind matrices
    ///
    /// These are the per-joint transforms a vertex shader applies to
    /// bind-pose vertices.
    pub fn skinning_matrices(&self) -> Vec<Mat4> {
        self.joint_matrices
            .iter()
            .zip(&self.inverse_bind_matrices)
            .map(|(joint, inverse_bind)| *joint * *inverse_bind)
            .collect()
    }

    /// Joint matrices as raw column-major bytes for a GPU buffer write
    pub fn joint_matrix_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(self.joint_matrices.as_slice())
    }
}
