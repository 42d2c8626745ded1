//! Options controlling how a container is validated and assembled

/// Options for loading a GLB container into a [`Scene`](crate::Scene)
#[derive(Debug, Clone)]
pub struct LoadOptions {
    /// Require the header's total length to match the buffer length exactly.
    /// When false, trailing bytes after the declared length are ignored.
    pub strict_length: bool,
    /// Maximum number of joints a single skin may reference
    pub max_joints: usize,
    /// Decompose an explicit node matrix into translation/rotation/scale when
    /// an animation channel targets that node. When false the matrix keeps
    /// overriding the animated values.
    pub decompose_animated_matrices: bool,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            strict_length: false,
            max_joints: 256,
            decompose_animated_matrices: true,
        }
    }
}
