//! Scene nodes and the node hierarchy
//!
//! Nodes live in a flat arena owned by [`SceneGraph`]. The parent link is a
//! plain index back-reference and children are an ordered index list, so the
//! graph has a single owner and no reference cycles. World matrices are
//! cached on each node and recomputed top-down once per frame.

use glam::{Mat4, Quat, Vec3};

use crate::animation::PropertyValue;
use crate::error::{GltfError, Result};

/// A node of the scene hierarchy
#[derive(Debug, Clone)]
pub struct Node {
    /// Optional node name from the document
    pub name: Option<String>,
    /// Local translation
    pub translation: Vec3,
    /// Local rotation (unit quaternion)
    pub rotation: Quat,
    /// Local scale
    pub scale: Vec3,
    /// Explicit local matrix; when set it is used instead of translation/rotation/scale
    pub matrix: Option<Mat4>,
    /// Meshes drawn at this node
    pub meshes: Vec<usize>,
    /// Skin used by the meshes of this node
    pub skin: Option<usize>,
    world_matrix: Mat4,
    parent: Option<usize>,
    children: Vec<usize>,
}

impl Default for Node {
    fn default() -> Self {
        Self {
            name: None,
            translation: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
            matrix: None,
            meshes: Vec::new(),
            skin: None,
            world_matrix: Mat4::IDENTITY,
            parent: None,
            children: Vec::new(),
        }
    }
}

impl Node {
    /// Create an unparented node with an identity transform
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Default::default()
        }
    }

    /// Create an unparented node from translation, rotation and scale
    pub fn from_trs(translation: Vec3, rotation: Quat, scale: Vec3) -> Self {
        Self {
            translation,
            rotation,
            scale,
            ..Default::default()
        }
    }

    /// Local transform matrix
    pub fn local_matrix(&self) -> Mat4 {
        self.matrix.unwrap_or_else(|| {
            Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.translation)
        })
    }

    /// World matrix as of the last [`SceneGraph::update_world_matrices`]
    pub fn world_matrix(&self) -> Mat4 {
        self.world_matrix
    }

    pub fn parent(&self) -> Option<usize> {
        self.parent
    }

    /// Children in document order
    pub fn children(&self) -> &[usize] {
        &self.children
    }

    /// Write an animated property onto the local transform
    pub fn apply(&mut self, value: PropertyValue) {
        match value {
            PropertyValue::Translation(translation) => self.translation = translation,
            PropertyValue::Rotation(rotation) => self.rotation = rotation,
            PropertyValue::Scale(scale) => self.scale = scale,
        }
    }

    /// Replace an explicit matrix by its translation/rotation/scale decomposition
    pub fn decompose_matrix(&mut self) {
        if let Some(matrix) = self.matrix.take() {
            let (scale, rotation, translation) = matrix.to_scale_rotation_translation();
            self.translation = translation;
            self.rotation = rotation;
            self.scale = scale;
        }
    }
}

/// A node paired with the matrix accumulated along its path from a root
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlattenedNode {
    pub node: usize,
    pub matrix: Mat4,
}

/// Owner of all nodes of a scene
#[derive(Debug, Clone, Default)]
pub struct SceneGraph {
    nodes: Vec<Node>,
}

impl SceneGraph {
    /// Build a graph from unrelated nodes; parent links are set afterwards
    /// with [`SceneGraph::set_parent`]
    pub fn new(nodes: Vec<Node>) -> Self {
        let mut nodes = nodes;
        for node in &mut nodes {
            node.parent = None;
            node.children.clear();
        }
        Self { nodes }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, index: usize) -> Option<&Node> {
        self.nodes.get(index)
    }

    pub fn node_mut(&mut self, index: usize) -> Option<&mut Node> {
        self.nodes.get_mut(index)
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Mutable access to the nodes; parent/child links stay private
    pub fn nodes_mut(&mut self) -> &mut [Node] {
        &mut self.nodes
    }

    /// World matrix of a node, if it exists
    pub fn world_matrix(&self, index: usize) -> Option<Mat4> {
        self.nodes.get(index).map(Node::world_matrix)
    }

    /// First node with the given name
    pub fn find_by_name(&self, name: &str) -> Option<usize> {
        self.nodes
            .iter()
            .position(|node| node.name.as_deref() == Some(name))
    }

    /// Nodes without a parent, in index order
    pub fn roots(&self) -> Vec<usize> {
        self.nodes
            .iter()
            .enumerate()
            .filter(|(_, node)| node.parent.is_none())
            .map(|(index, _)| index)
            .collect()
    }

    fn check_index(&self, index: usize) -> Result<()> {
        if index < self.nodes.len() {
            Ok(())
        } else {
            Err(GltfError::ReferenceError(format!(
                "node {} does not exist ({} nodes)",
                index,
                self.nodes.len()
            )))
        }
    }

    /// Whether `ancestor` is `node` or lies on the path from `node` to its root
    pub fn is_ancestor(&self, ancestor: usize, node: usize) -> bool {
        let mut current = Some(node);
        while let Some(index) = current {
            if index == ancestor {
                return true;
            }
            current = self.nodes.get(index).and_then(|n| n.parent);
        }
        false
    }

    /// Move `child` under `parent` (or make it a root with `None`)
    ///
    /// The child is detached from its previous parent first and appended to
    /// the end of the new parent's child list. Links that would make a node
    /// its own ancestor are refused.
    pub fn set_parent(&mut self, child: usize, parent: Option<usize>) -> Result<()> {
        self.check_index(child)?;
        if let Some(parent) = parent {
            self.check_index(parent)?;
            if self.is_ancestor(child, parent) {
                return Err(GltfError::ValidationError(format!(
                    "making node {} a child of node {} would create a cycle",
                    child, parent
                )));
            }
        }

        if let Some(old_parent) = self.nodes[child].parent.take() {
            self.nodes[old_parent].children.retain(|&c| c != child);
        }

        if let Some(parent) = parent {
            self.nodes[parent].children.push(child);
            self.nodes[child].parent = Some(parent);
        }

        Ok(())
    }

    /// Recompute the world matrix of every node, roots first
    pub fn update_world_matrices(&mut self) {
        for root in self.roots() {
            self.update_world_matrix(root, None);
        }
    }

    /// Recompute the world matrix of `index` and its whole subtree
    ///
    /// `parent_world` is the already up to date world matrix of the parent,
    /// `None` for a root.
    pub fn update_world_matrix(&mut self, index: usize, parent_world: Option<Mat4>) {
        let Some(node) = self.nodes.get_mut(index) else {
            return;
        };

        let local = node.local_matrix();
        let world = match parent_world {
            Some(parent_world) => parent_world * local,
            None => local,
        };
        node.world_matrix = world;

        for i in 0..self.nodes[index].children.len() {
            let child = self.nodes[index].children[i];
            self.update_world_matrix(child, Some(world));
        }
    }

    /// Depth-first list of the subtree under `root` with accumulated local matrices
    ///
    /// Parents precede their children. The matrices are computed from local
    /// transforms only and do not read or touch the cached world matrices.
    pub fn flatten(&self, root: usize) -> Vec<FlattenedNode> {
        let mut out = Vec::new();
        let mut stack = vec![(root, Mat4::IDENTITY)];

        while let Some((index, parent_matrix)) = stack.pop() {
            let Some(node) = self.nodes.get(index) else {
                continue;
            };
            let matrix = parent_matrix * node.local_matrix();
            out.push(FlattenedNode {
                node: index,
                matrix,
            });
            // Reverse so the first child is visited first
            for &child in node.children.iter().rev() {
                stack.push((child, matrix));
            }
        }

        out
    }
}
