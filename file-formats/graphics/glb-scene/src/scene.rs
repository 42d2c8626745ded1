//! Scene assembly
//!
//! Turns a parsed [`GlbContainer`] into buffer views, accessors, meshes, the
//! node hierarchy, skins and animation clips. Every cross-reference in the
//! document is checked while building; a scene either loads completely or
//! not at all.

use bytes::Bytes;
use glam::{Mat4, Quat, Vec3};
use std::path::Path;
use std::sync::Arc;

use crate::accessor::{Accessor, ComponentType, StructureType};
use crate::animation::{
    AnimationChannel, AnimationClip, AnimationSampler, Interpolation, TargetProperty,
};
use crate::buffer_view::{BufferUsage, BufferView, GpuDevice};
use crate::container::GlbContainer;
use crate::error::{GltfError, Result};
use crate::mesh::Mesh;
use crate::node::{FlattenedNode, Node, SceneGraph};
use crate::options::LoadOptions;
use crate::schema::{self, Document, TargetPath};
use crate::skin::Skin;

/// A fully loaded GLB scene
#[derive(Debug, Clone)]
pub struct Scene {
    buffer_views: Vec<BufferView>,
    accessors: Vec<Accessor>,
    meshes: Vec<Mesh>,
    graph: SceneGraph,
    skins: Vec<Skin>,
    /// Node each skin's joint matrices are expressed relative to
    skin_roots: Vec<Option<usize>>,
    animations: Vec<Arc<AnimationClip>>,
    roots: Vec<usize>,
}

impl Scene {
    /// Parse and assemble a scene from GLB bytes
    pub fn from_glb(data: impl Into<Bytes>, options: &LoadOptions) -> Result<Self> {
        let container = GlbContainer::parse_with_options(data, options)?;
        Self::from_container(&container, options)
    }

    /// Read a GLB file and assemble its scene
    pub fn load<P: AsRef<Path>>(path: P, options: &LoadOptions) -> Result<Self> {
        let container = GlbContainer::load_with_options(path, options)?;
        Self::from_container(&container, options)
    }

    /// Assemble a scene from an already parsed container
    pub fn from_container(container: &GlbContainer, options: &LoadOptions) -> Result<Self> {
        let document = container.document();
        let binary = resolve_binary(document, container.binary_chunk())?;

        let mut buffer_views = build_buffer_views(document, binary.as_ref())?;
        let accessors = build_accessors(document, &buffer_views)?;
        let meshes = build_meshes(document, &accessors, &mut buffer_views)?;
        let mut graph = build_graph(document, meshes.len())?;
        let (skins, skin_roots) = build_skins(document, &accessors, &graph, options)?;
        let animations = build_animations(document, &accessors, &mut graph, options)?;
        let roots = resolve_roots(document, &graph)?;

        log::debug!(
            "Assembled scene: {} nodes, {} meshes, {} skins, {} animations, {} buffer views, {} accessors",
            graph.len(),
            meshes.len(),
            skins.len(),
            animations.len(),
            buffer_views.len(),
            accessors.len()
        );

        let mut scene = Self {
            buffer_views,
            accessors,
            meshes,
            graph,
            skins,
            skin_roots,
            animations,
            roots,
        };
        scene.update_world_matrices();
        scene.update_skins();
        Ok(scene)
    }

    pub fn buffer_views(&self) -> &[BufferView] {
        &self.buffer_views
    }

    pub fn buffer_view(&self, index: usize) -> Option<&BufferView> {
        self.buffer_views.get(index)
    }

    pub fn accessors(&self) -> &[Accessor] {
        &self.accessors
    }

    pub fn accessor(&self, index: usize) -> Option<&Accessor> {
        self.accessors.get(index)
    }

    pub fn meshes(&self) -> &[Mesh] {
        &self.meshes
    }

    /// The node hierarchy
    pub fn graph(&self) -> &SceneGraph {
        &self.graph
    }

    pub fn graph_mut(&mut self) -> &mut SceneGraph {
        &mut self.graph
    }

    pub fn nodes(&self) -> &[Node] {
        self.graph.nodes()
    }

    pub fn nodes_mut(&mut self) -> &mut [Node] {
        self.graph.nodes_mut()
    }

    pub fn skins(&self) -> &[Skin] {
        &self.skins
    }

    pub fn skin(&self, index: usize) -> Option<&Skin> {
        self.skins.get(index)
    }

    /// Node the joint matrices of a skin are relative to
    pub fn skin_root(&self, index: usize) -> Option<usize> {
        self.skin_roots.get(index).copied().flatten()
    }

    /// Animation clips in document order
    pub fn animations(&self) -> &[Arc<AnimationClip>] {
        &self.animations
    }

    /// Root nodes of the default scene
    pub fn roots(&self) -> &[usize] {
        &self.roots
    }

    /// Recompute every world matrix from the local transforms
    pub fn update_world_matrices(&mut self) {
        self.graph.update_world_matrices();
    }

    /// Recompute every skin's joint matrices; world matrices must be current
    ///
    /// A skin whose root node has a singular world matrix (for example a
    /// mesh node scaled to zero) keeps the joint matrices of the last
    /// successful update, and a warning is logged.
    pub fn update_skins(&mut self) {
        for (skin, root) in self.skins.iter_mut().zip(&self.skin_roots) {
            if let Some(root) = *root {
                skin.update(root, &self.graph);
            }
        }
    }

    /// Upload every buffer view that is bound as vertex or index data
    ///
    /// Views are uploaded once; later calls only upload views tagged since.
    /// Returns `(view index, device buffer)` pairs.
    pub fn upload_buffers<D: GpuDevice>(&mut self, device: &mut D) -> Vec<(usize, D::Buffer)> {
        self.buffer_views
            .iter_mut()
            .filter(|view| !view.usage().is_empty())
            .filter_map(|view| view.upload(device).map(|buffer| (view.index(), buffer)))
            .collect()
    }

    /// Index of the first node with the given name
    pub fn node_by_name(&self, name: &str) -> Option<usize> {
        self.graph.find_by_name(name)
    }

    pub fn clip_by_name(&self, name: &str) -> Option<&Arc<AnimationClip>> {
        self.animations.iter().find(|clip| clip.name() == name)
    }

    pub fn clip_names(&self) -> impl Iterator<Item = &str> {
        self.animations.iter().map(|clip| clip.name())
    }

    /// Depth-first list of all nodes under the scene roots with accumulated matrices
    pub fn flatten(&self) -> Vec<FlattenedNode> {
        self.roots
            .iter()
            .flat_map(|&root| self.graph.flatten(root))
            .collect()
    }
}

/// Buffer 0 without a URI is the BIN chunk; nothing else is loadable
fn resolve_binary(document: &Document, binary: Option<&Bytes>) -> Result<Option<Bytes>> {
    for (index, buffer) in document.buffers.iter().enumerate() {
        if buffer.uri.is_some() {
            return Err(GltfError::UnsupportedFeature(format!(
                "buffer {} references an external or data URI",
                index
            )));
        }
        if index > 0 {
            return Err(GltfError::UnsupportedFeature(format!(
                "buffer {} has no URI; only buffer 0 can refer to the BIN chunk",
                index
            )));
        }
    }

    let Some(buffer) = document.buffers.first() else {
        return Ok(None);
    };
    let binary = binary.ok_or_else(|| {
        GltfError::MissingBinaryChunk(format!(
            "buffer 0 declares {} bytes but the container has no BIN chunk",
            buffer.byte_length
        ))
    })?;
    if buffer.byte_length > binary.len() {
        return Err(GltfError::ValidationError(format!(
            "buffer 0 declares {} bytes but the BIN chunk holds {}",
            buffer.byte_length,
            binary.len()
        )));
    }

    // The chunk may carry up to 3 padding bytes past the declared length
    Ok(Some(binary.slice(..buffer.byte_length)))
}

fn build_buffer_views(document: &Document, binary: Option<&Bytes>) -> Result<Vec<BufferView>> {
    document
        .buffer_views
        .iter()
        .enumerate()
        .map(|(index, view)| {
            if view.buffer >= document.buffers.len() {
                return Err(GltfError::ReferenceError(format!(
                    "buffer view {} references missing buffer {}",
                    index, view.buffer
                )));
            }
            let binary = binary.ok_or_else(|| {
                GltfError::MissingBinaryChunk(format!("buffer view {} has no data", index))
            })?;
            if let Some(stride) = view.byte_stride
                && !(4..=252).contains(&stride)
            {
                return Err(GltfError::ValidationError(format!(
                    "buffer view {} has byte stride {} outside 4..=252",
                    index, stride
                )));
            }

            let mut built =
                BufferView::new(index, binary, view.byte_offset, view.byte_length, view.byte_stride)?;
            built.add_usage(BufferUsage::from_target(view.target));
            log::trace!(
                "Buffer view {}: offset {}, {} bytes, usage {:?}",
                index,
                view.byte_offset,
                view.byte_length,
                built.usage()
            );
            Ok(built)
        })
        .collect()
}

fn build_accessors(document: &Document, views: &[BufferView]) -> Result<Vec<Accessor>> {
    document
        .accessors
        .iter()
        .enumerate()
        .map(|(index, accessor)| {
            if accessor.sparse.is_some() {
                return Err(GltfError::UnsupportedFeature(format!(
                    "accessor {} uses sparse storage",
                    index
                )));
            }
            let view_index = accessor.buffer_view.ok_or_else(|| {
                GltfError::UnsupportedFeature(format!(
                    "accessor {} has no buffer view",
                    index
                ))
            })?;
            let view = views.get(view_index).ok_or_else(|| {
                GltfError::ReferenceError(format!(
                    "accessor {} references missing buffer view {}",
                    index, view_index
                ))
            })?;

            let component_type = ComponentType::try_from(accessor.component_type)?;
            let structure_type = StructureType::parse(&accessor.structure_type)?;
            Ok(Accessor::new(
                index,
                component_type,
                structure_type,
                accessor.count,
                accessor.byte_offset,
                view,
            )?
            .with_normalized(accessor.normalized))
        })
        .collect()
}

fn accessor_at<'a>(accessors: &'a [Accessor], index: usize, what: &str) -> Result<&'a Accessor> {
    accessors.get(index).ok_or_else(|| {
        GltfError::ReferenceError(format!(
            "{} references missing accessor {}",
            what, index
        ))
    })
}

fn build_meshes(
    document: &Document,
    accessors: &[Accessor],
    views: &mut [BufferView],
) -> Result<Vec<Mesh>> {
    let mut meshes = Vec::with_capacity(document.meshes.len());

    for (index, mesh) in document.meshes.iter().enumerate() {
        let mesh = Mesh::from_schema(index, mesh)?;
        let what = format!("mesh {}", index);

        for primitive in &mesh.primitives {
            for &attribute in primitive.attributes.values() {
                let accessor = accessor_at(accessors, attribute, &what)?;
                views[accessor.buffer_view()].add_usage(BufferUsage::VERTEX);
            }

            let position = accessor_at(accessors, primitive.position, &what)?;
            if position.structure_type() != StructureType::Vec3 {
                return Err(GltfError::ValidationError(format!(
                    "mesh {} POSITION accessor {} is {}, expected VEC3",
                    index,
                    position.index(),
                    position.structure_type()
                )));
            }

            if let Some(indices) = primitive.indices {
                let accessor = accessor_at(accessors, indices, &what)?;
                if accessor.structure_type() != StructureType::Scalar
                    || !accessor.component_type().is_integer()
                {
                    return Err(GltfError::ValidationError(format!(
                        "mesh {} index accessor {} must be an integer SCALAR",
                        index, indices
                    )));
                }
                views[accessor.buffer_view()].add_usage(BufferUsage::INDEX);
            }
        }

        meshes.push(mesh);
    }

    Ok(meshes)
}

fn convert_node(index: usize, node: &schema::Node, mesh_count: usize) -> Result<Node> {
    let meshes = match node.mesh {
        Some(mesh) if mesh >= mesh_count => {
            return Err(GltfError::ReferenceError(format!(
                "node {} references missing mesh {}",
                index, mesh
            )));
        }
        Some(mesh) => vec![mesh],
        None => Vec::new(),
    };

    let mut converted = Node::from_trs(
        node.translation.map_or(Vec3::ZERO, Vec3::from_array),
        node.rotation.map_or(Quat::IDENTITY, Quat::from_array),
        node.scale.map_or(Vec3::ONE, Vec3::from_array),
    );
    converted.name = node.name.clone();
    converted.matrix = node.matrix.map(|m| Mat4::from_cols_array(&m));
    converted.meshes = meshes;
    converted.skin = node.skin;
    Ok(converted)
}

fn build_graph(document: &Document, mesh_count: usize) -> Result<SceneGraph> {
    let nodes = document
        .nodes
        .iter()
        .enumerate()
        .map(|(index, node)| convert_node(index, node, mesh_count))
        .collect::<Result<Vec<_>>>()?;
    let mut graph = SceneGraph::new(nodes);

    for (index, node) in document.nodes.iter().enumerate() {
        if let Some(skin) = node.skin
            && skin >= document.skins.len()
        {
            return Err(GltfError::ReferenceError(format!(
                "node {} references missing skin {}",
                index, skin
            )));
        }

        for &child in &node.children {
            if let Some(existing) = graph.node(child).and_then(Node::parent) {
                return Err(GltfError::ValidationError(format!(
                    "node {} is a child of both node {} and node {}",
                    child, existing, index
                )));
            }
            graph.set_parent(child, Some(index))?;
        }
    }

    Ok(graph)
}

type SkinSet = (Vec<Skin>, Vec<Option<usize>>);

fn build_skins(
    document: &Document,
    accessors: &[Accessor],
    graph: &SceneGraph,
    options: &LoadOptions,
) -> Result<SkinSet> {
    let mut skins = Vec::with_capacity(document.skins.len());
    let mut roots = Vec::with_capacity(document.skins.len());

    for (index, skin) in document.skins.iter().enumerate() {
        if skin.joints.len() > options.max_joints {
            return Err(GltfError::ValidationError(format!(
                "skin {} has {} joints, more than the limit of {}",
                index,
                skin.joints.len(),
                options.max_joints
            )));
        }
        if let Some(&joint) = skin.joints.iter().find(|&&joint| joint >= graph.len()) {
            return Err(GltfError::ReferenceError(format!(
                "skin {} references missing joint node {}",
                index, joint
            )));
        }
        if let Some(skeleton) = skin.skeleton
            && skeleton >= graph.len()
        {
            return Err(GltfError::ReferenceError(format!(
                "skin {} references missing skeleton node {}",
                index, skeleton
            )));
        }

        let ibm_index = skin.inverse_bind_matrices.ok_or_else(|| {
            GltfError::UnsupportedFeature(format!(
                "skin {} has no inverse bind matrices",
                index
            ))
        })?;
        let inverse_bind_matrices =
            accessor_at(accessors, ibm_index, &format!("skin {}", index))?.read_mat4()?;

        // The mesh-owning node defines the space vertices are authored in
        let root = graph
            .nodes()
            .iter()
            .position(|node| node.skin == Some(index))
            .or(skin.skeleton)
            .or_else(|| skin.joints.first().copied());
        if root.is_none() {
            log::warn!("Skin {} has no joints and no node uses it", index);
        }
        log::debug!(
            "Skin {}: {} joints, root {:?}",
            index,
            skin.joints.len(),
            root
        );

        skins.push(Skin::new(
            skin.name.clone(),
            skin.joints.clone(),
            inverse_bind_matrices,
            skin.skeleton,
        )?);
        roots.push(root);
    }

    Ok((skins, roots))
}

fn build_animations(
    document: &Document,
    accessors: &[Accessor],
    graph: &mut SceneGraph,
    options: &LoadOptions,
) -> Result<Vec<Arc<AnimationClip>>> {
    let mut clips = Vec::with_capacity(document.animations.len());

    for (index, animation) in document.animations.iter().enumerate() {
        let name = animation
            .name
            .clone()
            .unwrap_or_else(|| format!("animation_{}", index));

        let mut channels = Vec::with_capacity(animation.channels.len());
        let mut samplers = Vec::new();
        // Document sampler index -> built sampler index
        let mut built: Vec<Option<usize>> = vec![None; animation.samplers.len()];

        for (channel_index, channel) in animation.channels.iter().enumerate() {
            let target_property = match channel.target.path {
                TargetPath::Translation => TargetProperty::Translation,
                TargetPath::Rotation => TargetProperty::Rotation,
                TargetPath::Scale => TargetProperty::Scale,
                TargetPath::Weights | TargetPath::Unknown => {
                    log::warn!(
                        "Animation '{}' channel {}: skipping unsupported target path {:?}",
                        name,
                        channel_index,
                        channel.target.path
                    );
                    continue;
                }
            };
            let Some(target_node) = channel.target.node else {
                log::debug!(
                    "Animation '{}' channel {} has no target node",
                    name,
                    channel_index
                );
                continue;
            };
            if target_node >= graph.len() {
                return Err(GltfError::ReferenceError(format!(
                    "animation '{}' channel {} targets missing node {}",
                    name, channel_index, target_node
                )));
            }

            let sampler = match built.get(channel.sampler) {
                Some(Some(existing)) => *existing,
                Some(None) => {
                    let source = &animation.samplers[channel.sampler];
                    samplers.push(build_sampler(
                        accessors,
                        source,
                        target_property,
                        &name,
                        channel.sampler,
                    )?);
                    built[channel.sampler] = Some(samplers.len() - 1);
                    samplers.len() - 1
                }
                None => {
                    return Err(GltfError::ReferenceError(format!(
                        "animation '{}' channel {} references missing sampler {}",
                        name, channel_index, channel.sampler
                    )));
                }
            };

            if let Some(node) = graph.node_mut(target_node)
                && node.matrix.is_some()
            {
                if options.decompose_animated_matrices {
                    log::debug!("Decomposing matrix of animated node {}", target_node);
                    node.decompose_matrix();
                } else {
                    log::warn!(
                        "Node {} is animated but keeps its explicit matrix",
                        target_node
                    );
                }
            }

            channels.push(AnimationChannel {
                target_node,
                target_property,
                sampler,
            });
        }

        let clip = AnimationClip::new(name, channels, samplers)?;
        log::debug!(
            "Animation '{}': {} channels, {:.3}s",
            clip.name(),
            clip.channels().len(),
            clip.duration()
        );
        clips.push(Arc::new(clip));
    }

    Ok(clips)
}

fn build_sampler(
    accessors: &[Accessor],
    sampler: &schema::Sampler,
    property: TargetProperty,
    animation: &str,
    index: usize,
) -> Result<AnimationSampler> {
    let what = format!("animation '{}' sampler {}", animation, index);
    let input = accessor_at(accessors, sampler.input, &what)?.read_scalars()?;

    let output = accessor_at(accessors, sampler.output, &what)?;
    let expected = match property {
        TargetProperty::Translation | TargetProperty::Scale => StructureType::Vec3,
        TargetProperty::Rotation => StructureType::Vec4,
    };
    if output.structure_type() != expected {
        return Err(GltfError::ValidationError(format!(
            "{} output is {}, expected {} for {:?}",
            what,
            output.structure_type(),
            expected,
            property
        )));
    }

    if sampler.interpolation == Interpolation::CubicSpline && input.len() < 2 {
        log::debug!("{} is a cubic spline with fewer than 2 keyframes", what);
    }

    AnimationSampler::new(
        input,
        output.read_as_f32().into_owned(),
        sampler.interpolation,
        property.components(),
    )
}

fn resolve_roots(document: &Document, graph: &SceneGraph) -> Result<Vec<usize>> {
    let scene = match document.scene {
        Some(index) => Some(document.scenes.get(index).ok_or_else(|| {
            GltfError::ReferenceError(format!("default scene {} does not exist", index))
        })?),
        None => document.scenes.first(),
    };

    let Some(scene) = scene else {
        return Ok(graph.roots());
    };

    for &root in &scene.nodes {
        match graph.node(root) {
            None => {
                return Err(GltfError::ReferenceError(format!(
                    "scene references missing node {}",
                    root
                )));
            }
            Some(node) if node.parent().is_some() => {
                return Err(GltfError::ValidationError(format!(
                    "scene root {} is a child of node {}",
                    root,
                    node.parent().unwrap_or_default()
                )));
            }
            Some(_) => {}
        }
    }

    Ok(scene.nodes.clone())
}
