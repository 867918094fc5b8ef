//! Host-engine boundary: scene graph and geometry capabilities.
//!
//! The crate never talks to a concrete engine. A host implements these traits
//! over its own node, component, and buffer types; the entry points in
//! [`crate::query`] only ever see this surface. Tests do the same with small
//! purpose-built mocks.

use std::sync::Arc;

use cgmath::Vector3;

use crate::data_structures::{bounds::BoundingBox, transform::Transform};

/// Identity key of a geometry resource.
///
/// Two handles refer to the same mesh iff they are equal. This is identity,
/// not structural equality: a mesh that mutates without a handle change is
/// outside the cache's correctness claims.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct GeometryHandle(pub u64);

/// Names a host component/capability class used to prune whole subtrees out
/// of a query. The host decides what each marker value means.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FilterMarker(pub u32);

/// The extraction strategy a renderable asks for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RenderableKind {
    /// Fixed, pose-independent vertex set.
    StaticMesh,
    /// Skinned geometry whose positions depend on a runtime pose; it must be
    /// baked to a concrete snapshot before reading.
    DeformableMesh,
    /// No stable static geometry; never contributes vertices.
    Particle,
    /// Any other renderable that only exposes a precomputed axis-aligned bound.
    Bounded,
}

/// Memory layout of one vertex inside a raw buffer copy.
#[derive(Clone, Copy, Debug)]
pub struct VertexLayout {
    /// Byte offset of the `[f32; 3]` position inside a vertex.
    pub position_offset: usize,
    /// Bytes from the start of one vertex to the start of the next.
    pub stride: usize,
}

/// Host-side copy of a vertex buffer that was not directly readable.
#[derive(Clone, Debug)]
pub struct RawVertexData {
    pub bytes: Vec<u8>,
    pub layout: VertexLayout,
    /// Number of vertices the buffer claims to hold.
    pub count: usize,
}

/// Completion callback for a non-blocking buffer readback.
///
/// The host's backend invokes it later, on a context of its own choosing.
pub type ReadbackComplete = Box<dyn FnOnce(anyhow::Result<RawVertexData>) + Send + 'static>;

/// One geometry resource of the host engine.
///
/// Releasing a temporary resource (for instance a baked deformable snapshot)
/// is modelled by dropping the last `Arc` to it.
pub trait Geometry: Send + Sync {
    fn handle(&self) -> GeometryHandle;

    /// Vertex positions in mesh-local space, when the host can produce them
    /// on the calling thread. `None` signals the non-readable retrieval path.
    fn read_positions(&self) -> Option<Vec<Vector3<f32>>>;

    /// Immediately copy the raw vertex buffer into host memory. Blocks the
    /// caller.
    fn copy_raw(&self) -> anyhow::Result<RawVertexData>;

    /// Issue a non-blocking readback of the raw vertex buffer. Never blocks;
    /// the completion runs later on the backend's context.
    fn request_readback(&self, on_complete: ReadbackComplete);
}

/// A component on a scene node that can contribute visible geometry.
pub trait Renderable {
    fn kind(&self) -> RenderableKind;

    /// Disabled renderables are skipped entirely, without a log event.
    fn enabled(&self) -> bool;

    /// Short name used in log events.
    fn label(&self) -> &str;

    /// The geometry resource backing this renderable, if it still exists.
    /// For deformable meshes this is the un-deformed source mesh, which is
    /// also the cache key.
    fn geometry(&self) -> Option<Arc<dyn Geometry>>;

    /// Bake the current pose into a concrete, readable geometry snapshot.
    /// Only meaningful for [`RenderableKind::DeformableMesh`].
    fn bake_pose(&self) -> Option<Arc<dyn Geometry>> {
        None
    }

    /// Precomputed local-space bound for [`RenderableKind::Bounded`].
    fn bounding_box(&self) -> Option<BoundingBox> {
        None
    }
}

/// One element of the host's scene hierarchy.
pub trait SceneNode {
    fn name(&self) -> &str;

    /// Inactive nodes are skipped together with their whole subtree. The
    /// parent checks this before recursing, not the node itself.
    fn active(&self) -> bool;

    /// Transform relative to the parent node.
    fn local_transform(&self) -> Transform;

    /// World-space transform. Only consulted on the root of a world-space
    /// query.
    fn world_transform(&self) -> Transform;

    fn children(&self) -> Vec<&dyn SceneNode>;

    /// Renderable components attached to this node.
    fn renderables(&self) -> Vec<&dyn Renderable>;

    /// Whether a component of the given marker class is present on this node.
    fn has_marker(&self, marker: FilterMarker) -> bool;
}
