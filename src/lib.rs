//! scene-extents
//!
//! Computes geometric extents (oriented/axis-aligned bounding volumes,
//! bounding radius, raw vertex positions) for a hierarchical scene of
//! renderable nodes, and caches extracted per-mesh vertex data so repeated
//! queries don't re-read the same geometry. The host engine's scene graph,
//! mesh storage and GPU readback facility sit behind the traits in [`scene`];
//! this crate only walks the hierarchy, composes transforms, samples vertices
//! and aggregates them.
//!
//! High-level modules
//! - `cache`: the shared vertex cache and its full/partial views
//! - `data_structures`: bounding boxes, node transforms and their helpers
//! - `extract`: per-renderable-kind vertex extraction, sync and async retrieval
//! - `logging`: per-call log events with lazy message formatting
//! - `query`: the public extent-query entry points and the hierarchy walk
//! - `scene`: the capability surface the host engine implements
//!

pub mod cache;
pub mod data_structures;
pub mod extract;
pub mod logging;
pub mod query;
pub mod scene;

// Re-exports commonly used types for convenience in downstream code.
pub use cache::VertexCache;
pub use cgmath::{Matrix4, Quaternion, Vector3};
pub use data_structures::bounds::{BoundingBox, farthest_point};
pub use data_structures::transform::{Transform, transform_point};
pub use extract::{
    CacheFillOutcome, ReadbackTicket, bounded_corner_proxy, fill_cache_async, positions_from_raw,
};
pub use logging::{LogFlags, LogSink};
pub use query::{
    QueryOptions, cache_vertices, get_bounds, get_radius, get_vertices, get_world_bounds,
    try_get_bounds, try_get_world_bounds,
};
pub use scene::{
    FilterMarker, Geometry, GeometryHandle, RawVertexData, ReadbackComplete, Renderable,
    RenderableKind, SceneNode, VertexLayout,
};
