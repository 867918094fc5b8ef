//! Extent queries over a scene hierarchy.
//!
//! The entry points all take a root [`SceneNode`] plus [`QueryOptions`] and
//! walk the hierarchy recursively: each node contributes the vertex samples
//! of its enabled renderables plus the contributions of its active children
//! (each under the child's own local transform), and the whole contribution
//! is then mapped through the node's incoming matrix. Local-space queries
//! seed that matrix from the override transform (identity by default),
//! world-space queries from the root's world transform.
//!
//! Traversal is read-only with respect to the scene graph; only the
//! configured cache and log sink observe effects. Both are plain call
//! parameters, so "installed for the duration of the call, removed
//! afterwards" holds on every path, early returns included.

use anyhow::bail;
use cgmath::{Matrix4, SquareMatrix, Vector3};

use crate::data_structures::bounds::{self, BoundingBox};
use crate::data_structures::transform::transform_point;
use crate::extract::{ReadbackTicket, extract_renderable, prefill_renderable};
use crate::logging::{LogFlags, LogSink, emit};
use crate::scene::{FilterMarker, SceneNode};
use crate::VertexCache;

/// Per-call options bundle for one extent query.
///
/// Create one per call or reuse it across calls; it has no ownership over
/// the cache's backing store beyond the view handle it carries.
#[derive(Default)]
pub struct QueryOptions<'a> {
    /// Root transform for local-space queries; identity when absent.
    /// World-space queries ignore it.
    pub override_transform: Option<Matrix4<f32>>,
    /// A node carrying a component of any of these marker classes is pruned
    /// together with its entire subtree.
    pub filters: Vec<FilterMarker>,
    /// Cache consulted and populated during extraction. `None` disables
    /// caching for the call.
    pub cache: Option<VertexCache>,
    /// Sink receiving this call's log events.
    pub log: Option<&'a LogSink<'a>>,
}

/// Collect the scene's vertices in root-local space.
///
/// Honors the override transform.
pub fn get_vertices(root: &dyn SceneNode, options: &QueryOptions<'_>) -> Vec<Vector3<f32>> {
    let initial = options
        .override_transform
        .unwrap_or_else(Matrix4::identity);
    let mut vertices = Vec::new();
    collect_into(root, &initial, root.name(), options, &mut vertices);
    vertices
}

/// Bounding box of the scene in root-local space.
///
/// [`BoundingBox::EMPTY`] when no renderable contributes; use
/// [`try_get_bounds`] to distinguish that without comparing sentinels.
pub fn get_bounds(root: &dyn SceneNode, options: &QueryOptions<'_>) -> BoundingBox {
    BoundingBox::from_points(get_vertices(root, options))
}

/// Like [`get_bounds`], but `None` when not a single vertex was found.
pub fn try_get_bounds(root: &dyn SceneNode, options: &QueryOptions<'_>) -> Option<BoundingBox> {
    let vertices = get_vertices(root, options);
    if vertices.is_empty() {
        None
    } else {
        Some(BoundingBox::from_points(vertices))
    }
}

/// World-space bounding box, derived from the root's world transform.
///
/// The override transform is ignored here.
pub fn get_world_bounds(root: &dyn SceneNode, options: &QueryOptions<'_>) -> BoundingBox {
    BoundingBox::from_points(world_vertices(root, options))
}

/// Like [`get_world_bounds`], but `None` when not a single vertex was found.
pub fn try_get_world_bounds(
    root: &dyn SceneNode,
    options: &QueryOptions<'_>,
) -> Option<BoundingBox> {
    let vertices = world_vertices(root, options);
    if vertices.is_empty() {
        None
    } else {
        Some(BoundingBox::from_points(vertices))
    }
}

/// World-space bounding radius: the distance from the world bounds' center
/// to the farthest collected vertex.
///
/// `NEG_INFINITY` when nothing contributes, matching the farthest-point
/// contract for empty input.
pub fn get_radius(root: &dyn SceneNode, options: &QueryOptions<'_>) -> f32 {
    let vertices = world_vertices(root, options);
    let bounds = BoundingBox::from_points(vertices.iter().copied());
    if bounds.is_empty() {
        return f32::NEG_INFINITY;
    }
    let (_, distance) = bounds::farthest_point(&vertices, bounds.center());
    distance
}

/// Walk the hierarchy and populate the configured cache, discarding the
/// geometry.
///
/// Fails up front when `options.cache` is `None`; no partial work happens.
/// The returned tickets track readbacks that are still in flight for
/// geometry that wasn't host-readable; await them, block on them, or drop
/// them to fire-and-forget.
pub fn cache_vertices(
    root: &dyn SceneNode,
    options: &QueryOptions<'_>,
) -> anyhow::Result<Vec<ReadbackTicket>> {
    let Some(cache) = options.cache.as_ref() else {
        bail!("cache_vertices requires a cache in QueryOptions");
    };
    let mut tickets = Vec::new();
    prefill_walk(root, root.name(), cache, options, &mut tickets);
    Ok(tickets)
}

fn world_vertices(root: &dyn SceneNode, options: &QueryOptions<'_>) -> Vec<Vector3<f32>> {
    let initial = root.world_transform().to_matrix();
    let mut vertices = Vec::new();
    collect_into(root, &initial, root.name(), options, &mut vertices);
    vertices
}

/// One node's step of the extent walk.
///
/// Appends this node's contribution to `out`, already mapped through
/// `incoming`. All levels share the single accumulation vector; each node
/// transforms only the slice it appended, so a child's result arrives here
/// already in this node's local space.
fn collect_into(
    node: &dyn SceneNode,
    incoming: &Matrix4<f32>,
    path: &str,
    options: &QueryOptions<'_>,
    out: &mut Vec<Vector3<f32>>,
) {
    emit(options.log, LogFlags::TRACE | LogFlags::EXTENTS, &|| {
        format!("collecting extents under '{path}'")
    });
    if let Some(marker) = matching_filter(node, options) {
        emit(options.log, LogFlags::TRACE | LogFlags::EXTENTS, &|| {
            format!("'{path}' pruned by filter marker {marker:?}")
        });
        return;
    }
    let start = out.len();
    for renderable in node.renderables() {
        if !renderable.enabled() {
            continue;
        }
        let before = out.len();
        extract_renderable(renderable, options.cache.as_ref(), options.log, out);
        let sampled = out.len() - before;
        emit(options.log, LogFlags::TRACE | LogFlags::EXTENTS, &|| {
            format!(
                "'{path}': renderable '{}' sampled {sampled} vertices",
                renderable.label()
            )
        });
    }
    for child in node.children() {
        if !child.active() {
            continue;
        }
        let child_matrix = child.local_transform().to_matrix();
        let child_path = format!("{path}/{}", child.name());
        collect_into(child, &child_matrix, &child_path, options, out);
    }
    for vertex in &mut out[start..] {
        *vertex = transform_point(*incoming, *vertex);
    }
    let contributed = out.len() - start;
    emit(options.log, LogFlags::TRACE | LogFlags::EXTENTS, &|| {
        format!("'{path}' contributed {contributed} vertices")
    });
}

/// Prefill variant of the walk: same node/child/filter handling, no vertex
/// accumulation, only cache side effects and log events.
fn prefill_walk(
    node: &dyn SceneNode,
    path: &str,
    cache: &VertexCache,
    options: &QueryOptions<'_>,
    tickets: &mut Vec<ReadbackTicket>,
) {
    emit(options.log, LogFlags::TRACE | LogFlags::EXTENTS, &|| {
        format!("prefilling vertex cache under '{path}'")
    });
    if let Some(marker) = matching_filter(node, options) {
        emit(options.log, LogFlags::TRACE | LogFlags::EXTENTS, &|| {
            format!("'{path}' pruned by filter marker {marker:?}")
        });
        return;
    }
    for renderable in node.renderables() {
        if !renderable.enabled() {
            continue;
        }
        prefill_renderable(renderable, cache, options.log, tickets);
    }
    for child in node.children() {
        if !child.active() {
            continue;
        }
        let child_path = format!("{path}/{}", child.name());
        prefill_walk(child, &child_path, cache, options, tickets);
    }
}

fn matching_filter(node: &dyn SceneNode, options: &QueryOptions<'_>) -> Option<FilterMarker> {
    options
        .filters
        .iter()
        .copied()
        .find(|&marker| node.has_marker(marker))
}
