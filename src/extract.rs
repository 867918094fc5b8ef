//! Per-renderable vertex extraction strategies.
//!
//! Dispatches on [`RenderableKind`] to turn one renderable into a set of
//! mesh-local vertex samples, consulting and populating the vertex cache as
//! configured. Geometry that isn't readable on the calling thread is fetched
//! either synchronously (raw buffer copy, blocks) or, on the cache-prefill
//! path, asynchronously via the backend's readback facility.

use std::sync::Arc;

use cgmath::Vector3;
use futures_intrusive::channel::shared::{OneshotReceiver, oneshot_channel};

use crate::cache::VertexCache;
use crate::data_structures::bounds::BoundingBox;
use crate::logging::{LogFlags, LogSink, emit};
use crate::scene::{Geometry, GeometryHandle, RawVertexData, Renderable, RenderableKind};

/// What an asynchronous cache-fill request ended up doing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CacheFillOutcome {
    /// The readback result was decoded and stored.
    Stored,
    /// Another writer populated the key while the readback was in flight;
    /// the result was discarded. Redundant work, not an error.
    AlreadyPresent,
    /// The backend reported a readback error; nothing was stored.
    Failed,
}

/// Handle to one in-flight asynchronous cache fill.
///
/// Dropping the ticket is fine (fire-and-forget): the completion still runs
/// on the backend's context and populates the cache.
pub struct ReadbackTicket {
    receiver: OneshotReceiver<CacheFillOutcome>,
}

impl ReadbackTicket {
    /// Block until the backend completion has run.
    ///
    /// `None` means the backend dropped the completion without invoking it.
    pub fn wait(self) -> Option<CacheFillOutcome> {
        futures::executor::block_on(self.receiver.receive())
    }

    /// Await the completion without blocking.
    pub async fn completed(self) -> Option<CacheFillOutcome> {
        self.receiver.receive().await
    }
}

/// Decode `[f32; 3]` positions out of a raw vertex buffer copy.
///
/// A buffer shorter than its layout claims yields only the vertices that
/// fully fit.
pub fn positions_from_raw(raw: &RawVertexData) -> Vec<Vector3<f32>> {
    let position_size = std::mem::size_of::<[f32; 3]>();
    let mut positions = Vec::with_capacity(raw.count);
    for index in 0..raw.count {
        let offset = index * raw.layout.stride + raw.layout.position_offset;
        let Some(bytes) = raw.bytes.get(offset..offset + position_size) else {
            log::warn!(
                "raw vertex buffer ends after {} of {} vertices",
                index,
                raw.count
            );
            break;
        };
        let [x, y, z]: [f32; 3] = bytemuck::pod_read_unaligned(bytes);
        positions.push(Vector3::new(x, y, z));
    }
    positions
}

/// Read a geometry's positions on the calling thread, falling back to the
/// blocking raw-copy path when it isn't directly readable.
fn read_geometry(geometry: &dyn Geometry) -> anyhow::Result<Vec<Vector3<f32>>> {
    if let Some(positions) = geometry.read_positions() {
        return Ok(positions);
    }
    let raw = geometry.copy_raw()?;
    Ok(positions_from_raw(&raw))
}

/// Append the local-space vertex samples one renderable contributes.
///
/// A renderable whose backing resources are missing contributes nothing and
/// emits a warning event; the caller's traversal continues unaffected.
pub(crate) fn extract_renderable(
    renderable: &dyn Renderable,
    cache: Option<&VertexCache>,
    sink: Option<&LogSink<'_>>,
    out: &mut Vec<Vector3<f32>>,
) {
    match renderable.kind() {
        RenderableKind::StaticMesh => extract_static(renderable, cache, sink, out),
        RenderableKind::DeformableMesh => extract_deformable(renderable, cache, sink, out),
        RenderableKind::Particle => (),
        RenderableKind::Bounded => extract_bounded(renderable, sink, out),
    }
}

fn extract_static(
    renderable: &dyn Renderable,
    cache: Option<&VertexCache>,
    sink: Option<&LogSink<'_>>,
    out: &mut Vec<Vector3<f32>>,
) {
    let Some(geometry) = renderable.geometry() else {
        warn_missing(renderable, sink);
        return;
    };
    let handle = geometry.handle();
    if let Some(cached) = cache.and_then(|cache| cache.try_get(handle)) {
        out.extend_from_slice(&cached);
        return;
    }
    match read_geometry(geometry.as_ref()) {
        Ok(positions) => {
            if let Some(cache) = cache {
                cache.set(handle, positions.clone());
            }
            out.extend_from_slice(&positions);
        }
        Err(err) => emit(sink, LogFlags::WARNING | LogFlags::EXTENTS, &|| {
            format!(
                "failed to read geometry of renderable '{}': {err}",
                renderable.label()
            )
        }),
    }
}

fn extract_deformable(
    renderable: &dyn Renderable,
    cache: Option<&VertexCache>,
    sink: Option<&LogSink<'_>>,
    out: &mut Vec<Vector3<f32>>,
) {
    let Some(geometry) = renderable.geometry() else {
        warn_missing(renderable, sink);
        return;
    };
    // The cache is keyed by the un-deformed source mesh, so a hit may carry
    // an older pose than the current one. Only the full view takes that deal.
    let handle = geometry.handle();
    if let Some(cache) = cache {
        if cache.deformable_lookups_enabled() {
            if let Some(cached) = cache.try_get(handle) {
                out.extend_from_slice(&cached);
                return;
            }
        }
    }
    let Some(baked) = renderable.bake_pose() else {
        emit(sink, LogFlags::WARNING | LogFlags::EXTENTS, &|| {
            format!("could not bake a pose for renderable '{}'", renderable.label())
        });
        return;
    };
    match read_geometry(baked.as_ref()) {
        Ok(positions) => {
            if let Some(cache) = cache {
                cache.set(handle, positions.clone());
            }
            out.extend_from_slice(&positions);
        }
        Err(err) => emit(sink, LogFlags::WARNING | LogFlags::EXTENTS, &|| {
            format!(
                "failed to read baked geometry of renderable '{}': {err}",
                renderable.label()
            )
        }),
    }
    // The baked snapshot is released here with the last Arc.
}

fn extract_bounded(
    renderable: &dyn Renderable,
    sink: Option<&LogSink<'_>>,
    out: &mut Vec<Vector3<f32>>,
) {
    let Some(bounds) = renderable.bounding_box() else {
        emit(sink, LogFlags::WARNING | LogFlags::EXTENTS, &|| {
            format!(
                "renderable '{}' exposes no bounding box and contributes no vertices",
                renderable.label()
            )
        });
        return;
    };
    out.extend_from_slice(&bounded_corner_proxy(&bounds));
}

fn warn_missing(renderable: &dyn Renderable, sink: Option<&LogSink<'_>>) {
    emit(sink, LogFlags::WARNING | LogFlags::EXTENTS, &|| {
        format!(
            "renderable '{}' has no backing geometry and contributes no vertices",
            renderable.label()
        )
    });
}

/// The corner proxy a bounded renderable contributes.
///
/// Exactly seven points: the (min.x, max.y, min.z) corner is never sampled.
/// This is a cheap stand-in for the box, not a true corner enumeration, and
/// callers must not expect the bound to be reproducible from it.
pub fn bounded_corner_proxy(bounds: &BoundingBox) -> [Vector3<f32>; 7] {
    let (min, max) = (bounds.min, bounds.max);
    [
        min,
        Vector3::new(min.x, min.y, max.z),
        Vector3::new(min.x, max.y, max.z),
        Vector3::new(max.x, min.y, max.z),
        Vector3::new(max.x, min.y, min.z),
        Vector3::new(max.x, max.y, min.z),
        max,
    ]
}

/// Cache-populate-only form of extraction: read (baking first if necessary)
/// and store, returning no geometry.
///
/// An existing entry under the renderable's handle satisfies the renderable
/// outright, which is what makes repeated prefill runs idempotent. Readable
/// geometry fills the cache synchronously; non-readable geometry goes through
/// the async readback path and contributes a ticket.
pub(crate) fn prefill_renderable(
    renderable: &dyn Renderable,
    cache: &VertexCache,
    sink: Option<&LogSink<'_>>,
    tickets: &mut Vec<ReadbackTicket>,
) {
    match renderable.kind() {
        RenderableKind::StaticMesh | RenderableKind::DeformableMesh => (),
        // Nothing worth caching for the remaining kinds.
        RenderableKind::Particle | RenderableKind::Bounded => return,
    }
    let Some(geometry) = renderable.geometry() else {
        warn_missing(renderable, sink);
        return;
    };
    let handle = geometry.handle();
    if cache.contains(handle) {
        emit(sink, LogFlags::TRACE | LogFlags::EXTENTS, &|| {
            format!("renderable '{}' is already cached", renderable.label())
        });
        return;
    }
    let source: Arc<dyn Geometry> = if renderable.kind() == RenderableKind::DeformableMesh {
        match renderable.bake_pose() {
            Some(baked) => baked,
            None => {
                emit(sink, LogFlags::WARNING | LogFlags::EXTENTS, &|| {
                    format!("could not bake a pose for renderable '{}'", renderable.label())
                });
                return;
            }
        }
    } else {
        geometry
    };
    if let Some(positions) = source.read_positions() {
        cache.set(handle, positions);
        return;
    }
    tickets.push(fill_cache_async(source, handle, cache));
}

/// Issue a non-blocking readback that populates `cache` under `key` once it
/// completes.
///
/// The completion runs on the backend's context and re-checks the cache
/// before writing: if another writer got there while the request was in
/// flight, the late result is discarded (first completion wins). The issuing
/// call never receives the data; this exists purely to pre-warm the cache.
pub fn fill_cache_async(
    geometry: Arc<dyn Geometry>,
    key: GeometryHandle,
    cache: &VertexCache,
) -> ReadbackTicket {
    let (sender, receiver) = oneshot_channel();
    let cache = cache.clone();
    let retained = Arc::clone(&geometry);
    geometry.request_readback(Box::new(move |result| {
        let outcome = match result {
            Ok(raw) => {
                if cache.contains(key) {
                    log::trace!("readback for {key:?} landed after the entry was populated");
                    CacheFillOutcome::AlreadyPresent
                } else {
                    cache.set(key, positions_from_raw(&raw));
                    CacheFillOutcome::Stored
                }
            }
            Err(err) => {
                log::warn!("async readback for {key:?} failed: {err}");
                CacheFillOutcome::Failed
            }
        };
        let _ = sender.send(outcome);
        // A baked snapshot must outlive its own readback.
        drop(retained);
    }));
    ReadbackTicket { receiver }
}
