//! Dual-view cache of extracted per-mesh vertex data.

use std::collections::HashMap;
use std::sync::Arc;

use cgmath::Vector3;
use parking_lot::RwLock;

use crate::scene::GeometryHandle;

type Store = RwLock<HashMap<GeometryHandle, Arc<[Vector3<f32>]>>>;

/// Cache of mesh-local vertex positions keyed by geometry identity.
///
/// One backing store can be viewed through two policies. The *full* view also
/// serves cached entries on the deformable-mesh lookup path; the *partial*
/// view bypasses the store there, so skinned geometry is always re-baked.
/// Static-mesh lookups and all writes go through the shared store under
/// either view.
///
/// Views are cheap value handles over the same store: [`VertexCache::as_full`]
/// and [`VertexCache::as_partial`] re-wrap it with the requested policy, and
/// anything written through one view is visible through the other. Caches are
/// long-lived; a typical host keeps one per world and hands views to queries.
///
/// Entries are written whole and never partially updated. A full-view hit for
/// a deformable mesh returns whatever pose produced the entry, which may not
/// be the current pose. That speed-over-freshness trade is deliberate;
/// callers that need pose-fresh geometry pass a partial view instead.
#[derive(Clone)]
pub struct VertexCache {
    store: Arc<Store>,
    deformable_lookups: bool,
}

impl VertexCache {
    /// New empty cache whose deformable lookups consult the store.
    pub fn full() -> Self {
        Self {
            store: Arc::new(RwLock::new(HashMap::new())),
            deformable_lookups: true,
        }
    }

    /// New empty cache that never serves cached deformable geometry.
    pub fn partial() -> Self {
        Self {
            deformable_lookups: false,
            ..Self::full()
        }
    }

    pub fn contains(&self, handle: GeometryHandle) -> bool {
        self.store.read().contains_key(&handle)
    }

    /// Non-throwing lookup of the shared mapping.
    pub fn try_get(&self, handle: GeometryHandle) -> Option<Arc<[Vector3<f32>]>> {
        self.store.read().get(&handle).cloned()
    }

    /// Insert or overwrite the entry for `handle` as a whole.
    ///
    /// Concurrent writers race benignly: last write wins, entries are never
    /// torn.
    pub fn set(&self, handle: GeometryHandle, vertices: Vec<Vector3<f32>>) {
        self.store.write().insert(handle, vertices.into());
    }

    /// Number of entries in the shared mapping.
    pub fn len(&self) -> usize {
        self.store.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.read().is_empty()
    }

    /// The single policy divergence point consulted during extraction.
    pub fn deformable_lookups_enabled(&self) -> bool {
        self.deformable_lookups
    }

    /// This cache's store under the full policy.
    pub fn as_full(&self) -> VertexCache {
        VertexCache {
            store: Arc::clone(&self.store),
            deformable_lookups: true,
        }
    }

    /// This cache's store under the partial policy.
    pub fn as_partial(&self) -> VertexCache {
        VertexCache {
            store: Arc::clone(&self.store),
            deformable_lookups: false,
        }
    }

    /// True when both views are façades of the same backing store.
    pub fn shares_store(&self, other: &VertexCache) -> bool {
        Arc::ptr_eq(&self.store, &other.store)
    }
}
