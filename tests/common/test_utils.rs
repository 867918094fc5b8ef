//! Shared mock scene implementations for the integration tests.
//!
//! The library only sees the host engine through the traits in
//! `scene_extents::scene`, so the tests implement that surface with small
//! in-memory types: geometry with selectable retrieval modes and read
//! counters, renderables of every kind with bake counters, and a node type
//! with a builder-ish API.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, Once};

use cgmath::Vector3;
use scene_extents::{
    BoundingBox, FilterMarker, Geometry, GeometryHandle, LogFlags, RawVertexData,
    ReadbackComplete, Renderable, RenderableKind, SceneNode, Transform, VertexLayout,
};

static INIT: Once = Once::new();

/// Route `log` output into the test harness once per test binary.
pub fn init_logging() {
    INIT.call_once(|| {
        let _ = env_logger::builder().is_test(true).try_init();
    });
}

/// How a [`TestGeometry`] serves its vertex data.
#[derive(Clone, Copy, PartialEq, Eq)]
pub enum GeometryMode {
    /// `read_positions` works directly.
    Readable,
    /// Only the blocking raw-buffer copy works.
    RawOnly,
    /// Only the non-blocking readback works; completions queue up until the
    /// test fires them.
    AsyncOnly,
}

pub struct TestGeometry {
    handle: GeometryHandle,
    positions: Vec<Vector3<f32>>,
    mode: GeometryMode,
    reads: AtomicUsize,
    pending: Mutex<Vec<ReadbackComplete>>,
}

impl TestGeometry {
    pub fn new(handle: u64, positions: Vec<Vector3<f32>>, mode: GeometryMode) -> Arc<Self> {
        Arc::new(Self {
            handle: GeometryHandle(handle),
            positions,
            mode,
            reads: AtomicUsize::new(0),
            pending: Mutex::new(Vec::new()),
        })
    }

    /// Successful reads served over any retrieval path so far.
    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    /// Readback completions queued but not yet fired.
    pub fn pending_readbacks(&self) -> usize {
        self.pending.lock().unwrap().len()
    }

    /// Invoke every queued readback completion with the geometry's data.
    pub fn fire_readbacks(&self) {
        let callbacks: Vec<_> = self.pending.lock().unwrap().drain(..).collect();
        for callback in callbacks {
            self.reads.fetch_add(1, Ordering::SeqCst);
            callback(Ok(self.raw_data()));
        }
    }

    /// Invoke every queued readback completion with an error.
    pub fn fail_readbacks(&self) {
        let callbacks: Vec<_> = self.pending.lock().unwrap().drain(..).collect();
        for callback in callbacks {
            callback(Err(anyhow::anyhow!("device lost")));
        }
    }

    /// Positions packed behind a 4-byte marker per vertex, so decoding has
    /// to honor both offset and stride.
    fn raw_data(&self) -> RawVertexData {
        let mut bytes = Vec::new();
        for position in &self.positions {
            bytes.extend_from_slice(&0xDEAD_BEEF_u32.to_le_bytes());
            for component in [position.x, position.y, position.z] {
                bytes.extend_from_slice(&component.to_le_bytes());
            }
        }
        RawVertexData {
            bytes,
            layout: VertexLayout {
                position_offset: 4,
                stride: 16,
            },
            count: self.positions.len(),
        }
    }
}

impl Geometry for TestGeometry {
    fn handle(&self) -> GeometryHandle {
        self.handle
    }

    fn read_positions(&self) -> Option<Vec<Vector3<f32>>> {
        if self.mode == GeometryMode::Readable {
            self.reads.fetch_add(1, Ordering::SeqCst);
            Some(self.positions.clone())
        } else {
            None
        }
    }

    fn copy_raw(&self) -> anyhow::Result<RawVertexData> {
        if self.mode == GeometryMode::RawOnly {
            self.reads.fetch_add(1, Ordering::SeqCst);
            Ok(self.raw_data())
        } else {
            anyhow::bail!("no host-side buffer access")
        }
    }

    fn request_readback(&self, on_complete: ReadbackComplete) {
        if self.mode == GeometryMode::AsyncOnly {
            self.pending.lock().unwrap().push(on_complete);
        } else {
            on_complete(Err(anyhow::anyhow!("readback not supported")));
        }
    }
}

pub struct TestRenderable {
    kind: RenderableKind,
    label: String,
    enabled: bool,
    geometry: Option<Arc<TestGeometry>>,
    baked: Option<Arc<TestGeometry>>,
    bakes: Arc<AtomicUsize>,
    bounds: Option<BoundingBox>,
}

impl TestRenderable {
    fn new(kind: RenderableKind, label: &str) -> Self {
        Self {
            kind,
            label: label.to_string(),
            enabled: true,
            geometry: None,
            baked: None,
            bakes: Arc::new(AtomicUsize::new(0)),
            bounds: None,
        }
    }

    pub fn static_mesh(label: &str, geometry: &Arc<TestGeometry>) -> Self {
        Self {
            geometry: Some(Arc::clone(geometry)),
            ..Self::new(RenderableKind::StaticMesh, label)
        }
    }

    /// A static mesh whose backing resource is gone.
    pub fn without_geometry(label: &str) -> Self {
        Self::new(RenderableKind::StaticMesh, label)
    }

    /// `source` is the un-deformed mesh (the cache key); `baked` is what
    /// `bake_pose` hands out.
    pub fn deformable(label: &str, source: &Arc<TestGeometry>, baked: &Arc<TestGeometry>) -> Self {
        Self {
            geometry: Some(Arc::clone(source)),
            baked: Some(Arc::clone(baked)),
            ..Self::new(RenderableKind::DeformableMesh, label)
        }
    }

    pub fn particle(label: &str) -> Self {
        Self::new(RenderableKind::Particle, label)
    }

    pub fn bounded(label: &str, bounds: BoundingBox) -> Self {
        Self {
            bounds: Some(bounds),
            ..Self::new(RenderableKind::Bounded, label)
        }
    }

    /// A bounded renderable whose precomputed bound is gone.
    pub fn bounded_without_box(label: &str) -> Self {
        Self::new(RenderableKind::Bounded, label)
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    /// Handle to the bake counter; clone it out before the renderable moves
    /// into a node.
    pub fn bake_counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.bakes)
    }
}

impl Renderable for TestRenderable {
    fn kind(&self) -> RenderableKind {
        self.kind
    }

    fn enabled(&self) -> bool {
        self.enabled
    }

    fn label(&self) -> &str {
        &self.label
    }

    fn geometry(&self) -> Option<Arc<dyn Geometry>> {
        self.geometry
            .as_ref()
            .map(|geometry| Arc::clone(geometry) as Arc<dyn Geometry>)
    }

    fn bake_pose(&self) -> Option<Arc<dyn Geometry>> {
        self.bakes.fetch_add(1, Ordering::SeqCst);
        self.baked
            .as_ref()
            .map(|baked| Arc::clone(baked) as Arc<dyn Geometry>)
    }

    fn bounding_box(&self) -> Option<BoundingBox> {
        self.bounds
    }
}

pub struct TestNode {
    name: String,
    active: bool,
    local: Transform,
    world: Transform,
    markers: Vec<FilterMarker>,
    renderables: Vec<TestRenderable>,
    children: Vec<TestNode>,
}

impl TestNode {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            active: true,
            local: Transform::default(),
            world: Transform::default(),
            markers: Vec::new(),
            renderables: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn local(mut self, transform: Transform) -> Self {
        self.local = transform;
        self
    }

    pub fn world(mut self, transform: Transform) -> Self {
        self.world = transform;
        self
    }

    pub fn marker(mut self, marker: FilterMarker) -> Self {
        self.markers.push(marker);
        self
    }

    pub fn renderable(mut self, renderable: TestRenderable) -> Self {
        self.renderables.push(renderable);
        self
    }

    pub fn child(mut self, child: TestNode) -> Self {
        self.children.push(child);
        self
    }

    pub fn inactive(mut self) -> Self {
        self.active = false;
        self
    }
}

impl SceneNode for TestNode {
    fn name(&self) -> &str {
        &self.name
    }

    fn active(&self) -> bool {
        self.active
    }

    fn local_transform(&self) -> Transform {
        self.local.clone()
    }

    fn world_transform(&self) -> Transform {
        self.world.clone()
    }

    fn children(&self) -> Vec<&dyn SceneNode> {
        self.children
            .iter()
            .map(|child| child as &dyn SceneNode)
            .collect()
    }

    fn renderables(&self) -> Vec<&dyn Renderable> {
        self.renderables
            .iter()
            .map(|renderable| renderable as &dyn Renderable)
            .collect()
    }

    fn has_marker(&self, marker: FilterMarker) -> bool {
        self.markers.contains(&marker)
    }
}

pub type EventLog = Arc<Mutex<Vec<(LogFlags, String)>>>;

/// A sink that records every event it receives, with the message rendered.
pub fn recording_sink() -> (EventLog, impl Fn(LogFlags, &dyn Fn() -> String)) {
    let events: EventLog = Arc::new(Mutex::new(Vec::new()));
    let log = Arc::clone(&events);
    let sink = move |flags: LogFlags, message: &dyn Fn() -> String| {
        log.lock().unwrap().push((flags, message()));
    };
    (events, sink)
}
