//! Axis-aligned bounding volumes and point-set aggregation.

use cgmath::{InnerSpace, Vector3};

/// Axis-aligned bounding box defined by its minimum and maximum corners.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoundingBox {
    pub min: Vector3<f32>,
    pub max: Vector3<f32>,
}

impl BoundingBox {
    /// The canonical empty box: `min` at positive infinity, `max` at negative
    /// infinity.
    ///
    /// It is the neutral element for [`BoundingBox::encapsulate`] and
    /// [`BoundingBox::union`], and the sentinel the query entry points return
    /// when a subtree contributes no vertices.
    pub const EMPTY: Self = Self {
        min: Vector3::new(f32::INFINITY, f32::INFINITY, f32::INFINITY),
        max: Vector3::new(f32::NEG_INFINITY, f32::NEG_INFINITY, f32::NEG_INFINITY),
    };

    pub fn new(min: Vector3<f32>, max: Vector3<f32>) -> Self {
        Self { min, max }
    }

    /// True when no point has been encapsulated yet.
    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y || self.min.z > self.max.z
    }

    /// Grow the box so it contains `point`.
    pub fn encapsulate(&mut self, point: Vector3<f32>) {
        self.min.x = self.min.x.min(point.x);
        self.min.y = self.min.y.min(point.y);
        self.min.z = self.min.z.min(point.z);
        self.max.x = self.max.x.max(point.x);
        self.max.y = self.max.y.max(point.y);
        self.max.z = self.max.z.max(point.z);
    }

    /// The smallest box containing both `self` and `other`.
    ///
    /// [`BoundingBox::EMPTY`] is neutral on either side; its infinite corners
    /// must not be encapsulated.
    pub fn union(&self, other: &Self) -> Self {
        if other.is_empty() {
            return *self;
        }
        if self.is_empty() {
            return *other;
        }
        let mut merged = *self;
        merged.encapsulate(other.min);
        merged.encapsulate(other.max);
        merged
    }

    /// Only meaningful for a non-empty box.
    pub fn center(&self) -> Vector3<f32> {
        (self.min + self.max) * 0.5
    }

    pub fn size(&self) -> Vector3<f32> {
        self.max - self.min
    }

    /// Tightest box around `points`; [`BoundingBox::EMPTY`] for no points.
    pub fn from_points<I>(points: I) -> Self
    where
        I: IntoIterator<Item = Vector3<f32>>,
    {
        let mut bounds = Self::EMPTY;
        for point in points {
            bounds.encapsulate(point);
        }
        bounds
    }
}

impl Default for BoundingBox {
    fn default() -> Self {
        Self::EMPTY
    }
}

/// Find the point of `points` farthest from `origin`.
///
/// Strict `>` comparison, so the first-seen point wins exact distance ties.
/// Empty input yields `(None, NEG_INFINITY)`.
pub fn farthest_point(
    points: &[Vector3<f32>],
    origin: Vector3<f32>,
) -> (Option<Vector3<f32>>, f32) {
    let mut farthest = None;
    let mut farthest_distance = f32::NEG_INFINITY;
    for &point in points {
        let distance = (point - origin).magnitude();
        if distance > farthest_distance {
            farthest = Some(point);
            farthest_distance = distance;
        }
    }
    (farthest, farthest_distance)
}
