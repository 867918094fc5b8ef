//! Node-local transformation data.
//!
//! Every scene node carries a position, rotation, and scale. Traversal
//! composes these into matrices; vertices cross node boundaries via the
//! homogeneous point transform in [`transform_point`].

use cgmath::{Matrix4, One, Quaternion, Vector3};

/// Transformation of one scene node: position, rotation (as quaternion), and scale.
///
/// The host engine reports these per node; queries compose them into a single
/// matrix per hierarchy level via [`Transform::to_matrix`].
#[derive(Clone, Debug)]
pub struct Transform {
    pub position: Vector3<f32>,
    pub rotation: Quaternion<f32>,
    pub scale: Vector3<f32>,
}

impl Transform {
    /// Create a new transform with identity transformation (no move, rotate, or scale).
    pub fn new() -> Self {
        Self {
            position: Vector3::new(0.0, 0.0, 0.0),
            // `Quaternion::one()` is the identity quaternion (no rotation)
            rotation: Quaternion::one(),
            scale: Vector3::new(1.0, 1.0, 1.0),
        }
    }

    /// Compose translation, rotation, and scale into one matrix.
    pub fn to_matrix(&self) -> Matrix4<f32> {
        Matrix4::from_translation(self.position)
            * Matrix4::from(self.rotation)
            * Matrix4::from_nonuniform_scale(self.scale.x, self.scale.y, self.scale.z)
    }
}

impl From<Vector3<f32>> for Transform {
    fn from(position: Vector3<f32>) -> Self {
        Transform {
            position,
            ..Default::default()
        }
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::new()
    }
}

/// Apply `matrix` to a point with the homogeneous w=1 convention.
///
/// The resulting w component is ignored, so this is a point transform, not a
/// direction transform.
pub fn transform_point(matrix: Matrix4<f32>, point: Vector3<f32>) -> Vector3<f32> {
    (matrix * point.extend(1.0)).truncate()
}
