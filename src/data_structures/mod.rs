//! Core data types for extent queries.
//!
//! This module contains the value types the rest of the crate moves around:
//!
//! - `bounds` holds the axis-aligned bounding box and point-set aggregation
//! - `transform` holds the position/rotation/scale triple of a scene node

pub mod bounds;
pub mod transform;
