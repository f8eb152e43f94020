//! Common types and traits for the 3D load scene.
//!
//! The scene frame is right-handed with `y` pointing up: items rest on the
//! `y = 0` ground plane, columns advance along `x`, and `z` is the depth axis.
//! All values in this module are meters.

use std::ops::{Add, Mul, Sub};

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Global numerical tolerance for floating-point comparisons.
pub const EPSILON_GENERAL: f64 = 1e-9;

/// Centimeters per meter, used when converting raw item dimensions.
pub const CENTIMETERS_PER_METER: f64 = 100.0;

/// Represents a 3D vector or point in the scene frame.
///
/// # Examples
/// ```
/// use sea_freight_planner::types::Vec3;
///
/// let center = Vec3::new(0.0, 0.1, 0.0);
/// let size = Vec3::new(0.4, 0.2, 0.3);
/// let top = center + size * 0.5;
/// assert!((top.y - 0.2).abs() < 1e-12);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vec3 {
    /// Creates a new 3D vector.
    ///
    /// # Parameters
    /// * `x` - X component (column axis)
    /// * `y` - Y component (vertical axis)
    /// * `z` - Z component (depth axis)
    #[inline]
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Creates a zero vector (origin).
    #[inline]
    pub const fn zero() -> Self {
        Self::new(0.0, 0.0, 0.0)
    }

    /// Checks whether the box spanned by this vector has no volume.
    #[inline]
    pub fn is_degenerate(&self) -> bool {
        self.x <= 0.0 || self.y <= 0.0 || self.z <= 0.0
    }
}

impl Add for Vec3 {
    type Output = Self;

    #[inline]
    fn add(self, rhs: Self) -> Self::Output {
        Self::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Sub for Vec3 {
    type Output = Self;

    #[inline]
    fn sub(self, rhs: Self) -> Self::Output {
        Self::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Mul<f64> for Vec3 {
    type Output = Self;

    #[inline]
    fn mul(self, scalar: f64) -> Self::Output {
        Self::new(self.x * scalar, self.y * scalar, self.z * scalar)
    }
}

/// Trait for objects with a 3D extent in the scene frame.
pub trait Dimensional {
    /// Returns the extent along (x, y, z).
    fn dimensions(&self) -> Vec3;
}

/// Trait for objects positioned by their geometric center.
pub trait Positioned {
    /// Returns the center of the object's bounding box.
    fn center(&self) -> Vec3;
}

/// Represents an Axis-Aligned Bounding Box (AABB).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoundingBox {
    /// Minimum corner
    pub min: Vec3,
    /// Maximum corner
    pub max: Vec3,
}

impl BoundingBox {
    /// Creates a bounding box around a center point.
    #[inline]
    pub fn from_center_and_size(center: Vec3, size: Vec3) -> Self {
        let half = size * 0.5;
        Self {
            min: center - half,
            max: center + half,
        }
    }

    /// Builds the bounding box of anything that has both a center and an extent.
    #[inline]
    pub fn of<T: Positioned + Dimensional>(object: &T) -> Self {
        Self::from_center_and_size(object.center(), object.dimensions())
    }

    /// Checks if two bounding boxes share interior volume.
    ///
    /// Touching faces do not count as an intersection, so zero-extent boxes
    /// never intersect anything.
    #[inline]
    pub fn intersects(&self, other: &Self) -> bool {
        Self::overlap_1d(self.min.x, self.max.x, other.min.x, other.max.x) > 0.0
            && Self::overlap_1d(self.min.y, self.max.y, other.min.y, other.max.y) > 0.0
            && Self::overlap_1d(self.min.z, self.max.z, other.min.z, other.max.z) > 0.0
    }

    /// Calculates the overlap length in one dimension.
    #[inline]
    fn overlap_1d(a_min: f64, a_max: f64, b_min: f64, b_max: f64) -> f64 {
        (a_max.min(b_max) - a_min.max(b_min)).max(0.0)
    }

    /// Returns the bottom (Y minimum).
    #[inline]
    pub fn bottom_y(&self) -> f64 {
        self.min.y
    }

    /// Returns the top (Y maximum).
    #[inline]
    pub fn top_y(&self) -> f64 {
        self.max.y
    }

    /// Returns the extent along (x, y, z).
    #[inline]
    pub fn dimensions(&self) -> Vec3 {
        self.max - self.min
    }
}
