//! Math type re-exports and viewer-specific math utilities.
//!
//! This module re-exports types from `glam` and provides the bounding box,
//! the positive-radius newtype and the easing curves the camera code uses.

// Re-export glam types
pub use glam::{Affine3A, Mat3, Mat4, Quat, Vec2, Vec3, Vec3A, Vec4};

use bytemuck::{Pod, Zeroable};
use std::fmt;

/// 3D bounding box with single precision.
#[derive(Clone, Copy, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct BBox3f {
    pub min: Vec3,
    pub max: Vec3,
}

impl BBox3f {
    /// Empty bounding box (inverted, will expand on first point).
    pub const EMPTY: Self = Self {
        min: Vec3::splat(f32::INFINITY),
        max: Vec3::splat(f32::NEG_INFINITY),
    };

    /// Create a new bounding box from min and max points.
    #[inline]
    pub const fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Check if this box is empty (has no volume).
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y || self.min.z > self.max.z
    }

    /// Expand this box to include a point.
    #[inline]
    pub fn expand_by_point(&mut self, p: Vec3) {
        self.min = self.min.min(p);
        self.max = self.max.max(p);
    }

    /// Expand this box to include another box.
    #[inline]
    pub fn expand_by_box(&mut self, other: &Self) {
        if !other.is_empty() {
            self.min = self.min.min(other.min);
            self.max = self.max.max(other.max);
        }
    }

    /// Get the center of the box.
    #[inline]
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Get the size (extents) of the box.
    #[inline]
    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    /// Largest single extent, halved. Not the diagonal.
    #[inline]
    pub fn half_max_extent(&self) -> f32 {
        self.size().max_element() * 0.5
    }

    /// Translate both corners.
    #[inline]
    pub fn translated(&self, offset: Vec3) -> Self {
        Self::new(self.min + offset, self.max + offset)
    }
}

impl Default for BBox3f {
    fn default() -> Self {
        Self::EMPTY
    }
}

impl fmt::Debug for BBox3f {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BBox3f({:?} - {:?})", self.min, self.max)
    }
}

/// Characteristic size of a normalized model: half its largest bounding-box
/// dimension. Always finite and strictly positive.
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd)]
pub struct Radius(f32);

impl Radius {
    /// Returns `None` for zero, negative or non-finite values.
    #[inline]
    pub fn new(value: f32) -> Option<Self> {
        (value.is_finite() && value > 0.0).then_some(Self(value))
    }

    #[inline]
    pub fn get(self) -> f32 {
        self.0
    }
}

impl fmt::Display for Radius {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.4}", self.0)
    }
}

/// Cubic ease-in-out: `4t³` below one half, `1 - (-2t + 2)³ / 2` above.
/// Input is clamped to `[0, 1]`; output is monotonic and stays in `[0, 1]`.
#[inline]
pub fn ease_in_out_cubic(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    if t < 0.5 {
        4.0 * t * t * t
    } else {
        1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
    }
}

/// Blend weight for exponential smoothing that pulls `per_frame` of the way
/// toward the target per 1/60 s, scaled so longer or shorter frames cover
/// the same ground over the same wall time.
#[inline]
pub fn smoothing_alpha(per_frame: f32, dt: f32) -> f32 {
    const REFERENCE_FRAME: f32 = 1.0 / 60.0;
    let per_frame = per_frame.clamp(0.0, 1.0);
    if dt <= 0.0 {
        return 0.0;
    }
    1.0 - (1.0 - per_frame).powf(dt / REFERENCE_FRAME)
}
