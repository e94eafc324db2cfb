//! Initial camera placement per display mode and view preset.
//!
//! Distance is always `radius * mode multiplier`. Direction comes from the
//! view preset when the mode honors one, else the shared three-quarter
//! diagonal. Directions are normalized before scaling, so the distance rule
//! holds exactly for every preset.

use crate::util::{Radius, Vec3};

use super::camera::CameraPose;
use super::mode::{DisplayMode, ViewPreset};

/// Vertical field of view for every mode.
pub const FOV_Y_DEGREES: f32 = 45.0;

/// Front three-quarter, slightly above. Used when no preset applies.
const DEFAULT_DIRECTION: Vec3 = Vec3::new(0.9, 0.5, 1.1);

/// Clip planes that keep the model unclipped across asset scales.
pub fn clip_planes(radius: Radius) -> (f32, f32) {
    let r = radius.get();
    ((r / 100.0).max(0.01), r * 50.0)
}

/// Unnormalized offset direction for a preset.
///
/// `multiplier` only matters for the heel view, which lifts the camera a
/// fixed half radius above the ground plane rather than a fraction of the
/// distance.
pub fn preset_direction(view: ViewPreset, multiplier: f32) -> Vec3 {
    match view {
        ViewPreset::Front34 => DEFAULT_DIRECTION,
        ViewPreset::Side => Vec3::X,
        ViewPreset::Top => Vec3::Y,
        ViewPreset::Heel => Vec3::new(-multiplier, 0.5, -0.5 * multiplier),
        // Straight up at the outsole. No compensating roll is applied, so the
        // model can read upside down from here.
        ViewPreset::Sole => Vec3::NEG_Y,
        ViewPreset::Detail => Vec3::new(0.5, 0.3, 0.5),
    }
}

/// Camera pose that frames a normalized model for `mode`.
pub fn compute_pose(radius: Radius, mode: DisplayMode, view: Option<ViewPreset>) -> CameraPose {
    let multiplier = mode.distance_multiplier();
    let distance = radius.get() * multiplier;
    let direction = match view {
        Some(v) if mode.honors_view_preset() => preset_direction(v, multiplier),
        _ => DEFAULT_DIRECTION,
    };
    let (near, far) = clip_planes(radius);

    CameraPose {
        position: direction.normalize() * distance,
        target: Vec3::ZERO,
        fov: FOV_Y_DEGREES,
        near,
        far,
    }
}
