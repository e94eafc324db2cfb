//! User orbit/zoom interaction using dolly.
//!
//! Only [`DisplayMode::is_interactive`] modes get live controls. Everywhere
//! else the state is forced to [`InteractionState::disabled`] and input is
//! dropped, whatever the controls were doing before.

use dolly::prelude::*;
use glam::Vec3;

use crate::util::Radius;

use super::camera::CameraPose;
use super::mode::DisplayMode;

/// Rotation smoothing for damped orbiting (dolly smoothness units).
const ROTATION_SMOOTHNESS: f32 = 1.0;
/// Degrees of yaw/pitch per pixel of drag.
const ORBIT_SENSITIVITY: f32 = 0.5;
/// Zoom clamp in units of model radius.
const MIN_DISTANCE_RADII: f32 = 2.0;
const MAX_DISTANCE_RADII: f32 = 6.0;

/// What the user is allowed to do with the camera.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct InteractionState {
    pub enabled: bool,
    pub enable_rotate: bool,
    pub enable_zoom: bool,
    pub enable_pan: bool,
    pub enable_damping: bool,
    pub min_distance: f32,
    pub max_distance: f32,
    pub target: Vec3,
}

impl InteractionState {
    /// Nothing enabled.
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            enable_rotate: false,
            enable_zoom: false,
            enable_pan: false,
            enable_damping: false,
            min_distance: 0.0,
            max_distance: f32::INFINITY,
            target: Vec3::ZERO,
        }
    }

    /// Interaction allowed for `mode` around a model of `radius`.
    pub fn configure(mode: DisplayMode, radius: Radius) -> Self {
        if !mode.is_interactive() {
            return Self::disabled();
        }
        let r = radius.get();
        Self {
            enabled: true,
            enable_rotate: true,
            enable_zoom: true,
            enable_pan: false,
            enable_damping: true,
            min_distance: r * MIN_DISTANCE_RADII,
            max_distance: r * MAX_DISTANCE_RADII,
            target: Vec3::ZERO,
        }
    }

    pub fn clamp_distance(&self, distance: f32) -> f32 {
        distance.clamp(self.min_distance, self.max_distance)
    }
}

impl Default for InteractionState {
    fn default() -> Self {
        Self::disabled()
    }
}

/// Orbit camera rig driven by drag and wheel input.
pub struct OrbitControls {
    state: InteractionState,
    rig: CameraRig,
}

impl OrbitControls {
    /// Controls seeded so their first update reproduces `pose`.
    pub fn new(state: InteractionState, pose: &CameraPose) -> Self {
        Self {
            rig: build_rig(&state, pose),
            state,
        }
    }

    pub fn state(&self) -> &InteractionState {
        &self.state
    }

    pub fn is_enabled(&self) -> bool {
        self.state.enabled
    }

    /// Replace the interaction state and reseed from `pose`.
    pub fn configure(&mut self, state: InteractionState, pose: &CameraPose) {
        self.state = state;
        self.rig = build_rig(&self.state, pose);
    }

    /// Clear everything; later input is ignored.
    pub fn disable(&mut self) {
        self.state = InteractionState::disabled();
    }

    /// Orbit around target (drag). Returns whether the camera moved.
    pub fn orbit(&mut self, delta_x: f32, delta_y: f32) -> bool {
        if !(self.state.enabled && self.state.enable_rotate) {
            return false;
        }
        self.rig.driver_mut::<YawPitch>().rotate_yaw_pitch(
            -delta_x * ORBIT_SENSITIVITY,
            -delta_y * ORBIT_SENSITIVITY,
        );
        true
    }

    /// Zoom (scroll), clamped to the configured distance range.
    pub fn zoom(&mut self, delta: f32) -> bool {
        if !(self.state.enabled && self.state.enable_zoom) {
            return false;
        }
        let arm = self.rig.driver_mut::<Arm>();
        let current = arm.offset.z;
        let sensitivity = 0.002;
        let factor = 1.0 - delta * sensitivity;
        arm.offset.z = self.state.clamp_distance(current * factor);
        true
    }

    /// Panning is never enabled for product viewing.
    pub fn pan(&mut self, _delta_x: f32, _delta_y: f32) -> bool {
        self.state.enabled && self.state.enable_pan
    }

    /// Get current distance from target
    pub fn distance(&self) -> f32 {
        self.rig.driver::<Arm>().offset.z
    }

    /// Advance damping. Returns the new camera position, or `None` when
    /// disabled.
    pub fn update(&mut self, dt: f32) -> Option<Vec3> {
        if !self.state.enabled {
            return None;
        }
        self.rig.update(dt);
        let p = self.rig.final_transform.position;
        Some(Vec3::new(p.x, p.y, p.z))
    }
}

fn build_rig(state: &InteractionState, pose: &CameraPose) -> CameraRig {
    let offset = pose.position - state.target;
    let distance = state.clamp_distance(offset.length().max(f32::EPSILON));
    let (yaw, pitch) = yaw_pitch_degrees(offset);
    let smoothness = if state.enable_damping { ROTATION_SMOOTHNESS } else { 0.0 };
    let t = state.target;

    CameraRig::builder()
        .with(Position::new(mint::Point3 { x: t.x, y: t.y, z: t.z }))
        .with(YawPitch::new().yaw_degrees(yaw).pitch_degrees(pitch))
        .with(Smooth::new_rotation(smoothness))
        .with(Arm::new(mint::Vector3 { x: 0.0, y: 0.0, z: distance }))
        .build()
}

/// Yaw/pitch (YXZ order) that puts a +Z arm along `offset`.
fn yaw_pitch_degrees(offset: Vec3) -> (f32, f32) {
    let dir = offset.normalize_or(Vec3::Z);
    let yaw = dir.x.atan2(dir.z);
    let pitch = -dir.y.clamp(-1.0, 1.0).asin();
    (yaw.to_degrees(), pitch.to_degrees())
}
