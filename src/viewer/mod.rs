//! Shoe viewer core.
//!
//! Per mounted viewer, in order: clone the cached asset, [`normalize`] it,
//! color it ([`apply_variant`]), frame it ([`compute_pose`]), wire up
//! [`OrbitControls`] where the mode allows, and pick a frame driver
//! ([`IdleRotation`] or [`ScrollCinematic`]). [`ViewerInstance`] holds the
//! result; [`ViewerHost`] drives frames for all of them.

mod camera;
mod cinematic;
mod colorize;
mod controls;
mod framing;
mod host;
mod idle;
mod instance;
mod mode;
mod normalize;
mod preferences;
mod settings;

pub use camera::{wgpu_projection, Camera, CameraPose};
pub use cinematic::{
    keyframes, overview, phase, scroll_progress, segment, target_at, CinematicState, Keyframe, ScrollCinematic,
    DEFAULT_SMOOTHING, PHASES, SEGMENTS,
};
pub use colorize::{apply_color, apply_variant, is_paintable, variant_color, Variant, NEUTRAL_HEX};
pub use controls::{InteractionState, OrbitControls};
pub use framing::{clip_planes, compute_pose, preset_direction, FOV_Y_DEGREES};
pub use host::{ReadyCallback, ViewerHost, ViewerId, ViewerStatus};
pub use idle::{IdleMotion, IdleRotation};
pub use instance::{FrameDriver, ViewerApi, ViewerInstance, ViewerProps, DEFAULT_MAX_PIXEL_RATIO};
pub use mode::{DisplayMode, FrameLoop, ViewPreset};
pub use normalize::{normalize, NormalizedScene};
pub use preferences::{Preferences, SIZE_KEY, VARIANT_KEY};
pub use settings::Settings;
