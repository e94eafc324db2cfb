//! Scroll-linked camera path.
//!
//! Four keyframes (three segments) scaled by model radius. Scroll progress
//! `p` in `[0, 1]` picks a segment (`floor(p * 3)`, clamped to `0..=2`) and
//! a parameter inside it; the parameter is eased with a cubic in-out curve
//! and used to blend the segment's endpoints. That blend is only the
//! *target*: each tick the live camera moves a fixed fraction of the way
//! toward it, so the camera trails the scroll position smoothly.
//!
//! With reduced motion requested the path is skipped entirely: the camera
//! is parked on one overview pose and ticks do nothing.

use tracing::debug;

use crate::util::{ease_in_out_cubic, smoothing_alpha, Radius, Vec3};

/// Number of interpolation segments between the keyframes.
pub const SEGMENTS: usize = 3;

/// Copy phases shown alongside the path.
pub const PHASES: usize = 4;

/// Default per-frame pull toward the target (at 60 fps).
pub const DEFAULT_SMOOTHING: f32 = 0.1;

/// Keyframes in units of radius: (position, look-at).
const KEYFRAME_UNITS: [(Vec3, Vec3); SEGMENTS + 1] = [
    (Vec3::new(4.0, 2.0, 5.0), Vec3::new(0.0, 0.1, 0.0)),
    (Vec3::new(6.0, 1.5, 3.0), Vec3::new(0.0, 0.1, 0.0)),
    (Vec3::new(4.5, 3.5, 2.8), Vec3::new(0.0, 0.2, 0.0)),
    (Vec3::new(-4.0, 2.0, -5.0), Vec3::new(0.0, 0.1, 0.0)),
];

/// Static pose used instead of the path under reduced motion.
const OVERVIEW_UNITS: (Vec3, Vec3) = (Vec3::new(6.0, 1.5, 3.0), Vec3::new(0.0, 0.1, 0.0));

/// Camera position and look-at point.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Keyframe {
    pub position: Vec3,
    pub look_at: Vec3,
}

impl Keyframe {
    fn scaled((position, look_at): (Vec3, Vec3), radius: Radius) -> Self {
        let r = radius.get();
        Self {
            position: position * r,
            look_at: look_at * r,
        }
    }

    pub fn lerp(&self, other: &Self, t: f32) -> Self {
        Self {
            position: self.position.lerp(other.position, t),
            look_at: self.look_at.lerp(other.look_at, t),
        }
    }

    pub fn approx_eq(&self, other: &Self, eps: f32) -> bool {
        self.position.distance(other.position) <= eps && self.look_at.distance(other.look_at) <= eps
    }
}

/// The fixed path scaled to `radius`.
pub fn keyframes(radius: Radius) -> [Keyframe; SEGMENTS + 1] {
    KEYFRAME_UNITS.map(|kf| Keyframe::scaled(kf, radius))
}

pub fn overview(radius: Radius) -> Keyframe {
    Keyframe::scaled(OVERVIEW_UNITS, radius)
}

/// Segment index and raw (uneased) parameter for progress `p`.
pub fn segment(p: f32) -> (usize, f32) {
    let raw = p.clamp(0.0, 1.0) * SEGMENTS as f32;
    let index = (raw.floor() as usize).min(SEGMENTS - 1);
    let t = (raw - index as f32).clamp(0.0, 1.0);
    (index, t)
}

/// Eased target on the path for progress `p`.
pub fn target_at(path: &[Keyframe; SEGMENTS + 1], p: f32) -> Keyframe {
    let (index, t) = segment(p);
    path[index].lerp(&path[index + 1], ease_in_out_cubic(t))
}

/// Progress through a scroll section from its layout.
///
/// `top` is the section's top edge relative to the viewport (negative once
/// scrolled past). Returns `None` when the section is no taller than the
/// viewport, in which case the previous progress should stand.
pub fn scroll_progress(top: f32, section_height: f32, viewport_height: f32) -> Option<f32> {
    let max_scroll = section_height - viewport_height;
    if max_scroll.is_nan() || max_scroll <= 0.0 || !top.is_finite() {
        return None;
    }
    Some((-top / max_scroll).clamp(0.0, 1.0))
}

/// Copy phase for progress `p`, in `0..PHASES`.
pub fn phase(p: f32) -> usize {
    let p = if p.is_finite() { p.clamp(0.0, 1.0) } else { 0.0 };
    ((p * PHASES as f32).floor() as usize).min(PHASES - 1)
}

/// Scheduling state of the driver.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CinematicState {
    /// Off screen; ticks are not scheduled.
    Paused,
    /// Visible and following scroll.
    Running,
    /// Reduced motion: parked on the overview pose.
    Settled,
}

/// Per-instance scroll cinematic driver.
#[derive(Clone, Debug)]
pub struct ScrollCinematic {
    path: [Keyframe; SEGMENTS + 1],
    overview: Keyframe,
    progress: f32,
    current: Keyframe,
    smoothing: f32,
    visible: bool,
    reduced_motion: bool,
    state: CinematicState,
}

impl ScrollCinematic {
    /// Driver for a model of `radius`, with the live camera starting at
    /// `start`.
    pub fn new(radius: Radius, start: Keyframe, visible: bool) -> Self {
        Self {
            path: keyframes(radius),
            overview: overview(radius),
            progress: 0.0,
            current: start,
            smoothing: DEFAULT_SMOOTHING,
            visible,
            reduced_motion: false,
            state: if visible { CinematicState::Running } else { CinematicState::Paused },
        }
    }

    pub fn with_smoothing(mut self, per_frame: f32) -> Self {
        self.smoothing = per_frame.clamp(0.0, 1.0);
        self
    }

    pub fn state(&self) -> CinematicState {
        self.state
    }

    pub fn progress(&self) -> f32 {
        self.progress
    }

    pub fn current(&self) -> Keyframe {
        self.current
    }

    pub fn path(&self) -> &[Keyframe; SEGMENTS + 1] {
        &self.path
    }

    /// Where the camera is heading for the current progress.
    pub fn target(&self) -> Keyframe {
        if self.reduced_motion {
            self.overview
        } else {
            target_at(&self.path, self.progress)
        }
    }

    /// Whether the host should keep ticking this driver.
    pub fn is_scheduled(&self) -> bool {
        self.state == CinematicState::Running
    }

    /// Record scroll progress. Non-finite input is ignored.
    pub fn set_progress(&mut self, p: f32) {
        if p.is_finite() {
            self.progress = p.clamp(0.0, 1.0);
        }
    }

    /// Pause or resume ticking. Progress and the live camera are kept.
    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
        self.refresh_state();
    }

    /// Switch reduced motion. Turning it on parks the camera on the
    /// overview pose immediately and returns that pose.
    pub fn set_reduced_motion(&mut self, reduced: bool) -> Option<Keyframe> {
        self.reduced_motion = reduced;
        self.refresh_state();
        if reduced {
            self.current = self.overview;
            Some(self.current)
        } else {
            None
        }
    }

    /// Re-scale the path for a new radius, keeping progress.
    pub fn rescale(&mut self, radius: Radius) {
        self.path = keyframes(radius);
        self.overview = overview(radius);
        if self.reduced_motion {
            self.current = self.overview;
        }
    }

    /// Move the live camera toward the target. `None` when not scheduled.
    pub fn tick(&mut self, dt: f32) -> Option<Keyframe> {
        if !self.is_scheduled() {
            return None;
        }
        let target = target_at(&self.path, self.progress);
        let alpha = smoothing_alpha(self.smoothing, dt);
        self.current = self.current.lerp(&target, alpha);
        Some(self.current)
    }

    fn refresh_state(&mut self) {
        let next = match (self.reduced_motion, self.visible) {
            (true, _) => CinematicState::Settled,
            (false, true) => CinematicState::Running,
            (false, false) => CinematicState::Paused,
        };
        if next != self.state {
            debug!(from = ?self.state, to = ?next, progress = self.progress, "cinematic state");
            self.state = next;
        }
    }
}
