//! Passive turntable motion for non-scroll modes.

use crate::scene::ModelRoot;
use crate::util::Radius;

use super::mode::DisplayMode;

/// Turntable parameters for one mode.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct IdleMotion {
    /// Yaw rate, radians per second.
    pub rate: f32,
    /// Vertical bob amplitude in units of radius. Zero disables bobbing.
    pub bob_amplitude: f32,
    /// Bob angular frequency, radians per second.
    pub bob_frequency: f32,
}

impl IdleMotion {
    pub const STILL: Self = Self {
        rate: 0.0,
        bob_amplitude: 0.0,
        bob_frequency: 0.0,
    };

    pub fn for_mode(mode: DisplayMode) -> Self {
        match mode {
            DisplayMode::Hero => Self {
                rate: 0.15,
                bob_amplitude: 0.05,
                bob_frequency: 1.0,
            },
            // Interactive modes leave the model alone; thumbnails stay put so
            // they render once.
            DisplayMode::Product | DisplayMode::Modal | DisplayMode::GalleryThumb => Self::STILL,
            // Owned by the cinematic driver.
            DisplayMode::Scrolly => Self::STILL,
        }
    }

    pub fn is_still(&self) -> bool {
        self.rate == 0.0 && self.bob_amplitude == 0.0
    }
}

/// Per-instance turntable driver.
#[derive(Clone, Debug)]
pub struct IdleRotation {
    motion: IdleMotion,
    radius: Radius,
    elapsed: f32,
    active: bool,
}

impl IdleRotation {
    pub fn new(mode: DisplayMode, radius: Radius, active: bool) -> Self {
        Self {
            motion: IdleMotion::for_mode(mode),
            radius,
            elapsed: 0.0,
            active,
        }
    }

    pub fn motion(&self) -> IdleMotion {
        self.motion
    }

    /// Seconds of motion accumulated while active.
    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    pub fn set_active(&mut self, active: bool) {
        self.active = active;
    }

    pub fn set_radius(&mut self, radius: Radius) {
        self.radius = radius;
    }

    /// Whether the host needs to tick this driver at all.
    pub fn is_scheduled(&self) -> bool {
        self.active && !self.motion.is_still()
    }

    /// Advance the model by `dt` seconds. Returns whether it moved.
    pub fn tick(&mut self, dt: f32, root: &mut ModelRoot) -> bool {
        if !self.is_scheduled() || dt <= 0.0 {
            return false;
        }
        self.elapsed += dt;
        let yaw = root.yaw() + self.motion.rate * dt;
        root.set_yaw(yaw.rem_euclid(std::f32::consts::TAU));
        if self.motion.bob_amplitude != 0.0 {
            let amplitude = self.motion.bob_amplitude * self.radius.get();
            root.transform.translation.y = (self.elapsed * self.motion.bob_frequency).sin() * amplitude;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn r() -> Radius {
        Radius::new(2.0).unwrap()
    }

    #[test]
    fn test_hero_spins_and_bobs() {
        let mut root = ModelRoot::default();
        let mut idle = IdleRotation::new(DisplayMode::Hero, r(), true);
        for _ in 0..60 {
            assert!(idle.tick(1.0 / 60.0, &mut root));
        }
        assert!((root.yaw() - 0.15).abs() < 1e-4);
        let expected_y = 1.0f32.sin() * 0.05 * 2.0;
        assert!((root.transform.translation.y - expected_y).abs() < 1e-4);
    }

    #[test]
    fn test_inactive_does_not_advance() {
        let mut root = ModelRoot::default();
        let mut idle = IdleRotation::new(DisplayMode::Hero, r(), false);
        assert!(!idle.is_scheduled());
        assert!(!idle.tick(0.5, &mut root));
        assert_eq!(root, ModelRoot::default());

        idle.set_active(true);
        assert!(idle.tick(0.5, &mut root));
        idle.set_active(false);
        let frozen = root;
        assert!(!idle.tick(0.5, &mut root));
        assert_eq!(root, frozen);
        assert_eq!(idle.elapsed(), 0.5);
    }

    #[test]
    fn test_still_modes_never_scheduled() {
        for mode in [DisplayMode::Product, DisplayMode::Modal, DisplayMode::GalleryThumb] {
            let idle = IdleRotation::new(mode, r(), true);
            assert!(!idle.is_scheduled(), "{:?}", mode);
        }
    }

    #[test]
    fn test_rate_scales_with_dt() {
        let mut fast = ModelRoot::default();
        let mut slow = ModelRoot::default();
        let mut a = IdleRotation::new(DisplayMode::Hero, r(), true);
        let mut b = IdleRotation::new(DisplayMode::Hero, r(), true);
        a.tick(0.1, &mut fast);
        for _ in 0..10 {
            b.tick(0.01, &mut slow);
        }
        assert!((fast.yaw() - slow.yaw()).abs() < 1e-4);
    }
}
