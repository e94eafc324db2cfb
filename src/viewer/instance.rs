//! One mounted viewer: cloned scene, camera, controls and frame driver.
//!
//! Everything a viewer needs lives on [`ViewerInstance`]; nothing is shared
//! between instances except the read-only asset template.

use tracing::{debug, info};

use crate::asset::{Asset, DEFAULT_ASSET_URL};
use crate::scene::{ModelRoot, Scene, Transform};
use crate::util::{Radius, Result};

use super::camera::{Camera, CameraPose};
use super::cinematic::{scroll_progress, Keyframe, ScrollCinematic, DEFAULT_SMOOTHING};
use super::colorize::{apply_variant, Variant};
use super::controls::{InteractionState, OrbitControls};
use super::framing::compute_pose;
use super::idle::IdleRotation;
use super::mode::{DisplayMode, FrameLoop, ViewPreset};
use super::normalize::{normalize, NormalizedScene};
use super::settings::Settings;

/// Upper bound on the device pixel ratio a viewer renders at.
pub const DEFAULT_MAX_PIXEL_RATIO: f32 = 1.5;

/// Inputs from the embedding page.
#[derive(Clone, Debug, PartialEq)]
pub struct ViewerProps {
    pub mode: DisplayMode,
    pub view: Option<ViewPreset>,
    pub variant: String,
    /// Visible and allowed to animate.
    pub active: bool,
    /// Scroll position in `[0, 1]`; only read in scroll mode.
    pub scroll_progress: f32,
    pub reduced_motion: bool,
    pub asset_url: String,
    /// Per-frame pull of the cinematic camera toward its target.
    pub smoothing: f32,
    /// Cap applied to the device pixel ratio.
    pub max_pixel_ratio: f32,
}

impl Default for ViewerProps {
    fn default() -> Self {
        Self {
            mode: DisplayMode::Hero,
            view: None,
            variant: Variant::default().id().to_string(),
            active: true,
            scroll_progress: 0.0,
            reduced_motion: false,
            asset_url: DEFAULT_ASSET_URL.to_string(),
            smoothing: DEFAULT_SMOOTHING,
            max_pixel_ratio: DEFAULT_MAX_PIXEL_RATIO,
        }
    }
}

impl ViewerProps {
    pub fn new(mode: DisplayMode) -> Self {
        Self {
            mode,
            ..Self::default()
        }
    }

    /// Props for `mode` with asset, motion and pixel-ratio choices taken
    /// from the user's settings.
    pub fn from_settings(mode: DisplayMode, settings: &Settings) -> Self {
        Self {
            mode,
            reduced_motion: settings.reduced_motion,
            asset_url: settings.default_asset_url.clone(),
            smoothing: settings.smoothing,
            max_pixel_ratio: settings.max_pixel_ratio,
            ..Self::default()
        }
    }

    pub fn with_view(mut self, view: ViewPreset) -> Self {
        self.view = Some(view);
        self
    }

    pub fn with_variant(mut self, variant: impl Into<String>) -> Self {
        self.variant = variant.into();
        self
    }

    pub fn with_active(mut self, active: bool) -> Self {
        self.active = active;
        self
    }

    pub fn with_asset_url(mut self, url: impl Into<String>) -> Self {
        self.asset_url = url.into();
        self
    }
}

/// The per-frame driver owned by an instance. Exactly one, picked by mode.
#[derive(Clone, Debug)]
pub enum FrameDriver {
    Idle(IdleRotation),
    Cinematic(ScrollCinematic),
}

impl FrameDriver {
    fn for_props(props: &ViewerProps, radius: Radius, pose: &CameraPose) -> Self {
        if !props.mode.is_scroll_driven() {
            return Self::Idle(IdleRotation::new(props.mode, radius, props.active));
        }
        let start = Keyframe {
            position: pose.position,
            look_at: pose.target,
        };
        let mut cinematic = ScrollCinematic::new(radius, start, props.active).with_smoothing(props.smoothing);
        cinematic.set_progress(props.scroll_progress);
        if props.reduced_motion {
            cinematic.set_reduced_motion(true);
        }
        Self::Cinematic(cinematic)
    }

    pub fn is_scheduled(&self) -> bool {
        match self {
            Self::Idle(idle) => idle.is_scheduled(),
            Self::Cinematic(c) => c.is_scheduled(),
        }
    }
}

/// Handle passed to the ready callback.
pub struct ViewerApi<'a> {
    pub camera: &'a mut Camera,
    pub scene: &'a Scene,
    pub radius: Radius,
    /// Device pixel ratio to render at, already capped.
    pub pixel_ratio: f32,
    /// Present only while interaction is enabled.
    pub controls: Option<&'a mut OrbitControls>,
}

impl ViewerApi<'_> {
    /// The cloned model's root transform.
    pub fn model_root(&self) -> &ModelRoot {
        self.scene.root()
    }
}

/// A mounted viewer.
pub struct ViewerInstance {
    props: ViewerProps,
    scene: Scene,
    normalized: NormalizedScene,
    camera: Camera,
    controls: OrbitControls,
    driver: FrameDriver,
    frame_loop: FrameLoop,
    pixel_ratio: f32,
    redraw: bool,
}

impl ViewerInstance {
    /// Clone, normalize, color and frame `asset`, then hand the result to
    /// `on_ready`. The callback runs exactly once, before this returns.
    pub fn mount<F>(asset: &Asset, props: ViewerProps, on_ready: F) -> Result<Self>
    where
        F: FnOnce(ViewerApi<'_>),
    {
        let _span = tracing::info_span!("mount_viewer", url = asset.url(), mode = %props.mode).entered();

        let mut scene = asset.instantiate();
        let normalized = normalize(&mut scene)?;
        apply_variant(&mut scene, &props.variant);

        let pose = compute_pose(normalized.radius, props.mode, props.view);
        let mut camera = Camera::new();
        camera.apply(&pose);

        let controls = OrbitControls::new(InteractionState::configure(props.mode, normalized.radius), &pose);
        let driver = FrameDriver::for_props(&props, normalized.radius, &pose);
        if let FrameDriver::Cinematic(c) = &driver {
            if props.reduced_motion {
                let parked = c.current();
                camera.position = parked.position;
                camera.look_at(parked.look_at);
            }
        }

        let mut instance = Self {
            frame_loop: FrameLoop::for_mode(props.mode, props.active),
            props,
            scene,
            normalized,
            camera,
            controls,
            driver,
            pixel_ratio: 1.0,
            redraw: true,
        };
        info!(
            radius = %instance.normalized.radius,
            distance = instance.camera.distance(),
            frame_loop = ?instance.frame_loop,
            "viewer ready"
        );
        on_ready(instance.api());
        Ok(instance)
    }

    /// Swap in a different asset, keeping props.
    pub fn replace_asset(&mut self, asset: &Asset) -> Result<()> {
        let mut scene = asset.instantiate();
        let normalized = normalize(&mut scene)?;
        apply_variant(&mut scene, &self.props.variant);
        self.scene = scene;
        self.normalized = normalized;
        self.props.asset_url = asset.url().to_string();
        self.reframe();
        Ok(())
    }

    pub fn api(&mut self) -> ViewerApi<'_> {
        let controls = if self.controls.is_enabled() {
            Some(&mut self.controls)
        } else {
            None
        };
        ViewerApi {
            camera: &mut self.camera,
            scene: &self.scene,
            radius: self.normalized.radius,
            pixel_ratio: self.pixel_ratio,
            controls,
        }
    }

    pub fn props(&self) -> &ViewerProps {
        &self.props
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn radius(&self) -> Radius {
        self.normalized.radius
    }

    pub fn normalized(&self) -> &NormalizedScene {
        &self.normalized
    }

    pub fn interaction(&self) -> &InteractionState {
        self.controls.state()
    }

    pub fn driver(&self) -> &FrameDriver {
        &self.driver
    }

    pub fn frame_loop(&self) -> FrameLoop {
        self.frame_loop
    }

    /// Request one redraw under [`FrameLoop::Demand`].
    pub fn invalidate(&mut self) {
        self.redraw = true;
    }

    /// Whether the host should tick this instance on the next frame.
    pub fn needs_frame(&self) -> bool {
        self.redraw || (self.frame_loop == FrameLoop::Always && self.driver.is_scheduled())
    }

    /// Consume a pending redraw request.
    pub fn take_redraw(&mut self) -> bool {
        std::mem::take(&mut self.redraw)
    }

    pub fn set_mode(&mut self, mode: DisplayMode) {
        if mode == self.props.mode {
            return;
        }
        debug!(from = %self.props.mode, to = %mode, "display mode changed");
        self.props.mode = mode;
        self.scene.root_mut().transform = Transform::IDENTITY;
        self.reframe();
    }

    pub fn set_view(&mut self, view: Option<ViewPreset>) {
        if view == self.props.view {
            return;
        }
        self.props.view = view;
        if self.props.mode.honors_view_preset() {
            self.reframe();
        }
    }

    pub fn set_variant(&mut self, variant: &str) {
        if variant == self.props.variant {
            return;
        }
        self.props.variant = variant.to_string();
        apply_variant(&mut self.scene, variant);
        self.invalidate();
    }

    /// Visibility flip. The frame loop switches in the same call.
    pub fn set_active(&mut self, active: bool) {
        if active == self.props.active {
            return;
        }
        self.props.active = active;
        match &mut self.driver {
            FrameDriver::Idle(idle) => idle.set_active(active),
            FrameDriver::Cinematic(c) => c.set_visible(active),
        }
        self.frame_loop = FrameLoop::for_mode(self.props.mode, active);
        debug!(active, frame_loop = ?self.frame_loop, "viewer visibility changed");
        if active {
            self.invalidate();
        }
    }

    pub fn set_scroll_progress(&mut self, p: f32) {
        if !p.is_finite() {
            return;
        }
        self.props.scroll_progress = p.clamp(0.0, 1.0);
        if let FrameDriver::Cinematic(c) = &mut self.driver {
            c.set_progress(p);
        }
    }

    /// Feed the scroll section's layout; see [`scroll_progress`].
    pub fn set_scroll_position(&mut self, top: f32, section_height: f32, viewport_height: f32) {
        if let Some(p) = scroll_progress(top, section_height, viewport_height) {
            self.set_scroll_progress(p);
        }
    }

    pub fn set_reduced_motion(&mut self, reduced: bool) {
        if reduced == self.props.reduced_motion {
            return;
        }
        self.props.reduced_motion = reduced;
        if let FrameDriver::Cinematic(c) = &mut self.driver {
            if let Some(parked) = c.set_reduced_motion(reduced) {
                self.camera.position = parked.position;
                self.camera.look_at(parked.look_at);
            }
        }
        self.invalidate();
    }

    pub fn set_viewport_size(&mut self, width: f32, height: f32) {
        self.camera.set_aspect(width, height);
        self.invalidate();
    }

    /// Report the display's pixel ratio. The viewer renders at this ratio
    /// clamped to `[1, max_pixel_ratio]`.
    pub fn set_device_pixel_ratio(&mut self, ratio: f32) {
        let ratio = if ratio.is_finite() { ratio } else { 1.0 };
        let capped = ratio.clamp(1.0, self.props.max_pixel_ratio.max(1.0));
        if capped != self.pixel_ratio {
            self.pixel_ratio = capped;
            self.invalidate();
        }
    }

    pub fn pixel_ratio(&self) -> f32 {
        self.pixel_ratio
    }

    /// Orbit by a pointer drag in pixels.
    pub fn drag(&mut self, delta_x: f32, delta_y: f32) -> bool {
        let moved = self.controls.orbit(delta_x, delta_y);
        if moved {
            self.invalidate();
        }
        moved
    }

    /// Wheel zoom; positive moves closer.
    pub fn zoom(&mut self, delta: f32) -> bool {
        let moved = self.controls.zoom(delta);
        if moved {
            self.invalidate();
        }
        moved
    }

    /// Advance by `dt` seconds. Returns whether anything needs drawing.
    pub fn tick(&mut self, dt: f32) -> bool {
        let _span = tracing::trace_span!("viewer_tick", dt).entered();
        let mut changed = self.take_redraw();

        match &mut self.driver {
            FrameDriver::Idle(idle) => changed |= idle.tick(dt, self.scene.root_mut()),
            FrameDriver::Cinematic(c) => {
                if let Some(kf) = c.tick(dt) {
                    self.camera.position = kf.position;
                    self.camera.look_at(kf.look_at);
                    changed = true;
                }
            }
        }

        if let Some(position) = self.controls.update(dt) {
            if position.distance(self.camera.position) > 1e-6 {
                self.camera.position = position;
                self.camera.look_at(self.controls.state().target);
                // Damping still settling: keep frames coming.
                self.redraw = true;
                changed = true;
            }
        }
        changed
    }

    /// Recompute pose, interaction and driver for the current props.
    fn reframe(&mut self) {
        let radius = self.normalized.radius;
        let pose = compute_pose(radius, self.props.mode, self.props.view);
        self.camera.apply(&pose);
        self.controls.configure(InteractionState::configure(self.props.mode, radius), &pose);
        self.driver = FrameDriver::for_props(&self.props, radius, &pose);
        if let FrameDriver::Cinematic(c) = &self.driver {
            if self.props.reduced_motion {
                let parked = c.current();
                self.camera.position = parked.position;
                self.camera.look_at(parked.look_at);
            }
        }
        self.frame_loop = FrameLoop::for_mode(self.props.mode, self.props.active);
        self.invalidate();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{Material, PartRole};
    use crate::util::{Vec3, Vec4};
    use std::sync::Arc;

    fn asset() -> Asset {
        let mut scene = Scene::new();
        let root = scene.add_node("ShoeRoot", None, Transform::from_translation(Vec3::new(3.0, 1.0, 0.0)));
        let fabric = Arc::new(Material::new("Fabric", Vec4::ONE));
        let upper: Arc<[Vec3]> = Arc::from(vec![Vec3::new(-1.0, 0.0, -0.5), Vec3::new(1.0, 0.6, 0.5)]);
        let sole: Arc<[Vec3]> = Arc::from(vec![Vec3::new(-1.0, -0.2, -0.5), Vec3::new(1.0, 0.0, 0.5)]);
        scene.add_part(root, "Shoe_Upper", upper, Arc::clone(&fabric));
        let sole = scene.add_part(root, "Sole", sole, fabric);
        scene.parts_mut()[sole].role = Some(PartRole::Sole);
        Asset::new("/shoe.glb", scene, 0)
    }

    fn mount(props: ViewerProps) -> ViewerInstance {
        ViewerInstance::mount(&asset(), props, |_| {}).unwrap()
    }

    #[test]
    fn test_ready_fires_once_with_handle() {
        let mut calls = 0;
        let mut seen_radius = 0.0;
        let instance = ViewerInstance::mount(&asset(), ViewerProps::new(DisplayMode::Product), |api| {
            calls += 1;
            seen_radius = api.radius.get();
            assert!(api.controls.is_some());
            assert_eq!(api.camera.target, Vec3::ZERO);
            assert_ne!(api.model_root().centering, Vec3::ZERO);
        })
        .unwrap();
        assert_eq!(calls, 1);
        assert_eq!(seen_radius, instance.radius().get());
        assert!((instance.radius().get() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_mount_centers_and_frames() {
        let instance = mount(ViewerProps::new(DisplayMode::Product));
        let center = instance.scene().world_bounds().center();
        assert!(center.length() < 1e-5);
        assert!((instance.camera().distance() - 3.8).abs() < 1e-4);
    }

    #[test]
    fn test_product_to_hero_disables_interaction() {
        let mut instance = mount(ViewerProps::new(DisplayMode::Product));
        assert!(instance.interaction().enabled);
        assert!(instance.drag(10.0, 0.0));

        instance.set_mode(DisplayMode::Hero);
        assert!(!instance.interaction().enabled);
        assert!(!instance.drag(10.0, 0.0));
        assert!(instance.api().controls.is_none());
        assert!(matches!(instance.driver(), FrameDriver::Idle(_)));
        assert!((instance.camera().distance() - 3.0).abs() < 1e-4);
    }

    #[test]
    fn test_frame_loop_switches_with_active() {
        let mut instance = mount(ViewerProps::new(DisplayMode::Hero));
        assert_eq!(instance.frame_loop(), FrameLoop::Always);
        instance.set_active(false);
        assert_eq!(instance.frame_loop(), FrameLoop::Demand);
        instance.tick(0.016);
        assert!(!instance.needs_frame());
        instance.set_active(true);
        assert_eq!(instance.frame_loop(), FrameLoop::Always);
    }

    #[test]
    fn test_demand_mode_renders_after_invalidate_only() {
        let mut instance = mount(ViewerProps::new(DisplayMode::GalleryThumb));
        assert!(instance.tick(0.016));
        assert!(!instance.needs_frame());
        instance.set_variant("Volt");
        assert!(instance.needs_frame());
        assert!(instance.tick(0.016));
        assert!(!instance.needs_frame());
    }

    #[test]
    fn test_hero_spins_model_not_camera() {
        let mut instance = mount(ViewerProps::new(DisplayMode::Hero));
        let camera_before = instance.camera().position;
        instance.tick(0.5);
        assert!(instance.scene().root().yaw() > 0.0);
        assert_eq!(instance.camera().position, camera_before);
    }

    #[test]
    fn test_scrolly_follows_progress() {
        let mut props = ViewerProps::new(DisplayMode::Scrolly);
        props.scroll_progress = 1.0;
        let mut instance = mount(props);
        assert!(matches!(instance.driver(), FrameDriver::Cinematic(_)));
        for _ in 0..2000 {
            instance.tick(1.0 / 60.0);
        }
        let r = instance.radius().get();
        assert!((instance.camera().position - Vec3::new(-4.0, 2.0, -5.0) * r).length() < 1e-3);
    }

    #[test]
    fn test_scroll_position_drives_progress() {
        let mut instance = mount(ViewerProps::new(DisplayMode::Scrolly));
        instance.set_scroll_position(-1500.0, 3000.0, 1000.0);
        assert_eq!(instance.props().scroll_progress, 0.75);
        // Section fits the viewport: progress is left alone.
        instance.set_scroll_position(-10.0, 900.0, 1000.0);
        assert_eq!(instance.props().scroll_progress, 0.75);
        match instance.driver() {
            FrameDriver::Cinematic(c) => assert_eq!(c.progress(), 0.75),
            FrameDriver::Idle(_) => panic!("scroll mode should drive the cinematic"),
        }
    }

    #[test]
    fn test_reduced_motion_parks_scrolly() {
        let mut instance = mount(ViewerProps::new(DisplayMode::Scrolly));
        instance.set_reduced_motion(true);
        let r = instance.radius().get();
        assert_eq!(instance.camera().position, Vec3::new(6.0, 1.5, 3.0) * r);
        instance.set_scroll_progress(0.8);
        instance.tick(0.016);
        assert_eq!(instance.camera().position, Vec3::new(6.0, 1.5, 3.0) * r);
    }

    #[test]
    fn test_props_from_settings() {
        let settings = Settings {
            default_asset_url: "/models/trail.glb".into(),
            reduced_motion: true,
            smoothing: 0.3,
            max_pixel_ratio: 2.0,
            ..Settings::default()
        };
        let props = ViewerProps::from_settings(DisplayMode::Scrolly, &settings);
        assert_eq!(props.asset_url, "/models/trail.glb");
        assert!(props.reduced_motion);
        assert_eq!(props.smoothing, 0.3);
        assert_eq!(props.max_pixel_ratio, 2.0);
        assert_eq!(props.variant, "Skywave");
    }

    #[test]
    fn test_pixel_ratio_is_capped() {
        let mut instance = mount(ViewerProps::new(DisplayMode::Product));
        assert_eq!(instance.pixel_ratio(), 1.0);
        instance.tick(0.016);

        instance.set_device_pixel_ratio(3.0);
        assert_eq!(instance.pixel_ratio(), DEFAULT_MAX_PIXEL_RATIO);
        assert!(instance.needs_frame());
        assert_eq!(instance.api().pixel_ratio, DEFAULT_MAX_PIXEL_RATIO);

        instance.set_device_pixel_ratio(0.5);
        assert_eq!(instance.pixel_ratio(), 1.0);
        instance.set_device_pixel_ratio(1.25);
        assert_eq!(instance.pixel_ratio(), 1.25);
    }

    #[test]
    fn test_variant_does_not_touch_template() {
        let asset = asset();
        let mut a = ViewerInstance::mount(&asset, ViewerProps::new(DisplayMode::Product), |_| {}).unwrap();
        let b = ViewerInstance::mount(&asset, ViewerProps::new(DisplayMode::Product), |_| {}).unwrap();
        a.set_variant("Volt");
        let volt = Variant::Volt.color();
        assert!(a.scene().parts()[0].material().color().approx_eq(&volt, 1e-6));
        assert!(!b.scene().parts()[0].material().color().approx_eq(&volt, 1e-6));
        assert_eq!(asset.template().parts()[0].material().base_color, Vec4::ONE);
    }

    #[test]
    fn test_zoom_stays_clamped_after_ticks() {
        let mut instance = mount(ViewerProps::new(DisplayMode::Modal));
        for _ in 0..100 {
            instance.zoom(500.0);
        }
        for _ in 0..10 {
            instance.tick(1.0 / 60.0);
        }
        assert!((instance.camera().distance() - 2.0).abs() < 1e-3);
    }
}
