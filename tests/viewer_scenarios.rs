//! End-to-end viewer scenarios against the glTF fixtures.

use std::sync::Arc;

use runvault_viewer::asset::{Asset, AssetLoader, FsSource};
use runvault_viewer::util::Vec3;
use runvault_viewer::viewer::{
    keyframes, DisplayMode, FrameDriver, FrameLoop, Variant, ViewPreset, ViewerHost, ViewerInstance, ViewerProps,
    ViewerStatus,
};

const FRAME: f32 = 1.0 / 60.0;

fn load(url: &str) -> Arc<Asset> {
    AssetLoader::new(FsSource::new("tests/fixtures"))
        .load(url)
        .expect("fixture should load")
}

fn mount(url: &str, props: ViewerProps) -> ViewerInstance {
    ViewerInstance::mount(&load(url), props, |_| {}).expect("mount")
}

#[test]
fn test_mount_recenters_fixture() {
    let viewer = mount("/shoe.gltf", ViewerProps::new(DisplayMode::Product));
    let bounds = viewer.scene().world_bounds();
    assert!(bounds.center().length() < 1e-5, "center {:?}", bounds.center());
    assert!((viewer.radius().get() - 1.1).abs() < 1e-5);
    assert!((viewer.normalized().center - Vec3::new(0.5, 0.35, 0.0)).length() < 1e-5);
}

#[test]
fn test_product_distance_scales_with_radius() {
    let viewer = mount("/shoe.gltf", ViewerProps::new(DisplayMode::Product));
    let camera = viewer.camera();
    assert!((camera.distance() - 1.1 * 3.8).abs() < 1e-4);
    assert_eq!(camera.target, Vec3::ZERO);
    assert_eq!(camera.fov, 45.0);
}

#[test]
fn test_thumb_side_view_on_x_axis() {
    let viewer = mount(
        "/shoe.gltf",
        ViewerProps::new(DisplayMode::GalleryThumb).with_view(ViewPreset::Side),
    );
    let p = viewer.camera().position;
    assert!((p.x - 1.1 * 4.2).abs() < 1e-4);
    assert_eq!((p.y, p.z), (0.0, 0.0));
}

#[test]
fn test_mode_toggle_clears_interaction() {
    let mut viewer = mount("/shoe.gltf", ViewerProps::new(DisplayMode::Product));
    assert!(viewer.interaction().enabled);
    viewer.drag(40.0, 10.0);
    viewer.tick(FRAME);

    viewer.set_mode(DisplayMode::Hero);
    assert!(!viewer.interaction().enabled);
    assert!(!viewer.zoom(100.0));
    assert_eq!(viewer.frame_loop(), FrameLoop::Always);
    assert!(matches!(viewer.driver(), FrameDriver::Idle(_)));

    viewer.set_mode(DisplayMode::Modal);
    assert!(viewer.interaction().enabled);
    assert_eq!(viewer.frame_loop(), FrameLoop::Demand);
}

#[test]
fn test_recolor_only_touches_own_upper() {
    let asset = load("/shoe.gltf");
    let mut a = ViewerInstance::mount(&asset, ViewerProps::new(DisplayMode::Product), |_| {}).unwrap();
    let b = ViewerInstance::mount(
        &asset,
        ViewerProps::new(DisplayMode::Product).with_variant("Midnight"),
        |_| {},
    )
    .unwrap();
    a.set_variant("Volt");

    let volt = Variant::Volt.color();
    let midnight = Variant::Midnight.color();
    let parts = a.scene().parts();
    assert!(parts[0].material().color().approx_eq(&volt, 1e-6));
    // Laces share the upper's material in the file but keep their color.
    assert!(!parts[2].material().color().approx_eq(&volt, 1e-6));
    assert!(b.scene().parts()[0].material().color().approx_eq(&midnight, 1e-6));

    let template = asset.template().parts();
    assert!(!template[0].material().color().approx_eq(&volt, 1e-6));
}

#[test]
fn test_unnamed_parts_stay_unpainted() {
    let asset = load("/unnamed.gltf");
    let viewer = ViewerInstance::mount(&asset, ViewerProps::new(DisplayMode::Product).with_variant("Volt"), |_| {})
        .unwrap();
    for (ours, template) in viewer.scene().parts().iter().zip(asset.template().parts()) {
        assert_eq!(ours.material().base_color, template.material().base_color);
    }
}

#[test]
fn test_role_tag_wins_over_names() {
    let viewer = mount("/tagged.gltf", ViewerProps::new(DisplayMode::Product).with_variant("Volt"));
    let volt = Variant::Volt.color();
    let painted: Vec<_> = viewer
        .scene()
        .parts()
        .iter()
        .map(|p| p.material().color().approx_eq(&volt, 1e-6))
        .collect();
    assert_eq!(painted, [false, true, false]);
}

#[test]
fn test_scrolly_converges_to_end_keyframes() {
    let mut viewer = mount("/shoe.gltf", ViewerProps::new(DisplayMode::Scrolly));
    let path = keyframes(viewer.radius());

    for _ in 0..1500 {
        viewer.tick(FRAME);
    }
    assert!((viewer.camera().position - path[0].position).length() < 1e-3);
    assert!((viewer.camera().target - path[0].look_at).length() < 1e-3);

    viewer.set_scroll_progress(1.0);
    for _ in 0..1500 {
        viewer.tick(FRAME);
    }
    assert!((viewer.camera().position - path[3].position).length() < 1e-3);
}

#[test]
fn test_scrolly_pauses_offscreen() {
    let mut viewer = mount("/shoe.gltf", ViewerProps::new(DisplayMode::Scrolly));
    viewer.set_scroll_progress(0.5);
    viewer.tick(FRAME);
    viewer.set_active(false);
    assert_eq!(viewer.frame_loop(), FrameLoop::Demand);
    let parked = viewer.camera().position;
    viewer.tick(FRAME);
    assert_eq!(viewer.camera().position, parked);
    assert_eq!(viewer.props().scroll_progress, 0.5);
}

#[test]
fn test_host_drives_mixed_page() {
    let loader = Arc::new(AssetLoader::new(FsSource::new("tests/fixtures")));
    loader.preload("/shoe.gltf").unwrap();
    let mut host = ViewerHost::new(loader);

    let hero = host.mount(
        ViewerProps::new(DisplayMode::Hero).with_asset_url("/shoe.gltf"),
        |_| {},
    );
    let thumbs: Vec<_> = ViewPreset::ALL
        .into_iter()
        .map(|view| {
            host.mount(
                ViewerProps::new(DisplayMode::GalleryThumb)
                    .with_view(view)
                    .with_asset_url("/shoe.gltf"),
                |_| {},
            )
        })
        .collect();
    assert!(thumbs.iter().all(|id| host.status(*id) == Some(ViewerStatus::Ready)));
    assert_eq!(host.loader().fetch_count(), 1);

    assert_eq!(host.frame(FRAME).len(), 1 + thumbs.len());
    for _ in 0..10 {
        assert_eq!(host.frame(FRAME).as_slice(), &[hero]);
    }

    host.instance_mut(hero).unwrap().set_active(false);
    host.frame(FRAME);
    assert!(host.frame(FRAME).is_empty());
}
