//! RunVault CLI - inspect the shoe asset and preview viewer framing.

use anyhow::{anyhow, bail, Context, Result};
use runvault_viewer::prelude::*;
use runvault_viewer::viewer::{is_paintable, keyframes, Settings};
use std::env;
use std::path::Path;
use tracing::{debug, info};
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

const FRAME: f32 = 1.0 / 60.0;

fn main() {
    let args: Vec<String> = env::args().collect();

    // Parse global flags
    let mut level = "info";
    let mut filtered_args: Vec<&str> = Vec::new();
    for arg in &args[1..] {
        match arg.as_str() {
            "-v" | "--verbose" => level = "debug",
            "-vv" | "--trace" => level = "trace",
            "-q" | "--quiet" => level = "error",
            _ => filtered_args.push(arg),
        }
    }
    let _guard = init_tracing(level);

    if filtered_args.is_empty() {
        print_help();
        return;
    }

    let result = match filtered_args[0] {
        "info" | "i" => with_file(&filtered_args, "info <asset>", cmd_info),
        "frame" | "f" => with_file(&filtered_args, "frame <asset> [--mode M] [--view V] [--variant X]", |p| {
            cmd_frame(p, &filtered_args[2..])
        }),
        "scrub" | "s" => with_file(&filtered_args, "scrub <asset> [--steps N] [--reduced-motion]", |p| {
            cmd_scrub(p, &filtered_args[2..])
        }),
        "help" | "h" | "-h" | "--help" => {
            print_help();
            Ok(())
        }
        other => Err(anyhow!("unknown command: {}", other)),
    };

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn print_help() {
    println!(
        "runvault {} - RunVault shoe viewer toolkit (built {} {})",
        env!("CARGO_PKG_VERSION"),
        env!("RUNVAULT_BUILD_DATE"),
        env!("RUNVAULT_BUILD_TIME")
    );
    println!();
    println!("USAGE:");
    println!("    runvault [OPTIONS] <COMMAND> [ARGS]");
    println!();
    println!("COMMANDS:");
    println!("    i, info  <asset>                  Show parts, roles, bounds and radius");
    println!("    f, frame <asset> [flags]          Show the starting camera for a mode");
    println!("    s, scrub <asset> [flags]          Sample the scroll cinematic path");
    println!("    h, help                           Show this help");
    println!();
    println!("FRAME FLAGS:");
    println!("    --mode <hero|product|thumb|modal|scrolly>");
    println!("    --view <front34|side|top|heel|sole|detail>");
    println!("    --variant <Skywave|Midnight|Volt>");
    println!("    --dpr <ratio>        Device pixel ratio (capped by settings)");
    println!();
    println!("SCRUB FLAGS:");
    println!("    --steps <N>          Number of progress samples (default 5)");
    println!("    --reduced-motion     Park on the overview pose");
    println!();
    println!("ASSETS:");
    println!("    <asset> is a file path, or a URL such as /shoe.glb resolved under");
    println!("    the asset root in settings.json");
    println!();
    println!("OPTIONS:");
    println!("    -v, --verbose    Show debug output");
    println!("    -vv, --trace     Show trace output (very verbose)");
    println!("    -q, --quiet      Errors only");
    println!();
    println!("ENVIRONMENT:");
    println!("    RUST_LOG           Overrides the log filter");
    println!("    RUNVAULT_TRACE=1   Write trace.json (build with --features trace)");
}

fn filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
}

#[cfg(feature = "trace")]
fn init_tracing(level: &str) -> Option<tracing_chrome::FlushGuard> {
    let fmt = tracing_subscriber::fmt::layer().with_target(false).with_writer(std::io::stderr);
    if env::var("RUNVAULT_TRACE").ok().as_deref() != Some("1") {
        tracing_subscriber::registry().with(filter(level)).with(fmt).init();
        return None;
    }

    let (chrome_layer, guard) = tracing_chrome::ChromeLayerBuilder::new()
        .file("trace.json")
        .build();
    tracing_subscriber::registry()
        .with(filter(level))
        .with(fmt)
        .with(chrome_layer)
        .init();
    Some(guard)
}

#[cfg(not(feature = "trace"))]
fn init_tracing(level: &str) {
    let fmt = tracing_subscriber::fmt::layer().with_target(false).with_writer(std::io::stderr);
    tracing_subscriber::registry().with(filter(level)).with(fmt).init();
}

fn with_file<F>(args: &[&str], usage: &str, run: F) -> Result<()>
where
    F: FnOnce(&Path) -> Result<()>,
{
    match args.get(1) {
        Some(path) => run(Path::new(path)),
        None => bail!("missing asset argument\nUsage: runvault {}", usage),
    }
}

/// Load an asset through the same cache viewers use. Arguments starting
/// with `/` are asset URLs under the configured asset root; anything else is
/// a file path.
fn load(path: &Path, settings: &Settings) -> Result<std::sync::Arc<Asset>> {
    if let Some(url) = path.to_str().filter(|p| p.starts_with('/') && !path.exists()) {
        debug!(root = %settings.asset_root.display(), url, "loading asset by url");
        return Ok(AssetLoader::new(settings.asset_source()).load(url)?);
    }
    let dir = path.parent().filter(|d| !d.as_os_str().is_empty()).unwrap_or(Path::new("."));
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .with_context(|| format!("not a file path: {}", path.display()))?;
    let loader = AssetLoader::new(FsSource::new(dir));
    let url = format!("/{}", name);
    debug!(root = %dir.display(), %url, "loading asset");
    Ok(loader.load(&url)?)
}

fn flag<'a>(args: &[&'a str], name: &str) -> Option<&'a str> {
    args.iter().position(|a| *a == name).and_then(|i| args.get(i + 1).copied())
}

fn cmd_info(path: &Path) -> Result<()> {
    let asset = load(path, &Settings::load())?;
    let scene = asset.template();
    let bounds = scene.world_bounds();

    println!("Asset: {}", path.display());
    println!("Size:  {} bytes", asset.byte_len());
    println!("Nodes: {}", scene.nodes().len());
    println!("Parts: {} ({} vertices)", scene.parts().len(), scene.vertex_count());
    for part in scene.parts() {
        let role = part.role.map(|r| r.to_string()).unwrap_or_else(|| "-".to_string());
        let paint = if is_paintable(part) { "paintable" } else { "" };
        println!("  {:<24} role={:<6} material={:<16} {}", part.name, role, part.material().name, paint);
    }
    println!();

    let mut centered = asset.instantiate();
    let normalized = runvault_viewer::viewer::normalize(&mut centered)?;
    println!("Bounds: {:?} .. {:?}", bounds.min, bounds.max);
    println!("Center: {:?}", normalized.center);
    println!("Size:   {:?}", normalized.size);
    println!("Radius: {}", normalized.radius);
    Ok(())
}

fn cmd_frame(path: &Path, args: &[&str]) -> Result<()> {
    let settings = Settings::load();
    let mut props = ViewerProps::from_settings(DisplayMode::Product, &settings);
    if let Some(mode) = flag(args, "--mode") {
        props.mode = mode.parse()?;
    }
    if let Some(view) = flag(args, "--view") {
        props.view = Some(view.parse()?);
    }
    if let Some(variant) = flag(args, "--variant") {
        props.variant = variant.to_string();
    }

    let dpr: f32 = match flag(args, "--dpr") {
        Some(n) => n.parse().with_context(|| format!("bad --dpr value: {}", n))?,
        None => 1.0,
    };

    let asset = load(path, &settings)?;
    let mut viewer = ViewerInstance::mount(&asset, props, |api| {
        info!(radius = %api.radius, interactive = api.controls.is_some(), "viewer ready");
    })?;
    viewer.set_device_pixel_ratio(dpr);

    let camera = viewer.camera();
    println!("Mode:      {}", viewer.props().mode);
    println!("View:      {}", viewer.props().view.map(|v| v.as_str()).unwrap_or("default"));
    println!("Radius:    {}", viewer.radius());
    println!("Position:  {:?}", camera.position);
    println!("Target:    {:?}", camera.target);
    println!("Distance:  {:.4}", camera.distance());
    println!("FOV:       {}", camera.fov);
    println!("Clip:      {} .. {}", camera.near, camera.far);
    println!("Loop:      {:?}", viewer.frame_loop());
    println!("DPR:       {} (cap {})", viewer.pixel_ratio(), viewer.props().max_pixel_ratio);
    let state = viewer.interaction();
    if state.enabled {
        println!("Orbit:     zoom {} .. {}", state.min_distance, state.max_distance);
    } else {
        println!("Orbit:     disabled");
    }
    Ok(())
}

fn cmd_scrub(path: &Path, args: &[&str]) -> Result<()> {
    let steps: usize = match flag(args, "--steps") {
        Some(n) => n.parse().with_context(|| format!("bad --steps value: {}", n))?,
        None => 5,
    };
    if steps < 2 {
        bail!("--steps must be at least 2");
    }
    let settings = Settings::load();
    let mut props = ViewerProps::from_settings(DisplayMode::Scrolly, &settings);
    props.reduced_motion |= args.contains(&"--reduced-motion");

    let asset = load(path, &settings)?;
    let mut viewer = ViewerInstance::mount(&asset, props, |_| {})?;
    let radius = viewer.radius();
    println!("Radius: {}", radius);
    for (i, kf) in keyframes(radius).iter().enumerate() {
        println!("  keyframe {}: pos {:?} look {:?}", i, kf.position, kf.look_at);
    }
    println!();

    for step in 0..steps {
        let p = step as f32 / (steps - 1) as f32;
        viewer.set_scroll_progress(p);
        for _ in 0..600 {
            viewer.tick(FRAME);
        }
        let camera = viewer.camera();
        println!("p={:.3}  pos {:?}  look {:?}", p, camera.position, camera.target);
    }
    Ok(())
}
