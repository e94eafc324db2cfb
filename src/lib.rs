//! # RunVault viewer
//!
//! Core of the RunVault product viewer: loads the shoe model, centers and
//! measures it, paints it in the selected colorway, frames it for the page
//! it is embedded in, and animates the camera or model every frame.
//!
//! ## Modules
//!
//! - [`util`] - Errors, math, easing
//! - [`scene`] - Node hierarchy, parts, materials
//! - [`asset`] - Sources, glTF decoding, cached loader
//! - [`viewer`] - Framing, interaction, frame drivers, instances and host
//! - [`contact`] - Contact form validation and mail draft link
//!
//! ## Example
//!
//! ```ignore
//! use runvault_viewer::prelude::*;
//!
//! let loader = AssetLoader::new(FsSource::new("public"));
//! let asset = loader.load("/shoe.glb")?;
//! let mut viewer = ViewerInstance::mount(&asset, ViewerProps::new(DisplayMode::Product), |api| {
//!     println!("radius {}", api.radius);
//! })?;
//! viewer.tick(1.0 / 60.0);
//! ```

pub mod asset;
pub mod contact;
pub mod scene;
pub mod util;
pub mod viewer;

// Re-export commonly used types
pub use util::{Error, Radius, Result};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::asset::{Asset, AssetLoader, AssetSource, FsSource, LoadState, MemorySource, DEFAULT_ASSET_URL};
    pub use crate::scene::{Color, Material, ModelRoot, Part, PartRole, Scene};
    pub use crate::util::{BBox3f, Error, Radius, Result};
    pub use crate::viewer::{
        Camera, CameraPose, DisplayMode, FrameLoop, InteractionState, Variant, ViewPreset, ViewerApi, ViewerHost,
        ViewerId, ViewerInstance, ViewerProps,
    };
}
