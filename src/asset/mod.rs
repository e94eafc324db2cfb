//! Asset fetching, decoding and caching.
//!
//! - [`AssetSource`] - where bytes come from (disk, memory)
//! - [`AssetLoader`] - per-URL cache with load deduplication
//! - [`decode_scene`] - glTF 2.0 to [`crate::scene::Scene`]

mod gltf_scene;
mod loader;
mod source;

pub use gltf_scene::decode_scene;
pub use loader::{Asset, AssetLoader, LoadState, LoadTicket};
pub use source::{AssetBytes, AssetSource, FsSource, MemorySource};

/// Asset every viewer loads unless told otherwise.
pub const DEFAULT_ASSET_URL: &str = "/shoe.glb";
