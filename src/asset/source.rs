//! Where asset bytes come from.
//!
//! The viewer addresses assets by URL path (`/shoe.glb`). A source maps that
//! path to bytes; the loader never cares whether they came off disk or out
//! of an in-process table.

use std::collections::HashMap;
use std::fs::File;
use std::ops::Deref;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

#[cfg(feature = "mmap")]
use memmap2::Mmap;
use parking_lot::RwLock;

use crate::util::{Error, Result};

/// Raw asset bytes, either owned or mapped from a file.
pub enum AssetBytes {
    /// Memory-mapped file (preferred for on-disk assets)
    #[cfg(feature = "mmap")]
    Mapped(Mmap),
    /// Heap buffer
    Owned(Arc<[u8]>),
}

impl Deref for AssetBytes {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        match self {
            #[cfg(feature = "mmap")]
            Self::Mapped(m) => m,
            Self::Owned(b) => b,
        }
    }
}

/// Supplies bytes for an asset URL.
///
/// Implementations are shared with the background loader thread, so they
/// must be `Send + Sync`.
pub trait AssetSource: Send + Sync {
    fn fetch(&self, url: &str) -> Result<AssetBytes>;
}

/// Serves URL paths from a directory on disk.
#[derive(Clone, Debug)]
pub struct FsSource {
    root: PathBuf,
}

impl FsSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Map a URL path below the root. Rejects anything that would climb out.
    pub fn resolve(&self, url: &str) -> Result<PathBuf> {
        let trimmed = url.split(['?', '#']).next().unwrap_or_default();
        let relative = Path::new(trimmed.trim_start_matches('/'));
        if relative.as_os_str().is_empty() {
            return Err(Error::InvalidUrl(url.to_string()));
        }
        let mut path = self.root.clone();
        for component in relative.components() {
            match component {
                Component::Normal(part) => path.push(part),
                Component::CurDir => {}
                _ => return Err(Error::InvalidUrl(url.to_string())),
            }
        }
        Ok(path)
    }
}

impl AssetSource for FsSource {
    fn fetch(&self, url: &str) -> Result<AssetBytes> {
        let path = self.resolve(url)?;
        let file = File::open(&path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::AssetNotFound(url.to_string())
            } else {
                Error::Fetch {
                    url: url.to_string(),
                    source: e,
                }
            }
        })?;
        let size = file
            .metadata()
            .map_err(|e| Error::Fetch {
                url: url.to_string(),
                source: e,
            })?
            .len();

        #[cfg(feature = "mmap")]
        if size > 0 {
            // Safety: mapped read-only; assets are not rewritten while served.
            let mmap = unsafe { Mmap::map(&file) }.map_err(|e| Error::Fetch {
                url: url.to_string(),
                source: e,
            })?;
            return Ok(AssetBytes::Mapped(mmap));
        }

        let mut buf = Vec::with_capacity(size as usize);
        std::io::Read::read_to_end(&mut &file, &mut buf).map_err(|e| Error::Fetch {
            url: url.to_string(),
            source: e,
        })?;
        Ok(AssetBytes::Owned(buf.into()))
    }
}

/// In-process table of assets, keyed by URL.
#[derive(Default)]
pub struct MemorySource {
    entries: RwLock<HashMap<String, Arc<[u8]>>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, url: impl Into<String>, bytes: impl Into<Arc<[u8]>>) {
        self.entries.write().insert(url.into(), bytes.into());
    }

    pub fn remove(&self, url: &str) -> bool {
        self.entries.write().remove(url).is_some()
    }
}

impl AssetSource for MemorySource {
    fn fetch(&self, url: &str) -> Result<AssetBytes> {
        self.entries
            .read()
            .get(url)
            .cloned()
            .map(AssetBytes::Owned)
            .ok_or_else(|| Error::AssetNotFound(url.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_strips_leading_slash() {
        let src = FsSource::new("/srv/public");
        assert_eq!(src.resolve("/shoe.glb").unwrap(), PathBuf::from("/srv/public/shoe.glb"));
        assert_eq!(
            src.resolve("models/./shoe.glb?v=2").unwrap(),
            PathBuf::from("/srv/public/models/shoe.glb")
        );
    }

    #[test]
    fn test_resolve_rejects_escape() {
        let src = FsSource::new("/srv/public");
        assert!(matches!(src.resolve("/../etc/passwd"), Err(Error::InvalidUrl(_))));
        assert!(matches!(src.resolve("/"), Err(Error::InvalidUrl(_))));
    }

    #[test]
    fn test_fs_fetch_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.bin"), [1u8, 2, 3]).unwrap();
        let src = FsSource::new(dir.path());

        let bytes = src.fetch("/a.bin").unwrap();
        assert_eq!(&*bytes, &[1, 2, 3]);
        assert!(matches!(src.fetch("/missing.bin"), Err(Error::AssetNotFound(_))));
    }

    #[test]
    fn test_memory_source() {
        let src = MemorySource::new();
        src.insert("/x", vec![9u8]);
        assert_eq!(&*src.fetch("/x").unwrap(), &[9]);
        assert!(src.remove("/x"));
        assert!(src.fetch("/x").is_err());
    }
}
