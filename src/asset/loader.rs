//! Asset cache with per-URL load deduplication.
//!
//! Each URL owns a slot guarded by its own mutex. The first caller to reach
//! an empty slot fetches and decodes while holding that lock; anyone else
//! asking for the same URL blocks on the slot and then reads the stored
//! result, so the source is hit once per URL no matter how many callers
//! race. Other URLs are not blocked. Failures leave the slot empty, so the
//! next `load` retries.
//!
//! Entries are never evicted: the viewer works with a handful of assets for
//! the life of the process.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::{channel, Receiver, TryRecvError};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use parking_lot::{Mutex, RwLock};
use tracing::{debug, info, warn};

use super::gltf_scene::decode_scene;
use super::source::AssetSource;
use crate::scene::Scene;
use crate::util::{Error, Result};

/// A decoded asset. Read-only; viewers work on [`Asset::instantiate`] copies.
#[derive(Debug)]
pub struct Asset {
    url: String,
    template: Scene,
    byte_len: usize,
}

impl Asset {
    pub fn new(url: impl Into<String>, template: Scene, byte_len: usize) -> Self {
        Self {
            url: url.into(),
            template,
            byte_len,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn template(&self) -> &Scene {
        &self.template
    }

    /// Size of the fetched payload in bytes.
    pub fn byte_len(&self) -> usize {
        self.byte_len
    }

    /// Private copy for one viewer. Geometry stays shared.
    pub fn instantiate(&self) -> Scene {
        self.template.clone()
    }
}

type Slot = Arc<Mutex<Option<Arc<Asset>>>>;

/// Thread-safe asset cache.
pub struct AssetLoader {
    source: Arc<dyn AssetSource>,
    slots: RwLock<HashMap<String, Slot>>,
    fetches: AtomicUsize,
}

impl AssetLoader {
    pub fn new(source: impl AssetSource + 'static) -> Self {
        Self::with_source(Arc::new(source))
    }

    pub fn with_source(source: Arc<dyn AssetSource>) -> Self {
        Self {
            source,
            slots: RwLock::new(HashMap::new()),
            fetches: AtomicUsize::new(0),
        }
    }

    /// Load `url`, fetching only if no earlier call has succeeded.
    pub fn load(&self, url: &str) -> Result<Arc<Asset>> {
        let slot = self.slot(url);
        let mut entry = slot.lock();
        if let Some(asset) = entry.as_ref() {
            return Ok(Arc::clone(asset));
        }

        let _span = tracing::info_span!("load_asset", url).entered();
        let asset = match self.fetch_and_decode(url) {
            Ok(a) => Arc::new(a),
            Err(e) => {
                warn!(url, error = %e, "asset load failed");
                return Err(e);
            }
        };
        info!(url, bytes = asset.byte_len(), parts = asset.template().parts().len(), "asset loaded");
        *entry = Some(Arc::clone(&asset));
        Ok(asset)
    }

    /// Warm the cache without instantiating anything.
    pub fn preload(&self, url: &str) -> Result<()> {
        self.load(url).map(|_| ())
    }

    /// Cached asset, if loaded. Never blocks on an in-flight load.
    pub fn get(&self, url: &str) -> Option<Arc<Asset>> {
        let slot = self.slots.read().get(url).cloned()?;
        let entry = slot.try_lock()?;
        entry.as_ref().map(Arc::clone)
    }

    pub fn contains(&self, url: &str) -> bool {
        self.get(url).is_some()
    }

    /// URLs with a completed load, sorted.
    pub fn cached_urls(&self) -> Vec<String> {
        let mut urls: Vec<String> = self
            .slots
            .read()
            .iter()
            .filter(|(_, slot)| slot.try_lock().is_some_and(|e| e.is_some()))
            .map(|(url, _)| url.clone())
            .collect();
        urls.sort();
        urls
    }

    /// Number of times the source has been asked for bytes.
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::Relaxed)
    }

    /// Load on a background thread. Already-cached assets resolve
    /// immediately without spawning.
    pub fn spawn_load(self: &Arc<Self>, url: &str) -> LoadTicket {
        if let Some(asset) = self.get(url) {
            return LoadTicket::ready(url, asset);
        }

        let (tx, rx) = channel();
        let loader = Arc::clone(self);
        let owned = url.to_string();
        let handle = thread::spawn(move || {
            let result = loader.load(&owned);
            // Ticket may have been dropped; nothing to report to then.
            let _ = tx.send(result);
        });

        LoadTicket {
            url: url.to_string(),
            rx: Some(rx),
            handle: Some(handle),
            state: LoadState::Loading,
        }
    }

    fn slot(&self, url: &str) -> Slot {
        if let Some(slot) = self.slots.read().get(url) {
            return Arc::clone(slot);
        }
        let mut slots = self.slots.write();
        Arc::clone(slots.entry(url.to_string()).or_default())
    }

    fn fetch_and_decode(&self, url: &str) -> Result<Asset> {
        self.fetches.fetch_add(1, Ordering::Relaxed);
        let bytes = self.source.fetch(url)?;
        debug!(url, bytes = bytes.len(), "fetched asset bytes");
        let scene = decode_scene(url, &bytes)?;
        Ok(Asset::new(url, scene, bytes.len()))
    }
}

/// Progress of a background load.
#[derive(Debug)]
pub enum LoadState {
    Loading,
    Ready(Arc<Asset>),
    Failed(Error),
}

impl LoadState {
    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }
}

/// Handle to a background load started by [`AssetLoader::spawn_load`].
pub struct LoadTicket {
    url: String,
    rx: Option<Receiver<Result<Arc<Asset>>>>,
    handle: Option<JoinHandle<()>>,
    state: LoadState,
}

impl LoadTicket {
    fn ready(url: &str, asset: Arc<Asset>) -> Self {
        Self {
            url: url.to_string(),
            rx: None,
            handle: None,
            state: LoadState::Ready(asset),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Check for completion (non-blocking).
    pub fn poll(&mut self) -> &LoadState {
        if let Some(rx) = &self.rx {
            match rx.try_recv() {
                Ok(result) => self.finish(result),
                Err(TryRecvError::Empty) => {}
                Err(TryRecvError::Disconnected) => {
                    self.finish(Err(Error::LoaderDisconnected(self.url.clone())))
                }
            }
        }
        &self.state
    }

    /// Block until the load finishes.
    pub fn wait(mut self) -> Result<Arc<Asset>> {
        if let Some(rx) = self.rx.take() {
            let result = rx
                .recv()
                .unwrap_or_else(|_| Err(Error::LoaderDisconnected(self.url.clone())));
            self.join();
            return result;
        }
        match std::mem::replace(&mut self.state, LoadState::Loading) {
            LoadState::Ready(asset) => Ok(asset),
            LoadState::Failed(e) => Err(e),
            LoadState::Loading => Err(Error::LoaderDisconnected(self.url.clone())),
        }
    }

    fn finish(&mut self, result: Result<Arc<Asset>>) {
        self.rx = None;
        self.join();
        self.state = match result {
            Ok(asset) => LoadState::Ready(asset),
            Err(e) => LoadState::Failed(e),
        };
    }

    fn join(&mut self) {
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}
