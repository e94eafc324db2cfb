//! Render driver owning every mounted viewer.
//!
//! The host is the only thing that calls [`ViewerInstance::tick`]. Each
//! frame it first promotes finished background loads to mounted instances,
//! then ticks the instances that asked for a frame. Unmounting drops the
//! instance together with its driver, so nothing keeps animating after
//! teardown.

use smallvec::SmallVec;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::asset::{Asset, AssetLoader, LoadTicket};
use crate::util::{Error, Result};

use super::instance::{ViewerApi, ViewerInstance, ViewerProps};

/// Ready callback held while an asset is still loading.
pub type ReadyCallback = Box<dyn for<'a> FnOnce(ViewerApi<'a>)>;

/// Stable handle to a mounted viewer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ViewerId(u64);

impl fmt::Display for ViewerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "viewer#{}", self.0)
    }
}

/// What a caller should show for a viewer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ViewerStatus {
    /// Placeholder while the asset loads.
    Loading,
    Ready,
    /// Error fallback; [`ViewerHost::retry`] starts over.
    Failed,
}

enum Slot {
    Loading {
        ticket: LoadTicket,
        props: ViewerProps,
        on_ready: ReadyCallback,
    },
    Mounted(Box<ViewerInstance>),
    Failed {
        props: ViewerProps,
        on_ready: ReadyCallback,
        error: Error,
    },
}

/// Owns viewers by id and drives their frames.
pub struct ViewerHost {
    loader: Arc<AssetLoader>,
    slots: BTreeMap<ViewerId, Slot>,
    next_id: u64,
}

impl ViewerHost {
    pub fn new(loader: Arc<AssetLoader>) -> Self {
        Self {
            loader,
            slots: BTreeMap::new(),
            next_id: 1,
        }
    }

    pub fn loader(&self) -> &Arc<AssetLoader> {
        &self.loader
    }

    /// Mount a viewer for `props.asset_url`. Cached assets mount before
    /// this returns; others load in the background and mount on a later
    /// [`frame`](Self::frame).
    pub fn mount<F>(&mut self, props: ViewerProps, on_ready: F) -> ViewerId
    where
        F: for<'a> FnOnce(ViewerApi<'a>) + 'static,
    {
        let id = self.allocate_id();
        let ticket = self.loader.spawn_load(&props.asset_url);
        debug!(%id, url = %props.asset_url, mode = %props.mode, "mounting viewer");
        let slot = Slot::Loading {
            ticket,
            props,
            on_ready: Box::new(on_ready),
        };
        let slot = self.advance(id, slot);
        self.slots.insert(id, slot);
        id
    }

    /// Mount directly from an already loaded asset.
    pub fn mount_asset<F>(&mut self, asset: &Asset, props: ViewerProps, on_ready: F) -> Result<ViewerId>
    where
        F: FnOnce(ViewerApi<'_>),
    {
        let instance = ViewerInstance::mount(asset, props, on_ready)?;
        let id = self.allocate_id();
        self.slots.insert(id, Slot::Mounted(Box::new(instance)));
        Ok(id)
    }

    /// Tear down a viewer. Returns whether it existed.
    pub fn unmount(&mut self, id: ViewerId) -> bool {
        let removed = self.slots.remove(&id).is_some();
        if removed {
            debug!(%id, "viewer unmounted");
        }
        removed
    }

    /// Start loading again for a failed viewer.
    pub fn retry(&mut self, id: ViewerId) -> bool {
        if !matches!(self.slots.get(&id), Some(Slot::Failed { .. })) {
            return false;
        }
        let Some(Slot::Failed { props, on_ready, .. }) = self.slots.remove(&id) else {
            return false;
        };
        info!(%id, url = %props.asset_url, "retrying asset load");
        let ticket = self.loader.spawn_load(&props.asset_url);
        let slot = self.advance(id, Slot::Loading { ticket, props, on_ready });
        self.slots.insert(id, slot);
        true
    }

    pub fn status(&self, id: ViewerId) -> Option<ViewerStatus> {
        self.slots.get(&id).map(|slot| match slot {
            Slot::Loading { .. } => ViewerStatus::Loading,
            Slot::Mounted(_) => ViewerStatus::Ready,
            Slot::Failed { .. } => ViewerStatus::Failed,
        })
    }

    /// Why a viewer failed, if it did.
    pub fn error(&self, id: ViewerId) -> Option<&Error> {
        match self.slots.get(&id)? {
            Slot::Failed { error, .. } => Some(error),
            _ => None,
        }
    }

    pub fn instance(&self, id: ViewerId) -> Option<&ViewerInstance> {
        match self.slots.get(&id)? {
            Slot::Mounted(instance) => Some(&**instance),
            _ => None,
        }
    }

    pub fn instance_mut(&mut self, id: ViewerId) -> Option<&mut ViewerInstance> {
        match self.slots.get_mut(&id)? {
            Slot::Mounted(instance) => Some(&mut **instance),
            _ => None,
        }
    }

    pub fn ids(&self) -> impl Iterator<Item = ViewerId> + '_ {
        self.slots.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Run one host frame. Returns the viewers that need drawing.
    pub fn frame(&mut self, dt: f32) -> SmallVec<[ViewerId; 8]> {
        let _span = tracing::info_span!("host_frame", viewers = self.slots.len()).entered();
        self.poll_loads();

        let mut drawn = SmallVec::new();
        for (id, slot) in self.slots.iter_mut() {
            if let Slot::Mounted(instance) = slot {
                if instance.needs_frame() && instance.tick(dt) {
                    drawn.push(*id);
                }
            }
        }
        drawn
    }

    fn poll_loads(&mut self) {
        let pending: SmallVec<[ViewerId; 8]> = self
            .slots
            .iter()
            .filter(|(_, slot)| matches!(slot, Slot::Loading { .. }))
            .map(|(id, _)| *id)
            .collect();
        for id in pending {
            if let Some(slot) = self.slots.remove(&id) {
                let slot = self.advance(id, slot);
                self.slots.insert(id, slot);
            }
        }
    }

    /// Move a loading slot forward if its ticket has an answer.
    fn advance(&self, id: ViewerId, slot: Slot) -> Slot {
        let Slot::Loading { mut ticket, props, on_ready } = slot else {
            return slot;
        };
        if ticket.poll().is_loading() {
            return Slot::Loading { ticket, props, on_ready };
        }
        let asset = match ticket.wait() {
            Ok(asset) => asset,
            Err(error) => {
                warn!(%id, url = %props.asset_url, %error, "asset load failed");
                return Slot::Failed { props, on_ready, error };
            }
        };
        match ViewerInstance::mount(&asset, props.clone(), on_ready) {
            Ok(instance) => Slot::Mounted(Box::new(instance)),
            Err(error) => {
                // The callback went into the failed mount; a retry mounts silently.
                warn!(%id, url = %props.asset_url, %error, "viewer failed to mount");
                Slot::Failed {
                    props,
                    on_ready: Box::new(|_| {}),
                    error,
                }
            }
        }
    }

    fn allocate_id(&mut self) -> ViewerId {
        let id = ViewerId(self.next_id);
        self.next_id += 1;
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::MemorySource;
    use crate::viewer::mode::DisplayMode;
    use std::cell::Cell;
    use std::rc::Rc;

    const SHOE: &str = include_str!("../../tests/fixtures/shoe.gltf");

    fn host() -> (ViewerHost, Arc<MemorySource>) {
        let source = Arc::new(MemorySource::new());
        source.insert("/shoe.glb", SHOE.as_bytes().to_vec());
        let loader = Arc::new(AssetLoader::with_source(source.clone()));
        (ViewerHost::new(loader), source)
    }

    fn settle(host: &mut ViewerHost, id: ViewerId) -> ViewerStatus {
        for _ in 0..500 {
            host.frame(0.0);
            match host.status(id) {
                Some(ViewerStatus::Loading) => std::thread::sleep(std::time::Duration::from_millis(2)),
                Some(status) => return status,
                None => break,
            }
        }
        panic!("viewer {} never settled", id);
    }

    #[test]
    fn test_mount_loads_then_fires_ready_once() {
        let (mut host, _) = host();
        let fired = Rc::new(Cell::new(0));
        let counter = Rc::clone(&fired);
        let id = host.mount(ViewerProps::new(DisplayMode::Product), move |_| counter.set(counter.get() + 1));
        assert_eq!(settle(&mut host, id), ViewerStatus::Ready);
        host.frame(0.016);
        host.frame(0.016);
        assert_eq!(fired.get(), 1);
    }

    #[test]
    fn test_cached_asset_mounts_synchronously() {
        let (mut host, _) = host();
        host.loader().preload("/shoe.glb").unwrap();
        let id = host.mount(ViewerProps::new(DisplayMode::Hero), |_| {});
        assert_eq!(host.status(id), Some(ViewerStatus::Ready));
        assert_eq!(host.loader().fetch_count(), 1);
    }

    #[test]
    fn test_missing_asset_fails_then_retries() {
        let (mut host, source) = host();
        let props = ViewerProps::new(DisplayMode::Product).with_asset_url("/later.glb");
        let id = host.mount(props, |_| {});
        assert_eq!(settle(&mut host, id), ViewerStatus::Failed);
        assert!(host.error(id).is_some_and(Error::is_load_error));

        source.insert("/later.glb", SHOE.as_bytes().to_vec());
        assert!(host.retry(id));
        assert_eq!(settle(&mut host, id), ViewerStatus::Ready);
    }

    #[test]
    fn test_frame_ticks_only_scheduled() {
        let (mut host, _) = host();
        host.loader().preload("/shoe.glb").unwrap();
        let hero = host.mount(ViewerProps::new(DisplayMode::Hero), |_| {});
        let thumb = host.mount(ViewerProps::new(DisplayMode::GalleryThumb), |_| {});

        let first = host.frame(0.016);
        assert!(first.contains(&hero) && first.contains(&thumb));

        let second = host.frame(0.016);
        assert_eq!(second.as_slice(), &[hero]);

        host.instance_mut(thumb).unwrap().invalidate();
        let third = host.frame(0.016);
        assert!(third.contains(&thumb));
    }

    #[test]
    fn test_unmount_stops_animation() {
        let (mut host, _) = host();
        host.loader().preload("/shoe.glb").unwrap();
        let hero = host.mount(ViewerProps::new(DisplayMode::Hero), |_| {});
        host.frame(0.016);
        assert!(host.unmount(hero));
        assert!(!host.unmount(hero));
        assert!(host.frame(0.016).is_empty());
        assert!(host.is_empty());
    }
}
