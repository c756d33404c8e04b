// ── Replaceable device collection ──
//
// Concurrent storage for the registry cache with push-based change
// notification via `watch` channels. Unlike an upsert store, refresh
// replaces the whole collection: the server's list IS the truth, and
// the snapshot preserves the server's ordering.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::watch;

use simfleet_api::models::Device;

/// Storage for the device registry cache.
///
/// `DashMap` gives O(1) uuid lookups; the snapshot `watch` channel
/// carries the ordered server list. Every replace bumps a version
/// counter and rebroadcasts the snapshot.
pub(crate) struct DeviceCollection {
    /// Lookup index: uuid -> device.
    by_uuid: DashMap<String, Arc<Device>>,

    /// Ordered snapshot, replaced wholesale on refresh.
    snapshot: watch::Sender<Arc<Vec<Arc<Device>>>>,

    /// Version counter, bumped on every replace.
    version: watch::Sender<u64>,
}

impl DeviceCollection {
    pub(crate) fn new() -> Self {
        let (snapshot, _) = watch::channel(Arc::new(Vec::new()));
        let (version, _) = watch::channel(0u64);

        Self {
            by_uuid: DashMap::new(),
            snapshot,
            version,
        }
    }

    /// Replace the entire collection with a fresh server list.
    ///
    /// No merge or patch semantics: devices absent from `devices` are
    /// gone after this call, and the snapshot order is the server's.
    pub(crate) fn replace(&self, devices: Vec<Device>) {
        let devices: Vec<Arc<Device>> = devices.into_iter().map(Arc::new).collect();

        self.by_uuid.clear();
        for device in &devices {
            self.by_uuid.insert(device.uuid.clone(), Arc::clone(device));
        }

        // `send_modify` updates unconditionally, even with zero receivers.
        self.snapshot.send_modify(|snap| *snap = Arc::new(devices));
        self.version.send_modify(|v| *v += 1);
    }

    /// Look up a device by uuid.
    pub(crate) fn get(&self, uuid: &str) -> Option<Arc<Device>> {
        self.by_uuid.get(uuid).map(|r| Arc::clone(r.value()))
    }

    /// Get the current snapshot (cheap `Arc` clone).
    pub(crate) fn snapshot(&self) -> Arc<Vec<Arc<Device>>> {
        self.snapshot.borrow().clone()
    }

    /// Subscribe to snapshot changes via a `watch::Receiver`.
    pub(crate) fn subscribe(&self) -> watch::Receiver<Arc<Vec<Arc<Device>>>> {
        self.snapshot.subscribe()
    }

    pub(crate) fn len(&self) -> usize {
        self.by_uuid.len()
    }

    #[allow(dead_code)]
    pub(crate) fn is_empty(&self) -> bool {
        self.by_uuid.is_empty()
    }
}
