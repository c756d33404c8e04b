// ── Device registry cache ──
//
// The client's last-known snapshot of all devices, refreshed by polling
// and replaced wholesale on every refresh. Also holds the aggregate
// counters derived from the snapshot and the last server-side broker
// stats, all observable through `watch` channels.

mod collection;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::watch;

use simfleet_api::models::{BrokerStats, Device, DeviceStatus};

use crate::stream::DeviceStream;
use collection::DeviceCollection;

/// Aggregate counters derived from the registry snapshot.
///
/// Recomputed on every cache replace -- never fetched. The server's own
/// counters arrive separately as [`BrokerStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FleetStats {
    pub total: usize,
    pub running: usize,
}

impl FleetStats {
    fn of(devices: &[Device]) -> Self {
        Self {
            total: devices.len(),
            running: devices
                .iter()
                .filter(|d| d.status == DeviceStatus::Running)
                .count(),
        }
    }
}

/// The client's local mirror of server-held device state.
pub struct DeviceRegistry {
    devices: DeviceCollection,
    fleet_stats: watch::Sender<FleetStats>,
    broker_stats: watch::Sender<Option<BrokerStats>>,
    last_refresh: watch::Sender<Option<DateTime<Utc>>>,
}

impl DeviceRegistry {
    pub fn new() -> Self {
        let (fleet_stats, _) = watch::channel(FleetStats::default());
        let (broker_stats, _) = watch::channel(None);
        let (last_refresh, _) = watch::channel(None);

        Self {
            devices: DeviceCollection::new(),
            fleet_stats,
            broker_stats,
            last_refresh,
        }
    }

    // ── Refresh application ──────────────────────────────────────────

    /// Apply a full device snapshot from the backend.
    ///
    /// Replaces the cache wholesale (no merge) and recomputes
    /// [`FleetStats`]. A concurrent edit session is unaffected: its
    /// draft is never derived from the cache after session start.
    pub fn apply_snapshot(&self, devices: Vec<Device>) {
        let stats = FleetStats::of(&devices);
        self.devices.replace(devices);
        self.fleet_stats.send_modify(|s| *s = stats);
        self.last_refresh.send_modify(|s| *s = Some(Utc::now()));
    }

    /// Record the latest server-side counters from `GET /api/stats`.
    pub fn apply_broker_stats(&self, stats: BrokerStats) {
        self.broker_stats.send_modify(|s| *s = Some(stats));
    }

    // ── Accessors ────────────────────────────────────────────────────

    /// Look up a cached device by uuid.
    pub fn get(&self, uuid: &str) -> Option<Arc<Device>> {
        self.devices.get(uuid)
    }

    /// The current snapshot in server order (cheap `Arc` clone).
    pub fn devices_snapshot(&self) -> Arc<Vec<Arc<Device>>> {
        self.devices.snapshot()
    }

    pub fn device_count(&self) -> usize {
        self.devices.len()
    }

    pub fn fleet_stats(&self) -> FleetStats {
        *self.fleet_stats.borrow()
    }

    pub fn broker_stats(&self) -> Option<BrokerStats> {
        *self.broker_stats.borrow()
    }

    // ── Subscriptions ────────────────────────────────────────────────

    pub fn subscribe_devices(&self) -> DeviceStream {
        DeviceStream::new(self.devices.subscribe())
    }

    pub fn subscribe_fleet_stats(&self) -> watch::Receiver<FleetStats> {
        self.fleet_stats.subscribe()
    }

    pub fn subscribe_broker_stats(&self) -> watch::Receiver<Option<BrokerStats>> {
        self.broker_stats.subscribe()
    }

    // ── Metadata ─────────────────────────────────────────────────────

    pub fn last_refresh(&self) -> Option<DateTime<Utc>> {
        *self.last_refresh.borrow()
    }

    /// How long ago the last refresh landed, or `None` if never refreshed.
    pub fn data_age(&self) -> Option<chrono::Duration> {
        self.last_refresh().map(|t| Utc::now() - t)
    }
}

impl Default for DeviceRegistry {
    fn default() -> Self {
        Self::new()
    }
}
