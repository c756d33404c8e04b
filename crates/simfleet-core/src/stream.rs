// ── Reactive device stream ──
//
// Subscription type for consuming registry snapshots as they are
// replaced by polling.

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures_core::Stream;
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;

use simfleet_api::models::Device;

/// A subscription to the device registry cache.
///
/// Provides both point-in-time snapshot access and reactive change
/// notification via the `changed()` method or by converting to a `Stream`.
pub struct DeviceStream {
    current: Arc<Vec<Arc<Device>>>,
    receiver: watch::Receiver<Arc<Vec<Arc<Device>>>>,
}

impl DeviceStream {
    pub(crate) fn new(receiver: watch::Receiver<Arc<Vec<Arc<Device>>>>) -> Self {
        let current = receiver.borrow().clone();
        Self { current, receiver }
    }

    /// Get the snapshot captured at creation time.
    pub fn current(&self) -> &Arc<Vec<Arc<Device>>> {
        &self.current
    }

    /// Get the latest snapshot (may have changed since creation).
    pub fn latest(&self) -> Arc<Vec<Arc<Device>>> {
        self.receiver.borrow().clone()
    }

    /// Wait for the next replace, returning the new snapshot.
    /// Returns `None` if the registry has been dropped.
    pub async fn changed(&mut self) -> Option<Arc<Vec<Arc<Device>>>> {
        self.receiver.changed().await.ok()?;
        let snap = self.receiver.borrow_and_update().clone();
        self.current = snap.clone();
        Some(snap)
    }

    /// Convert into a `Stream` for use with `StreamExt` combinators.
    pub fn into_stream(self) -> DeviceWatchStream {
        DeviceWatchStream {
            inner: WatchStream::new(self.receiver),
        }
    }
}

/// `Stream` adapter backed by a `watch::Receiver`.
///
/// Yields a new snapshot each time the registry cache is replaced.
pub struct DeviceWatchStream {
    inner: WatchStream<Arc<Vec<Arc<Device>>>>,
}

impl Stream for DeviceWatchStream {
    type Item = Arc<Vec<Arc<Device>>>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        // WatchStream is Unpin when the inner type is Unpin, and
        // Arc<Vec<_>> always is.
        Pin::new(&mut self.inner).poll_next(cx)
    }
}
