//! Shared mutable item and its background refresher
//!
//! Models a slowly-changing server-side resource: a single value plus the
//! HTTP-date of its last mutation. The last-modified policy reads it on
//! every request; a background task replaces it every [`REFRESH_PERIOD`].

use std::sync::Arc;

use parking_lot::RwLock;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::Duration;
use tracing::debug;

use crate::clock::{http_date, random_value};

/// How often the shared item is refreshed. Intentionally longer than the
/// 5-second freshness window the policies advertise, so clients may
/// revalidate more often than the data actually changes.
pub const REFRESH_PERIOD: Duration = Duration::from_secs(10);

/// The single server-side mutable resource behind the last-modified policy.
///
/// `last_modified` changes only on [`tick`](Self::tick), never on read, and
/// is always an HTTP-date string truncated to whole seconds.
pub struct SharedItem {
    inner: RwLock<ItemState>,
}

struct ItemState {
    value: i64,
    last_modified: String,
}

impl SharedItem {
    /// Create the item with an initial random value and the current time.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(ItemState {
                value: random_value(),
                last_modified: http_date(0),
            }),
        }
    }

    /// Perform one refresh: new random value, last-modified set to now.
    ///
    /// The background refresher calls this on a timer; tests call it
    /// directly instead of sleeping through real refresh periods.
    pub fn tick(&self) {
        let mut state = self.inner.write();
        state.value = random_value();
        state.last_modified = http_date(0);
    }

    /// Current value.
    pub fn value(&self) -> i64 {
        self.inner.read().value
    }

    /// Current last-modified HTTP-date string.
    pub fn last_modified(&self) -> String {
        self.inner.read().last_modified.clone()
    }

    /// Read value and last-modified under a single lock, so a response
    /// never pairs a value from one tick with a timestamp from another.
    pub fn snapshot(&self) -> (i64, String) {
        let state = self.inner.read();
        (state.value, state.last_modified.clone())
    }
}

impl Default for SharedItem {
    fn default() -> Self {
        Self::new()
    }
}

/// Spawn the background refresher task.
///
/// Ticks every [`REFRESH_PERIOD`] until a shutdown broadcast is received.
/// Best-effort wall-clock cadence; no drift correction.
pub fn spawn_refresher(
    item: Arc<SharedItem>,
    mut shutdown_rx: broadcast::Receiver<()>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(REFRESH_PERIOD);
        // The first interval tick completes immediately; consume it so the
        // item keeps its boot-time state for a full period.
        interval.tick().await;

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    item.tick();
                    debug!(value = item.value(), "Refreshed shared item");
                }
                _ = shutdown_rx.recv() => {
                    debug!("Refresher stopping");
                    break;
                }
            }
        }
    })
}
