//! Garbage collection of idle entries.

use std::sync::Weak;
use std::time::{Duration, Instant};

use tokio::sync::watch;
use tokio::time::interval;
use tracing::{debug, info};

use crate::client::{ClientInner, QueryClient};

/// Handle for controlling a running collector.
pub struct GcHandle {
    /// Sender to signal shutdown.
    shutdown_tx: watch::Sender<bool>,
}

impl GcHandle {
    /// Signals the collector to stop.
    pub fn stop(&self) {
        let _ = self.shutdown_tx.send(true);
    }
}

impl Drop for GcHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

impl QueryClient {
    /// Evicts entries with no observers and no fetch in flight that have
    /// been idle for longer than their gc time. Returns how many were evicted.
    pub fn collect_garbage(&self) -> usize {
        let mut entries = self.inner.entries.lock();
        let now = Instant::now();
        let before = entries.len();

        entries.retain(|key, entry| {
            let collect = entry.is_collectable(now);
            if collect {
                debug!(key = %key, "Evicting idle entry");
            }
            !collect
        });
        let evicted = before - entries.len();

        if evicted > 0 {
            self.inner.metrics.record_eviction("gc", evicted);
            self.inner.metrics.update_entry_count(entries.len());
            info!(evicted, remaining = entries.len(), "Garbage collection complete");
        }
        evicted
    }

    /// Starts a background task that runs [`collect_garbage`](Self::collect_garbage)
    /// every `period`.
    ///
    /// The task holds only a weak reference to the client and stops when
    /// the handle is dropped or the last client clone goes away.
    pub fn start_gc(&self, period: Duration) -> GcHandle {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        tokio::spawn(run_gc(std::sync::Arc::downgrade(&self.inner), period, shutdown_rx));
        GcHandle { shutdown_tx }
    }
}

async fn run_gc(inner: Weak<ClientInner>, period: Duration, mut shutdown_rx: watch::Receiver<bool>) {
    let mut timer = interval(period);
    info!("Starting cache collector with interval {:?}", period);

    loop {
        tokio::select! {
            _ = timer.tick() => {
                let Some(inner) = inner.upgrade() else {
                    debug!("Cache dropped, collector exiting");
                    break;
                };
                QueryClient { inner }.collect_garbage();
            }
            result = shutdown_rx.changed() => {
                if result.is_err() || *shutdown_rx.borrow() {
                    info!("Cache collector shutting down");
                    break;
                }
            }
        }
    }
}
