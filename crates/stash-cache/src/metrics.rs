//! Cache metrics recording.

use metrics::{counter, gauge, histogram};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Registra las metricas de cache.
/// Llamar una vez al inicio, despues de instalar el recorder.
pub fn register_cache_metrics() {
    metrics::describe_counter!("stash_cache_hits_total", "Total number of fresh cache reads");
    metrics::describe_counter!("stash_cache_misses_total", "Total number of reads that needed a fetch");
    metrics::describe_counter!("stash_cache_fetches_total", "Total number of completed fetches");
    metrics::describe_counter!(
        "stash_cache_invalidations_total",
        "Total number of entries marked stale by invalidation"
    );
    metrics::describe_counter!(
        "stash_cache_evictions_total",
        "Total number of entries removed from the cache"
    );
    metrics::describe_gauge!("stash_cache_entries", "Current number of entries in cache");
    metrics::describe_histogram!("stash_cache_fetch_seconds", "Time spent fetching a query");
}

/// Recorder de metricas de cache.
/// Usa atomic counters internos para calcular el hit rate sin leer el recorder.
#[derive(Debug, Clone)]
pub struct CacheMetrics {
    hits: Arc<AtomicU64>,
    misses: Arc<AtomicU64>,
    fetches: Arc<AtomicU64>,
}

impl CacheMetrics {
    pub fn new() -> Self {
        Self {
            hits: Arc::new(AtomicU64::new(0)),
            misses: Arc::new(AtomicU64::new(0)),
            fetches: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Registra un cache hit
    pub fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
        counter!("stash_cache_hits_total").increment(1);
    }

    /// Registra un cache miss
    pub fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
        counter!("stash_cache_misses_total").increment(1);
    }

    /// Registra un fetch terminado y su duracion
    pub fn record_fetch(&self, outcome: &'static str, duration: Duration) {
        self.fetches.fetch_add(1, Ordering::Relaxed);
        counter!("stash_cache_fetches_total", "outcome" => outcome).increment(1);
        histogram!("stash_cache_fetch_seconds", "outcome" => outcome).record(duration.as_secs_f64());
    }

    /// Registra entries invalidadas
    pub fn record_invalidations(&self, count: usize) {
        counter!("stash_cache_invalidations_total").increment(count as u64);
    }

    /// Registra una eviction
    pub fn record_eviction(&self, reason: &'static str, count: usize) {
        counter!("stash_cache_evictions_total", "reason" => reason).increment(count as u64);
    }

    /// Actualiza el gauge de entries
    pub fn update_entry_count(&self, count: usize) {
        gauge!("stash_cache_entries").set(count as f64);
    }

    /// Calcula hit rate (para logging/debugging)
    pub fn hit_rate(&self) -> f64 {
        let hits = self.hits.load(Ordering::Relaxed) as f64;
        let misses = self.misses.load(Ordering::Relaxed) as f64;
        let total = hits + misses;
        if total == 0.0 { 0.0 } else { hits / total }
    }

    /// Retorna el numero de hits
    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    /// Retorna el numero de misses
    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }

    /// Retorna el numero de fetches completados
    pub fn fetches(&self) -> u64 {
        self.fetches.load(Ordering::Relaxed)
    }
}

impl Default for CacheMetrics {
    fn default() -> Self {
        Self::new()
    }
}
