//! Cache configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Configuracion del cache.
///
/// Por defecto: datos frescos
/// durante 5 minutos, 3 reintentos por query y 1 por mutacion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Tiempo durante el cual un valor se considera fresco (default: 5 minutos)
    #[serde(with = "humantime_serde")]
    pub stale_time: Duration,
    /// Tiempo que una entry sin observers permanece en memoria (default: 5 minutos)
    #[serde(with = "humantime_serde")]
    pub gc_time: Duration,
    /// Reintentos de un fetch fallido (default: 3)
    pub retry: u32,
    /// Delay base entre reintentos, se duplica en cada intento (default: 1s)
    #[serde(with = "humantime_serde")]
    pub retry_delay: Duration,
    /// Delay maximo entre reintentos (default: 30s)
    #[serde(with = "humantime_serde")]
    pub max_retry_delay: Duration,
    /// Reintentos de una mutacion fallida (default: 1)
    pub mutation_retry: u32,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            stale_time: Duration::from_secs(5 * 60),
            gc_time: Duration::from_secs(5 * 60),
            retry: 3,
            retry_delay: Duration::from_secs(1),
            max_retry_delay: Duration::from_secs(30),
            mutation_retry: 1,
        }
    }
}

impl CacheConfig {
    /// Delay antes del reintento numero `attempt` (0-based).
    pub fn retry_delay_for(&self, attempt: u32) -> Duration {
        self.retry_delay
            .saturating_mul(2u32.saturating_pow(attempt))
            .min(self.max_retry_delay)
    }
}

/// Per-query overrides of the cache-wide defaults.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueryOptions {
    pub stale_time: Option<Duration>,
    pub gc_time: Option<Duration>,
    pub retry: Option<u32>,
}

impl QueryOptions {
    pub(crate) fn resolve(&self, config: &CacheConfig) -> ResolvedOptions {
        ResolvedOptions {
            stale_time: self.stale_time.unwrap_or(config.stale_time),
            gc_time: self.gc_time.unwrap_or(config.gc_time),
            retry: self.retry.unwrap_or(config.retry),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ResolvedOptions {
    pub stale_time: Duration,
    pub gc_time: Duration,
    pub retry: u32,
}
