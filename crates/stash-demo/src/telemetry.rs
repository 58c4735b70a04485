//! Logging and metrics setup.

use anyhow::Context;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Instala el subscriber de tracing (`RUST_LOG`, default `info`).
pub fn init_tracing() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Inicializa el recorder de Prometheus y registra las metricas del cache.
pub fn init_metrics() -> anyhow::Result<PrometheusHandle> {
    // Buckets en segundos: los fetches van de microsegundos (cache en memoria)
    // a varios segundos (APIs publicas con reintentos)
    let handle = PrometheusBuilder::new()
        .set_buckets(&[
            0.0001, // 100 microsegundos
            0.001,  // 1 milisegundo
            0.01,   // 10 milisegundos
            0.05,   // 50 milisegundos
            0.1,    // 100 milisegundos
            0.25,   // 250 milisegundos
            0.5,    // 500 milisegundos
            1.0,    // 1 segundo
            2.5,    // 2.5 segundos
            5.0,    // 5 segundos
            10.0,   // 10 segundos
        ])
        .context("failed to set histogram buckets")?
        .install_recorder()
        .context("failed to install metrics recorder")?;

    stash_cache::register_cache_metrics();
    info!("Metrics system initialized");
    Ok(handle)
}
