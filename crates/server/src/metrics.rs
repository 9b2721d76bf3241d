//! Prometheus metrics for the syncvault server.
//!
//! Metrics carry no app, root or device identifiers, only aggregate counts.
//!
//! # Security Note
//!
//! The `/metrics` endpoint is unauthenticated to allow Prometheus scraping.
//! It MUST be network-restricted to authorized scrapers at the infrastructure
//! level. Disable it with `server.metrics_enabled = false` otherwise.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use prometheus::{
    self, Encoder, Histogram, HistogramOpts, IntCounter, IntCounterVec, Opts, Registry,
    TextEncoder,
};
use std::sync::{LazyLock, Once};

/// Global Prometheus registry for all metrics.
pub static REGISTRY: LazyLock<Registry> = LazyLock::new(Registry::new);

pub static UPLOADS: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        Opts::new(
            "syncvault_uploads_total",
            "Total blob uploads by outcome (created, updated, failed)",
        ),
        &["outcome"],
    )
    .expect("metric creation failed")
});

pub static BYTES_UPLOADED: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "syncvault_bytes_uploaded_total",
        "Total payload bytes accepted by successful uploads",
    )
    .expect("metric creation failed")
});

pub static DELETES: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        Opts::new(
            "syncvault_deletes_total",
            "Total blob deletes by outcome (removed, absent, failed)",
        ),
        &["outcome"],
    )
    .expect("metric creation failed")
});

pub static INDEX_DIVERGENCES: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "syncvault_index_divergences_total",
        "Blob operations that succeeded while the following index save failed",
    )
    .expect("metric creation failed")
});

pub static INDEX_CORRUPT: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "syncvault_index_corrupt_total",
        "Operations rejected because a root's index document could not be parsed",
    )
    .expect("metric creation failed")
});

pub static UPLOAD_DURATION: LazyLock<Histogram> = LazyLock::new(|| {
    Histogram::with_opts(
        HistogramOpts::new(
            "syncvault_upload_duration_seconds",
            "Time from lock acquisition to index save for one upload",
        )
        .buckets(vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0]),
    )
    .expect("metric creation failed")
});

/// Guard to ensure metrics are only registered once.
static REGISTER_ONCE: Once = Once::new();

/// Register all metrics with the global registry.
///
/// Idempotent, so integration tests can build as many routers as they like.
pub fn register_metrics() {
    REGISTER_ONCE.call_once(|| {
        REGISTRY
            .register(Box::new(UPLOADS.clone()))
            .expect("metric registration failed");
        REGISTRY
            .register(Box::new(BYTES_UPLOADED.clone()))
            .expect("metric registration failed");
        REGISTRY
            .register(Box::new(DELETES.clone()))
            .expect("metric registration failed");
        REGISTRY
            .register(Box::new(INDEX_DIVERGENCES.clone()))
            .expect("metric registration failed");
        REGISTRY
            .register(Box::new(INDEX_CORRUPT.clone()))
            .expect("metric registration failed");
        REGISTRY
            .register(Box::new(UPLOAD_DURATION.clone()))
            .expect("metric registration failed");
    });
}

/// GET /metrics - Prometheus metrics endpoint.
pub async fn metrics_handler() -> impl IntoResponse {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();

    let mut buffer = Vec::new();
    match encoder.encode(&metric_families, &mut buffer) {
        Ok(()) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
            buffer,
        ),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            [("content-type", "text/plain; charset=utf-8")],
            format!("Failed to encode metrics: {e}").into_bytes(),
        ),
    }
}

pub fn record_upload(outcome: &str) {
    UPLOADS.with_label_values(&[outcome]).inc();
}

pub fn record_delete(outcome: &str) {
    DELETES.with_label_values(&[outcome]).inc();
}
