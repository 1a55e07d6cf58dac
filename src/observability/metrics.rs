//! # Metrics
//!
//! Prometheus metrics for monitoring the controller.
//!
//! ## Metrics Exposed
//!
//! - `cert_mirror_syncs_total{kind,outcome}` - Completed sync passes
//! - `cert_mirror_sync_errors_total{kind}` - Failed sync passes
//! - `cert_mirror_sync_duration_seconds{kind}` - Duration of sync passes
//! - `cert_mirror_ownership_transitions_total{transition}` - Secret claims and releases
//! - `cert_mirror_requeues_total{reason}` - Requeues scheduled by the runtime

use anyhow::Result;
use prometheus::{HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry};
use std::sync::LazyLock;

pub(crate) static REGISTRY: LazyLock<Registry> = LazyLock::new(Registry::new);

static SYNCS_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        Opts::new("cert_mirror_syncs_total", "Total number of completed sync passes"),
        &["kind", "outcome"],
    )
    .expect("Failed to create SYNCS_TOTAL metric - this should never happen")
});

static SYNC_ERRORS_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        Opts::new("cert_mirror_sync_errors_total", "Total number of failed sync passes"),
        &["kind"],
    )
    .expect("Failed to create SYNC_ERRORS_TOTAL metric - this should never happen")
});

static SYNC_DURATION: LazyLock<HistogramVec> = LazyLock::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "cert_mirror_sync_duration_seconds",
            "Duration of sync passes in seconds",
        )
        .buckets(vec![0.01, 0.05, 0.1, 0.5, 1.0, 2.0, 5.0]),
        &["kind"],
    )
    .expect("Failed to create SYNC_DURATION metric - this should never happen")
});

static OWNERSHIP_TRANSITIONS_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        Opts::new(
            "cert_mirror_ownership_transitions_total",
            "Total number of secret ownership claims and releases",
        ),
        &["transition"],
    )
    .expect("Failed to create OWNERSHIP_TRANSITIONS_TOTAL metric - this should never happen")
});

static REQUEUES_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        Opts::new("cert_mirror_requeues_total", "Total number of scheduled requeues"),
        &["reason"],
    )
    .expect("Failed to create REQUEUES_TOTAL metric - this should never happen")
});

/// Register all metrics with the registry. Call once at startup.
pub fn register_metrics() -> Result<()> {
    REGISTRY.register(Box::new(SYNCS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(SYNC_ERRORS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(SYNC_DURATION.clone()))?;
    REGISTRY.register(Box::new(OWNERSHIP_TRANSITIONS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(REQUEUES_TOTAL.clone()))?;
    Ok(())
}

pub fn increment_syncs(kind: &str, outcome: &str) {
    SYNCS_TOTAL.with_label_values(&[kind, outcome]).inc();
}

pub fn increment_sync_errors(kind: &str) {
    SYNC_ERRORS_TOTAL.with_label_values(&[kind]).inc();
}

pub fn observe_sync_duration(kind: &str, duration: f64) {
    SYNC_DURATION.with_label_values(&[kind]).observe(duration);
}

pub fn increment_ownership_transitions(transition: &str) {
    OWNERSHIP_TRANSITIONS_TOTAL
        .with_label_values(&[transition])
        .inc();
}

pub fn increment_requeues(reason: &str) {
    REQUEUES_TOTAL.with_label_values(&[reason]).inc();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_are_labelled() {
        let before = SYNCS_TOTAL
            .with_label_values(&["Secret", "claimed"])
            .get();
        increment_syncs("Secret", "claimed");
        assert_eq!(
            SYNCS_TOTAL.with_label_values(&["Secret", "claimed"]).get(),
            before + 1
        );
    }
}
