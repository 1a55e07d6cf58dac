//! # Error Policy
//!
//! Failed passes are retried with a per-resource Fibonacci backoff. The
//! sync core never retries on its own; this is the only retry mechanism.

use super::context::{Context, ReconcilerError};
use crate::controller::syncer::Mirrored;
use crate::observability::metrics;
use k8s_openapi::api::core::v1::Secret;
use kube::ResourceExt;
use kube_runtime::controller::Action;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

/// Backoff key of a resource in a given cluster
#[must_use]
pub fn resource_key(cluster: &str, kind: &str, namespace: &str, name: &str) -> String {
    format!("{cluster}/{kind}/{namespace}/{name}")
}

/// Wall-clock time of the next retry, `None` when it is not representable
fn next_retry_time(seconds: u64) -> Option<chrono::DateTime<chrono::Utc>> {
    let delay = chrono::Duration::try_seconds(i64::try_from(seconds).ok()?)?;
    chrono::Utc::now().checked_add_signed(delay)
}

fn backoff_action(ctx: &Context, key: &str, error: &ReconcilerError) -> Action {
    let (seconds, attempts) = ctx.next_backoff(key);
    let next_retry = next_retry_time(seconds)
        .map_or_else(|| "unbounded".to_string(), |time| time.to_rfc3339());

    error!(resource = %key, error = %error, "reconciliation failed");
    info!(
        resource = %key,
        backoff_seconds = seconds,
        attempts,
        next_retry = %next_retry,
        "retrying with Fibonacci backoff"
    );
    metrics::increment_requeues("error-backoff");
    Action::requeue(Duration::from_secs(seconds))
}

/// Error policy for controllers over virtual objects
pub fn handle_reconciliation_error<K: Mirrored>(
    obj: Arc<K>,
    error: &ReconcilerError,
    ctx: Arc<Context>,
) -> Action {
    let key = resource_key(
        "virtual",
        K::KIND.as_str(),
        &obj.namespace().unwrap_or_default(),
        &obj.name_any(),
    );
    backoff_action(&ctx, &key, error)
}

/// Error policy for the physical secret controller
pub fn handle_physical_error(
    obj: Arc<Secret>,
    error: &ReconcilerError,
    ctx: Arc<Context>,
) -> Action {
    let key = resource_key(
        "physical",
        "Secret",
        &obj.namespace().unwrap_or_default(),
        &obj.name_any(),
    );
    backoff_action(&ctx, &key, error)
}
