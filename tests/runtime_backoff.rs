//! # Runtime Backoff Tests
//!
//! Per-resource retry state kept in the reconciliation context.

mod common;

use cert_mirror_controller::config::ControllerConfig;
use cert_mirror_controller::runtime::error_policy::resource_key;
use cert_mirror_controller::runtime::Context;
use common::*;
use std::sync::Arc;

fn context() -> Context {
    let harness = Harness::new();
    let config = ControllerConfig {
        backoff_min_secs: 5,
        backoff_max_secs: 30,
        ..ControllerConfig::default()
    };
    Context::new(harness.engine, Arc::clone(&harness.virtual_secrets) as _, config)
}

#[test]
fn test_backoff_is_tracked_per_resource() {
    let ctx = context();
    let a = resource_key("virtual", "Secret", "team1", "a");
    let b = resource_key("virtual", "Secret", "team1", "b");

    assert_eq!(ctx.next_backoff(&a), (5, 1));
    assert_eq!(ctx.next_backoff(&a), (5, 2));
    assert_eq!(ctx.next_backoff(&a), (10, 3));
    // A different resource starts from the minimum
    assert_eq!(ctx.next_backoff(&b), (5, 1));
}

#[test]
fn test_backoff_is_capped_and_reset() {
    let ctx = context();
    let key = resource_key("physical", "Secret", "host-ns", "db-x-team1-x-vc1");
    let delays: Vec<u64> = (0..8).map(|_| ctx.next_backoff(&key).0).collect();
    assert_eq!(delays, vec![5, 5, 10, 15, 25, 30, 30, 30]);

    assert!(ctx.reset_backoff(&key));
    assert!(!ctx.reset_backoff(&key));
    assert_eq!(ctx.next_backoff(&key), (5, 1));
}

#[test]
fn test_resource_key_layout() {
    assert_eq!(
        resource_key("virtual", "Certificate", "team1", "cert-a"),
        "virtual/Certificate/team1/cert-a"
    );
}
