//! # Runtime
//!
//! Process wiring: clients, stores, controllers and retry policy.
//!
//! - `context`: shared reconciliation context and error type
//! - `initialization`: startup sequence
//! - `controllers`: kube-runtime controllers per mirrored kind
//! - `error_policy`: per-resource Fibonacci backoff on failure

pub mod context;
pub mod controllers;
pub mod error_policy;
pub mod initialization;

pub use context::{Context, ReconcilerError};
