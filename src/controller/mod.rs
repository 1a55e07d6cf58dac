//! # Controller
//!
//! Reconciliation building blocks.
//!
//! - `backoff`: Fibonacci backoff for failed passes
//! - `ownership`: ownership label arbitration for shared secrets
//! - `schema`: CustomResourceDefinition provisioning across both clusters
//! - `server`: HTTP server for metrics and health checks
//! - `syncer`: per-kind syncers and the sync engine

pub mod backoff;
pub mod ownership;
pub mod schema;
pub mod server;
pub mod syncer;
