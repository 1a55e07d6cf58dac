//! Cert Mirror Controller Library
//!
//! Mirrors cert-manager `Certificate` and `Issuer` resources, and the
//! `Secret`s they reference, from a virtual cluster into a namespace of its
//! host cluster. Shared secrets are arbitrated through an ownership label so
//! that only one controller mirrors a given secret at a time.
//!
//! ## Quick Start
//!
//! ```rust
//! use cert_mirror_controller::prelude::*;
//! ```
//!
//! This brings commonly used types and traits into scope. For more specific imports,
//! use the individual modules.

pub mod config;
pub mod constants;
pub mod controller;
pub mod crd;
pub mod index;
pub mod observability;
pub mod prelude;
pub mod runtime;
pub mod store;
pub mod translate;
