//! # Prelude
//!
//! Re-exports commonly used types and traits for convenience.
//!
//! ```rust
//! use cert_mirror_controller::prelude::*;
//! ```

// CRD types
pub use crate::crd::*;

// Stores and their error type
pub use crate::store::{KubeStore, MemoryStore, ObjectLister, ObjectStore, StoreError};

// Name and metadata translation
pub use crate::translate::{IdentifierTranslator, NamespacedTranslator, SuffixTranslator};

// Reverse index and usage detection
pub use crate::index::{DependentKind, IndexError, ReverseIndex, UsageDetector};

// Sync core
pub use crate::controller::ownership::{Decision, Ownership, OwnershipArbiter};
pub use crate::controller::syncer::{
    CertificateSyncer, IssuerSyncer, MirrorKind, MirrorObject, Mirrored, SecretSyncer, SyncEngine,
    SyncError, SyncOutcome, Syncer,
};

// Config types
pub use crate::config::ControllerConfig;

// Runtime
pub use crate::runtime::{Context, ReconcilerError};
