//! # Constants
//!
//! Shared constants used throughout the controller.
//!
//! These values represent reasonable defaults and can be overridden via
//! configuration or environment variables where applicable.

/// Default HTTP server port for metrics and health probes
pub const DEFAULT_METRICS_PORT: u16 = 8080;

/// Default periodic resync interval for every mirrored object (seconds)
pub const DEFAULT_RESYNC_INTERVAL_SECS: u64 = 300;

/// Default minimum backoff after a failed pass (seconds)
pub const DEFAULT_BACKOFF_MIN_SECS: u64 = 5;

/// Default maximum backoff after repeated failures (seconds)
pub const DEFAULT_BACKOFF_MAX_SECS: u64 = 300;

/// Ceiling for a configured maximum backoff (one day)
pub const BACKOFF_CEILING_SECS: u64 = 86_400;

/// Watcher timeout (seconds) - must be less than client read_timeout (30s)
pub const DEFAULT_WATCH_TIMEOUT_SECS: u32 = 25;

/// How long to wait for a copied CRD to become Established (seconds)
pub const DEFAULT_SCHEMA_ESTABLISH_TIMEOUT_SECS: u64 = 60;

/// Poll interval while waiting for a CRD to become Established (milliseconds)
pub const SCHEMA_ESTABLISH_POLL_MS: u64 = 500;

/// Default physical namespace when neither TARGET_NAMESPACE nor POD_NAMESPACE is set
pub const DEFAULT_TARGET_NAMESPACE: &str = "vcluster";

/// Default suffix appended to physical names (the virtual cluster's name)
pub const DEFAULT_NAME_SUFFIX: &str = "vcluster";

/// Value written into the ownership label when this controller claims a secret
pub const DEFAULT_CONTROLLER_NAME: &str = "cert-manager-plugin";

/// Label recording which controller currently owns a shared virtual secret
pub const DEFAULT_CONTROLLER_LABEL: &str = "vcluster.loft.sh/controlled-by";

/// Label marking physical objects created by this virtual cluster
pub const MARKER_LABEL: &str = "vcluster.loft.sh/managed-by";

/// Annotation recording the virtual name of a physical object
pub const NAME_ANNOTATION: &str = "vcluster.loft.sh/object-name";

/// Annotation recording the virtual namespace of a physical object
pub const NAMESPACE_ANNOTATION: &str = "vcluster.loft.sh/object-namespace";

/// Annotations never copied from a virtual object to its physical mirror
pub const EXCLUDED_ANNOTATIONS: &[&str] = &["kubectl.kubernetes.io/last-applied-configuration"];

/// Field index over certificates keyed by referenced secret (`namespace/name`)
pub const INDEX_BY_CERTIFICATE_SECRET: &str = "indexbycertificatesecret";

/// Field index over issuers keyed by referenced secret (`namespace/name`)
pub const INDEX_BY_ISSUER_SECRET: &str = "indexbyissuersecret";

/// Issuer reference kind that is namespaced and therefore translated
pub const ISSUER_KIND: &str = "Issuer";

/// Issuer reference kind that is cluster-scoped and left untranslated
pub const CLUSTER_ISSUER_KIND: &str = "ClusterIssuer";

/// CRDs the controller needs in both clusters
pub const CERTIFICATE_CRD: &str = "certificates.cert-manager.io";
pub const ISSUER_CRD: &str = "issuers.cert-manager.io";

/// Field manager used for writes against either cluster
pub const FIELD_MANAGER: &str = "cert-mirror-controller";

/// Kubernetes names are limited to 63 characters when used as labels
pub const MAX_NAME_LENGTH: usize = 63;
