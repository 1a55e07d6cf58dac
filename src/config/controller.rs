//! # Controller Configuration
//!
//! Controller-level settings loaded from environment variables.

use crate::constants::{
    BACKOFF_CEILING_SECS, DEFAULT_BACKOFF_MAX_SECS, DEFAULT_BACKOFF_MIN_SECS,
    DEFAULT_CONTROLLER_LABEL, DEFAULT_CONTROLLER_NAME, DEFAULT_METRICS_PORT, DEFAULT_NAME_SUFFIX,
    DEFAULT_RESYNC_INTERVAL_SECS, DEFAULT_SCHEMA_ESTABLISH_TIMEOUT_SECS,
    DEFAULT_TARGET_NAMESPACE, DEFAULT_WATCH_TIMEOUT_SECS,
};
use std::time::Duration;

/// Controller-level configuration
///
/// All settings have sensible defaults and can be overridden via environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerConfig {
    /// Kubeconfig for the virtual cluster (inferred config when unset)
    pub virtual_kubeconfig: Option<String>,
    /// Kubeconfig for the physical (host) cluster (inferred config when unset)
    pub physical_kubeconfig: Option<String>,
    /// Physical namespace all mirrored objects are written into
    pub target_namespace: String,
    /// Suffix appended to every physical name, usually the virtual cluster's name
    pub name_suffix: String,
    /// Value written to the ownership label when claiming a secret
    pub controller_name: String,
    /// Ownership label key on virtual secrets
    pub controller_label: String,
    /// Periodic resync interval (seconds)
    pub resync_interval_secs: u64,
    /// Backoff after the first failure of a resource (seconds)
    pub backoff_min_secs: u64,
    /// Upper bound for per-resource backoff (seconds)
    pub backoff_max_secs: u64,
    /// Server-side watch timeout (seconds)
    pub watch_timeout_secs: u32,
    /// Copy missing cert-manager CRDs between clusters on startup
    pub ensure_schemas: bool,
    /// How long to wait for a copied CRD to become Established (seconds)
    pub schema_establish_timeout_secs: u64,
    /// Port for /metrics, /healthz and /readyz
    pub metrics_port: u16,
    /// Global log level (ERROR, WARN, INFO, DEBUG, TRACE)
    pub log_level: String,
    /// Log format (json, text)
    pub log_format: String,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            virtual_kubeconfig: None,
            physical_kubeconfig: None,
            target_namespace: DEFAULT_TARGET_NAMESPACE.to_string(),
            name_suffix: DEFAULT_NAME_SUFFIX.to_string(),
            controller_name: DEFAULT_CONTROLLER_NAME.to_string(),
            controller_label: DEFAULT_CONTROLLER_LABEL.to_string(),
            resync_interval_secs: DEFAULT_RESYNC_INTERVAL_SECS,
            backoff_min_secs: DEFAULT_BACKOFF_MIN_SECS,
            backoff_max_secs: DEFAULT_BACKOFF_MAX_SECS,
            watch_timeout_secs: DEFAULT_WATCH_TIMEOUT_SECS,
            ensure_schemas: true,
            schema_establish_timeout_secs: DEFAULT_SCHEMA_ESTABLISH_TIMEOUT_SECS,
            metrics_port: DEFAULT_METRICS_PORT,
            log_level: "info".to_string(),
            log_format: "json".to_string(),
        }
    }
}

impl ControllerConfig {
    /// Load configuration from environment variables with defaults
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup
    ///
    /// `from_env` delegates here; tests pass a map instead of mutating the
    /// process environment.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let target_namespace = lookup("TARGET_NAMESPACE")
            .or_else(|| lookup("POD_NAMESPACE"))
            .filter(|ns| !ns.is_empty())
            .unwrap_or(defaults.target_namespace);
        let backoff_max_secs = parsed_or(&lookup, "BACKOFF_MAX_SECS", defaults.backoff_max_secs)
            .clamp(1, BACKOFF_CEILING_SECS);
        let backoff_min_secs = parsed_or(&lookup, "BACKOFF_MIN_SECS", defaults.backoff_min_secs)
            .clamp(1, backoff_max_secs);

        Self {
            virtual_kubeconfig: lookup("VIRTUAL_KUBECONFIG").filter(|p| !p.is_empty()),
            physical_kubeconfig: lookup("PHYSICAL_KUBECONFIG").filter(|p| !p.is_empty()),
            target_namespace,
            name_suffix: string_or(&lookup, "NAME_SUFFIX", defaults.name_suffix),
            controller_name: string_or(&lookup, "CONTROLLER_NAME", defaults.controller_name),
            controller_label: string_or(&lookup, "CONTROLLER_LABEL", defaults.controller_label),
            resync_interval_secs: parsed_or(
                &lookup,
                "RESYNC_INTERVAL_SECS",
                defaults.resync_interval_secs,
            ),
            backoff_min_secs,
            backoff_max_secs,
            watch_timeout_secs: parsed_or(
                &lookup,
                "WATCH_TIMEOUT_SECS",
                defaults.watch_timeout_secs,
            ),
            ensure_schemas: bool_or(&lookup, "ENSURE_SCHEMAS", defaults.ensure_schemas),
            schema_establish_timeout_secs: parsed_or(
                &lookup,
                "SCHEMA_ESTABLISH_TIMEOUT_SECS",
                defaults.schema_establish_timeout_secs,
            ),
            metrics_port: parsed_or(&lookup, "METRICS_PORT", defaults.metrics_port),
            log_level: string_or(&lookup, "LOG_LEVEL", defaults.log_level),
            log_format: string_or(&lookup, "LOG_FORMAT", defaults.log_format),
        }
    }

    /// Get periodic resync duration
    #[must_use]
    pub fn resync_interval(&self) -> Duration {
        Duration::from_secs(self.resync_interval_secs)
    }

    /// Get schema establish timeout duration
    #[must_use]
    pub fn schema_establish_timeout(&self) -> Duration {
        Duration::from_secs(self.schema_establish_timeout_secs)
    }
}

fn parsed_or<F, T>(lookup: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    lookup(key)
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

fn bool_or<F>(lookup: &F, key: &str, default: bool) -> bool
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|v| {
            let v_lower = v.to_lowercase();
            v_lower == "true" || v_lower == "1" || v_lower == "yes" || v_lower == "on"
        })
        .unwrap_or(default)
}

fn string_or<F>(lookup: &F, key: &str, default: String) -> String
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key).filter(|v| !v.is_empty()).unwrap_or(default)
}
