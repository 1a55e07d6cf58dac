//! Tracing subscriber setup. `RUST_LOG` wins over the configured level.

use tracing_subscriber::EnvFilter;

/// Install the global subscriber. `format` is `json` or `text`.
pub fn init_logging(level: &str, format: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("cert_mirror_controller={level},kube=warn")));

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if format.eq_ignore_ascii_case("text") {
        builder.init();
    } else {
        builder.json().with_current_span(false).init();
    }
}
