//! Telemetry helpers for structured logging.

/// Install a default env-filtered fmt subscriber (`RUST_LOG`), unless the
/// application already installed its own.
pub fn init_tracing() {
    if tracing::dispatcher::has_been_set() {
        return;
    }
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

/// Like [`init_tracing`], but falls back to `default_directive` when
/// `RUST_LOG` is unset or invalid.
pub fn init_tracing_with_default(default_directive: &str) {
    if tracing::dispatcher::has_been_set() {
        return;
    }
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_directive));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
