//! Tracing initialization with a configurable and reloadable log level.

use std::sync::OnceLock;

use tracing_subscriber::{EnvFilter, fmt, prelude::*, reload};

static LOG_RELOAD_HANDLE: OnceLock<reload::Handle<EnvFilter, tracing_subscriber::Registry>> =
    OnceLock::new();

/// Installs the global subscriber at `info` level unless `RUST_LOG` is set.
pub fn init_tracing() {
    init_tracing_with_level("info");
}

/// Installs the global subscriber.
///
/// `RUST_LOG` takes precedence over `level`. Calling this more than once is
/// harmless: later calls leave the first subscriber in place.
pub fn init_tracing_with_level(level: &str) {
    let base_filter = std::env::var("RUST_LOG")
        .ok()
        .and_then(|_| EnvFilter::try_from_default_env().ok())
        .unwrap_or_else(|| EnvFilter::new(level));

    let (reload_layer, handle) = reload::Layer::new(base_filter);
    if LOG_RELOAD_HANDLE.set(handle).is_err() {
        return;
    }

    let _ = tracing_subscriber::registry()
        .with(reload_layer)
        .with(fmt::layer())
        .try_init();
}

/// Applies a new log level at runtime.
///
/// Returns `false` when tracing was not initialized through this module.
pub fn apply_logging_level(level: &str) -> bool {
    match LOG_RELOAD_HANDLE.get() {
        Some(handle) => handle
            .modify(|filter| {
                *filter = EnvFilter::new(level);
            })
            .is_ok(),
        None => false,
    }
}
