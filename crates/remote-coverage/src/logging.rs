//! Subscriber setup for binaries and test runners embedding the listener.
//!
//! The library itself only emits `tracing` events. Callers that want them on
//! stderr install a subscriber once, typically from `main`.

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Environment variable overriding the filter
pub const LOG_ENV: &str = "REMOTE_COVERAGE_LOG";

/// Build the filter: `REMOTE_COVERAGE_LOG` if set and valid, else `default_filter`
#[must_use]
pub fn filter(default_filter: &str) -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_new(default_filter))
        .unwrap_or_else(|_| EnvFilter::new("warn"))
}

/// Install a global stderr subscriber.
///
/// Returns `false` when a subscriber was already installed.
pub fn init(default_filter: &str, json: bool) -> bool {
    let registry = tracing_subscriber::registry().with(filter(default_filter));
    let result = if json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .try_init()
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(false)
                    .with_writer(std::io::stderr),
            )
            .try_init()
    };
    result.is_ok()
}
