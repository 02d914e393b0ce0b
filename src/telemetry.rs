//! Logging setup for test binaries
//!
//! Verbose conditions and the poller log through `tracing`; nothing shows up
//! until a subscriber is installed.
//!
//! # Example
//!
//! ```no_run
//! use kube_conditions::telemetry::init_logging;
//!
//! init_logging();
//! // RUST_LOG=kube_conditions=debug shows every poll attempt
//! ```

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Install a stderr subscriber filtered by `RUST_LOG` (default: info)
///
/// Safe to call from every test; only the first call takes effect.
pub fn init_logging() {
    init_logging_with("info");
}

/// Like [`init_logging`], with a fallback filter used when `RUST_LOG` is unset
pub fn init_logging_with(default_filter: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_test_writer())
        .try_init();
}
