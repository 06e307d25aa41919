//! Logging for sluice queues.
//!
//! Built on `tracing` when the `tracing` feature is enabled. Without it every
//! log macro expands to nothing, so queue hot paths carry no logging cost.

/// Installs a global subscriber that prints queue events to stderr.
///
/// The filter comes from `RUST_LOG` and defaults to `sluice=debug`.
///
/// # Panics
///
/// Panics if a global subscriber is already installed. Use
/// [`try_init_tracing`] where that can happen, e.g. in tests.
#[cfg(feature = "tracing")]
pub fn init_tracing() {
    assert!(try_init_tracing(), "a tracing subscriber is already installed");
}

/// Installs the subscriber unless one is already present.
///
/// Returns `true` if this call installed it.
#[cfg(feature = "tracing")]
pub fn try_init_tracing() -> bool {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("sluice=debug"));

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_thread_names(true)
                .with_timer(fmt::time::uptime()),
        )
        .with(filter)
        .try_init()
        .is_ok()
}

#[cfg(not(feature = "tracing"))]
pub const fn init_tracing() {}

#[cfg(not(feature = "tracing"))]
#[must_use]
pub const fn try_init_tracing() -> bool {
    false
}

#[cfg(feature = "tracing")]
pub(crate) use tracing::{debug, trace};

// Swallows its arguments when the `tracing` feature is off.
#[cfg(not(feature = "tracing"))]
macro_rules! disabled {
    ($($arg:tt)*) => {};
}

#[cfg(not(feature = "tracing"))]
pub(crate) use disabled as debug;
#[cfg(not(feature = "tracing"))]
pub(crate) use disabled as trace;
