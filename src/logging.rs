//! Logging initialization.
//!
//! Human-readable logs go to stderr so stdout carries only command output.
//! `RUST_LOG` takes precedence over the `-v` count.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Default filter directive for a given `-v` count.
pub fn default_directive(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "warn",
        1 => "info",
        _ => "debug",
    }
}

pub fn init_logging(verbosity: u8) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbosity)));

    // try_init: a subscriber may already be installed (tests, embedding).
    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .try_init();
}
