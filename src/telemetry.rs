//! Log subscriber setup shared by the CLI, TUI and server.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

pub const LOG_LEVEL_ENV: &str = "LOG_LEVEL";

/// Install a stderr fmt subscriber. `LOG_LEVEL` overrides `default_level`.
/// Calling this twice is harmless.
pub fn init(default_level: &str) {
    let filter = std::env::var(LOG_LEVEL_ENV).unwrap_or_else(|_| default_level.to_string());
    let filter = EnvFilter::try_new(filter).unwrap_or_else(|_| EnvFilter::new(default_level));
    let fmt_layer = fmt::layer().with_writer(std::io::stderr).with_target(false);
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init();
}
