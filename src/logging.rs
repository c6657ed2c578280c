//! Logging setup
//!
//! Everything is logged to stderr through `tracing`. `RUST_LOG` takes
//! precedence over the level picked from the command line.

use std::io;

use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::time::ChronoLocal;

/// Logging options resolved from the command line
#[derive(Debug, Clone, Copy, Default)]
pub struct LogConfig {
    pub verbose: bool,
}

impl LogConfig {
    /// Filter directive used when `RUST_LOG` is unset
    pub fn default_directive(self) -> &'static str {
        if self.verbose { "debug" } else { "info" }
    }
}

/// Install the global subscriber.
///
/// Calling this more than once keeps the first subscriber.
pub fn init(config: LogConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.default_directive()));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_ansi(console::colors_enabled_stderr())
        .with_timer(ChronoLocal::new("%H:%M:%S%.3f".to_string()))
        .with_target(false)
        .try_init();
}
