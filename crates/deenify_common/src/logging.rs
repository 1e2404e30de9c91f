//! Logging utilities for the Deenify application.
//!
//! Provides a single place to initialize the tracing subscriber so every
//! binary and test harness logs the same way.

use tracing::{info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initialize the tracing subscriber with the default level (INFO).
pub fn init() {
    init_with_level(Level::INFO);
}

/// Initialize the tracing subscriber with a specific log level.
///
/// `RUST_LOG` style directives from the environment still apply on top of
/// the crate-level default.
pub fn init_with_level(level: Level) {
    let filter = EnvFilter::from_default_env()
        .add_directive(format!("deenify={}", level).parse().unwrap());

    // Use try_init to handle the case where a global default subscriber
    // has already been set (tests, embedded usage).
    let result = tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(true)
                .with_file(true)
                .with_line_number(true),
        )
        .with(filter)
        .try_init();

    if result.is_ok() {
        info!("Logging initialized at level: {}", level);
    }
}
