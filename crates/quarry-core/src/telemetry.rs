//! Tracing initialization and configuration.

use std::sync::Once;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

static INIT: Once = Once::new();

/// Initialize the process-wide tracing/logging system.
///
/// Reads the `QUARRY_LOG` environment variable for per-subsystem log
/// levels, e.g. `QUARRY_LOG=quarry_retrieval=debug,quarry_compression=warn`,
/// falling back to `quarry=info` when unset or invalid. Set
/// `QUARRY_LOG_FORMAT=json` for machine-readable output.
///
/// Idempotent; calling it multiple times is safe.
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_env("QUARRY_LOG")
            .unwrap_or_else(|_| EnvFilter::new("quarry=info"));

        let json = std::env::var("QUARRY_LOG_FORMAT").is_ok_and(|v| v == "json");
        if json {
            tracing_subscriber::registry()
                .with(fmt::layer().json().with_target(true))
                .with(filter)
                .init();
        } else {
            tracing_subscriber::registry()
                .with(fmt::layer().with_target(true).with_line_number(true))
                .with(filter)
                .init();
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_is_idempotent() {
        init_tracing();
        init_tracing();
    }
}
