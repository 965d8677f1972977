//! Console output for mirrored log lines and internal diagnostics
//!
//! Mirrored lines and writer diagnostics are `tracing` events. Hosts that
//! already install a subscriber get them there; the CLI installs this one.

use anyhow::{Context, Result};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Filter used when `RUST_LOG` is not set
pub const DEFAULT_FILTER: &str = "loglane=info";

/// Install a stderr subscriber filtered by `RUST_LOG`, falling back to `default_filter`
pub fn init_console_logging(default_filter: &str) -> Result<()> {
    let console_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false);

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_filter.into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .try_init()
        .context("Failed to install console logging")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_init_fails_instead_of_panicking() {
        // Other tests may have installed a subscriber already; either way the
        // second call must report an error rather than panic
        let _ = init_console_logging(DEFAULT_FILTER);
        assert!(init_console_logging(DEFAULT_FILTER).is_err());
    }
}
