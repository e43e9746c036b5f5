//! Operator side of the bridge: environment config, logging and an in-process
//! relay that drives the two ledgers from each other's events.

pub mod config;
pub mod relay;

use tracing_subscriber::EnvFilter;

/// Install the global `tracing` subscriber. `RUST_LOG` overrides the default
/// `info` level. Safe to call more than once.
pub fn setup_logger() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}
