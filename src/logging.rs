//! Logging setup.
//!
//! The library itself only emits `tracing` events. Binaries and tests that
//! want to see them call [`init_logging`] once at startup.

use tracing_subscriber::EnvFilter;

use crate::error::{Error, Result};

/// Install a global `fmt` subscriber.
///
/// `RUST_LOG` takes precedence; otherwise `default_filter` (for example
/// [`ClientConfig::log_filter`](crate::ClientConfig::log_filter)) is used.
/// Calling this a second time returns [`Error::Config`] instead of
/// replacing the existing subscriber.
///
/// # Examples
///
/// ```no_run
/// use feedkit::{logging, ClientConfig};
///
/// let config = ClientConfig::from_env();
/// logging::init_logging(&config.log_filter).expect("logging already installed");
/// ```
pub fn init_logging(default_filter: &str) -> Result<()> {
    let filter = build_filter(default_filter)?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init()
        .map_err(|e| Error::config(format!("failed to install subscriber: {e}")))
}

fn build_filter(default_filter: &str) -> Result<EnvFilter> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => EnvFilter::try_new(default_filter)
            .map_err(|e| Error::config(format!("invalid log filter {default_filter:?}: {e}"))),
    }
}
