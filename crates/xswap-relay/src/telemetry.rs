//! Tracing subscriber installation.

use tracing_subscriber::{EnvFilter, fmt, prelude::*};
use xswap_types::{LoggingConfig, Result, XswapError};

/// Install the global subscriber described by `config`.
///
/// `RUST_LOG`, when set, takes precedence over `config.filter`.
///
/// # Errors
/// [`XswapError::Configuration`] for an invalid filter or when a global
/// subscriber is already installed.
pub fn init_tracing(config: &LoggingConfig) -> Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&config.filter).map_err(|e| XswapError::Configuration {
            reason: format!("log filter {:?}: {e}", config.filter),
        })?,
    };
    let installed = if config.json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(filter)
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(fmt::layer())
            .with(filter)
            .try_init()
    };
    installed.map_err(|e| XswapError::Configuration {
        reason: format!("tracing subscriber: {e}"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_install_is_rejected() {
        let config = LoggingConfig::default();
        // The first call fails too if another test installed one already.
        let _ = init_tracing(&config);
        assert!(matches!(
            init_tracing(&config),
            Err(XswapError::Configuration { .. })
        ));
    }
}
