//! Tracing subscriber bootstrap
//!
//! `RUST_LOG` wins over the configured level when it is set.

use crate::pool_config::LoggingConfig;
use anyhow::{anyhow, Result};
use tracing_subscriber::EnvFilter;

/// Install the global fmt subscriber described by `config`.
///
/// Returns an error if a global subscriber is already installed, which
/// callers that may initialize twice (tests) can ignore.
pub fn init_logging(config: &LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .map_err(|e| anyhow!("Invalid log level {:?}: {}", config.level, e))?;

    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    let result = if config.json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };

    result.map_err(|e| anyhow!("Failed to install tracing subscriber: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_level_is_rejected() {
        if std::env::var("RUST_LOG").is_ok() {
            return;
        }
        let config = LoggingConfig {
            level: "stablepool=loud".to_string(),
            json: false,
        };
        assert!(init_logging(&config).is_err());
    }

    #[test]
    fn test_second_init_reports_error() {
        let config = LoggingConfig::default();
        let _ = init_logging(&config);
        assert!(init_logging(&config).is_err());
    }
}
