//! Logging setup

use tracing_subscriber::{EnvFilter, fmt};

use crate::config::{GatewayConfig, LogFormat};
use crate::{Error, Result};

/// Configuration for the logging system
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Default filter directive, used when `RUST_LOG` is unset
    pub level: String,
    /// Whether to emit JSON lines
    pub json: bool,
    /// Whether to include file and line information
    pub file_info: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
            file_info: false,
        }
    }
}

impl From<&GatewayConfig> for LoggingConfig {
    fn from(config: &GatewayConfig) -> Self {
        Self {
            level: config.log_level.clone(),
            json: config.log_format == LogFormat::Json,
            file_info: false,
        }
    }
}

impl LoggingConfig {
    /// Build the filter: `RUST_LOG` wins over the configured level
    pub fn env_filter(&self) -> Result<EnvFilter> {
        match EnvFilter::try_from_default_env() {
            Ok(filter) => Ok(filter),
            Err(_) => EnvFilter::try_new(&self.level)
                .map_err(|e| Error::config(format!("Invalid log level '{}': {}", self.level, e))),
        }
    }
}

/// Install the global tracing subscriber
pub fn setup_logging(config: &LoggingConfig) -> Result<()> {
    let builder = fmt()
        .with_env_filter(config.env_filter()?)
        .with_file(config.file_info)
        .with_line_number(config.file_info);

    let installed = if config.json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };

    installed.map_err(|e| Error::config(format!("Failed to install tracing subscriber: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logging_config_follows_gateway_config() {
        let gateway = GatewayConfig {
            log_level: "debug,hyper=warn".to_string(),
            log_format: LogFormat::Json,
            ..Default::default()
        };
        let logging = LoggingConfig::from(&gateway);
        assert_eq!(logging.level, "debug,hyper=warn");
        assert!(logging.json);
    }
}
