//! Boot-time logging initialization.
//!
//! Portunus components log through `tracing`; this module wires a global
//! subscriber once at process start. It is the engine's only piece of
//! process-global state, and it is explicitly opt-in — embedding
//! applications that install their own subscriber simply never call it.

use tracing_subscriber::EnvFilter;

use portunus_core::{PortunusError, PortunusResult};

/// Logging configuration.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Log level filter (e.g., "info", "debug", "portunus_router=trace").
    pub filter: String,
    /// Whether to emit JSON instead of human-readable lines.
    pub json_format: bool,
    /// Whether to include the emitting module path.
    pub include_target: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
            json_format: true,
            include_target: true,
        }
    }
}

impl LogConfig {
    /// Human-readable output at debug level, for development.
    #[must_use]
    pub fn development() -> Self {
        Self {
            filter: "debug".to_string(),
            json_format: false,
            include_target: true,
        }
    }
}

/// Installs the global subscriber. Call once at process start.
///
/// The `RUST_LOG` environment variable overrides the configured filter.
///
/// # Errors
///
/// Returns [`PortunusError::Configuration`] if a global subscriber is
/// already installed.
pub fn init_logging(config: &LogConfig) -> PortunusResult<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.filter.clone()));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(config.include_target);

    let result = if config.json_format {
        builder.json().try_init()
    } else {
        builder.try_init()
    };

    result.map_err(|err| {
        PortunusError::configuration(format!("logging already initialized: {err}"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = LogConfig::default();
        assert_eq!(config.filter, "info");
        assert!(config.json_format);
    }

    #[test]
    fn test_development_config() {
        let config = LogConfig::development();
        assert_eq!(config.filter, "debug");
        assert!(!config.json_format);
    }

    #[test]
    fn test_double_init_reports_configuration_error() {
        let _ = init_logging(&LogConfig::development());
        let second = init_logging(&LogConfig::development());
        assert!(matches!(
            second,
            Err(PortunusError::Configuration { .. })
        ));
    }
}
