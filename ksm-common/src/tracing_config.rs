//! Tracing subscriber setup.
//!
//! The libraries only emit `tracing` events; binaries embedding them call
//! [`init_tracing`] once at startup.

use crate::error::{parse_flag, CommonError};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Tracing configuration.
#[derive(Debug, Clone)]
pub struct TracingConfig {
    /// Service name attached to the root span
    pub service_name: String,
    /// Log level filter
    pub log_level: String,
    /// Whether to output JSON format
    pub json_output: bool,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            service_name: "ksm-notation".to_string(),
            log_level: "info".to_string(),
            json_output: false,
        }
    }
}

impl TracingConfig {
    /// Load from `KSM_LOG_LEVEL` and `KSM_LOG_JSON`, falling back to defaults.
    ///
    /// # Errors
    ///
    /// Returns [`CommonError::InvalidConfig`] if `KSM_LOG_JSON` is not a boolean.
    pub fn from_env() -> Result<Self, CommonError> {
        let mut config = Self::default();
        if let Ok(level) = std::env::var("KSM_LOG_LEVEL") {
            config.log_level = level;
        }
        if let Ok(raw) = std::env::var("KSM_LOG_JSON") {
            config.json_output = parse_flag("KSM_LOG_JSON", &raw)?;
        }
        Ok(config)
    }

    /// Create config with custom service name.
    #[must_use]
    pub fn with_service_name(mut self, name: impl Into<String>) -> Self {
        self.service_name = name.into();
        self
    }

    /// Create config with custom log level.
    #[must_use]
    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    /// Enable JSON output.
    #[must_use]
    pub const fn with_json_output(mut self) -> Self {
        self.json_output = true;
        self
    }
}

/// Initialize the global tracing subscriber.
///
/// `RUST_LOG` wins over the configured level when set. Calling this twice
/// returns an error instead of panicking.
///
/// # Errors
///
/// Returns [`CommonError::Internal`] if a global subscriber is already installed.
pub fn init_tracing(config: &TracingConfig) -> Result<(), CommonError> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let result = if config.json_output {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .try_init()
    };

    result.map_err(|e| CommonError::internal(format!("tracing already initialized: {e}")))?;
    tracing::info!(service = %config.service_name, "Tracing initialized");
    Ok(())
}
