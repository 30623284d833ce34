//! Logging setup for binaries and collaborators embedding the RDF core
//!
//! Library code only emits `tracing` events. Call [`init_logging`] once at
//! startup to install a subscriber.

use std::env;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Telemetry configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TelemetryConfig {
    /// Primary log filter (RUST_LOG env var)
    pub log_filter: String,
    /// Fallback level if RUST_LOG is not set
    pub default_level: String,
    /// Output format
    pub log_format: LogFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Human,
    Json,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_filter: String::new(),
            default_level: "info".to_string(),
            log_format: LogFormat::Human,
        }
    }
}

impl TelemetryConfig {
    /// Read `RUST_LOG`, `SFLO_LOG_LEVEL` and `SFLO_LOG_FORMAT`.
    pub fn from_env() -> Self {
        Self::from_vars(
            env::var("RUST_LOG").ok(),
            env::var("SFLO_LOG_LEVEL").ok(),
            env::var("SFLO_LOG_FORMAT").ok(),
        )
    }

    fn from_vars(rust_log: Option<String>, level: Option<String>, format: Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            log_filter: rust_log.unwrap_or_default(),
            default_level: level
                .filter(|l| !l.trim().is_empty())
                .unwrap_or(defaults.default_level),
            log_format: match format.unwrap_or_default().to_lowercase().as_str() {
                "json" => LogFormat::Json,
                _ => LogFormat::Human,
            },
        }
    }

    fn filter(&self) -> EnvFilter {
        if self.log_filter.is_empty() {
            EnvFilter::new(&self.default_level)
        } else {
            EnvFilter::new(&self.log_filter)
        }
    }
}

/// Install the global tracing subscriber.
///
/// Safe to call multiple times; only the first call has an effect.
pub fn init_logging(config: &TelemetryConfig) {
    if tracing::dispatcher::has_been_set() {
        tracing::debug!("tracing subscriber already initialized, skipping");
        return;
    }

    let fmt_layer = match config.log_format {
        LogFormat::Json => tracing_subscriber::fmt::layer().json().boxed(),
        LogFormat::Human => tracing_subscriber::fmt::layer().compact().boxed(),
    };

    // try_init: another thread may have won the race since has_been_set()
    let _ = tracing_subscriber::registry()
        .with(config.filter())
        .with(fmt_layer)
        .try_init();
}
