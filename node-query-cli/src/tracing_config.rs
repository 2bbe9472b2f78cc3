//! Tracing configuration for the node-query command
//!
//! Logs always go to stderr so that stdout carries nothing but the generated
//! JSON.

use tracing_subscriber::{EnvFilter, prelude::*};

/// Configuration for tracing initialization
#[derive(Debug, Clone)]
pub struct TracingConfig {
    /// Default log level filter, used when `RUST_LOG` is not set
    pub default_log_level: String,

    /// Include thread ids in log lines
    pub thread_ids: bool,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            default_log_level: "info,node_query=debug".to_string(),
            thread_ids: true,
        }
    }
}

impl TracingConfig {
    /// Set the default log level
    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.default_log_level = level.into();
        self
    }

    pub fn with_thread_ids(mut self, enable: bool) -> Self {
        self.thread_ids = enable;
        self
    }
}

/// Install the global subscriber. Calling this twice is a no-op.
pub fn initialize_tracing(config: TracingConfig) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.default_log_level));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_ids(config.thread_ids)
        .with_line_number(true)
        .with_ansi(false);

    let installed = tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()
        .is_ok();

    if installed {
        tracing::debug!(filter = %config.default_log_level, "tracing initialized");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder() {
        let config = TracingConfig::default()
            .with_log_level("warn")
            .with_thread_ids(false);
        assert_eq!(config.default_log_level, "warn");
        assert!(!config.thread_ids);
    }

    #[test]
    fn test_initialize_twice() {
        initialize_tracing(TracingConfig::default());
        initialize_tracing(TracingConfig::default().with_log_level("error"));
    }
}
