//! Logging utilities for the Automap CLI
//!
//! This module provides:
//! - Structured logging setup (console or file, compact/full/JSON)
//! - Verbosity and environment overrides
//! - Performance timing spans

use crate::error::{Error, Result};
use is_terminal::IsTerminal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing::{field, Span};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::EnvFilter;

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level filter
    pub level: String,
    /// Output format: compact, full, json
    pub format: LogFormat,
    /// Enable console output
    pub console: bool,
    /// Optional file output path
    pub file: Option<PathBuf>,
    /// Include thread IDs
    pub thread_ids: bool,
    /// Include file and line numbers
    pub source_location: bool,
    /// Include span close events
    pub span_events: bool,
    /// Module-based filtering
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub module_filter: BTreeMap<String, String>,
}

/// Log output format
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Compact format for production
    Compact,
    /// Full format with all details
    Full,
    /// JSON structured format
    Json,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            format: LogFormat::Compact,
            console: true,
            file: None,
            thread_ids: false,
            source_location: false,
            span_events: false,
            module_filter: BTreeMap::new(),
        }
    }
}

impl LoggingConfig {
    /// Raise the detail level for `-v` flags; zero keeps the configured level
    pub fn apply_verbosity(&mut self, verbosity: u8) {
        match verbosity {
            0 => {}
            1 => {
                self.level = "info".to_string();
            }
            2 => {
                self.level = "debug".to_string();
                self.source_location = true;
            }
            _ => {
                self.level = "trace".to_string();
                self.format = LogFormat::Full;
                self.source_location = true;
                self.thread_ids = true;
                self.span_events = true;
            }
        }
    }

    /// Apply environment overrides
    pub fn merge_with_env(&mut self) {
        // RUST_LOG takes precedence
        if let Ok(rust_log) = std::env::var("RUST_LOG") {
            self.level = rust_log;
        }

        if let Ok(format) = std::env::var("AUTOMAP_LOG_FORMAT") {
            match format.to_lowercase().as_str() {
                "compact" => self.format = LogFormat::Compact,
                "full" => self.format = LogFormat::Full,
                "json" => self.format = LogFormat::Json,
                _ => eprintln!("Warning: invalid log format '{}', using default", format),
            }
        }

        if let Ok(file) = std::env::var("AUTOMAP_LOG_FILE") {
            self.file = Some(PathBuf::from(file));
        }

        if let Ok(console) = std::env::var("AUTOMAP_LOG_CONSOLE") {
            self.console = console.to_lowercase() == "true" || console == "1";
        }
    }
}

/// Initialize the global logging system.
///
/// The returned guard flushes the file writer and must live until exit.
pub fn init_logging(config: LoggingConfig) -> Result<Option<WorkerGuard>> {
    if !config.console && config.file.is_none() {
        return Ok(None);
    }

    let env_filter = create_env_filter(&config)?;
    let (writer, guard, ansi) = match &config.file {
        Some(path) => {
            let directory = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("."));
            let file_name = path
                .file_name()
                .ok_or_else(|| Error::config(format!("Invalid log file path: {}", path.display())))?;
            let appender = tracing_appender::rolling::never(directory, file_name);
            let (non_blocking, guard) = tracing_appender::non_blocking(appender);
            (BoxMakeWriter::new(non_blocking), Some(guard), false)
        }
        None => (
            BoxMakeWriter::new(std::io::stderr),
            None,
            std::io::stderr().is_terminal(),
        ),
    };
    let span_events = if config.span_events {
        FmtSpan::CLOSE
    } else {
        FmtSpan::NONE
    };

    // Each format yields a distinct subscriber type
    match config.format {
        LogFormat::Compact => {
            let subscriber = tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_writer(writer)
                .with_target(true)
                .with_ansi(ansi)
                .with_thread_ids(config.thread_ids)
                .with_file(config.source_location)
                .with_line_number(config.source_location)
                .with_span_events(span_events)
                .compact()
                .finish();

            tracing::subscriber::set_global_default(subscriber)
                .map_err(|e| Error::other(format!("Failed to initialize logging: {}", e)))?;
        }
        LogFormat::Json => {
            let subscriber = tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_writer(writer)
                .with_target(true)
                .with_ansi(false)
                .with_thread_ids(config.thread_ids)
                .with_file(config.source_location)
                .with_line_number(config.source_location)
                .with_span_events(span_events)
                .json()
                .finish();

            tracing::subscriber::set_global_default(subscriber)
                .map_err(|e| Error::other(format!("Failed to initialize logging: {}", e)))?;
        }
        LogFormat::Full => {
            let subscriber = tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_writer(writer)
                .with_target(true)
                .with_ansi(ansi)
                .with_thread_ids(config.thread_ids)
                .with_file(config.source_location)
                .with_line_number(config.source_location)
                .with_span_events(span_events)
                .finish();

            tracing::subscriber::set_global_default(subscriber)
                .map_err(|e| Error::other(format!("Failed to initialize logging: {}", e)))?;
        }
    }

    tracing::debug!(config = ?config, "Logging system initialized");

    Ok(guard)
}

/// Create environment filter based on configuration
fn create_env_filter(config: &LoggingConfig) -> Result<EnvFilter> {
    let mut filter = EnvFilter::try_new(&config.level)
        .map_err(|e| Error::config(format!("Invalid log level '{}': {}", config.level, e)))?;

    for (module, level) in &config.module_filter {
        filter = filter.add_directive(
            format!("{}={}", module, level)
                .parse()
                .map_err(|e| Error::config(format!("Invalid filter directive: {}", e)))?,
        );
    }

    Ok(filter)
}

/// Create a span with timing
pub fn create_operation_span(operation: &str, details: Option<&str>) -> Span {
    tracing::info_span!(
        "operation",
        operation = operation,
        details = details.unwrap_or(""),
        duration_ms = field::Empty,
    )
}

/// Performance timing utilities
pub mod timing {
    use std::time::Instant;
    use tracing::Span;

    /// A timer that automatically logs duration when dropped
    pub struct Timer {
        start: Instant,
        span: Span,
        operation: String,
    }

    impl Timer {
        pub fn new(operation: &str) -> Self {
            Self {
                start: Instant::now(),
                span: super::create_operation_span(operation, None),
                operation: operation.to_string(),
            }
        }

        pub fn with_details(operation: &str, details: &str) -> Self {
            Self {
                start: Instant::now(),
                span: super::create_operation_span(operation, Some(details)),
                operation: operation.to_string(),
            }
        }

        /// Get elapsed time without finishing the timer
        pub fn elapsed(&self) -> std::time::Duration {
            self.start.elapsed()
        }
    }

    impl Drop for Timer {
        fn drop(&mut self) {
            let duration = self.start.elapsed();
            self.span.record("duration_ms", duration.as_millis() as u64);

            tracing::debug!(
                operation = %self.operation,
                duration_ms = duration.as_millis() as u64,
                "Operation completed"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn from_verbosity(verbosity: u8) -> LoggingConfig {
        let mut config = LoggingConfig::default();
        config.apply_verbosity(verbosity);
        config
    }

    #[test]
    fn test_logging_config_from_verbosity() {
        let config = from_verbosity(0);
        assert_eq!(config.level, "warn");
        assert!(!config.source_location);

        let config = from_verbosity(2);
        assert_eq!(config.level, "debug");
        assert!(config.source_location);

        let config = from_verbosity(3);
        assert_eq!(config.level, "trace");
        assert_eq!(config.format, LogFormat::Full);
        assert!(config.thread_ids);
        assert!(config.span_events);
    }

    #[test]
    fn test_verbosity_keeps_configured_level_when_zero() {
        let mut config = LoggingConfig {
            level: "error".to_string(),
            ..LoggingConfig::default()
        };
        config.apply_verbosity(0);
        assert_eq!(config.level, "error");
    }

    #[test]
    fn test_module_filters_are_applied() {
        let mut config = LoggingConfig::default();
        config
            .module_filter
            .insert("automap_core".to_string(), "debug".to_string());
        let filter = create_env_filter(&config).unwrap();
        assert!(filter.to_string().contains("automap_core=debug"));
    }

    #[test]
    fn test_timer_elapsed() {
        let timer = timing::Timer::with_details("test", "details");
        assert!(timer.elapsed() < std::time::Duration::from_secs(60));
    }

    #[test]
    fn test_deserialize_partial_config() {
        let config: LoggingConfig = serde_json::from_str(r#"{"format": "json"}"#).unwrap();
        assert_eq!(config.format, LogFormat::Json);
        assert_eq!(config.level, "warn");
        assert!(config.console);
    }
}
