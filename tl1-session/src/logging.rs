//! Logging setup for TL1 test runs
//!
//! The crates only emit `tracing` events; this module installs a subscriber
//! for binaries and test harnesses that want to see them. Wire traffic is
//! logged by `tl1_client` (`>>` commands at debug, `<<` frames at trace), so
//! [`LoggingMode::Debug`] is the mode to use when a network element misbehaves.

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Registry};

/// Default directives for session lifecycle output
const DEVELOPMENT_DIRECTIVES: &str = "warn,tl1_parser=warn,tl1_client=info,tl1_session=info";

/// Default directives that include every frame on the wire
const DEBUG_DIRECTIVES: &str = "info,tl1_parser=debug,tl1_client=trace,tl1_session=debug";

/// Logging mode for different use cases
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoggingMode {
    /// No subscriber, everything is dropped
    Silent,
    /// Compact stderr output of session lifecycle
    Development,
    /// Verbose output with raw frames, thread names and source locations
    Debug,
    /// One JSON object per event, for collection by a CI runner
    Json,
}

/// Logging configuration error
#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    #[error("Failed to initialize tracing subscriber: {0}")]
    TracingInit(String),
}

/// Install a subscriber for `mode`
///
/// # Environment Variables
///
/// - `TL1_LOG_LEVEL`: filter directives, e.g. `tl1_client=trace,info`
/// - `RUST_LOG`: used when `TL1_LOG_LEVEL` is unset
pub fn init_logging(mode: LoggingMode) -> Result<(), LoggingError> {
    let registry = Registry::default();
    let result = match mode {
        LoggingMode::Silent => return Ok(()),
        LoggingMode::Development => registry
            .with(fmt::layer().with_target(false).compact())
            .with(create_env_filter(DEVELOPMENT_DIRECTIVES))
            .try_init(),
        LoggingMode::Debug => registry
            .with(
                fmt::layer()
                    .with_thread_names(true)
                    .with_file(true)
                    .with_line_number(true),
            )
            .with(create_env_filter(DEBUG_DIRECTIVES))
            .try_init(),
        LoggingMode::Json => registry
            .with(fmt::layer().json().with_thread_names(true))
            .with(create_env_filter(DEVELOPMENT_DIRECTIVES))
            .try_init(),
    };
    result.map_err(|e| LoggingError::TracingInit(e.to_string()))
}

/// Mode named by `TL1_LOG_MODE` ("development", "debug" or "json"), silent otherwise
pub fn mode_from_env() -> LoggingMode {
    parse_mode(std::env::var("TL1_LOG_MODE").ok().as_deref())
}

/// Initialize logging from `TL1_LOG_MODE`
pub fn init_logging_from_env() -> Result<(), LoggingError> {
    init_logging(mode_from_env())
}

/// Route events through the libtest capture, once per test binary
///
/// Output is only shown for failing tests. Uses the debug directives unless
/// `TL1_LOG_LEVEL` or `RUST_LOG` says otherwise.
pub fn init_test_logging() {
    // A second call in the same binary finds the subscriber already set
    let _ = Registry::default()
        .with(
            fmt::layer()
                .with_ansi(false)
                .with_test_writer()
                .with_thread_names(true),
        )
        .with(create_env_filter(DEBUG_DIRECTIVES))
        .try_init();
}

fn parse_mode(value: Option<&str>) -> LoggingMode {
    match value.map(str::to_ascii_lowercase).as_deref() {
        Some("development") => LoggingMode::Development,
        Some("debug") => LoggingMode::Debug,
        Some("json") => LoggingMode::Json,
        _ => LoggingMode::Silent,
    }
}

fn create_env_filter(default_directives: &str) -> EnvFilter {
    let directives = std::env::var("TL1_LOG_LEVEL")
        .or_else(|_| std::env::var("RUST_LOG"))
        .unwrap_or_else(|_| default_directives.to_string());
    EnvFilter::new(directives)
}

/// Check if a global subscriber has been installed
pub fn is_initialized() -> bool {
    tracing::dispatcher::has_been_set()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_silent_mode_installs_nothing() {
        assert!(init_logging(LoggingMode::Silent).is_ok());
    }

    #[test]
    fn test_parse_mode() {
        assert_eq!(parse_mode(Some("development")), LoggingMode::Development);
        assert_eq!(parse_mode(Some("DEBUG")), LoggingMode::Debug);
        assert_eq!(parse_mode(Some("json")), LoggingMode::Json);
        assert_eq!(parse_mode(Some("verbose")), LoggingMode::Silent);
        assert_eq!(parse_mode(None), LoggingMode::Silent);
    }

    #[test]
    fn test_default_directives_parse() {
        for directives in [DEVELOPMENT_DIRECTIVES, DEBUG_DIRECTIVES] {
            assert!(EnvFilter::try_new(directives).is_ok(), "{directives}");
        }
    }

    #[test]
    fn test_test_logging_is_idempotent() {
        init_test_logging();
        init_test_logging();
        assert!(is_initialized());
        assert!(init_logging(LoggingMode::Development).is_err());
    }
}
