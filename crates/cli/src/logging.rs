//! tracing subscriber setup for the `gencibuild` binary.
//!
//! Logs always go to stderr so stdout carries only the run summary. When
//! `RUST_LOG` is set it replaces the computed filter entirely.

use std::env;
use std::sync::Once;
use tracing::Level;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

static INIT: Once = Once::new();

/// Crate targets the configured level applies to.
const TARGETS: &[&str] = &["gencibuild", "gencibuild_cli", "gencibuild_core"];

#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Minimum log level to display
    pub level: Level,

    /// Emit one JSON object per event instead of text
    pub use_json: bool,

    /// Include the module target (e.g. gencibuild_core::synth) in logs
    pub include_target: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            use_json: false,
            include_target: true,
        }
    }
}

/// Parses a log level, case-insensitively.
pub fn parse_level(level_str: &str) -> Option<Level> {
    match level_str.to_lowercase().as_str() {
        "trace" => Some(Level::TRACE),
        "debug" => Some(Level::DEBUG),
        "info" => Some(Level::INFO),
        "warn" => Some(Level::WARN),
        "error" => Some(Level::ERROR),
        _ => None,
    }
}

/// Filter directives for `level`, e.g. `gencibuild_core=debug`.
pub fn default_directives(level: Level) -> Vec<String> {
    TARGETS
        .iter()
        .map(|target| format!("{}={}", target, level.to_string().to_lowercase()))
        .collect()
}

/// Install the global subscriber. Later calls are ignored.
pub fn init_logging(config: LoggingConfig) {
    INIT.call_once(|| {
        let filter = if env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else {
            default_directives(config.level)
                .iter()
                .filter_map(|d| d.parse().ok())
                .fold(EnvFilter::new("warn"), |filter, directive| {
                    filter.add_directive(directive)
                })
        };

        if config.use_json {
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    fmt::layer()
                        .json()
                        .with_target(config.include_target)
                        .with_writer(std::io::stderr),
                )
                .init();
        } else {
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    fmt::layer()
                        .with_target(config.include_target)
                        .with_writer(std::io::stderr),
                )
                .init();
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_level() {
        assert_eq!(parse_level("debug"), Some(Level::DEBUG));
        assert_eq!(parse_level("WARN"), Some(Level::WARN));
        assert_eq!(parse_level("loud"), None);
    }

    #[test]
    fn test_default_directives() {
        let directives = default_directives(Level::DEBUG);
        assert!(directives.contains(&"gencibuild_core=debug".to_string()));
        assert_eq!(directives.len(), TARGETS.len());
        for directive in &directives {
            assert!(directive
                .parse::<tracing_subscriber::filter::Directive>()
                .is_ok());
        }
    }

}
