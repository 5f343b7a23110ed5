//! `tracing` subscriber initialisation.
//!
//! The filter comes from `RUST_LOG`, then `ALYANTE_LOG_LEVEL`, then the
//! caller's default. `ALYANTE_LOG_FORMAT=json` switches to JSON lines.

use alyante_domain::{AlyanteError, Result};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Output format of the fmt layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl LogFormat {
    /// Format requested through `ALYANTE_LOG_FORMAT`, text otherwise.
    pub fn from_env() -> Self {
        match std::env::var("ALYANTE_LOG_FORMAT") {
            Ok(value) if value.trim().eq_ignore_ascii_case("json") => Self::Json,
            _ => Self::Text,
        }
    }
}

/// Install the global subscriber using the format from the environment.
///
/// # Errors
/// `AlyanteError::Internal` when a global subscriber is already set.
pub fn init_tracing(default_level: &str) -> Result<()> {
    init_tracing_with(default_level, LogFormat::from_env())
}

/// Install the global subscriber with an explicit output format.
pub fn init_tracing_with(default_level: &str, format: LogFormat) -> Result<()> {
    let filter = build_filter(default_level);
    let registry = tracing_subscriber::registry().with(filter);

    let installed = match format {
        LogFormat::Text => registry.with(fmt::layer().with_target(true)).try_init(),
        LogFormat::Json => registry.with(fmt::layer().json().with_target(true)).try_init(),
    };

    installed.map_err(|e| AlyanteError::Internal(format!("failed to initialise tracing: {e}")))
}

fn build_filter(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_env("RUST_LOG")
        .or_else(|_| EnvFilter::try_from_env("ALYANTE_LOG_LEVEL"))
        .unwrap_or_else(|_| EnvFilter::new(default_level))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_initialisation_is_reported() {
        let _ = init_tracing_with("debug", LogFormat::Text);
        let second = init_tracing_with("debug", LogFormat::Json);
        assert!(matches!(second, Err(AlyanteError::Internal(_))));
    }

    #[test]
    fn default_format_is_text() {
        assert_eq!(LogFormat::default(), LogFormat::Text);
    }
}
