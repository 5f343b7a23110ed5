//! Configuration loader
//!
//! Loads connector configuration from environment variables or files.
//!
//! ## Loading Strategy
//! 1. Environment variables, when all required ones are set
//! 2. Otherwise a JSON or TOML file found by [`probe_config_paths`]
//!
//! ## Environment Variables
//! - `ALYANTE_DB_PATH`: Database file path (required)
//! - `ALYANTE_DB_POOL_SIZE`: Connection pool size
//! - `ALYANTE_WS_URL`: Webservice base URL (required)
//! - `ALYANTE_WS_USERNAME` / `ALYANTE_WS_PASSWORD`: Credentials (required)
//! - `ALYANTE_WS_RESPONSE_COMPRESSED`: Ask for gzip responses (true/false)
//! - `ALYANTE_WS_INSECURE_CERTIFICATE`: Accept invalid TLS certificates
//! - `ALYANTE_WS_FALLBACK_LAST_CHANGE`: Watermark seed, `YYYY-MM-DD hh:mm:ss`
//! - `ALYANTE_WS_AUTH_TIMEOUT`: Auth endpoint timeout in seconds
//! - `ALYANTE_CALL_BUNCH_SIZE`: Page size sent as `max`
//! - `ALYANTE_CALL_TIMEOUT`: Bulk call timeout in seconds
//! - `ALYANTE_CALL_CONTINUE_ON_ERROR`: Skip failing records (true/false)
//!
//! Per-resource sort settings are only read from files.
//!
//! ## File Locations
//! `config.{json,toml}` and `alyante.{json,toml}` in the working directory,
//! its two parents, and the same locations relative to the executable.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use alyante_domain::{
    AlyanteError, CallConfig, Config, DatabaseConfig, Result, WebserviceConfig,
};

/// Load configuration from the environment, falling back to a file.
///
/// # Errors
/// Returns `AlyanteError::Config` when neither source yields a valid
/// configuration.
pub fn load() -> Result<Config> {
    match load_from_env() {
        Ok(config) => {
            tracing::info!("Configuration loaded from environment variables");
            Ok(config)
        }
        Err(e) => {
            tracing::debug!(error = ?e, "Failed to load from environment, trying file");
            load_from_file(None)
        }
    }
}

/// Load configuration from `ALYANTE_*` environment variables.
///
/// # Errors
/// Returns `AlyanteError::Config` if a required variable is missing or a
/// numeric value does not parse.
pub fn load_from_env() -> Result<Config> {
    let database_defaults = DatabaseConfig::default();
    let webservice_defaults = WebserviceConfig::default();
    let call_defaults = CallConfig::default();

    let database = DatabaseConfig {
        path: env_var("ALYANTE_DB_PATH")?,
        pool_size: env_number("ALYANTE_DB_POOL_SIZE", database_defaults.pool_size)?,
    };

    let webservice = WebserviceConfig {
        url: env_var("ALYANTE_WS_URL")?,
        username: env_var("ALYANTE_WS_USERNAME")?,
        password: env_var("ALYANTE_WS_PASSWORD")?,
        response_compressed: env_bool("ALYANTE_WS_RESPONSE_COMPRESSED", false),
        insecure_certificate: env_bool("ALYANTE_WS_INSECURE_CERTIFICATE", false),
        fallback_last_change: std::env::var("ALYANTE_WS_FALLBACK_LAST_CHANGE").ok(),
        auth_timeout_seconds: env_number(
            "ALYANTE_WS_AUTH_TIMEOUT",
            webservice_defaults.auth_timeout_seconds,
        )?,
    };

    let call = CallConfig {
        bunch_size: env_number("ALYANTE_CALL_BUNCH_SIZE", call_defaults.bunch_size)?,
        timeout_seconds: env_number("ALYANTE_CALL_TIMEOUT", call_defaults.timeout_seconds)?,
        continue_on_error: env_bool("ALYANTE_CALL_CONTINUE_ON_ERROR", false),
        sort: call_defaults.sort,
    };

    Ok(Config { database, webservice, call })
}

/// Load configuration from a file.
///
/// If `path` is `None`, probes the standard locations. Format is chosen by
/// extension (`.json` or `.toml`).
///
/// # Errors
/// Returns `AlyanteError::Config` if the file is missing, unreadable or
/// malformed.
pub fn load_from_file(path: Option<PathBuf>) -> Result<Config> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(AlyanteError::Config(format!(
                    "Config file not found: {}",
                    p.display()
                )));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            AlyanteError::Config(
                "No config file found in any of the standard locations".to_string(),
            )
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| AlyanteError::Config(format!("Failed to read config file: {e}")))?;

    parse_config(&contents, &config_path)
}

fn parse_config(contents: &str, path: &Path) -> Result<Config> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| AlyanteError::Config(format!("Invalid TOML format: {e}"))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| AlyanteError::Config(format!("Invalid JSON format: {e}"))),
        _ => Err(AlyanteError::Config(format!("Unsupported config format: {extension}"))),
    }
}

/// First existing config file among the standard locations.
pub fn probe_config_paths() -> Option<PathBuf> {
    static NAMES: [&str; 4] = ["config.json", "config.toml", "alyante.json", "alyante.toml"];
    static DIRS: [&str; 3] = [".", "..", "../.."];

    let mut roots = Vec::new();
    if let Ok(cwd) = std::env::current_dir() {
        roots.push(cwd);
    }
    if let Some(exe_dir) =
        std::env::current_exe().ok().and_then(|exe| exe.parent().map(Path::to_path_buf))
    {
        roots.push(exe_dir);
    }

    roots
        .iter()
        .flat_map(|root| {
            DIRS.iter().flat_map(move |dir| NAMES.iter().map(move |name| root.join(dir).join(name)))
        })
        .find(|path| path.exists())
}

fn env_var(key: &str) -> Result<String> {
    std::env::var(key).map_err(|_| {
        AlyanteError::Config(format!("Missing required environment variable: {key}"))
    })
}

fn env_number<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| AlyanteError::Config(format!("Invalid value for {key}: {e}"))),
        Err(_) => Ok(default),
    }
}

/// Accepts `1`/`0`, `true`/`false`, `yes`/`no`, `on`/`off` (case-insensitive).
fn env_bool(key: &str, default: bool) -> bool {
    std::env::var(key)
        .ok()
        .map(|s| matches!(s.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(default)
}
