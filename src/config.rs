//! Dashboard configuration loaded from environment variables.
//!
//! Follows 12-factor style: all settings come from environment variables
//! (or a `.env` file via `dotenvy`). The backend URL and its anonymous key
//! are required; everything else has a default.

use std::net::SocketAddr;

/// Output format of the tracing subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Text,
    /// One JSON object per event.
    Json,
}

/// Top-level dashboard configuration.
///
/// Loaded once at startup via [`DashboardConfig::from_env`].
#[derive(Debug, Clone)]
pub struct DashboardConfig {
    /// Socket address to bind the HTTP server to (e.g. `0.0.0.0:3000`).
    pub listen_addr: SocketAddr,

    /// Base URL of the hosted backend (e.g. `https://abc.supabase.co`).
    pub backend_url: String,

    /// Anonymous API key sent with every backend request.
    pub backend_anon_key: String,

    /// Name of the remote function that flips a device's manual switch.
    pub switch_function: String,

    /// Number of recent telemetry samples fetched for dashboards.
    pub telemetry_sample_limit: u32,

    /// Tracing output format.
    pub log_format: LogFormat,
}

impl DashboardConfig {
    /// Loads configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv().ok()` to optionally load a `.env` file.
    ///
    /// # Errors
    ///
    /// Returns an error if `BACKEND_URL` or `BACKEND_ANON_KEY` is missing,
    /// or if `LISTEN_ADDR` is set but cannot be parsed as a [`SocketAddr`].
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// Same conditions as [`DashboardConfig::from_env`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self, Box<dyn std::error::Error>>
    where
        F: Fn(&str) -> Option<String>,
    {
        let listen_addr: SocketAddr = lookup("LISTEN_ADDR")
            .unwrap_or_else(|| "0.0.0.0:3000".to_string())
            .parse()?;

        let backend_url = lookup("BACKEND_URL")
            .filter(|v| !v.trim().is_empty())
            .ok_or("BACKEND_URL must be set")?;
        let backend_anon_key = lookup("BACKEND_ANON_KEY")
            .filter(|v| !v.trim().is_empty())
            .ok_or("BACKEND_ANON_KEY must be set")?;

        let switch_function =
            lookup("SWITCH_FUNCTION").unwrap_or_else(|| "esp32-switch".to_string());
        let telemetry_sample_limit = parse_value(lookup("TELEMETRY_SAMPLE_LIMIT"), 20);

        let log_format = match lookup("LOG_FORMAT").as_deref() {
            Some("json") | Some("JSON") => LogFormat::Json,
            _ => LogFormat::Text,
        };

        Ok(Self {
            listen_addr,
            backend_url,
            backend_anon_key,
            switch_function,
            telemetry_sample_limit,
            log_format,
        })
    }
}

/// Parses an optional raw value as `T`, returning `default` on missing
/// or invalid values.
fn parse_value<T: std::str::FromStr>(raw: Option<String>, default: T) -> T {
    raw.and_then(|v| v.parse().ok()).unwrap_or(default)
}
