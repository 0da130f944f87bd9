//! Runtime settings for the tool itself, read from environment variables.
//!
//! - `PQR_LOG`: tracing filter directive (default: `warn`, options: `trace`, `debug`, `info`, `warn`, `error`)
//! - `PQR_SPAWN`: run the script as a child process instead of replacing this
//!   process (`1`, `true`, `yes` or `on`; default: off)

use std::ffi::OsString;

pub const LOG_VAR: &str = "PQR_LOG";
pub const SPAWN_VAR: &str = "PQR_SPAWN";

const DEFAULT_LOG_FILTER: &str = "warn";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Filter directive handed to the tracing subscriber.
    pub log_filter: String,
    /// Spawn and wait even where process replacement is available.
    pub spawn: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_filter: DEFAULT_LOG_FILTER.to_string(),
            spawn: false,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var_os(key))
    }

    /// Build the configuration from an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<OsString>) -> Self {
        let log_filter = lookup(LOG_VAR)
            .and_then(|v| v.into_string().ok())
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string());
        let spawn = lookup(SPAWN_VAR)
            .and_then(|v| v.into_string().ok())
            .is_some_and(|v| is_truthy(&v));
        Self { log_filter, spawn }
    }
}

fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
