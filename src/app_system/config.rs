use std::env;
use std::fmt::Display;
use std::str::FromStr;
use std::time::Duration;

use tracing::{info, warn};

pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 5_000;
pub const DEFAULT_CHANNEL_BUFFER: usize = 64;
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Runtime settings, read from the environment.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Bound on every client request/reply exchange.
    pub request_timeout: Duration,
    /// Mailbox capacity of each actor.
    pub channel_buffer: usize,
    /// Filter used when `RUST_LOG` is unset.
    pub log_filter: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_millis(DEFAULT_REQUEST_TIMEOUT_MS),
            channel_buffer: DEFAULT_CHANNEL_BUFFER,
            log_filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from any key lookup. Malformed values fall back to
    /// the default with a warning.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let timeout_ms: u64 = try_load(&lookup, "CANTEEN_REQUEST_TIMEOUT_MS", DEFAULT_REQUEST_TIMEOUT_MS);
        let channel_buffer: usize = try_load(&lookup, "CANTEEN_CHANNEL_BUFFER", DEFAULT_CHANNEL_BUFFER);
        let log_filter = lookup("CANTEEN_LOG")
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string());

        // Zero would make every request time out or the mailboxes unusable.
        let request_timeout = if timeout_ms == 0 {
            warn!("CANTEEN_REQUEST_TIMEOUT_MS must be positive, using default: {DEFAULT_REQUEST_TIMEOUT_MS}");
            Duration::from_millis(DEFAULT_REQUEST_TIMEOUT_MS)
        } else {
            Duration::from_millis(timeout_ms)
        };
        let channel_buffer = if channel_buffer == 0 {
            warn!("CANTEEN_CHANNEL_BUFFER must be positive, using default: {DEFAULT_CHANNEL_BUFFER}");
            DEFAULT_CHANNEL_BUFFER
        } else {
            channel_buffer
        };

        Self {
            request_timeout,
            channel_buffer,
            log_filter,
        }
    }
}

fn try_load<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T
where
    T: FromStr + Display,
    T::Err: Display,
{
    match lookup(key) {
        None => {
            info!("{key} not set, using default: {default}");
            default
        }
        Some(raw) => raw.trim().parse().unwrap_or_else(|e| {
            warn!("Invalid {key} value {raw:?}: {e}, using default: {default}");
            default
        }),
    }
}
