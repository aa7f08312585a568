//! Environment variable names used by this crate for convenient
//! configuration of sinks and the batch client.
//!
//! These are purely helpers; the sink and client types remain decoupled
//! from environment access.

/// Logflare API key.
pub const LOGFLARE_API_KEY_ENV: &str = "LOGFLARE_API_KEY";

/// Logflare source id. Mutually exclusive with the source name.
pub const LOGFLARE_SOURCE_ID_ENV: &str = "LOGFLARE_SOURCE_ID";

/// Logflare source name. Mutually exclusive with the source id.
pub const LOGFLARE_SOURCE_NAME_ENV: &str = "LOGFLARE_SOURCE_NAME";

/// Optional override of the Logflare ingestion endpoint.
pub const LOGFLARE_ENDPOINT_ENV: &str = "LOGFLARE_ENDPOINT";

/// Discord webhook URL. When set, the Discord backend is selected.
pub const DISCORD_WEBHOOK_URL_ENV: &str = "DISCORD_WEBHOOK_URL";

/// Optional name Discord messages are posted under.
pub const DISCORD_USERNAME_ENV: &str = "DISCORD_USERNAME";

/// Optional flush period in milliseconds.
pub const LOG_SINK_FLUSH_PERIOD_MS_ENV: &str = "LOG_SINK_FLUSH_PERIOD_MS";

/// Optional flush size in records; `0` disables size-triggered flushes.
pub const LOG_SINK_FLUSH_SIZE_ENV: &str = "LOG_SINK_FLUSH_SIZE";

/// Optional number of batches that may wait for delivery.
pub const LOG_SINK_QUEUE_CAPACITY_ENV: &str = "LOG_SINK_QUEUE_CAPACITY";

/// Read an environment variable, treating unset and empty values alike.
pub fn env_var(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}
