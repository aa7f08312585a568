#[cfg(any(feature = "logflare", feature = "discord"))]
use std::sync::Arc;
use std::time::Duration;

use crate::client::BatchConfig;
use crate::env::*;
use crate::error::ConfigError;
#[cfg(any(feature = "logflare", feature = "discord"))]
use crate::sink::LogSink;

#[cfg(feature = "discord")]
use crate::discord::DiscordConfig;
#[cfg(feature = "logflare")]
use crate::logflare::LogflareConfig;

/// Name Discord messages are posted under when none is configured.
pub const DEFAULT_DISCORD_USERNAME: &str = "logs";

/// Supported destination kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    Logflare,
    Discord,
}

/// Destination configuration, one variant per sink. Has no variants when
/// both sink features are disabled.
#[derive(Debug, Clone)]
pub enum BackendConfig {
    #[cfg(feature = "logflare")]
    Logflare(LogflareConfig),
    #[cfg(feature = "discord")]
    Discord(DiscordConfig),
}

impl BackendConfig {
    pub fn kind(&self) -> BackendKind {
        match *self {
            #[cfg(feature = "logflare")]
            BackendConfig::Logflare(_) => BackendKind::Logflare,
            #[cfg(feature = "discord")]
            BackendConfig::Discord(_) => BackendKind::Discord,
        }
    }
}

/// Everything needed to run a batch client: where to ship and when to
/// flush.
#[derive(Debug, Clone)]
pub struct Settings {
    pub backend: BackendConfig,
    pub batch: BatchConfig,
}

impl Settings {
    /// Read settings from the process environment.
    ///
    /// See [`crate::env`] for the variable names.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(env_var)
    }

    /// Read settings through `lookup`, which returns the value of a
    /// variable or `None` when it is unset.
    ///
    /// The Discord backend is selected when a webhook URL is present,
    /// Logflare otherwise.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut batch = BatchConfig::default();
        if let Some(period) = parse_var::<u64, _>(&lookup, LOG_SINK_FLUSH_PERIOD_MS_ENV)? {
            batch.flush_period = Duration::from_millis(period);
        }
        if let Some(size) = parse_var::<usize, _>(&lookup, LOG_SINK_FLUSH_SIZE_ENV)? {
            batch.flush_size = size;
        }
        if let Some(capacity) = parse_var::<usize, _>(&lookup, LOG_SINK_QUEUE_CAPACITY_ENV)? {
            batch.queue_capacity = capacity;
        }

        let backend = match lookup(DISCORD_WEBHOOK_URL_ENV) {
            Some(webhook_url) => discord_backend(webhook_url, &lookup)?,
            None => logflare_backend(&lookup)?,
        };

        Ok(Settings { backend, batch })
    }
}

fn parse_var<T, F>(lookup: &F, key: &str) -> Result<Option<T>, ConfigError>
where
    T: std::str::FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(None),
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue {
                key: key.to_string(),
                value,
            }),
    }
}

#[cfg(feature = "discord")]
fn discord_backend<F>(webhook_url: String, lookup: &F) -> Result<BackendConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let username = lookup(DISCORD_USERNAME_ENV).unwrap_or_else(|| DEFAULT_DISCORD_USERNAME.to_string());
    Ok(BackendConfig::Discord(DiscordConfig::new(webhook_url, username)))
}

#[cfg(not(feature = "discord"))]
fn discord_backend<F>(_webhook_url: String, _lookup: &F) -> Result<BackendConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    Err(ConfigError::FeatureDisabled("discord"))
}

#[cfg(feature = "logflare")]
fn logflare_backend<F>(lookup: &F) -> Result<BackendConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let api_key = lookup(LOGFLARE_API_KEY_ENV).ok_or(ConfigError::MissingApiKey)?;
    let source_id = lookup(LOGFLARE_SOURCE_ID_ENV);
    let source_name = lookup(LOGFLARE_SOURCE_NAME_ENV);
    match (&source_id, &source_name) {
        (None, None) => return Err(ConfigError::MissingSource),
        (Some(_), Some(_)) => return Err(ConfigError::ConflictingSource),
        _ => {}
    }

    Ok(BackendConfig::Logflare(LogflareConfig {
        api_key,
        source_id,
        source_name,
        endpoint: lookup(LOGFLARE_ENDPOINT_ENV)
            .unwrap_or_else(|| crate::logflare::BASE_URL.to_string()),
    }))
}

#[cfg(not(feature = "logflare"))]
fn logflare_backend<F>(_lookup: &F) -> Result<BackendConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    Err(ConfigError::FeatureDisabled("logflare"))
}

/// Create a concrete `LogSink` implementation from a `BackendConfig`.
///
/// This is the main entry point for applications that select their
/// destination through configuration instead of constructing sinks
/// manually. `http` is an optional pre-built HTTP client shared by the
/// sink.
#[cfg(any(feature = "logflare", feature = "discord"))]
pub fn make_sink_from_config(
    cfg: &BackendConfig,
    http: Option<reqwest::Client>,
) -> Result<Arc<dyn LogSink>, ConfigError> {
    match cfg {
        #[cfg(feature = "logflare")]
        BackendConfig::Logflare(config) => {
            let sink = crate::logflare::LogflareSink::new(config.clone(), http)?;
            Ok(Arc::new(sink) as Arc<dyn LogSink>)
        }
        #[cfg(feature = "discord")]
        BackendConfig::Discord(config) => {
            let sink = crate::discord::DiscordSink::new(config.clone(), http)?;
            Ok(Arc::new(sink) as Arc<dyn LogSink>)
        }
    }
}


#[cfg(all(test, not(feature = "logflare"), not(feature = "discord")))]
mod no_sink_tests {
    use super::*;

    #[test]
    fn disabled_backends_are_reported() {
        let discord = Settings::from_lookup(|key: &str| {
            (key == DISCORD_WEBHOOK_URL_ENV).then(|| "https://discord.com/api/webhooks/1/abc".to_string())
        });
        assert!(matches!(discord, Err(ConfigError::FeatureDisabled("discord"))));

        let logflare = Settings::from_lookup(|_: &str| None);
        assert!(matches!(logflare, Err(ConfigError::FeatureDisabled("logflare"))));
    }
}
