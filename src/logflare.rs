use crate::error::{ConfigError, DeliveryError};
use crate::record::{Batch, LogRecord};
use crate::sink::LogSink;
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, StatusCode};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::debug;

/// Logflare ingestion endpoint used when none is configured.
pub const BASE_URL: &str = "https://api.logflare.app/logs/";

/// Configuration for [`LogflareSink`].
///
/// Exactly one of `source_id` and `source_name` must be set.
#[derive(Clone, Debug)]
pub struct LogflareConfig {
    pub api_key: String,
    pub source_id: Option<String>,
    pub source_name: Option<String>,
    /// Base URL without query, e.g. "https://api.logflare.app/logs/"
    pub endpoint: String,
}

impl LogflareConfig {
    pub fn with_source_id(api_key: impl Into<String>, source_id: impl Into<String>) -> Self {
        LogflareConfig {
            api_key: api_key.into(),
            source_id: Some(source_id.into()),
            source_name: None,
            endpoint: BASE_URL.to_string(),
        }
    }

    pub fn with_source_name(api_key: impl Into<String>, source_name: impl Into<String>) -> Self {
        LogflareConfig {
            api_key: api_key.into(),
            source_id: None,
            source_name: Some(source_name.into()),
            endpoint: BASE_URL.to_string(),
        }
    }
}

/// Logflare implementation of [`LogSink`].
///
/// Each delivered batch becomes a single `POST` with a
/// `{"batch": [...]}` envelope, authenticated with the `X-API-KEY` header.
#[derive(Clone)]
pub struct LogflareSink {
    client: Client,
    url: String,
    api_key: String,
}

impl LogflareSink {
    /// Construct a new sink from the provided configuration.
    ///
    /// **Parameters**
    /// - `config`: [`LogflareConfig`] with the API key, the target source
    ///   and the ingestion endpoint.
    /// - `http`: optional pre-built HTTP client (timeouts, proxies, test
    ///   transports). A default client is built when `None`.
    ///
    /// **Returns**
    /// - A ready-to-use [`LogflareSink`].
    /// - `Err(ConfigError)` if the source is missing or ambiguous, or if the
    ///   endpoint is not an absolute URL.
    pub fn new(config: LogflareConfig, http: Option<Client>) -> Result<Self, ConfigError> {
        let query = match (&config.source_id, &config.source_name) {
            (Some(id), None) => format!("source={}", urlencoding::encode(id)),
            (None, Some(name)) => format!("source_name={}", urlencoding::encode(name)),
            (Some(_), Some(_)) => return Err(ConfigError::ConflictingSource),
            (None, None) => return Err(ConfigError::MissingSource),
        };

        if config.api_key.is_empty() {
            return Err(ConfigError::MissingApiKey);
        }

        let endpoint = reqwest::Url::parse(&config.endpoint)
            .map_err(|e| ConfigError::InvalidEndpoint(format!("{}: {}", config.endpoint, e)))?;
        if endpoint.query().is_some() {
            return Err(ConfigError::InvalidEndpoint(format!(
                "{}: endpoint must not carry a query",
                config.endpoint
            )));
        }

        Ok(Self {
            client: http.unwrap_or_default(),
            url: format!("{}?{}", endpoint, query),
            api_key: config.api_key,
        })
    }

    /// Full ingestion URL, including the source query parameter.
    pub fn url(&self) -> &str {
        &self.url
    }
}

#[derive(Serialize)]
struct Payload<'a> {
    batch: Vec<Entry<'a>>,
}

#[derive(Serialize)]
struct Entry<'a> {
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    level: Option<&'a str>,
    metadata: &'a BTreeMap<String, serde_json::Value>,
}

impl<'a> Entry<'a> {
    fn from_record(record: &'a LogRecord) -> Self {
        Entry {
            message: display_message(record),
            level: record.level.as_deref(),
            metadata: &record.metadata,
        }
    }
}

/// `"<LEVEL>: <message>"` when the record has a level, the bare message
/// otherwise.
pub fn display_message(record: &LogRecord) -> String {
    match &record.level {
        Some(level) => format!("{}: {}", level.to_uppercase(), record.message),
        None => record.message.clone(),
    }
}

#[async_trait]
impl LogSink for LogflareSink {
    async fn deliver(&self, batch: Batch) -> Result<(), DeliveryError> {
        let payload = Payload {
            batch: batch.iter().map(Entry::from_record).collect(),
        };
        let body = serde_json::to_vec(&payload)?;

        debug!(records = batch.len(), bytes = body.len(), "posting batch to logflare");
        let resp = self
            .client
            .post(&self.url)
            .header(CONTENT_TYPE, "application/json")
            .header("X-API-KEY", &self.api_key)
            .body(body)
            .send()
            .await?;

        let status = resp.status();
        if status == StatusCode::OK {
            Ok(())
        } else {
            let text = resp.text().await.unwrap_or_else(|_| "<no body>".to_string());
            Err(DeliveryError::status(status.as_u16(), text))
        }
    }
}
