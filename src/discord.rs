use crate::error::{ConfigError, DeliveryError};
use crate::record::{Batch, LogRecord};
use crate::sink::LogSink;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures_util::stream::{self, TryStreamExt};
use reqwest::{Client, StatusCode};
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

/// Number of webhook requests allowed in flight during one delivery.
pub const DEFAULT_CONCURRENCY: usize = 4;

/// Configuration for [`DiscordSink`].
#[derive(Clone, Debug)]
pub struct DiscordConfig {
    /// Full webhook URL, e.g. "https://discord.com/api/webhooks/<id>/<token>"
    pub webhook_url: String,
    /// Name the messages are posted under.
    pub username: String,
    /// Upper bound on concurrent webhook requests per delivery.
    pub concurrency: usize,
}

impl DiscordConfig {
    pub fn new(webhook_url: impl Into<String>, username: impl Into<String>) -> Self {
        DiscordConfig {
            webhook_url: webhook_url.into(),
            username: username.into(),
            concurrency: DEFAULT_CONCURRENCY,
        }
    }
}

/// Discord webhook implementation of [`LogSink`].
///
/// Batching happens only in the client buffer: every record of a batch
/// is posted as its own webhook message. Requests run with bounded
/// concurrency and the first failure stops the remaining sends of that
/// batch. Records posted before the failure stay posted.
#[derive(Clone)]
pub struct DiscordSink {
    client: Client,
    webhook_url: String,
    username: String,
    concurrency: usize,
}

impl DiscordSink {
    pub fn new(config: DiscordConfig, http: Option<Client>) -> Result<Self, ConfigError> {
        if config.webhook_url.is_empty() {
            return Err(ConfigError::MissingWebhookUrl);
        }
        reqwest::Url::parse(&config.webhook_url)
            .map_err(|e| ConfigError::InvalidEndpoint(format!("{}: {}", config.webhook_url, e)))?;

        Ok(Self {
            client: http.unwrap_or_default(),
            webhook_url: config.webhook_url,
            username: config.username,
            concurrency: config.concurrency.max(1),
        })
    }

    fn map_record(&self, record: &LogRecord) -> WebhookMessage {
        let mut embed = Embed {
            title: Some(record.level.clone().unwrap_or_else(|| "metadata".to_string())),
            ..Embed::default()
        };
        let mut fields = Vec::new();

        for (key, value) in &record.metadata {
            if key == "time" || key == "timestamp" {
                if let Some(ts) = parse_timestamp(value) {
                    embed.timestamp = Some(ts);
                    continue;
                }
            }
            fields.push(EmbedField {
                name: key.clone(),
                value: field_value(value),
                inline: true,
            });
        }
        embed.fields = (!fields.is_empty()).then_some(fields);

        WebhookMessage {
            username: Some(self.username.clone()),
            avatar_url: None,
            content: Some(record.message.clone()),
            embeds: Some(vec![embed]),
        }
    }

    async fn post(&self, record: LogRecord) -> Result<(), DeliveryError> {
        let body = serde_json::to_vec(&self.map_record(&record))?;
        let resp = self
            .client
            .post(&self.webhook_url)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await?;

        match resp.status() {
            StatusCode::OK | StatusCode::NO_CONTENT => Ok(()),
            status => {
                let text = resp.text().await.unwrap_or_else(|_| "<no body>".to_string());
                Err(DeliveryError::status(status.as_u16(), text))
            }
        }
    }
}

fn parse_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    let raw = value.as_str()?;
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|ts| ts.with_timezone(&Utc))
}

fn field_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[async_trait]
impl LogSink for DiscordSink {
    async fn deliver(&self, batch: Batch) -> Result<(), DeliveryError> {
        debug!(records = batch.len(), "posting batch to discord webhook");
        stream::iter(batch.into_iter().map(Ok::<_, DeliveryError>))
            .try_for_each_concurrent(self.concurrency, |record| self.post(record))
            .await
    }
}

/// Webhook execute payload. Absent fields are left out of the JSON body.
#[derive(Debug, Default, Serialize)]
pub struct WebhookMessage {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub embeds: Option<Vec<Embed>>,
}

#[derive(Debug, Default, Serialize)]
pub struct Embed {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<Vec<EmbedField>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
pub struct EmbedField {
    pub name: String,
    pub value: String,
    pub inline: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sink() -> DiscordSink {
        DiscordSink::new(DiscordConfig::new("https://discord.invalid/api/webhooks/1/t", "test"), None).unwrap()
    }

    #[test]
    fn record_maps_to_message_with_embed() {
        let record = LogRecord::new("hello world")
            .with_level("info")
            .with_field("count", 3)
            .with_field("user", "ana")
            .with_field("time", "2024-05-01T10:00:00Z");

        let body = serde_json::to_value(sink().map_record(&record)).unwrap();

        assert_eq!(
            body,
            json!({
                "username": "test",
                "content": "hello world",
                "embeds": [{
                    "title": "info",
                    "fields": [
                        {"name": "count", "value": "3", "inline": true},
                        {"name": "user", "value": "ana", "inline": true},
                    ],
                    "timestamp": "2024-05-01T10:00:00Z",
                }],
            })
        );
    }

    #[test]
    fn missing_level_uses_metadata_title() {
        let message = sink().map_record(&LogRecord::new("x"));
        let embeds = message.embeds.unwrap();
        assert_eq!(embeds[0].title.as_deref(), Some("metadata"));
        assert!(embeds[0].timestamp.is_none());
    }

    #[test]
    fn record_without_metadata_has_no_fields() {
        let record = LogRecord::new("x").with_level("warn");
        let body = serde_json::to_value(sink().map_record(&record)).unwrap();
        assert!(body["embeds"][0].get("fields").is_none());

        let record = LogRecord::new("x").with_field("time", "2024-05-01T10:00:00Z");
        let body = serde_json::to_value(sink().map_record(&record)).unwrap();
        assert!(body["embeds"][0].get("fields").is_none());
        assert!(body["embeds"][0].get("timestamp").is_some());
    }

    #[test]
    fn unparseable_timestamp_stays_a_field() {
        let record = LogRecord::new("x").with_field("timestamp", "yesterday");
        let message = sink().map_record(&record);
        let embeds = message.embeds.unwrap();
        let embed = &embeds[0];
        assert!(embed.timestamp.is_none());
        let fields = embed.fields.as_ref().unwrap();
        assert_eq!(fields[0].name, "timestamp");
        assert_eq!(fields[0].value, "yesterday");
    }

    #[test]
    fn empty_webhook_url_is_rejected() {
        let err = DiscordSink::new(DiscordConfig::new("", "test"), None).err().unwrap();
        assert!(matches!(err, ConfigError::MissingWebhookUrl));
    }
}
