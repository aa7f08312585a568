use crate::client::BatchClient;
use crate::record::LogRecord;
use chrono::Utc;
use std::collections::BTreeMap;
use std::sync::{atomic::{AtomicU64, Ordering}, Arc};
use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::layer::{Context, Layer};
use tracing_subscriber::registry::LookupSpan;

/// `tracing_subscriber` layer that turns events into [`LogRecord`]s and
/// appends them to a [`BatchClient`].
///
/// The event's `message` field becomes the record message and its level
/// the record level. Every other field lands in the metadata together with
/// `target` and an RFC 3339 `timestamp`. Filtering is left to per-layer
/// filters.
pub struct RecordLayer {
    client: BatchClient,
    /// Total events seen by the layer.
    pub total_events: Arc<AtomicU64>,
}

impl RecordLayer {
    pub fn new(client: BatchClient) -> Self {
        Self {
            client,
            total_events: Arc::new(AtomicU64::new(0)),
        }
    }
}

impl<S> Layer<S> for RecordLayer
where
    S: Subscriber + for<'span> LookupSpan<'span>,
{
    fn on_event(&self, event: &Event, _ctx: Context<'_, S>) {
        self.total_events.fetch_add(1, Ordering::Relaxed);

        let mut fields = BTreeMap::new();
        let mut message: Option<String> = None;

        let mut visitor = FieldVisitor { fields: &mut fields, message: &mut message };
        event.record(&mut visitor);

        let meta = event.metadata();
        fields.insert("target".to_string(), serde_json::Value::from(meta.target()));
        fields.insert("timestamp".to_string(), serde_json::Value::from(Utc::now().to_rfc3339()));

        let record = LogRecord {
            message: message.unwrap_or_default(),
            level: Some(meta.level().to_string()),
            metadata: fields,
        };
        self.client.add_log(record);
    }
}

pub struct FieldVisitor<'a> {
    pub fields: &'a mut BTreeMap<String, serde_json::Value>,
    pub message: &'a mut Option<String>,
}

impl<'a> Visit for FieldVisitor<'a> {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            *self.message = Some(value.to_string());
        } else {
            self.fields.insert(field.name().to_string(), serde_json::Value::String(value.to_string()));
        }
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.fields.insert(field.name().to_string(), serde_json::Value::from(value));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.fields.insert(field.name().to_string(), serde_json::Value::from(value));
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        self.fields.insert(field.name().to_string(), serde_json::Value::from(value));
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.fields.insert(field.name().to_string(), serde_json::Value::from(value));
    }

    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            *self.message = Some(format!("{:?}", value));
        } else {
            self.fields.insert(field.name().to_string(), serde_json::Value::String(format!("{:?}", value)));
        }
    }
}
