use serde::Serialize;
use std::collections::BTreeMap;

/// Normalized unit of log data, ready for batching.
///
/// `level` and `message` are kept apart so each destination decides how
/// to display them.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogRecord {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,
    pub metadata: BTreeMap<String, serde_json::Value>,
}

/// Ordered group of records detached from the client buffer by one flush.
pub type Batch = Vec<LogRecord>;

impl LogRecord {
    pub fn new(message: impl Into<String>) -> Self {
        LogRecord {
            message: message.into(),
            level: None,
            metadata: BTreeMap::new(),
        }
    }

    pub fn with_level(mut self, level: impl Into<String>) -> Self {
        self.level = Some(level.into());
        self
    }

    pub fn with_metadata(mut self, metadata: BTreeMap<String, serde_json::Value>) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}
