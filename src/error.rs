//! Error types for configuration, record parsing and batch delivery.

/// Error returned when a sink or backend cannot be built from its
/// configuration. Always raised at construction time.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("either a source id or a source name must be configured")]
    MissingSource,

    #[error("source id and source name are mutually exclusive")]
    ConflictingSource,

    #[error("api key must not be empty")]
    MissingApiKey,

    #[error("webhook url must not be empty")]
    MissingWebhookUrl,

    #[error("invalid endpoint: {0}")]
    InvalidEndpoint(String),

    #[error("invalid value {value:?} for {key}")]
    InvalidValue { key: String, value: String },

    #[error("{0} feature is not enabled")]
    FeatureDisabled(&'static str),
}

/// Error returned by the record adapter when a log line cannot be
/// normalized into a [`LogRecord`](crate::record::LogRecord).
#[derive(thiserror::Error, Debug)]
pub enum ParseError {
    #[error("malformed log line: {0}")]
    Json(#[from] serde_json::Error),

    #[error("log line is not a JSON object")]
    NotAnObject,

    #[error("expected {field} to be a string, got {found}")]
    FieldType { field: String, found: &'static str },
}

/// Error returned when a batch could not be handed to its destination.
///
/// A batch that fails delivery is dropped; nothing is re-queued.
#[derive(thiserror::Error, Debug)]
pub enum DeliveryError {
    #[cfg(any(feature = "logflare", feature = "discord"))]
    #[error("error posting logs: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("error posting logs: status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("error serializing logs: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("log client is shut down")]
    Closed,

    #[error("delivery worker stopped before reporting a result")]
    Worker,

    #[error("delivery queue is full")]
    QueueFull,

    #[error("{0}")]
    Other(String),
}

impl DeliveryError {
    /// Build a [`DeliveryError::Status`] from a status code and the
    /// response body text.
    pub fn status(status: u16, body: impl Into<String>) -> Self {
        DeliveryError::Status {
            status,
            body: body.into(),
        }
    }
}
