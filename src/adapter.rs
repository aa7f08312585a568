use crate::error::ParseError;
use crate::record::LogRecord;
use serde_json::Value;

/// Names of the level and message keys in a structured log line.
///
/// Presets cover the JSON output of common logging frameworks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldKeys {
    pub level: &'static str,
    pub message: &'static str,
}

impl FieldKeys {
    /// Go `log/slog` JSON handler output.
    pub const SLOG: FieldKeys = FieldKeys { level: "level", message: "msg" };

    /// `zerolog` output.
    pub const ZEROLOG: FieldKeys = FieldKeys { level: "level", message: "message" };

    /// `tracing-subscriber` JSON formatter with `flatten_event(true)`.
    pub const TRACING_JSON: FieldKeys = FieldKeys { level: "level", message: "message" };

    pub fn adapt(&self, raw: &[u8]) -> Result<LogRecord, ParseError> {
        adapt(raw, self.level, self.message)
    }
}

/// Convert one JSON log line into a [`LogRecord`].
///
/// The level and message are pulled out by key name and removed from the
/// object; every remaining entry becomes metadata. A missing level leaves
/// `level` unset and a missing message yields an empty message, but a key
/// that is present with a non-string value is rejected.
pub fn adapt(raw: &[u8], level_key: &str, message_key: &str) -> Result<LogRecord, ParseError> {
    let mut object = match serde_json::from_slice::<Value>(raw)? {
        Value::Object(object) => object,
        _ => return Err(ParseError::NotAnObject),
    };

    let level = take_string(&mut object, level_key)?;
    let message = take_string(&mut object, message_key)?.unwrap_or_default();

    Ok(LogRecord {
        message,
        level,
        metadata: object.into_iter().collect(),
    })
}

fn take_string(
    object: &mut serde_json::Map<String, Value>,
    key: &str,
) -> Result<Option<String>, ParseError> {
    match object.remove(key) {
        None => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(other) => Err(ParseError::FieldType {
            field: key.to_string(),
            found: json_type_name(&other),
        }),
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn extracts_level_message_and_metadata() {
        let record = FieldKeys::ZEROLOG
            .adapt(br#"{"level":"info","message":"hello","count":1,"key":"value"}"#)
            .unwrap();

        assert_eq!(record.level.as_deref(), Some("info"));
        assert_eq!(record.message, "hello");
        assert_eq!(record.metadata.len(), 2);
        assert_eq!(record.metadata["count"], json!(1));
        assert_eq!(record.metadata["key"], json!("value"));
    }

    #[test]
    fn slog_uses_msg_key() {
        let record = FieldKeys::SLOG
            .adapt(br#"{"level":"INFO","msg":"hello slog","time":"2024-01-01T00:00:00Z"}"#)
            .unwrap();

        assert_eq!(record.message, "hello slog");
        assert!(!record.metadata.contains_key("msg"));
        assert!(record.metadata.contains_key("time"));
    }

    #[test]
    fn metadata_round_trips_through_serialized_record() {
        let original = LogRecord::new("ignored").with_field("nested", json!({"a": [1, 2]}));
        let mut line = serde_json::to_value(&original.metadata).unwrap();
        line["lvl"] = json!("debug");
        line["text"] = json!("round trip");
        let raw = serde_json::to_vec(&line).unwrap();

        let record = adapt(&raw, "lvl", "text").unwrap();

        assert_eq!(record.metadata, original.metadata);
        assert_eq!(record.level.as_deref(), Some("debug"));
        assert_eq!(record.message, "round trip");
    }

    #[test]
    fn missing_fields_are_tolerated() {
        let record = adapt(br#"{"other":true}"#, "level", "message").unwrap();
        assert_eq!(record.level, None);
        assert_eq!(record.message, "");
        assert_eq!(record.metadata["other"], json!(true));
    }

    #[test]
    fn numeric_level_is_rejected() {
        let err = adapt(br#"{"level": 1, "message": "x"}"#, "level", "message").unwrap_err();
        match err {
            ParseError::FieldType { field, found } => {
                assert_eq!(field, "level");
                assert_eq!(found, "number");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn non_string_message_is_rejected() {
        let err = adapt(br#"{"level":"info","message":{"a":1}}"#, "level", "message").unwrap_err();
        assert!(matches!(err, ParseError::FieldType { found: "object", .. }));
    }

    #[test]
    fn malformed_input_is_a_parse_error() {
        assert!(matches!(adapt(b"not json", "level", "message"), Err(ParseError::Json(_))));
        assert!(matches!(adapt(b"[1,2]", "level", "message"), Err(ParseError::NotAnObject)));
    }
}
