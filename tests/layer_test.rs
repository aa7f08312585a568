mod common;

use common::RecordingSink;
use flare_log_sink::client::{BatchClient, BatchConfig};
use flare_log_sink::layer::RecordLayer;
use serde_json::json;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::Registry;

#[tokio::test]
async fn events_become_records_with_typed_metadata() {
    let sink = Arc::new(RecordingSink::default());
    let (client, tasks) = BatchClient::new(
        sink.clone(),
        BatchConfig {
            flush_period: Duration::from_secs(3600),
            flush_size: 0,
            queue_capacity: 64,
        },
    );

    let layer = RecordLayer::new(client.clone());
    let total = layer.total_events.clone();
    let subscriber = Registry::default().with(layer);

    tracing::subscriber::with_default(subscriber, || {
        tracing::info!(count = 2, ok = true, ratio = 0.5, user = "ana", "hello {}", "x");
        tracing::debug!(reason = ?Some(3), "second");
    });

    client.shutdown(tasks).await.unwrap();
    assert_eq!(total.load(Ordering::Relaxed), 2);

    let batches = sink.batches();
    let records = &batches[0];
    assert_eq!(records.len(), 2);

    let first = &records[0];
    assert_eq!(first.message, "hello x");
    assert_eq!(first.level.as_deref(), Some("INFO"));
    assert_eq!(first.metadata["count"], json!(2));
    assert_eq!(first.metadata["ok"], json!(true));
    assert_eq!(first.metadata["ratio"], json!(0.5));
    assert_eq!(first.metadata["user"], json!("ana"));
    assert_eq!(first.metadata["target"], json!("layer_test"));
    assert!(!first.metadata.contains_key("message"));

    let second = &records[1];
    assert_eq!(second.level.as_deref(), Some("DEBUG"));
    assert_eq!(second.metadata["reason"], json!("Some(3)"));
}
