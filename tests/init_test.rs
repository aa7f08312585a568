mod common;

use common::RecordingSink;
use flare_log_sink::client::{BatchClient, BatchConfig};
use flare_log_sink::init::{init_tracing, init_tracing_with_config, InitConfig};
use std::sync::Arc;
use std::time::Duration;
use tracing::level_filters::LevelFilter;

#[tokio::test]
async fn global_subscriber_ships_events_above_max_level() {
    let sink = Arc::new(RecordingSink::default());
    let (client, tasks) = BatchClient::new(
        sink.clone(),
        BatchConfig {
            flush_period: Duration::from_secs(3600),
            flush_size: 0,
            queue_capacity: 64,
        },
    );

    init_tracing_with_config(
        &client,
        InitConfig {
            max_level: LevelFilter::WARN,
            enable_stdout: false,
            ..InitConfig::default()
        },
    )
    .unwrap();

    tracing::info!("not shipped");
    tracing::error!(order_id = 7, "payment declined");

    // A second global subscriber is refused instead of panicking.
    assert!(init_tracing(&client).is_err());

    client.shutdown(tasks).await.unwrap();
    let batches = sink.batches();
    assert_eq!(batches.len(), 1);
    assert_eq!(batches[0].len(), 1);
    let record = &batches[0][0];
    assert_eq!(record.message, "payment declined");
    assert_eq!(record.level.as_deref(), Some("ERROR"));
    assert_eq!(record.metadata["order_id"], serde_json::json!(7));
    assert_eq!(record.metadata["target"], serde_json::json!("init_test"));
    assert!(record.metadata.contains_key("timestamp"));
}
