use std::sync::Arc;
use std::time::Instant;
use tokio::time::Duration;

use flare_log_sink::client::{BatchClient, BatchConfig};
use flare_log_sink::record::LogRecord;
use flare_log_sink::noop_sink::NoopSink;

/// Drives the client directly from several producer tasks, bypassing
/// `tracing` formatting.
#[tokio::main]
async fn main() {
    let sink = Arc::new(NoopSink::default());

    let batch_config = BatchConfig {
        flush_period: Duration::from_millis(200),
        flush_size: 1_000,
        queue_capacity: 256,
    };
    let (client, tasks) = BatchClient::new(sink, batch_config);

    let producers: u64 = 8;
    let per_producer: u64 = 100_000;
    let start = Instant::now();

    let mut handles = Vec::new();
    for p in 0..producers {
        let client = client.clone();
        handles.push(tokio::spawn(async move {
            for i in 0..per_producer {
                client.add_log(
                    LogRecord::new("custom load test error")
                        .with_level("error")
                        .with_field("producer", p)
                        .with_field("iteration", i),
                );
            }
        }));
    }
    for handle in handles {
        handle.await.expect("producer task");
    }

    let n = producers * per_producer;
    let elapsed = start.elapsed();
    println!("custom config: added {} records in {:?} (~{:.0} rec/s)",
        n,
        elapsed,
        n as f64 / elapsed.as_secs_f64()
    );

    client.shutdown(tasks).await.expect("final flush");
    println!("dropped batches (queue full): {}", client.dropped_batches());
}
