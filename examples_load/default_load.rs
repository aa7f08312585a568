use std::sync::Arc;
use std::time::Instant;
use tracing::error;

use flare_log_sink::client::{BatchClient, BatchConfig};
use flare_log_sink::init::init_tracing;
use flare_log_sink::noop_sink::NoopSink;

#[tokio::main]
async fn main() {
    let sink = Arc::new(NoopSink::default());
    let (client, tasks) = BatchClient::new(sink, BatchConfig::default());
    init_tracing(&client).expect("install tracing subscriber");

    let n: u64 = 100_000;
    let start = Instant::now();

    for i in 0..n {
        error!(iteration = i, "default load test error");
    }

    let elapsed = start.elapsed();
    println!("default config: shipped {} events in {:?} (~{:.0} ev/s)",
        n,
        elapsed,
        n as f64 / elapsed.as_secs_f64()
    );

    client.shutdown(tasks).await.expect("final flush");
}
