use std::io;
use std::sync::Mutex;
use tokio::time::{sleep, Duration};

use flare_log_sink::adapter::FieldKeys;
use flare_log_sink::backend::{make_sink_from_config, Settings};
use flare_log_sink::client::BatchClient;
use flare_log_sink::writer::{MultiWriter, RecordWriter};

/// Ships JSON log lines to Logflare while echoing them to stdout.
///
/// Requires `LOGFLARE_API_KEY` and one of `LOGFLARE_SOURCE_ID` /
/// `LOGFLARE_SOURCE_NAME`.
#[tokio::main]
async fn main() {
    let settings = Settings::from_env().expect("logflare settings");
    let sink = make_sink_from_config(&settings.backend, None).expect("logflare sink");
    let (client, tasks) = BatchClient::new(sink, settings.batch);

    let writer = MultiWriter::new(vec![
        Box::new(RecordWriter::structured(client.clone(), FieldKeys::TRACING_JSON)),
        Box::new(io::stdout()),
    ]);
    tracing_subscriber::fmt()
        .json()
        .flatten_event(true)
        .with_writer(Mutex::new(writer))
        .init();

    for i in 0..5 {
        tracing::info!(count = i, "hello world");
        sleep(Duration::from_millis(500)).await;
    }

    client.shutdown(tasks).await.expect("final flush");
}
