use std::sync::Arc;

use async_trait::async_trait;
use tracing::{error, info};
use flare_log_sink::{
    client::{BatchClient, BatchConfig},
    error::DeliveryError,
    init::init_tracing,
    record::Batch,
    sink::LogSink,
};

/// Example of integrating a completely custom destination by implementing
/// the `LogSink` trait directly. Imagine this talks to some proprietary
/// log store for which this crate does not provide a built-in sink.
struct MyCustomStoreSink;

#[async_trait]
impl LogSink for MyCustomStoreSink {
    async fn deliver(&self, batch: Batch) -> Result<(), DeliveryError> {
        // Here you would call your own client library for the target store.
        // For the sake of example we just print the batch.
        println!("[my-custom-store] {} records", batch.len());
        for record in batch {
            println!("[my-custom-store] {:?}", record);
        }
        Ok(())
    }
}

#[tokio::main]
async fn main() {
    let sink: Arc<dyn LogSink> = Arc::new(MyCustomStoreSink);
    let (client, tasks) = BatchClient::new(sink, BatchConfig::default());

    init_tracing(&client).expect("install tracing subscriber");

    info!("custom backend example started");
    error!(store = "my-custom-store", "simulated error sent via custom backend");

    client.shutdown(tasks).await.expect("final flush");
}
