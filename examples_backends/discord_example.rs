use std::sync::Arc;
use tokio::time::{sleep, Duration};
use tracing::{info, warn};

use flare_log_sink::client::{BatchClient, BatchConfig};
use flare_log_sink::discord::{DiscordConfig, DiscordSink};
use flare_log_sink::env::{env_var, DISCORD_WEBHOOK_URL_ENV};
use flare_log_sink::init::init_tracing;

#[tokio::main]
async fn main() {
    let url = env_var(DISCORD_WEBHOOK_URL_ENV).expect("DISCORD_WEBHOOK_URL must be set");
    let sink = DiscordSink::new(DiscordConfig::new(url, "example"), None).expect("discord sink");

    let (client, tasks) = BatchClient::new(
        Arc::new(sink),
        BatchConfig {
            flush_period: Duration::from_secs(1),
            flush_size: 5,
            queue_capacity: 64,
        },
    );
    init_tracing(&client).expect("install tracing subscriber");

    info!("starting service");
    for i in 0..5 {
        warn!(count = i, user_id = 42, "authentication failed");
        sleep(Duration::from_millis(500)).await;
    }

    client.shutdown(tasks).await.expect("final flush");
}
