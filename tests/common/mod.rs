#![allow(dead_code)]

use async_trait::async_trait;
use flare_log_sink::error::DeliveryError;
use flare_log_sink::record::{Batch, LogRecord};
use flare_log_sink::sink::LogSink;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use tokio::sync::{Notify, Semaphore};

/// In-memory sink that records every batch it is asked to deliver.
#[derive(Default)]
pub struct RecordingSink {
    batches: Mutex<Vec<Batch>>,
    failures: AtomicUsize,
    gate: Option<Gate>,
}

/// Holds deliveries until the test releases them.
pub struct Gate {
    pub started: Notify,
    pub release: Semaphore,
}

impl RecordingSink {
    /// Sink whose first `n` deliveries fail.
    pub fn failing(n: usize) -> Self {
        RecordingSink {
            failures: AtomicUsize::new(n),
            ..Default::default()
        }
    }

    /// Sink that blocks every delivery until a permit is released.
    pub fn gated() -> Self {
        RecordingSink {
            gate: Some(Gate {
                started: Notify::new(),
                release: Semaphore::new(0),
            }),
            ..Default::default()
        }
    }

    pub fn gate(&self) -> &Gate {
        self.gate.as_ref().expect("sink is not gated")
    }

    pub fn batches(&self) -> Vec<Batch> {
        self.batches.lock().unwrap().clone()
    }

    pub fn messages(&self) -> Vec<String> {
        self.batches()
            .into_iter()
            .flatten()
            .map(|r| r.message)
            .collect()
    }

    /// Poll until at least `n` batches arrived or the (virtual) deadline
    /// passes.
    pub async fn wait_for_batches(&self, n: usize) -> Vec<Batch> {
        for _ in 0..200 {
            if self.batches.lock().unwrap().len() >= n {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        self.batches()
    }
}

#[async_trait]
impl LogSink for RecordingSink {
    async fn deliver(&self, batch: Batch) -> Result<(), DeliveryError> {
        if batch.iter().any(|r| r.message == "panic") {
            panic!("sink asked to panic");
        }
        self.batches.lock().unwrap().push(batch);

        if let Some(gate) = &self.gate {
            gate.started.notify_one();
            gate.release.acquire().await.unwrap().forget();
        }

        let failed = self
            .failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failed {
            Err(DeliveryError::Other("boom".to_string()))
        } else {
            Ok(())
        }
    }
}

pub fn record(message: impl Into<String>) -> LogRecord {
    LogRecord::new(message)
}
