use crate::error::DeliveryError;
use crate::record::Batch;
use crate::sink::LogSink;
use async_trait::async_trait;

/// A sink that simply drops all batches.
///
/// Useful for measuring the overhead of the client itself without any
/// external I/O, and for tests that don't care about delivery.
#[derive(Clone, Default)]
pub struct NoopSink;

#[async_trait]
impl LogSink for NoopSink {
    async fn deliver(&self, _batch: Batch) -> Result<(), DeliveryError> {
        Ok(())
    }
}
