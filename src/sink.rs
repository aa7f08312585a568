use crate::error::DeliveryError;
use crate::record::Batch;
use async_trait::async_trait;

/// Asynchronous destination for batches produced by the
/// [`BatchClient`](crate::client::BatchClient).
///
/// Implementations serialize a batch and transport it to a concrete
/// backend (Logflare, a Discord webhook, stdout, etc). The client calls
/// `deliver` from its background delivery task, one batch at a time and
/// in the order the batches were detached.
#[async_trait]
pub trait LogSink: Send + Sync {
    /// Deliver one batch to the underlying backend.
    ///
    /// **Parameters**
    /// - `batch`: records detached from the client buffer, in insertion
    ///   order. Never empty.
    ///
    /// **Returns**
    /// - `Ok(())` if the backend accepted the whole batch.
    /// - `Err(..)` on network failure, non-success status or
    ///   serialization failure. The client logs the error and drops the
    ///   batch; it is never retried. Records of the batch may already have
    ///   been accepted when an error is returned.
    async fn deliver(&self, batch: Batch) -> Result<(), DeliveryError>;
}
