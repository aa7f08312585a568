use crate::error::DeliveryError;
use crate::record::{Batch, LogRecord};
use crate::sink::LogSink;
use std::mem;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::mpsc::OwnedPermit;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Duration, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error};

const MIN_FLUSH_PERIOD: Duration = Duration::from_millis(10);

/// Flush triggers of a [`BatchClient`].
///
/// **Fields**
/// - `flush_period`: interval of the background flush, regardless of how
///   many records are buffered. Clamped to at least 10ms.
/// - `flush_size`: number of buffered records that triggers a flush from
///   [`BatchClient::add_log`]. `0` disables size-triggered flushes.
/// - `queue_capacity`: number of detached batches that may wait for the
///   delivery worker. Clamped to at least 1. When the queue is full,
///   size-triggered batches are dropped and counted in
///   [`BatchClient::dropped_batches`]; [`BatchClient::flush`] waits for a
///   free slot instead.
#[derive(Clone, Debug)]
pub struct BatchConfig {
    pub flush_period: Duration,
    pub flush_size: usize,
    pub queue_capacity: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            flush_period: Duration::from_secs(1),
            flush_size: 128,
            queue_capacity: 64,
        }
    }
}

/// A detached batch on its way to the sink. `reply` is set when a caller
/// waits for the delivery result.
struct Delivery {
    batch: Batch,
    reply: Option<oneshot::Sender<Result<(), DeliveryError>>>,
}

struct State {
    buffer: Batch,
    /// `None` once the client is shut down.
    queue: Option<mpsc::Sender<Delivery>>,
}

struct Shared {
    state: Mutex<State>,
    flush_size: usize,
    dropped_batches: AtomicU64,
}

impl Shared {
    // The buffer is never left half-updated, so a poisoned lock is still
    // safe to use.
    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Buffers [`LogRecord`]s in memory and ships them to a [`LogSink`] in
/// batches, either every `flush_period` or as soon as `flush_size` records
/// are buffered.
///
/// Appending, the size check and detaching a batch all happen under one
/// lock, and detached batches are queued to a single delivery task in the
/// order they were detached. The lock is never held while a batch is being
/// delivered, so slow destinations don't block callers of
/// [`add_log`](Self::add_log). The queue is bounded by
/// [`BatchConfig::queue_capacity`], so a stalled sink costs at most that
/// many batches of memory.
///
/// Cloning is cheap; all clones share the same buffer.
#[derive(Clone)]
pub struct BatchClient {
    shared: Arc<Shared>,
}

/// Background tasks owned by a [`BatchClient`]: the periodic flush ticker
/// and the delivery worker. Pass them to [`BatchClient::shutdown`] for an
/// orderly stop.
pub struct FlushTasks {
    cancel: CancellationToken,
    ticker: JoinHandle<()>,
    worker: JoinHandle<()>,
}

impl BatchClient {
    /// Create a new client and spawn its background tasks on the current
    /// Tokio runtime.
    ///
    /// The ticker stops when [`shutdown`](Self::shutdown) is called or
    /// when every clone of the client has been dropped.
    pub fn new(sink: Arc<dyn LogSink>, config: BatchConfig) -> (Self, FlushTasks) {
        let flush_period = config.flush_period.max(MIN_FLUSH_PERIOD);
        let queue_capacity = config.queue_capacity.max(1);
        let (tx, rx) = mpsc::channel(queue_capacity);

        let shared = Arc::new(Shared {
            state: Mutex::new(State {
                buffer: Vec::new(),
                queue: Some(tx),
            }),
            flush_size: config.flush_size,
            dropped_batches: AtomicU64::new(0),
        });

        let cancel = CancellationToken::new();
        let worker = tokio::spawn(run_worker(sink, rx));
        let ticker = tokio::spawn(run_ticker(
            Arc::downgrade(&shared),
            flush_period,
            cancel.clone(),
        ));

        debug!(
            flush_period_ms = flush_period.as_millis() as u64,
            flush_size = config.flush_size,
            queue_capacity,
            "log batch client started"
        );

        (
            Self { shared },
            FlushTasks {
                cancel,
                ticker,
                worker,
            },
        )
    }

    /// Append a record to the current batch.
    ///
    /// Never blocks and never fails. When the buffer reaches `flush_size`
    /// it is detached and queued for delivery before this call returns, so
    /// the buffer never holds `flush_size` records or more afterwards. If
    /// the delivery queue is full the detached batch is dropped and
    /// counted. Errors of that delivery are logged. Records added after
    /// [`shutdown`](Self::shutdown) are dropped.
    pub fn add_log(&self, record: LogRecord) {
        // Nothing is logged under the lock: a record writer may feed this
        // crate's own events back into `add_log`.
        let failed = {
            let mut guard = self.shared.lock();
            let state = &mut *guard;
            let Some(queue) = state.queue.as_ref() else {
                return;
            };

            state.buffer.push(record);
            let flush_size = self.shared.flush_size;
            if flush_size == 0 || state.buffer.len() < flush_size {
                return;
            }

            let batch = mem::take(&mut state.buffer);
            let records = batch.len();
            match queue.try_send(Delivery { batch, reply: None }) {
                Ok(()) => None,
                Err(TrySendError::Full(_)) => {
                    self.shared.dropped_batches.fetch_add(1, Ordering::Relaxed);
                    Some((records, DeliveryError::QueueFull))
                }
                Err(TrySendError::Closed(_)) => Some((records, DeliveryError::Worker)),
            }
        };

        if let Some((records, e)) = failed {
            error!(records, error = %e, "error queueing log batch, batch dropped");
        }
    }

    /// Detach the current batch and deliver it, returning the sink's
    /// result.
    ///
    /// An empty buffer is a no-op. Waits for a free queue slot when the
    /// delivery queue is full. Records added while the delivery is in
    /// flight go into the next batch. A failed batch is dropped.
    pub async fn flush(&self) -> Result<(), DeliveryError> {
        let queue = {
            let state = self.shared.lock();
            if state.buffer.is_empty() {
                return Ok(());
            }
            state.queue.clone().ok_or(DeliveryError::Closed)?
        };
        let permit = reserve(queue).await?;

        // The batch is detached only once a slot is reserved, so batches
        // still enter the queue in detach order.
        let rx = {
            let mut state = self.shared.lock();
            send_detached(&mut state, permit)
        };
        match rx {
            Some(rx) => rx.await.map_err(|_| DeliveryError::Worker)?,
            None => Ok(()),
        }
    }

    /// Number of records currently buffered.
    pub fn buffered(&self) -> usize {
        self.shared.lock().buffer.len()
    }

    /// Number of size-triggered batches dropped because the delivery queue
    /// was full.
    pub fn dropped_batches(&self) -> u64 {
        self.shared.dropped_batches.load(Ordering::Relaxed)
    }

    /// Stop the periodic flush, deliver whatever is still buffered and wait
    /// until every queued batch has been handed to the sink.
    ///
    /// Detaching the final batch and closing the client happen under one
    /// lock: a record is either part of the final batch or added after the
    /// close and dropped, never left behind in the buffer. Returns the
    /// result of the final flush.
    pub async fn shutdown(&self, tasks: FlushTasks) -> Result<(), DeliveryError> {
        tasks.cancel.cancel();
        if let Err(e) = tasks.ticker.await {
            error!(error = %e, "log flush ticker failed");
        }

        let result = self.close().await;

        if let Err(e) = tasks.worker.await {
            error!(error = %e, "log delivery worker failed");
        }
        debug!("log batch client stopped");
        result
    }

    async fn close(&self) -> Result<(), DeliveryError> {
        let Some(queue) = self.shared.lock().queue.clone() else {
            return Err(DeliveryError::Closed);
        };
        let permit = reserve(queue).await;

        let rx = {
            let mut state = self.shared.lock();
            let rx = match permit {
                Ok(permit) => Ok(send_detached(&mut state, permit)),
                Err(e) if state.buffer.is_empty() => {
                    debug!(error = %e, "log delivery worker already stopped");
                    Ok(None)
                }
                Err(e) => {
                    state.buffer.clear();
                    Err(e)
                }
            };
            state.queue = None;
            rx
        };
        match rx? {
            Some(rx) => rx.await.map_err(|_| DeliveryError::Worker)?,
            None => Ok(()),
        }
    }
}

async fn reserve(queue: mpsc::Sender<Delivery>) -> Result<OwnedPermit<Delivery>, DeliveryError> {
    queue.reserve_owned().await.map_err(|_| DeliveryError::Worker)
}

/// Detach the buffer into a reserved queue slot. Returns `None` when there
/// is nothing to send; the slot is released.
fn send_detached(
    state: &mut State,
    permit: OwnedPermit<Delivery>,
) -> Option<oneshot::Receiver<Result<(), DeliveryError>>> {
    if state.buffer.is_empty() {
        return None;
    }
    let (tx, rx) = oneshot::channel();
    permit.send(Delivery {
        batch: mem::take(&mut state.buffer),
        reply: Some(tx),
    });
    Some(rx)
}

async fn run_ticker(shared: Weak<Shared>, period: Duration, cancel: CancellationToken) {
    let mut interval = interval_at(Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = interval.tick() => {
                let Some(shared) = shared.upgrade() else { break };
                let client = BatchClient { shared };
                // Failures are already logged by the worker.
                if let Err(e) = client.flush().await {
                    debug!(error = %e, "periodic log flush failed");
                }
            }
        }
    }
}

async fn run_worker(sink: Arc<dyn LogSink>, mut rx: mpsc::Receiver<Delivery>) {
    while let Some(Delivery { batch, reply }) = rx.recv().await {
        let records = batch.len();
        let sink = Arc::clone(&sink);

        // Sink panics surface as delivery errors.
        let result = match tokio::spawn(async move { sink.deliver(batch).await }).await {
            Ok(result) => result,
            Err(e) => Err(DeliveryError::Other(format!("log sink panicked: {}", e))),
        };

        match &result {
            Ok(()) => debug!(records, "log batch delivered"),
            Err(e) => error!(records, error = %e, "error sending log batch, batch dropped"),
        }

        if let Some(reply) = reply {
            let _ = reply.send(result);
        }
    }
}
