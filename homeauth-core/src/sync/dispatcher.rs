use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{Semaphore, mpsc, oneshot};
use tokio::task::{JoinHandle, JoinSet};
use tracing::{debug, info, warn};
use zeroize::Zeroizing;

use super::{PasswordCipher, PasswordSyncSink, SyncPayload};

/// Tuning for the background sync worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatcherSettings {
    /// Jobs buffered before new ones are dropped.
    pub queue_capacity: usize,
    /// Deliveries running at the same time.
    pub max_in_flight: usize,
    /// Upper bound on a single delivery attempt.
    pub delivery_timeout: Duration,
}

impl Default for DispatcherSettings {
    fn default() -> Self {
        Self {
            queue_capacity: 64,
            max_in_flight: 4,
            delivery_timeout: Duration::from_secs(10),
        }
    }
}

/// A self-service password change waiting to be forwarded.
pub struct PasswordSyncJob {
    pub username: String,
    pub current_password: Zeroizing<String>,
    pub new_password: Zeroizing<String>,
}

impl PasswordSyncJob {
    pub fn new(
        username: impl Into<String>,
        current_password: &str,
        new_password: &str,
    ) -> Self {
        Self {
            username: username.into(),
            current_password: Zeroizing::new(current_password.to_owned()),
            new_password: Zeroizing::new(new_password.to_owned()),
        }
    }
}

impl fmt::Debug for PasswordSyncJob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PasswordSyncJob")
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

/// Point-in-time delivery counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncStats {
    pub enqueued: u64,
    pub delivered: u64,
    pub failed: u64,
    pub timed_out: u64,
    pub dropped: u64,
}

#[derive(Debug, Default)]
struct Counters {
    enqueued: AtomicU64,
    delivered: AtomicU64,
    failed: AtomicU64,
    timed_out: AtomicU64,
    dropped: AtomicU64,
}

impl Counters {
    fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    fn snapshot(&self) -> SyncStats {
        SyncStats {
            enqueued: self.enqueued.load(Ordering::Relaxed),
            delivered: self.delivered.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            timed_out: self.timed_out.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
        }
    }
}

/// Cloneable producer side of the sync queue.
#[derive(Debug, Clone)]
pub struct SyncQueue {
    sender: mpsc::Sender<PasswordSyncJob>,
    counters: Arc<Counters>,
}

impl SyncQueue {
    fn channel(capacity: usize) -> (Self, mpsc::Receiver<PasswordSyncJob>) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        let queue = Self {
            sender,
            counters: Arc::new(Counters::default()),
        };
        (queue, receiver)
    }

    /// Queue a job without waiting. Returns `false` when the job was dropped.
    pub fn enqueue(&self, job: PasswordSyncJob) -> bool {
        match self.sender.try_send(job) {
            Ok(()) => {
                Counters::bump(&self.counters.enqueued);
                true
            }
            Err(TrySendError::Full(job)) => {
                Counters::bump(&self.counters.dropped);
                warn!(username = %job.username, "password sync queue full; job dropped");
                false
            }
            Err(TrySendError::Closed(job)) => {
                Counters::bump(&self.counters.dropped);
                warn!(username = %job.username, "password sync dispatcher stopped; job dropped");
                false
            }
        }
    }

    pub fn stats(&self) -> SyncStats {
        self.counters.snapshot()
    }
}

struct Delivery {
    sink: Arc<dyn PasswordSyncSink>,
    cipher: PasswordCipher,
    timeout: Duration,
    counters: Arc<Counters>,
}

impl Delivery {
    async fn deliver(&self, job: PasswordSyncJob) {
        let new_password = match self.cipher.encrypt(&job.new_password) {
            Ok(sealed) => sealed,
            Err(err) => {
                Counters::bump(&self.counters.failed);
                warn!(username = %job.username, error = %err, "password sync encryption failed");
                return;
            }
        };
        let payload = SyncPayload {
            email: job.username.clone(),
            current_password: job.current_password.as_str().to_owned(),
            new_password,
        };

        match tokio::time::timeout(self.timeout, self.sink.push(&payload)).await {
            Ok(Ok(())) => {
                Counters::bump(&self.counters.delivered);
                info!(username = %job.username, "password synced with remote account service");
            }
            Ok(Err(err)) => {
                Counters::bump(&self.counters.failed);
                warn!(username = %job.username, error = %err, "password sync failed");
            }
            Err(_) => {
                Counters::bump(&self.counters.timed_out);
                warn!(
                    username = %job.username,
                    timeout_ms = self.timeout.as_millis() as u64,
                    "password sync timed out"
                );
            }
        }
    }
}

/// Owns the background worker that drains the sync queue.
///
/// Delivery is at most once with no retry. Dropping the dispatcher has the
/// same effect as [`shutdown`](Self::shutdown) without waiting for it.
pub struct SyncDispatcher {
    queue: SyncQueue,
    shutdown: Option<oneshot::Sender<()>>,
    worker: JoinHandle<()>,
}

impl fmt::Debug for SyncDispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyncDispatcher")
            .field("stats", &self.queue.stats())
            .finish_non_exhaustive()
    }
}

impl SyncDispatcher {
    /// Start the worker on the current tokio runtime.
    pub fn spawn(
        sink: Arc<dyn PasswordSyncSink>,
        cipher: PasswordCipher,
        settings: DispatcherSettings,
    ) -> Self {
        let (queue, receiver) = SyncQueue::channel(settings.queue_capacity);
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let delivery = Arc::new(Delivery {
            sink,
            cipher,
            timeout: settings.delivery_timeout,
            counters: queue.counters.clone(),
        });
        let permits = Arc::new(Semaphore::new(settings.max_in_flight.max(1)));

        let worker = tokio::spawn(run_worker(receiver, shutdown_rx, delivery, permits));
        debug!(
            queue_capacity = settings.queue_capacity,
            max_in_flight = settings.max_in_flight,
            "password sync dispatcher started"
        );

        Self {
            queue,
            shutdown: Some(shutdown_tx),
            worker,
        }
    }

    pub fn queue(&self) -> SyncQueue {
        self.queue.clone()
    }

    pub fn stats(&self) -> SyncStats {
        self.queue.stats()
    }

    /// Stop accepting jobs, deliver everything already queued, and wait for
    /// in-flight deliveries to finish.
    pub async fn shutdown(mut self) -> SyncStats {
        if let Some(signal) = self.shutdown.take() {
            let _ = signal.send(());
        }
        if let Err(err) = (&mut self.worker).await {
            warn!(error = %err, "password sync worker terminated abnormally");
        }
        let stats = self.queue.stats();
        info!(?stats, "password sync dispatcher stopped");
        stats
    }
}

async fn run_worker(
    mut receiver: mpsc::Receiver<PasswordSyncJob>,
    mut shutdown: oneshot::Receiver<()>,
    delivery: Arc<Delivery>,
    permits: Arc<Semaphore>,
) {
    let mut in_flight = JoinSet::new();

    loop {
        tokio::select! {
            job = receiver.recv() => match job {
                Some(job) => start(&mut in_flight, &delivery, &permits, job).await,
                None => break,
            },
            _ = &mut shutdown => {
                receiver.close();
                while let Some(job) = receiver.recv().await {
                    start(&mut in_flight, &delivery, &permits, job).await;
                }
                break;
            }
            Some(_) = in_flight.join_next(), if !in_flight.is_empty() => {}
        }
    }

    while in_flight.join_next().await.is_some() {}
}

async fn start(
    in_flight: &mut JoinSet<()>,
    delivery: &Arc<Delivery>,
    permits: &Arc<Semaphore>,
    job: PasswordSyncJob,
) {
    let Ok(permit) = permits.clone().acquire_owned().await else {
        return;
    };
    let delivery = delivery.clone();
    in_flight.spawn(async move {
        delivery.deliver(job).await;
        drop(permit);
    });
}
