//! FIFO request pacing.
//!
//! All outbound requests of a process go through one [`RequestQueue`]: a
//! single worker runs tasks in submission order and waits `delay` between two
//! tasks whenever more are waiting, so upstream sites never see bursts.

use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use exn::ResultExt;
use futures::FutureExt;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::error::{ErrorKind, Result};

/// Default pause between two queued tasks.
pub const DEFAULT_DELAY: Duration = Duration::from_millis(500);

type Job = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;

#[derive(Debug)]
pub struct RequestQueue {
    sender: Mutex<Option<mpsc::UnboundedSender<Job>>>,
    worker: Mutex<Option<JoinHandle<()>>>,
    pending: Arc<AtomicUsize>,
    delay: Duration,
}
impl RequestQueue {
    /// Creates the queue and spawns its worker on the current Tokio runtime.
    ///
    /// # Panics
    ///
    /// Panics when called outside of a Tokio runtime.
    pub fn new(delay: Duration) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        let pending = Arc::new(AtomicUsize::new(0));
        let worker = tokio::spawn(Self::work(receiver, Arc::clone(&pending), delay));
        Self {
            sender: Mutex::new(Some(sender)),
            worker: Mutex::new(Some(worker)),
            pending,
            delay,
        }
    }

    async fn work(mut receiver: mpsc::UnboundedReceiver<Job>, pending: Arc<AtomicUsize>, delay: Duration) {
        while let Some(job) = receiver.recv().await {
            // A panicking task settles its own completion as dropped; the queue keeps going.
            if AssertUnwindSafe(job).catch_unwind().await.is_err() {
                tracing::warn!("Queued request task panicked");
            }
            let waiting = pending.fetch_sub(1, Ordering::SeqCst) - 1;
            if waiting > 0 {
                tracing::trace!(waiting, delay_ms = delay.as_millis() as u64, "Pacing request queue");
                tokio::time::sleep(delay).await;
            }
        }
        tracing::debug!("Request queue drained");
    }

    /// Enqueues `task` and waits for its result.
    ///
    /// # Errors
    ///
    /// Returns the task's own error, or [`ErrorKind::QueueClosed`] when the
    /// queue was shut down before the task could run.
    pub async fn add<F, Fut, T>(&self, task: F) -> Result<T>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<T>> + Send + 'static,
        T: Send + 'static,
    {
        let (settle, settled) = oneshot::channel();
        let job: Job = Box::pin(async move {
            // The caller may have stopped waiting; nothing to settle then.
            let _ = settle.send(task().await);
        });
        {
            let sender = self.sender.lock().unwrap_or_else(PoisonError::into_inner);
            let Some(sender) = sender.as_ref() else {
                exn::bail!(ErrorKind::QueueClosed);
            };
            self.pending.fetch_add(1, Ordering::SeqCst);
            if sender.send(job).is_err() {
                self.pending.fetch_sub(1, Ordering::SeqCst);
                exn::bail!(ErrorKind::QueueClosed);
            }
        }
        settled.await.or_raise(|| ErrorKind::QueueClosed)?
    }

    /// Number of tasks submitted but not yet finished.
    pub fn len(&self) -> usize {
        self.pending.load(Ordering::SeqCst)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Stops accepting tasks and waits for the already queued ones to finish.
    pub async fn shutdown(&self) {
        drop(self.sender.lock().unwrap_or_else(PoisonError::into_inner).take());
        let worker = self.worker.lock().unwrap_or_else(PoisonError::into_inner).take();
        if let Some(worker) = worker
            && let Err(err) = worker.await
        {
            tracing::warn!(error = %err, "Request queue worker failed");
        }
    }
}
impl Default for RequestQueue {
    fn default() -> Self {
        Self::new(DEFAULT_DELAY)
    }
}
