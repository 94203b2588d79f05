//! Serial task queue
//!
//! Accepts asynchronous tasks and runs them one after another in the order
//! they were submitted. Submitting never blocks; a single pump task drains
//! the buffer and parks itself (goes [`PumpState::Idle`]) once it is empty.

use super::{OffsetQueue, PumpState, QueueError};
use crate::telemetry::{set_gauge, GaugeMetric};
use futures_util::FutureExt;
use parking_lot::Mutex;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::sync::oneshot;

/// A wrapped task, already bound to the channel that relays its outcome
type Job = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;

struct Inner {
    jobs: OffsetQueue<Job>,
    state: PumpState,
}

/// Runs submitted tasks strictly one at a time, in submission order
///
/// Cloning yields another handle onto the same queue.
#[derive(Clone)]
pub struct SerialTaskQueue {
    inner: Arc<Mutex<Inner>>,
}

impl SerialTaskQueue {
    /// Create an idle queue
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                jobs: OffsetQueue::new(),
                state: PumpState::Idle,
            })),
        }
    }

    /// Queue a task and return a handle to its eventual outcome
    ///
    /// The task is not started here. If the queue was idle a pump is spawned
    /// onto the current tokio runtime; otherwise the running pump picks the
    /// task up after everything submitted before it. Must be called from
    /// within a tokio runtime.
    ///
    /// Dropping the returned handle does not cancel the task.
    pub fn submit<F, Fut, T>(&self, task: F) -> TaskHandle<T>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = T> + Send + 'static,
        T: Send + 'static,
    {
        let (tx, rx) = oneshot::channel();

        let job: Job = Box::pin(async move {
            let outcome = AssertUnwindSafe(async move { task().await })
                .catch_unwind()
                .await
                .map_err(|_| QueueError::TaskPanicked);
            // Receiver may be gone; the task still counts as run
            let _ = tx.send(outcome);
        });

        let start_pump = {
            let mut inner = self.inner.lock();
            inner.jobs.push(job);
            set_gauge(GaugeMetric::SerialQueueDepth, inner.jobs.len() as f64);

            match inner.state {
                PumpState::Idle => {
                    inner.state = PumpState::Draining;
                    true
                }
                PumpState::Draining => false,
            }
        };

        if start_pump {
            tracing::trace!("Serial queue pump starting");
            // If the runtime shuts down before the pump runs, the state stays
            // Draining for good: the job remains buffered, later submits only
            // enqueue, and nothing drains them. Their handles resolve to
            // Abandoned once the queue itself is dropped.
            tokio::spawn(Self::pump(Arc::clone(&self.inner)));
        }

        TaskHandle { rx }
    }

    /// Number of tasks waiting to start
    pub fn len(&self) -> usize {
        self.inner.lock().jobs.len()
    }

    /// True when no task is waiting to start
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Current pump state
    pub fn state(&self) -> PumpState {
        self.inner.lock().state
    }

    /// Drain the buffer, then go idle
    ///
    /// The emptiness check and the transition to `Idle` happen under the
    /// same lock `submit` takes, so a concurrent submit either lands before
    /// the check (and gets run here) or sees `Idle` and spawns a new pump.
    async fn pump(inner: Arc<Mutex<Inner>>) {
        loop {
            let job = {
                let mut guard = inner.lock();
                if guard.jobs.is_empty() {
                    guard.state = PumpState::Idle;
                    tracing::trace!("Serial queue drained, pump idle");
                    return;
                }
                match guard.jobs.pop() {
                    Ok(job) => {
                        set_gauge(GaugeMetric::SerialQueueDepth, guard.jobs.len() as f64);
                        job
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "Serial queue pump popped an empty buffer");
                        guard.state = PumpState::Idle;
                        return;
                    }
                }
            };

            job.await;
        }
    }
}

impl Default for SerialTaskQueue {
    fn default() -> Self {
        Self::new()
    }
}

/// Outcome of a task submitted to a [`SerialTaskQueue`]
///
/// Resolves to whatever the task returned, or to a [`QueueError`] if the
/// task panicked or never ran.
#[derive(Debug)]
pub struct TaskHandle<T> {
    rx: oneshot::Receiver<Result<T, QueueError>>,
}

impl<T> Future for TaskHandle<T> {
    type Output = Result<T, QueueError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.rx).poll(cx).map(|received| match received {
            Ok(outcome) => outcome,
            Err(_) => Err(QueueError::Abandoned),
        })
    }
}
