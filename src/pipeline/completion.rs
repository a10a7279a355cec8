//! Completion-order retrieval on top of [`WorkerPool`].

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, unbounded};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use crate::error::FlowError;

use super::pool::WorkerPool;

/// Outcome of one task: its output, or the processing error it raised.
pub type Completed<U> = Result<U, FlowError>;

/// Submit tasks to a pool and take their outcomes first-finished-first-returned.
///
/// Each task sends its outcome on a shared channel the moment it finishes, so the order of
/// [`take_completed`](CompletionQueue::take_completed) is the order of completion, not of submission.
pub struct CompletionQueue<U> {
    pool: WorkerPool,
    done_tx: Sender<Completed<U>>,
    done_rx: Receiver<Completed<U>>,
}

impl<U: Send + 'static> CompletionQueue<U> {
    pub fn new(pool: WorkerPool) -> Self {
        let (done_tx, done_rx) = unbounded();
        Self {
            pool,
            done_tx,
            done_rx,
        }
    }

    /// Register `task`; its outcome becomes available once a worker has run it.
    pub fn submit<F>(&self, task: F) -> crate::Result<()>
    where
        F: FnOnce() -> anyhow::Result<U> + Send + 'static,
    {
        let done_tx = self.done_tx.clone();
        self.pool.submit(Box::new(move || {
            // Receiver outlives every job unless the run is being torn down.
            let _ = done_tx.send(run_task(task));
        }))
    }

    /// Block until some submitted task has finished and return its outcome.
    ///
    /// The outer error is an interruption of the wait itself; the inner one is the task's own failure.
    pub fn take_completed(&self) -> crate::Result<Completed<U>> {
        let cancel = self.pool.cancel_token();
        loop {
            if cancel.is_cancelled() {
                return Err(FlowError::Interrupted("waiting for a completed task"));
            }
            match self.done_rx.recv_timeout(self.pool.poll_interval()) {
                Ok(outcome) => return Ok(outcome),
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => return Err(FlowError::Closed),
            }
        }
    }

    pub fn pool_size(&self) -> usize {
        self.pool.size()
    }

    pub fn shutdown(self) {
        self.pool.shutdown();
    }
}

/// Run a task on the current worker, turning errors and panics into a processing failure.
fn run_task<U, F>(task: F) -> Completed<U>
where
    F: FnOnce() -> anyhow::Result<U>,
{
    match panic::catch_unwind(AssertUnwindSafe(task)) {
        Ok(Ok(out)) => Ok(out),
        Ok(Err(e)) => Err(FlowError::Processing(format!("{e:#}"))),
        Err(payload) => Err(FlowError::Processing(format!(
            "processor panicked: {}",
            panic_message(payload.as_ref())
        ))),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else {
        "<non-string payload>"
    }
}
