//! Fixed-size worker pool fed through a bounded crossbeam channel.

use crossbeam_channel::{Receiver, SendTimeoutError, Sender, TrySendError, bounded};
use log::{debug, warn};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::error::FlowError;
use crate::{Admission, FlowConfig};

use super::cancel::CancelToken;

/// Unit of work executed on a pool thread.
pub type Job = Box<dyn FnOnce() + Send + 'static>;

/// `pool_size` threads started once and reused for the whole run.
///
/// Submission goes through a bounded job queue; what happens when it is full depends on
/// [`Admission`]. After cancellation, workers discard queued jobs instead of running them,
/// so shutdown only waits for jobs already executing.
pub struct WorkerPool {
    job_tx: Sender<Job>,
    handles: Vec<JoinHandle<()>>,
    admission: Admission,
    poll_interval: Duration,
    cancel: CancelToken,
}

/// Single worker: pull jobs until the queue closes.
fn worker_loop(job_rx: Receiver<Job>, cancel: CancelToken) {
    while let Ok(job) = job_rx.recv() {
        if cancel.is_cancelled() {
            continue;
        }
        job();
    }
}

impl WorkerPool {
    /// Spawn `config.pool_size()` workers named `worker-01`, `worker-02`, ...
    pub fn new(config: &FlowConfig, cancel: CancelToken) -> crate::Result<Self> {
        let (job_tx, job_rx) = bounded::<Job>(config.queue_capacity());
        let handles = (0..config.pool_size())
            .map(|i| {
                let name = format!("worker-{:02}", i + 1);
                let job_rx = job_rx.clone();
                let cancel = cancel.clone();
                thread::Builder::new()
                    .name(name.clone())
                    .spawn(move || worker_loop(job_rx, cancel))
                    .map_err(|source| FlowError::Spawn { name, source })
            })
            .collect::<crate::Result<Vec<_>>>()?;
        debug!(
            "pool: {} workers, queue capacity {}, admission {:?}",
            handles.len(),
            config.queue_capacity(),
            config.admission()
        );
        Ok(Self {
            job_tx,
            handles,
            admission: config.admission(),
            poll_interval: config.poll_interval(),
            cancel,
        })
    }

    /// Queue `job` for execution. Blocks only under [`Admission::Block`] with a full queue.
    pub fn submit(&self, job: Job) -> crate::Result<()> {
        match self.admission {
            Admission::Reject => self.job_tx.try_send(job).map_err(|e| match e {
                TrySendError::Full(_) => FlowError::Submit("job queue is full".to_string()),
                TrySendError::Disconnected(_) => {
                    FlowError::Submit("pool is shut down".to_string())
                }
            }),
            Admission::Block => {
                let mut job = job;
                loop {
                    if self.cancel.is_cancelled() {
                        return Err(FlowError::Interrupted("submitting to the pool"));
                    }
                    match self.job_tx.send_timeout(job, self.poll_interval) {
                        Ok(()) => return Ok(()),
                        Err(SendTimeoutError::Timeout(j)) => job = j,
                        Err(SendTimeoutError::Disconnected(_)) => {
                            return Err(FlowError::Submit("pool is shut down".to_string()));
                        }
                    }
                }
            }
        }
    }

    pub fn size(&self) -> usize {
        self.handles.len()
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    pub fn cancel_token(&self) -> &CancelToken {
        &self.cancel
    }

    /// Close the job queue and join every worker.
    pub fn shutdown(self) {
        let WorkerPool {
            job_tx, handles, ..
        } = self;
        // Dropping the only sender closes the channel so workers exit.
        drop(job_tx);
        let mut panicked = 0_usize;
        for h in handles {
            if h.join().is_err() {
                panicked += 1;
            }
        }
        if panicked > 0 {
            warn!("pool: {} worker(s) panicked", panicked);
        }
        debug!("pool: shut down");
    }
}
