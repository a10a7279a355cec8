//! Public types for the flowgate API: options, validated config, run report.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::FlowError;
use crate::utils::config::{PipelineDefaults, WorkerThreadLimits};

/// What the worker pool does when its job queue is full.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Admission {
    /// Submitter waits for a free slot (still honors cancellation).
    #[default]
    Block,
    /// Submission fails immediately and the item is counted as failed.
    Reject,
}

/// Caller-facing options. Turned into a [`FlowConfig`] once per run; nothing here is validated yet.
#[derive(Clone, Debug)]
pub struct FlowOpts {
    /// Number of parallel workers.
    pub pool_size: usize,
    /// Drainer hands control back to the feeder once in-flight drops to this.
    pub lo_watermark: usize,
    /// Feeder pauses once in-flight reaches this.
    pub hi_watermark: usize,
    /// Worker job queue capacity. When None, sized to `hi_watermark + 1` so a blocking
    /// submit never waits under normal flow control.
    pub queue_capacity: Option<usize>,
    /// Pool behavior when the job queue is full.
    pub admission: Admission,
    /// How often blocked calls re-check cancellation.
    pub poll_interval: Duration,
}

impl Default for FlowOpts {
    fn default() -> Self {
        Self {
            pool_size: WorkerThreadLimits::current().all_threads,
            lo_watermark: PipelineDefaults::LO_WATERMARK,
            hi_watermark: PipelineDefaults::HI_WATERMARK,
            queue_capacity: None,
            admission: Admission::default(),
            poll_interval: PipelineDefaults::POLL_INTERVAL,
        }
    }
}

/// Validated, immutable configuration for a single pipeline run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FlowConfig {
    pool_size: usize,
    lo_watermark: usize,
    hi_watermark: usize,
    queue_capacity: usize,
    admission: Admission,
    poll_interval: Duration,
}

impl FlowConfig {
    /// Shorthand for the three core knobs; everything else takes its default.
    pub fn new(pool_size: usize, lo_watermark: usize, hi_watermark: usize) -> crate::Result<Self> {
        Self::try_from(&FlowOpts {
            pool_size,
            lo_watermark,
            hi_watermark,
            ..Default::default()
        })
    }

    pub fn pool_size(&self) -> usize {
        self.pool_size
    }

    pub fn lo_watermark(&self) -> usize {
        self.lo_watermark
    }

    pub fn hi_watermark(&self) -> usize {
        self.hi_watermark
    }

    pub fn queue_capacity(&self) -> usize {
        self.queue_capacity
    }

    pub fn admission(&self) -> Admission {
        self.admission
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }
}

impl TryFrom<&FlowOpts> for FlowConfig {
    type Error = FlowError;

    fn try_from(o: &FlowOpts) -> Result<Self, Self::Error> {
        if o.pool_size == 0 {
            return Err(FlowError::InvalidConfig(
                "pool_size must be at least 1".to_string(),
            ));
        }
        // lo == hi is allowed: 0/0 means "rendezvous after every submission".
        if o.lo_watermark > o.hi_watermark {
            return Err(FlowError::InvalidConfig(format!(
                "lo_watermark ({}) must not exceed hi_watermark ({})",
                o.lo_watermark, o.hi_watermark
            )));
        }
        if o.queue_capacity == Some(0) {
            return Err(FlowError::InvalidConfig(
                "queue_capacity must be at least 1".to_string(),
            ));
        }
        if o.poll_interval.is_zero() {
            return Err(FlowError::InvalidConfig(
                "poll_interval must be non-zero".to_string(),
            ));
        }
        if isize::try_from(o.hi_watermark).is_err() {
            return Err(FlowError::InvalidConfig(format!(
                "hi_watermark ({}) is out of range",
                o.hi_watermark
            )));
        }
        Ok(Self {
            pool_size: o.pool_size,
            lo_watermark: o.lo_watermark,
            hi_watermark: o.hi_watermark,
            queue_capacity: o
                .queue_capacity
                .unwrap_or_else(|| o.hi_watermark.saturating_add(1)),
            admission: o.admission,
            poll_interval: o.poll_interval,
        })
    }
}

/// Totals for one run. `submitted == succeeded + (failed - rejected) + in_flight` on every run.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct RunReport {
    /// Items accepted by the pool.
    pub submitted: usize,
    /// Items whose result reached the sink.
    pub succeeded: usize,
    /// Submission plus processing failures.
    pub failed: usize,
    /// Submission failures only; these items were never in flight.
    pub rejected: usize,
    /// Items submitted but never retrieved. 0 on a normal completion.
    pub in_flight: isize,
    /// Highest in-flight count the feeder observed.
    pub peak_in_flight: isize,
    /// Completed feeder/drainer rendezvous exchanges.
    pub exchanges: usize,
    /// Wall-clock time of the run in milliseconds.
    pub elapsed_ms: u64,
}

impl RunReport {
    /// `(failure count, final in-flight count)`.
    pub fn totals(&self) -> (usize, isize) {
        (self.failed, self.in_flight)
    }
}
