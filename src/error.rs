//! Error types for the flow-controlled pipeline.

use thiserror::Error;

use crate::RunReport;

/// Errors surfaced by blocking pipeline operations and by [`run`](crate::run).
///
/// `Submit` and `Processing` are per-item: the loops count them and keep going.
/// `Interrupted`, `Closed`, `LoopPanicked` and `Cancelled` end the run.
#[derive(Debug, Error)]
pub enum FlowError {
    /// Configuration rejected before the pipeline started.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The worker pool refused or could not accept a task.
    #[error("Submission rejected: {0}")]
    Submit(String),

    /// The processor returned an error or panicked.
    #[error("Processing failed: {0}")]
    Processing(String),

    /// A blocking call was woken by cancellation.
    #[error("Interrupted while {0}")]
    Interrupted(&'static str),

    /// The other side of the rendezvous has gone away.
    #[error("Rendezvous closed")]
    Closed,

    /// A pool worker or loop thread could not be started.
    #[error("Failed to spawn {name} thread")]
    Spawn {
        name: String,
        #[source]
        source: std::io::Error,
    },

    /// A feeder or drainer thread panicked (input iterator or sink).
    #[error("{0} thread panicked")]
    LoopPanicked(&'static str),

    /// The caller cancelled the run; counters are as of shutdown.
    #[error("Run cancelled (failed {}, in flight {})", .report.failed, .report.in_flight)]
    Cancelled { report: RunReport },
}

impl FlowError {
    /// True for failures that are counted against one item rather than ending the run.
    pub fn is_item_failure(&self) -> bool {
        matches!(self, FlowError::Submit(_) | FlowError::Processing(_))
    }
}
