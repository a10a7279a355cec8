//! Flowgate: bounded-memory task pipeline with watermark backpressure.
//!
//! A feeder thread pulls items from an input iterator and submits them to a fixed worker pool;
//! a drainer thread takes results in completion order and hands them to a sink. The two meet at a
//! rendezvous: the feeder pauses once in-flight reaches the high watermark and resumes only after
//! the drainer has brought it down to the low watermark.

pub mod engine;
pub mod error;
pub mod pipeline;
pub mod types;
pub mod utils;

/// Re-export types for API
pub use error::FlowError;
pub use pipeline::CancelToken;
pub use types::*;

/// Result alias used by the public flowgate API
pub type Result<T> = std::result::Result<T, FlowError>;

/// Process `input` with `processor` on `config.pool_size()` workers, passing each successful
/// output to `sink` as soon as it completes.
///
/// Returns once every submitted item has been retrieved. Per-item failures (rejected submission,
/// processor error or panic) are counted in [`RunReport::failed`] and logged; they never stop the run.
///
/// ```ignore
/// let config = flowgate::FlowConfig::new(4, 2, 5)?;
/// let mut seen = Vec::new();
/// let report = flowgate::run(&config, 1..=20, |n: u32| Ok(n * 2), |n| seen.push(n))?;
/// assert_eq!(report.totals(), (0, 0));
/// ```
pub fn run<T, U, I, P, S>(config: &FlowConfig, input: I, processor: P, sink: S) -> Result<RunReport>
where
    I: IntoIterator<Item = T>,
    I::IntoIter: Send,
    T: Send + 'static,
    U: Send + 'static,
    P: Fn(T) -> anyhow::Result<U> + Send + Sync + 'static,
    S: FnMut(U) + Send,
{
    run_with_cancel(config, &CancelToken::new(), input, processor, sink)
}

/// Like [`run`], but stops early when `cancel` fires.
///
/// Cancellation is observed at every blocking point (pool submission, result retrieval,
/// rendezvous). Queued work is discarded, running tasks finish, and the call returns
/// [`FlowError::Cancelled`] with the counters at shutdown.
pub fn run_with_cancel<T, U, I, P, S>(
    config: &FlowConfig,
    cancel: &CancelToken,
    input: I,
    processor: P,
    sink: S,
) -> Result<RunReport>
where
    I: IntoIterator<Item = T>,
    I::IntoIter: Send,
    T: Send + 'static,
    U: Send + 'static,
    P: Fn(T) -> anyhow::Result<U> + Send + Sync + 'static,
    S: FnMut(U) + Send,
{
    log::debug!(
        "{} CONFIG:{:#?}",
        utils::PackagePaths::get().pkg_name().to_uppercase(),
        config
    );
    pipeline::run_pipeline(config, cancel, input, processor, sink)
}
