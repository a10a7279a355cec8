use log::{debug, info};
use std::sync::Arc;
use std::thread::{self, ScopedJoinHandle};
use std::time::Instant;

use crate::error::FlowError;
use crate::pipeline::{
    CancelToken, CompletionQueue, PipelineContext, WorkerPool, check_loop_results, run_drainer,
    run_feeder,
};
use crate::{FlowConfig, RunReport};

/// Main orchestrator: pool + completion queue, feeder and drainer on their own threads.
/// Input → feeder → pool → completion queue → drainer → sink.
///
/// Blocks until both loops have been joined and the pool is shut down. A panic or error in one
/// loop aborts the other (see [`LoopGuard`](crate::pipeline::LoopGuard)), so this never hangs on a
/// half-dead pipeline.
pub fn run_pipeline<T, U, I, P, S>(
    config: &FlowConfig,
    cancel: &CancelToken,
    input: I,
    processor: P,
    sink: S,
) -> crate::Result<RunReport>
where
    I: IntoIterator<Item = T>,
    I::IntoIter: Send,
    T: Send + 'static,
    U: Send + 'static,
    P: Fn(T) -> anyhow::Result<U> + Send + Sync + 'static,
    S: FnMut(U) + Send,
{
    let start = Instant::now();
    let ctx = PipelineContext::new(config, cancel);
    let queue = CompletionQueue::new(WorkerPool::new(config, ctx.cancel.clone())?);
    debug!(
        "pipeline: {} workers, watermarks lo {} / hi {}",
        queue.pool_size(),
        config.lo_watermark(),
        config.hi_watermark()
    );

    let input = input.into_iter();
    let processor = Arc::new(processor);
    let (ctx_ref, queue_ref) = (&ctx, &queue);

    let (fed, drained) = thread::scope(|s| {
        let feeder = thread::Builder::new()
            .name("feeder".to_string())
            .spawn_scoped(s, move || run_feeder(ctx_ref, queue_ref, input, processor));
        let drainer = thread::Builder::new()
            .name("drainer".to_string())
            .spawn_scoped(s, move || run_drainer(ctx_ref, queue_ref, sink));

        if feeder.is_err() || drainer.is_err() {
            // The partner may already be running; don't leave it parked.
            ctx_ref.abort();
        }
        (join_loop(feeder, "feeder"), join_loop(drainer, "drainer"))
    });

    queue.shutdown();
    let report = ctx.report(start.elapsed());
    let report = check_loop_results(cancel, report, fed, drained)?;
    info!(
        "Processed {} items: {} succeeded, {} failed, {} in flight, peak {}, {} exchanges in {} ms",
        report.submitted + report.rejected,
        report.succeeded,
        report.failed,
        report.in_flight,
        report.peak_in_flight,
        report.exchanges,
        report.elapsed_ms
    );
    Ok(report)
}

/// Join one loop thread, mapping spawn failures and panics into [`FlowError`].
fn join_loop(
    handle: std::io::Result<ScopedJoinHandle<'_, crate::Result<()>>>,
    name: &'static str,
) -> crate::Result<()> {
    match handle {
        Ok(h) => h.join().map_err(|_| FlowError::LoopPanicked(name))?,
        Err(source) => Err(FlowError::Spawn {
            name: name.to_string(),
            source,
        }),
    }
}
