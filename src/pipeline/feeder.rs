//! Feeder loop: pull input, submit to the pool, pause at the high watermark.

use log::{debug, warn};
use std::sync::Arc;

use crate::error::FlowError;

use super::completion::CompletionQueue;
use super::context::{LoopGuard, PipelineContext};

/// Consume `input`, submitting `processor(item)` for each item.
///
/// After every successful submission the in-flight count is checked; at or above the high
/// watermark the feeder exchanges its batch count with the drainer and stays parked until the
/// drainer has seen in-flight drop to the low watermark, so in-flight never passes hi + 1.
/// Submission failures are counted and skipped. When input runs out, the negated batch count
/// (<= 0) is sent as the end-of-input sentinel; a closed rendezvous at that point means the
/// drainer already finished.
pub fn run_feeder<T, U, I, P>(
    ctx: &PipelineContext,
    queue: &CompletionQueue<U>,
    input: I,
    processor: Arc<P>,
) -> crate::Result<()>
where
    I: IntoIterator<Item = T>,
    T: Send + 'static,
    U: Send + 'static,
    P: Fn(T) -> anyhow::Result<U> + Send + Sync + 'static,
{
    let guard = LoopGuard::new(ctx, "feeder");
    let hi = ctx.hi_watermark();
    let mut batch: isize = 0;

    for (index, item) in input.into_iter().enumerate() {
        if ctx.cancel.is_cancelled() {
            return Err(FlowError::Interrupted("feeding input"));
        }
        let processor = Arc::clone(&processor);
        match queue.submit(move || (*processor)(item)) {
            Ok(()) => {}
            Err(e) if e.is_item_failure() => {
                let failed = ctx.counters.record_rejection();
                warn!("feeder: item #{}: {} ({} failed so far)", index, e, failed);
                continue;
            }
            Err(e) => return Err(e),
        }
        batch += 1;
        let depth = ctx.counters.add_in_flight();

        if depth >= hi {
            park(ctx, batch, depth)?;
            batch = 0;
        }
    }

    let sentinel = -batch;
    debug!("feeder: input exhausted, sending sentinel {}", sentinel);
    match ctx.rendezvous.exchange(sentinel, &ctx.cancel) {
        Ok(_) | Err(FlowError::Closed) => {}
        Err(e) => return Err(e),
    }
    guard.complete();
    Ok(())
}

/// Exchange `batch` (always > 0 here) with the drainer until in-flight is back at or below hi.
///
/// The drainer may have parked an offer before this batch was submitted; pairing with it does
/// not mean anything drained, so the feeder parks again rather than submitting past hi + 1.
fn park(ctx: &PipelineContext, batch: isize, depth: isize) -> crate::Result<()> {
    let hi = ctx.hi_watermark();
    debug!("feeder: sending batch {}, in flight {}", batch, depth);
    loop {
        let from_drainer = ctx.rendezvous.exchange(batch, &ctx.cancel)?;
        let now = ctx.counters.in_flight();
        if now <= hi {
            debug!("feeder: resumed, drainer saw in flight {}", from_drainer);
            return Ok(());
        }
        debug!("feeder: stale release at in flight {}, parking again", now);
    }
}
