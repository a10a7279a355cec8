//! Drainer loop: take completed results, feed the sink, release the feeder at the low watermark.

use log::{debug, warn};

use crate::error::FlowError;

use super::completion::CompletionQueue;
use super::context::{LoopGuard, PipelineContext};

/// Drain results in completion order until input is exhausted and nothing is in flight.
///
/// Each retrieval (success or processing failure) decrements in-flight. While the feeder has not
/// signalled end of input, the drainer exchanges with it whenever in-flight is at or below the low
/// watermark, including when it reaches zero; a received value <= 0 (or a closed rendezvous) marks
/// input as exhausted and no further exchange is attempted.
pub fn run_drainer<U, S>(
    ctx: &PipelineContext,
    queue: &CompletionQueue<U>,
    mut sink: S,
) -> crate::Result<()>
where
    U: Send + 'static,
    S: FnMut(U),
{
    let guard = LoopGuard::new(ctx, "drainer");
    let lo = ctx.lo_watermark();
    let mut all_done = false;

    loop {
        let depth = ctx.counters.in_flight();
        if depth <= 0 {
            if all_done {
                break;
            }
            // Nothing outstanding: the feeder is either about to pause or about to finish.
            all_done = handshake(ctx, depth)?;
            continue;
        }

        match queue.take_completed()? {
            Ok(out) => {
                ctx.counters.record_success();
                sink(out);
            }
            Err(e) => {
                let failed = ctx.counters.record_failure();
                warn!("drainer: {} ({} failed so far)", e, failed);
            }
        }

        let depth = ctx.counters.sub_in_flight();
        if !all_done && depth > 0 && depth <= lo {
            all_done = handshake(ctx, depth)?;
        }
    }

    guard.complete();
    Ok(())
}

/// Exchange the current in-flight count with the feeder. Returns true once input is exhausted.
fn handshake(ctx: &PipelineContext, depth: isize) -> crate::Result<bool> {
    debug!("drainer: sending in flight {}", depth);
    match ctx.rendezvous.exchange(depth, &ctx.cancel) {
        Ok(from_feeder) => {
            debug!("drainer: received batch {}", from_feeder);
            Ok(from_feeder <= 0)
        }
        Err(FlowError::Closed) => Ok(true),
        Err(e) => Err(e),
    }
}
