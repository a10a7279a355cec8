//! Per-run state shared by the feeder and drainer: config, counters, rendezvous, cancellation.

use log::debug;
use std::time::Duration;

use crate::{FlowConfig, RunReport};

use super::cancel::CancelToken;
use super::counters::FlowCounters;
use super::rendezvous::Rendezvous;

/// Everything both loops touch. Created at run start, dropped at run end.
pub struct PipelineContext {
    pub config: FlowConfig,
    pub counters: FlowCounters,
    pub rendezvous: Rendezvous,
    /// Child of the caller's token; cancelled on the caller's request or when a loop fails.
    pub cancel: CancelToken,
}

impl PipelineContext {
    pub fn new(config: &FlowConfig, caller: &CancelToken) -> Self {
        Self {
            config: config.clone(),
            counters: FlowCounters::new(),
            rendezvous: Rendezvous::new(config.poll_interval()),
            cancel: caller.child(),
        }
    }

    // Watermarks are validated to fit in isize.
    pub fn lo_watermark(&self) -> isize {
        self.config.lo_watermark() as isize
    }

    pub fn hi_watermark(&self) -> isize {
        self.config.hi_watermark() as isize
    }

    /// Stop both loops: cancel the run and wake anyone parked at the rendezvous.
    pub fn abort(&self) {
        self.cancel.cancel();
        self.rendezvous.close();
    }

    pub fn report(&self, elapsed: Duration) -> RunReport {
        RunReport {
            submitted: self.counters.submitted(),
            succeeded: self.counters.succeeded(),
            failed: self.counters.failed(),
            rejected: self.counters.rejected(),
            in_flight: self.counters.in_flight(),
            peak_in_flight: self.counters.peak_in_flight(),
            exchanges: self.rendezvous.exchanges(),
            elapsed_ms: u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
        }
    }
}

/// Held by each loop for its whole lifetime. On drop the rendezvous is closed so the partner can
/// never park forever; unless [`complete`](LoopGuard::complete) was called (error return or panic)
/// the run is aborted as well.
pub struct LoopGuard<'a> {
    ctx: &'a PipelineContext,
    name: &'static str,
    completed: bool,
}

impl<'a> LoopGuard<'a> {
    pub fn new(ctx: &'a PipelineContext, name: &'static str) -> Self {
        Self {
            ctx,
            name,
            completed: false,
        }
    }

    pub fn complete(mut self) {
        self.completed = true;
    }
}

impl Drop for LoopGuard<'_> {
    fn drop(&mut self) {
        if self.completed {
            self.ctx.rendezvous.close();
            debug!("{}: exiting", self.name);
        } else {
            self.ctx.abort();
            debug!("{}: aborted, run cancelled", self.name);
        }
    }
}
