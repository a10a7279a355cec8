use log::{debug, warn};

use crate::RunReport;
use crate::error::FlowError;
use crate::pipeline::CancelToken;

/// Errors a loop reports when its partner's failure stopped it, not a failure of its own.
fn is_knock_on(e: &FlowError) -> bool {
    matches!(e, FlowError::Interrupted(_) | FlowError::Closed)
}

/// The error that stopped the loops, if any. A root cause beats the partner's
/// `Interrupted` / `Closed`; the losing error is only logged.
pub fn root_cause(feeder: crate::Result<()>, drainer: crate::Result<()>) -> Option<FlowError> {
    match (feeder, drainer) {
        (Ok(()), Ok(())) => None,
        (Err(e), Ok(())) | (Ok(()), Err(e)) => Some(e),
        (Err(f), Err(d)) => {
            let (cause, knock_on) = if is_knock_on(&f) && !is_knock_on(&d) {
                (d, f)
            } else {
                (f, d)
            };
            debug!("Pipeline stopped: {} (then: {})", cause, knock_on);
            Some(cause)
        }
    }
}

/// Turn joined loop results into the run result. Call after both loops are joined and the pool is down.
///
/// Caller cancellation wins and carries the partial report; a loop failure that coincided with
/// it is logged. Otherwise the root-cause error from [`root_cause`] is returned.
pub fn check_loop_results(
    caller: &CancelToken,
    report: RunReport,
    feeder: crate::Result<()>,
    drainer: crate::Result<()>,
) -> crate::Result<RunReport> {
    let cause = root_cause(feeder, drainer);
    if caller.is_cancelled() {
        match &cause {
            Some(e) if !is_knock_on(e) => warn!("Loop failed during cancellation: {}", e),
            Some(e) => debug!("Loops stopped by cancellation: {}", e),
            None => {}
        }
        warn!(
            "Run cancelled: {} submitted, {} succeeded, {} failed, {} left in flight",
            report.submitted, report.succeeded, report.failed, report.in_flight
        );
        return Err(FlowError::Cancelled { report });
    }
    match cause {
        None => Ok(report),
        Some(e) => {
            warn!("Pipeline stopped: {}", e);
            Err(e)
        }
    }
}
