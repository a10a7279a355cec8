//! Two-party synchronous hand-off between the feeder and the drainer.

use log::trace;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use crate::error::FlowError;

use super::cancel::CancelToken;

#[derive(Clone, Copy, Debug)]
enum Slot {
    Empty,
    /// First arrival is parked with its value.
    Offered(isize),
    /// Second arrival has answered; the first has not collected yet.
    Answered(isize),
}

#[derive(Debug)]
struct State {
    slot: Slot,
    closed: bool,
}

/// Single-slot rendezvous: each [`exchange`](Rendezvous::exchange) blocks until the other party
/// calls it too, then both return the value the other supplied.
///
/// Meant for exactly two parties in strict alternation (one feeder, one drainer). A third caller
/// is not detected and will pair with whoever arrives. [`close`](Rendezvous::close) wakes a
/// parked party with [`FlowError::Closed`] and makes every later call fail the same way.
#[derive(Debug)]
pub struct Rendezvous {
    state: Mutex<State>,
    cv: Condvar,
    poll_interval: Duration,
    exchanges: AtomicUsize,
}

impl Rendezvous {
    pub fn new(poll_interval: Duration) -> Self {
        Self {
            state: Mutex::new(State {
                slot: Slot::Empty,
                closed: false,
            }),
            cv: Condvar::new(),
            poll_interval,
            exchanges: AtomicUsize::new(0),
        }
    }

    // Slot transitions are single assignments, so a poisoned guard still holds consistent state.
    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn wait<'a>(&self, guard: MutexGuard<'a, State>) -> MutexGuard<'a, State> {
        self.cv
            .wait_timeout(guard, self.poll_interval)
            .unwrap_or_else(PoisonError::into_inner)
            .0
    }

    /// Hand `value` to the other party and return theirs.
    ///
    /// Fails with [`FlowError::Interrupted`] if `cancel` fires first (a parked offer is withdrawn)
    /// and with [`FlowError::Closed`] once the rendezvous is closed. A reply that already arrived
    /// is still delivered after a close.
    pub fn exchange(&self, value: isize, cancel: &CancelToken) -> crate::Result<isize> {
        let mut st = self.lock();

        // Arrive: answer a parked offer, or park our own.
        loop {
            if st.closed {
                return Err(FlowError::Closed);
            }
            let slot = st.slot;
            match slot {
                Slot::Offered(theirs) => {
                    st.slot = Slot::Answered(value);
                    self.exchanges.fetch_add(1, Ordering::Relaxed);
                    self.cv.notify_all();
                    trace!("rendezvous: answered {} with {}", theirs, value);
                    return Ok(theirs);
                }
                Slot::Empty => {
                    st.slot = Slot::Offered(value);
                    self.cv.notify_all();
                    break;
                }
                // Previous pair not collected yet.
                Slot::Answered(_) => {}
            }
            if cancel.is_cancelled() {
                return Err(FlowError::Interrupted("arriving at the rendezvous"));
            }
            st = self.wait(st);
        }

        // Parked: wait for the answer.
        loop {
            let slot = st.slot;
            if let Slot::Answered(theirs) = slot {
                st.slot = Slot::Empty;
                self.cv.notify_all();
                trace!("rendezvous: offered {}, received {}", value, theirs);
                return Ok(theirs);
            }
            if st.closed {
                st.slot = Slot::Empty;
                return Err(FlowError::Closed);
            }
            if cancel.is_cancelled() {
                st.slot = Slot::Empty;
                self.cv.notify_all();
                return Err(FlowError::Interrupted("waiting at the rendezvous"));
            }
            st = self.wait(st);
        }
    }

    /// Close the rendezvous and wake any parked party. Idempotent.
    pub fn close(&self) {
        let mut st = self.lock();
        st.closed = true;
        self.cv.notify_all();
    }

    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    /// Number of completed exchanges so far.
    pub fn exchanges(&self) -> usize {
        self.exchanges.load(Ordering::Relaxed)
    }
}
