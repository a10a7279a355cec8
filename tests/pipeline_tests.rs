//! End-to-end pipeline behavior: conservation, backpressure, completion order, termination, failures.

use flowgate::{Admission, CancelToken, FlowConfig, FlowError, FlowOpts, RunReport, run, run_with_cancel};
use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::Duration;

fn config(pool: usize, lo: usize, hi: usize) -> FlowConfig {
    FlowConfig::new(pool, lo, hi).unwrap()
}

/// submitted == succeeded + processing failures + in flight
fn assert_conserved(report: &RunReport) {
    assert_eq!(
        report.submitted,
        report.succeeded + (report.failed - report.rejected) + report.in_flight as usize,
        "{report:?}"
    );
}

// --- concrete scenario: pool 4, lo 2, hi 5, identity over 1..=20 ---

#[test]
fn test_identity_twenty_items() {
    let mut log = Vec::new();
    let report = run(&config(4, 2, 5), 1..=20u32, |n| Ok(n), |n| log.push(n)).unwrap();

    assert_eq!(report.totals(), (0, 0));
    assert_eq!(log.len(), 20);
    let distinct: HashSet<u32> = log.iter().copied().collect();
    assert_eq!(distinct, (1..=20).collect::<HashSet<u32>>());
    assert_eq!(report.submitted, 20);
    assert_eq!(report.succeeded, 20);
    assert_conserved(&report);
}

// --- conservation with injected processing failures ---

#[test]
fn test_conservation_with_failures() {
    let mut seen = Vec::new();
    let report = run(
        &config(3, 2, 6),
        1..=50u32,
        |n| {
            if n % 5 == 0 {
                anyhow::bail!("item {n} rejected by processor");
            }
            Ok(n * 10)
        },
        |n| seen.push(n),
    )
    .unwrap();

    assert_eq!(report.totals(), (10, 0));
    assert_eq!(report.rejected, 0);
    assert_eq!(seen.len(), 40);
    assert!(seen.iter().all(|n| n % 50 != 0));
    assert_conserved(&report);
}

// --- backpressure bound ---

#[test]
fn test_peak_in_flight_bounded_by_hi_plus_one() {
    let hi = 16;
    let report = run(
        &config(8, 3, hi),
        0..2000u64,
        |n| {
            if n % 7 == 0 {
                thread::sleep(Duration::from_micros(200));
            }
            Ok(n)
        },
        |_| {},
    )
    .unwrap();

    assert_eq!(report.totals(), (0, 0));
    assert_eq!(report.succeeded, 2000);
    assert!(
        report.peak_in_flight <= hi as isize + 1,
        "peak {} exceeds hi + 1",
        report.peak_in_flight
    );
    assert!(report.exchanges > 0);
}

#[test]
fn test_feeder_stays_paused_until_low_watermark() {
    // Every task blocks on the gate, so nothing drains until the test releases work.
    let (gate_tx, gate_rx) = crossbeam_channel::unbounded::<()>();
    let pulled = Arc::new(AtomicUsize::new(0));

    let pulled_in = Arc::clone(&pulled);
    let handle = thread::spawn(move || {
        let input = (0..40u32).inspect(move |_| {
            pulled_in.fetch_add(1, Ordering::SeqCst);
        });
        run(
            &config(8, 1, 4),
            input,
            move |n| {
                let _ = gate_rx.recv();
                Ok(n)
            },
            |_| {},
        )
    });

    thread::sleep(Duration::from_millis(300));
    let paused_at = pulled.load(Ordering::SeqCst);
    assert!(
        (4..=5).contains(&paused_at),
        "feeder pulled {paused_at} items before pausing"
    );

    // Two completions leave in-flight above lo = 1: the feeder must stay parked.
    gate_tx.send(()).unwrap();
    gate_tx.send(()).unwrap();
    thread::sleep(Duration::from_millis(300));
    assert_eq!(pulled.load(Ordering::SeqCst), paused_at);

    // Closing the gate lets every remaining task through.
    drop(gate_tx);
    let report = handle.join().unwrap().unwrap();
    assert_eq!(pulled.load(Ordering::SeqCst), 40);
    assert_eq!(report.totals(), (0, 0));
    assert_eq!(report.succeeded, 40);
}

// --- completion order ---

#[test]
fn test_results_arrive_in_completion_order() {
    let mut order = Vec::new();
    let report = run(
        &config(2, 0, 10),
        [1u32, 2],
        |n| {
            let ms = if n == 1 { 100 } else { 10 };
            thread::sleep(Duration::from_millis(ms));
            Ok(n)
        },
        |n| order.push(n),
    )
    .unwrap();

    assert_eq!(order, vec![2, 1]);
    assert_eq!(report.totals(), (0, 0));
}

// --- termination ---

#[test]
fn test_empty_input_terminates() {
    let mut calls = 0;
    let report = run(
        &config(2, 1, 3),
        std::iter::empty::<u32>(),
        |n| Ok(n),
        |_: u32| calls += 1,
    )
    .unwrap();

    assert_eq!(calls, 0);
    assert_eq!(report.totals(), (0, 0));
    assert_eq!(report.submitted, 0);
}

#[test]
fn test_input_shorter_than_high_watermark_terminates() {
    let mut seen = 0;
    let report = run(&config(4, 10, 100), 0..7u32, |n| Ok(n), |_| seen += 1).unwrap();

    assert_eq!(seen, 7);
    assert_eq!(report.totals(), (0, 0));
}

#[test]
fn test_all_failures() {
    let mut calls = 0;
    let report = run(
        &config(4, 2, 5),
        0..30u32,
        |n| -> anyhow::Result<u32> { anyhow::bail!("always fails: {n}") },
        |_| calls += 1,
    )
    .unwrap();

    assert_eq!(calls, 0);
    assert_eq!(report.totals(), (30, 0));
    assert_eq!(report.succeeded, 0);
    assert_conserved(&report);
}

#[test]
fn test_zero_watermarks_terminate() {
    let mut seen = Vec::new();
    let report = run(&config(3, 0, 0), 0..50u32, |n| Ok(n), |n| seen.push(n)).unwrap();

    assert_eq!(seen.len(), 50);
    assert_eq!(report.totals(), (0, 0));
    // Every submission crosses hi = 0, so the feeder parks once per item plus the sentinel.
    assert!(report.exchanges >= 50);
    assert!(report.peak_in_flight <= 1, "peak {}", report.peak_in_flight);
}

#[test]
fn test_zero_watermarks_slow_worker_one_at_a_time() {
    // The drainer parks at in-flight 0 before each submission; pairing with that offer must not
    // let a second item in before the first is drained.
    for _ in 0..5 {
        let report = run(
            &config(1, 0, 0),
            0..20u32,
            |n| {
                thread::sleep(Duration::from_millis(5));
                Ok(n)
            },
            |_| {},
        )
        .unwrap();
        assert_eq!(report.totals(), (0, 0));
        assert_eq!(report.succeeded, 20);
        assert_eq!(report.peak_in_flight, 1);
    }
}

#[test]
fn test_single_worker_equal_watermarks() {
    let mut seen = 0;
    let report = run(
        &config(1, 3, 3),
        0..60u32,
        |n| {
            thread::sleep(Duration::from_millis(1));
            Ok(n + 1)
        },
        |_| seen += 1,
    )
    .unwrap();
    assert_eq!(seen, 60);
    assert_eq!(report.totals(), (0, 0));
    assert!(report.peak_in_flight <= 4, "peak {}", report.peak_in_flight);
}

// --- failure kinds ---

#[test]
fn test_processor_panic_counted_as_failure() {
    let mut seen = Vec::new();
    let report = run(
        &config(2, 1, 4),
        1..=10u32,
        |n| {
            if n == 3 {
                panic!("bad item");
            }
            Ok(n)
        },
        |n| seen.push(n),
    )
    .unwrap();

    assert_eq!(report.totals(), (1, 0));
    assert_eq!(seen.len(), 9);
    assert!(!seen.contains(&3));
}

#[test]
fn test_rejected_submissions_are_counted() {
    let opts = FlowOpts {
        pool_size: 1,
        lo_watermark: 10,
        hi_watermark: 100,
        queue_capacity: Some(1),
        admission: Admission::Reject,
        ..Default::default()
    };
    let config = FlowConfig::try_from(&opts).unwrap();
    let mut seen = 0;
    let report = run(
        &config,
        0..20u32,
        |n| {
            thread::sleep(Duration::from_millis(20));
            Ok(n)
        },
        |_| seen += 1,
    )
    .unwrap();

    assert!(report.rejected > 0, "{report:?}");
    assert_eq!(report.submitted + report.rejected, 20);
    assert_eq!(report.failed, report.rejected);
    assert_eq!(seen, report.submitted);
    assert_eq!(report.in_flight, 0);
    assert_conserved(&report);
}

#[test]
fn test_blocking_admission_with_small_queue_loses_nothing() {
    let opts = FlowOpts {
        pool_size: 2,
        lo_watermark: 4,
        hi_watermark: 32,
        queue_capacity: Some(1),
        admission: Admission::Block,
        ..Default::default()
    };
    let config = FlowConfig::try_from(&opts).unwrap();
    let mut seen = 0;
    let report = run(
        &config,
        0..100u32,
        |n| {
            thread::sleep(Duration::from_millis(1));
            Ok(n)
        },
        |_| seen += 1,
    )
    .unwrap();

    assert_eq!(seen, 100);
    assert_eq!(report.totals(), (0, 0));
    assert_eq!(report.rejected, 0);
}

// --- cancellation and loop failures ---

#[test]
fn test_cancel_stops_run_with_partial_report() {
    let cancel = CancelToken::new();
    let canceller = cancel.clone();
    let timer = thread::spawn(move || {
        thread::sleep(Duration::from_millis(100));
        canceller.cancel();
    });

    let result = run_with_cancel(
        &config(2, 2, 8),
        &cancel,
        0..1000u32,
        |n| {
            thread::sleep(Duration::from_millis(20));
            Ok(n)
        },
        |_| {},
    );
    timer.join().unwrap();

    match result {
        Err(FlowError::Cancelled { report }) => {
            assert!(report.submitted < 1000, "{report:?}");
            assert!(report.peak_in_flight <= 9);
        }
        other => panic!("expected cancellation, got {other:?}"),
    }
}

#[test]
fn test_cancelled_before_start() {
    let cancel = CancelToken::new();
    cancel.cancel();
    let result = run_with_cancel(&config(2, 1, 4), &cancel, 0..10u32, |n| Ok(n), |_| {});
    assert!(matches!(result, Err(FlowError::Cancelled { .. })));
}

#[test]
fn test_sink_panic_does_not_hang() {
    let result = run(
        &config(2, 1, 4),
        0..100u32,
        |n| Ok(n),
        |n| {
            if n == 10 {
                panic!("sink failed");
            }
        },
    );
    assert!(
        matches!(result, Err(FlowError::LoopPanicked("drainer"))),
        "{result:?}"
    );
}

#[test]
fn test_input_panic_does_not_hang() {
    let input = (0..100u32).map(|n| {
        if n == 20 {
            panic!("input source failed");
        }
        n
    });
    let result = run(&config(2, 1, 4), input, |n| Ok(n), |_| {});
    assert!(
        matches!(result, Err(FlowError::LoopPanicked("feeder"))),
        "{result:?}"
    );
}

#[test]
fn test_caller_token_untouched_by_loop_failure() {
    let cancel = CancelToken::new();
    let result = run_with_cancel(
        &config(2, 1, 4),
        &cancel,
        0..10u32,
        |n| Ok(n),
        |_| panic!("sink failed"),
    );
    assert!(result.is_err());
    assert!(!cancel.is_cancelled());
}
