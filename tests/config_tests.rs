use flowgate::engine::{Cli, RunOpts, apply_cli_to_opts, make_processor, work_items, WorkloadOpts};
use flowgate::utils::flowgate_toml::{apply_file_to_opts, load_flowgate_toml, parse_flowgate_toml};
use flowgate::{Admission, FlowConfig, FlowError, FlowOpts};
use std::path::Path;
use std::time::Duration;

// --- FlowConfig validation ---

#[test]
fn test_config_rejects_zero_pool() {
    assert!(matches!(
        FlowConfig::new(0, 1, 5),
        Err(FlowError::InvalidConfig(_))
    ));
}

#[test]
fn test_config_rejects_lo_above_hi() {
    assert!(matches!(
        FlowConfig::new(4, 6, 5),
        Err(FlowError::InvalidConfig(_))
    ));
}

#[test]
fn test_config_accepts_equal_watermarks() {
    let config = FlowConfig::new(1, 0, 0).unwrap();
    assert_eq!(config.lo_watermark(), 0);
    assert_eq!(config.hi_watermark(), 0);
}

#[test]
fn test_config_rejects_zero_queue_and_poll() {
    let opts = FlowOpts {
        queue_capacity: Some(0),
        ..Default::default()
    };
    assert!(FlowConfig::try_from(&opts).is_err());

    let opts = FlowOpts {
        poll_interval: Duration::ZERO,
        ..Default::default()
    };
    assert!(FlowConfig::try_from(&opts).is_err());
}

#[test]
fn test_config_default_queue_capacity_is_hi_plus_one() {
    let config = FlowConfig::new(4, 2, 5).unwrap();
    assert_eq!(config.queue_capacity(), 6);
    assert_eq!(config.admission(), Admission::Block);
    assert_eq!(config.pool_size(), 4);
}

#[test]
fn test_default_opts_are_valid() {
    let opts = FlowOpts::default();
    assert!(opts.pool_size >= 1);
    assert!(FlowConfig::try_from(&opts).is_ok());
}

// --- .flowgate.toml ---

#[test]
fn test_settings_file_applied() {
    let file = parse_flowgate_toml(
        r#"
        [settings]
        threads = 3
        lo_watermark = 4
        hi_watermark = 40
        admission = "reject"
        poll_ms = 10
        items = 77
        fail_every = 0
        "#,
    )
    .unwrap();
    let mut opts = RunOpts::default();
    apply_file_to_opts(&file, &mut opts);

    assert_eq!(opts.flow.pool_size, 3);
    assert_eq!(opts.flow.lo_watermark, 4);
    assert_eq!(opts.flow.hi_watermark, 40);
    assert_eq!(opts.flow.admission, Admission::Reject);
    assert_eq!(opts.flow.poll_interval, Duration::from_millis(10));
    assert_eq!(opts.workload.items, 77);
    assert_eq!(opts.workload.fail_every, 0);
    // Untouched fields keep their defaults.
    assert_eq!(opts.workload.work_ms, WorkloadOpts::default().work_ms);
}

#[test]
fn test_settings_file_unknown_key_rejected() {
    assert!(parse_flowgate_toml("[settings]\nhigh_water = 3\n").is_err());
}

#[test]
fn test_settings_file_empty_is_ok() {
    let file = parse_flowgate_toml("").unwrap();
    let mut opts = RunOpts::default();
    apply_file_to_opts(&file, &mut opts);
    assert_eq!(opts.workload.items, WorkloadOpts::default().items);
}

#[test]
fn test_missing_settings_file() {
    let path = Path::new("/nonexistent/flowgate/settings.toml");
    assert!(load_flowgate_toml(path, false).unwrap().is_none());
    assert!(load_flowgate_toml(path, true).is_err());
}

#[test]
fn test_cli_overrides_file() {
    let file = parse_flowgate_toml("[settings]\nhi_watermark = 40\nlo_watermark = 4\n").unwrap();
    let mut opts = RunOpts::default();
    apply_file_to_opts(&file, &mut opts);

    let cli = Cli {
        hi: Some(12),
        reject: Some(true),
        json: true,
        ..Default::default()
    };
    apply_cli_to_opts(&cli, &mut opts);

    assert_eq!(opts.flow.hi_watermark, 12);
    assert_eq!(opts.flow.lo_watermark, 4);
    assert_eq!(opts.flow.admission, Admission::Reject);
    assert!(opts.json);
}

// --- synthetic workload ---

#[test]
fn test_workload_items_and_failures() {
    let opts = WorkloadOpts {
        items: 20,
        work_ms: 0,
        fail_every: 10,
    };
    let items: Vec<String> = work_items(opts.items).collect();
    assert_eq!(items.first().map(String::as_str), Some("1"));
    assert_eq!(items.len(), 20);

    let processor = make_processor(&opts);
    let failed = items
        .into_iter()
        .filter(|item| processor(item.clone()).is_err())
        .count();
    assert_eq!(failed, opts.expected_failures());
    assert_eq!(failed, 2);
}

#[test]
fn test_workload_end_to_end() {
    let opts = WorkloadOpts {
        items: 60,
        work_ms: 1,
        fail_every: 7,
    };
    let config = FlowConfig::new(4, 3, 12).unwrap();
    let mut done = 0;
    let report = flowgate::run(
        &config,
        work_items(opts.items),
        make_processor(&opts),
        |_| done += 1,
    )
    .unwrap();
    assert_eq!(report.totals(), (opts.expected_failures(), 0));
    assert_eq!(done, opts.items - opts.expected_failures());
}
