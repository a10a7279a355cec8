//! CLI command handler: build options from file + flags, run the synthetic workload, report.

use anyhow::{Context, Result, bail};
use kdam::Animation;
use log::{debug, info, warn};

use crate::engine::arg_parser::Cli;
use crate::engine::progress::{
    ProgressBarConfig, create_progress_bar, finish_progress_bar, update_progress_bar,
};
use crate::engine::workload::{WorkloadOpts, make_processor, work_items};
use crate::utils::flowgate_toml::{apply_file_to_opts, load_flowgate_toml};
use crate::utils::setup_logging;
use crate::{Admission, CancelToken, FlowConfig, FlowError, FlowOpts, RunReport, run_with_cancel};

/// Everything one CLI run needs: pipeline options, workload shape, output switches.
#[derive(Clone, Debug, Default)]
pub struct RunOpts {
    pub flow: FlowOpts,
    pub workload: WorkloadOpts,
    pub verbose: bool,
    pub progress: bool,
    pub json: bool,
}

/// Overwrite opts field from a CLI flag when given.
macro_rules! apply_cli_opt {
    ($cli:expr, $opts:expr, $cli_field:ident => $opts_field:ident) => {
        if let Some(v) = $cli.$cli_field {
            $opts.$opts_field = v;
        }
    };
}

/// Apply CLI flags on top of opts (defaults, then file, then flags).
pub fn apply_cli_to_opts(cli: &Cli, opts: &mut RunOpts) {
    apply_cli_opt!(cli, opts.flow, threads => pool_size);
    apply_cli_opt!(cli, opts.flow, lo => lo_watermark);
    apply_cli_opt!(cli, opts.flow, hi => hi_watermark);
    if cli.queue_cap.is_some() {
        opts.flow.queue_capacity = cli.queue_cap;
    }
    if let Some(reject) = cli.reject {
        opts.flow.admission = if reject {
            Admission::Reject
        } else {
            Admission::Block
        };
    }
    if let Some(ms) = cli.poll_ms {
        opts.flow.poll_interval = std::time::Duration::from_millis(ms);
    }
    apply_cli_opt!(cli, opts.workload, items => items);
    apply_cli_opt!(cli, opts.workload, work_ms => work_ms);
    apply_cli_opt!(cli, opts.workload, fail_every => fail_every);
    apply_cli_opt!(cli, opts, verbose => verbose);
    apply_cli_opt!(cli, opts, progress => progress);
    opts.json = cli.json;
}

/// Defaults, then the settings file (if any), then CLI flags.
pub fn setup_opts(cli: &Cli) -> Result<RunOpts> {
    let mut opts = RunOpts::default();
    let (settings_path, required) = cli.settings_path();
    if let Some(file) = load_flowgate_toml(&settings_path, required)? {
        apply_file_to_opts(&file, &mut opts);
    }
    apply_cli_to_opts(cli, &mut opts);
    Ok(opts)
}

fn print_report(report: &RunReport, opts: &RunOpts) -> Result<()> {
    if opts.json {
        println!(
            "{}",
            serde_json::to_string_pretty(report).context("serialize run report")?
        );
    } else {
        println!(
            "submitted {}  succeeded {}  failed {} (rejected {})  in flight {}",
            report.submitted, report.succeeded, report.failed, report.rejected, report.in_flight
        );
        println!(
            "peak in flight {}  exchanges {}  elapsed {} ms",
            report.peak_in_flight, report.exchanges, report.elapsed_ms
        );
    }
    Ok(())
}

/// Run the synthetic workload. Ctrl+C cancels the run; the partial report is still printed.
pub fn handle_run(cli: &Cli) -> Result<()> {
    let opts = setup_opts(cli)?;
    setup_logging(opts.verbose);
    let config = FlowConfig::try_from(&opts.flow).context("invalid pipeline settings")?;
    debug!("{:?}", opts.workload);

    let cancel = CancelToken::new();
    let cancel_handler = cancel.clone();
    ctrlc::set_handler(move || cancel_handler.cancel()).context("set Ctrl+C handler")?;

    let total = opts.workload.items;
    let bar = opts
        .progress
        .then(|| create_progress_bar(ProgressBarConfig::new(total, "Draining", Animation::Classic)));
    let mut done = 0_usize;
    let sink = |item: String| {
        done += 1;
        debug!("DONE: {}", item);
        if let Some(bar) = &bar {
            update_progress_bar(bar, 1);
        }
    };

    let result = run_with_cancel(
        &config,
        &cancel,
        work_items(total),
        make_processor(&opts.workload),
        sink,
    );
    if let Some(bar) = &bar {
        finish_progress_bar(bar, done);
    }

    match result {
        Ok(report) => {
            let expected = opts.workload.expected_failures();
            if report.failed != expected {
                warn!(
                    "{} failures, expected {} from the workload",
                    report.failed, expected
                );
            }
            info!("Items done: {}", done);
            print_report(&report, &opts)
        }
        Err(FlowError::Cancelled { report }) => {
            print_report(&report, &opts)?;
            bail!("Run cancelled by user after {} items", done)
        }
        Err(e) => Err(e).context("pipeline run failed"),
    }
}
