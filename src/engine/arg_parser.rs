use clap::Parser;
use std::path::PathBuf;

use crate::utils::config::PackagePaths;

/// Push a synthetic workload through the flow-controlled pipeline.
#[derive(Clone, Debug, Default, Parser)]
#[command(name = "flowgate")]
#[command(
    about = "Run a synthetic workload through a watermark-controlled worker pool and report totals."
)]
pub struct Cli {
    /// Number of work items to generate (1..=N).
    #[arg(long, short = 'n')]
    pub items: Option<usize>,

    /// Worker pool size. Default: available cores.
    #[arg(long, short = 't')]
    pub threads: Option<usize>,

    /// Low watermark: the feeder resumes once in-flight drops to this.
    #[arg(long)]
    pub lo: Option<usize>,

    /// High watermark: the feeder pauses once in-flight reaches this.
    #[arg(long)]
    pub hi: Option<usize>,

    /// Simulated processing time per item, in milliseconds.
    #[arg(long, short = 'w')]
    pub work_ms: Option<u64>,

    /// Fail every Nth item (0 disables failures).
    #[arg(long, short = 'f')]
    pub fail_every: Option<usize>,

    /// Worker job queue capacity. Default: hi + 1.
    #[arg(long)]
    pub queue_cap: Option<usize>,

    /// Reject submissions when the job queue is full instead of waiting.
    #[arg(long, num_args = 0..=1, default_missing_value = "true", value_parser = clap::value_parser!(bool))]
    pub reject: Option<bool>,

    /// How often blocked calls check for Ctrl+C, in milliseconds.
    #[arg(long)]
    pub poll_ms: Option<u64>,

    /// Settings file. Default: `.flowgate.toml` in the current directory, if present.
    #[arg(long, short = 'c', value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Print the final report as JSON.
    #[arg(long)]
    pub json: bool,

    /// Verbose output (per-item and rendezvous logging).
    #[arg(long, short = 'v', num_args = 0..=1, default_missing_value = "true", value_parser = clap::value_parser!(bool))]
    pub verbose: Option<bool>,

    /// Show a progress bar while draining.
    #[arg(long, short = 'p', num_args = 0..=1, default_missing_value = "true", value_parser = clap::value_parser!(bool))]
    pub progress: Option<bool>,
}

impl Cli {
    /// Explicit `--config`, or the default settings file name relative to the working directory.
    pub fn settings_path(&self) -> (PathBuf, bool) {
        match &self.config {
            Some(p) => (p.clone(), true),
            None => (PathBuf::from(PackagePaths::get().settings_filename()), false),
        }
    }
}
