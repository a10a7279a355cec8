//! Application configuration constants.
//! Defaults and tuning in one place.

use std::sync::OnceLock;
use std::time::Duration;

// ---- Package / paths (from CARGO_PKG_NAME, cached) ----

/// Package-derived names: built once from `CARGO_PKG_NAME`, then cached.
pub struct PackagePaths {
    pkg_name: &'static str,
    settings_filename: String,
}

static PACKAGE_PATHS: OnceLock<PackagePaths> = OnceLock::new();

impl PackagePaths {
    /// Build and cache names from `CARGO_PKG_NAME`. Called once on first use.
    pub fn get() -> &'static PackagePaths {
        PACKAGE_PATHS.get_or_init(|| {
            let pkg = env!("CARGO_PKG_NAME");
            PackagePaths {
                pkg_name: pkg,
                settings_filename: format!(".{pkg}.toml"),
            }
        })
    }

    /// Crate name, used as the log target filter and line prefix.
    pub fn pkg_name(&self) -> &'static str {
        self.pkg_name
    }

    /// Settings file looked up in the working directory when `--config` is not given.
    pub fn settings_filename(&self) -> &str {
        &self.settings_filename
    }
}

// ---- Worker threads ----

/// Thread limits for sizing the worker pool.
/// Use [`WorkerThreadLimits::current()`] to fill `all_threads` from rayon.
#[derive(Clone, Copy, Debug)]
pub struct WorkerThreadLimits {
    /// Available threads (from rayon); set by [`WorkerThreadLimits::current()`].
    pub all_threads: usize,
    /// Floor for the pool when nothing else is known.
    pub floor: usize,
}

impl Default for WorkerThreadLimits {
    fn default() -> Self {
        Self {
            all_threads: 0, // use current() to set from rayon
            floor: Self::FLOOR_THREADS,
        }
    }
}

impl WorkerThreadLimits {
    pub const FLOOR_THREADS: usize = 2;

    /// Build limits with `all_threads` set from `rayon::current_num_threads()` (never below the floor).
    pub fn current() -> Self {
        let limits = Self::default();
        Self {
            all_threads: rayon::current_num_threads().max(limits.floor),
            ..limits
        }
    }
}

// ---- Flow control ----

/// Library defaults for [`FlowOpts`](crate::FlowOpts).
pub struct PipelineDefaults;

impl PipelineDefaults {
    pub const LO_WATERMARK: usize = 10;
    pub const HI_WATERMARK: usize = 100;
    /// Blocked submit / take / exchange calls wake this often to check cancellation.
    pub const POLL_INTERVAL: Duration = Duration::from_millis(25);
}

// ---- Demo workload ----

/// Defaults for the synthetic workload driven by the CLI.
pub struct WorkloadDefaults;

impl WorkloadDefaults {
    pub const ITEMS: usize = 1000;
    /// Simulated processing time per item (millis).
    pub const WORK_MS: u64 = 20;
    /// Every Nth item fails; roughly the 10% failure rate of a noisy backend.
    pub const FAIL_EVERY: usize = 10;
}
