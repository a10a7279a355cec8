//! Synthetic workload for the CLI: numbered items, a sleeping processor with injected failures.

use anyhow::{Context, Result, bail};
use log::debug;
use std::thread;
use std::time::Duration;

use crate::utils::config::WorkloadDefaults;

/// Shape of the generated workload.
#[derive(Clone, Debug)]
pub struct WorkloadOpts {
    /// Items `"1"..="items"` are generated.
    pub items: usize,
    /// Sleep per item, simulating work.
    pub work_ms: u64,
    /// Every item whose number is a multiple of this fails. 0 = never.
    pub fail_every: usize,
}

impl Default for WorkloadOpts {
    fn default() -> Self {
        Self {
            items: WorkloadDefaults::ITEMS,
            work_ms: WorkloadDefaults::WORK_MS,
            fail_every: WorkloadDefaults::FAIL_EVERY,
        }
    }
}

impl WorkloadOpts {
    /// How many generated items will fail.
    pub fn expected_failures(&self) -> usize {
        match self.fail_every {
            0 => 0,
            n => self.items / n,
        }
    }
}

/// Lazily generated work items.
pub fn work_items(count: usize) -> impl Iterator<Item = String> + Send {
    (1..=count).map(|i| i.to_string())
}

/// Processor that sleeps `work_ms`, fails on every `fail_every`th item, and echoes the item.
pub fn make_processor(opts: &WorkloadOpts) -> impl Fn(String) -> Result<String> + Send + Sync + 'static {
    let delay = Duration::from_millis(opts.work_ms);
    let fail_every = opts.fail_every;
    move |item: String| {
        if !delay.is_zero() {
            thread::sleep(delay);
        }
        let n: usize = item
            .parse()
            .with_context(|| format!("work item {item:?} is not a number"))?;
        if fail_every > 0 && n % fail_every == 0 {
            bail!("work item {item}: simulated failure");
        }
        debug!("Processed: {}", item);
        Ok(item)
    }
}
