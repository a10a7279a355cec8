//! Load `.flowgate.toml` settings (CLI only). The library never reads files; callers pass [`FlowOpts`](crate::FlowOpts).

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

use crate::Admission;
use crate::engine::RunOpts;

#[derive(Debug, Default, Deserialize)]
pub struct FlowgateToml {
    #[serde(default)]
    settings: SettingsSection,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct SettingsSection {
    threads: Option<usize>,
    lo_watermark: Option<usize>,
    hi_watermark: Option<usize>,
    queue_capacity: Option<usize>,
    admission: Option<Admission>,
    poll_ms: Option<u64>,
    items: Option<usize>,
    work_ms: Option<u64>,
    fail_every: Option<usize>,
    verbose: Option<bool>,
    progress: Option<bool>,
}

/// Load settings from `path`. A missing file is `None` unless `required`; malformed TOML is always an error.
pub fn load_flowgate_toml(path: &Path, required: bool) -> Result<Option<FlowgateToml>> {
    if !required && !path.is_file() {
        return Ok(None);
    }
    let s = std::fs::read_to_string(path)
        .with_context(|| format!("read settings file {}", path.display()))?;
    let file = parse_flowgate_toml(&s)
        .with_context(|| format!("parse settings file {}", path.display()))?;
    Ok(Some(file))
}

pub fn parse_flowgate_toml(s: &str) -> Result<FlowgateToml, toml::de::Error> {
    toml::from_str(s)
}

/// Overwrite opts field from file when present.
macro_rules! apply_file_opt {
    ($sec:expr, $opts:expr, $sec_field:ident => $opts_field:ident) => {
        if let Some(v) = $sec.$sec_field {
            $opts.$opts_field = v;
        }
    };
}

/// Apply file settings to opts (only fields present in the file). Call before applying CLI flags.
pub fn apply_file_to_opts(file: &FlowgateToml, opts: &mut RunOpts) {
    let sec = &file.settings;
    apply_file_opt!(sec, opts.flow, threads => pool_size);
    apply_file_opt!(sec, opts.flow, lo_watermark => lo_watermark);
    apply_file_opt!(sec, opts.flow, hi_watermark => hi_watermark);
    if sec.queue_capacity.is_some() {
        opts.flow.queue_capacity = sec.queue_capacity;
    }
    apply_file_opt!(sec, opts.flow, admission => admission);
    if let Some(ms) = sec.poll_ms {
        opts.flow.poll_interval = std::time::Duration::from_millis(ms);
    }
    apply_file_opt!(sec, opts.workload, items => items);
    apply_file_opt!(sec, opts.workload, work_ms => work_ms);
    apply_file_opt!(sec, opts.workload, fail_every => fail_every);
    apply_file_opt!(sec, opts, verbose => verbose);
    apply_file_opt!(sec, opts, progress => progress);
}
