//! Flowgate CLI: run a synthetic workload through the flow-controlled pipeline.

use anyhow::Result;
use clap::Parser;
use flowgate::engine::Cli;
use flowgate::engine::handle_run;
use std::time::Instant;

fn main() -> Result<()> {
    let start_time = Instant::now();
    let cli = Cli::parse();
    handle_run(&cli)?;
    log::debug!("Total time: {:?}", start_time.elapsed());
    Ok(())
}
