//! CLI driver: argument parsing, synthetic workload, progress display.

pub mod arg_parser;
pub mod cli;
pub mod progress;
pub mod workload;

pub use arg_parser::Cli;
pub use cli::{RunOpts, apply_cli_to_opts, handle_run, setup_opts};
pub use workload::{WorkloadOpts, make_processor, work_items};
