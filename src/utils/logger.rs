use colored::Colorize;
use env_logger::Builder;
use log::{Level, LevelFilter};
use std::io::Write;

use crate::utils::config::PackagePaths;

/// Install the env_logger backend: our crate at Info (Debug when `verbose`), dependencies at Warn.
/// `RUST_LOG` still applies on top. Lines carry the thread name so feeder, drainer and worker
/// output can be told apart.
pub fn setup_logging(verbose: bool) {
    let level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    let name = PackagePaths::get().pkg_name();

    // try_init: tests and embedding programs may have installed a logger already.
    let _ = Builder::from_default_env()
        .filter_level(LevelFilter::Warn)
        .filter_module(name, level)
        .format(move |buf, record| {
            let current = std::thread::current();
            let thread = current.name().unwrap_or("-");
            let line = match record.level() {
                Level::Error | Level::Warn => {
                    let level_str = match record.level() {
                        Level::Warn => "WARN".yellow(),
                        Level::Error => "ERROR".red(),
                        _ => unreachable!(),
                    };
                    format!(
                        "[{} {} {}] {}",
                        name.cyan(),
                        level_str,
                        thread.white(),
                        record.args()
                    )
                }
                Level::Debug | Level::Trace => {
                    format!("[{} {}] {}", name.cyan(), thread.dimmed(), record.args())
                }
                Level::Info => format!("[{}] {}", name.cyan(), record.args()),
            };
            writeln!(buf, "{}", line)
        })
        .try_init();
}
