pub mod config;
pub mod flowgate_toml;
pub mod logger;

pub use config::*;
pub use logger::setup_logging;
