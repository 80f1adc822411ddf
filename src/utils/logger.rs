//! stderr logging for the collector

use colored::Colorize;
use env_logger::Builder;
use log::{Level, LevelFilter};
use std::io::Write;

/// Crate target prefix (package name with `-` mapped to `_`)
const CRATE_TARGET: &str = "checksum_collector";

/// Install the global logger
///
/// Our own messages log at `info` (`debug` when verbose); dependencies only
/// at `warn`. `RUST_LOG` still takes precedence. Safe to call more than once.
pub fn setup_logging(verbose: bool) {
    let level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    let _ = Builder::new()
        .filter_level(LevelFilter::Warn)
        .filter_module(CRATE_TARGET, level)
        .parse_default_env()
        .format(|buf, record| {
            let line = match record.level() {
                Level::Error => format!("{} {}", "error:".red().bold(), record.args()),
                Level::Warn => format!("{} {}", "warning:".yellow().bold(), record.args()),
                Level::Debug | Level::Trace => format!(
                    "{} {}",
                    format!("[{}]", record.target()).dimmed(),
                    record.args()
                ),
                Level::Info => format!("{}", record.args()),
            };
            writeln!(buf, "{}", line)
        })
        .try_init();
}
