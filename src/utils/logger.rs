use colored::Colorize;
use env_logger::Builder;
use log::{Level, LevelFilter};
use std::io::Write;

/// Install the global logger. Our crate logs at Info (Debug with `verbose`);
/// dependencies only surface warnings. Worker threads log through this
/// concurrently, so each record is a single `writeln!`.
pub fn setup_logging(verbose: bool) {
    let level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    Builder::from_default_env()
        .filter_level(LevelFilter::Warn)
        .filter_module(env!("CARGO_PKG_NAME"), level)
        .format(move |buf, record| {
            let name = env!("CARGO_PKG_NAME").cyan();
            let prefix = match record.level() {
                Level::Error => format!("[{} {}]", name, "ERROR".red()),
                Level::Warn => format!("[{} {}]", name, "WARN".yellow()),
                Level::Debug | Level::Trace => {
                    format!("[{} {}]", name, record.target().white())
                }
                Level::Info => format!("[{}]", name),
            };
            writeln!(buf, "{} {}", prefix, record.args())
        })
        .init();
}
