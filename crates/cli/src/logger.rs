//! Minimal stderr backend for the `log` facade.

use std::io::Write;

use log::{Level, LevelFilter, Log, Metadata, Record};

/// Environment variable overriding the verbosity flags.
pub const LOG_ENV: &str = "MODELCHECK_LOG";

struct StderrLogger;

impl Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record<'_>) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let level = match record.level() {
            Level::Error => "error",
            Level::Warn => "warning",
            Level::Info => "info",
            Level::Debug => "debug",
            Level::Trace => "trace",
        };
        eprintln!("{}: {}", level, record.args());
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

static LOGGER: StderrLogger = StderrLogger;

/// `-v` count to level: warnings by default, then info, debug, trace.
pub fn level_from_verbosity(verbose: u8) -> LevelFilter {
    match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

/// Parse a `MODELCHECK_LOG` value (`off`, `error`, ..., `trace`).
pub fn level_from_env(value: &str) -> Option<LevelFilter> {
    value.trim().parse().ok()
}

/// Install the logger once. `quiet` silences everything below errors.
pub fn init(verbose: u8, quiet: bool) {
    let level = std::env::var(LOG_ENV)
        .ok()
        .and_then(|v| level_from_env(&v))
        .unwrap_or(if quiet { LevelFilter::Error } else { level_from_verbosity(verbose) });
    if log::set_logger(&LOGGER).is_ok() {
        log::set_max_level(level);
    }
}
