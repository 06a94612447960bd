//! Minimal stderr sink for the `log` facade, installed by the binary.

use log::{LevelFilter, Log, Metadata, Record};

/// Environment variable read when no level flag is given.
pub const LOG_ENV: &str = "LOXIM_LOG";

struct StderrLogger;

static LOGGER: StderrLogger = StderrLogger;

impl Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record<'_>) {
        if self.enabled(record.metadata()) {
            eprintln!("[{:<5} {}] {}", record.level(), record.target(), record.args());
        }
    }

    fn flush(&self) {}
}

/// Installs the sink. Calling it twice keeps the first logger but still
/// updates the level.
pub fn init(level: LevelFilter) {
    let _ = log::set_logger(&LOGGER);
    log::set_max_level(level);
}

/// Level from `LOXIM_LOG`, or `Warn` when unset or unparsable.
pub fn level_from_env() -> LevelFilter {
    std::env::var(LOG_ENV)
        .ok()
        .and_then(|value| parse_level(&value))
        .unwrap_or(LevelFilter::Warn)
}

fn parse_level(value: &str) -> Option<LevelFilter> {
    value.trim().parse().ok()
}
