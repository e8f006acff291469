use anyhow::{anyhow, Result};
use std::path::Path;
use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;

/// Route tracing output to a daily rolling file under `dir`. Keep the guard
/// alive for the whole run or buffered lines are lost.
pub fn init(dir: &Path, level: Level) -> Result<WorkerGuard> {
    std::fs::create_dir_all(dir)?;

    let appender = tracing_appender::rolling::daily(dir, "tunacard.log");
    let (writer, guard) = tracing_appender::non_blocking(appender);

    // The terminal belongs to the preview; never log to stdout/stderr.
    tracing_subscriber::fmt()
        .with_writer(writer)
        .with_ansi(false)
        .with_target(false)
        .with_max_level(level)
        .try_init()
        .map_err(|e| anyhow!(e))?;

    Ok(guard)
}
