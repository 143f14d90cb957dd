//! File-based logging. The TUI owns the terminal's alternate screen, so
//! log output goes to rotated files under the app data directory instead of
//! stderr. `RUST_LOG` overrides the default level.

use anyhow::Result;
use flexi_logger::{Cleanup, Criterion, FileSpec, Logger, LoggerHandle, Naming, WriteMode};
use once_cell::sync::OnceCell;
use std::path::Path;

static LOGGER: OnceCell<LoggerHandle> = OnceCell::new();

pub fn init(log_dir: &Path) -> Result<()> {
    if LOGGER.get().is_some() {
        return Ok(());
    }
    let default_level = if cfg!(debug_assertions) { "debug" } else { "info" };
    let handle = Logger::try_with_env_or_str(default_level)?
        .log_to_file(FileSpec::default().directory(log_dir).basename("tacks"))
        .rotate(
            Criterion::Size(1024 * 1024),
            Naming::Numbers,
            Cleanup::KeepLogFiles(3),
        )
        .write_mode(WriteMode::BufferAndFlush)
        .append()
        .start()?;
    let _ = LOGGER.set(handle);
    Ok(())
}
