use std::path::PathBuf;

use anyhow::{bail, Context};
use flexi_logger::{Cleanup, Criterion, Duplicate, FileSpec, Logger, Naming};

use crate::config;

/// File logs at DEBUG under ~/.opportunity-matcher/logs, warnings and errors also on
/// stderr (stdout carries protocol frames and must stay clean).
pub fn init_logging() -> anyhow::Result<()> {
    let log_dir = log_dir()?;

    Logger::try_with_str("debug")?
        .log_to_file(FileSpec::default().directory(log_dir).basename(config::logging::LOG_FILE_NAME))
        .rotate(
            Criterion::Size(config::logging::LOG_ROTATE_SIZE_BYTES),
            Naming::Numbers,
            Cleanup::KeepLogFiles(config::logging::LOG_ROTATE_KEEP_FILES),
        )
        .duplicate_to_stderr(Duplicate::Warn)
        .format(flexi_logger::detailed_format)
        .start()
        .context("failed to start logger")?;

    log::info!("{}", "=".repeat(60));
    log::info!("Opportunity matcher host starting");
    log::info!("Version: {}", config::HOST_VERSION);
    log::info!("Platform: {}", std::env::consts::OS);
    log::info!("{}", "=".repeat(60));

    Ok(())
}

fn log_dir() -> anyhow::Result<PathBuf> {
    let dir = home_dir()?.join(config::logging::LOG_DIR_REL);
    std::fs::create_dir_all(&dir).with_context(|| format!("failed creating log dir {}", dir.display()))?;
    Ok(dir)
}

/// $HOME, falling back to %USERPROFILE% on Windows.
pub fn home_dir() -> anyhow::Result<PathBuf> {
    for var in ["HOME", "USERPROFILE"] {
        if let Ok(v) = std::env::var(var) {
            if !v.is_empty() {
                return Ok(PathBuf::from(v));
            }
        }
    }
    bail!("cannot determine home directory (neither HOME nor USERPROFILE is set)")
}
