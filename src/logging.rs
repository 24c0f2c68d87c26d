//! Tracing setup. The terminal UI owns the screen, so in that mode logs go to
//! a daily-rolling file; headless runs log to stderr.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

const LOG_FILE_PREFIX: &str = "variance-wizard.log";

pub enum LogTarget {
    Stderr,
    Directory(PathBuf),
}

/// Keeps the background log writer alive; dropping it flushes pending lines.
pub struct LogGuard {
    _worker: Option<WorkerGuard>,
}

/// Default log directory under the platform's local data directory.
pub fn default_log_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("variance-wizard")
        .join("logs")
}

fn filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("variance_wizard={level},warn")))
}

fn file_writer(dir: &Path) -> Result<(tracing_appender::non_blocking::NonBlocking, WorkerGuard)> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("create log directory {}", dir.display()))?;
    let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
    Ok(tracing_appender::non_blocking(appender))
}

pub fn init(target: LogTarget, level: &str) -> Result<LogGuard> {
    let registry = Registry::default().with(filter(level));
    match target {
        LogTarget::Stderr => {
            registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_target(false)
                        .with_writer(std::io::stderr),
                )
                .try_init()
                .context("install tracing subscriber")?;
            Ok(LogGuard { _worker: None })
        }
        LogTarget::Directory(dir) => {
            let (writer, guard) = file_writer(&dir)?;
            registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_ansi(false)
                        .with_writer(writer),
                )
                .try_init()
                .context("install tracing subscriber")?;
            Ok(LogGuard {
                _worker: Some(guard),
            })
        }
    }
}
