use anyhow::{Context, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::AppConfig;

/// Route tracing output to a daily-rolling file; the terminal belongs to the dashboard.
///
/// `RUST_LOG` wins over `KUV_LOG_LEVEL`. Keep the returned guard alive until exit
/// so buffered lines are flushed.
pub fn init_logging(config: &AppConfig) -> Result<WorkerGuard> {
    std::fs::create_dir_all(&config.log_dir)
        .with_context(|| format!("failed to create log dir {}", config.log_dir.display()))?;

    let file_appender = tracing_appender::rolling::daily(&config.log_dir, "kuv.log");
    let (writer, guard) = tracing_appender::non_blocking(file_appender);

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_target(true),
        )
        .try_init()
        .context("failed to install tracing subscriber")?;

    Ok(guard)
}
