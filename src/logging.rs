use anyhow::Result;
use std::path::Path;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Default directory for log files
pub const LOGS_DIR: &str = "logs";

/// Initialize the logging system in the default `logs/` directory
pub fn init_logging() -> Result<()> {
    init_logging_in(LOGS_DIR)
}

/// Initialize the logging system
/// Logs will be written to `dir` only (no console output)
pub fn init_logging_in(dir: impl AsRef<Path>) -> Result<()> {
    let dir = dir.as_ref();
    std::fs::create_dir_all(dir)?;

    // File appender - daily rotation
    let file_appender = RollingFileAppender::new(Rotation::DAILY, dir, "director.log");

    let file_layer = fmt::layer()
        .with_writer(file_appender)
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(true)
        .with_line_number(true);

    // Default to INFO level, can be overridden with RUST_LOG env var
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    // Hosts may already have a subscriber installed
    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .try_init()?;

    tracing::info!("Logging system initialized");
    tracing::info!("Log files location: {}", dir.join("director.log").display());

    Ok(())
}

/// Check if the logs directory exists
pub fn logs_dir_exists(dir: impl AsRef<Path>) -> bool {
    dir.as_ref().exists()
}
