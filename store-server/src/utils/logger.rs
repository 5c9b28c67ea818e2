//! Logging Infrastructure
//!
//! Structured logging setup for development (stdout) and production
//! (daily-rolling files under the work directory).

use std::path::Path;
use tracing_subscriber::EnvFilter;

fn filter(level: &str) -> EnvFilter {
    EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Initialize stdout logging
pub fn init_logger(level: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(filter(level))
        .with_target(false)
        .init();
}

/// Initialize logging with daily-rolling file output
pub fn init_logger_with_file(level: &str, log_dir: impl AsRef<Path>) {
    let dir = log_dir.as_ref();
    if std::fs::create_dir_all(dir).is_err() {
        init_logger(level);
        return;
    }
    let file_appender = tracing_appender::rolling::daily(dir, "store-server");
    tracing_subscriber::fmt()
        .with_env_filter(filter(level))
        .with_target(false)
        .with_ansi(false)
        .with_writer(file_appender)
        .init();
}
