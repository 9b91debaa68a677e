//! Logging Infrastructure
//!
//! `RUST_LOG` overrides the configured level. When the log directory exists
//! output goes to a daily rolling file instead of stdout.

use std::path::Path;
use tracing_subscriber::EnvFilter;

/// Initialize the logger with optional JSON format and file output
pub fn init_logger_with_file(log_level: Option<&str>, json: Option<bool>, log_dir: Option<&str>) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level.unwrap_or("info")));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_file(false)
        .with_line_number(false)
        .with_thread_ids(false)
        .with_target(true);

    let file_dir = log_dir.map(Path::new).filter(|p| p.is_dir());

    let result = match (json.unwrap_or(false), file_dir) {
        (true, Some(dir)) => builder
            .json()
            .with_writer(tracing_appender::rolling::daily(dir, "clinic-server"))
            .try_init(),
        (true, None) => builder.json().try_init(),
        (false, Some(dir)) => builder
            .with_ansi(false)
            .with_writer(tracing_appender::rolling::daily(dir, "clinic-server"))
            .try_init(),
        (false, None) => builder.try_init(),
    };

    // A global subscriber may already be installed (tests)
    if let Err(e) = result {
        tracing::debug!("Logger already initialized: {}", e);
    }
}
