/*!
 * Logging and tracing initialization
 */

use std::fs::File;
use std::path::Path;
use tracing::Level;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::error::{ProgcallError, Result};

/// Effective level: `verbose` wins over the configured level
pub fn effective_level(config: &Config) -> Level {
    if config.verbose {
        Level::DEBUG
    } else {
        config.log_level.to_tracing_level()
    }
}

/// Initialize structured logging based on configuration
pub fn init_logging(config: &Config) -> Result<()> {
    let log_level = effective_level(config);

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(filter_directive(log_level)))
        .map_err(|e| ProgcallError::Config(format!("Failed to create log filter: {}", e)))?;

    if let Some(ref log_path) = config.log_file {
        init_file_logging(log_path, env_filter)?;
    } else {
        init_stderr_logging(env_filter);
    }

    Ok(())
}

/// Directive covering the binary and both engine crates
fn filter_directive(level: Level) -> String {
    format!(
        "progcall={level},progcall_core_marshal={level},progcall_interface={level}",
        level = level
    )
}

/// Compact logging to stderr, keeping stdout for command output
fn init_stderr_logging(env_filter: EnvFilter) {
    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_writer(std::io::stderr).compact())
        .init();
}

/// One JSON object per event, appended to `log_path`
fn init_file_logging(log_path: &Path, env_filter: EnvFilter) -> Result<()> {
    let file = File::options()
        .create(true)
        .append(true)
        .open(log_path)
        .map_err(|e| {
            ProgcallError::Config(format!("Cannot open log file {}: {}", log_path.display(), e))
        })?;

    let json_layer = fmt::layer()
        .json()
        .with_writer(file)
        .with_ansi(false)
        .with_current_span(true)
        .with_span_list(false);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json_layer)
        .init();

    Ok(())
}

/// Route engine events to the test harness output; safe to call repeatedly
#[cfg(test)]
pub fn init_test_logging() {
    let _ = tracing_subscriber::registry()
        .with(EnvFilter::new(filter_directive(Level::DEBUG)))
        .with(fmt::layer().with_test_writer())
        .try_init();
}
