//! Structured logging setup using `tracing-subscriber` and `tracing-appender`.
//!
//! Two modes:
//! - **Agent** ([`init_production`]): JSON file layer (daily rotation) + console layer
//! - **CLI** ([`init_cli`]): console-only for one-shot commands
//!
//! Logging is installed before configuration is loaded so config warnings are
//! not lost. The filter starts at a bootstrap level and is swapped for the
//! configured one through [`LoggingGuard::set_default_level`]. `RUST_LOG`
//! always wins over both.

use std::path::Path;

use anyhow::Context;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{reload, EnvFilter, Registry};

/// Holds the installed subscriber's filter handle and, in agent mode, the
/// non-blocking writer guard.
///
/// Must be kept alive for the duration of the process. Dropping it flushes
/// pending file log entries and closes the file.
pub struct LoggingGuard {
    filter: reload::Handle<EnvFilter, Registry>,
    _guard: Option<WorkerGuard>,
}

impl LoggingGuard {
    /// Replace the default filter, unless `RUST_LOG` is set.
    ///
    /// # Errors
    ///
    /// Returns an error if `level` is not a valid filter directive or the
    /// subscriber is gone.
    pub fn set_default_level(&self, level: &str) -> anyhow::Result<()> {
        if std::env::var_os(EnvFilter::DEFAULT_ENV).is_some() {
            return Ok(());
        }
        let filter = EnvFilter::try_new(level)
            .with_context(|| format!("invalid log level: {level}"))?;
        self.filter
            .reload(filter)
            .context("failed to update log filter")
    }
}

fn env_filter(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
}

/// Initialise logging with a JSON file layer.
///
/// Writes JSON logs to `{logs_dir}/kernver.log.YYYY-MM-DD` with daily
/// rotation, and human-readable output to stderr.
///
/// # Errors
///
/// Returns an error if the logs directory cannot be created or a global
/// subscriber is already installed.
pub fn init_production(logs_dir: &Path, default_level: &str) -> anyhow::Result<LoggingGuard> {
    std::fs::create_dir_all(logs_dir).map_err(|e| {
        anyhow::anyhow!(
            "failed to create logs directory {}: {e}",
            logs_dir.display()
        )
    })?;

    let file_appender = tracing_appender::rolling::daily(logs_dir, "kernver.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let (filter_layer, filter) = reload::Layer::new(env_filter(default_level));

    let json_layer = tracing_subscriber::fmt::layer()
        .json()
        .with_writer(non_blocking);

    let console_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(json_layer)
        .with(console_layer)
        .try_init()?;

    Ok(LoggingGuard {
        filter,
        _guard: Some(guard),
    })
}

/// Initialise console-only logging to stderr.
///
/// # Errors
///
/// Returns an error if a global subscriber is already installed.
pub fn init_cli(default_level: &str) -> anyhow::Result<LoggingGuard> {
    let (filter_layer, filter) = reload::Layer::new(env_filter(default_level));

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init()?;

    Ok(LoggingGuard {
        filter,
        _guard: None,
    })
}
