//! Tracing setup: a stderr layer for the operator and a daily-rolling file
//! layer under the configured logs directory.

use crate::config::{LogFormat, LoggingSection};
use anyhow::{Context, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry, fmt};

pub const LOG_ENV_VAR: &str = "REDLINE_LOG";
pub const LOG_FILE_PREFIX: &str = "app.log";

/// Keeps the file writer flushing until dropped at the end of `main`.
pub struct LoggingGuard {
    _file: Option<WorkerGuard>,
}

/// Console filter: `REDLINE_LOG` wins, then verbosity.
fn console_filter(quiet: bool, verbose: bool) -> EnvFilter {
    let level = if quiet {
        "error"
    } else if verbose {
        "debug"
    } else {
        "warn"
    };
    EnvFilter::try_from_env(LOG_ENV_VAR).unwrap_or_else(|_| EnvFilter::new(level))
}

fn file_filter(level: &str) -> EnvFilter {
    EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Install the global subscriber.
///
/// With `write_file` false only the stderr layer is installed.
pub fn init_logging(
    settings: &LoggingSection,
    quiet: bool,
    verbose: bool,
    write_file: bool,
) -> Result<LoggingGuard> {
    let mut layers: Vec<Box<dyn Layer<Registry> + Send + Sync>> = Vec::new();

    let console = fmt::layer().with_writer(std::io::stderr).with_target(false);
    let console = match settings.format {
        LogFormat::Console => console
            .with_filter(console_filter(quiet, verbose))
            .boxed(),
        LogFormat::Json => console
            .json()
            .with_filter(console_filter(quiet, verbose))
            .boxed(),
    };
    layers.push(console);

    let mut file_guard = None;
    if write_file {
        std::fs::create_dir_all(&settings.logs_dir).with_context(|| {
            format!(
                "failed to create logs directory {}",
                settings.logs_dir.display()
            )
        })?;
        let appender = tracing_appender::rolling::daily(&settings.logs_dir, LOG_FILE_PREFIX);
        let (writer, guard) = tracing_appender::non_blocking(appender);
        let level = if verbose { "debug" } else { settings.level.as_str() };
        let file = fmt::layer().with_ansi(false).with_writer(writer);
        let file = match settings.format {
            LogFormat::Console => file.with_filter(file_filter(level)).boxed(),
            LogFormat::Json => file.json().with_filter(file_filter(level)).boxed(),
        };
        layers.push(file);
        file_guard = Some(guard);
    }

    tracing_subscriber::registry()
        .with(layers)
        .try_init()
        .map_err(|error| anyhow::anyhow!("failed to initialize tracing subscriber: {error}"))?;

    Ok(LoggingGuard { _file: file_guard })
}
