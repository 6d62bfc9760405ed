//! Logging infrastructure.
//!
//! Provides structured logging with file output and console output:
//! - Writes to `logs/edrp_status_bot.log` (truncated on session start)
//! - File lines use the legacy `EDRP|<timestamp>|<level>|<target>|<message>`
//!   pipe format consumed by existing tooling
//! - Also prints to stdout for tailing
//! - Configurable via RUST_LOG environment variable

use std::fmt::{self, Write as _};
use std::fs;
use std::io;
use std::path::Path;
use tracing::{Event, Subscriber};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use crate::config::Config;

/// Guard that must be kept alive for the duration of logging.
///
/// Dropping this guard will flush and close the log file writer.
pub struct LoggingGuard {
    _file_guard: WorkerGuard,
}

/// Pipe-delimited event format: `EDRP|<timestamp>|<level>|<target>|<message>`.
struct EdrpFormat;

impl<S, N> FormatEvent<S, N> for EdrpFormat
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        let metadata = event.metadata();
        write!(
            writer,
            "EDRP|{}|{}|{}|",
            chrono::Utc::now().format("%Y-%m-%d %H:%M:%S%.3f"),
            metadata.level(),
            metadata.target()
        )?;
        ctx.field_format().format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}

/// Initialize the logging system.
///
/// Creates the log directory if needed, truncates the previous log file,
/// and sets up dual output to both file and stdout. The file layer uses the
/// legacy pipe format; the stdout layer uses the default console format.
///
/// # Arguments
/// - `config` - Application configuration providing log directory and file name
///
/// # Returns
/// - `Ok(LoggingGuard)` - Guard that must be kept alive for logging to work
/// - `Err(io::Error)` - Log directory or file could not be prepared
pub fn init(config: &Config) -> Result<LoggingGuard, io::Error> {
    fs::create_dir_all(&config.log_dir)?;

    // Truncate the previous run's log. Handles both existing and
    // non-existing files.
    let log_path = Path::new(&config.log_dir).join(&config.log_file);
    fs::write(&log_path, "")?;

    let file_appender = tracing_appender::rolling::never(&config.log_dir, &config.log_file);
    let (non_blocking_file, file_guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking_file)
        .with_ansi(false)
        .event_format(EdrpFormat);

    let stdout_layer = tracing_subscriber::fmt::layer()
        .with_writer(io::stdout)
        .with_ansi(true);

    // Defaults to INFO if RUST_LOG is not set
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(stdout_layer)
        .init();

    Ok(LoggingGuard {
        _file_guard: file_guard,
    })
}
