use slog::o;
use slog::Drain;
use slog::Level;
use slog::LevelFilter;
#[cfg(all(target_os = "linux", feature = "journald"))]
use slog_journald::JournaldDrain;
#[cfg(feature = "syslog")]
use slog_syslog::Facility;

use std::fs::OpenOptions;

use super::error::Result;
use crate::app_config::AppConfig;

pub fn setup_logging() -> Result<slog_scope::GlobalLoggerGuard> {
    // Install the global logger and bridge the `log` crate into slog.
    let guard = slog_scope::set_global_logger(default_root_logger()?);
    slog_stdlog::init()?;

    Ok(guard)
}

pub fn default_root_logger() -> Result<slog::Logger> {
    let log_level = get_log_level_from_config();

    // Terminal drain for stdout output
    let term_drain = default_term_drain().unwrap_or(default_discard()?);

    // File drain for persistent diagnostic output
    let file_drain = default_file_drain().unwrap_or(default_discard()?);

    let drain = slog::Duplicate(term_drain, file_drain).fuse();

    // Merge additional drains based on features
    #[cfg(feature = "syslog")]
    let drain = slog::Duplicate(default_syslog_drain().unwrap_or(default_discard()?), drain).fuse();
    #[cfg(feature = "journald")]
    #[cfg(target_os = "linux")]
    let drain = slog::Duplicate(
        default_journald_drain().unwrap_or(default_discard()?),
        drain,
    )
    .fuse();

    let drain = LevelFilter::new(drain, log_level).fuse();

    let logger = slog::Logger::root(drain, o!());

    Ok(logger)
}

/// Read the log level from configuration, defaulting to Info.
fn get_log_level_from_config() -> Level {
    // Tests may run without an initialized configuration.
    #[cfg(test)]
    {
        Level::Info
    }

    #[cfg(not(test))]
    {
        if let Ok(config) = AppConfig::get::<crate::app_config::LogConfig>("log") {
            match config.level.as_str() {
                "debug" => Level::Debug,
                "info" => Level::Info,
                "warn" => Level::Warning,
                "error" => Level::Error,
                _ => Level::Info,
            }
        } else {
            Level::Info
        }
    }
}

fn default_discard() -> Result<slog_async::Async> {
    let drain = slog_async::Async::new(slog::Discard).chan_size(1024).build();

    Ok(drain)
}

// term drain: Log to Terminal
#[cfg(not(feature = "termlog"))]
fn default_term_drain() -> Result<slog_async::Async> {
    let plain = slog_term::PlainSyncDecorator::new(std::io::stdout());
    let term = slog_term::FullFormat::new(plain).use_custom_timestamp(slog_term::timestamp_local);

    let drain = slog_async::Async::new(term.build().fuse())
        .chan_size(1024)
        .build();

    Ok(drain)
}

// term drain: Log to Terminal, with source locations
#[cfg(feature = "termlog")]
fn default_term_drain() -> Result<slog_async::Async> {
    let plain = slog_term::PlainSyncDecorator::new(std::io::stdout());
    let term = slog_term::FullFormat::new(plain)
        .use_file_location()
        .use_custom_timestamp(slog_term::timestamp_local);

    let drain = slog_async::Async::new(term.build().fuse())
        .chan_size(1024)
        .build();

    Ok(drain)
}

// file drain: Log to logs/app.log next to the executable
fn default_file_drain() -> Result<slog_async::Async> {
    let current_exe = std::env::current_exe()?;
    let mut exe_dir = current_exe;
    exe_dir.pop();

    if !exe_dir.exists() {
        exe_dir = std::env::current_dir()?;
    }

    let log_dir = exe_dir.join("logs");
    std::fs::create_dir_all(&log_dir)?;

    let log_file = log_dir.join("app.log");

    let file = OpenOptions::new()
        .create(true)
        .write(true)
        .append(true)
        .open(log_file)?;

    let decorator = slog_term::PlainSyncDecorator::new(file);
    let formatter = slog_term::FullFormat::new(decorator)
        .use_file_location()
        .use_custom_timestamp(slog_term::timestamp_local)
        .build()
        .fuse();

    let drain = slog_async::Async::new(formatter).chan_size(1024).build();

    Ok(drain)
}

// syslog drain: Log to syslog
#[cfg(feature = "syslog")]
fn default_syslog_drain() -> Result<slog_async::Async> {
    let syslog = slog_syslog::unix_3164(Facility::LOG_USER)?;

    let drain = slog_async::Async::new(syslog.fuse()).chan_size(1024).build();

    Ok(drain)
}

#[cfg(all(target_os = "linux", feature = "journald"))]
fn default_journald_drain() -> Result<slog_async::Async> {
    let journald = JournaldDrain.ignore_res();
    let drain = slog_async::Async::new(journald).chan_size(1024).build();

    Ok(drain)
}
