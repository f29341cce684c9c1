// src/logging.rs

//! Tracing setup, built on `tracing_subscriber::fmt().with_env_filter(...)`,
//! extended with a `--debug` flag that raises the default filter and an
//! optional rolling-file layer for `--log-dir`.

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Guard returned by [`init`]; dropping it flushes the non-blocking file
/// writer, if one was configured. Must be held for the life of `main`.
pub struct LoggingGuard {
    _file_guard: Option<tracing_appender::non_blocking::WorkerGuard>,
}

/// Initializes the global tracing subscriber.
///
/// `RUST_LOG` always wins when set; otherwise the default level is `debug`
/// when `debug` is true and `info` otherwise. When `log_dir` is given, logs
/// are additionally written to a daily-rolling file under that directory,
/// without ANSI color codes.
pub fn init(debug: bool, log_dir: Option<&std::path::Path>) -> LoggingGuard {
    let default_level = if debug { "debug" } else { "info" };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let stdout_layer = fmt::layer();

    match log_dir {
        Some(dir) => {
            let file_appender = tracing_appender::rolling::daily(dir, "smig.log");
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
            let file_layer = fmt::layer().with_writer(non_blocking).with_ansi(false);

            tracing_subscriber::registry().with(env_filter).with(stdout_layer).with(file_layer).init();

            LoggingGuard { _file_guard: Some(guard) }
        }
        None => {
            tracing_subscriber::registry().with(env_filter).with(stdout_layer).init();
            LoggingGuard { _file_guard: None }
        }
    }
}
