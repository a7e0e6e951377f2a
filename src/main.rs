//! Yum Extender binary entrypoint. The runtime lives in `app`.

mod app;

use std::fmt;
use std::process::ExitCode;
use std::sync::OnceLock;

use clap::Parser;
use yumex::args::{Args, determine_log_level};

/// Log timestamp in the "YYYY-MM-DD-T HH:MM:SS" layout.
struct YumexTimer;

impl tracing_subscriber::fmt::time::FormatTime for YumexTimer {
    fn format_time(&self, w: &mut tracing_subscriber::fmt::format::Writer<'_>) -> fmt::Result {
        let ts = chrono::Local::now().format("%Y-%m-%d-T %H:%M:%S");
        write!(w, "{ts}")
    }
}

/// Keeps the non-blocking log writer flushing until exit.
static LOG_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();

/// What: Initialise tracing into `~/.config/yumex/logs/yumex.log`.
///
/// Inputs:
/// - `level`: Default filter when `RUST_LOG` is unset.
///
/// Details:
/// - Falls back to stderr when the log file cannot be opened.
fn init_logging(level: &str) {
    let env_filter = || {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level))
    };
    let log_path = yumex::config::logs_dir().join("yumex.log");
    match std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
    {
        Ok(file) => {
            let (non_blocking, guard) = tracing_appender::non_blocking(file);
            tracing_subscriber::fmt()
                .with_env_filter(env_filter())
                .with_target(false)
                .with_ansi(false)
                .with_writer(non_blocking)
                .with_timer(YumexTimer)
                .init();
            let _ = LOG_GUARD.set(guard);
            tracing::info!(path = %log_path.display(), "logging initialized");
        }
        Err(e) => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter())
                .with_target(false)
                .with_ansi(true)
                .with_writer(std::io::stderr)
                .with_timer(YumexTimer)
                .init();
            tracing::warn!(error = %e, "failed to open log file; using stderr");
        }
    }
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(&determine_log_level(&args));
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "Yum Extender starting");
    let code = app::run(&args);
    tracing::info!("Yum Extender exited");
    code
}
