use std::{path::Path, sync::LazyLock};

use anyhow::{anyhow, Result};
use tracing::level_filters::LevelFilter;
use tracing_appender::rolling::Rotation;
use tracing_subscriber::{
    fmt::{format::FmtSpan, writer::MakeWriterExt},
    EnvFilter,
};

/// Log files are named `diary.<date>`.
pub const LOG_FILE_PREFIX: &str = "diary";
const MAX_LOG_FILES: usize = 5;

/// Installs the global subscriber. The files under `app_dir/logs` record what the diary did to
/// the activity file: appends, loads with skipped rows, report sizes and failed commands. Only
/// this crate's events are kept, other crates stay silent.
///
/// `console` mirrors everything to stdout at `TRACE`, otherwise the level comes from `RUST_LOG`
/// and defaults to `debug`. The interactive menu owns stdout, so nothing is mirrored by default.
pub fn enable_logging(app_dir: &Path, console: bool) -> Result<()> {
    let appender = tracing_appender::rolling::Builder::new()
        .rotation(Rotation::DAILY)
        .max_log_files(MAX_LOG_FILES)
        .filename_prefix(LOG_FILE_PREFIX)
        .build(app_dir.join("logs"))?;

    let stdout = std::io::stdout.with_filter(move |_| console);

    let level = console.then_some(LevelFilter::TRACE);
    tracing_subscriber::fmt()
        .with_env_filter(diary_filter(level, std::env::var("RUST_LOG").ok()))
        .with_span_events(FmtSpan::CLOSE)
        .with_writer(stdout.and(appender))
        .with_ansi(false)
        .try_init()
        .map_err(|e| anyhow!("Failed to install logger {e}"))?;
    Ok(())
}

/// Filter limited to this crate. An explicit `level` wins over `env_level`.
fn diary_filter(level: Option<LevelFilter>, env_level: Option<String>) -> EnvFilter {
    let level = level
        .map(|v| v.to_string())
        .or(env_level)
        .unwrap_or_else(|| "debug".into());
    EnvFilter::new(format!(
        "{}={level}",
        env!("CARGO_PKG_NAME").replace("-", "_"),
    ))
}

pub static TEST_LOGGING: LazyLock<()> = LazyLock::new(|| {
    let _ = tracing_subscriber::fmt()
        .with_max_level(LevelFilter::TRACE)
        .with_test_writer()
        .pretty()
        .try_init();
});
