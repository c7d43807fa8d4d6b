use std::{
    fs,
    path::{Path, PathBuf},
    time::{Duration, SystemTime},
};

use anyhow::{Context, Result, anyhow};
use tracing_appender::{
    non_blocking::WorkerGuard,
    rolling::{self, RollingFileAppender},
};
use tracing_error::ErrorLayer;
use tracing_subscriber::{
    EnvFilter, Layer, filter::LevelFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt,
};
use uuid::Uuid;

use crate::config::{LoggingConfig, LoggingRotation};

const LOG_FILE_PREFIX: &str = "conformance.log";

const SECONDS_PER_DAY: u64 = 24 * 60 * 60;

/// Keeps the non-blocking file writer alive; drop it last.
pub struct LoggingGuard {
    _worker_guard: WorkerGuard,
    run_id: String,
    log_dir: PathBuf,
}

impl LoggingGuard {
    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    pub fn log_dir(&self) -> &Path {
        &self.log_dir
    }
}

/// Installs the global subscriber: JSON lines to a rolling file, WARN and
/// above to stderr, span traces for errors.
pub fn init_tracing(logging_config: &LoggingConfig) -> Result<LoggingGuard> {
    let env_filter = build_env_filter(&logging_config.filter)?;
    let log_dir = prepare_log_dir(&logging_config.dir)?;

    let purge_warnings =
        purge_expired_logs(&log_dir, LOG_FILE_PREFIX, logging_config.retention_days);
    let appender = rolling_appender(&log_dir, &logging_config.rotation);
    let (writer, worker_guard) = tracing_appender::non_blocking(appender);

    let file_layer = fmt::layer()
        .json()
        .with_timer(fmt::time::UtcTime::rfc_3339())
        .with_target(true)
        .with_current_span(true)
        .with_ansi(false)
        .with_writer(writer)
        .with_filter(env_filter);

    let stderr_layer = logging_config.stderr_warn_enabled.then(|| {
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_filter(LevelFilter::WARN)
    });

    tracing_subscriber::registry()
        .with(ErrorLayer::default())
        .with(file_layer)
        .with(stderr_layer)
        .try_init()
        .context("failed to initialize tracing subscriber")?;

    let run_id = Uuid::now_v7().to_string();
    tracing::info!(
        target: "logging",
        run_id = %run_id,
        dir = %log_dir.display(),
        filter = %logging_config.filter,
        rotation = ?logging_config.rotation,
        retention_days = logging_config.retention_days,
        "logging_initialized"
    );
    for warning in purge_warnings {
        tracing::warn!(target: "logging", warning = %warning, "log_purge_failed");
    }

    Ok(LoggingGuard {
        _worker_guard: worker_guard,
        run_id,
        log_dir,
    })
}

fn build_env_filter(filter: &str) -> Result<EnvFilter> {
    if filter.trim().is_empty() {
        return Err(anyhow!("logging.filter cannot be empty"));
    }
    EnvFilter::try_new(filter)
        .with_context(|| format!("failed to parse logging.filter '{filter}'"))
}

fn prepare_log_dir(dir: &Path) -> Result<PathBuf> {
    if dir.as_os_str().is_empty() {
        return Err(anyhow!("logging.dir cannot be empty"));
    }
    let log_dir = if dir.is_absolute() {
        dir.to_path_buf()
    } else {
        std::env::current_dir()
            .context("failed to read current working directory for logging.dir")?
            .join(dir)
    };
    fs::create_dir_all(&log_dir)
        .with_context(|| format!("failed to create logging directory {}", log_dir.display()))?;
    Ok(log_dir)
}

fn rolling_appender(log_dir: &Path, rotation: &LoggingRotation) -> RollingFileAppender {
    match rotation {
        LoggingRotation::Daily => rolling::daily(log_dir, LOG_FILE_PREFIX),
        LoggingRotation::Hourly => rolling::hourly(log_dir, LOG_FILE_PREFIX),
    }
}

fn purge_expired_logs(log_dir: &Path, prefix: &str, retention_days: usize) -> Vec<String> {
    let retention = Duration::from_secs((retention_days as u64).saturating_mul(SECONDS_PER_DAY));
    let cutoff = SystemTime::now()
        .checked_sub(retention)
        .unwrap_or(SystemTime::UNIX_EPOCH);
    purge_logs_older_than(log_dir, prefix, cutoff)
}

/// Removes prefixed files last modified at or before `cutoff`. Failures are
/// collected, never fatal.
fn purge_logs_older_than(log_dir: &Path, prefix: &str, cutoff: SystemTime) -> Vec<String> {
    let entries = match fs::read_dir(log_dir) {
        Ok(entries) => entries,
        Err(err) => {
            return vec![format!(
                "failed to scan logging directory {}: {err}",
                log_dir.display()
            )];
        }
    };

    let mut warnings = Vec::new();
    for entry in entries {
        let path = match entry {
            Ok(entry) => entry.path(),
            Err(err) => {
                warnings.push(format!("failed to read logging directory entry: {err}"));
                continue;
            }
        };
        let prefixed = path
            .file_name()
            .is_some_and(|name| name.to_string_lossy().starts_with(prefix));
        if !prefixed {
            continue;
        }

        match expired(&path, cutoff) {
            Ok(false) => {}
            Ok(true) => {
                if let Err(err) = fs::remove_file(&path) {
                    warnings.push(format!(
                        "failed to remove expired log file {}: {err}",
                        path.display()
                    ));
                }
            }
            Err(warning) => warnings.push(warning),
        }
    }

    warnings
}

fn expired(path: &Path, cutoff: SystemTime) -> Result<bool, String> {
    let metadata =
        fs::metadata(path).map_err(|err| format!("failed to stat {}: {err}", path.display()))?;
    if !metadata.is_file() {
        return Ok(false);
    }
    let modified = metadata
        .modified()
        .map_err(|err| format!("failed to read mtime for {}: {err}", path.display()))?;
    Ok(modified <= cutoff)
}
