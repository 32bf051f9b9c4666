// Copyright 2025 NeuroBlue Contributors
// SPDX-License-Identifier: Apache-2.0

//! Unified logging initialization for NeuroBlue
//!
//! Console output always goes to stderr. With the `file-logging` feature and a
//! configured log directory, each run also writes into its own timestamped
//! folder:
//! ```text
//! ./logs/
//!   └── run_20250101_120000/
//!       └── neuroblue.log
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry};

use neuroblue_config::LoggingConfig;

use crate::cli::CrateDebugFlags;

pub use neuroblue_config::LogFormat;

const RUN_PREFIX: &str = "run_";
const RUN_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Logging options resolved from configuration
#[derive(Debug, Clone)]
pub struct LoggingOptions {
    /// Default level for everything without a debug flag
    pub level: String,
    pub format: LogFormat,
    /// Base directory for per-run log folders; `None` logs to the console only
    pub log_dir: Option<PathBuf>,
    /// Keep this many most recent run folders
    pub retention_runs: usize,
}

impl Default for LoggingOptions {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Text,
            log_dir: None,
            retention_runs: 10,
        }
    }
}

impl From<&LoggingConfig> for LoggingOptions {
    fn from(config: &LoggingConfig) -> Self {
        Self {
            level: config.level.clone(),
            format: config.format,
            log_dir: config.log_dir.clone(),
            retention_runs: config.retention_runs,
        }
    }
}

/// Keeps file writers alive; logs are flushed when this is dropped
pub struct LoggingGuard {
    #[cfg(feature = "file-logging")]
    _file_guards: Vec<tracing_appender::non_blocking::WorkerGuard>,
    log_dir: Option<PathBuf>,
}

impl LoggingGuard {
    /// Folder of the current run, if file logging is active
    pub fn log_dir(&self) -> Option<&Path> {
        self.log_dir.as_deref()
    }
}

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Initialize the global tracing subscriber
///
/// # Errors
///
/// Fails if the log directory cannot be created or a global subscriber is
/// already installed.
pub fn init_logging(debug_flags: &CrateDebugFlags, options: &LoggingOptions) -> Result<LoggingGuard> {
    let filter = debug_flags.to_filter_string(&options.level);
    // One filter per layer
    let make_filter =
        || EnvFilter::try_new(&filter).with_context(|| format!("Invalid log filter: {}", filter));

    let mut layers: Vec<BoxedLayer> = Vec::new();

    let console_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(debug_flags.any_enabled());
    let console_layer = match options.format {
        LogFormat::Text => console_layer.with_filter(make_filter()?).boxed(),
        LogFormat::Json => console_layer.json().with_filter(make_filter()?).boxed(),
    };
    layers.push(console_layer);

    #[cfg(feature = "file-logging")]
    let mut file_guards = Vec::new();
    #[allow(unused_mut)]
    let mut run_folder = None;

    if let Some(base_log_dir) = &options.log_dir {
        #[cfg(feature = "file-logging")]
        {
            let folder = base_log_dir.join(run_folder_name(chrono::Local::now().naive_local()));
            std::fs::create_dir_all(&folder)
                .with_context(|| format!("Failed to create log directory: {}", folder.display()))?;
            cleanup_old_logs(base_log_dir, options.retention_runs)?;

            let appender = tracing_appender::rolling::never(&folder, "neuroblue.log");
            let (non_blocking, guard) = tracing_appender::non_blocking(appender);
            file_guards.push(guard);

            let file_layer = tracing_subscriber::fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_target(true)
                .with_file(true)
                .with_line_number(true)
                .json()
                .with_filter(make_filter()?)
                .boxed();
            layers.push(file_layer);
            run_folder = Some(folder);
        }
        #[cfg(not(feature = "file-logging"))]
        {
            eprintln!(
                "Warning: log_dir {} ignored, built without the file-logging feature",
                base_log_dir.display()
            );
        }
    }

    Registry::default()
        .with(layers)
        .try_init()
        .context("Failed to install global tracing subscriber")?;

    Ok(LoggingGuard {
        #[cfg(feature = "file-logging")]
        _file_guards: file_guards,
        log_dir: run_folder,
    })
}

/// Folder name for a run started at `started_at`
pub fn run_folder_name(started_at: NaiveDateTime) -> String {
    format!("{}{}", RUN_PREFIX, started_at.format(RUN_TIMESTAMP_FORMAT))
}

/// Remove all but the `retention_runs` most recent run folders
///
/// Folders that do not follow the `run_YYYYmmdd_HHMMSS` pattern are left alone.
pub fn cleanup_old_logs(base_log_dir: &Path, retention_runs: usize) -> Result<usize> {
    if !base_log_dir.exists() {
        return Ok(0);
    }

    let mut runs: Vec<(PathBuf, NaiveDateTime)> = Vec::new();
    for entry in std::fs::read_dir(base_log_dir)? {
        let path = entry?.path();
        if !path.is_dir() {
            continue;
        }
        let started_at = path
            .file_name()
            .and_then(|n| n.to_str())
            .and_then(|n| n.strip_prefix(RUN_PREFIX))
            .and_then(|ts| NaiveDateTime::parse_from_str(ts, RUN_TIMESTAMP_FORMAT).ok());
        if let Some(started_at) = started_at {
            runs.push((path, started_at));
        }
    }

    if runs.len() <= retention_runs {
        return Ok(0);
    }

    // Oldest first
    runs.sort_by_key(|(_, started_at)| *started_at);
    let to_remove = runs.len() - retention_runs;
    let mut removed = 0;
    for (path, _) in runs.iter().take(to_remove) {
        match std::fs::remove_dir_all(path) {
            Ok(()) => removed += 1,
            Err(e) => eprintln!(
                "Warning: Failed to remove old log directory {}: {}",
                path.display(),
                e
            ),
        }
    }

    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use tempfile::tempdir;

    fn at(day: u32, hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 1, day)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_options_from_logging_config() {
        let config = LoggingConfig {
            level: "debug".to_string(),
            format: LogFormat::Json,
            log_dir: Some(PathBuf::from("/tmp/neuroblue-logs")),
            retention_runs: 3,
        };
        let options = LoggingOptions::from(&config);
        assert_eq!(options.level, "debug");
        assert_eq!(options.format, LogFormat::Json);
        assert_eq!(options.log_dir, config.log_dir);
        assert_eq!(options.retention_runs, 3);

        let defaults = LoggingOptions::from(&LoggingConfig::default());
        assert_eq!(defaults.format, LoggingOptions::default().format);
        assert_eq!(defaults.retention_runs, LoggingOptions::default().retention_runs);
    }

    #[test]
    fn test_run_folder_name() {
        assert_eq!(run_folder_name(at(2, 13)), "run_20250102_130000");
    }

    #[test]
    fn test_cleanup_keeps_most_recent_runs() {
        let dir = tempdir().unwrap();
        for day in 1..=4 {
            std::fs::create_dir(dir.path().join(run_folder_name(at(day, 8)))).unwrap();
        }
        std::fs::create_dir(dir.path().join("keep_me")).unwrap();

        let removed = cleanup_old_logs(dir.path(), 2).unwrap();

        assert_eq!(removed, 2);
        assert!(!dir.path().join(run_folder_name(at(1, 8))).exists());
        assert!(!dir.path().join(run_folder_name(at(2, 8))).exists());
        assert!(dir.path().join(run_folder_name(at(3, 8))).exists());
        assert!(dir.path().join(run_folder_name(at(4, 8))).exists());
        assert!(dir.path().join("keep_me").exists());
    }

    #[test]
    fn test_cleanup_missing_dir_is_noop() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("nope");
        assert_eq!(cleanup_old_logs(&missing, 1).unwrap(), 0);
    }
}
