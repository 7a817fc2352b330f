// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow};
use serde::Deserialize;
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

/// Overrides the configured level with a full filter directive.
pub const LOG_FILTER_ENV: &str = "ARTABLE_LOG";

const NOISY_DEPENDENCIES: &[&str] = &["reqwest", "hyper", "hyper_util", "rustls"];

#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warn => "warn",
            Self::Info => "info",
            Self::Debug => "debug",
            Self::Trace => "trace",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogSettings {
    pub level: LogLevel,
    pub file: PathBuf,
}

pub fn default_log_path() -> Result<PathBuf> {
    let data_root = dirs::data_dir().ok_or_else(|| {
        anyhow!("cannot resolve data directory; set [log].file to an absolute path")
    })?;
    Ok(data_root.join(crate::config::APP_NAME).join("artable.log"))
}

/// Installs the global subscriber. The terminal belongs to the TUI, so every
/// event goes to the log file; keep the guard alive until exit or buffered
/// lines are lost.
pub fn init(settings: &LogSettings) -> Result<WorkerGuard> {
    let file = open_log_file(&settings.file)?;
    let (writer, guard) = tracing_appender::non_blocking(file);

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(build_env_filter(settings.level))
        .with_target(settings.level >= LogLevel::Debug)
        .with_thread_names(settings.level >= LogLevel::Trace)
        .with_ansi(false)
        .with_writer(writer)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|error| anyhow!("install log subscriber: {error}"))?;
    Ok(guard)
}

fn open_log_file(path: &Path) -> Result<fs::File> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("create log directory {}", parent.display()))?;
    }
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| {
            format!(
                "open log file {} -- set [log].file to a writable path",
                path.display()
            )
        })
}

fn build_env_filter(level: LogLevel) -> EnvFilter {
    if let Ok(directive) = std::env::var(LOG_FILTER_ENV)
        && !directive.trim().is_empty()
    {
        return EnvFilter::new(directive);
    }
    EnvFilter::new(default_directive(level))
}

/// HTTP internals stay at warn unless the user asks for trace.
fn default_directive(level: LogLevel) -> String {
    if level >= LogLevel::Trace {
        return level.as_str().to_owned();
    }
    let mut directive = level.as_str().to_owned();
    for target in NOISY_DEPENDENCIES {
        directive.push_str(&format!(",{target}=warn"));
    }
    directive
}

#[cfg(test)]
mod tests {
    use super::{LogLevel, default_directive, open_log_file};
    use anyhow::Result;

    #[test]
    fn default_directive_quiets_http_stack_below_trace() {
        assert_eq!(
            default_directive(LogLevel::Debug),
            "debug,reqwest=warn,hyper=warn,hyper_util=warn,rustls=warn"
        );
        assert_eq!(default_directive(LogLevel::Trace), "trace");
    }

    #[test]
    fn levels_order_from_quiet_to_verbose() {
        assert!(LogLevel::Error < LogLevel::Warn);
        assert!(LogLevel::Debug < LogLevel::Trace);
        assert_eq!(LogLevel::default(), LogLevel::Info);
    }

    #[test]
    fn log_file_parent_is_created() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let path = temp.path().join("nested").join("artable.log");
        open_log_file(&path)?;
        assert!(path.exists());
        Ok(())
    }
}
