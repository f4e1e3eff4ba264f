// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow};
use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogTarget {
    Stderr,
    /// Used while the terminal UI owns the screen.
    File(PathBuf),
}

/// Keeps the background log writer alive; drop it last.
#[must_use]
pub struct LogGuard {
    _worker: Option<WorkerGuard>,
}

pub fn init(configured_filter: &str, target: LogTarget) -> Result<LogGuard> {
    let env_filter = env::var("RUST_LOG").ok();
    let directives = choose_filter(configured_filter, env_filter.as_deref());
    let filter = EnvFilter::try_new(directives)
        .with_context(|| format!("parse log filter {directives:?}"))?;

    match target {
        LogTarget::Stderr => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(io::stderr)
                .try_init()
                .map_err(|error| anyhow!("install log subscriber: {error}"))?;
            Ok(LogGuard { _worker: None })
        }
        LogTarget::File(path) => {
            let (dir, file_name) = split_log_path(&path)?;
            fs::create_dir_all(dir)
                .with_context(|| format!("create log directory {}", dir.display()))?;
            let appender = tracing_appender::rolling::never(dir, file_name);
            let (writer, worker) = tracing_appender::non_blocking(appender);
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(writer)
                .try_init()
                .map_err(|error| anyhow!("install log subscriber: {error}"))?;
            tracing::debug!(path = %path.display(), "logging to file");
            Ok(LogGuard {
                _worker: Some(worker),
            })
        }
    }
}

fn choose_filter<'a>(configured: &'a str, env_override: Option<&'a str>) -> &'a str {
    match env_override {
        Some(value) if !value.trim().is_empty() => value,
        _ => configured,
    }
}

fn split_log_path(path: &Path) -> Result<(&Path, &std::ffi::OsStr)> {
    let file_name = path
        .file_name()
        .ok_or_else(|| anyhow!("log file {} has no file name", path.display()))?;
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    Ok((dir, file_name))
}
