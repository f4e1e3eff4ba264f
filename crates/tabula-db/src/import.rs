// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow};
use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tabula_app::{
    AggregateRow, CellEditorRegistry, CellValue, ColumnSpec, GridController, GridResult, Row,
    TabularDataStore, ValueKind,
};

pub const IMAGE_DIR_NAME: &str = "images";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportedFile {
    pub source: PathBuf,
    pub destination: PathBuf,
    pub bytes: u64,
    pub original_removed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedImport {
    pub source: PathBuf,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportReport {
    pub imported: Vec<ImportedFile>,
    /// Sources whose name already exists in the destination.
    pub duplicates: Vec<PathBuf>,
    pub failed: Vec<FailedImport>,
}

impl ImportReport {
    pub fn is_clean(&self) -> bool {
        self.duplicates.is_empty() && self.failed.is_empty()
    }

    pub fn total_bytes(&self) -> u64 {
        self.imported.iter().map(|file| file.bytes).sum()
    }

    /// One log row per source: file name, outcome, bytes copied.
    pub fn rows(&self) -> Vec<Row> {
        let imported = self.imported.iter().map(|file| {
            let outcome = if file.original_removed {
                "imported, original removed"
            } else {
                "imported"
            };
            log_row(&file.source, outcome.to_owned(), file.bytes)
        });
        let duplicates = self
            .duplicates
            .iter()
            .map(|source| log_row(source, "duplicate".to_owned(), 0));
        let failed = self
            .failed
            .iter()
            .map(|failure| log_row(&failure.source, format!("failed: {}", failure.reason), 0));
        imported.chain(duplicates).chain(failed).collect()
    }
}

fn log_row(source: &Path, outcome: String, bytes: u64) -> Row {
    vec![
        CellValue::text(display_name(source)),
        CellValue::Text(outcome),
        CellValue::Integer(i64::try_from(bytes).unwrap_or(i64::MAX)),
    ]
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

pub fn import_log_columns() -> Vec<ColumnSpec> {
    vec![
        ColumnSpec::new("file", ValueKind::Text)
            .with_label("File")
            .read_only(),
        ColumnSpec::new("outcome", ValueKind::Text)
            .with_label("Outcome")
            .read_only(),
        ColumnSpec::new("bytes", ValueKind::Integer)
            .with_label("Bytes")
            .read_only(),
    ]
}

/// An empty import log whose summary row counts copied bytes.
pub fn import_log_grid() -> GridResult<GridController> {
    let store = TabularDataStore::new(
        import_log_columns(),
        AggregateRow::counting("Total Bytes", 0, 2),
        Vec::new(),
    )?;
    Ok(GridController::new(
        "Import Log",
        store,
        CellEditorRegistry::new().into(),
    ))
}

/// Copies each file into `dest_dir`, keeping its name. A name that already
/// exists there is reported as a duplicate and left alone. Originals are
/// removed only after their copy succeeded, and only when asked.
pub fn import_files(
    paths: &[PathBuf],
    dest_dir: &Path,
    delete_originals: bool,
) -> Result<ImportReport> {
    fs::create_dir_all(dest_dir)
        .with_context(|| format!("create import directory {}", dest_dir.display()))?;

    let mut report = ImportReport::default();
    for source in paths {
        let Some(name) = source.file_name() else {
            report.failed.push(FailedImport {
                source: source.clone(),
                reason: "path has no file name".to_owned(),
            });
            continue;
        };
        let destination = dest_dir.join(name);
        let bytes = match copy_new(source, &destination) {
            Ok(CopyOutcome::Copied(bytes)) => bytes,
            Ok(CopyOutcome::Duplicate) => {
                tracing::debug!(source = %source.display(), "skipping duplicate import");
                report.duplicates.push(source.clone());
                continue;
            }
            Err(error) => {
                tracing::warn!(source = %source.display(), %error, "import copy failed");
                report.failed.push(FailedImport {
                    source: source.clone(),
                    reason: error.to_string(),
                });
                continue;
            }
        };

        let original_removed = delete_originals
            && match fs::remove_file(source) {
                Ok(()) => true,
                Err(error) => {
                    tracing::warn!(
                        source = %source.display(),
                        %error,
                        "could not remove original after import"
                    );
                    false
                }
            };
        report.imported.push(ImportedFile {
            source: source.clone(),
            destination,
            bytes,
            original_removed,
        });
    }

    tracing::info!(
        destination = %dest_dir.display(),
        imported = report.imported.len(),
        duplicates = report.duplicates.len(),
        failed = report.failed.len(),
        bytes = report.total_bytes(),
        "import finished"
    );
    Ok(report)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CopyOutcome {
    Copied(u64),
    Duplicate,
}

/// Copies `source` to a destination that must not exist yet. The
/// destination is claimed atomically, so a file that appears there
/// concurrently is never overwritten.
fn copy_new(source: &Path, destination: &Path) -> io::Result<CopyOutcome> {
    let mut reader = File::open(source)?;
    let mut writer = match OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(destination)
    {
        Ok(file) => file,
        Err(error) if error.kind() == io::ErrorKind::AlreadyExists => {
            return Ok(CopyOutcome::Duplicate);
        }
        Err(error) => return Err(error),
    };
    match io::copy(&mut reader, &mut writer).and_then(|bytes| writer.sync_all().map(|()| bytes)) {
        Ok(bytes) => Ok(CopyOutcome::Copied(bytes)),
        Err(error) => {
            drop(writer);
            let _ = fs::remove_file(destination);
            Err(error)
        }
    }
}

/// A bulk import running on its own thread. The whole report arrives at
/// once, so the caller can apply it in a single step.
#[derive(Debug)]
pub struct ImportJob {
    receiver: Receiver<Result<ImportReport>>,
    handle: Option<JoinHandle<()>>,
}

impl ImportJob {
    pub fn spawn(paths: Vec<PathBuf>, dest_dir: PathBuf, delete_originals: bool) -> Result<Self> {
        let (sender, receiver) = mpsc::channel();
        let handle = thread::Builder::new()
            .name("tabula-import".to_owned())
            .spawn(move || {
                let result = import_files(&paths, &dest_dir, delete_originals);
                // The receiver may be gone if the caller gave up waiting.
                let _ = sender.send(result);
            })
            .context("spawn import worker")?;
        Ok(Self {
            receiver,
            handle: Some(handle),
        })
    }

    /// The report, if the worker has finished.
    pub fn poll(&mut self) -> Option<Result<ImportReport>> {
        match self.receiver.try_recv() {
            Ok(result) => {
                self.join();
                Some(result)
            }
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => {
                self.join();
                Some(Err(anyhow!("import worker exited without a report")))
            }
        }
    }

    pub fn wait(mut self) -> Result<ImportReport> {
        let result = self
            .receiver
            .recv()
            .map_err(|_| anyhow!("import worker exited without a report"));
        self.join();
        result?
    }

    pub fn wait_timeout(&mut self, timeout: Duration) -> Option<Result<ImportReport>> {
        match self.receiver.recv_timeout(timeout) {
            Ok(result) => {
                self.join();
                Some(result)
            }
            Err(mpsc::RecvTimeoutError::Timeout) => None,
            Err(mpsc::RecvTimeoutError::Disconnected) => {
                self.join();
                Some(Err(anyhow!("import worker exited without a report")))
            }
        }
    }

    fn join(&mut self) {
        if let Some(handle) = self.handle.take()
            && handle.join().is_err()
        {
            tracing::warn!("import worker panicked");
        }
    }
}
