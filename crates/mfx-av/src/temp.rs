//! Temporary file lifecycle.
//!
//! A [`TempStore`] hands out uniquely named paths under one base directory.
//! Each path is owned by a [`TempFile`] guard that removes the file when
//! released or dropped, so every exit path of an operation cleans up. A
//! periodic [`sweep`](TempStore::sweep) removes anything left behind by
//! crashed processes.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use serde::Serialize;

/// Result of releasing a temp file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "error", rename_all = "camelCase")]
pub enum CleanupOutcome {
    /// The file existed and was deleted.
    Removed,
    /// Nothing to delete (never written, or already released).
    AlreadyGone,
    /// Deletion failed; logged and otherwise ignored.
    Failed(String),
}

impl CleanupOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed(_))
    }

    /// Combine two outcomes, keeping the first failure.
    pub fn merge(self, other: CleanupOutcome) -> CleanupOutcome {
        match (self, other) {
            (f @ Self::Failed(_), _) | (_, f @ Self::Failed(_)) => f,
            (Self::Removed, _) | (_, Self::Removed) => Self::Removed,
            _ => Self::AlreadyGone,
        }
    }
}

/// Counts from one [`TempStore::sweep`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    pub scanned: usize,
    pub removed: usize,
    pub failed: usize,
}

/// Allocator for temp paths under one directory.
#[derive(Debug, Clone)]
pub struct TempStore {
    base_dir: PathBuf,
    max_age: Duration,
}

impl TempStore {
    pub fn new(base_dir: impl Into<PathBuf>, max_age: Duration) -> Self {
        Self {
            base_dir: base_dir.into(),
            max_age,
        }
    }

    pub fn from_config(config: &mfx_core::config::TempConfig) -> Self {
        Self::new(
            config.base_dir.clone(),
            Duration::from_secs(config.max_age_hours.saturating_mul(3600)),
        )
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Reserve a fresh path with the given extension (`".mp4"` or `"mp4"`).
    ///
    /// The base directory is created if absent; the file itself is not.
    pub fn allocate(&self, extension: &str) -> mfx_core::Result<TempFile> {
        fs::create_dir_all(&self.base_dir)?;
        let ext = extension.trim_start_matches('.');
        let name = if ext.is_empty() {
            format!("mediafx-{}", uuid::Uuid::new_v4())
        } else {
            format!("mediafx-{}.{ext}", uuid::Uuid::new_v4())
        };
        Ok(TempFile::new(self.base_dir.join(name)))
    }

    /// Remove regular files older than the configured maximum age.
    ///
    /// Per-file failures are logged and counted, never returned.
    pub fn sweep(&self) -> SweepReport {
        self.sweep_older_than(self.max_age)
    }

    pub fn sweep_older_than(&self, max_age: Duration) -> SweepReport {
        let mut report = SweepReport::default();
        let entries = match fs::read_dir(&self.base_dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return report,
            Err(e) => {
                tracing::warn!("cannot read temp dir {}: {e}", self.base_dir.display());
                return report;
            }
        };
        let now = SystemTime::now();

        for entry in entries.flatten() {
            let path = entry.path();
            let Ok(meta) = entry.metadata() else { continue };
            if !meta.is_file() {
                continue;
            }
            report.scanned += 1;
            let age = meta
                .modified()
                .ok()
                .and_then(|m| now.duration_since(m).ok())
                .unwrap_or_default();
            if age < max_age {
                continue;
            }
            match fs::remove_file(&path) {
                Ok(()) => {
                    tracing::debug!("swept {}", path.display());
                    report.removed += 1;
                }
                Err(e) => {
                    tracing::warn!("failed to sweep {}: {e}", path.display());
                    report.failed += 1;
                }
            }
        }

        if report.removed > 0 || report.failed > 0 {
            tracing::info!(
                "temp sweep: {} removed, {} failed of {} files",
                report.removed,
                report.failed,
                report.scanned
            );
        }
        report
    }

    /// Sweep with the given probability; used on each top-level call.
    pub fn maybe_sweep(&self, probability: f64) -> Option<SweepReport> {
        if probability > 0.0 && rand::random::<f64>() < probability {
            Some(self.sweep())
        } else {
            None
        }
    }
}

/// Exclusive owner of one temp path.
///
/// Dropping the guard removes the file unless [`keep`](Self::keep) was
/// called.
#[derive(Debug)]
pub struct TempFile {
    path: PathBuf,
    released: bool,
}

impl TempFile {
    /// Take ownership of an existing path.
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            released: false,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Delete the file. Safe to call any number of times.
    pub fn release(&mut self) -> CleanupOutcome {
        if self.released {
            return CleanupOutcome::AlreadyGone;
        }
        self.released = true;
        match fs::remove_file(&self.path) {
            Ok(()) => CleanupOutcome::Removed,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => CleanupOutcome::AlreadyGone,
            Err(e) => {
                tracing::warn!("failed to remove temp file {}: {e}", self.path.display());
                CleanupOutcome::Failed(e.to_string())
            }
        }
    }

    /// Give up ownership; the file survives the guard.
    pub fn keep(mut self) -> PathBuf {
        self.released = true;
        std::mem::take(&mut self.path)
    }
}

impl Drop for TempFile {
    fn drop(&mut self) {
        if !self.released {
            let _ = self.release();
        }
    }
}

/// Release every file, continuing past failures.
pub fn release_all(files: &mut [TempFile]) -> CleanupOutcome {
    files
        .iter_mut()
        .map(TempFile::release)
        .fold(CleanupOutcome::AlreadyGone, CleanupOutcome::merge)
}
