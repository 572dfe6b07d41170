/*!
 * Per-run accounting of processed files.
 *
 * A `RunSummary` is filled in by the controller, one file at a time, in
 * discovery order. It is printed at the end of a run and can be written
 * as a JSON report.
 */

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Serialize;

use crate::app_controller::{FileOutcome, FileStatus};
use crate::errors::FileError;

/// A file that could not be processed
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedFile {
    pub path: PathBuf,
    // @field: "io", "format" or "unexpected"
    pub kind: String,
    pub reason: String,
}

/// Outcome of a whole run
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunSummary {
    // @field: Folder the run was started on
    pub root: PathBuf,

    // @field: Whether files were left untouched on purpose
    pub dry_run: bool,

    // @field: Files whose labels changed (or would change, in a dry run)
    pub modified: Vec<PathBuf>,

    // @field: Files that needed no change
    pub unchanged: Vec<PathBuf>,

    // @field: Files that failed, with the reason
    pub failed: Vec<FailedFile>,

    // @field: Backups written during this run
    pub backups_created: usize,

    pub labels_examined: usize,
    pub labels_changed: usize,

    // @field: Replacement count per wrong word, over all files
    pub substitutions: BTreeMap<String, usize>,

    // @field: Wall-clock time of the run in milliseconds
    pub duration_ms: u128,

    // @field: Local time the run finished
    pub finished_at: String,
}

impl RunSummary {
    /// Empty summary for a run on `root`
    pub fn new<P: AsRef<Path>>(root: P, dry_run: bool) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            dry_run,
            ..Self::default()
        }
    }

    /// Account for one processed file
    pub fn record(&mut self, path: PathBuf, result: Result<FileOutcome, FileError>) {
        match result {
            Ok(outcome) => {
                self.labels_examined += outcome.stats.labels_examined;
                self.labels_changed += outcome.stats.labels_changed;
                for (word, count) in outcome.stats.substitutions {
                    *self.substitutions.entry(word).or_insert(0) += count;
                }
                if outcome.backup.is_some() {
                    self.backups_created += 1;
                }
                match outcome.status {
                    FileStatus::Modified => self.modified.push(path),
                    FileStatus::Unchanged => self.unchanged.push(path),
                }
            }
            Err(e) => self.failed.push(FailedFile {
                path,
                kind: e.kind().to_string(),
                reason: e.to_string(),
            }),
        }
    }

    /// Stamp the run duration and finishing time
    pub fn finish(&mut self, duration: Duration) {
        self.duration_ms = duration.as_millis();
        self.finished_at = chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
    }

    /// Number of files looked at
    pub fn total(&self) -> usize {
        self.modified.len() + self.unchanged.len() + self.failed.len()
    }

    /// Whether any file failed
    pub fn has_failures(&self) -> bool {
        !self.failed.is_empty()
    }

    /// Write the summary as pretty-printed JSON
    pub fn write_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self).context("Failed to serialize run summary")?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write report to {}", path.display()))?;
        Ok(())
    }
}

// Format duration in a human-readable format
fn format_duration(millis: u128) -> String {
    let total_seconds = millis / 1000;
    let minutes = total_seconds / 60;
    let seconds = total_seconds % 60;

    if minutes > 0 {
        format!("{}m {}s", minutes, seconds)
    } else {
        format!("{}.{:03}s", seconds, millis % 1000)
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let verb = if self.dry_run { "would be modified" } else { "modified" };
        writeln!(
            f,
            "{} files processed in {}: {} {}, {} unchanged, {} failed",
            self.total(),
            format_duration(self.duration_ms),
            self.modified.len(),
            verb,
            self.unchanged.len(),
            self.failed.len()
        )?;
        writeln!(
            f,
            "{} of {} labels changed, {} backups created",
            self.labels_changed, self.labels_examined, self.backups_created
        )?;

        if !self.substitutions.is_empty() {
            let total: usize = self.substitutions.values().sum();
            writeln!(f, "{} word substitutions:", total)?;
            for (word, count) in &self.substitutions {
                writeln!(f, "  {}: {}", word, count)?;
            }
        }

        if !self.failed.is_empty() {
            writeln!(f, "Failed files:")?;
            for failure in &self.failed {
                writeln!(f, "  [{}] {}", failure.kind, failure.reason)?;
            }
        }
        Ok(())
    }
}
