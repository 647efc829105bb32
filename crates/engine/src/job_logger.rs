// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Append-only logger for per-job activity logs.

use sj_core::{Job, RecordedAction};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Append-only logger for per-job activity logs.
///
/// Writes human-readable timestamped lines to:
///   `<analysis_dir>/<job_name>.log`
///
/// Each `append()` call opens, writes, and closes the file.
pub struct JobLogger {
    path: PathBuf,
}

impl JobLogger {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn for_job(job: &Job) -> Self {
        Self::new(job.analysis_dir.join(format!("{}.log", job.name)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append a log line for a task.
    ///
    /// Format: `2026-01-30T08:14:09Z [task] message`
    ///
    /// Failures are logged via tracing but do not propagate; logging must
    /// not fail a job.
    pub fn append(&self, task: &str, message: &str) {
        if let Err(e) = self.write_line(task, message) {
            tracing::warn!(
                path = %self.path.display(),
                error = %e,
                "failed to write job log"
            );
        }
    }

    /// Append one provenance line per action, then its commands fenced.
    pub fn append_actions(&self, task: &str, actions: &[RecordedAction]) {
        for action in actions {
            let inputs = action
                .inputs
                .iter()
                .map(|i| i.uri.display().to_string())
                .collect::<Vec<_>>()
                .join(", ");
            let outputs = action
                .outputs
                .iter()
                .map(|o| o.uri.display().to_string())
                .collect::<Vec<_>>()
                .join(", ");
            self.append(
                task,
                &format!("action '{}': [{}] -> [{}]", action.name, inputs, outputs),
            );
            if !action.commands.is_empty() {
                self.append_fenced(task, "commands", &action.commands.join("\n"));
            }
        }
    }

    /// Append a fenced block.
    ///
    /// Format:
    /// ```text
    /// {timestamp} [{task}] ```{label}
    /// {content}
    /// {timestamp} [{task}] ```
    /// ```
    pub fn append_fenced(&self, task: &str, label: &str, content: &str) {
        if let Err(e) = self.write_fenced(task, label, content) {
            tracing::warn!(
                path = %self.path.display(),
                error = %e,
                "failed to write job log"
            );
        }
    }

    fn open(&self) -> std::io::Result<fs::File> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        OpenOptions::new().create(true).append(true).open(&self.path)
    }

    fn write_fenced(&self, task: &str, label: &str, content: &str) -> std::io::Result<()> {
        let mut file = self.open()?;
        writeln!(file, "{} [{}] ```{}", utc_now(), task, label)?;
        write!(file, "{}", content)?;
        if !content.ends_with('\n') {
            writeln!(file)?;
        }
        writeln!(file, "{} [{}] ```", utc_now(), task)?;
        Ok(())
    }

    fn write_line(&self, task: &str, message: &str) -> std::io::Result<()> {
        let mut file = self.open()?;
        writeln!(file, "{} [{}] {}", utc_now(), task, message)?;
        Ok(())
    }
}

fn utc_now() -> String {
    chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string()
}

#[cfg(test)]
#[path = "job_logger_tests.rs"]
mod tests;
