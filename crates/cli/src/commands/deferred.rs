// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Deferred-delete log command handlers

use anyhow::Result;
use clap::{Args, Subcommand};
use serde::Serialize;
use sj_engine::env::DEFAULT_SCRATCH_DIR_NAME;
use sj_engine::{replay_deferred_deletes, resolve_logged_path};
use sj_storage::{DeferredDeleteLog, DeferredEntry};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::output::{format_or_json, print_purge_results, OutputFormat};

#[derive(Args)]
pub struct DeferredArgs {
    #[command(subcommand)]
    pub command: DeferredCommand,
}

#[derive(Subcommand)]
pub enum DeferredCommand {
    /// List files queued for deletion at the end of a job
    Show {
        /// Analysis directory holding the log
        dir: PathBuf,
    },
    /// Delete every queued file, then the log
    Purge {
        /// Analysis directory holding the log
        dir: PathBuf,
        /// Scratch directory relative paths resolve against first
        /// (default: <dir>/.work)
        #[arg(long)]
        work_dir: Option<PathBuf>,
        /// Show what would be deleted without deleting
        #[arg(long)]
        dry_run: bool,
    },
}

#[derive(Debug, Serialize)]
struct EntryView {
    path: String,
    recorded_at: Option<String>,
}

impl From<&DeferredEntry> for EntryView {
    fn from(entry: &DeferredEntry) -> Self {
        Self {
            path: entry.path.clone(),
            recorded_at: entry
                .recorded_at
                .map(|t| t.to_rfc3339_opts(chrono::SecondsFormat::Secs, true)),
        }
    }
}

pub fn handle(command: DeferredCommand, format: OutputFormat) -> Result<()> {
    match command {
        DeferredCommand::Show { dir } => {
            let log = DeferredDeleteLog::in_dir(&dir);
            let entries: Vec<EntryView> = if log.exists() {
                log.read()?.iter().map(EntryView::from).collect()
            } else {
                Vec::new()
            };
            format_or_json(format, &entries, |out| write_entries(out, &dir, &entries))?;
        }
        DeferredCommand::Purge {
            dir,
            work_dir,
            dry_run,
        } => {
            let scratch = work_dir.unwrap_or_else(|| dir.join(DEFAULT_SCRATCH_DIR_NAME));
            let log = DeferredDeleteLog::in_dir(&dir);
            let (deleted, missing) = if !log.exists() {
                (Vec::new(), Vec::new())
            } else if dry_run {
                partition(log.read()?, &scratch, &dir)
            } else {
                let report = replay_deferred_deletes(&log, &scratch, &dir, true)?;
                let deleted = report
                    .deleted
                    .iter()
                    .map(|p| p.display().to_string())
                    .collect();
                (deleted, report.missing)
            };
            print_purge_results(&deleted, &missing, dry_run, format)?;
        }
    }
    Ok(())
}

/// Split logged entries into those that resolve to a file and those
/// already gone.
fn partition(entries: Vec<DeferredEntry>, scratch: &Path, permanent: &Path) -> (Vec<String>, Vec<String>) {
    let mut found = Vec::new();
    let mut missing = Vec::new();
    for entry in entries {
        match resolve_logged_path(&entry.path, scratch, permanent) {
            Some(path) => {
                let path = path.display().to_string();
                if !found.contains(&path) {
                    found.push(path);
                }
            }
            None => missing.push(entry.path),
        }
    }
    (found, missing)
}

fn write_entries(out: &mut dyn Write, dir: &Path, entries: &[EntryView]) -> std::io::Result<()> {
    if entries.is_empty() {
        return writeln!(out, "No deferred deletes in {}", dir.display());
    }
    for entry in entries {
        let when = entry.recorded_at.as_deref().unwrap_or("-");
        writeln!(out, "{}  {}", crate::color::muted(when), entry.path)?;
    }
    writeln!(out, "\n{} file(s) queued", entries.len())
}

#[cfg(test)]
#[path = "deferred_tests.rs"]
mod tests;
