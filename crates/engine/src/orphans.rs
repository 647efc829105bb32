// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Orphan-file scanning of an analysis directory.
//!
//! The scan reports files nothing in the job refers to and index files
//! whose data file is gone. It never deletes.

use crate::error::JobError;
use serde::Serialize;
use sj_core::Job;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tokio_util::sync::CancellationToken;

/// Index suffixes paired with the data suffix they index, if it differs
/// from plain stripping (`x.bam.bai` and `x.bai` both index `x.bam`).
pub const INDEX_EXTENSIONS: &[(&str, Option<&str>)] = &[
    ("bai", Some("bam")),
    ("crai", Some("cram")),
    ("csi", None),
    ("tbi", None),
    ("idx", None),
    ("fai", None),
];

/// Bookkeeping written by the engine itself.
const ENGINE_FILES: &[&str] = &["toDelete.txt", "jobsToInterval.txt", "splitJob.json"];

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct OrphanReport {
    /// Files no known path accounts for. Empty when no known set was given.
    pub unknown_files: Vec<PathBuf>,
    /// Index files whose data file does not exist.
    pub orphan_indexes: Vec<PathBuf>,
    pub scanned: usize,
}

impl OrphanReport {
    pub fn is_clean(&self) -> bool {
        self.unknown_files.is_empty() && self.orphan_indexes.is_empty()
    }
}

/// Walk `root` and report orphans. Hidden directories (scratch) and the
/// engine's own logs and records are skipped.
pub fn scan_orphans(
    root: &Path,
    known: Option<&HashSet<PathBuf>>,
    cancel: &CancellationToken,
) -> Result<OrphanReport, JobError> {
    let mut report = OrphanReport::default();
    let mut pending = vec![root.to_path_buf()];
    while let Some(dir) = pending.pop() {
        let mut entries: Vec<PathBuf> = fs::read_dir(&dir)
            .map_err(|e| JobError::io(&dir, e))?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .collect();
        entries.sort();
        for path in entries {
            if cancel.is_cancelled() {
                return Err(JobError::Cancelled);
            }
            let Some(name) = path.file_name().and_then(|n| n.to_str()).map(str::to_string) else {
                continue;
            };
            if path.is_dir() {
                if !name.starts_with('.') {
                    pending.push(path);
                }
                continue;
            }
            if is_engine_file(&name) {
                continue;
            }
            report.scanned += 1;

            let data = data_file_for(&path);
            if let Some(candidates) = &data {
                if !candidates.iter().any(|c| c.exists()) {
                    tracing::warn!(path = %path.display(), "index without data file");
                    report.orphan_indexes.push(path.clone());
                }
            }
            if let Some(known) = known {
                let indexed_known = data
                    .as_ref()
                    .is_some_and(|c| c.iter().any(|p| known.contains(p)));
                if !known.contains(&path) && !indexed_known {
                    tracing::info!(path = %path.display(), "file not known to job");
                    report.unknown_files.push(path);
                }
            }
        }
    }
    report.unknown_files.sort();
    report.orphan_indexes.sort();
    Ok(report)
}

/// Every path the job's record refers to.
pub fn known_files(job: &Job) -> HashSet<PathBuf> {
    let mut known: HashSet<PathBuf> = job.input_files.iter().cloned().collect();
    for action in &job.actions {
        known.extend(action.inputs.iter().map(|i| i.uri.clone()));
        known.extend(action.outputs.iter().map(|o| o.uri.clone()));
    }
    known.extend(job.outputs_to_create.iter().map(|o| o.file.clone()));
    known.extend(job.scatter_outputs.values().flatten().cloned());
    known
}

fn is_engine_file(name: &str) -> bool {
    ENGINE_FILES.contains(&name) || name.ends_with(".log") || name.ends_with("Checkpoint.json")
}

/// Possible data files for an index, or `None` if `path` is not an index.
fn data_file_for(path: &Path) -> Option<Vec<PathBuf>> {
    let ext = path.extension()?.to_str()?;
    let (_, paired) = INDEX_EXTENSIONS.iter().find(|(e, _)| *e == ext)?;
    let stripped = path.with_extension("");
    let mut candidates = vec![stripped.clone()];
    if let Some(data_ext) = paired {
        candidates.push(stripped.with_extension(data_ext));
    }
    Some(candidates)
}

#[cfg(test)]
#[path = "orphans_tests.rs"]
mod tests;
