// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Replay of the deferred-delete log at the end of a job.

use crate::error::JobError;
use crate::fs_util;
use sj_storage::DeferredDeleteLog;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeferredReport {
    pub deleted: Vec<PathBuf>,
    /// Logged paths that no longer resolve to anything.
    pub missing: Vec<String>,
    /// The job does not delete intermediates; the log was dropped unread.
    pub skipped: bool,
}

/// Delete every file named in `log`, then the log itself.
///
/// Each entry is looked up under `scratch`, then `permanent`, then taken as
/// written. Nothing is deleted unless `honor` is set, but the log is always
/// removed.
pub fn replay_deferred_deletes(
    log: &DeferredDeleteLog,
    scratch: &Path,
    permanent: &Path,
    honor: bool,
) -> Result<DeferredReport, JobError> {
    let mut report = DeferredReport::default();
    if !log.exists() {
        return Ok(report);
    }

    if honor {
        for entry in log.read()? {
            match resolve_logged_path(&entry.path, scratch, permanent) {
                Some(path) => {
                    fs_util::remove_path(&path).map_err(|e| JobError::io(&path, e))?;
                    if fs_util::exists_no_follow(&path) {
                        return Err(JobError::DeleteFailed(path));
                    }
                    fs_util::prune_empty_parents(&path, &[scratch, permanent]);
                    tracing::debug!(path = %path.display(), "deleted deferred intermediate");
                    report.deleted.push(path);
                }
                None => {
                    tracing::debug!(path = entry.path, "deferred intermediate already gone");
                    report.missing.push(entry.path);
                }
            }
        }
    } else {
        tracing::info!(
            log = %log.path().display(),
            "intermediate deletion disabled, discarding deferred-delete log"
        );
        report.skipped = true;
    }

    log.remove()?;
    Ok(report)
}

/// Where a logged path lives now: under `scratch`, then `permanent`, then
/// as written. `None` when nothing exists at any of them.
pub fn resolve_logged_path(logged: &str, scratch: &Path, permanent: &Path) -> Option<PathBuf> {
    let logged = Path::new(logged);
    [scratch.join(logged), permanent.join(logged), logged.to_path_buf()]
        .into_iter()
        .find(|candidate| fs_util::exists_no_follow(candidate))
}

#[cfg(test)]
#[path = "deferred_tests.rs"]
mod tests;
