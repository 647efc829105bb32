// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the engine.

use sj_core::Job;
use std::path::{Path, PathBuf};

/// Name of the per-job cache directory when none is configured.
pub const DEFAULT_CACHE_DIR_NAME: &str = "cachedData";

/// Scratch directory name inside the analysis directory when no work root
/// is configured.
pub const DEFAULT_SCRATCH_DIR_NAME: &str = ".work";

/// Root for per-job scratch directories (`SJ_WORK_DIR`).
pub fn work_root() -> Option<PathBuf> {
    std::env::var_os("SJ_WORK_DIR")
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
}

/// Scratch directory for a job: `SJ_WORK_DIR/<job-name>`, else
/// `<analysis>/.work`. Stable across restarts of the same job.
pub fn scratch_dir_for(job: &Job) -> PathBuf {
    match work_root() {
        Some(root) => root.join(&job.name),
        None => job.analysis_dir.join(DEFAULT_SCRATCH_DIR_NAME),
    }
}

/// Job-scoped cache for reference data: `SJ_LOCAL_DATA_CACHE_DIR/<id>`
/// keyed by the parent job so split children share it, else
/// `<scratch>/cachedData`.
pub fn local_data_cache_dir(job: &Job, scratch: &Path) -> PathBuf {
    match std::env::var_os("SJ_LOCAL_DATA_CACHE_DIR").filter(|v| !v.is_empty()) {
        Some(root) => {
            let owner = job.parent.as_ref().unwrap_or(&job.id);
            PathBuf::from(root).join(owner.as_str())
        }
        None => scratch.join(DEFAULT_CACHE_DIR_NAME),
    }
}

/// Tracing filter for binaries (`SJ_LOG`, default `warn`).
pub fn log_filter() -> String {
    std::env::var("SJ_LOG").unwrap_or_else(|_| "warn".to_string())
}
