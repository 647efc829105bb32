// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Scratch/permanent directory pair for one task.
//!
//! Inputs may be staged into the scratch directory before a task runs.
//! After it runs, [`StagingArea::reconcile`] moves every scratch file to the
//! same relative path under the permanent directory, reporting each one so
//! callers can rewrite what refers to it.

use crate::error::StagingError;
use crate::fs_util;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// How inputs reach the scratch directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StagingMode {
    Copy,
    /// Hard link, falling back to a copy across filesystems.
    HardLink,
    /// Inputs are read where they are.
    #[default]
    InPlace,
}

/// A scratch file moved into the permanent directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relocated {
    /// Relative path, identical under both roots.
    pub key: String,
    pub from: PathBuf,
    pub to: PathBuf,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    pub moved: Vec<(PathBuf, PathBuf)>,
    pub removed_links: Vec<PathBuf>,
}

#[derive(Debug)]
pub struct StagingArea {
    scratch: PathBuf,
    permanent: PathBuf,
    mode: StagingMode,
    staged: IndexMap<PathBuf, PathBuf>,
    excluded: Vec<String>,
}

impl StagingArea {
    /// Create the scratch directory if needed.
    pub fn create(
        scratch: impl Into<PathBuf>,
        permanent: impl Into<PathBuf>,
        mode: StagingMode,
    ) -> Result<Self, StagingError> {
        let scratch = scratch.into();
        let permanent = permanent.into();
        fs::create_dir_all(&scratch).map_err(|e| StagingError::io(&scratch, e))?;
        fs::create_dir_all(&permanent).map_err(|e| StagingError::io(&permanent, e))?;
        Ok(Self {
            scratch,
            permanent,
            mode,
            staged: IndexMap::new(),
            excluded: Vec::new(),
        })
    }

    /// Leave a top-level scratch entry out of reconciliation.
    pub fn exclude(&mut self, name: impl Into<String>) {
        self.excluded.push(name.into());
    }

    pub fn scratch_root(&self) -> &Path {
        &self.scratch
    }

    pub fn permanent_root(&self) -> &Path {
        &self.permanent
    }

    pub fn mode(&self) -> StagingMode {
        self.mode
    }

    /// Key for a file: relative to scratch, else to permanent, else the
    /// normalized absolute path.
    pub fn relative_path(&self, file: &Path) -> String {
        for root in [&self.scratch, &self.permanent] {
            if let Ok(rel) = file.strip_prefix(root) {
                return fs_util::normalize(rel);
            }
        }
        fs_util::normalize(file)
    }

    pub fn is_in_scratch(&self, file: &Path) -> bool {
        file.starts_with(&self.scratch)
    }

    pub fn staged_inputs(&self) -> &IndexMap<PathBuf, PathBuf> {
        &self.staged
    }

    pub fn staged_path(&self, original: &Path) -> Option<&Path> {
        self.staged.get(original).map(PathBuf::as_path)
    }

    /// Make `original` available to the task and return where to read it.
    ///
    /// Staging the same file again returns the existing copy.
    pub fn stage_input(&mut self, original: &Path) -> Result<PathBuf, StagingError> {
        if let Some(existing) = self.staged.get(original) {
            return Ok(existing.clone());
        }
        if !original.exists() {
            return Err(StagingError::MissingInput(original.to_path_buf()));
        }
        if self.mode == StagingMode::InPlace {
            self.staged
                .insert(original.to_path_buf(), original.to_path_buf());
            return Ok(original.to_path_buf());
        }

        let dest = self.staging_destination(original);
        if fs_util::exists_no_follow(&dest) {
            fs_util::remove_path(&dest).map_err(|e| StagingError::io(&dest, e))?;
        }
        self.copy_in(original, &dest)?;
        tracing::info!(
            from = %original.display(),
            to = %dest.display(),
            mode = ?self.mode,
            "staged input"
        );
        self.staged.insert(original.to_path_buf(), dest.clone());
        Ok(dest)
    }

    /// Re-establish a mapping from an earlier run, copying again only if
    /// the staged file is gone.
    pub fn restage(&mut self, original: &Path, staged: &Path) -> Result<PathBuf, StagingError> {
        if staged.exists() || original == staged {
            self.staged
                .insert(original.to_path_buf(), staged.to_path_buf());
            return Ok(staged.to_path_buf());
        }
        if !original.exists() {
            return Err(StagingError::MissingInput(original.to_path_buf()));
        }
        self.copy_in(original, staged)?;
        tracing::info!(from = %original.display(), to = %staged.display(), "restaged input");
        self.staged
            .insert(original.to_path_buf(), staged.to_path_buf());
        Ok(staged.to_path_buf())
    }

    /// Remove staged copies unless `keep` claims them. In-place entries are
    /// never touched. Returns the removed paths.
    pub fn discard_staged_inputs(
        &mut self,
        keep: impl Fn(&Path) -> bool,
    ) -> Result<Vec<PathBuf>, StagingError> {
        let entries: Vec<(PathBuf, PathBuf)> = self
            .staged
            .iter()
            .map(|(o, s)| (o.clone(), s.clone()))
            .collect();
        let mut removed = Vec::new();
        for (original, staged) in entries {
            if original == staged || keep(&staged) {
                continue;
            }
            if fs_util::exists_no_follow(&staged) {
                fs_util::remove_path(&staged).map_err(|e| StagingError::io(&staged, e))?;
                fs_util::prune_empty_parents(&staged, &[self.scratch.as_path()]);
            }
            tracing::debug!(path = %staged.display(), "discarded staged input");
            self.staged.shift_remove(&original);
            removed.push(staged);
        }
        Ok(removed)
    }

    /// Path under the scratch directory for a new output.
    pub fn output_file(&self, name: &str) -> PathBuf {
        self.scratch.join(name)
    }

    /// Move every scratch file to the same relative path under the
    /// permanent directory.
    ///
    /// Files go one at a time in sorted order and `on_file` runs after each
    /// move; the first failure stops the walk with everything already moved
    /// left in place. Existing destination files are replaced, directories
    /// merge, and dangling symlinks are removed.
    pub fn reconcile<F, E>(&mut self, mut on_file: F) -> Result<ReconcileReport, E>
    where
        F: FnMut(&Relocated) -> Result<(), E>,
        E: From<StagingError>,
    {
        if !self.scratch.is_dir() {
            return Err(StagingError::MissingScratch(self.scratch.clone()).into());
        }
        let mut report = ReconcileReport::default();
        let files = fs_util::walk_files(&self.scratch).map_err(|e| StagingError::io(&self.scratch, e))?;
        for from in files {
            if self.is_excluded(&from) {
                continue;
            }
            if fs_util::is_broken_symlink(&from) {
                fs::remove_file(&from).map_err(|e| StagingError::io(&from, e))?;
                tracing::debug!(path = %from.display(), "removed dangling symlink");
                report.removed_links.push(from);
                continue;
            }
            let key = self.relative_path(&from);
            let to = self.permanent.join(&key);
            fs_util::move_file(&from, &to).map_err(|e| StagingError::io(&from, e))?;
            tracing::debug!(from = %from.display(), to = %to.display(), "reconciled file");
            self.staged.retain(|_, staged| staged.as_path() != from.as_path());
            let relocated = Relocated {
                key,
                from: from.clone(),
                to: to.clone(),
            };
            report.moved.push((from, to));
            on_file(&relocated)?;
        }
        fs_util::prune_empty_dirs(&self.scratch).map_err(|e| StagingError::io(&self.scratch, e))?;
        Ok(report)
    }

    fn is_excluded(&self, path: &Path) -> bool {
        let Ok(rel) = path.strip_prefix(&self.scratch) else {
            return false;
        };
        rel.components()
            .next()
            .is_some_and(|c| self.excluded.iter().any(|e| c.as_os_str() == e.as_str()))
    }

    fn staging_destination(&self, original: &Path) -> PathBuf {
        let name = original
            .file_name()
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("input"));
        let preferred = match original.strip_prefix(&self.permanent) {
            Ok(rel) => self.scratch.join(rel),
            Err(_) => self.scratch.join(&name),
        };
        let taken = |p: &Path| self.staged.values().any(|s| s.as_path() == p);
        if !taken(&preferred) {
            return preferred;
        }
        let mut n = 1;
        loop {
            let candidate = self.scratch.join(format!("input{n}")).join(&name);
            if !taken(&candidate) {
                return candidate;
            }
            n += 1;
        }
    }

    fn copy_in(&self, original: &Path, dest: &Path) -> Result<(), StagingError> {
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent).map_err(|e| StagingError::io(parent, e))?;
        }
        if self.mode == StagingMode::HardLink && original.is_file() {
            match fs::hard_link(original, dest) {
                Ok(()) => return Ok(()),
                Err(e) => {
                    tracing::debug!(error = %e, "hard link failed, copying instead");
                }
            }
        }
        fs_util::copy_tree(original, dest).map_err(|e| StagingError::io(original, e))
    }
}

#[cfg(test)]
#[path = "staging_tests.rs"]
mod tests;
