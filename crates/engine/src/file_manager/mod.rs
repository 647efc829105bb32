// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-task bookkeeping of every file a task touches.
//!
//! The [`TaskFileManager`] owns the task's [`FileLedger`] and
//! [`StagingArea`]. Tasks register inputs and outputs against actions as
//! they run; [`TaskFileManager::cleanup`] then relocates scratch outputs to
//! the analysis directory and rewrites every recorded path to match.

mod deferred;
mod inputs;

pub use deferred::{replay_deferred_deletes, resolve_logged_path, DeferredReport};

use crate::error::JobError;
use crate::fs_util;
use crate::staging::{Relocated, StagingArea};
use indexmap::{IndexMap, IndexSet};
use sj_core::{
    ActionId, Clock, Direction, FileLedger, InputFileTreatment, Job, RecordedAction, Registration,
    SequenceOutput, StepOutput, TrackedFile,
};
use sj_storage::DeferredDeleteLog;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// What [`TaskFileManager::cleanup`] did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleanupReport {
    /// Staged input copies removed before reconciling.
    pub discarded: Vec<PathBuf>,
    /// Scratch files moved to the permanent directory.
    pub relocated: Vec<(PathBuf, PathBuf)>,
    /// Outputs that no longer exist, now recorded as transient.
    pub transient: Vec<PathBuf>,
}

/// Bookkeeping as it stands right after one file was relocated.
pub struct CleanupProgress<'a> {
    pub ledger: &'a FileLedger,
    /// Staged inputs still in scratch, keyed by original path.
    pub staged_inputs: &'a IndexMap<PathBuf, PathBuf>,
}

pub struct TaskFileManager {
    ledger: FileLedger,
    staging: StagingArea,
    job_inputs: IndexSet<PathBuf>,
    treatment: InputFileTreatment,
    delete_intermediates: bool,
    deferred: DeferredDeleteLog,
    clock: Arc<dyn Clock>,
}

impl TaskFileManager {
    pub fn new(job: &Job, staging: StagingArea, clock: Arc<dyn Clock>) -> Result<Self, JobError> {
        Self::with_ledger(job, staging, FileLedger::new(), clock)
    }

    /// Continue with a ledger restored from a checkpoint.
    pub fn with_ledger(
        job: &Job,
        staging: StagingArea,
        ledger: FileLedger,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, JobError> {
        let deferred = DeferredDeleteLog::in_dir(staging.permanent_root());
        Ok(Self {
            ledger,
            job_inputs: job.input_files.iter().cloned().collect(),
            treatment: job.params.input_file_treatment()?,
            delete_intermediates: job.params.delete_intermediate_files(),
            deferred,
            staging,
            clock,
        })
    }

    pub fn ledger(&self) -> &FileLedger {
        &self.ledger
    }

    pub fn ledger_mut(&mut self) -> &mut FileLedger {
        &mut self.ledger
    }

    pub fn staging(&self) -> &StagingArea {
        &self.staging
    }

    pub fn staging_mut(&mut self) -> &mut StagingArea {
        &mut self.staging
    }

    pub fn scratch_dir(&self) -> &Path {
        self.staging.scratch_root()
    }

    pub fn analysis_dir(&self) -> &Path {
        self.staging.permanent_root()
    }

    pub fn input_treatment(&self) -> InputFileTreatment {
        self.treatment
    }

    pub fn deletes_intermediates(&self) -> bool {
        self.delete_intermediates
    }

    pub fn deferred_log(&self) -> &DeferredDeleteLog {
        &self.deferred
    }

    // -- actions --

    pub fn start_action(&mut self, name: &str) -> ActionId {
        self.ledger.start_action(name, self.clock.as_ref())
    }

    pub fn action_mut(&mut self, id: ActionId) -> Option<&mut RecordedAction> {
        self.ledger.action_mut(id)
    }

    /// Stamp the end time and queue the action for the job. Finishing twice
    /// is a no-op returning `false`.
    pub fn finish_action(&mut self, id: ActionId) -> Result<bool, JobError> {
        Ok(self.ledger.finish_action(id, self.clock.as_ref())?)
    }

    // -- registration --

    /// Record that `action` read `file`. Directories register every file
    /// beneath them.
    pub fn add_input(&mut self, action: ActionId, role: &str, file: &Path) -> Result<(), JobError> {
        self.register_tree(action, role, file, Direction::Input, false)
    }

    /// Record that `action` wrote `file`. Directories register every file
    /// beneath them.
    pub fn add_output(
        &mut self,
        action: ActionId,
        role: &str,
        file: &Path,
        transient: bool,
    ) -> Result<(), JobError> {
        self.register_tree(action, role, file, Direction::Output, transient)
    }

    /// Fold everything a step reported into `action` and the cleanup sets.
    pub fn add_step_outputs(&mut self, action: ActionId, output: &StepOutput) -> Result<(), JobError> {
        for (file, role) in &output.inputs {
            self.add_input(action, role, file)?;
        }
        for (file, role) in &output.outputs {
            self.add_output(action, role, file, false)?;
        }
        for file in &output.intermediate_files {
            self.add_intermediate_file(file);
        }
        for file in &output.deferred_delete_files {
            self.add_deferred_intermediate_file(file)?;
        }
        for sequence_output in &output.sequence_outputs {
            self.add_sequence_output(sequence_output.clone());
        }
        if let Some(recorded) = self.ledger.action_mut(action) {
            for command in &output.commands {
                recorded.add_command(command.clone());
            }
        }
        Ok(())
    }

    fn register_tree(
        &mut self,
        action: ActionId,
        role: &str,
        file: &Path,
        direction: Direction,
        transient: bool,
    ) -> Result<(), JobError> {
        let files = if file.is_dir() {
            fs_util::walk_files(file).map_err(|e| JobError::io(file, e))?
        } else {
            vec![file.to_path_buf()]
        };
        for path in files {
            let key = self.staging.relative_path(&path);
            match self
                .ledger
                .register(action, &key, &path, role, direction, transient)?
            {
                Registration::Added(_) => {}
                Registration::Duplicate(_) => {
                    tracing::debug!(path = %path.display(), ?direction, "file already registered");
                }
            }
        }
        Ok(())
    }

    // -- intermediates --

    pub fn add_intermediate_file(&mut self, file: &Path) {
        self.ledger.add_intermediate(file);
    }

    pub fn add_intermediate_files<'a>(&mut self, files: impl IntoIterator<Item = &'a Path>) {
        for file in files {
            self.add_intermediate_file(file);
        }
    }

    pub fn remove_intermediate_file(&mut self, file: &Path) -> bool {
        self.ledger.remove_intermediate(file)
    }

    /// Queue a file for deletion after all tasks of the job finish. The log
    /// entry is relative to scratch or analysis directory when possible.
    pub fn add_deferred_intermediate_file(&mut self, file: &Path) -> Result<(), JobError> {
        let entry = self.staging.relative_path(file);
        self.deferred.append(&entry, self.clock.utc_now())?;
        Ok(())
    }

    // -- outputs --

    /// Queue an output for the job. Its file is no longer intermediate.
    pub fn add_sequence_output(&mut self, output: SequenceOutput) {
        self.ledger.add_sequence_output(output);
    }

    /// Mark a file as a final product; input handling leaves it in place.
    pub fn add_final_output(&mut self, file: &Path) {
        self.ledger.add_final_output(file);
    }

    /// Rewrite every reference to `original` so it names `replacement`.
    pub fn swap_files(&mut self, original: &Path, replacement: &Path) -> usize {
        let from_key = self.staging.relative_path(original);
        let to_key = self.staging.relative_path(replacement);
        self.ledger.swap(original, &from_key, replacement, &to_key)
    }

    fn is_job_input(&self, file: &Path) -> bool {
        self.job_inputs.contains(file)
    }

    // -- deletion --

    /// Delete registered intermediates if the job allows it. Job inputs and
    /// files already gone are skipped; a file that survives deletion fails
    /// the task. Returns how many were deleted.
    pub fn delete_intermediate_files(&mut self) -> Result<usize, JobError> {
        if !self.delete_intermediates {
            tracing::info!("intermediate file deletion disabled");
            return Ok(0);
        }
        let files: Vec<PathBuf> = self.ledger.intermediate_files().iter().cloned().collect();
        let mut deleted = 0;
        for file in files {
            if self.is_job_input(&file) {
                tracing::debug!(path = %file.display(), "not deleting job input");
                continue;
            }
            if fs_util::exists_no_follow(&file) {
                if let Err(e) = fs_util::remove_path(&file) {
                    tracing::warn!(path = %file.display(), error = %e, "failed to delete intermediate");
                }
                if fs_util::exists_no_follow(&file) {
                    return Err(JobError::DeleteFailed(file));
                }
                fs_util::prune_empty_parents(
                    &file,
                    &[self.staging.scratch_root(), self.staging.permanent_root()],
                );
                tracing::debug!(path = %file.display(), "deleted intermediate");
                deleted += 1;
            }
            self.ledger.remove_intermediate(&file);
        }
        tracing::info!(deleted, "deleted intermediate files");
        Ok(deleted)
    }

    /// Replay the deferred-delete log for the whole job.
    pub fn delete_deferred_intermediate_files(&self) -> Result<DeferredReport, JobError> {
        replay_deferred_deletes(
            &self.deferred,
            self.staging.scratch_root(),
            self.staging.permanent_root(),
            self.delete_intermediates,
        )
    }

    // -- cleanup --

    /// Relocate scratch outputs and rewrite recorded paths.
    pub fn cleanup(&mut self) -> Result<CleanupReport, JobError> {
        self.cleanup_with(&[], |_, _| Ok(()))
    }

    /// [`cleanup`](Self::cleanup) that also re-applies relocations from an
    /// interrupted earlier attempt and reports each new relocation to
    /// `on_relocated` as it happens, with the ledger already updated for it.
    /// An error from `on_relocated` stops the walk.
    pub fn cleanup_with<F>(
        &mut self,
        previously_relocated: &[(PathBuf, PathBuf)],
        mut on_relocated: F,
    ) -> Result<CleanupReport, JobError>
    where
        F: FnMut(&Relocated, CleanupProgress<'_>) -> Result<(), JobError>,
    {
        let ledger = &self.ledger;
        let discarded = self.staging.discard_staged_inputs(|staged| {
            ledger
                .find_by_path(staged)
                .and_then(|id| ledger.file(id))
                .is_some_and(TrackedFile::is_output)
        })?;

        self.ledger.reset_attribution();
        let ledger = &mut self.ledger;
        let mut staged_inputs = self.staging.staged_inputs().clone();
        let reconciled = self.staging.reconcile(|relocated: &Relocated| {
            if ledger
                .attribute(&relocated.key, &relocated.to, &relocated.key)
                .is_none()
            {
                ledger.swap(&relocated.from, &relocated.key, &relocated.to, &relocated.key);
            }
            staged_inputs.retain(|_, staged| staged.as_path() != relocated.from.as_path());
            on_relocated(
                relocated,
                CleanupProgress {
                    ledger: &*ledger,
                    staged_inputs: &staged_inputs,
                },
            )
        })?;

        for (from, to) in previously_relocated {
            let from_key = self.staging.relative_path(from);
            let to_key = self.staging.relative_path(to);
            if self.ledger.attribute(&from_key, to, &to_key).is_none() {
                self.ledger.swap(from, &from_key, to, &to_key);
            }
        }

        let mut report = CleanupReport {
            discarded,
            relocated: reconciled.moved,
            transient: Vec::new(),
        };
        for id in self.ledger.unattributed() {
            let Some(file) = self.ledger.file(id) else {
                continue;
            };
            if !file.is_output() || file.current().exists() {
                continue;
            }
            let path = file.current().to_path_buf();
            // Moved by an attempt that died before recording the move.
            if path.starts_with(self.staging.scratch_root()) {
                let key = self.staging.relative_path(&path);
                let moved = self.staging.permanent_root().join(&key);
                if moved.exists() {
                    tracing::info!(
                        from = %path.display(),
                        to = %moved.display(),
                        "output already relocated"
                    );
                    self.ledger.swap(&path, &key, &moved, &key);
                    continue;
                }
            }
            tracing::warn!(path = %path.display(), "output no longer exists, marking transient");
            self.ledger.mark_output_transient(id);
            report.transient.push(path);
        }
        if self.staging.scratch_root().is_dir() {
            fs_util::prune_empty_dirs(self.staging.scratch_root())
                .map_err(|e| JobError::io(self.staging.scratch_root(), e))?;
        }
        Ok(report)
    }

    /// Hand pending outputs and finished actions to the job, skipping the
    /// first `already_surfaced` actions. Returns the actions handed over.
    pub fn complete(&mut self, job: &mut Job, already_surfaced: usize) -> Vec<RecordedAction> {
        job.add_outputs_to_create(self.ledger.take_outputs_to_create());
        let actions: Vec<RecordedAction> = self
            .ledger
            .finished_actions()
            .into_iter()
            .skip(already_surfaced)
            .cloned()
            .collect();
        job.add_actions(actions.clone());
        actions
    }

    /// Remove the job's scratch directory once nothing in it is needed.
    pub fn remove_scratch(&self) -> Result<(), JobError> {
        let scratch = self.staging.scratch_root();
        if scratch.is_dir() {
            fs::remove_dir_all(scratch).map_err(|e| JobError::io(scratch, e))?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "file_manager_tests.rs"]
mod tests;
