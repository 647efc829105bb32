// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Durable step-completion state for one task.
//!
//! A [`Resumer`] wraps the task's [`TaskFileManager`] and writes a
//! checkpoint after every completed step. If the task dies, the next
//! invocation reloads the checkpoint, restages inputs, and skips every step
//! already recorded.

use crate::error::JobError;
use crate::file_manager::{CleanupReport, TaskFileManager};
use crate::staging::StagingArea;
use indexmap::IndexMap;
use serde_json::{Map, Value};
use sj_core::{ActionId, Clock, FileLedger, Job, RecordedAction};
use sj_storage::{Checkpoint, CURRENT_CHECKPOINT_VERSION};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

const STEP_KEY_SEPARATOR: &str = "<>";

/// Identifies one step applied to one input: `"{ordinal}<>{input}"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StepKey {
    ordinal: u32,
    input: String,
}

impl StepKey {
    pub fn new(ordinal: u32, input: &Path) -> Self {
        Self {
            ordinal,
            input: input.display().to_string(),
        }
    }

    pub fn ordinal(&self) -> u32 {
        self.ordinal
    }

    pub fn input(&self) -> &str {
        &self.input
    }
}

impl fmt::Display for StepKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.ordinal, STEP_KEY_SEPARATOR, self.input)
    }
}

impl FromStr for StepKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (ordinal, input) = s
            .split_once(STEP_KEY_SEPARATOR)
            .ok_or_else(|| format!("step key without separator: {s}"))?;
        let ordinal = ordinal
            .parse()
            .map_err(|_| format!("step key with bad ordinal: {s}"))?;
        Ok(Self {
            ordinal,
            input: input.to_string(),
        })
    }
}

pub struct Resumer {
    path: PathBuf,
    task: String,
    is_resume: bool,
    step_outputs: IndexMap<String, PathBuf>,
    files: TaskFileManager,
    files_copied_locally: Vec<(PathBuf, PathBuf)>,
    task_state: Map<String, Value>,
    /// Finished actions already handed to the job.
    surfaced: usize,
    clock: Arc<dyn Clock>,
}

impl Resumer {
    /// Load `<analysis>/<file_name>` if present, otherwise start fresh.
    ///
    /// On resume, staged inputs are re-established and actions finished in
    /// earlier runs are handed to the job straight away.
    pub fn create(
        job: &mut Job,
        file_name: &str,
        staging: StagingArea,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, JobError> {
        let path = job.analysis_dir.join(file_name);
        if !path.exists() {
            tracing::info!(path = %path.display(), "no checkpoint found, starting fresh");
            let files = TaskFileManager::new(job, staging, clock.clone())?;
            return Ok(Self {
                path,
                task: file_name.to_string(),
                is_resume: false,
                step_outputs: IndexMap::new(),
                files,
                files_copied_locally: Vec::new(),
                task_state: Map::new(),
                surfaced: 0,
                clock,
            });
        }

        let checkpoint = Checkpoint::read(&path)?;
        let ledger = checkpoint
            .file_manager
            .clone()
            .unwrap_or_else(|| FileLedger::from_finished(checkpoint.actions().to_vec()));
        let mut files = TaskFileManager::with_ledger(job, staging, ledger, clock.clone())?;
        for (original, staged) in &checkpoint.copied_inputs {
            files.staging_mut().restage(original, staged)?;
        }

        let carried: Vec<RecordedAction> =
            files.ledger().finished_actions().into_iter().cloned().collect();
        let surfaced = carried.len();
        job.add_actions(carried);
        tracing::info!(
            path = %path.display(),
            completed_steps = checkpoint.step_outputs.len(),
            actions = surfaced,
            "resuming from checkpoint"
        );

        Ok(Self {
            path,
            task: checkpoint.task.unwrap_or_else(|| file_name.to_string()),
            is_resume: true,
            step_outputs: checkpoint.step_outputs,
            files,
            files_copied_locally: checkpoint.files_copied_locally,
            task_state: checkpoint.task_state,
            surfaced,
            clock,
        })
    }

    pub fn is_resume(&self) -> bool {
        self.is_resume
    }

    pub fn checkpoint_path(&self) -> &Path {
        &self.path
    }

    pub fn files(&self) -> &TaskFileManager {
        &self.files
    }

    pub fn files_mut(&mut self) -> &mut TaskFileManager {
        &mut self.files
    }

    /// Stage an input; the mapping is saved with the next checkpoint.
    pub fn stage_input(&mut self, original: &Path) -> Result<PathBuf, JobError> {
        Ok(self.files.staging_mut().stage_input(original)?)
    }

    pub fn is_step_complete(&self, key: &StepKey) -> bool {
        self.step_outputs.contains_key(&key.to_string())
    }

    pub fn output_from_step(&self, key: &StepKey) -> Option<&Path> {
        self.step_outputs.get(&key.to_string()).map(PathBuf::as_path)
    }

    pub fn completed_steps(&self) -> impl Iterator<Item = (&str, &Path)> {
        self.step_outputs
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_path()))
    }

    /// Finish the step's action, record its output, and persist before
    /// returning. A failed write fails the task.
    pub fn set_step_complete(
        &mut self,
        key: StepKey,
        output: impl Into<PathBuf>,
        action: ActionId,
    ) -> Result<(), JobError> {
        self.files.finish_action(action)?;
        self.step_outputs.insert(key.to_string(), output.into());
        self.save_state()
    }

    pub fn task_value(&self, key: &str) -> Option<&Value> {
        self.task_state.get(key)
    }

    /// Store task-specific state and persist it.
    pub fn set_task_value(&mut self, key: impl Into<String>, value: Value) -> Result<(), JobError> {
        self.task_state.insert(key.into(), value);
        self.save_state()
    }

    pub fn save_state(&self) -> Result<(), JobError> {
        self.writer().write(
            self.files.ledger(),
            self.files.staging().staged_inputs(),
            &self.files_copied_locally,
        )
    }

    /// Reconcile scratch into the analysis directory. The checkpoint is
    /// rewritten after every relocated file, so a task killed partway
    /// through replays the moves it already made on the next attempt.
    pub fn cleanup(&mut self) -> Result<CleanupReport, JobError> {
        let previous = self.files_copied_locally.clone();
        let writer = CheckpointWriter {
            path: &self.path,
            task: &self.task,
            is_resume: self.is_resume,
            step_outputs: &self.step_outputs,
            task_state: &self.task_state,
            clock: self.clock.as_ref(),
        };
        let copied = &mut self.files_copied_locally;
        let report = self.files.cleanup_with(&previous, |relocated, progress| {
            copied.push((relocated.from.clone(), relocated.to.clone()));
            writer.write(progress.ledger, progress.staged_inputs, copied.as_slice())
        })?;
        self.save_state()?;
        Ok(report)
    }

    fn writer(&self) -> CheckpointWriter<'_> {
        CheckpointWriter {
            path: &self.path,
            task: &self.task,
            is_resume: self.is_resume,
            step_outputs: &self.step_outputs,
            task_state: &self.task_state,
            clock: self.clock.as_ref(),
        }
    }

    /// Hand pending outputs and newly finished actions to the job, then
    /// remove the checkpoint unless `keep_file`.
    pub fn mark_complete(mut self, job: &mut Job, keep_file: bool) -> Result<Vec<RecordedAction>, JobError> {
        let actions = self.files.complete(job, self.surfaced);
        if keep_file {
            tracing::info!(path = %self.path.display(), "keeping checkpoint");
        } else {
            Checkpoint::remove(&self.path)?;
        }
        Ok(actions)
    }
}

/// The parts of a [`Resumer`] that do not change during cleanup.
struct CheckpointWriter<'a> {
    path: &'a Path,
    task: &'a str,
    is_resume: bool,
    step_outputs: &'a IndexMap<String, PathBuf>,
    task_state: &'a Map<String, Value>,
    clock: &'a dyn Clock,
}

impl CheckpointWriter<'_> {
    fn write(
        &self,
        ledger: &FileLedger,
        copied_inputs: &IndexMap<PathBuf, PathBuf>,
        files_copied_locally: &[(PathBuf, PathBuf)],
    ) -> Result<(), JobError> {
        let checkpoint = Checkpoint {
            version: CURRENT_CHECKPOINT_VERSION,
            task: Some(self.task.to_string()),
            recorded_actions: Some(ledger.finished_actions().into_iter().cloned().collect()),
            is_resume: self.is_resume,
            step_outputs: self.step_outputs.clone(),
            copied_inputs: copied_inputs.clone(),
            files_copied_locally: files_copied_locally.to_vec(),
            file_manager: Some(ledger.clone()),
            task_state: self.task_state.clone(),
            saved_at: Some(self.clock.utc_now()),
        };
        checkpoint.write(self.path)?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "resumer_tests.rs"]
mod tests;
