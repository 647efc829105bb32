// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Tasks, the factories that decide when they run, and what they run with.

use crate::env;
use crate::error::JobError;
use crate::file_manager::TaskFileManager;
use crate::job_logger::JobLogger;
use crate::resumer::Resumer;
use crate::staging::{StagingArea, StagingMode};
use crate::step::StepRegistry;
use serde::{Deserialize, Serialize};
use sj_core::{Clock, Job, RecordedAction};
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Where a task runs. Informational only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Location {
    WebServer,
    #[default]
    Remote,
}

sj_core::simple_display! {
    Location {
        WebServer => "webserver",
        Remote => "remote",
    }
}

/// Everything a running task may use.
pub struct TaskContext<'a> {
    pub job: &'a mut Job,
    pub steps: &'a StepRegistry,
    pub clock: Arc<dyn Clock>,
    pub cancel: &'a CancellationToken,
    pub logger: &'a JobLogger,
    pub scratch_dir: PathBuf,
}

impl TaskContext<'_> {
    /// A staging area over the job's scratch and analysis directories.
    pub fn staging(&self) -> Result<StagingArea, JobError> {
        let mode = if self.job.params.copy_inputs_locally() {
            StagingMode::Copy
        } else {
            StagingMode::InPlace
        };
        let mut staging = StagingArea::create(&self.scratch_dir, &self.job.analysis_dir, mode)?;
        staging.exclude(env::DEFAULT_CACHE_DIR_NAME);
        Ok(staging)
    }

    /// File manager for a task that keeps no checkpoint.
    pub fn file_manager(&self) -> Result<TaskFileManager, JobError> {
        TaskFileManager::new(self.job, self.staging()?, self.clock.clone())
    }

    /// Load or start the checkpoint `checkpoint_name`.
    pub fn resumer(&mut self, checkpoint_name: &str) -> Result<Resumer, JobError> {
        let staging = self.staging()?;
        Resumer::create(self.job, checkpoint_name, staging, self.clock.clone())
    }

    pub fn cache_dir(&self) -> PathBuf {
        env::local_data_cache_dir(self.job, &self.scratch_dir)
    }

    pub fn check_cancelled(&self) -> Result<(), JobError> {
        if self.cancel.is_cancelled() {
            return Err(JobError::Cancelled);
        }
        Ok(())
    }
}

pub trait Task {
    fn name(&self) -> &str;

    /// Run to completion, returning the actions handed to the job.
    fn run(&mut self, ctx: &mut TaskContext<'_>) -> Result<Vec<RecordedAction>, JobError>;
}

pub trait TaskFactory: Send + Sync {
    fn id(&self) -> &str;

    fn location(&self) -> Location {
        Location::Remote
    }

    /// Whether this task applies to the job at all.
    fn is_participant(&self, _job: &Job) -> Result<bool, JobError> {
        Ok(true)
    }

    /// Joined tasks run once on the parent after split children merge.
    fn is_join(&self) -> bool {
        false
    }

    fn create_task(&self, job: &Job) -> Result<Box<dyn Task>, JobError>;
}
