// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Top-level controller that runs a job's tasks in order.
//!
//! Tasks before the first join run on each split child; joined tasks run
//! once on the parent after every child has been merged back.

use crate::env;
use crate::error::JobError;
use crate::file_manager::replay_deferred_deletes;
use crate::job_logger::JobLogger;
use crate::split;
use crate::step::StepRegistry;
use crate::task::{TaskContext, TaskFactory};
use sj_core::{Clock, Job, JobStatus, RecordedAction, TaskOutcome};
use sj_storage::{write_atomic, DeferredDeleteLog};
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Record of a finished split child, in the child's analysis directory.
pub const CHILD_RECORD_NAME: &str = "splitJob.json";

/// Ordered task factories making up one pipeline.
#[derive(Clone, Default)]
pub struct TaskPipeline {
    id: String,
    factories: Vec<Arc<dyn TaskFactory>>,
}

impl TaskPipeline {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            factories: Vec::new(),
        }
    }

    pub fn with_task(mut self, factory: Arc<dyn TaskFactory>) -> Self {
        self.factories.push(factory);
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn factories(&self) -> &[Arc<dyn TaskFactory>] {
        &self.factories
    }
}

pub struct Sequencer {
    pipeline: TaskPipeline,
    steps: StepRegistry,
    clock: Arc<dyn Clock>,
    cancel: CancellationToken,
}

/// A job that ran, kept for end-of-job housekeeping.
struct Ran {
    analysis_dir: PathBuf,
    scratch_dir: PathBuf,
    delete_intermediates: bool,
}

impl Sequencer {
    pub fn new(pipeline: TaskPipeline, steps: StepRegistry, clock: Arc<dyn Clock>) -> Self {
        Self {
            pipeline,
            steps,
            clock,
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Token that stops the job before its next task.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Run every task for `job`, recording the outcome on the job.
    ///
    /// A failed job keeps its scratch directory and checkpoints, so running
    /// it again resumes where it stopped.
    pub fn run(&self, job: &mut Job) -> Result<(), JobError> {
        let logger = JobLogger::for_job(job);
        logger.append("pipeline", &format!("starting {}", self.pipeline.id()));
        let result = self.run_job(job, &logger);
        match &result {
            Ok(()) => {
                job.status = JobStatus::Complete;
                logger.append("pipeline", "complete");
            }
            Err(JobError::Cancelled) => {
                job.status = JobStatus::Cancelled;
                logger.append("pipeline", "cancelled");
            }
            Err(e) => {
                job.fail(e.to_string());
                logger.append("pipeline", &format!("failed: {e}"));
                tracing::error!(job = %job.name, error = %e, scope = ?e.scope(), "job failed");
            }
        }
        result
    }

    fn run_job(&self, job: &mut Job, logger: &JobLogger) -> Result<(), JobError> {
        split::prepare_scatter(job)?;
        job.status = JobStatus::Running;

        let mut ran = vec![Ran::of(job)];
        let factories = self.pipeline.factories();
        let mut split_done = false;
        let mut idx = 0;
        while idx < factories.len() {
            self.check_cancelled()?;
            if job.should_split() && !split_done && !factories[idx].is_join() {
                let end = factories[idx..]
                    .iter()
                    .position(|f| f.is_join())
                    .map_or(factories.len(), |p| idx + p);
                ran.extend(self.run_split(job, &factories[idx..end], logger)?);
                split_done = true;
                idx = end;
                continue;
            }
            self.run_task(job, factories[idx].as_ref(), logger)?;
            idx += 1;
        }

        for r in &ran {
            let log = DeferredDeleteLog::in_dir(&r.analysis_dir);
            let report =
                replay_deferred_deletes(&log, &r.scratch_dir, &r.analysis_dir, r.delete_intermediates)?;
            if !report.deleted.is_empty() {
                logger.append(
                    "pipeline",
                    &format!("deleted {} deferred intermediate files", report.deleted.len()),
                );
            }
            if r.scratch_dir.is_dir() {
                if let Err(e) = fs::remove_dir_all(&r.scratch_dir) {
                    tracing::warn!(path = %r.scratch_dir.display(), error = %e, "failed to remove scratch directory");
                }
            }
        }
        Ok(())
    }

    fn run_split(
        &self,
        job: &mut Job,
        segment: &[Arc<dyn TaskFactory>],
        logger: &JobLogger,
    ) -> Result<Vec<Ran>, JobError> {
        let children = split::create_split_jobs(job, self.clock.as_ref())?;
        job.status = JobStatus::Split;
        logger.append("split", &format!("created {} child jobs", children.len()));

        let mut ran = Vec::with_capacity(children.len());
        for mut child in children {
            if let Some(done) = read_child_record(&child)? {
                split::merge_split_job(job, &done)?;
                logger.append("split", &format!("child {} already complete", done.name));
                ran.push(Ran::of(&done));
                continue;
            }
            child.status = JobStatus::Running;
            let child_logger = JobLogger::for_job(&child);
            for factory in segment {
                self.check_cancelled()?;
                if let Err(e) = self.run_task(&mut child, factory.as_ref(), &child_logger) {
                    child.fail(e.to_string());
                    logger.append("split", &format!("child {} failed: {e}", child.name));
                    return Err(e);
                }
            }
            child.status = JobStatus::Complete;
            write_child_record(&child)?;
            split::merge_split_job(job, &child)?;
            logger.append("split", &format!("merged child {}", child.name));
            ran.push(Ran::of(&child));
        }
        job.status = JobStatus::Merged;
        Ok(ran)
    }

    fn run_task(&self, job: &mut Job, factory: &dyn TaskFactory, logger: &JobLogger) -> Result<(), JobError> {
        let id = factory.id().to_string();
        job.push_task(&id, self.clock.epoch_ms());
        if !factory.is_participant(job)? {
            job.finalize_current_task(TaskOutcome::Skipped, self.clock.epoch_ms());
            logger.append(&id, "skipped, not a participant");
            return Ok(());
        }
        logger.append(&id, &format!("starting ({})", factory.location()));
        tracing::info!(job = %job.name, task = %id, location = %factory.location(), "running task");

        let result = self.execute(job, factory, logger);
        match result {
            Ok(actions) => {
                logger.append_actions(&id, &actions);
                logger.append(&id, "complete");
                job.finalize_current_task(TaskOutcome::Completed, self.clock.epoch_ms());
                Ok(())
            }
            Err(e) => {
                logger.append(&id, &format!("failed: {e}"));
                job.finalize_current_task(TaskOutcome::Failed(e.to_string()), self.clock.epoch_ms());
                Err(e)
            }
        }
    }

    fn execute(
        &self,
        job: &mut Job,
        factory: &dyn TaskFactory,
        logger: &JobLogger,
    ) -> Result<Vec<RecordedAction>, JobError> {
        let mut task = factory.create_task(job)?;
        let scratch_dir = env::scratch_dir_for(job);
        let mut ctx = TaskContext {
            job,
            steps: &self.steps,
            clock: self.clock.clone(),
            cancel: &self.cancel,
            logger,
            scratch_dir,
        };
        task.run(&mut ctx)
    }

    fn check_cancelled(&self) -> Result<(), JobError> {
        if self.cancel.is_cancelled() {
            return Err(JobError::Cancelled);
        }
        Ok(())
    }
}

/// A completed child's job record, if an earlier run finished it.
fn read_child_record(child: &Job) -> Result<Option<Job>, JobError> {
    let path = child.analysis_dir.join(CHILD_RECORD_NAME);
    let text = match fs::read_to_string(&path) {
        Ok(text) => text,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(JobError::io(&path, e)),
    };
    let mut done: Job =
        serde_json::from_str(&text).map_err(|source| JobError::JobRecord { path, source })?;
    if done.status != JobStatus::Complete {
        return Ok(None);
    }
    // Identity comes from this run's parent.
    done.id = child.id.clone();
    done.parent = child.parent.clone();
    Ok(Some(done))
}

fn write_child_record(child: &Job) -> Result<(), JobError> {
    let path = child.analysis_dir.join(CHILD_RECORD_NAME);
    let bytes = serde_json::to_vec_pretty(child).map_err(|source| JobError::JobRecord {
        path: path.clone(),
        source,
    })?;
    write_atomic(&path, &bytes).map_err(|e| JobError::io(&path, e))
}

impl Ran {
    fn of(job: &Job) -> Self {
        Self {
            analysis_dir: job.analysis_dir.clone(),
            scratch_dir: env::scratch_dir_for(job),
            delete_intermediates: job.params.delete_intermediate_files(),
        }
    }
}

#[cfg(test)]
#[path = "sequencer_tests.rs"]
mod tests;
