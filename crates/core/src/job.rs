// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job identifier, status machine, and the job record shared by its tasks.

use crate::action::RecordedAction;
use crate::clock::Clock;
use crate::genome::{Interval, ReferenceGenome};
use crate::output::SequenceOutput;
use crate::params::{JobParams, ParamError, ScatterGatherMethod};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

crate::define_id! {
    /// Unique identifier for a job or split child job.
    pub struct JobId("job-");
}

/// Lifecycle of a job.
///
/// `Created → [Split →] Running → [Merged →] Complete`, or `Failed` /
/// `Cancelled` from any non-terminal state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Created,
    /// Child jobs were created and are being run.
    Split,
    Running,
    /// Every child result was folded back into this job.
    Merged,
    Complete,
    Failed(String),
    Cancelled,
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobStatus::Complete | JobStatus::Failed(_) | JobStatus::Cancelled
        )
    }
}

crate::simple_display! {
    JobStatus {
        Created => "created",
        Split => "split",
        Running => "running",
        Merged => "merged",
        Complete => "complete",
        Failed(..) => "failed",
        Cancelled => "cancelled",
    }
}

/// Outcome of one task in the job's history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskOutcome {
    Running,
    Completed,
    /// The task is not a participant for this job.
    Skipped,
    Failed(String),
}

crate::simple_display! {
    TaskOutcome {
        Running => "running",
        Completed => "completed",
        Skipped => "skipped",
        Failed(..) => "failed",
    }
}

/// Record of a task execution (for task history)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskRecord {
    pub name: String,
    pub started_at_ms: u64,
    pub finished_at_ms: Option<u64>,
    pub outcome: TaskOutcome,
}

/// The subset of the parent's work a split child processes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SplitKey {
    /// One input file.
    File(PathBuf),
    /// One named entry of the parent's interval plan.
    Intervals(String),
}

impl SplitKey {
    /// Key used for the child's name, directory, and merge slot.
    pub fn label(&self) -> String {
        match self {
            SplitKey::File(path) => file_base_name(path),
            SplitKey::Intervals(name) => name.clone(),
        }
    }
}

/// File name without its extension, looking through `.gz` and `.bgz`.
fn file_base_name(path: &Path) -> String {
    let Some(name) = path.file_name().map(|n| n.to_string_lossy().into_owned()) else {
        return path.display().to_string();
    };
    let unzipped = [".gz", ".bgz"]
        .iter()
        .find_map(|ext| name.strip_suffix(ext))
        .unwrap_or(&name);
    match unzipped.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem.to_string(),
        _ => unzipped.to_string(),
    }
}

/// Configuration for creating a new job
#[derive(Debug, Clone)]
pub struct JobConfig {
    pub name: String,
    pub analysis_dir: PathBuf,
    pub params: JobParams,
    pub input_files: Vec<PathBuf>,
    pub genome: Option<ReferenceGenome>,
    pub splittable: bool,
}

impl JobConfig {
    pub fn builder(name: impl Into<String>, analysis_dir: impl Into<PathBuf>) -> JobConfigBuilder {
        JobConfigBuilder {
            name: name.into(),
            analysis_dir: analysis_dir.into(),
            params: JobParams::new(),
            input_files: Vec::new(),
            genome: None,
            splittable: false,
        }
    }
}

pub struct JobConfigBuilder {
    name: String,
    analysis_dir: PathBuf,
    params: JobParams,
    input_files: Vec<PathBuf>,
    genome: Option<ReferenceGenome>,
    splittable: bool,
}

impl JobConfigBuilder {
    crate::setters! {
        set {
            params: JobParams,
            input_files: Vec<PathBuf>,
            splittable: bool,
        }
        option {
            genome: ReferenceGenome,
        }
    }

    pub fn build(self) -> JobConfig {
        JobConfig {
            name: self.name,
            analysis_dir: self.analysis_dir,
            params: self.params,
            input_files: self.input_files,
            genome: self.genome,
            splittable: self.splittable,
        }
    }
}

/// A unit the sequencer schedules: a parent job or one split child.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<JobId>,
    pub params: JobParams,
    /// Permanent directory shared by every task of the job.
    pub analysis_dir: PathBuf,
    pub input_files: Vec<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub genome: Option<ReferenceGenome>,
    pub status: JobStatus,
    /// Whether the sequencer may split this job into children.
    #[serde(default)]
    pub splittable: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub split: Option<SplitKey>,
    /// Intervals an interval-split child processes.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub intervals: Vec<Interval>,
    /// Scatter plan in gather order, keyed by child split key.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub scatter_plan: IndexMap<String, Vec<Interval>>,
    /// Per-key results reported by children. `None` means the child ran but
    /// produced nothing.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub scatter_outputs: IndexMap<String, Option<PathBuf>>,
    #[serde(default)]
    pub outputs_to_create: Vec<SequenceOutput>,
    #[serde(default)]
    pub actions: Vec<RecordedAction>,
    #[serde(default)]
    pub task_history: Vec<TaskRecord>,
    pub created_at_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Job {
    pub fn new(config: JobConfig, clock: &dyn Clock) -> Self {
        Self {
            id: JobId::new(),
            name: config.name,
            parent: None,
            params: config.params,
            analysis_dir: config.analysis_dir,
            input_files: config.input_files,
            genome: config.genome,
            status: JobStatus::Created,
            splittable: config.splittable,
            split: None,
            intervals: Vec::new(),
            scatter_plan: IndexMap::new(),
            scatter_outputs: IndexMap::new(),
            outputs_to_create: Vec::new(),
            actions: Vec::new(),
            task_history: Vec::new(),
            created_at_ms: clock.epoch_ms(),
            error: None,
        }
    }

    /// Create a child that processes `split` in its own directory.
    ///
    /// Parameters and the reference genome are copied; the child's name is
    /// `<parent>-<key>` and it cannot be split again.
    pub fn child(&self, split: SplitKey, clock: &dyn Clock) -> Job {
        let label = split.label();
        let mut child = Job::new(
            JobConfig::builder(self.child_name(&label), self.analysis_dir.join(&label))
                .params(self.params.clone())
                .build(),
            clock,
        );
        child.parent = Some(self.id.clone());
        child.genome = self.genome.clone();
        child.split = Some(split);
        child
    }

    pub fn child_name(&self, suffix: &str) -> String {
        format!("{}-{}", self.name, suffix)
    }

    pub fn is_split_child(&self) -> bool {
        self.split.is_some()
    }

    pub fn scatter_method(&self) -> Result<ScatterGatherMethod, ParamError> {
        self.params.scatter_method()
    }

    pub fn is_scatter_job(&self) -> Result<bool, ParamError> {
        Ok(self.scatter_method()? != ScatterGatherMethod::None)
    }

    /// Whether the sequencer should split this job before running
    /// non-join tasks.
    pub fn should_split(&self) -> bool {
        self.splittable && !self.is_split_child()
    }

    /// Directory holding the scatter plan. Children read their parent's.
    pub fn plan_dir(&self) -> &Path {
        if self.is_split_child() {
            self.analysis_dir.parent().unwrap_or(&self.analysis_dir)
        } else {
            &self.analysis_dir
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    pub fn fail(&mut self, reason: impl Into<String>) {
        let reason = reason.into();
        self.error = Some(reason.clone());
        self.status = JobStatus::Failed(reason);
    }

    /// Push a new task record
    pub fn push_task(&mut self, name: &str, epoch_ms: u64) {
        self.task_history.push(TaskRecord {
            name: name.to_string(),
            started_at_ms: epoch_ms,
            finished_at_ms: None,
            outcome: TaskOutcome::Running,
        });
    }

    /// Finalize the most recent task record
    pub fn finalize_current_task(&mut self, outcome: TaskOutcome, epoch_ms: u64) {
        if let Some(record) = self.task_history.last_mut() {
            if record.finished_at_ms.is_none() {
                record.finished_at_ms = Some(epoch_ms);
                record.outcome = outcome;
            }
        }
    }

    /// Append provenance, skipping actions already recorded verbatim.
    pub fn add_actions(&mut self, actions: impl IntoIterator<Item = RecordedAction>) {
        for action in actions {
            if !self.actions.contains(&action) {
                self.actions.push(action);
            }
        }
    }

    pub fn add_outputs_to_create(&mut self, outputs: impl IntoIterator<Item = SequenceOutput>) {
        for output in outputs {
            if !self.outputs_to_create.contains(&output) {
                self.outputs_to_create.push(output);
            }
        }
    }
}

#[cfg(test)]
#[path = "job_tests.rs"]
mod tests;
