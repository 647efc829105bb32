// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error taxonomy for tasks and jobs.

use crate::step::StepKind;
use sj_core::{DictionaryError, LedgerError, ParamError};
use sj_storage::{CheckpointError, DeferredLogError, IntervalMapError};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors from the staging area.
#[derive(Debug, Error)]
pub enum StagingError {
    #[error("missing input file: {}", .0.display())]
    MissingInput(PathBuf),
    #[error("work directory does not exist: {}", .0.display())]
    MissingScratch(PathBuf),
    #[error("staging I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl StagingError {
    pub(crate) fn io(path: &Path, source: std::io::Error) -> Self {
        StagingError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// How far a failure reaches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureScope {
    /// The current task aborts; re-invoking the job resumes it.
    Task,
    /// The job is misconfigured and cannot run at all.
    Job,
}

/// The single error type returned by tasks.
#[derive(Debug, Error)]
pub enum JobError {
    #[error(transparent)]
    Staging(#[from] StagingError),
    #[error(transparent)]
    Checkpoint(#[from] CheckpointError),
    #[error(transparent)]
    DeferredLog(#[from] DeferredLogError),
    #[error(transparent)]
    IntervalMap(#[from] IntervalMapError),
    #[error(transparent)]
    Param(#[from] ParamError),
    #[error("sequence dictionary: {0}")]
    Dictionary(#[from] DictionaryError),
    #[error(transparent)]
    Ledger(#[from] LedgerError),
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("missing input file: {}", .0.display())]
    MissingInput(PathBuf),
    #[error("invalid job record {}: {source}", path.display())]
    JobRecord {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("unable to delete file: {}", .0.display())]
    DeleteFailed(PathBuf),
    #[error("missing result for interval/contig: {0}")]
    MissingScatterResult(String),
    #[error("the scatter jobs returned a mixture of null and non-null outputs")]
    MixedScatterOutputs,
    #[error("missing files to merge: {}", display_paths(.0))]
    MissingMergeInputs(Vec<PathBuf>),
    #[error("split result '{0}' cannot be attributed to a slot of the parent job")]
    UnattributableSplit(String),
    #[error("expected exactly one {kind} step, found {found}")]
    StepCount { kind: StepKind, found: usize },
    #[error("no {0} step configured")]
    NoSteps(StepKind),
    #[error("ambiguous match: {0}")]
    Ambiguous(String),
    #[error("job {0} has no reference genome")]
    NoGenome(String),
    #[error("step '{step}' failed: {message}")]
    Step { step: String, message: String },
    #[error("job cancelled")]
    Cancelled,
}

impl JobError {
    pub fn io(path: &Path, source: std::io::Error) -> Self {
        JobError::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    pub fn step(step: impl Into<String>, message: impl Into<String>) -> Self {
        JobError::Step {
            step: step.into(),
            message: message.into(),
        }
    }

    pub fn scope(&self) -> FailureScope {
        match self {
            JobError::StepCount { .. } | JobError::NoSteps(_) => FailureScope::Job,
            _ => FailureScope::Task,
        }
    }
}

fn display_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
