// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! sj-engine: staging, file tracking, checkpoints, and the job sequencer

pub mod env;
mod error;
mod file_manager;
mod fs_util;
mod job_logger;
mod orphans;
mod resumer;
pub mod scatter;
mod sequencer;
pub mod split;
mod staging;
mod step;
mod task;
pub mod tasks;

#[cfg(test)]
mod test_steps;

pub use error::{FailureScope, JobError, StagingError};
pub use file_manager::{
    replay_deferred_deletes, resolve_logged_path, CleanupProgress, CleanupReport, DeferredReport,
    TaskFileManager,
};
pub use job_logger::JobLogger;
pub use orphans::{known_files, scan_orphans, OrphanReport, INDEX_EXTENSIONS};
pub use resumer::{Resumer, StepKey};
pub use sequencer::{Sequencer, TaskPipeline, CHILD_RECORD_NAME};
pub use staging::{ReconcileReport, Relocated, StagingArea, StagingMode};
pub use step::{ArtifactMerger, ConcatMerger, Step, StepInvocation, StepKind, StepRegistry};
pub use task::{Location, Task, TaskContext, TaskFactory};
