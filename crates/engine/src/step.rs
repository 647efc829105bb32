// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Pluggable processing steps and the registry tasks draw them from.

use crate::error::JobError;
use serde::{Deserialize, Serialize};
use sj_core::{Interval, Job, StepOutput};
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Families of steps a pipeline is assembled from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StepKind {
    Alignment,
    Analysis,
    VariantProcessing,
    ReferenceLibrary,
    BamProcessing,
}

sj_core::simple_display! {
    StepKind {
        Alignment => "alignment",
        Analysis => "analysis",
        VariantProcessing => "variant processing",
        ReferenceLibrary => "reference library",
        BamProcessing => "BAM processing",
    }
}

/// Everything a step sees for one input.
pub struct StepInvocation<'a> {
    pub job: &'a Job,
    pub input: &'a Path,
    /// Where new files go; reconciled after the task.
    pub output_dir: &'a Path,
    /// Empty unless the job is a scatter child.
    pub intervals: &'a [Interval],
    pub cache_dir: &'a Path,
    pub cancel: &'a CancellationToken,
}

pub trait Step: Send + Sync {
    fn kind(&self) -> StepKind;

    fn name(&self) -> &str;

    /// Called once per job before any input is processed.
    fn prepare(&self, _job: &Job) -> Result<(), JobError> {
        Ok(())
    }

    /// Output roles this step produces, for logging.
    fn describe_outputs(&self) -> Vec<String> {
        Vec::new()
    }

    fn execute(&self, invocation: &StepInvocation<'_>) -> Result<StepOutput, JobError>;
}

/// Combines per-key scatter artifacts into one file. Returns the commands
/// it ran, for provenance.
pub trait ArtifactMerger: Send + Sync {
    fn merge(&self, parts: &[PathBuf], output: &Path) -> Result<Vec<String>, JobError>;
}

/// Concatenates parts in order.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConcatMerger;

impl ArtifactMerger for ConcatMerger {
    fn merge(&self, parts: &[PathBuf], output: &Path) -> Result<Vec<String>, JobError> {
        if let Some(parent) = output.parent() {
            fs::create_dir_all(parent).map_err(|e| JobError::io(parent, e))?;
        }
        let mut out = File::create(output).map_err(|e| JobError::io(output, e))?;
        for part in parts {
            let mut reader = File::open(part).map_err(|e| JobError::io(part, e))?;
            io::copy(&mut reader, &mut out).map_err(|e| JobError::io(output, e))?;
        }
        let names = parts
            .iter()
            .map(|p| p.display().to_string())
            .collect::<Vec<_>>()
            .join(" ");
        Ok(vec![format!("cat {} > {}", names, output.display())])
    }
}

#[derive(Clone, Default)]
pub struct StepRegistry {
    steps: Vec<Arc<dyn Step>>,
    merger: Option<Arc<dyn ArtifactMerger>>,
}

impl StepRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_step(mut self, step: Arc<dyn Step>) -> Self {
        self.steps.push(step);
        self
    }

    pub fn with_merger(mut self, merger: Arc<dyn ArtifactMerger>) -> Self {
        self.merger = Some(merger);
        self
    }

    /// Steps of `kind` in registration order.
    pub fn of_kind(&self, kind: StepKind) -> Vec<Arc<dyn Step>> {
        self.steps
            .iter()
            .filter(|s| s.kind() == kind)
            .cloned()
            .collect()
    }

    /// The single step of `kind`. Zero or several is a configuration error.
    pub fn require_one(&self, kind: StepKind) -> Result<Arc<dyn Step>, JobError> {
        let mut steps = self.of_kind(kind);
        match steps.len() {
            0 => Err(JobError::NoSteps(kind)),
            1 => Ok(steps.remove(0)),
            found => Err(JobError::StepCount { kind, found }),
        }
    }

    /// At least one step of `kind`.
    pub fn require_any(&self, kind: StepKind) -> Result<Vec<Arc<dyn Step>>, JobError> {
        let steps = self.of_kind(kind);
        if steps.is_empty() {
            return Err(JobError::NoSteps(kind));
        }
        Ok(steps)
    }

    pub fn merger(&self) -> Arc<dyn ArtifactMerger> {
        self.merger
            .clone()
            .unwrap_or_else(|| Arc::new(ConcatMerger))
    }
}

#[cfg(test)]
#[path = "step_tests.rs"]
mod tests;
