// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Dividing a job into child jobs and folding their results back.

use crate::error::JobError;
use crate::scatter::{self, IntervalPlan};
use sj_core::{Clock, Job, SplitKey};
use sj_storage::IntervalMapFile;
use std::collections::HashSet;
use std::path::Path;

/// Establish the scatter plan of a scatter parent.
///
/// A plan already on disk is reused so re-invoking a job yields the same
/// children. Non-scatter jobs and split children are left alone.
pub fn prepare_scatter(job: &mut Job) -> Result<(), JobError> {
    if job.is_split_child() || !job.is_scatter_job()? || !job.scatter_plan.is_empty() {
        return Ok(());
    }
    job.scatter_plan = load_or_plan(job)?;
    Ok(())
}

/// The parent's plan: in memory, else `jobsToInterval.txt`, else computed
/// from the reference dictionary and written.
pub fn load_or_plan(job: &Job) -> Result<IntervalPlan, JobError> {
    if !job.scatter_plan.is_empty() {
        return Ok(job.scatter_plan.clone());
    }
    let file = IntervalMapFile::in_dir(job.plan_dir());
    if file.exists() {
        tracing::debug!(path = %file.path().display(), "reusing scatter plan");
        return Ok(file.read()?);
    }
    let genome = job
        .genome
        .as_ref()
        .ok_or_else(|| JobError::NoGenome(job.name.clone()))?;
    let dict = scatter::read_dictionary(&genome.dictionary_path())?;
    let plan = scatter::plan(&dict, job.scatter_method()?, &job.params.scatter_settings()?)?;
    file.write(&plan)?;
    tracing::info!(jobs = plan.len(), path = %file.path().display(), "wrote scatter plan");
    Ok(plan)
}

/// One child per planned interval set for scatter jobs, otherwise one per
/// input file.
pub fn create_split_jobs(parent: &Job, clock: &dyn Clock) -> Result<Vec<Job>, JobError> {
    if parent.is_scatter_job()? {
        let plan = load_or_plan(parent)?;
        return Ok(plan
            .into_iter()
            .map(|(name, intervals)| {
                let mut child = parent.child(SplitKey::Intervals(name), clock);
                child.input_files = parent.input_files.clone();
                child.intervals = intervals;
                child
            })
            .collect());
    }

    let mut labels = HashSet::new();
    let mut children = Vec::with_capacity(parent.input_files.len());
    for file in &parent.input_files {
        let split = SplitKey::File(file.clone());
        if !labels.insert(split.label()) {
            return Err(JobError::Ambiguous(format!(
                "two inputs of {} split to the same child '{}'",
                parent.name,
                split.label()
            )));
        }
        let label = split.label();
        let mut child = parent.child(split, clock);
        if is_non_dir(&child.analysis_dir) {
            // An input without an extension sits where the child's directory would.
            child.analysis_dir = parent.analysis_dir.join(format!("{label}.split"));
            if is_non_dir(&child.analysis_dir) {
                return Err(JobError::Ambiguous(format!(
                    "no directory available for split child '{label}' of {}",
                    parent.name
                )));
            }
        }
        child.input_files = vec![file.clone()];
        children.push(child);
    }
    Ok(children)
}

fn is_non_dir(path: &Path) -> bool {
    path.symlink_metadata().is_ok_and(|m| !m.is_dir())
}

/// Fold a finished child into its parent.
///
/// Actions and pending outputs are appended. Each scatter result must name
/// a slot in the parent's plan that has not been filled yet.
pub fn merge_split_job(parent: &mut Job, child: &Job) -> Result<(), JobError> {
    if child.split.is_none() || child.parent.as_ref() != Some(&parent.id) {
        return Err(JobError::UnattributableSplit(child.name.clone()));
    }
    for key in child.scatter_outputs.keys() {
        if !parent.scatter_plan.contains_key(key) {
            return Err(JobError::UnattributableSplit(key.clone()));
        }
        if parent.scatter_outputs.contains_key(key) {
            return Err(JobError::UnattributableSplit(format!("{key} (already merged)")));
        }
    }

    parent.add_actions(child.actions.iter().cloned());
    parent.add_outputs_to_create(child.outputs_to_create.iter().cloned());
    for (key, output) in &child.scatter_outputs {
        parent.scatter_outputs.insert(key.clone(), output.clone());
    }
    tracing::debug!(parent = %parent.name, child = %child.name, "merged split job");
    Ok(())
}

#[cfg(test)]
#[path = "split_tests.rs"]
mod tests;
