// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Joins per-key scatter results into one artifact on the parent job.

use crate::error::JobError;
use crate::fs_util;
use crate::split;
use crate::task::{Task, TaskContext, TaskFactory};
use sj_core::{Job, RecordedAction, SequenceOutput};
use std::path::{Path, PathBuf};

pub const GATHER_TASK_ID: &str = "mergeScatterOutputs";

const INDEX_SUFFIXES: &[&str] = &[".tbi", ".idx", ".csi"];

pub struct GatherFactory;

impl TaskFactory for GatherFactory {
    fn id(&self) -> &str {
        GATHER_TASK_ID
    }

    fn is_participant(&self, job: &Job) -> Result<bool, JobError> {
        Ok(job.should_split() && job.is_scatter_job()?)
    }

    fn is_join(&self) -> bool {
        true
    }

    fn create_task(&self, _job: &Job) -> Result<Box<dyn Task>, JobError> {
        Ok(Box::new(GatherTask))
    }
}

pub struct GatherTask;

impl Task for GatherTask {
    fn name(&self) -> &str {
        GATHER_TASK_ID
    }

    fn run(&mut self, ctx: &mut TaskContext<'_>) -> Result<Vec<RecordedAction>, JobError> {
        let plan = split::load_or_plan(ctx.job)?;

        let mut parts = Vec::new();
        let mut empty = 0;
        for key in plan.keys() {
            match ctx.job.scatter_outputs.get(key) {
                None => return Err(JobError::MissingScatterResult(key.clone())),
                Some(None) => empty += 1,
                Some(Some(path)) => parts.push(path.clone()),
            }
        }
        if empty > 0 && !parts.is_empty() {
            return Err(JobError::MixedScatterOutputs);
        }
        if parts.is_empty() {
            ctx.logger.append(GATHER_TASK_ID, "no scatter job produced an output");
            return Ok(Vec::new());
        }

        let mut files = ctx.file_manager()?;
        let output = ctx
            .job
            .analysis_dir
            .join(merged_file_name(&ctx.job.name, &parts[0]));
        let action = files.start_action("Merging Outputs");
        if output.exists() {
            ctx.logger.append(
                GATHER_TASK_ID,
                &format!("merged output exists, will not recreate: {}", output.display()),
            );
        } else {
            let missing: Vec<PathBuf> = parts.iter().filter(|p| !p.exists()).cloned().collect();
            if !missing.is_empty() {
                return Err(JobError::MissingMergeInputs(missing));
            }
            ctx.check_cancelled()?;
            let commands = ctx.steps.merger().merge(&parts, &output)?;
            if let Some(recorded) = files.action_mut(action) {
                for command in commands {
                    recorded.add_command(command);
                }
            }
        }

        for part in &parts {
            if part.exists() {
                files.add_input(action, "Input", part)?;
            }
            files.add_intermediate_file(part);
            for index in index_files(part) {
                files.add_intermediate_file(&index);
            }
        }
        files.add_output(action, "Merged Output", &output, false)?;
        files.finish_action(action)?;

        ctx.job.outputs_to_create.retain(|o| !parts.contains(&o.file));
        files.add_sequence_output(SequenceOutput::new(
            format!("{}: merged", ctx.job.name),
            "Merged Output",
            &output,
        ));
        files.delete_intermediate_files()?;
        files.cleanup()?;
        Ok(files.complete(ctx.job, 0))
    }
}

/// `<job><ext>` where `<ext>` keeps a trailing compression suffix,
/// e.g. `run1.vcf.gz`.
pub fn merged_file_name(job_name: &str, first_part: &Path) -> String {
    let name = first_part
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let mut pieces = name.rsplitn(3, '.');
    let last = pieces.next().unwrap_or_default();
    let before = pieces.next();
    let has_rest = pieces.next().is_some();
    match before {
        Some(ext) if matches!(last, "gz" | "bgz") && has_rest => {
            format!("{job_name}.{ext}.{last}")
        }
        Some(_) => format!("{job_name}.{last}"),
        None => job_name.to_string(),
    }
}

fn index_files(part: &Path) -> Vec<PathBuf> {
    INDEX_SUFFIXES
        .iter()
        .map(|suffix| fs_util::with_suffix(part, suffix))
        .filter(|p| p.exists())
        .collect()
}

#[cfg(test)]
#[path = "gather_tests.rs"]
mod tests;
