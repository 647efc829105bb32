// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Runs every registered step of one kind over each input, in order, with
//! a checkpoint after each step.

use crate::error::JobError;
use crate::resumer::StepKey;
use crate::step::{StepInvocation, StepKind};
use crate::task::{Task, TaskContext, TaskFactory};
use sj_core::{Job, RecordedAction, SequenceOutput, SplitKey};
use std::path::{Path, PathBuf};

pub const STEP_CHAIN_CHECKPOINT: &str = "processVariantsCheckpoint.json";

const DEFAULT_TASK_ID: &str = "processVariants";

pub struct StepChainFactory {
    id: String,
    kind: StepKind,
}

impl StepChainFactory {
    pub fn new(kind: StepKind) -> Self {
        Self {
            id: DEFAULT_TASK_ID.to_string(),
            kind,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }
}

impl TaskFactory for StepChainFactory {
    fn id(&self) -> &str {
        &self.id
    }

    fn create_task(&self, _job: &Job) -> Result<Box<dyn Task>, JobError> {
        Ok(Box::new(StepChainTask {
            id: self.id.clone(),
            kind: self.kind,
        }))
    }
}

pub struct StepChainTask {
    id: String,
    kind: StepKind,
}

/// Where one input ended up after the chain.
struct ChainResult {
    input: PathBuf,
    last: PathBuf,
    produced: bool,
}

impl Task for StepChainTask {
    fn name(&self) -> &str {
        &self.id
    }

    fn run(&mut self, ctx: &mut TaskContext<'_>) -> Result<Vec<RecordedAction>, JobError> {
        let steps = ctx.steps.require_any(self.kind)?;
        for step in &steps {
            step.prepare(ctx.job)?;
        }

        let mut resumer = ctx.resumer(STEP_CHAIN_CHECKPOINT)?;
        if resumer.is_resume() {
            ctx.logger.append(&self.id, "resuming from checkpoint");
        }
        let cache_dir = ctx.cache_dir();
        let output_dir = resumer.files().scratch_dir().to_path_buf();
        let inputs = ctx.job.input_files.clone();
        let intervals = ctx.job.intervals.clone();

        let mut results = Vec::with_capacity(inputs.len());
        for input in &inputs {
            let mut current = input.clone();
            let mut produced = false;
            for (i, step) in steps.iter().enumerate() {
                ctx.check_cancelled()?;
                let key = StepKey::new(i as u32 + 1, input);
                if let Some(done) = resumer.output_from_step(&key) {
                    let done = resumer
                        .files()
                        .ledger()
                        .current_path(done)
                        .unwrap_or(done)
                        .to_path_buf();
                    ctx.logger.append(
                        &self.id,
                        &format!("step {} already complete for {}", step.name(), input.display()),
                    );
                    produced |= done != current;
                    current = done;
                    continue;
                }
                if !current.exists() {
                    return Err(JobError::MissingInput(current));
                }

                let step_input = if i == 0 {
                    resumer.stage_input(&current)?
                } else {
                    current.clone()
                };
                let files = resumer.files_mut();
                let action = files.start_action(step.name());
                files.add_input(action, "Input", &step_input)?;
                tracing::info!(step = step.name(), input = %step_input.display(), "running step");

                let output = step.execute(&StepInvocation {
                    job: ctx.job,
                    input: &step_input,
                    output_dir: &output_dir,
                    intervals: &intervals,
                    cache_dir: &cache_dir,
                    cancel: ctx.cancel,
                })?;
                files.add_step_outputs(action, &output)?;

                let next = match output.primary_output() {
                    Some(out) => {
                        if i > 0 {
                            files.add_intermediate_file(&current);
                        }
                        produced = true;
                        out.to_path_buf()
                    }
                    None => current.clone(),
                };
                current = next;
                resumer.set_step_complete(key, &current, action)?;
            }
            results.push(ChainResult {
                input: input.clone(),
                last: current,
                produced,
            });
        }

        let files = resumer.files_mut();
        let deleted = files.delete_intermediate_files()?;
        if deleted > 0 {
            ctx.logger.append(&self.id, &format!("deleted {deleted} intermediate files"));
        }
        let interval_key = match &ctx.job.split {
            Some(SplitKey::Intervals(name)) => Some(name.clone()),
            _ => None,
        };
        if interval_key.is_none() {
            files.handle_inputs()?;
        }
        for result in results.iter().filter(|r| r.produced) {
            files.add_sequence_output(
                SequenceOutput::new(
                    format!("{}: {}", ctx.job.name, file_label(&result.input)),
                    self.kind.to_string(),
                    &result.last,
                )
                .description(format!("{} output", self.kind)),
            );
        }
        resumer.cleanup()?;

        if let Some(key) = interval_key {
            let [result] = results.as_slice() else {
                return Err(JobError::Ambiguous(format!(
                    "interval job {} has {} inputs",
                    ctx.job.name,
                    results.len()
                )));
            };
            let output = result.produced.then(|| {
                resumer
                    .files()
                    .ledger()
                    .current_path(&result.last)
                    .unwrap_or(&result.last)
                    .to_path_buf()
            });
            ctx.job.scatter_outputs.insert(key, output);
        }
        resumer.mark_complete(ctx.job, false)
    }
}

fn file_label(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
#[path = "step_chain_tests.rs"]
mod tests;
