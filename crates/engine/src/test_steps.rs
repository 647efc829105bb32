// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Steps and fixtures shared by the engine's task tests.

use crate::error::JobError;
use crate::step::{Step, StepInvocation, StepKind};
use parking_lot::Mutex;
use sj_core::StepOutput;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Copies its input to `<stem>.<name>.vcf` in the output directory,
/// appending one line naming itself and any intervals.
pub(crate) struct AppendStep {
    name: &'static str,
    kind: StepKind,
    calls: Arc<Mutex<Vec<PathBuf>>>,
    failures_left: Mutex<usize>,
    produces: bool,
}

impl AppendStep {
    pub(crate) fn new(name: &'static str) -> Self {
        Self {
            name,
            kind: StepKind::VariantProcessing,
            calls: Arc::default(),
            failures_left: Mutex::new(0),
            produces: true,
        }
    }

    /// Fail the first `n` executions.
    pub(crate) fn failing(self, n: usize) -> Self {
        *self.failures_left.lock() = n;
        self
    }

    /// Report no output file.
    pub(crate) fn silent(mut self) -> Self {
        self.produces = false;
        self
    }

    pub(crate) fn calls(&self) -> Arc<Mutex<Vec<PathBuf>>> {
        self.calls.clone()
    }
}

impl Step for AppendStep {
    fn kind(&self) -> StepKind {
        self.kind
    }

    fn name(&self) -> &str {
        self.name
    }

    fn execute(&self, invocation: &StepInvocation<'_>) -> Result<StepOutput, JobError> {
        self.calls.lock().push(invocation.input.to_path_buf());
        {
            let mut left = self.failures_left.lock();
            if *left > 0 {
                *left -= 1;
                return Err(JobError::step(self.name, "simulated failure"));
            }
        }
        if !self.produces {
            return Ok(StepOutput::new().with_command(format!("{} --check", self.name)));
        }

        let out = invocation
            .output_dir
            .join(format!("{}.{}.vcf", stem(invocation.input), self.name));
        let mut text = fs::read_to_string(invocation.input).map_err(|e| JobError::io(invocation.input, e))?;
        text.push_str(self.name);
        for interval in invocation.intervals {
            text.push_str(&format!(" {interval}"));
        }
        text.push('\n');
        fs::create_dir_all(invocation.output_dir).map_err(|e| JobError::io(invocation.output_dir, e))?;
        fs::write(&out, text).map_err(|e| JobError::io(&out, e))?;
        Ok(StepOutput::new()
            .with_output(&out, "Output VCF")
            .with_command(format!("{} {}", self.name, invocation.input.display())))
    }
}

fn stem(path: &Path) -> String {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    name.strip_suffix(".vcf").unwrap_or(&name).to_string()
}
