// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Output descriptors exchanged between steps, tasks, and the owning job.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// An output file to be registered with the job once its task completes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SequenceOutput {
    pub name: String,
    pub category: String,
    pub file: PathBuf,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub readset: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub genome: Option<i64>,
}

impl SequenceOutput {
    pub fn new(
        name: impl Into<String>,
        category: impl Into<String>,
        file: impl Into<PathBuf>,
    ) -> Self {
        Self {
            name: name.into(),
            category: category.into(),
            file: file.into(),
            description: None,
            readset: None,
            genome: None,
        }
    }

    crate::setters! {
        option {
            description: String,
            readset: i64,
            genome: i64,
        }
    }
}

/// Everything a step reports back after running.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StepOutput {
    pub inputs: Vec<(PathBuf, String)>,
    pub outputs: Vec<(PathBuf, String)>,
    pub intermediate_files: Vec<PathBuf>,
    pub deferred_delete_files: Vec<PathBuf>,
    pub sequence_outputs: Vec<SequenceOutput>,
    pub commands: Vec<String>,
}

impl StepOutput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_input(mut self, file: impl Into<PathBuf>, role: impl Into<String>) -> Self {
        self.inputs.push((file.into(), role.into()));
        self
    }

    pub fn with_output(mut self, file: impl Into<PathBuf>, role: impl Into<String>) -> Self {
        self.outputs.push((file.into(), role.into()));
        self
    }

    pub fn with_intermediate(mut self, file: impl Into<PathBuf>) -> Self {
        self.intermediate_files.push(file.into());
        self
    }

    pub fn with_deferred_delete(mut self, file: impl Into<PathBuf>) -> Self {
        self.deferred_delete_files.push(file.into());
        self
    }

    pub fn with_sequence_output(mut self, output: SequenceOutput) -> Self {
        self.sequence_outputs.push(output);
        self
    }

    pub fn with_command(mut self, command: impl Into<String>) -> Self {
        self.commands.push(command.into());
        self
    }

    /// The first declared output, which step chains feed to the next step.
    pub fn primary_output(&self) -> Option<&Path> {
        self.outputs.first().map(|(file, _)| file.as_path())
    }
}
