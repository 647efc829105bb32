// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Recorded actions: the provenance record of one unit of work.

use crate::clock::Clock;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Position of an action in its task's action table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActionId(pub usize);

impl std::fmt::Display for ActionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A file consumed by an action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionInput {
    pub uri: PathBuf,
    pub role: String,
}

/// A file produced by an action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionOutput {
    pub uri: PathBuf,
    pub role: String,
    #[serde(default)]
    pub is_transient: bool,
}

/// One logical unit of work with its declared inputs and outputs.
///
/// Inputs and outputs are ordered and only ever appended to. The single
/// exception is [`RecordedAction::update_for_moved_file`], which rewrites a
/// path in place when the file it names is relocated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordedAction {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub inputs: Vec<ActionInput>,
    #[serde(default)]
    pub outputs: Vec<ActionOutput>,
    /// Command lines executed for this unit of work.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub commands: Vec<String>,
}

impl RecordedAction {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            start_time: None,
            end_time: None,
            inputs: Vec::new(),
            outputs: Vec::new(),
            commands: Vec::new(),
        }
    }

    /// Create an action stamped with the clock's current time.
    pub fn started(name: impl Into<String>, clock: &dyn Clock) -> Self {
        let mut action = Self::new(name);
        action.start_time = Some(clock.utc_now());
        action
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Stamp the end time. Later calls keep the first stamp.
    pub fn finish(&mut self, clock: &dyn Clock) {
        if self.end_time.is_none() {
            self.end_time = Some(clock.utc_now());
        }
    }

    pub fn is_finished(&self) -> bool {
        self.end_time.is_some()
    }

    pub fn duration(&self) -> Option<chrono::Duration> {
        Some(self.end_time? - self.start_time?)
    }

    /// Add an input unless this path is already an input. Returns true if added.
    pub fn add_input(&mut self, uri: impl Into<PathBuf>, role: impl Into<String>) -> bool {
        let uri = uri.into();
        if self.has_input(&uri) {
            return false;
        }
        self.inputs.push(ActionInput {
            uri,
            role: role.into(),
        });
        true
    }

    /// Add an output unless this path is already an output. Returns true if added.
    pub fn add_output(
        &mut self,
        uri: impl Into<PathBuf>,
        role: impl Into<String>,
        is_transient: bool,
    ) -> bool {
        let uri = uri.into();
        if self.has_output(&uri) {
            return false;
        }
        self.outputs.push(ActionOutput {
            uri,
            role: role.into(),
            is_transient,
        });
        true
    }

    pub fn has_input(&self, uri: &Path) -> bool {
        self.inputs.iter().any(|i| i.uri == uri)
    }

    pub fn has_output(&self, uri: &Path) -> bool {
        self.outputs.iter().any(|o| o.uri == uri)
    }

    pub fn add_command(&mut self, command: impl Into<String>) {
        self.commands.push(command.into());
    }

    /// Flag an output as transient. Returns true if the output exists.
    pub fn mark_output_transient(&mut self, uri: &Path) -> bool {
        let mut found = false;
        for output in self.outputs.iter_mut().filter(|o| o.uri == uri) {
            output.is_transient = true;
            found = true;
        }
        found
    }

    /// Rewrite every input and output naming `from` to name `to`.
    ///
    /// Returns true if any reference changed.
    pub fn update_for_moved_file(&mut self, from: &Path, to: &Path) -> bool {
        if from == to {
            return false;
        }
        let mut changed = false;
        for input in self.inputs.iter_mut().filter(|i| i.uri == from) {
            input.uri = to.to_path_buf();
            changed = true;
        }
        for output in self.outputs.iter_mut().filter(|o| o.uri == from) {
            output.uri = to.to_path_buf();
            changed = true;
        }
        changed
    }
}

#[cfg(test)]
#[path = "action_tests.rs"]
mod tests;
