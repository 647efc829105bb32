// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Task checkpoint documents.
//!
//! A checkpoint is the durable record of what a task has already done. It
//! lives in the job's permanent analysis directory, is overwritten after
//! every unit of progress, and is deleted once the task completes.

use crate::atomic::write_atomic;
use crate::migration::{MigrationError, MigrationRegistry};
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sj_core::{FileLedger, RecordedAction};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Current checkpoint schema version
pub const CURRENT_CHECKPOINT_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum CheckpointError {
    #[error("checkpoint I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("corrupt checkpoint {}: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("checkpoint migration error: {0}")]
    Migration(#[from] MigrationError),
    #[error("checkpoint {} was read, but has no saved actions", path.display())]
    MissingActions { path: PathBuf },
}

fn legacy_version() -> u32 {
    1
}

/// Durable progress of one task invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Checkpoint {
    #[serde(rename = "v", default = "legacy_version")]
    pub version: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task: Option<String>,
    /// Completed actions in completion order. Absent means corrupt.
    #[serde(default)]
    pub recorded_actions: Option<Vec<RecordedAction>>,
    #[serde(default)]
    pub is_resume: bool,
    /// Step-completion index: `"{ordinal}<>{input}"` to the step's output.
    #[serde(default, alias = "finalVcfs")]
    pub step_outputs: IndexMap<String, PathBuf>,
    /// Original input path to its staged copy.
    #[serde(default)]
    pub copied_inputs: IndexMap<PathBuf, PathBuf>,
    /// Scratch path to permanent path for files an earlier cleanup moved.
    #[serde(default)]
    pub files_copied_locally: Vec<(PathBuf, PathBuf)>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_manager: Option<FileLedger>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub task_state: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub saved_at: Option<DateTime<Utc>>,
}

impl Default for Checkpoint {
    fn default() -> Self {
        Self {
            version: CURRENT_CHECKPOINT_VERSION,
            task: None,
            recorded_actions: Some(Vec::new()),
            is_resume: false,
            step_outputs: IndexMap::new(),
            copied_inputs: IndexMap::new(),
            files_copied_locally: Vec::new(),
            file_manager: None,
            task_state: Map::new(),
            saved_at: None,
        }
    }
}

impl Checkpoint {
    /// Read, migrate, and validate a checkpoint file.
    pub fn read(path: &Path) -> Result<Self, CheckpointError> {
        let text = fs::read_to_string(path).map_err(|source| CheckpointError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text, path)
    }

    fn parse(text: &str, path: &Path) -> Result<Self, CheckpointError> {
        let json_err = |source| CheckpointError::Json {
            path: path.to_path_buf(),
            source,
        };
        let value: Value = serde_json::from_str(text).map_err(json_err)?;
        let value = MigrationRegistry::new().migrate_to(value, CURRENT_CHECKPOINT_VERSION)?;
        let checkpoint: Checkpoint = serde_json::from_value(value).map_err(json_err)?;
        if checkpoint.recorded_actions.is_none() {
            return Err(CheckpointError::MissingActions {
                path: path.to_path_buf(),
            });
        }
        Ok(checkpoint)
    }

    /// Atomically replace the checkpoint file.
    pub fn write(&self, path: &Path) -> Result<(), CheckpointError> {
        let bytes = serde_json::to_vec_pretty(self).map_err(|source| CheckpointError::Json {
            path: path.to_path_buf(),
            source,
        })?;
        write_atomic(path, &bytes).map_err(|source| CheckpointError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::debug!(path = %path.display(), "checkpoint written");
        Ok(())
    }

    /// Delete a checkpoint file. Returns false if it did not exist.
    pub fn remove(path: &Path) -> Result<bool, CheckpointError> {
        match fs::remove_file(path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(source) => Err(CheckpointError::Io {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    pub fn actions(&self) -> &[RecordedAction] {
        self.recorded_actions.as_deref().unwrap_or_default()
    }
}

#[cfg(test)]
#[path = "checkpoint_tests.rs"]
mod tests;
