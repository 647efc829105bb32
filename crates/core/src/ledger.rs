// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory file bookkeeping for one task.
//!
//! Every file a task registers gets one row in an arena. A row keeps the
//! file's original path, its current path, and every relative-path key it
//! has been known by, so relocating a file updates one row instead of
//! chasing path strings through several maps. The ledger also owns the
//! task's action table; rows point into it by [`ActionId`].

use crate::action::{ActionId, RecordedAction};
use crate::clock::Clock;
use crate::output::SequenceOutput;
use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Row index into the ledger's file arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FileId(pub usize);

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LedgerError {
    #[error("unknown action {0}")]
    UnknownAction(ActionId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Input,
    Output,
}

/// One action's claim on a tracked file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileUse {
    pub action: ActionId,
    pub role: String,
    pub direction: Direction,
    #[serde(default)]
    pub transient: bool,
}

/// Result of registering a file against an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Registration {
    Added(FileId),
    /// The action already claimed this file in the same direction.
    Duplicate(FileId),
}

impl Registration {
    pub fn file(&self) -> FileId {
        match self {
            Registration::Added(id) | Registration::Duplicate(id) => *id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackedFile {
    original: PathBuf,
    current: PathBuf,
    /// Relative-path keys, oldest first.
    keys: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    superseded: Vec<PathBuf>,
    #[serde(default)]
    uses: Vec<FileUse>,
    #[serde(skip)]
    attributed: bool,
}

impl TrackedFile {
    fn new(key: &str, path: &Path) -> Self {
        Self {
            original: path.to_path_buf(),
            current: path.to_path_buf(),
            keys: vec![key.to_string()],
            superseded: Vec::new(),
            uses: Vec::new(),
            attributed: false,
        }
    }

    pub fn original(&self) -> &Path {
        &self.original
    }

    pub fn current(&self) -> &Path {
        &self.current
    }

    pub fn current_key(&self) -> &str {
        self.keys.last().map(String::as_str).unwrap_or_default()
    }

    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    pub fn uses(&self) -> &[FileUse] {
        &self.uses
    }

    pub fn is_output(&self) -> bool {
        self.uses.iter().any(|u| u.direction == Direction::Output)
    }

    pub fn is_attributed(&self) -> bool {
        self.attributed
    }

    fn knows_key(&self, key: &str) -> bool {
        self.keys.iter().any(|k| k == key)
    }

    fn knows_path(&self, path: &Path) -> bool {
        self.current.as_path() == path
            || self.original.as_path() == path
            || self.superseded.iter().any(|p| p.as_path() == path)
    }

    fn relocate(&mut self, to: &Path, key: &str) {
        if self.current.as_path() != to {
            let previous = std::mem::replace(&mut self.current, to.to_path_buf());
            if !self.superseded.contains(&previous) {
                self.superseded.push(previous);
            }
        }
        if self.current_key() != key {
            self.keys.retain(|k| k != key);
            self.keys.push(key.to_string());
        }
    }
}

/// Actions, tracked files, and cleanup sets for one task.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileLedger {
    #[serde(default)]
    actions: Vec<RecordedAction>,
    #[serde(default)]
    finished: Vec<ActionId>,
    #[serde(default)]
    files: Vec<TrackedFile>,
    #[serde(default)]
    intermediate_files: IndexSet<PathBuf>,
    #[serde(default)]
    outputs_to_create: Vec<SequenceOutput>,
    #[serde(default)]
    final_outputs: IndexSet<PathBuf>,
    /// Compressed input to its decompressed copy.
    #[serde(default)]
    unzipped: IndexMap<PathBuf, PathBuf>,
}

impl FileLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a ledger from already-finished actions.
    pub fn from_finished(actions: Vec<RecordedAction>) -> Self {
        let finished = (0..actions.len()).map(ActionId).collect();
        Self {
            actions,
            finished,
            ..Self::default()
        }
    }

    // -- actions --

    pub fn start_action(&mut self, name: impl Into<String>, clock: &dyn Clock) -> ActionId {
        self.push_action(RecordedAction::started(name, clock))
    }

    pub fn push_action(&mut self, action: RecordedAction) -> ActionId {
        self.actions.push(action);
        ActionId(self.actions.len() - 1)
    }

    pub fn action(&self, id: ActionId) -> Option<&RecordedAction> {
        self.actions.get(id.0)
    }

    pub fn action_mut(&mut self, id: ActionId) -> Option<&mut RecordedAction> {
        self.actions.get_mut(id.0)
    }

    pub fn actions(&self) -> &[RecordedAction] {
        &self.actions
    }

    /// Freeze an action into the finished list. Returns true the first time.
    pub fn finish_action(&mut self, id: ActionId, clock: &dyn Clock) -> Result<bool, LedgerError> {
        let action = self
            .actions
            .get_mut(id.0)
            .ok_or(LedgerError::UnknownAction(id))?;
        action.finish(clock);
        if self.finished.contains(&id) {
            return Ok(false);
        }
        self.finished.push(id);
        Ok(true)
    }

    pub fn is_finished(&self, id: ActionId) -> bool {
        self.finished.contains(&id)
    }

    /// Ids of finished actions in completion order.
    pub fn finished(&self) -> &[ActionId] {
        &self.finished
    }

    pub fn finished_actions(&self) -> Vec<&RecordedAction> {
        self.finished
            .iter()
            .filter_map(|id| self.actions.get(id.0))
            .collect()
    }

    // -- files --

    /// Claim a file for an action under a relative-path key.
    ///
    /// Re-registering the same key for the same action and direction is a
    /// no-op reported as [`Registration::Duplicate`].
    pub fn register(
        &mut self,
        action: ActionId,
        key: &str,
        path: &Path,
        role: &str,
        direction: Direction,
        transient: bool,
    ) -> Result<Registration, LedgerError> {
        if action.0 >= self.actions.len() {
            return Err(LedgerError::UnknownAction(action));
        }
        let id = match self.find_by_key(key) {
            Some(id) => id,
            None => {
                self.files.push(TrackedFile::new(key, path));
                FileId(self.files.len() - 1)
            }
        };

        let Some(file) = self.files.get_mut(id.0) else {
            return Err(LedgerError::UnknownAction(action));
        };
        if file
            .uses
            .iter()
            .any(|u| u.action == action && u.direction == direction)
        {
            return Ok(Registration::Duplicate(id));
        }
        file.uses.push(FileUse {
            action,
            role: role.to_string(),
            direction,
            transient,
        });
        let uri = file.current.clone();

        if let Some(recorded) = self.actions.get_mut(action.0) {
            match direction {
                Direction::Input => recorded.add_input(uri, role),
                Direction::Output => recorded.add_output(uri, role, transient),
            };
        }
        Ok(Registration::Added(id))
    }

    pub fn file(&self, id: FileId) -> Option<&TrackedFile> {
        self.files.get(id.0)
    }

    pub fn files(&self) -> &[TrackedFile] {
        &self.files
    }

    /// Find a file by any key it has been known by, preferring current keys.
    pub fn find_by_key(&self, key: &str) -> Option<FileId> {
        self.files
            .iter()
            .position(|f| f.current_key() == key)
            .or_else(|| self.files.iter().position(|f| f.knows_key(key)))
            .map(FileId)
    }

    /// Find a file by any path it has occupied, preferring current paths.
    pub fn find_by_path(&self, path: &Path) -> Option<FileId> {
        self.files
            .iter()
            .position(|f| f.current.as_path() == path)
            .or_else(|| self.files.iter().position(|f| f.knows_path(path)))
            .map(FileId)
    }

    /// Where a file that once lived at `path` is now.
    pub fn current_path(&self, path: &Path) -> Option<&Path> {
        self.find_by_path(path)
            .and_then(|id| self.files.get(id.0))
            .map(|f| f.current.as_path())
    }

    /// Record that the file at `from` now lives at `to`.
    ///
    /// The tracked row gains the new key and path, and every action,
    /// intermediate entry, final output, and pending output naming the old
    /// path is rewritten. Applying a chain of swaps leaves everything
    /// pointing at the last path. Returns how many actions changed.
    pub fn swap(&mut self, from: &Path, from_key: &str, to: &Path, to_key: &str) -> usize {
        let mut previous = None;
        if let Some(id) = self.find_by_key(from_key).or_else(|| self.find_by_path(from)) {
            if let Some(file) = self.files.get_mut(id.0) {
                if file.current.as_path() != from {
                    previous = Some(file.current.clone());
                }
                file.relocate(to, to_key);
            }
        }

        let mut touched = 0;
        for action in &mut self.actions {
            let mut changed = action.update_for_moved_file(from, to);
            if let Some(prev) = &previous {
                changed |= action.update_for_moved_file(prev, to);
            }
            if changed {
                touched += 1;
            }
        }

        let stale: Vec<&Path> = std::iter::once(from).chain(previous.as_deref()).collect();
        for old in stale {
            replace_in_set(&mut self.intermediate_files, old, to);
            replace_in_set(&mut self.final_outputs, old, to);
            for output in &mut self.outputs_to_create {
                if output.file.as_path() == old {
                    output.file = to.to_path_buf();
                }
            }
            for plain in self.unzipped.values_mut() {
                if plain.as_path() == old {
                    *plain = to.to_path_buf();
                }
            }
        }
        touched
    }

    /// Attribute a reconciled file: find it by key and move it to `dest`.
    pub fn attribute(&mut self, key: &str, dest: &Path, dest_key: &str) -> Option<FileId> {
        let id = self.find_by_key(key)?;
        let from = self.files.get(id.0)?.current.clone();
        if from.as_path() != dest {
            self.swap(&from, key, dest, dest_key);
        }
        if let Some(file) = self.files.get_mut(id.0) {
            file.attributed = true;
        }
        Some(id)
    }

    pub fn reset_attribution(&mut self) {
        for file in &mut self.files {
            file.attributed = false;
        }
    }

    pub fn unattributed(&self) -> Vec<FileId> {
        self.files
            .iter()
            .enumerate()
            .filter(|(_, f)| !f.attributed)
            .map(|(i, _)| FileId(i))
            .collect()
    }

    /// Flag every output claim on a file as transient. Returns actions changed.
    pub fn mark_output_transient(&mut self, id: FileId) -> usize {
        let Some(file) = self.files.get_mut(id.0) else {
            return 0;
        };
        let current = file.current.clone();
        let mut owners = Vec::new();
        for claim in file
            .uses
            .iter_mut()
            .filter(|u| u.direction == Direction::Output)
        {
            claim.transient = true;
            owners.push(claim.action);
        }
        let mut changed = 0;
        for owner in owners {
            if let Some(action) = self.actions.get_mut(owner.0) {
                if action.mark_output_transient(&current) {
                    changed += 1;
                }
            }
        }
        changed
    }

    // -- cleanup sets --

    pub fn add_intermediate(&mut self, path: impl Into<PathBuf>) -> bool {
        self.intermediate_files.insert(path.into())
    }

    pub fn remove_intermediate(&mut self, path: &Path) -> bool {
        self.intermediate_files.shift_remove(path)
    }

    pub fn intermediate_files(&self) -> &IndexSet<PathBuf> {
        &self.intermediate_files
    }

    pub fn clear_intermediates(&mut self) {
        self.intermediate_files.clear();
    }

    /// Queue an output for the job. The file stops being intermediate.
    pub fn add_sequence_output(&mut self, output: SequenceOutput) {
        self.intermediate_files.shift_remove(&output.file);
        if !self.outputs_to_create.contains(&output) {
            self.outputs_to_create.push(output);
        }
    }

    pub fn outputs_to_create(&self) -> &[SequenceOutput] {
        &self.outputs_to_create
    }

    pub fn take_outputs_to_create(&mut self) -> Vec<SequenceOutput> {
        std::mem::take(&mut self.outputs_to_create)
    }

    pub fn add_final_output(&mut self, path: impl Into<PathBuf>) -> bool {
        self.final_outputs.insert(path.into())
    }

    pub fn is_final_output(&self, path: &Path) -> bool {
        self.final_outputs.contains(path)
    }

    pub fn final_outputs(&self) -> &IndexSet<PathBuf> {
        &self.final_outputs
    }

    pub fn record_unzipped(&mut self, compressed: impl Into<PathBuf>, plain: impl Into<PathBuf>) {
        self.unzipped.insert(compressed.into(), plain.into());
    }

    pub fn unzipped(&self) -> &IndexMap<PathBuf, PathBuf> {
        &self.unzipped
    }
}

fn replace_in_set(set: &mut IndexSet<PathBuf>, from: &Path, to: &Path) {
    if set.contains(from) {
        *set = set
            .drain(..)
            .map(|p| if p.as_path() == from { to.to_path_buf() } else { p })
            .collect();
    }
}

#[cfg(test)]
#[path = "ledger_tests.rs"]
mod tests;
