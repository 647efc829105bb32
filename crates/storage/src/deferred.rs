// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Durable log of files whose deletion is postponed past the task that
//! produced them.
//!
//! Each line is `delete\t<recordedAt>\t<path>`. Lines holding only a path
//! are accepted as entries without a timestamp.

use chrono::{DateTime, Utc};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const DEFERRED_LOG_NAME: &str = "toDelete.txt";

#[derive(Debug, Error)]
pub enum DeferredLogError {
    #[error("deferred-delete log I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("deferred-delete log {}: line {line} has unknown action '{action}'", path.display())]
    UnknownAction {
        path: PathBuf,
        line: usize,
        action: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeferredEntry {
    /// Path as logged: relative to the working root, or absolute.
    pub path: String,
    pub recorded_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub struct DeferredDeleteLog {
    path: PathBuf,
}

impl DeferredDeleteLog {
    /// The log kept in a permanent analysis directory.
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            path: dir.join(DEFERRED_LOG_NAME),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    pub fn append(&self, file: &str, recorded_at: DateTime<Utc>) -> Result<(), DeferredLogError> {
        self.write_line(file, recorded_at)
            .map_err(|source| DeferredLogError::Io {
                path: self.path.clone(),
                source,
            })
    }

    fn write_line(&self, file: &str, recorded_at: DateTime<Utc>) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut out = OpenOptions::new().create(true).append(true).open(&self.path)?;
        writeln!(out, "delete\t{}\t{}", recorded_at.to_rfc3339(), file)?;
        out.sync_all()
    }

    /// Entries in log order, first occurrence of each path kept. A missing
    /// log reads as empty.
    pub fn read(&self) -> Result<Vec<DeferredEntry>, DeferredLogError> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => {
                return Err(DeferredLogError::Io {
                    path: self.path.clone(),
                    source,
                })
            }
        };

        let mut entries: Vec<DeferredEntry> = Vec::new();
        for (idx, line) in text.lines().enumerate() {
            let line = line.trim_end_matches('\r');
            if line.trim().is_empty() {
                continue;
            }
            let entry = match line.splitn(3, '\t').collect::<Vec<_>>()[..] {
                [action, at, path] => {
                    if action != "delete" {
                        return Err(DeferredLogError::UnknownAction {
                            path: self.path.clone(),
                            line: idx + 1,
                            action: action.to_string(),
                        });
                    }
                    DeferredEntry {
                        path: path.to_string(),
                        recorded_at: DateTime::parse_from_rfc3339(at)
                            .ok()
                            .map(|t| t.with_timezone(&Utc)),
                    }
                }
                _ => DeferredEntry {
                    path: line.trim().to_string(),
                    recorded_at: None,
                },
            };
            if !entries.iter().any(|e| e.path == entry.path) {
                entries.push(entry);
            }
        }
        Ok(entries)
    }

    /// Delete the log. Returns false if it did not exist.
    pub fn remove(&self) -> Result<bool, DeferredLogError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(source) => Err(DeferredLogError::Io {
                path: self.path.clone(),
                source,
            }),
        }
    }
}

#[cfg(test)]
#[path = "deferred_tests.rs"]
mod tests;
