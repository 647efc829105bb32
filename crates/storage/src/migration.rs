// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Schema migrations for versioned JSON documents.
//!
//! Documents carry their schema version in a top-level `v` field. Documents
//! without one predate versioning and are treated as version 1.

use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MigrationError {
    #[error("document version {0} is newer than supported version {1}")]
    TooNew(u32, u32),
    #[error("no migration path from version {0} to {1}")]
    NoPath(u32, u32),
    #[error("migration from version {0} failed: {1}")]
    Failed(u32, String),
}

/// One step between adjacent schema versions.
pub trait Migration: Send + Sync {
    fn source_version(&self) -> u32;
    fn target_version(&self) -> u32;
    fn migrate(&self, document: &mut Value) -> Result<(), MigrationError>;
}

#[derive(Default)]
pub struct MigrationRegistry {
    pub(crate) migrations: Vec<Box<dyn Migration>>,
}

impl MigrationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, migration: Box<dyn Migration>) {
        self.migrations.push(migration);
    }

    /// Apply migrations until the document reaches `target`.
    pub fn migrate_to(&self, mut document: Value, target: u32) -> Result<Value, MigrationError> {
        let mut version = document_version(&document);
        if version > target {
            return Err(MigrationError::TooNew(version, target));
        }
        while version < target {
            let step = self
                .migrations
                .iter()
                .find(|m| m.source_version() == version)
                .ok_or(MigrationError::NoPath(version, target))?;
            step.migrate(&mut document)?;
            version = step.target_version();
            if let Some(obj) = document.as_object_mut() {
                obj.insert("v".into(), version.into());
            }
            tracing::debug!(version, "migrated document");
        }
        Ok(document)
    }
}

pub(crate) fn document_version(document: &Value) -> u32 {
    document
        .get("v")
        .and_then(Value::as_u64)
        .and_then(|v| u32::try_from(v).ok())
        .unwrap_or(1)
}

#[cfg(test)]
#[path = "migration_tests.rs"]
mod tests;
