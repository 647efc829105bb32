// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use serde_json::json;

#[test]
fn same_version_is_noop() {
    let doc = json!({"v": 1, "recordedActions": []});
    let registry = MigrationRegistry::new();
    assert_eq!(registry.migrate_to(doc.clone(), 1).unwrap(), doc);
}

#[test]
fn unversioned_document_is_version_one() {
    let doc = json!({"recordedActions": []});
    assert_eq!(document_version(&doc), 1);
    assert!(MigrationRegistry::new().migrate_to(doc, 1).is_ok());
}

#[test]
fn too_new_error() {
    let doc = json!({"v": 99});
    let registry = MigrationRegistry::new();
    assert!(matches!(
        registry.migrate_to(doc, 1),
        Err(MigrationError::TooNew(99, 1))
    ));
}

#[test]
fn no_path_error() {
    let doc = json!({"v": 1});
    let registry = MigrationRegistry::new();
    assert!(matches!(
        registry.migrate_to(doc, 2),
        Err(MigrationError::NoPath(1, 2))
    ));
}

/// Renames the legacy `finalVcfs` map.
struct RenameStepMap;

impl Migration for RenameStepMap {
    fn source_version(&self) -> u32 {
        1
    }
    fn target_version(&self) -> u32 {
        2
    }
    fn migrate(&self, document: &mut Value) -> Result<(), MigrationError> {
        let obj = document
            .as_object_mut()
            .ok_or_else(|| MigrationError::Failed(1, "not an object".into()))?;
        if let Some(map) = obj.remove("finalVcfs") {
            obj.insert("stepOutputs".into(), map);
        }
        Ok(())
    }
}

#[test]
fn registered_migration_runs_and_bumps_version() {
    let mut registry = MigrationRegistry::new();
    registry.register(Box::new(RenameStepMap));

    let doc = json!({"v": 1, "finalVcfs": {"1<>in.vcf": "/w/step1.vcf"}});
    let out = registry.migrate_to(doc, 2).unwrap();

    assert_eq!(out["v"], 2);
    assert_eq!(out["stepOutputs"]["1<>in.vcf"], "/w/step1.vcf");
    assert!(out.get("finalVcfs").is_none());
}

#[test]
fn failing_migration_propagates() {
    let mut registry = MigrationRegistry::new();
    registry.register(Box::new(RenameStepMap));
    assert!(matches!(
        registry.migrate_to(json!([1]), 2),
        Err(MigrationError::Failed(1, _))
    ));
}
