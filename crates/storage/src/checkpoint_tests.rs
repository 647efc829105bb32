// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use proptest::prelude::*;
use sj_core::test_support::strategies::arb_recorded_action;
use sj_core::{Clock, Direction, FakeClock};

fn sample_checkpoint() -> Checkpoint {
    let clock = FakeClock::new();
    let mut ledger = FileLedger::new();
    let action = ledger.start_action("Step 1", &clock);
    ledger
        .register(action, "step1.vcf", Path::new("/w/step1.vcf"), "Output VCF", Direction::Output, false)
        .unwrap();
    ledger.finish_action(action, &clock).unwrap();

    let mut checkpoint = Checkpoint {
        task: Some("processVariants".into()),
        recorded_actions: Some(ledger.finished_actions().into_iter().cloned().collect()),
        file_manager: Some(ledger),
        saved_at: Some(clock.utc_now()),
        ..Checkpoint::default()
    };
    checkpoint
        .step_outputs
        .insert("1<>/data/in.vcf".into(), PathBuf::from("/w/step1.vcf"));
    checkpoint
        .copied_inputs
        .insert(PathBuf::from("/data/in.vcf"), PathBuf::from("/w/in.vcf"));
    checkpoint
        .task_state
        .insert("genotyped".into(), Value::Bool(true));
    checkpoint
}

#[test]
fn write_then_read_round_trips() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("processVariantsCheckpoint.json");
    let checkpoint = sample_checkpoint();

    checkpoint.write(&path).unwrap();
    let back = Checkpoint::read(&path).unwrap();
    assert_eq!(back, checkpoint);
}

#[test]
fn reserializing_untouched_checkpoint_is_stable() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cp.json");
    sample_checkpoint().write(&path).unwrap();
    let first = fs::read_to_string(&path).unwrap();

    Checkpoint::read(&path).unwrap().write(&path).unwrap();
    let second = fs::read_to_string(&path).unwrap();
    assert_eq!(first, second);
}

#[test]
fn wire_format_uses_expected_keys() {
    let value = serde_json::to_value(sample_checkpoint()).unwrap();
    assert_eq!(value["v"], 1);
    assert_eq!(value["isResume"], false);
    assert_eq!(value["recordedActions"][0]["name"], "Step 1");
    assert_eq!(value["stepOutputs"]["1<>/data/in.vcf"], "/w/step1.vcf");
    assert_eq!(value["copiedInputs"]["/data/in.vcf"], "/w/in.vcf");
    assert_eq!(value["taskState"]["genotyped"], true);
}

#[test]
fn legacy_document_is_accepted() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cp.json");
    fs::write(
        &path,
        r#"{
            "recordedActions": [{"name": "Step 1", "inputs": [{"uri": "/in.vcf", "role": "Input VCF"}]}],
            "isResume": false,
            "finalVcfs": {"1<>in.vcf": "step1.vcf"},
            "copiedInputs": {},
            "somethingElse": 7
        }"#,
    )
    .unwrap();

    let checkpoint = Checkpoint::read(&path).unwrap();
    assert_eq!(checkpoint.version, 1);
    assert_eq!(
        checkpoint.step_outputs.get("1<>in.vcf"),
        Some(&PathBuf::from("step1.vcf"))
    );
    assert_eq!(checkpoint.actions()[0].inputs[0].role, "Input VCF");
    assert!(checkpoint.file_manager.is_none());
}

#[test]
fn missing_actions_is_corruption() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cp.json");
    fs::write(&path, r#"{"isResume": true, "recordedActions": null}"#).unwrap();
    assert!(matches!(
        Checkpoint::read(&path),
        Err(CheckpointError::MissingActions { .. })
    ));
}

#[test]
fn corrupt_json_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cp.json");
    fs::write(&path, "{\"recordedActions\": [").unwrap();
    assert!(matches!(
        Checkpoint::read(&path),
        Err(CheckpointError::Json { .. })
    ));
}

#[test]
fn newer_schema_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cp.json");
    fs::write(&path, r#"{"v": 7, "recordedActions": []}"#).unwrap();
    assert!(matches!(
        Checkpoint::read(&path),
        Err(CheckpointError::Migration(MigrationError::TooNew(7, 1)))
    ));
}

#[test]
fn write_failure_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let blocker = dir.path().join("not-a-dir");
    fs::write(&blocker, "x").unwrap();
    let err = sample_checkpoint()
        .write(&blocker.join("cp.json"))
        .unwrap_err();
    assert!(matches!(err, CheckpointError::Io { .. }));
}

#[test]
fn remove_reports_whether_file_existed() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cp.json");
    sample_checkpoint().write(&path).unwrap();
    assert!(Checkpoint::remove(&path).unwrap());
    assert!(!Checkpoint::remove(&path).unwrap());
}

proptest! {
    #[test]
    fn actions_and_step_index_round_trip(
        actions in proptest::collection::vec(arb_recorded_action(), 0..5),
        steps in proptest::collection::btree_map(
            (1u32..6, "[a-z]{1,8}\\.vcf").prop_map(|(n, f)| format!("{n}<>{f}")),
            "[a-z]{1,8}\\.vcf",
            0..6,
        ),
    ) {
        let checkpoint = Checkpoint {
            recorded_actions: Some(actions.clone()),
            step_outputs: steps.iter().map(|(k, v)| (k.clone(), PathBuf::from(v))).collect(),
            ..Checkpoint::default()
        };
        let json = serde_json::to_string(&checkpoint).unwrap();
        let back = Checkpoint::parse(&json, Path::new("mem")).unwrap();

        prop_assert_eq!(back.actions(), &actions[..]);
        prop_assert_eq!(&back.step_outputs, &checkpoint.step_outputs);
    }
}
