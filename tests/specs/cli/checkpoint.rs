// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `sj checkpoint` specs.

use crate::prelude::*;
use crate::prelude::assert_eq;

const CHECKPOINT: &str = r#"{
  "v": 1,
  "task": "processVariantsCheckpoint.json",
  "recordedActions": [
    {
      "name": "filter",
      "inputs": [{ "uri": "/in.vcf", "role": "Input" }],
      "outputs": [{ "uri": "/scratch/in.filter.vcf", "role": "Output VCF" }]
    }
  ],
  "stepOutputs": { "1<>/in.vcf": "/scratch/in.filter.vcf" }
}"#;

#[test]
fn show_summarizes_checkpoint() {
    let ws = Workspace::new();
    let file = ws.file("cp.json", CHECKPOINT);
    cli()
        .args(["checkpoint", "show"])
        .arg(&file)
        .passes()
        .stdout_has("Task:    processVariantsCheckpoint.json")
        .stdout_has("filter: 1 in, 1 out")
        .stdout_has("1<>/in.vcf -> /scratch/in.filter.vcf");
}

#[test]
fn show_json_round_trips_step_outputs() {
    let ws = Workspace::new();
    let file = ws.file("cp.json", CHECKPOINT);
    let run = cli()
        .args(["-o", "json", "checkpoint", "show"])
        .arg(&file)
        .passes();
    assert_eq!(
        run.json()["stepOutputs"],
        json!({ "1<>/in.vcf": "/scratch/in.filter.vcf" })
    );
}

#[test]
fn legacy_final_vcfs_key_is_accepted() {
    let ws = Workspace::new();
    let file = ws.file(
        "cp.json",
        r#"{ "recordedActions": [], "finalVcfs": { "1<>/a.vcf": "/b.vcf" } }"#,
    );
    cli()
        .args(["checkpoint", "show"])
        .arg(&file)
        .passes()
        .stdout_has("1<>/a.vcf -> /b.vcf");
}

#[test]
fn validate_accepts_readable_checkpoint() {
    let ws = Workspace::new();
    let file = ws.file("cp.json", CHECKPOINT);
    cli()
        .args(["checkpoint", "validate"])
        .arg(&file)
        .passes()
        .stdout_has("ok:");
}

#[test]
fn validate_rejects_checkpoint_without_actions() {
    let ws = Workspace::new();
    let file = ws.file("cp.json", r#"{ "v": 1, "stepOutputs": {} }"#);
    let run = cli().args(["checkpoint", "validate"]).arg(&file).fails();
    assert_eq!(run.code, Some(1));
    run.stderr_has("invalid checkpoint");
}

#[test]
fn validate_json_reports_error() {
    let ws = Workspace::new();
    let file = ws.file("cp.json", "not json");
    let run = cli()
        .args(["--format", "json", "checkpoint", "validate"])
        .arg(&file)
        .fails();
    assert_eq!(run.json()["valid"], json!(false));
}
