// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `sj deferred` specs.

use crate::prelude::*;
use crate::prelude::assert_eq;

fn workspace_with_log() -> Workspace {
    let ws = Workspace::new();
    ws.file(".work/tmp.bam", "scratch");
    ws.file("sorted.bam", "permanent");
    ws.file(
        "toDelete.txt",
        "delete\t2026-01-30T08:14:09Z\ttmp.bam\nsorted.bam\ndelete\t2026-01-30T08:15:00Z\tgone.bam\n",
    );
    ws
}

#[test]
fn show_lists_queued_files() {
    let ws = workspace_with_log();
    cli()
        .args(["deferred", "show", &ws.arg("")])
        .passes()
        .stdout_has("2026-01-30T08:14:09Z  tmp.bam")
        .stdout_has("-  sorted.bam")
        .stdout_has("3 file(s) queued");
}

#[test]
fn show_without_log_says_so() {
    let ws = Workspace::new();
    cli()
        .args(["deferred", "show", &ws.arg("")])
        .passes()
        .stdout_has("No deferred deletes");
}

#[test]
fn dry_run_purge_deletes_nothing() {
    let ws = workspace_with_log();
    let run = cli()
        .args(["-o", "json", "deferred", "purge", "--dry-run", &ws.arg("")])
        .passes();
    let report = run.json();
    assert_eq!(report["dry_run"], json!(true));
    assert_eq!(report["deleted"].as_array().map(Vec::len), Some(2));
    assert_eq!(report["missing"], json!(["gone.bam"]));
    assert!(ws.path().join(".work/tmp.bam").exists());
    assert!(ws.path().join("toDelete.txt").exists());
}

#[test]
fn purge_deletes_files_and_log() {
    let ws = workspace_with_log();
    cli()
        .args(["deferred", "purge", &ws.arg("")])
        .passes()
        .stdout_has("2 file(s) deleted, 1 already gone");
    assert!(!ws.path().join(".work/tmp.bam").exists());
    assert!(!ws.path().join("sorted.bam").exists());
    assert!(!ws.path().join("toDelete.txt").exists());
}

#[test]
fn purge_resolves_against_custom_work_dir() {
    let ws = Workspace::new();
    ws.file("elsewhere/tmp.bam", "scratch");
    ws.file("analysis/toDelete.txt", "tmp.bam\n");
    cli()
        .args([
            "deferred",
            "purge",
            "--work-dir",
            &ws.arg("elsewhere"),
            &ws.arg("analysis"),
        ])
        .passes();
    assert!(!ws.path().join("elsewhere/tmp.bam").exists());
}
