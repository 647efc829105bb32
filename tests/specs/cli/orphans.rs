// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `sj orphans` specs.

use crate::prelude::*;
use crate::prelude::assert_eq;

#[test]
fn clean_directory_passes() {
    let ws = Workspace::new();
    ws.file("a.bam", "data");
    ws.file("a.bam.bai", "index");
    cli()
        .args(["orphans", &ws.arg("")])
        .passes()
        .stdout_has("2 file(s) scanned, 0 orphan index(es), 0 unknown");
}

#[test]
fn orphan_index_fails_with_report() {
    let ws = Workspace::new();
    ws.file("calls.vcf.gz.tbi", "index");
    let run = cli().args(["-o", "json", "orphans", &ws.arg("")]).fails();
    assert_eq!(run.code, Some(1));
    assert_eq!(
        run.json()["orphan_indexes"],
        json!([ws.arg("calls.vcf.gz.tbi")])
    );
}

#[test]
fn known_files_limit_unknown_report() {
    let ws = Workspace::new();
    let kept = ws.file("out.vcf", "v");
    ws.file("stray.txt", "?");
    cli()
        .args(["orphans", &ws.arg("")])
        .arg("--known")
        .arg(&kept)
        .fails()
        .stdout_has("unknown file:")
        .stdout_has("stray.txt");
}
