// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `sj scatter plan` specs.

use crate::prelude::*;
use crate::prelude::assert_eq;

const DICT: &str = "@HD\tVN:1.6\n\
@SQ\tSN:chr1\tLN:2500000\n\
@SQ\tSN:chr2\tLN:1200000\n\
@SQ\tSN:chrM\tLN:16569\n";

#[test]
fn contig_plan_has_one_job_per_contig() {
    let ws = Workspace::new();
    let dict = ws.file("ref.dict", DICT);
    let run = cli()
        .args(["-o", "json", "scatter", "plan", "--method", "contig"])
        .arg(&dict)
        .passes();
    assert_eq!(
        run.json(),
        json!({
            "chr1": [{ "contig": "chr1", "start": 1, "end": 2500000 }],
            "chr2": [{ "contig": "chr2", "start": 1, "end": 1200000 }],
            "chrM": [{ "contig": "chrM", "start": 1, "end": 16569 }],
        })
    );
}

#[test]
fn chunked_plan_splits_large_contigs() {
    let ws = Workspace::new();
    let dict = ws.file("ref.dict", DICT);
    cli()
        .args(["scatter", "plan", "--method", "chunked", "--bases-per-job", "1"])
        .arg(&dict)
        .passes()
        .stdout_has("Job1\t1000000\tchr1:1-1000000")
        .stdout_has("job(s)");
}

#[test]
fn chunked_plan_requires_bases_per_job() {
    let ws = Workspace::new();
    let dict = ws.file("ref.dict", DICT);
    cli()
        .args(["scatter", "plan", "--method", "chunked"])
        .arg(&dict)
        .fails()
        .stderr_has("scatterGather.basesPerJob");
}

#[test]
fn fixed_jobs_plan_has_requested_count() {
    let ws = Workspace::new();
    let dict = ws.file("ref.dict", DICT);
    let run = cli()
        .args(["-o", "json", "scatter", "plan", "--method", "fixed-jobs", "--jobs", "3"])
        .arg(&dict)
        .passes();
    assert_eq!(run.json().as_object().map(|o| o.len()), Some(3));
}

#[test]
fn write_persists_interval_map() {
    let ws = Workspace::new();
    let dict = ws.file("ref.dict", DICT);
    cli()
        .args(["scatter", "plan", "--write", &ws.arg("run")])
        .arg(&dict)
        .passes();
    let text = std::fs::read_to_string(ws.path().join("run/jobsToInterval.txt")).unwrap();
    assert!(text.contains("chrM\tchrM\t1\t16569"), "{text}");
}

#[test]
fn zero_jobs_is_rejected() {
    let ws = Workspace::new();
    let dict = ws.file("ref.dict", DICT);
    let run = cli()
        .args(["scatter", "plan", "--method", "fixed-jobs", "--jobs", "0"])
        .arg(&dict)
        .fails();
    assert_eq!(run.code, Some(2));
    run.stderr_has("--jobs");
}
