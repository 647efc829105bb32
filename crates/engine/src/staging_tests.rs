// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::error::JobError;
use tempfile::TempDir;
use yare::parameterized;

struct Dirs {
    _tmp: TempDir,
    scratch: PathBuf,
    permanent: PathBuf,
    external: PathBuf,
}

fn dirs() -> Dirs {
    let tmp = tempfile::tempdir().unwrap();
    let scratch = tmp.path().join("scratch");
    let permanent = tmp.path().join("analysis");
    let external = tmp.path().join("data");
    fs::create_dir_all(&external).unwrap();
    Dirs {
        _tmp: tmp,
        scratch,
        permanent,
        external,
    }
}

#[test]
fn create_makes_both_roots() {
    let d = dirs();
    let area = StagingArea::create(&d.scratch, &d.permanent, StagingMode::Copy).unwrap();
    assert!(area.scratch_root().is_dir());
    assert!(area.permanent_root().is_dir());
}

#[parameterized(
    in_scratch = { "scratch/sub/a.vcf", "sub/a.vcf" },
    in_permanent = { "analysis/b.vcf", "b.vcf" },
)]
fn relative_path_prefers_roots(rel: &str, expected: &str) {
    let d = dirs();
    let area = StagingArea::create(&d.scratch, &d.permanent, StagingMode::Copy).unwrap();
    let file = d.scratch.parent().unwrap().join(rel);
    assert_eq!(area.relative_path(&file), expected);
}

#[test]
fn relative_path_outside_roots_is_absolute() {
    let d = dirs();
    let area = StagingArea::create(&d.scratch, &d.permanent, StagingMode::Copy).unwrap();
    let file = d.external.join("c.vcf");
    assert_eq!(area.relative_path(&file), file.display().to_string());
}

#[parameterized(
    copy = { StagingMode::Copy },
    hard_link = { StagingMode::HardLink },
)]
fn stage_input_copies_into_scratch(mode: StagingMode) {
    let d = dirs();
    let input = d.external.join("in.vcf");
    fs::write(&input, "data").unwrap();
    let mut area = StagingArea::create(&d.scratch, &d.permanent, mode).unwrap();

    let staged = area.stage_input(&input).unwrap();
    assert_eq!(staged, d.scratch.join("in.vcf"));
    assert_eq!(fs::read_to_string(&staged).unwrap(), "data");
    assert!(input.exists());
    assert_eq!(area.staged_path(&input), Some(staged.as_path()));
}

#[test]
fn stage_input_is_idempotent() {
    let d = dirs();
    let input = d.external.join("in.vcf");
    fs::write(&input, "data").unwrap();
    let mut area = StagingArea::create(&d.scratch, &d.permanent, StagingMode::Copy).unwrap();

    let first = area.stage_input(&input).unwrap();
    fs::write(&first, "modified by task").unwrap();
    let second = area.stage_input(&input).unwrap();
    assert_eq!(first, second);
    assert_eq!(fs::read_to_string(&second).unwrap(), "modified by task");
    assert_eq!(area.staged_inputs().len(), 1);
}

#[test]
fn stage_input_in_place_returns_original() {
    let d = dirs();
    let input = d.external.join("in.vcf");
    fs::write(&input, "data").unwrap();
    let mut area = StagingArea::create(&d.scratch, &d.permanent, StagingMode::InPlace).unwrap();
    assert_eq!(area.stage_input(&input).unwrap(), input);
    assert!(fs::read_dir(&d.scratch).unwrap().next().is_none());
}

#[test]
fn stage_missing_input_is_fatal() {
    let d = dirs();
    let mut area = StagingArea::create(&d.scratch, &d.permanent, StagingMode::Copy).unwrap();
    let err = area.stage_input(&d.external.join("absent.vcf")).unwrap_err();
    assert!(matches!(err, StagingError::MissingInput(_)));
}

#[test]
fn same_file_name_from_two_directories_does_not_collide() {
    let d = dirs();
    fs::create_dir_all(d.external.join("a")).unwrap();
    fs::create_dir_all(d.external.join("b")).unwrap();
    fs::write(d.external.join("a/in.vcf"), "a").unwrap();
    fs::write(d.external.join("b/in.vcf"), "b").unwrap();
    let mut area = StagingArea::create(&d.scratch, &d.permanent, StagingMode::Copy).unwrap();

    let a = area.stage_input(&d.external.join("a/in.vcf")).unwrap();
    let b = area.stage_input(&d.external.join("b/in.vcf")).unwrap();
    assert_ne!(a, b);
    assert_eq!(fs::read_to_string(&a).unwrap(), "a");
    assert_eq!(fs::read_to_string(&b).unwrap(), "b");
}

#[test]
fn restage_reuses_existing_copy() {
    let d = dirs();
    let input = d.external.join("in.vcf");
    fs::write(&input, "orig").unwrap();
    fs::create_dir_all(&d.scratch).unwrap();
    let staged = d.scratch.join("in.vcf");
    fs::write(&staged, "staged").unwrap();
    let mut area = StagingArea::create(&d.scratch, &d.permanent, StagingMode::Copy).unwrap();

    assert_eq!(area.restage(&input, &staged).unwrap(), staged);
    assert_eq!(fs::read_to_string(&staged).unwrap(), "staged");
    assert_eq!(area.stage_input(&input).unwrap(), staged);
}

#[test]
fn restage_copies_again_when_staged_file_is_gone() {
    let d = dirs();
    let input = d.external.join("in.vcf");
    fs::write(&input, "orig").unwrap();
    let mut area = StagingArea::create(&d.scratch, &d.permanent, StagingMode::Copy).unwrap();
    let staged = d.scratch.join("in.vcf");

    area.restage(&input, &staged).unwrap();
    assert_eq!(fs::read_to_string(&staged).unwrap(), "orig");
}

#[test]
fn discard_respects_keep() {
    let d = dirs();
    fs::write(d.external.join("a.vcf"), "a").unwrap();
    fs::write(d.external.join("b.vcf"), "b").unwrap();
    let mut area = StagingArea::create(&d.scratch, &d.permanent, StagingMode::Copy).unwrap();
    let a = area.stage_input(&d.external.join("a.vcf")).unwrap();
    let b = area.stage_input(&d.external.join("b.vcf")).unwrap();

    let removed = area.discard_staged_inputs(|p| p == b.as_path()).unwrap();
    assert_eq!(removed, vec![a.clone()]);
    assert!(!a.exists());
    assert!(b.exists());
    assert_eq!(area.staged_inputs().len(), 1);
}

#[test]
fn reconcile_moves_files_and_reports_each() {
    let d = dirs();
    let mut area = StagingArea::create(&d.scratch, &d.permanent, StagingMode::Copy).unwrap();
    fs::create_dir_all(d.scratch.join("sub")).unwrap();
    fs::write(d.scratch.join("out.vcf"), "out").unwrap();
    fs::write(d.scratch.join("sub/nested.txt"), "nested").unwrap();

    let mut seen = Vec::new();
    let report = area
        .reconcile(|r| -> Result<(), StagingError> {
            seen.push(r.key.clone());
            Ok(())
        })
        .unwrap();

    assert_eq!(seen, vec!["out.vcf".to_string(), "sub/nested.txt".to_string()]);
    assert_eq!(report.moved.len(), 2);
    assert_eq!(fs::read_to_string(d.permanent.join("sub/nested.txt")).unwrap(), "nested");
    assert!(!d.scratch.join("sub").exists());
    assert!(d.scratch.is_dir());
}

#[test]
fn reconcile_replaces_files_and_merges_directories() {
    let d = dirs();
    let mut area = StagingArea::create(&d.scratch, &d.permanent, StagingMode::Copy).unwrap();
    fs::create_dir_all(d.permanent.join("sub")).unwrap();
    fs::write(d.permanent.join("out.vcf"), "old").unwrap();
    fs::write(d.permanent.join("sub/existing.txt"), "keep").unwrap();
    fs::create_dir_all(d.scratch.join("sub")).unwrap();
    fs::write(d.scratch.join("out.vcf"), "new").unwrap();
    fs::write(d.scratch.join("sub/added.txt"), "added").unwrap();

    area.reconcile(|_| -> Result<(), StagingError> { Ok(()) }).unwrap();

    assert_eq!(fs::read_to_string(d.permanent.join("out.vcf")).unwrap(), "new");
    assert!(d.permanent.join("sub/existing.txt").exists());
    assert!(d.permanent.join("sub/added.txt").exists());
}

#[cfg(unix)]
#[test]
fn reconcile_removes_dangling_symlinks() {
    let d = dirs();
    let mut area = StagingArea::create(&d.scratch, &d.permanent, StagingMode::Copy).unwrap();
    std::os::unix::fs::symlink(d.scratch.join("gone"), d.scratch.join("link")).unwrap();

    let report = area.reconcile(|_| -> Result<(), StagingError> { Ok(()) }).unwrap();
    assert_eq!(report.removed_links, vec![d.scratch.join("link")]);
    assert!(!d.permanent.join("link").exists());
}

#[test]
fn reconcile_stops_at_first_callback_failure() {
    let d = dirs();
    let mut area = StagingArea::create(&d.scratch, &d.permanent, StagingMode::Copy).unwrap();
    fs::write(d.scratch.join("a.txt"), "").unwrap();
    fs::write(d.scratch.join("b.txt"), "").unwrap();

    let err = area
        .reconcile(|r| {
            if r.key == "a.txt" {
                Err(JobError::Cancelled)
            } else {
                Ok(())
            }
        })
        .unwrap_err();
    assert!(matches!(err, JobError::Cancelled));
    assert!(d.permanent.join("a.txt").exists());
    assert!(d.scratch.join("b.txt").exists());
}

#[test]
fn reconcile_skips_excluded_entries() {
    let d = dirs();
    let mut area = StagingArea::create(&d.scratch, &d.permanent, StagingMode::Copy).unwrap();
    area.exclude("cachedData");
    fs::create_dir_all(d.scratch.join("cachedData")).unwrap();
    fs::write(d.scratch.join("cachedData/ref.fa"), "").unwrap();

    let report = area.reconcile(|_| -> Result<(), StagingError> { Ok(()) }).unwrap();
    assert!(report.moved.is_empty());
    assert!(d.scratch.join("cachedData/ref.fa").exists());
}

#[test]
fn reconcile_without_scratch_fails() {
    let d = dirs();
    let mut area = StagingArea::create(&d.scratch, &d.permanent, StagingMode::Copy).unwrap();
    fs::remove_dir_all(&d.scratch).unwrap();
    let err = area
        .reconcile(|_| -> Result<(), StagingError> { Ok(()) })
        .unwrap_err();
    assert!(matches!(err, StagingError::MissingScratch(_)));
}
