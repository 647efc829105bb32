// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::staging::StagingMode;
use sj_core::params::keys;
use sj_core::test_support::test_job;
use sj_core::{FakeClock, JobParams};
use tempfile::TempDir;

struct Fixture {
    _tmp: TempDir,
    data: PathBuf,
    scratch: PathBuf,
    analysis: PathBuf,
    job: Job,
    clock: FakeClock,
}

impl Fixture {
    fn manager(&self, mode: StagingMode) -> TaskFileManager {
        let staging = StagingArea::create(&self.scratch, &self.analysis, mode).unwrap();
        TaskFileManager::new(&self.job, staging, Arc::new(self.clock.clone())).unwrap()
    }
}

fn fixture(params: JobParams) -> Fixture {
    let tmp = tempfile::tempdir().unwrap();
    let data = tmp.path().join("data");
    let scratch = tmp.path().join("scratch");
    let analysis = tmp.path().join("analysis");
    fs::create_dir_all(&data).unwrap();
    let input = data.join("in.vcf");
    fs::write(&input, "variants").unwrap();
    let clock = FakeClock::new();
    let job = test_job(&analysis, &[input], params, &clock);
    Fixture {
        _tmp: tmp,
        data,
        scratch,
        analysis,
        job,
        clock,
    }
}

fn deleting() -> JobParams {
    JobParams::new().with(keys::DELETE_INTERMEDIATE_FILES, "true")
}

#[test]
fn directories_register_every_file() {
    let f = fixture(JobParams::new());
    let mut files = f.manager(StagingMode::InPlace);
    let out_dir = f.scratch.join("report");
    fs::create_dir_all(out_dir.join("img")).unwrap();
    fs::write(out_dir.join("index.html"), "").unwrap();
    fs::write(out_dir.join("img/plot.png"), "").unwrap();

    let action = files.start_action("Report");
    files.add_output(action, "Report", &out_dir, false).unwrap();

    let keys: Vec<&str> = files.ledger().files().iter().map(|f| f.current_key()).collect();
    assert_eq!(keys, vec!["report/img/plot.png", "report/index.html"]);
    assert_eq!(files.ledger().action(action).unwrap().outputs.len(), 2);
}

#[test]
fn registering_twice_is_not_an_error() {
    let f = fixture(JobParams::new());
    let mut files = f.manager(StagingMode::InPlace);
    let input = f.data.join("in.vcf");
    let action = files.start_action("Filter");
    files.add_input(action, "Input", &input).unwrap();
    files.add_input(action, "Input", &input).unwrap();
    assert_eq!(files.ledger().action(action).unwrap().inputs.len(), 1);
}

#[test]
fn unknown_action_is_rejected() {
    let f = fixture(JobParams::new());
    let mut files = f.manager(StagingMode::InPlace);
    let err = files
        .add_input(ActionId(7), "Input", &f.data.join("in.vcf"))
        .unwrap_err();
    assert!(matches!(err, JobError::Ledger(_)));
}

#[test]
fn step_outputs_fold_into_action_and_sets() {
    let f = fixture(JobParams::new());
    let mut files = f.manager(StagingMode::InPlace);
    let out = f.scratch.join("out.vcf");
    let tmp = f.scratch.join("tmp.vcf");
    let chunk = f.scratch.join("chunk.vcf");
    let output = StepOutput::new()
        .with_input(f.data.join("in.vcf"), "Input VCF")
        .with_output(&out, "Filtered VCF")
        .with_intermediate(&tmp)
        .with_deferred_delete(&chunk)
        .with_sequence_output(SequenceOutput::new("filtered", "VCF File", &out))
        .with_command("filter in.vcf > out.vcf");

    let action = files.start_action("Filter");
    files.add_step_outputs(action, &output).unwrap();

    let recorded = files.ledger().action(action).unwrap();
    assert_eq!(recorded.inputs.len(), 1);
    assert_eq!(recorded.outputs.len(), 1);
    assert_eq!(recorded.commands, vec!["filter in.vcf > out.vcf".to_string()]);
    assert!(files.ledger().intermediate_files().contains(&tmp));
    assert_eq!(files.ledger().outputs_to_create().len(), 1);

    let logged = files.deferred_log().read().unwrap();
    assert_eq!(logged.len(), 1);
    assert_eq!(logged[0].path, "chunk.vcf");
}

#[test]
fn delete_intermediates_disabled_by_default() {
    let f = fixture(JobParams::new());
    let mut files = f.manager(StagingMode::InPlace);
    fs::write(f.scratch.join("tmp.txt"), "").unwrap();
    files.add_intermediate_file(&f.scratch.join("tmp.txt"));
    assert_eq!(files.delete_intermediate_files().unwrap(), 0);
    assert!(f.scratch.join("tmp.txt").exists());
}

#[test]
fn delete_intermediates_never_deletes_job_inputs() {
    let f = fixture(deleting());
    let mut files = f.manager(StagingMode::InPlace);
    let input = f.data.join("in.vcf");
    let tmp = f.scratch.join("work/tmp.txt");
    fs::create_dir_all(tmp.parent().unwrap()).unwrap();
    fs::write(&tmp, "").unwrap();
    files.add_intermediate_file(&input);
    files.add_intermediate_file(&tmp);
    files.add_intermediate_file(&f.scratch.join("never-created.txt"));

    assert_eq!(files.delete_intermediate_files().unwrap(), 1);
    assert!(input.exists());
    assert!(!tmp.exists());
    assert!(!f.scratch.join("work").exists());
    assert!(f.scratch.exists());
}

#[test]
fn sequence_output_is_not_deleted_as_intermediate() {
    let f = fixture(deleting());
    let mut files = f.manager(StagingMode::InPlace);
    let out = f.scratch.join("out.vcf");
    fs::write(&out, "").unwrap();
    files.add_intermediate_file(&out);
    files.add_sequence_output(SequenceOutput::new("out", "VCF File", &out));

    assert_eq!(files.delete_intermediate_files().unwrap(), 0);
    assert!(out.exists());
}

#[test]
fn cleanup_relocates_outputs_and_rewrites_actions() {
    let f = fixture(JobParams::new());
    let mut files = f.manager(StagingMode::InPlace);
    let input = f.data.join("in.vcf");
    let out = f.scratch.join("calls/out.vcf");
    fs::create_dir_all(out.parent().unwrap()).unwrap();
    fs::write(&out, "calls").unwrap();

    let action = files.start_action("Call");
    files.add_input(action, "Input", &input).unwrap();
    files.add_output(action, "Calls", &out, false).unwrap();
    files.finish_action(action).unwrap();

    let report = files.cleanup().unwrap();

    let dest = f.analysis.join("calls/out.vcf");
    assert_eq!(report.relocated, vec![(out.clone(), dest.clone())]);
    assert_eq!(fs::read_to_string(&dest).unwrap(), "calls");
    let recorded = files.ledger().action(action).unwrap();
    assert_eq!(recorded.outputs[0].uri, dest);
    assert_eq!(recorded.inputs[0].uri, input);
    assert_eq!(files.ledger().current_path(&out), Some(dest.as_path()));
}

#[test]
fn cleanup_discards_staged_copies_unless_claimed_as_output() {
    let f = fixture(JobParams::new());
    fs::write(f.data.join("other.vcf"), "other").unwrap();
    let mut files = f.manager(StagingMode::Copy);
    let staged = files.staging_mut().stage_input(&f.data.join("in.vcf")).unwrap();
    let claimed = files.staging_mut().stage_input(&f.data.join("other.vcf")).unwrap();

    let action = files.start_action("Passthrough");
    files.add_input(action, "Input", &staged).unwrap();
    files.add_output(action, "Output", &claimed, false).unwrap();

    let report = files.cleanup().unwrap();
    assert_eq!(report.discarded, vec![staged]);
    assert!(!f.analysis.join("in.vcf").exists());
    assert!(f.analysis.join("other.vcf").exists());
}

#[test]
fn vanished_outputs_become_transient() {
    let f = fixture(JobParams::new());
    let mut files = f.manager(StagingMode::InPlace);
    let out = f.scratch.join("tmp.bam");
    let action = files.start_action("Sort");
    files.add_output(action, "Sorted BAM", &out, false).unwrap();

    let report = files.cleanup().unwrap();
    assert_eq!(report.transient, vec![out]);
    assert!(files.ledger().action(action).unwrap().outputs[0].is_transient);
}

#[test]
fn cleanup_reapplies_earlier_relocations() {
    let f = fixture(JobParams::new());
    let mut files = f.manager(StagingMode::InPlace);
    let out = f.scratch.join("out.vcf");
    let action = files.start_action("Call");
    files.add_output(action, "Calls", &out, false).unwrap();
    // An earlier attempt already moved the file before being interrupted.
    fs::create_dir_all(&f.analysis).unwrap();
    let dest = f.analysis.join("out.vcf");
    fs::write(&dest, "calls").unwrap();

    let report = files
        .cleanup_with(&[(out.clone(), dest.clone())], |_, _| Ok(()))
        .unwrap();
    assert!(report.transient.is_empty());
    assert_eq!(files.ledger().action(action).unwrap().outputs[0].uri, dest);
}

#[test]
fn complete_hands_over_outputs_and_new_actions() {
    let mut f = fixture(JobParams::new());
    let mut files = f.manager(StagingMode::InPlace);
    let first = files.start_action("First");
    files.finish_action(first).unwrap();
    let second = files.start_action("Second");
    files.finish_action(second).unwrap();
    files.start_action("Unfinished");
    files.add_sequence_output(SequenceOutput::new("o", "VCF File", f.analysis.join("o.vcf")));

    let handed = files.complete(&mut f.job, 1);
    assert_eq!(handed.len(), 1);
    assert_eq!(handed[0].name, "Second");
    assert_eq!(f.job.actions.len(), 1);
    assert_eq!(f.job.outputs_to_create.len(), 1);
    assert!(files.ledger().outputs_to_create().is_empty());
}
