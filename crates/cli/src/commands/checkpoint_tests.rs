// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use indexmap::IndexMap;
use sj_core::RecordedAction;

fn summary(checkpoint: &Checkpoint) -> String {
    let mut buf = Vec::new();
    write_summary(&mut buf, Path::new("/runs/a/cp.json"), checkpoint).unwrap();
    String::from_utf8(buf).unwrap()
}

#[test]
fn summary_lists_actions_and_steps() {
    let mut action = RecordedAction::new("filter");
    action.add_input("/in.vcf", "Input");
    action.add_output("/out.vcf", "Output VCF", false);
    let checkpoint = Checkpoint {
        task: Some("processVariantsCheckpoint.json".into()),
        recorded_actions: Some(vec![action]),
        step_outputs: IndexMap::from([("1<>/in.vcf".to_string(), PathBuf::from("/out.vcf"))]),
        ..Checkpoint::default()
    };

    let text = summary(&checkpoint);

    assert!(text.contains("/runs/a/cp.json"));
    assert!(text.contains("Task:    processVariantsCheckpoint.json"));
    assert!(text.contains("  filter: 1 in, 1 out"));
    assert!(text.contains("  1<>/in.vcf -> /out.vcf"));
    assert!(text.contains("Resumed: no"));
    assert!(!text.contains("Staged inputs"));
}

#[test]
fn summary_mentions_pending_relocations() {
    let checkpoint = Checkpoint {
        files_copied_locally: vec![(PathBuf::from("/s/a"), PathBuf::from("/p/a"))],
        ..Checkpoint::default()
    };
    assert!(summary(&checkpoint).contains("1 file(s) already relocated"));
}
