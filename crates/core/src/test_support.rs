// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test helpers for use across crates.
//!
//! Gated behind `#[cfg(any(test, feature = "test-support"))]`.

use crate::{Clock, Job, JobConfig, JobParams};
use std::path::{Path, PathBuf};

/// Proptest strategies for core data types.
pub mod strategies {
    use crate::action::RecordedAction;
    use crate::job::JobStatus;
    use proptest::prelude::*;

    pub fn arb_job_status() -> impl Strategy<Value = JobStatus> {
        prop_oneof![
            Just(JobStatus::Created),
            Just(JobStatus::Split),
            Just(JobStatus::Running),
            Just(JobStatus::Merged),
            Just(JobStatus::Complete),
            "[a-z ]{0,12}".prop_map(JobStatus::Failed),
            Just(JobStatus::Cancelled),
        ]
    }

    pub fn arb_role() -> impl Strategy<Value = String> {
        prop_oneof![
            Just("Input VCF".to_string()),
            Just("Output VCF".to_string()),
            Just("Input BAM".to_string()),
            "[A-Z][a-z]{2,8}",
        ]
    }

    pub fn arb_path() -> impl Strategy<Value = String> {
        proptest::collection::vec("[a-z0-9_]{1,8}", 1..4)
            .prop_map(|parts| format!("/{}.dat", parts.join("/")))
    }

    /// Finished-looking actions with unique input and output paths.
    pub fn arb_recorded_action() -> impl Strategy<Value = RecordedAction> {
        (
            "[A-Za-z ]{1,16}",
            proptest::option::of("[a-z ]{0,20}"),
            proptest::collection::vec((arb_path(), arb_role()), 0..4),
            proptest::collection::vec((arb_path(), arb_role(), any::<bool>()), 0..4),
        )
            .prop_map(|(name, description, inputs, outputs)| {
                let mut action = RecordedAction::new(name);
                action.description = description;
                for (path, role) in inputs {
                    action.add_input(path, role);
                }
                for (path, role, transient) in outputs {
                    action.add_output(path, role, transient);
                }
                action
            })
    }
}

/// A job rooted at `analysis_dir` with the given inputs and parameters.
pub fn test_job(
    analysis_dir: &Path,
    inputs: &[PathBuf],
    params: JobParams,
    clock: &dyn Clock,
) -> Job {
    Job::new(
        JobConfig::builder("test-job", analysis_dir)
            .input_files(inputs.to_vec())
            .params(params)
            .build(),
        clock,
    )
}
