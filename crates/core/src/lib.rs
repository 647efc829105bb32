// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! sj-core: data model for the seqjobs pipeline engine

pub mod macros;

pub mod action;
pub mod clock;
pub mod genome;
pub mod id;
pub mod job;
pub mod ledger;
pub mod output;
pub mod params;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use action::{ActionId, ActionInput, ActionOutput, RecordedAction};
pub use clock::{Clock, FakeClock, SystemClock};
pub use genome::{DictionaryError, Interval, ReferenceGenome, SequenceDictionary, SequenceRecord};
pub use job::{
    Job, JobConfig, JobConfigBuilder, JobId, JobStatus, SplitKey, TaskOutcome, TaskRecord,
};
pub use ledger::{Direction, FileId, FileLedger, FileUse, LedgerError, Registration, TrackedFile};
pub use output::{SequenceOutput, StepOutput};
pub use params::{InputFileTreatment, JobParams, ParamError, ScatterGatherMethod, ScatterSettings};
