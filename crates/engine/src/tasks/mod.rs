// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Built-in tasks.

mod gather;
mod step_chain;

pub use gather::{merged_file_name, GatherFactory, GatherTask, GATHER_TASK_ID};
pub use step_chain::{StepChainFactory, StepChainTask, STEP_CHAIN_CHECKPOINT};
