// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! sj-storage: durable on-disk formats for task checkpoints, the
//! deferred-delete log, and scatter interval plans.

mod atomic;
mod checkpoint;
mod deferred;
mod intervals;
mod migration;

pub use atomic::write_atomic;
pub use checkpoint::{Checkpoint, CheckpointError, CURRENT_CHECKPOINT_VERSION};
pub use deferred::{DeferredDeleteLog, DeferredEntry, DeferredLogError, DEFERRED_LOG_NAME};
pub use intervals::{IntervalMapError, IntervalMapFile, INTERVAL_MAP_NAME};
pub use migration::{Migration, MigrationError, MigrationRegistry};
