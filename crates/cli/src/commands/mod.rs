// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! CLI command implementations

pub mod checkpoint;
pub mod deferred;
pub mod orphans;
pub mod scatter;
