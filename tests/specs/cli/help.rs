// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Help and version output.

use crate::prelude::*;

#[test]
fn no_args_shows_usage_and_exits_zero() {
    cli().passes().stdout_has("Usage:");
}

#[test]
fn help_lists_command_groups() {
    cli()
        .args(["--help"])
        .passes()
        .stdout_has("checkpoint")
        .stdout_has("deferred")
        .stdout_has("scatter")
        .stdout_has("orphans");
}

#[test]
fn deferred_help_shows_subcommands() {
    cli()
        .args(["deferred", "--help"])
        .passes()
        .stdout_has("show")
        .stdout_has("purge");
}

#[test]
fn version_shows_version() {
    cli().args(["--version"]).passes().stdout_has("0.2");
}

#[test]
fn unknown_format_is_rejected() {
    cli()
        .args(["--format", "yaml", "orphans", "."])
        .fails()
        .stderr_has("invalid value");
}
