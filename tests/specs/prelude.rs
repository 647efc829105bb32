// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared helpers for CLI specs.

use assert_cmd::Command;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub use serde_json::json;
pub use similar_asserts::assert_eq;

/// Path to the workspace `sj` binary. `CARGO_BIN_EXE_sj` is only set for
/// the package that owns the binary, so fall back to the target directory
/// next to this test executable.
fn sj_bin() -> PathBuf {
    if let Some(path) = std::env::var_os("CARGO_BIN_EXE_sj") {
        return PathBuf::from(path);
    }
    let mut dir = std::env::current_exe().unwrap();
    dir.pop();
    if dir.ends_with("deps") {
        dir.pop();
    }
    dir.join(format!("sj{}", std::env::consts::EXE_SUFFIX))
}

/// A command for the `sj` binary with a quiet, colorless environment.
pub fn cli() -> Command {
    let mut cmd = Command::new(sj_bin());
    cmd.env("NO_COLOR", "1")
        .env_remove("COLOR")
        .env_remove("SJ_LOG")
        .env_remove("SJ_WORK_DIR");
    cmd
}

pub struct Run {
    pub stdout: String,
    pub stderr: String,
    pub code: Option<i32>,
}

impl Run {
    pub fn stdout_has(&self, needle: &str) -> &Self {
        assert!(
            self.stdout.contains(needle),
            "stdout missing {needle:?}:\n{}",
            self.stdout
        );
        self
    }

    pub fn stderr_has(&self, needle: &str) -> &Self {
        assert!(
            self.stderr.contains(needle),
            "stderr missing {needle:?}:\n{}",
            self.stderr
        );
        self
    }

    pub fn json(&self) -> serde_json::Value {
        serde_json::from_str(&self.stdout).unwrap()
    }
}

pub trait CommandExt {
    fn passes(&mut self) -> Run;
    fn fails(&mut self) -> Run;
}

impl CommandExt for Command {
    fn passes(&mut self) -> Run {
        let run = capture(self);
        assert_eq!(run.code, Some(0), "expected success, stderr:\n{}", run.stderr);
        run
    }

    fn fails(&mut self) -> Run {
        let run = capture(self);
        assert_ne!(run.code, Some(0), "expected failure, stdout:\n{}", run.stdout);
        run
    }
}

fn capture(cmd: &mut Command) -> Run {
    let output = cmd.output().unwrap();
    Run {
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        code: output.status.code(),
    }
}

/// Temporary job directory.
pub struct Workspace {
    dir: TempDir,
}

impl Workspace {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().unwrap(),
        }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn file(&self, rel: &str, content: &str) -> PathBuf {
        let path = self.dir.path().join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, content).unwrap();
        path
    }

    pub fn arg(&self, rel: &str) -> String {
        self.dir.path().join(rel).display().to_string()
    }
}
