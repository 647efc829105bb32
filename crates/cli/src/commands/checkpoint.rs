// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Checkpoint command handlers

use anyhow::Result;
use clap::{Args, Subcommand};
use sj_storage::Checkpoint;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::exit_error::ExitError;
use crate::output::{format_or_json, OutputFormat};

#[derive(Args)]
pub struct CheckpointArgs {
    #[command(subcommand)]
    pub command: CheckpointCommand,
}

#[derive(Subcommand)]
pub enum CheckpointCommand {
    /// Summarize a task checkpoint
    Show {
        /// Checkpoint file (e.g. processVariantsCheckpoint.json)
        file: PathBuf,
    },
    /// Check that a checkpoint can be read and migrated
    Validate {
        /// Checkpoint file
        file: PathBuf,
    },
}

pub fn handle(command: CheckpointCommand, format: OutputFormat) -> Result<()> {
    match command {
        CheckpointCommand::Show { file } => {
            let checkpoint = Checkpoint::read(&file)?;
            format_or_json(format, &checkpoint, |out| write_summary(out, &file, &checkpoint))?;
        }
        CheckpointCommand::Validate { file } => {
            let result = Checkpoint::read(&file);
            let report = match &result {
                Ok(c) => serde_json::json!({
                    "path": file,
                    "valid": true,
                    "version": c.version,
                    "actions": c.actions().len(),
                }),
                Err(e) => serde_json::json!({
                    "path": file,
                    "valid": false,
                    "error": e.to_string(),
                }),
            };
            match result {
                Ok(c) => format_or_json(format, &report, |out| {
                    writeln!(
                        out,
                        "ok: {} (version {}, {} actions)",
                        file.display(),
                        c.version,
                        c.actions().len()
                    )
                })?,
                Err(e) => {
                    if format == OutputFormat::Json {
                        println!("{}", serde_json::to_string_pretty(&report)?);
                    }
                    return Err(ExitError::findings(format!("invalid checkpoint: {e}")).into());
                }
            }
        }
    }
    Ok(())
}

pub(crate) fn write_summary(
    out: &mut dyn Write,
    path: &Path,
    checkpoint: &Checkpoint,
) -> std::io::Result<()> {
    writeln!(out, "{} {}", crate::color::header("Checkpoint:"), path.display())?;
    writeln!(out, "Version: {}", checkpoint.version)?;
    if let Some(task) = &checkpoint.task {
        writeln!(out, "Task:    {task}")?;
    }
    if let Some(saved) = checkpoint.saved_at {
        writeln!(out, "Saved:   {}", saved.to_rfc3339_opts(chrono::SecondsFormat::Secs, true))?;
    }
    writeln!(out, "Resumed: {}", if checkpoint.is_resume { "yes" } else { "no" })?;

    let actions = checkpoint.actions();
    writeln!(out, "\n{} ({})", crate::color::header("Actions"), actions.len())?;
    for action in actions {
        writeln!(
            out,
            "  {}: {} in, {} out",
            action.name,
            action.inputs.len(),
            action.outputs.len()
        )?;
    }

    writeln!(
        out,
        "\n{} ({})",
        crate::color::header("Completed steps"),
        checkpoint.step_outputs.len()
    )?;
    for (key, output) in &checkpoint.step_outputs {
        writeln!(out, "  {key} -> {}", output.display())?;
    }

    if !checkpoint.copied_inputs.is_empty() {
        writeln!(out, "\n{}", crate::color::header("Staged inputs"))?;
        for (original, staged) in &checkpoint.copied_inputs {
            writeln!(out, "  {} -> {}", original.display(), staged.display())?;
        }
    }
    if !checkpoint.files_copied_locally.is_empty() {
        writeln!(
            out,
            "\n{} file(s) already relocated by an earlier cleanup",
            checkpoint.files_copied_locally.len()
        )?;
    }
    Ok(())
}

#[cfg(test)]
#[path = "checkpoint_tests.rs"]
mod tests;
