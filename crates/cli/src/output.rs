// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use clap::ValueEnum;
use serde::Serialize;
use std::io::Write;

#[cfg(test)]
#[path = "output_tests.rs"]
mod tests;

#[derive(Clone, Copy, Debug, Default, PartialEq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Render `data` as JSON when `format` is `Json`, otherwise call `text_fn`.
pub fn format_or_json<T: Serialize>(
    format: OutputFormat,
    data: &T,
    text_fn: impl FnOnce(&mut dyn Write) -> std::io::Result<()>,
) -> anyhow::Result<()> {
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    write_formatted(format, data, &mut out, text_fn)
}

fn write_formatted<T: Serialize>(
    format: OutputFormat,
    data: &T,
    out: &mut dyn Write,
    text_fn: impl FnOnce(&mut dyn Write) -> std::io::Result<()>,
) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => {
            writeln!(out, "{}", serde_json::to_string_pretty(data)?)?;
        }
        OutputFormat::Text => text_fn(out)?,
    }
    Ok(())
}

/// Print a purge summary in text or JSON.
///
/// - `deleted`: paths removed (or that would be removed on a dry run)
/// - `missing`: logged paths that were already gone
pub fn print_purge_results(
    deleted: &[String],
    missing: &[String],
    dry_run: bool,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let summary = serde_json::json!({
        "dry_run": dry_run,
        "deleted": deleted,
        "missing": missing,
    });
    format_or_json(format, &summary, |out| {
        if dry_run {
            writeln!(out, "Dry run, no changes made\n")?;
        }
        let label = if dry_run { "Would delete" } else { "Deleted" };
        for path in deleted {
            writeln!(out, "{label} {path}")?;
        }
        for path in missing {
            writeln!(out, "Already gone {}", crate::color::muted(path))?;
        }
        let verb = if dry_run { "would be deleted" } else { "deleted" };
        writeln!(out, "\n{} file(s) {verb}, {} already gone", deleted.len(), missing.len())
    })
}
