// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Orphan-file command handler

use anyhow::{Context, Result};
use clap::Args;
use sj_core::Job;
use sj_engine::{known_files, scan_orphans, OrphanReport};
use std::collections::HashSet;
use std::io::Write;
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;

use crate::exit_error::ExitError;
use crate::output::{format_or_json, OutputFormat};

#[derive(Args)]
pub struct OrphansArgs {
    /// Analysis directory to scan
    pub dir: PathBuf,
    /// A file the job is known to own (repeatable)
    #[arg(long, value_name = "FILE")]
    pub known: Vec<PathBuf>,
    /// A saved job record whose files count as known (repeatable)
    #[arg(long, value_name = "JSON")]
    pub job: Vec<PathBuf>,
}

pub fn handle(args: OrphansArgs, format: OutputFormat) -> Result<()> {
    let known = known_set(&args)?;
    let report = scan_orphans(&args.dir, known.as_ref(), &CancellationToken::new())?;
    format_or_json(format, &report, |out| write_report(out, &report))?;
    if !report.is_clean() {
        return Err(ExitError::findings("").into());
    }
    Ok(())
}

/// `None` unless the caller said which files are known.
fn known_set(args: &OrphansArgs) -> Result<Option<HashSet<PathBuf>>> {
    if args.known.is_empty() && args.job.is_empty() {
        return Ok(None);
    }
    let mut known: HashSet<PathBuf> = args.known.iter().cloned().collect();
    for path in &args.job {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading job record {}", path.display()))?;
        let job: Job = serde_json::from_str(&text)
            .with_context(|| format!("parsing job record {}", path.display()))?;
        known.extend(known_files(&job));
    }
    Ok(Some(known))
}

pub(crate) fn write_report(out: &mut dyn Write, report: &OrphanReport) -> std::io::Result<()> {
    for path in &report.orphan_indexes {
        writeln!(out, "index without data: {}", path.display())?;
    }
    for path in &report.unknown_files {
        writeln!(out, "unknown file: {}", path.display())?;
    }
    writeln!(
        out,
        "{} file(s) scanned, {} orphan index(es), {} unknown",
        report.scanned,
        report.orphan_indexes.len(),
        report.unknown_files.len()
    )
}

#[cfg(test)]
#[path = "orphans_tests.rs"]
mod tests;
