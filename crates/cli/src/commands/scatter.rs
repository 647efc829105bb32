// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Scatter planning command handlers

use anyhow::Result;
use clap::{Args, Subcommand, ValueEnum};
use sj_core::{ScatterGatherMethod, ScatterSettings};
use sj_engine::scatter::{self, IntervalPlan};
use sj_storage::IntervalMapFile;
use std::io::Write;
use std::path::PathBuf;

use crate::output::{format_or_json, OutputFormat};

#[derive(Args)]
pub struct ScatterArgs {
    #[command(subcommand)]
    pub command: ScatterCommand,
}

#[derive(Clone, Copy, Debug, PartialEq, ValueEnum)]
pub enum Method {
    /// One job per contig
    Contig,
    /// Jobs of about --bases-per-job megabases
    Chunked,
    /// Exactly --jobs jobs of equal size
    FixedJobs,
}

impl From<Method> for ScatterGatherMethod {
    fn from(method: Method) -> Self {
        match method {
            Method::Contig => ScatterGatherMethod::Contig,
            Method::Chunked => ScatterGatherMethod::Chunked,
            Method::FixedJobs => ScatterGatherMethod::FixedJobs,
        }
    }
}

#[derive(Subcommand)]
pub enum ScatterCommand {
    /// Divide a reference dictionary into interval jobs
    Plan {
        /// Sequence dictionary (.dict)
        dict: PathBuf,
        #[arg(long, value_enum, default_value_t = Method::Contig)]
        method: Method,
        /// Megabases per job (chunked)
        #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
        bases_per_job: Option<u64>,
        /// Number of jobs (fixed-jobs)
        #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
        jobs: Option<u64>,
        /// Never split a contig across jobs (chunked)
        #[arg(long)]
        no_split: bool,
        /// Maximum contigs in one job (chunked)
        #[arg(long)]
        max_contigs: Option<usize>,
        /// Write jobsToInterval.txt into this directory
        #[arg(long, value_name = "DIR")]
        write: Option<PathBuf>,
    },
}

pub fn handle(command: ScatterCommand, format: OutputFormat) -> Result<()> {
    match command {
        ScatterCommand::Plan {
            dict,
            method,
            bases_per_job,
            jobs,
            no_split,
            max_contigs,
            write,
        } => {
            let dictionary = scatter::read_dictionary(&dict)?;
            let settings = ScatterSettings {
                megabases_per_job: bases_per_job,
                allow_split_chromosomes: !no_split,
                max_contigs_per_job: max_contigs.filter(|&n| n > 0),
                total_jobs: jobs,
            };
            let plan = scatter::plan(&dictionary, method.into(), &settings)?;
            if let Some(dir) = write {
                let file = IntervalMapFile::in_dir(&dir);
                file.write(&plan)?;
                eprintln!("wrote {}", file.path().display());
            }
            format_or_json(format, &plan, |out| write_plan(out, &plan))?;
        }
    }
    Ok(())
}

pub(crate) fn write_plan(out: &mut dyn Write, plan: &IntervalPlan) -> std::io::Result<()> {
    for (name, intervals) in plan {
        let bases: u64 = intervals.iter().map(|i| i.len()).sum();
        let list = intervals
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ");
        writeln!(out, "{name}\t{bases}\t{list}")?;
    }
    writeln!(out, "\n{} job(s)", plan.len())
}

#[cfg(test)]
#[path = "scatter_tests.rs"]
mod tests;
