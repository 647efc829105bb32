// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Scatter planning: dividing a reference genome into per-job intervals.

use crate::error::JobError;
use indexmap::IndexMap;
use sj_core::params::keys;
use sj_core::{Interval, ParamError, ScatterGatherMethod, ScatterSettings, SequenceDictionary, SequenceRecord};
use std::collections::HashSet;
use std::fs;
use std::path::Path;

/// A split contig never leaves a remainder shorter than this on its own.
pub const MIN_FINAL_CHUNK_SIZE: u64 = 500;

pub type IntervalPlan = IndexMap<String, Vec<Interval>>;

pub fn read_dictionary(path: &Path) -> Result<SequenceDictionary, JobError> {
    let text = fs::read_to_string(path).map_err(|e| JobError::io(path, e))?;
    Ok(SequenceDictionary::parse(&text)?)
}

/// One whole-contig interval per record, keyed by contig name.
pub fn contig_plan(dict: &SequenceDictionary) -> IntervalPlan {
    dict.records()
        .iter()
        .map(|r| (r.name.clone(), vec![Interval::new(&r.name, 1, r.length)]))
        .collect()
}

/// Pack dictionary records into jobs of about `optimal_bases_per_job`.
///
/// Records are taken in dictionary order, or by descending length when
/// `sort_on_contig_size`. A record larger than what the current job has
/// room for is cut into chunks when `allow_split` is set; a job closes
/// once it is full or holds `max_contigs` contigs. Jobs are named
/// `Job1..JobN`.
pub fn divide_genome(
    dict: &SequenceDictionary,
    optimal_bases_per_job: u64,
    allow_split: bool,
    max_contigs: Option<usize>,
    sort_on_contig_size: bool,
) -> IntervalPlan {
    let mut records: Vec<&SequenceRecord> = dict.records().iter().collect();
    if sort_on_contig_size {
        records.sort_by(|a, b| b.length.cmp(&a.length));
    }

    let mut set = ActiveSet::new(optimal_bases_per_job, allow_split, max_contigs);
    for record in records {
        set.add(record);
    }
    set.close();
    set.results
}

/// Plan intervals for a scatter method.
pub fn plan(
    dict: &SequenceDictionary,
    method: ScatterGatherMethod,
    settings: &ScatterSettings,
) -> Result<IntervalPlan, JobError> {
    let plan = match method {
        ScatterGatherMethod::None => IntervalPlan::new(),
        ScatterGatherMethod::Contig => contig_plan(dict),
        ScatterGatherMethod::Chunked => {
            let megabases = required_positive(settings.megabases_per_job, keys::BASES_PER_JOB)?;
            tracing::info!(
                megabases,
                allow_split = settings.allow_split_chromosomes,
                max_contigs = ?settings.max_contigs_per_job,
                "planning chunked scatter"
            );
            divide_genome(
                dict,
                megabases.saturating_mul(1_000_000),
                settings.allow_split_chromosomes,
                settings.max_contigs_per_job,
                false,
            )
        }
        ScatterGatherMethod::FixedJobs => {
            let jobs = required_positive(settings.total_jobs, keys::TOTAL_JOBS)?;
            let job_size = dict.total_length().div_ceil(jobs);
            tracing::info!(jobs, job_size, "planning fixed-jobs scatter");
            divide_genome(dict, job_size, true, None, false)
        }
    };
    Ok(plan)
}

fn required_positive(value: Option<u64>, key: &str) -> Result<u64, ParamError> {
    match value {
        None => Err(ParamError::Missing(key.to_string())),
        Some(0) => Err(ParamError::Invalid {
            key: key.to_string(),
            value: "0".to_string(),
        }),
        Some(n) => Ok(n),
    }
}

struct ActiveSet {
    optimal: u64,
    allow_split: bool,
    max_contigs: Option<usize>,
    results: IntervalPlan,
    current: Vec<Interval>,
    bases: u64,
    contigs: HashSet<String>,
}

impl ActiveSet {
    fn new(optimal: u64, allow_split: bool, max_contigs: Option<usize>) -> Self {
        Self {
            optimal: optimal.max(1),
            allow_split,
            max_contigs,
            results: IntervalPlan::new(),
            current: Vec::new(),
            bases: 0,
            contigs: HashSet::new(),
        }
    }

    fn remaining(&self) -> u64 {
        self.optimal.saturating_sub(self.bases)
    }

    fn add(&mut self, record: &SequenceRecord) {
        if record.length <= self.remaining() || !self.allow_split {
            self.add_interval(&record.name, 1, record.length);
            return;
        }
        let mut start0 = 0;
        while start0 < record.length {
            let mut end = (start0 + self.remaining()).min(record.length);
            let after = record.length - end;
            if after > 0 && after < MIN_FINAL_CHUNK_SIZE {
                end = record.length;
            }
            self.add_interval(&record.name, start0 + 1, end);
            start0 = end;
        }
    }

    fn add_interval(&mut self, contig: &str, start: u64, end: u64) {
        self.current.push(Interval::new(contig, start, end));
        self.bases += end + 1 - start;
        self.contigs.insert(contig.to_string());
        if self.remaining() == 0 || self.max_contigs.is_some_and(|max| self.contigs.len() >= max) {
            self.close();
        }
    }

    fn close(&mut self) {
        if self.current.is_empty() {
            return;
        }
        let name = format!("Job{}", self.results.len() + 1);
        self.results.insert(name, std::mem::take(&mut self.current));
        self.bases = 0;
        self.contigs.clear();
    }
}

#[cfg(test)]
#[path = "scatter_tests.rs"]
mod tests;
