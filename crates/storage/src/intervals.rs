// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Scatter interval plan persisted next to the parent job.
//!
//! Tab-separated rows of `name, contig, start, end`; a plan entry with
//! several intervals spans several consecutive rows with the same name.

use crate::atomic::write_atomic;
use indexmap::IndexMap;
use sj_core::Interval;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const INTERVAL_MAP_NAME: &str = "jobsToInterval.txt";

#[derive(Debug, Error)]
pub enum IntervalMapError {
    #[error("interval map I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("interval map {}: {source}", path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error("interval map {}: line {line}: {reason}", path.display())]
    BadRecord {
        path: PathBuf,
        line: u64,
        reason: String,
    },
}

#[derive(Debug, Clone)]
pub struct IntervalMapFile {
    path: PathBuf,
}

impl IntervalMapFile {
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            path: dir.join(INTERVAL_MAP_NAME),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    pub fn write(&self, plan: &IndexMap<String, Vec<Interval>>) -> Result<(), IntervalMapError> {
        let csv_err = |source| IntervalMapError::Csv {
            path: self.path.clone(),
            source,
        };
        let mut writer = csv::WriterBuilder::new()
            .delimiter(b'\t')
            .has_headers(false)
            .from_writer(Vec::new());
        for (name, intervals) in plan {
            for interval in intervals {
                let start = interval.start.to_string();
                let end = interval.end.to_string();
                writer
                    .write_record([
                        name.as_str(),
                        interval.contig.as_str(),
                        start.as_str(),
                        end.as_str(),
                    ])
                    .map_err(csv_err)?;
            }
        }
        let bytes = writer
            .into_inner()
            .map_err(|e| csv_err(csv::Error::from(e.into_error())))?;
        write_atomic(&self.path, &bytes).map_err(|source| IntervalMapError::Io {
            path: self.path.clone(),
            source,
        })
    }

    /// Read the plan back in file order.
    pub fn read(&self) -> Result<IndexMap<String, Vec<Interval>>, IntervalMapError> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(b'\t')
            .has_headers(false)
            .from_path(&self.path)
            .map_err(|source| IntervalMapError::Csv {
                path: self.path.clone(),
                source,
            })?;

        let mut plan: IndexMap<String, Vec<Interval>> = IndexMap::new();
        for record in reader.records() {
            let record = record.map_err(|source| IntervalMapError::Csv {
                path: self.path.clone(),
                source,
            })?;
            let line = record.position().map(|p| p.line()).unwrap_or_default();
            let bad = |reason: String| IntervalMapError::BadRecord {
                path: self.path.clone(),
                line,
                reason,
            };
            let [name, contig, start, end] = [0, 1, 2, 3].map(|i| record.get(i));
            let (Some(name), Some(contig), Some(start), Some(end)) = (name, contig, start, end)
            else {
                return Err(bad(format!("expected 4 fields, found {}", record.len())));
            };
            let start: u64 = start
                .parse()
                .map_err(|_| bad(format!("invalid start '{start}'")))?;
            let end: u64 = end
                .parse()
                .map_err(|_| bad(format!("invalid end '{end}'")))?;
            plan.entry(name.to_string())
                .or_default()
                .push(Interval::new(contig, start, end));
        }
        Ok(plan)
    }
}

#[cfg(test)]
#[path = "intervals_tests.rs"]
mod tests;
