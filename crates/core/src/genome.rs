// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Reference genome, sequence dictionary, and interval types.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DictionaryError {
    #[error("line {line}: @SQ record without {field}")]
    MissingField { line: usize, field: &'static str },
    #[error("line {line}: invalid sequence length '{value}'")]
    BadLength { line: usize, value: String },
    #[error("duplicate sequence name: {0}")]
    Duplicate(String),
}

/// A 1-based closed genomic interval.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Interval {
    pub contig: String,
    pub start: u64,
    pub end: u64,
}

impl Interval {
    pub fn new(contig: impl Into<String>, start: u64, end: u64) -> Self {
        Self {
            contig: contig.into(),
            start,
            end,
        }
    }

    pub fn len(&self) -> u64 {
        (self.end + 1).saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl std::fmt::Display for Interval {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}-{}", self.contig, self.start, self.end)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SequenceRecord {
    pub name: String,
    pub length: u64,
}

/// Ordered contigs of a reference genome.
///
/// Dictionary order is the canonical contig order for scatter and gather.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SequenceDictionary {
    records: Vec<SequenceRecord>,
}

impl SequenceDictionary {
    pub fn from_records(
        records: impl IntoIterator<Item = (impl Into<String>, u64)>,
    ) -> Result<Self, DictionaryError> {
        let mut dict = Self::default();
        for (name, length) in records {
            dict.push(name.into(), length)?;
        }
        Ok(dict)
    }

    /// Parse the `@SQ` lines of a SAM-style `.dict` header.
    pub fn parse(text: &str) -> Result<Self, DictionaryError> {
        let mut dict = Self::default();
        for (idx, line) in text.lines().enumerate() {
            let line_no = idx + 1;
            let mut fields = line.split('\t');
            if fields.next() != Some("@SQ") {
                continue;
            }
            let mut name = None;
            let mut length = None;
            for field in fields {
                if let Some(v) = field.strip_prefix("SN:") {
                    name = Some(v.to_string());
                } else if let Some(v) = field.strip_prefix("LN:") {
                    length = Some(v.parse::<u64>().map_err(|_| DictionaryError::BadLength {
                        line: line_no,
                        value: v.to_string(),
                    })?);
                }
            }
            let name = name.ok_or(DictionaryError::MissingField {
                line: line_no,
                field: "SN",
            })?;
            let length = length.ok_or(DictionaryError::MissingField {
                line: line_no,
                field: "LN",
            })?;
            dict.push(name, length)?;
        }
        Ok(dict)
    }

    fn push(&mut self, name: String, length: u64) -> Result<(), DictionaryError> {
        if self.get(&name).is_some() {
            return Err(DictionaryError::Duplicate(name));
        }
        self.records.push(SequenceRecord { name, length });
        Ok(())
    }

    pub fn records(&self) -> &[SequenceRecord] {
        &self.records
    }

    pub fn get(&self, name: &str) -> Option<&SequenceRecord> {
        self.records.iter().find(|r| r.name == name)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn total_length(&self) -> u64 {
        self.records.iter().map(|r| r.length).sum()
    }

    /// Dictionary position of a contig, for ordering per-contig results.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.records.iter().position(|r| r.name == name)
    }
}

/// Job-scoped reference genome handle, copied to split children.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferenceGenome {
    pub name: String,
    pub fasta: PathBuf,
    /// Defaults to the FASTA path with a `.dict` extension.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dictionary: Option<PathBuf>,
}

impl ReferenceGenome {
    pub fn new(name: impl Into<String>, fasta: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            fasta: fasta.into(),
            dictionary: None,
        }
    }

    pub fn dictionary_path(&self) -> PathBuf {
        self.dictionary
            .clone()
            .unwrap_or_else(|| self.fasta.with_extension("dict"))
    }
}

#[cfg(test)]
#[path = "genome_tests.rs"]
mod tests;
