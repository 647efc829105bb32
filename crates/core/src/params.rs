// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job parameters: a string map with typed accessors for the keys the
//! engine understands.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use thiserror::Error;

/// Parameter keys read by the engine.
pub mod keys {
    pub const DELETE_INTERMEDIATE_FILES: &str = "deleteIntermediateFiles";
    pub const COPY_INPUTS_LOCALLY: &str = "copyInputsLocally";
    pub const INPUT_FILE_TREATMENT: &str = "inputFileTreatment";
    pub const SCATTER_METHOD: &str = "scatterGatherMethod";
    pub const BASES_PER_JOB: &str = "scatterGather.basesPerJob";
    pub const ALLOW_SPLIT_CHROMOSOMES: &str = "scatterGather.allowSplitChromosomes";
    pub const MAX_CONTIGS_PER_JOB: &str = "scatterGather.maxContigsPerJob";
    pub const TOTAL_JOBS: &str = "scatterGather.totalJobs";
}

#[derive(Debug, Error)]
pub enum ParamError {
    #[error("invalid value for {key}: '{value}'")]
    Invalid { key: String, value: String },
    #[error("missing required parameter: {0}")]
    Missing(String),
    #[error("parameter file must contain a JSON object")]
    NotAnObject,
    #[error("invalid parameter JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("failed to read parameter file: {0}")]
    Io(#[from] std::io::Error),
}

/// What happens to a job's original inputs once processing has derived
/// new files from them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum InputFileTreatment {
    #[default]
    LeaveInPlace,
    Delete,
    Compress,
}

crate::simple_display! {
    InputFileTreatment {
        LeaveInPlace => "leaveInPlace",
        Delete => "delete",
        Compress => "compress",
    }
}

/// How a variant-processing job is scattered across child jobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ScatterGatherMethod {
    #[default]
    None,
    Contig,
    Chunked,
    FixedJobs,
}

crate::simple_display! {
    ScatterGatherMethod {
        None => "none",
        Contig => "contig",
        Chunked => "chunked",
        FixedJobs => "fixedJobs",
    }
}

/// Settings for `chunked` and `fixedJobs` scatter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScatterSettings {
    /// Target megabases per chunked job.
    pub megabases_per_job: Option<u64>,
    pub allow_split_chromosomes: bool,
    pub max_contigs_per_job: Option<usize>,
    pub total_jobs: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobParams(BTreeMap<String, String>);

impl JobParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a JSON object. Scalars are stored as strings, nulls are
    /// dropped, and nested values keep their compact JSON text.
    pub fn from_json_str(json: &str) -> Result<Self, ParamError> {
        let value: serde_json::Value = serde_json::from_str(json)?;
        let serde_json::Value::Object(map) = value else {
            return Err(ParamError::NotAnObject);
        };
        let params = map
            .into_iter()
            .filter_map(|(k, v)| {
                let text = match v {
                    serde_json::Value::Null => return None,
                    serde_json::Value::String(s) => s,
                    other => other.to_string(),
                };
                Some((k, text))
            })
            .collect();
        Ok(Self(params))
    }

    pub fn load(path: &Path) -> Result<Self, ParamError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// True only when the value is the literal `true`.
    pub fn flag(&self, key: &str) -> bool {
        self.get(key)
            .is_some_and(|v| v.trim().eq_ignore_ascii_case("true"))
    }

    pub fn flag_or(&self, key: &str, default: bool) -> Result<bool, ParamError> {
        match self.get(key).map(str::trim) {
            None | Some("") => Ok(default),
            Some(v) if v.eq_ignore_ascii_case("true") => Ok(true),
            Some(v) if v.eq_ignore_ascii_case("false") => Ok(false),
            Some(v) => Err(invalid(key, v)),
        }
    }

    pub fn int(&self, key: &str) -> Result<Option<i64>, ParamError> {
        match self.get(key).map(str::trim) {
            None | Some("") => Ok(None),
            Some(v) => v.parse().map(Some).map_err(|_| invalid(key, v)),
        }
    }

    /// Entries whose key starts with `prefix` (e.g. `readset_`), with the
    /// prefix stripped.
    pub fn prefixed<'a>(&'a self, prefix: &'a str) -> impl Iterator<Item = (&'a str, &'a str)> {
        self.0
            .iter()
            .filter_map(move |(k, v)| k.strip_prefix(prefix).map(|rest| (rest, v.as_str())))
    }

    pub fn delete_intermediate_files(&self) -> bool {
        self.flag(keys::DELETE_INTERMEDIATE_FILES)
    }

    pub fn copy_inputs_locally(&self) -> bool {
        self.flag(keys::COPY_INPUTS_LOCALLY)
    }

    pub fn input_file_treatment(&self) -> Result<InputFileTreatment, ParamError> {
        match self.get(keys::INPUT_FILE_TREATMENT).map(str::trim) {
            None | Some("") | Some("none") | Some("leaveInPlace") => {
                Ok(InputFileTreatment::LeaveInPlace)
            }
            Some("delete") => Ok(InputFileTreatment::Delete),
            Some("compress") => Ok(InputFileTreatment::Compress),
            Some(v) => Err(invalid(keys::INPUT_FILE_TREATMENT, v)),
        }
    }

    pub fn scatter_method(&self) -> Result<ScatterGatherMethod, ParamError> {
        match self.get(keys::SCATTER_METHOD).map(str::trim) {
            None | Some("") | Some("none") => Ok(ScatterGatherMethod::None),
            Some("contig") => Ok(ScatterGatherMethod::Contig),
            Some("chunked") => Ok(ScatterGatherMethod::Chunked),
            Some("fixedJobs") => Ok(ScatterGatherMethod::FixedJobs),
            Some(v) => Err(invalid(keys::SCATTER_METHOD, v)),
        }
    }

    pub fn scatter_settings(&self) -> Result<ScatterSettings, ParamError> {
        let positive = |key: &str| -> Result<Option<u64>, ParamError> {
            match self.int(key)? {
                None => Ok(None),
                Some(n) if n > 0 => Ok(Some(n as u64)),
                Some(n) => Err(invalid(key, &n.to_string())),
            }
        };
        // -1 and 0 both mean no limit
        let max_contigs = match self.int(keys::MAX_CONTIGS_PER_JOB)? {
            Some(n) if n > 0 => Some(n as usize),
            _ => None,
        };
        Ok(ScatterSettings {
            megabases_per_job: positive(keys::BASES_PER_JOB)?,
            allow_split_chromosomes: self.flag_or(keys::ALLOW_SPLIT_CHROMOSOMES, true)?,
            max_contigs_per_job: max_contigs,
            total_jobs: positive(keys::TOTAL_JOBS)?,
        })
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for JobParams {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

fn invalid(key: &str, value: &str) -> ParamError {
    ParamError::Invalid {
        key: key.to_string(),
        value: value.to_string(),
    }
}

#[cfg(test)]
#[path = "params_tests.rs"]
mod tests;
