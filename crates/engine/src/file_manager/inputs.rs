// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Post-task input treatment and gzip handling.

use super::TaskFileManager;
use crate::error::JobError;
use crate::fs_util;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use sj_core::InputFileTreatment;
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

impl TaskFileManager {
    /// Apply the job's input treatment to every job input. Returns where
    /// each surviving input ended up.
    pub fn handle_inputs(&mut self) -> Result<Vec<PathBuf>, JobError> {
        let inputs: Vec<PathBuf> = self.job_inputs.iter().cloned().collect();
        let mut kept = Vec::new();
        match self.treatment {
            InputFileTreatment::LeaveInPlace => {
                tracing::info!("leaving input files in place");
                kept = inputs;
            }
            InputFileTreatment::Delete => {
                for input in inputs {
                    if self.ledger.is_final_output(&input) {
                        kept.push(self.move_to_analysis_dir(&input)?);
                    } else if input.exists() {
                        fs_util::remove_path(&input).map_err(|e| JobError::io(&input, e))?;
                        if input.exists() {
                            return Err(JobError::DeleteFailed(input));
                        }
                        tracing::info!(path = %input.display(), "deleted input file");
                    }
                }
            }
            InputFileTreatment::Compress => {
                for input in inputs {
                    if !input.exists() {
                        tracing::warn!(path = %input.display(), "input missing, not compressing");
                        continue;
                    }
                    let compressed = if is_gzip(&input) {
                        input
                    } else {
                        let gz = compress_file(&input)?;
                        self.swap_files(&input, &gz);
                        fs::remove_file(&input).map_err(|e| JobError::io(&input, e))?;
                        if input.exists() {
                            return Err(JobError::DeleteFailed(input));
                        }
                        tracing::info!(path = %gz.display(), "compressed input file");
                        gz
                    };
                    kept.push(self.move_to_analysis_dir(&compressed)?);
                }
            }
        }
        Ok(kept)
    }

    /// Decompress `gz` into scratch once per task and record the step.
    pub fn decompress_file(&mut self, gz: &Path) -> Result<PathBuf, JobError> {
        if let Some(plain) = self.ledger.unzipped().get(gz) {
            if plain.exists() {
                return Ok(plain.clone());
            }
        }
        let name = gz
            .file_stem()
            .map(PathBuf::from)
            .ok_or_else(|| JobError::MissingInput(gz.to_path_buf()))?;
        let plain = self.staging.output_file(&name.to_string_lossy());
        gunzip(gz, &plain)?;

        let action = self.start_action("Decompressing");
        self.add_input(action, "Compressed File", gz)?;
        self.add_output(action, "Decompressed File", &plain, true)?;
        self.finish_action(action)?;
        self.add_intermediate_file(&plain);
        self.ledger.record_unzipped(gz, plain.clone());
        Ok(plain)
    }

    fn move_to_analysis_dir(&mut self, file: &Path) -> Result<PathBuf, JobError> {
        let Some(name) = file.file_name() else {
            return Ok(file.to_path_buf());
        };
        let dest = self.analysis_dir().join(name);
        if dest == file {
            return Ok(dest);
        }
        fs_util::move_file(file, &dest).map_err(|e| JobError::io(file, e))?;
        self.swap_files(file, &dest);
        tracing::info!(from = %file.display(), to = %dest.display(), "moved input to analysis directory");
        Ok(dest)
    }
}

pub(crate) fn is_gzip(path: &Path) -> bool {
    path.extension().is_some_and(|e| e == "gz" || e == "bgz")
}

/// Write `<src>.gz` next to `src`.
pub(crate) fn compress_file(src: &Path) -> Result<PathBuf, JobError> {
    let dest = fs_util::with_suffix(src, ".gz");
    let partial = fs_util::with_suffix(&dest, ".tmp");
    let result = (|| -> io::Result<()> {
        let mut reader = File::open(src)?;
        let mut encoder = GzEncoder::new(File::create(&partial)?, Compression::default());
        io::copy(&mut reader, &mut encoder)?;
        encoder.finish()?.sync_all()?;
        fs::rename(&partial, &dest)
    })();
    result.map_err(|e| {
        let _ = fs::remove_file(&partial);
        JobError::io(src, e)
    })?;
    Ok(dest)
}

pub(crate) fn gunzip(src: &Path, dest: &Path) -> Result<(), JobError> {
    let result = (|| -> io::Result<()> {
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut decoder = GzDecoder::new(File::open(src)?);
        let mut out = File::create(dest)?;
        io::copy(&mut decoder, &mut out)?;
        Ok(())
    })();
    result.map_err(|e| JobError::io(src, e))
}

#[cfg(test)]
#[path = "inputs_tests.rs"]
mod tests;
