//! The accepted-record dataset and its on-disk form.
//!
//! `PipelineState` is the only writer of the output file. The whole dataset
//! is rewritten on every flush, so an interrupted run leaves the last flushed
//! version intact and a rerun resumes from it.

mod writer;

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::core::errors::SetupError;
use crate::synth::{validate, QaCandidate, Vocabulary};

pub use writer::write_json_atomic;

/// One line of the training set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QaRecord {
    pub input: String,
    pub context: String,
    pub output: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

pub struct PipelineState {
    path: PathBuf,
    records: Vec<QaRecord>,
    seen: HashSet<String>,
    flush_every: usize,
    pending: usize,
    source_tag: Option<String>,
}

impl PipelineState {
    /// Reads the existing output, if any, and seeds the seen-question set
    /// from it. A file that exists but is not a record array is an error.
    pub fn load(path: &Path, flush_every: usize) -> Result<Self, SetupError> {
        let records = if path.exists() {
            let raw = fs::read_to_string(path).map_err(|err| SetupError::io(path, err))?;
            if raw.trim().is_empty() {
                Vec::new()
            } else {
                serde_json::from_str::<Vec<QaRecord>>(&raw)
                    .map_err(|err| SetupError::json(path, err))?
            }
        } else {
            Vec::new()
        };

        let seen: HashSet<String> = records.iter().map(|r| r.input.clone()).collect();
        if !records.is_empty() {
            tracing::info!(
                "Resuming from {} existing records in {}",
                records.len(),
                path.display()
            );
        }

        Ok(Self {
            path: path.to_path_buf(),
            records,
            seen,
            flush_every: flush_every.max(1),
            pending: 0,
            source_tag: None,
        })
    }

    /// Tags every record accepted from now on with `source`.
    pub fn with_source_tag(mut self, source: Option<String>) -> Self {
        self.source_tag = source;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn records(&self) -> &[QaRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn contains(&self, question: &str) -> bool {
        self.seen.contains(question)
    }

    /// Validates `candidate` against the current state and appends it.
    ///
    /// Returns `Ok(false)` when the candidate was rejected. Errors only come
    /// from a failed flush.
    pub fn accept(
        &mut self,
        candidate: QaCandidate,
        vocabulary: Option<&Vocabulary>,
    ) -> Result<bool, SetupError> {
        if let Err(rejection) = validate(&candidate, &self.seen, vocabulary) {
            tracing::debug!("Rejected '{}': {}", candidate.question, rejection);
            return Ok(false);
        }
        let Some(output) = candidate.answer.text().map(str::to_string) else {
            return Ok(false);
        };

        self.seen.insert(candidate.question.clone());
        self.records.push(QaRecord {
            input: candidate.question,
            context: candidate.context,
            output,
            source: self.source_tag.clone(),
        });
        self.pending += 1;

        if self.pending >= self.flush_every {
            self.flush()?;
        }
        Ok(true)
    }

    /// Writes the full dataset. A no-op when nothing changed since the last
    /// flush and the file already exists.
    pub fn flush(&mut self) -> Result<(), SetupError> {
        if self.pending == 0 && self.path.exists() {
            return Ok(());
        }
        write_json_atomic(&self.path, &self.records)?;
        tracing::debug!("Saved {} records to {}", self.records.len(), self.path.display());
        self.pending = 0;
        Ok(())
    }
}
