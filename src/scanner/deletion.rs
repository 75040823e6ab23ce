//! Deletion executor: removes unused assets one by one and records each outcome.
//!
//! Pipeline: unused assets per category -> plan (images first, each group sorted
//! by path) -> delete in plan order -> one [`DeletionRecord`] per attempt.
//!
//! A failed removal never stops the run; it becomes a record carrying the
//! reason, and the executor moves on to the next candidate.

#![allow(missing_docs)]

use std::fmt;
use std::fs;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use crate::core::errors::SweepError;
use crate::logger::activity::{ActivityEvent, ActivityLogger};
use crate::scanner::category::AssetCategory;
use crate::scanner::walker::WalkedFile;

// ──────────────────── plan ────────────────────

/// One asset scheduled for removal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeletionCandidate {
    pub category: AssetCategory,
    pub file: WalkedFile,
}

/// Ordered list of removals.
#[derive(Debug, Clone, Default)]
pub struct DeletionPlan {
    pub candidates: Vec<DeletionCandidate>,
}

impl DeletionPlan {
    /// Build a plan from per-category unused sets.
    ///
    /// Categories are ordered image before audio; within a category candidates
    /// are sorted by the raw bytes of their display path, whatever order the
    /// filesystem produced them in.
    pub fn new(groups: Vec<(AssetCategory, Vec<WalkedFile>)>) -> Self {
        let mut candidates: Vec<DeletionCandidate> = groups
            .into_iter()
            .flat_map(|(category, files)| {
                files
                    .into_iter()
                    .map(move |file| DeletionCandidate { category, file })
            })
            .collect();
        candidates.sort_by(|a, b| {
            a.category
                .cmp(&b.category)
                .then_with(|| a.file.path.as_os_str().cmp(b.file.path.as_os_str()))
        });
        candidates.dedup_by(|a, b| a.category == b.category && a.file.path == b.file.path);
        Self { candidates }
    }
}

// ──────────────────── report types ────────────────────

/// Why a removal failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeletionError {
    pub path: PathBuf,
    /// Underlying OS error description.
    pub error: String,
    pub error_code: String,
    pub recoverable: bool,
}

/// Outcome of one removal attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeletionRecord {
    pub category: AssetCategory,
    pub path: PathBuf,
    pub outcome: Result<(), DeletionError>,
}

impl DeletionRecord {
    pub fn is_removed(&self) -> bool {
        self.outcome.is_ok()
    }
}

/// Human-readable report line:
/// `Removed unused image: img/b.png` or `Failed to remove img/b.png: <reason>`.
impl fmt::Display for DeletionRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.outcome {
            Ok(()) => write!(
                f,
                "Removed unused {}: {}",
                self.category,
                self.path.display()
            ),
            Err(err) => write!(f, "Failed to remove {}: {}", self.path.display(), err.error),
        }
    }
}

/// Summary after every candidate has been attempted.
#[derive(Debug, Clone, Default)]
pub struct DeletionReport {
    /// One record per candidate, in plan order.
    pub records: Vec<DeletionRecord>,
    pub items_deleted: usize,
    pub items_failed: usize,
    pub duration: Duration,
}

impl DeletionReport {
    pub fn failures(&self) -> impl Iterator<Item = &DeletionRecord> {
        self.records.iter().filter(|r| !r.is_removed())
    }
}

// ──────────────────── executor ────────────────────

/// Removes planned assets and logs each outcome.
pub struct DeletionExecutor<'a> {
    logger: &'a mut ActivityLogger,
}

impl<'a> DeletionExecutor<'a> {
    pub fn new(logger: &'a mut ActivityLogger) -> Self {
        Self { logger }
    }

    /// Attempt every candidate in plan order.
    pub fn execute(&mut self, plan: &DeletionPlan) -> DeletionReport {
        self.execute_with(plan, |_| {})
    }

    /// Like [`execute`](Self::execute), calling `observer` right after each attempt.
    pub fn execute_with<F>(&mut self, plan: &DeletionPlan, mut observer: F) -> DeletionReport
    where
        F: FnMut(&DeletionRecord),
    {
        let start = Instant::now();
        let mut report = DeletionReport::default();

        for candidate in &plan.candidates {
            let record = self.delete_one(candidate);
            if record.is_removed() {
                report.items_deleted += 1;
            } else {
                report.items_failed += 1;
            }
            observer(&record);
            report.records.push(record);
        }

        report.duration = start.elapsed();
        report
    }

    fn delete_one(&mut self, candidate: &DeletionCandidate) -> DeletionRecord {
        let category = candidate.category;
        let path = candidate.file.path.clone();

        let outcome = match fs::remove_file(&candidate.file.location) {
            Ok(()) => {
                self.logger.log(&ActivityEvent::AssetDeleted {
                    category: category.label().to_string(),
                    path: path.to_string_lossy().into_owned(),
                });
                Ok(())
            }
            Err(source) => {
                let error = source.to_string();
                let wrapped = SweepError::io(&path, source);
                let failure = DeletionError {
                    path: path.clone(),
                    error,
                    error_code: wrapped.code().to_string(),
                    recoverable: wrapped.is_retryable(),
                };
                self.logger.log(&ActivityEvent::AssetDeletionFailed {
                    category: category.label().to_string(),
                    path: path.to_string_lossy().into_owned(),
                    error_code: failure.error_code.clone(),
                    error_message: failure.error.clone(),
                });
                Err(failure)
            }
        };

        DeletionRecord {
            category,
            path,
            outcome,
        }
    }
}
