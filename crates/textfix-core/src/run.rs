use crate::backup::{snapshot, snapshot_at, BackupSnapshot};
use crate::error::Result;
use crate::job::Job;
use crate::replace::{apply_replacements, preview_replacements};
use crate::rules::AppliedRule;
use crate::select::select_files;
use chrono::NaiveDateTime;
use serde::Serialize;
use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// Options / report types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Compute the report without taking a backup or writing files.
    pub dry_run: bool,
    /// Backup timestamp override. Defaults to the current local time.
    pub now: Option<NaiveDateTime>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FileOutcome {
    Modified { applied: Vec<AppliedRule> },
    Unchanged,
    Failed { error: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileReport {
    /// Path relative to the job's target directory.
    pub path: PathBuf,
    #[serde(flatten)]
    pub outcome: FileOutcome,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub job: String,
    pub target: PathBuf,
    pub dry_run: bool,
    pub files_scanned: usize,
    pub files_modified: usize,
    pub files_failed: usize,
    /// Number of rule applications across all files.
    pub total_substitutions: usize,
    /// Number of individual occurrences replaced across all files.
    pub total_occurrences: usize,
    pub backup: Option<BackupSnapshot>,
    pub files: Vec<FileReport>,
}

impl RunReport {
    pub fn modified(&self) -> impl Iterator<Item = (&Path, &[AppliedRule])> {
        self.files.iter().filter_map(|f| match &f.outcome {
            FileOutcome::Modified { applied } => Some((f.path.as_path(), applied.as_slice())),
            _ => None,
        })
    }

    pub fn failures(&self) -> impl Iterator<Item = (&Path, &str)> {
        self.files.iter().filter_map(|f| match &f.outcome {
            FileOutcome::Failed { error } => Some((f.path.as_path(), error.as_str())),
            _ => None,
        })
    }
}

// ---------------------------------------------------------------------------
// run
// ---------------------------------------------------------------------------

/// Execute `job` against `root`.
///
/// Backup, then scan, then rewrite each selected file. A backup failure is
/// returned as an error before any file is read. Per-file read or write
/// failures are recorded in the report and the remaining files still run.
pub fn run(root: &Path, job: &Job, opts: &RunOptions) -> Result<RunReport> {
    let target = job.target_dir(root);

    let backup = if opts.dry_run {
        None
    } else {
        let snap = match opts.now {
            Some(at) => snapshot_at(&target, &job.backup_prefix, at)?,
            None => snapshot(&target, &job.backup_prefix)?,
        };
        Some(snap)
    };

    let selected = select_files(&target, &job.filter);
    tracing::debug!(job = %job.name, files = selected.len(), "selected files");

    let mut report = RunReport {
        job: job.name.clone(),
        target: target.clone(),
        dry_run: opts.dry_run,
        files_scanned: selected.len(),
        files_modified: 0,
        files_failed: 0,
        total_substitutions: 0,
        total_occurrences: 0,
        backup,
        files: Vec::with_capacity(selected.len()),
    };

    for path in selected {
        let relative = path.strip_prefix(&target).unwrap_or(&path).to_path_buf();
        let rules = job.rules.rules_for(&relative);

        let result = if opts.dry_run {
            preview_replacements(&path, rules)
        } else {
            apply_replacements(&path, rules)
        };

        let outcome = match result {
            Ok(change) if change.changed => {
                report.files_modified += 1;
                report.total_substitutions += change.applied.len();
                report.total_occurrences += change.applied.iter().map(|a| a.occurrences).sum::<usize>();
                tracing::debug!(path = %relative.display(), rules = change.applied.len(), "modified");
                FileOutcome::Modified {
                    applied: change.applied,
                }
            }
            Ok(_) => FileOutcome::Unchanged,
            Err(e) => {
                report.files_failed += 1;
                tracing::warn!(path = %path.display(), error = %e, "skipping file");
                FileOutcome::Failed {
                    error: e.to_string(),
                }
            }
        };

        report.files.push(FileReport {
            path: relative,
            outcome,
        });
    }

    Ok(report)
}

// ---------------------------------------------------------------------------
// check
// ---------------------------------------------------------------------------

/// A selected file that still contains rule patterns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Remaining {
    pub path: PathBuf,
    /// `(pattern, occurrences)` in rule order.
    pub patterns: Vec<(String, usize)>,
}

/// A selected file `check` could not read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Unreadable {
    pub path: PathBuf,
    pub error: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CheckReport {
    pub files_scanned: usize,
    pub remaining: Vec<Remaining>,
    pub unreadable: Vec<Unreadable>,
}

impl CheckReport {
    /// Every selected file was read and none still holds a pattern.
    pub fn is_clean(&self) -> bool {
        self.remaining.is_empty() && self.unreadable.is_empty()
    }
}

/// Find selected files that still contain any of the patterns that apply to
/// them. Files that cannot be read are listed separately so they never pass
/// for clean ones.
pub fn check(root: &Path, job: &Job) -> CheckReport {
    let target = job.target_dir(root);
    let selected = select_files(&target, &job.filter);
    let mut report = CheckReport {
        files_scanned: selected.len(),
        ..CheckReport::default()
    };

    for path in selected {
        let relative = path.strip_prefix(&target).unwrap_or(&path).to_path_buf();
        let content = match std::fs::read_to_string(&path) {
            Ok(c) => c,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "cannot read file");
                report.unreadable.push(Unreadable {
                    path: relative,
                    error: e.to_string(),
                });
                continue;
            }
        };

        let patterns: Vec<(String, usize)> = job
            .rules
            .rules_for(&relative)
            .into_iter()
            .filter_map(|r| {
                let n = content.matches(r.pattern()).count();
                (n > 0).then(|| (r.pattern().to_string(), n))
            })
            .collect();

        if !patterns.is_empty() {
            report.remaining.push(Remaining {
                path: relative,
                patterns,
            });
        }
    }

    report
}
