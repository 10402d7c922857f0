use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use super::selection::SelectionManager;
use crate::common::errors::ReclaimError;
use crate::common::safety;
use crate::scanner::model::FileId;
use crate::scanner::progress::CancelToken;

/// Files removed per batch between cancellation checks
pub const DELETE_BATCH: usize = 64;

/// Session-wide cap on deleted bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Quota {
    Unlimited,
    Limited(u64),
}

impl Quota {
    /// Licensed users are unlimited; everyone else gets the trial cap
    pub fn from_entitlement(licensed: bool, trial_bytes: u64) -> Self {
        if licensed {
            Quota::Unlimited
        } else {
            Quota::Limited(trial_bytes)
        }
    }
}

/// Why a selected file was not deleted
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// Vanished since the scan
    NotFound,
    PermissionDenied,
    /// Locked or busy
    InUse,
    /// On the protected-path list; never touched
    Protected,
    Failed(String),
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::NotFound => write!(f, "not found"),
            SkipReason::PermissionDenied => write!(f, "permission denied"),
            SkipReason::InUse => write!(f, "in use"),
            SkipReason::Protected => write!(f, "protected path"),
            SkipReason::Failed(msg) => write!(f, "{}", msg),
        }
    }
}

/// Result of deleting one file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeletionOutcome {
    /// Bytes reclaimed, measured right before removal
    Deleted(u64),
    Skipped(SkipReason),
}

/// Summary of one delete call
#[derive(Debug, Clone, Default, Serialize)]
pub struct DeletionReport {
    pub deleted_count: usize,
    pub deleted_bytes: u64,
    pub deleted: Vec<FileId>,
    pub skipped: Vec<(FileId, SkipReason)>,
    /// Stopped early; files not yet processed remain selected
    pub cancelled: bool,
    /// Nothing was touched on disk
    pub dry_run: bool,
}

impl DeletionReport {
    fn record(&mut self, id: FileId, outcome: DeletionOutcome) {
        match outcome {
            DeletionOutcome::Deleted(bytes) => {
                self.deleted_count += 1;
                self.deleted_bytes += bytes;
                self.deleted.push(id);
            }
            DeletionOutcome::Skipped(reason) => self.skipped.push((id, reason)),
        }
    }

    /// Skipped files that had already vanished
    pub fn not_found_count(&self) -> usize {
        self.skipped
            .iter()
            .filter(|(_, r)| *r == SkipReason::NotFound)
            .count()
    }
}

/// Removes selected files under a session quota.
///
/// One executor lives for a whole session: bytes it deleted count against
/// the quota of later calls.
#[derive(Debug)]
pub struct DeletionExecutor {
    quota: Quota,
    session_deleted: u64,
    max_concurrency: usize,
    cancel: CancelToken,
}

impl DeletionExecutor {
    pub fn new(quota: Quota) -> Self {
        Self {
            quota,
            session_deleted: 0,
            max_concurrency: 4,
            cancel: CancelToken::new(),
        }
    }

    pub fn with_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = max_concurrency.max(1);
        self
    }

    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    pub fn quota(&self) -> Quota {
        self.quota
    }

    /// Bytes deleted by this executor so far
    pub fn session_deleted(&self) -> u64 {
        self.session_deleted
    }

    /// Bytes still deletable this session, `None` when unlimited
    pub fn remaining_quota(&self) -> Option<u64> {
        match self.quota {
            Quota::Unlimited => None,
            Quota::Limited(cap) => Some(cap.saturating_sub(self.session_deleted)),
        }
    }

    fn check_quota(&self, requested: u64) -> Result<(), ReclaimError> {
        match self.remaining_quota() {
            Some(allowed) if requested > allowed => {
                warn!(
                    "Rejecting deletion of {} bytes, only {} allowed this session",
                    requested, allowed
                );
                Err(ReclaimError::QuotaExceeded { requested, allowed })
            }
            _ => Ok(()),
        }
    }

    /// What `delete` would do, without touching the disk
    pub fn preview(&self, selection: &SelectionManager) -> Result<DeletionReport, ReclaimError> {
        let files = selection.current_selection();
        let requested: u64 = files.iter().map(|f| f.size()).sum();
        self.check_quota(requested)?;

        let mut report = DeletionReport {
            dry_run: true,
            ..Default::default()
        };
        for file in files {
            let outcome = if safety::is_protected(file.path()) {
                DeletionOutcome::Skipped(SkipReason::Protected)
            } else {
                DeletionOutcome::Deleted(file.size())
            };
            report.record(file.id(), outcome);
        }
        Ok(report)
    }

    /// Delete every selected file.
    ///
    /// The whole call is rejected with `QuotaExceeded` before anything is
    /// removed if the selection is larger than the remaining quota.
    /// Otherwise each file is handled on its own: failures land in
    /// `skipped` and never stop the batch. Deleted files are dropped from
    /// the selection and the active result; skipped ones stay selected.
    pub fn delete(&mut self, selection: &mut SelectionManager) -> Result<DeletionReport, ReclaimError> {
        let targets: Vec<(FileId, PathBuf)> = selection
            .current_selection()
            .iter()
            .map(|f| (f.id(), f.path().to_path_buf()))
            .collect();
        let requested = selection.selected_bytes();
        self.check_quota(requested)?;

        info!("Deleting {} file(s), {} bytes", targets.len(), requested);

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.max_concurrency)
            .thread_name(|i| format!("reclaim-delete-{}", i))
            .build()?;

        let mut report = DeletionReport::default();
        for chunk in targets.chunks(DELETE_BATCH) {
            if self.cancel.is_cancelled() {
                debug!(
                    "Deletion cancelled with {} file(s) processed",
                    report.deleted_count + report.skipped.len()
                );
                report.cancelled = true;
                break;
            }
            let outcomes: Vec<(FileId, DeletionOutcome)> = pool.install(|| {
                chunk
                    .par_iter()
                    .map(|(id, path)| (*id, delete_file(path)))
                    .collect()
            });
            for (id, outcome) in outcomes {
                report.record(id, outcome);
            }
        }

        self.session_deleted += report.deleted_bytes;
        let deleted: HashSet<FileId> = report.deleted.iter().copied().collect();
        selection.remove_deleted(&deleted);

        info!(
            "Deleted {} file(s), {} bytes; {} skipped",
            report.deleted_count,
            report.deleted_bytes,
            report.skipped.len()
        );
        Ok(report)
    }
}

/// Remove one regular file, classifying any failure
pub fn delete_file(path: &Path) -> DeletionOutcome {
    if safety::is_protected(path) {
        return DeletionOutcome::Skipped(SkipReason::Protected);
    }

    let metadata = match std::fs::symlink_metadata(path) {
        Ok(m) => m,
        Err(e) => return DeletionOutcome::Skipped(skip_reason(&e)),
    };
    if !metadata.is_file() {
        return DeletionOutcome::Skipped(SkipReason::Failed("not a regular file".into()));
    }
    let bytes = metadata.len();

    match std::fs::remove_file(path) {
        Ok(()) => {
            debug!("Deleted {}", path.display());
            DeletionOutcome::Deleted(bytes)
        }
        Err(e) => {
            debug!("Could not delete {}: {}", path.display(), e);
            DeletionOutcome::Skipped(skip_reason(&e))
        }
    }
}

/// OS error codes meaning "busy / locked by another process"
#[cfg(windows)]
const IN_USE_CODES: &[i32] = &[32, 33]; // ERROR_SHARING_VIOLATION, ERROR_LOCK_VIOLATION
#[cfg(not(windows))]
const IN_USE_CODES: &[i32] = &[16, 26]; // EBUSY, ETXTBSY

fn skip_reason(e: &std::io::Error) -> SkipReason {
    if e.raw_os_error().is_some_and(|code| IN_USE_CODES.contains(&code)) {
        return SkipReason::InUse;
    }
    match e.kind() {
        std::io::ErrorKind::NotFound => SkipReason::NotFound,
        std::io::ErrorKind::PermissionDenied => SkipReason::PermissionDenied,
        _ => SkipReason::Failed(e.to_string()),
    }
}
