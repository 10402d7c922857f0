use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use crate::viz::breakdown::{self, DiskSpaceItem};

// ─── Core types ───────────────────────────────────────────────────────────────

/// Opaque identity of a discovered file. Generated at discovery time and
/// never reused, so a re-scan yields fresh identities for the same paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FileId(uuid::Uuid);

impl FileId {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl Default for FileId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for FileId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// How cautious the user should be before deleting a file.
/// Ordered `Low < Medium < High`.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    clap::ValueEnum,
)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub const ALL: [RiskLevel; 3] = [RiskLevel::Low, RiskLevel::Medium, RiskLevel::High];
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RiskLevel::Low => write!(f, "low"),
            RiskLevel::Medium => write!(f, "medium"),
            RiskLevel::High => write!(f, "high"),
        }
    }
}

/// One discovered candidate. Immutable once classified; selection state
/// lives in the `SelectionManager`, keyed by `id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProblemFile {
    id: FileId,
    name: String,
    path: PathBuf,
    size: u64,
    modified_at: DateTime<Utc>,
    category: String,
    risk: RiskLevel,
}

impl ProblemFile {
    pub fn new(
        path: PathBuf,
        size: u64,
        modified_at: DateTime<Utc>,
        category: impl Into<String>,
        risk: RiskLevel,
    ) -> Self {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());
        Self {
            id: FileId::new(),
            name,
            path,
            size,
            modified_at,
            category: category.into(),
            risk,
        }
    }

    pub fn id(&self) -> FileId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Absolute, canonical location; the deletion target
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn modified_at(&self) -> DateTime<Utc> {
        self.modified_at
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn risk(&self) -> RiskLevel {
        self.risk
    }
}

/// A root that could not be walked at all
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RootFailure {
    pub path: PathBuf,
    pub reason: String,
}

/// Output of one completed or cancelled scan
#[derive(Debug, Clone, Default, Serialize)]
pub struct ScanResult {
    files: Vec<ProblemFile>,
    buckets: Vec<DiskSpaceItem>,
    total_bytes: u64,
    total_count: usize,
    cancelled: bool,
    /// Paths that could not be read during the walk
    skipped: u64,
    root_failures: Vec<RootFailure>,
    duration_secs: f64,
    #[serde(skip)]
    index: HashMap<FileId, usize>,
}

impl ScanResult {
    pub fn new(
        files: Vec<ProblemFile>,
        skipped: u64,
        root_failures: Vec<RootFailure>,
        cancelled: bool,
        duration_secs: f64,
    ) -> Self {
        let mut result = Self {
            files,
            skipped,
            root_failures,
            cancelled,
            duration_secs,
            ..Default::default()
        };
        result.recalculate();
        result
    }

    /// Recompute totals, buckets and the identity index from `files`
    fn recalculate(&mut self) {
        self.total_bytes = self.files.iter().map(|f| f.size).sum();
        self.total_count = self.files.len();
        self.buckets = breakdown::aggregate(&self.files);
        self.index = self
            .files
            .iter()
            .enumerate()
            .map(|(i, f)| (f.id, i))
            .collect();
    }

    /// Drop files from the active result, e.g. after they were deleted.
    /// Unknown identities are ignored.
    pub fn remove(&mut self, ids: &HashSet<FileId>) -> usize {
        let before = self.files.len();
        self.files.retain(|f| !ids.contains(&f.id));
        let removed = before - self.files.len();
        if removed > 0 {
            self.recalculate();
        }
        removed
    }

    /// Files in discovery order
    pub fn files(&self) -> &[ProblemFile] {
        &self.files
    }

    pub fn get(&self, id: FileId) -> Option<&ProblemFile> {
        self.index.get(&id).map(|&i| &self.files[i])
    }

    pub fn contains(&self, id: FileId) -> bool {
        self.index.contains_key(&id)
    }

    pub fn files_by_risk(&self, risk: RiskLevel) -> Vec<&ProblemFile> {
        self.files.iter().filter(|f| f.risk == risk).collect()
    }

    pub fn buckets(&self) -> &[DiskSpaceItem] {
        &self.buckets
    }

    pub fn total_bytes(&self) -> u64 {
        self.total_bytes
    }

    pub fn total_count(&self) -> usize {
        self.total_count
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }

    pub fn skipped(&self) -> u64 {
        self.skipped
    }

    pub fn root_failures(&self) -> &[RootFailure] {
        &self.root_failures
    }

    pub fn duration_secs(&self) -> f64 {
        self.duration_secs
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(path: &str, size: u64, category: &str, risk: RiskLevel) -> ProblemFile {
        ProblemFile::new(PathBuf::from(path), size, Utc::now(), category, risk)
    }

    #[test]
    fn test_risk_levels_are_ordered() {
        assert!(RiskLevel::Low < RiskLevel::Medium);
        assert!(RiskLevel::Medium < RiskLevel::High);
        assert_eq!(RiskLevel::ALL.iter().max(), Some(&RiskLevel::High));
    }

    #[test]
    fn test_identities_are_unique() {
        let a = file("/tmp/a", 1, "Temporary", RiskLevel::Low);
        let b = file("/tmp/a", 1, "Temporary", RiskLevel::Low);
        assert_ne!(a.id(), b.id());
        assert_eq!(a.name(), "a");
    }

    #[test]
    fn test_scan_result_totals() {
        let result = ScanResult::new(
            vec![
                file("/c/a", 1000, "Cache", RiskLevel::Low),
                file("/l/b", 3000, "Logs", RiskLevel::Medium),
            ],
            2,
            Vec::new(),
            false,
            0.1,
        );
        assert_eq!(result.total_bytes(), 4000);
        assert_eq!(result.total_count(), 2);
        assert_eq!(result.skipped(), 2);
        assert_eq!(result.buckets().len(), 2);
        assert_eq!(result.files_by_risk(RiskLevel::Low).len(), 1);
    }

    #[test]
    fn test_remove_recalculates_and_ignores_unknown() {
        let a = file("/c/a", 1000, "Cache", RiskLevel::Low);
        let b = file("/l/b", 3000, "Logs", RiskLevel::Medium);
        let a_id = a.id();
        let mut result = ScanResult::new(vec![a, b], 0, Vec::new(), false, 0.0);

        let mut ids = HashSet::new();
        ids.insert(a_id);
        ids.insert(FileId::new());
        assert_eq!(result.remove(&ids), 1);

        assert!(!result.contains(a_id));
        assert!(result.get(a_id).is_none());
        assert_eq!(result.total_bytes(), 3000);
        assert_eq!(result.buckets().len(), 1);
        assert_eq!(result.buckets()[0].name, "Logs");
        assert!((result.buckets()[0].percentage - 100.0).abs() < 1e-9);
    }
}
