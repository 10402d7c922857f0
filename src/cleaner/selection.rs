use std::collections::HashSet;

use crate::scanner::model::{FileId, ProblemFile, RiskLevel, ScanResult};

/// Predicate for bulk selection. Unset fields match everything.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SelectionFilter {
    /// Exact category label, compared case-insensitively
    pub category: Option<String>,
    /// Exact risk level
    pub risk: Option<RiskLevel>,
    /// Risk level ceiling (inclusive)
    pub max_risk: Option<RiskLevel>,
}

impl SelectionFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn category(category: impl Into<String>) -> Self {
        Self {
            category: Some(category.into()),
            ..Self::default()
        }
    }

    pub fn risk(risk: RiskLevel) -> Self {
        Self {
            risk: Some(risk),
            ..Self::default()
        }
    }

    pub fn with_risk(mut self, risk: RiskLevel) -> Self {
        self.risk = Some(risk);
        self
    }

    pub fn with_max_risk(mut self, max_risk: RiskLevel) -> Self {
        self.max_risk = Some(max_risk);
        self
    }

    pub fn matches(&self, file: &ProblemFile) -> bool {
        if let Some(ref category) = self.category {
            if !file.category().eq_ignore_ascii_case(category) {
                return false;
            }
        }
        if let Some(risk) = self.risk {
            if file.risk() != risk {
                return false;
            }
        }
        if let Some(max_risk) = self.max_risk {
            if file.risk() > max_risk {
                return false;
            }
        }
        true
    }
}

/// Tracks which files of the active scan are marked for deletion.
///
/// Owns the active `ScanResult` so the selection can never refer to a file
/// outside it. Operations on identities that are not (or no longer) part of
/// the result are silent no-ops. Not meant for concurrent mutation.
#[derive(Debug, Default)]
pub struct SelectionManager {
    result: ScanResult,
    selected: HashSet<FileId>,
}

impl SelectionManager {
    pub fn new(result: ScanResult) -> Self {
        Self {
            result,
            selected: HashSet::new(),
        }
    }

    /// Swap in a new scan. The old selection is meaningless and is cleared.
    pub fn replace_result(&mut self, result: ScanResult) {
        self.result = result;
        self.selected.clear();
    }

    pub fn result(&self) -> &ScanResult {
        &self.result
    }

    /// Returns true if the file was newly selected
    pub fn select(&mut self, id: FileId) -> bool {
        self.result.contains(id) && self.selected.insert(id)
    }

    /// Returns true if the file was selected before
    pub fn deselect(&mut self, id: FileId) -> bool {
        self.selected.remove(&id)
    }

    /// Flip selection; returns whether the file is selected afterwards
    pub fn toggle(&mut self, id: FileId) -> bool {
        if !self.result.contains(id) {
            return false;
        }
        if self.selected.remove(&id) {
            false
        } else {
            self.selected.insert(id);
            true
        }
    }

    pub fn is_selected(&self, id: FileId) -> bool {
        self.selected.contains(&id)
    }

    /// Select every file matching `filter`; returns how many were added
    pub fn select_all(&mut self, filter: &SelectionFilter) -> usize {
        let ids: Vec<FileId> = self
            .result
            .files()
            .iter()
            .filter(|f| filter.matches(f))
            .map(|f| f.id())
            .collect();
        ids.into_iter().filter(|id| self.selected.insert(*id)).count()
    }

    /// Deselect every file matching `filter`; returns how many were removed
    pub fn deselect_all(&mut self, filter: &SelectionFilter) -> usize {
        let ids: Vec<FileId> = self
            .result
            .files()
            .iter()
            .filter(|f| filter.matches(f))
            .map(|f| f.id())
            .collect();
        ids.into_iter().filter(|id| self.selected.remove(id)).count()
    }

    /// Default selection: every low-risk file
    pub fn select_defaults(&mut self) -> usize {
        self.select_all(&SelectionFilter::risk(RiskLevel::Low))
    }

    pub fn clear(&mut self) {
        self.selected.clear();
    }

    /// Selected files in discovery order
    pub fn current_selection(&self) -> Vec<&ProblemFile> {
        self.result
            .files()
            .iter()
            .filter(|f| self.selected.contains(&f.id()))
            .collect()
    }

    pub fn selected_count(&self) -> usize {
        self.selected.len()
    }

    pub fn selected_bytes(&self) -> u64 {
        self.current_selection().iter().map(|f| f.size()).sum()
    }

    /// Drop deleted files from both the result and the selection
    pub fn remove_deleted(&mut self, ids: &HashSet<FileId>) {
        for id in ids {
            self.selected.remove(id);
        }
        self.result.remove(ids);
    }
}
