use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::common::errors::ReclaimError;

/// A regular file that passed the exclusion and size filters
#[derive(Debug, Clone, PartialEq)]
pub struct WalkEntry {
    pub path: PathBuf,
    pub size: u64,
    pub modified_at: DateTime<Utc>,
}

/// Paths the walker never descends into or reports.
///
/// - entries containing `*`, `?` or `[` are glob patterns matched against
///   the full path
/// - absolute plain entries exclude that path and everything below it
/// - relative plain entries exclude any path with a component of that name
#[derive(Debug, Clone, Default)]
pub struct Exclusions {
    globs: Vec<glob::Pattern>,
    prefixes: Vec<PathBuf>,
    names: Vec<String>,
}

impl Exclusions {
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> Self {
        let mut rules = Self::default();
        for raw in patterns {
            let raw = raw.as_ref().trim();
            if raw.is_empty() {
                continue;
            }
            if raw.contains(['*', '?', '[']) {
                match glob::Pattern::new(raw) {
                    Ok(p) => rules.globs.push(p),
                    Err(e) => tracing::warn!("Ignoring invalid exclude pattern '{}': {}", raw, e),
                }
            } else if Path::new(raw).is_absolute() {
                rules.prefixes.push(PathBuf::from(raw));
            } else {
                rules.names.push(raw.to_string());
            }
        }
        rules
    }

    pub fn is_empty(&self) -> bool {
        self.globs.is_empty() && self.prefixes.is_empty() && self.names.is_empty()
    }

    pub fn is_excluded(&self, path: &Path) -> bool {
        if self.prefixes.iter().any(|p| path.starts_with(p)) {
            return true;
        }
        if !self.names.is_empty()
            && path
                .components()
                .any(|c| self.names.iter().any(|n| c.as_os_str() == n.as_str()))
        {
            return true;
        }
        self.globs.iter().any(|g| g.matches_path(path))
    }
}

/// Walks root directories for regular files at or above a size threshold.
///
/// Symlinks are never followed. Excluded directories are pruned before
/// they are read.
#[derive(Debug, Clone)]
pub struct Walker {
    exclusions: Exclusions,
    min_size: u64,
}

impl Walker {
    pub fn new(exclusions: Exclusions, min_size: u64) -> Self {
        Self {
            exclusions,
            min_size,
        }
    }

    /// Start a fresh walk of `root`.
    ///
    /// Fails with `RootUnavailable` if the root is missing or not a
    /// directory. The root is canonicalized so every emitted path is
    /// absolute.
    pub fn walk(&self, root: &Path) -> Result<Walk<'_>, ReclaimError> {
        let unavailable = |reason: String| ReclaimError::RootUnavailable {
            path: root.to_path_buf(),
            reason,
        };

        let meta = std::fs::metadata(root).map_err(|e| unavailable(e.to_string()))?;
        if !meta.is_dir() {
            return Err(unavailable("not a directory".into()));
        }
        let canonical = std::fs::canonicalize(root).map_err(|e| unavailable(e.to_string()))?;

        let inner = WalkDir::new(&canonical)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter();

        Ok(Walk {
            inner,
            walker: self,
            skipped: 0,
            examined: 0,
            visited: 0,
        })
    }
}

/// A single pass over one root. Lazily yields matching files; per-path
/// errors are counted in `skipped` and never stop the walk.
pub struct Walk<'a> {
    inner: walkdir::IntoIter,
    walker: &'a Walker,
    skipped: u64,
    examined: u64,
    visited: u64,
}

/// Outcome of looking at one directory entry
enum Step {
    Found(WalkEntry),
    Passed,
    Done,
}

impl Walk<'_> {
    /// Paths that could not be read so far
    pub fn skipped(&self) -> u64 {
        self.skipped
    }

    /// Regular files looked at so far, whether or not they met the threshold
    pub fn examined(&self) -> u64 {
        self.examined
    }

    /// Pull up to `max_files` matches into `batch`, visiting at most
    /// `max_visited` directory entries. Returns false once the walk is
    /// exhausted.
    ///
    /// Callers that need to react while the walk is running (cancellation,
    /// progress) use this instead of the iterator, which keeps going until
    /// the next match however far away it is.
    pub fn fill(&mut self, batch: &mut Vec<WalkEntry>, max_files: usize, max_visited: u64) -> bool {
        let stop = self.visited.saturating_add(max_visited);
        while batch.len() < max_files && self.visited < stop {
            match self.step() {
                Step::Found(entry) => batch.push(entry),
                Step::Passed => {}
                Step::Done => return false,
            }
        }
        true
    }

    fn step(&mut self) -> Step {
        let entry = match self.inner.next() {
            None => return Step::Done,
            Some(Ok(e)) => e,
            Some(Err(e)) => {
                self.visited += 1;
                self.skipped += 1;
                tracing::debug!(
                    "Skipped {}: {}",
                    e.path().map(|p| p.display().to_string()).unwrap_or_default(),
                    e
                );
                return Step::Passed;
            }
        };
        self.visited += 1;

        if entry.depth() > 0 && self.walker.exclusions.is_excluded(entry.path()) {
            if entry.file_type().is_dir() {
                self.inner.skip_current_dir();
            }
            return Step::Passed;
        }

        if !entry.file_type().is_file() {
            return Step::Passed;
        }
        self.examined += 1;

        let metadata = match entry.metadata() {
            Ok(m) => m,
            Err(e) => {
                self.skipped += 1;
                tracing::debug!("Skipped {}: {}", entry.path().display(), e);
                return Step::Passed;
            }
        };

        let size = metadata.len();
        if size < self.walker.min_size {
            return Step::Passed;
        }

        let modified_at = match metadata.modified() {
            Ok(t) => DateTime::<Utc>::from(t),
            Err(e) => {
                self.skipped += 1;
                tracing::debug!("No mtime for {}: {}", entry.path().display(), e);
                return Step::Passed;
            }
        };

        Step::Found(WalkEntry {
            path: entry.into_path(),
            size,
            modified_at,
        })
    }
}

impl Iterator for Walk<'_> {
    type Item = WalkEntry;

    fn next(&mut self) -> Option<WalkEntry> {
        loop {
            match self.step() {
                Step::Found(entry) => return Some(entry),
                Step::Passed => continue,
                Step::Done => return None,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exclusions_plain_name() {
        let rules = Exclusions::new(&["node_modules", ".git"]);
        assert!(rules.is_excluded(Path::new("/home/u/app/node_modules")));
        assert!(rules.is_excluded(Path::new("/home/u/repo/.git/objects/ab")));
        assert!(!rules.is_excluded(Path::new("/home/u/docs/report.pdf")));
    }

    #[test]
    fn test_exclusions_absolute_prefix() {
        let rules = Exclusions::new(&["/proc"]);
        assert!(rules.is_excluded(Path::new("/proc")));
        assert!(rules.is_excluded(Path::new("/proc/1/maps")));
        assert!(!rules.is_excluded(Path::new("/process/x")));
    }

    #[test]
    fn test_exclusions_glob() {
        let rules = Exclusions::new(&["*/keep-*"]);
        assert!(rules.is_excluded(Path::new("/data/keep-me")));
        assert!(!rules.is_excluded(Path::new("/data/drop-me")));
    }

    #[test]
    fn test_exclusions_ignore_blank_and_invalid() {
        let rules = Exclusions::new(&["", "  ", "[unclosed"]);
        assert!(rules.is_empty());
    }

    #[test]
    fn test_fill_returns_between_matches() {
        let dir = tempfile::TempDir::new().unwrap();
        for i in 0..1000 {
            std::fs::write(dir.path().join(format!("small-{}.txt", i)), b"x").unwrap();
        }
        let walker = Walker::new(Exclusions::default(), 1024 * 1024);
        let mut walk = walker.walk(dir.path()).unwrap();
        let mut batch = Vec::new();

        assert!(walk.fill(&mut batch, 256, 100));
        assert!(batch.is_empty());
        assert!(walk.examined() > 0 && walk.examined() <= 100);

        let mut rounds = 1;
        while walk.fill(&mut batch, 256, 100) {
            rounds += 1;
        }
        assert!(rounds >= 10);
        assert!(batch.is_empty());
        assert_eq!(walk.examined(), 1000);
    }
}
