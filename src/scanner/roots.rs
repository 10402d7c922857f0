use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Which preset of root directories a scan starts from.
/// Traversal is identical; only the root set differs.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "snake_case")]
pub enum ScanMode {
    /// Well-known cache, log and temp locations
    #[default]
    Fast,
    /// Everything reachable from the filesystem roots
    Deep,
}

impl std::fmt::Display for ScanMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScanMode::Fast => write!(f, "fast"),
            ScanMode::Deep => write!(f, "deep"),
        }
    }
}

/// Per-user locations, relative to the home directory
const FAST_HOME_PATHS: &[&str] = &[
    ".cache",
    ".npm/_cacache",
    ".local/share/Trash",
    "Library/Caches",
    "Library/Logs",
    "Library/Application Support/CrashReporter",
    "AppData/Local/Temp",
    "AppData/Local/CrashDumps",
];

/// System-wide locations
const FAST_SYSTEM_PATHS: &[&str] = &[
    "/tmp",
    "/var/tmp",
    "/var/log",
    "/var/cache",
    "/Library/Caches",
    "/Library/Logs",
];

/// Roots for a given mode. Only existing directories are returned, with
/// duplicates (e.g. `$TMPDIR` == `/tmp`) removed.
pub fn roots_for(mode: ScanMode) -> Vec<PathBuf> {
    let candidates = match mode {
        ScanMode::Fast => fast_candidates(),
        ScanMode::Deep => deep_candidates(),
    };

    let mut roots: Vec<PathBuf> = Vec::new();
    for path in candidates {
        if !path.is_dir() {
            continue;
        }
        let canonical = std::fs::canonicalize(&path).unwrap_or(path);
        if !roots.contains(&canonical) {
            roots.push(canonical);
        }
    }
    roots
}

fn fast_candidates() -> Vec<PathBuf> {
    let mut paths = Vec::new();
    if let Some(home) = dirs::home_dir() {
        paths.extend(FAST_HOME_PATHS.iter().map(|p| home.join(p)));
    }
    if let Some(cache) = dirs::cache_dir() {
        paths.push(cache);
    }
    paths.push(std::env::temp_dir());
    paths.extend(FAST_SYSTEM_PATHS.iter().map(PathBuf::from));
    paths
}

#[cfg(windows)]
fn deep_candidates() -> Vec<PathBuf> {
    ('A'..='Z')
        .map(|letter| PathBuf::from(format!("{}:\\", letter)))
        .collect()
}

#[cfg(not(windows))]
fn deep_candidates() -> Vec<PathBuf> {
    vec![PathBuf::from("/")]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fast_roots_exist_and_are_unique() {
        let roots = roots_for(ScanMode::Fast);
        for root in &roots {
            assert!(root.is_dir(), "{} should be a directory", root.display());
        }
        let unique: std::collections::HashSet<_> = roots.iter().collect();
        assert_eq!(unique.len(), roots.len());
    }

    #[cfg(unix)]
    #[test]
    fn test_deep_root_is_filesystem_root() {
        assert_eq!(roots_for(ScanMode::Deep), vec![PathBuf::from("/")]);
    }
}
