//! Path and age based classification of discovered files.
//!
//! Both the category and the risk decision are ordered rule tables: the
//! first rule whose predicate matches wins. Classification is pure; the
//! reference time is fixed when the `Classifier` is built, so every file in
//! one scan is judged against the same instant.

use chrono::{DateTime, Utc};
use std::path::Path;
use std::time::Duration;

use super::model::RiskLevel;

pub const CACHE: &str = "Cache";
pub const LOGS: &str = "Logs";
pub const TEMPORARY: &str = "Temporary";
pub const APP_SUPPORT: &str = "Application Support";
pub const OTHER: &str = "Other";

/// Default window after which caches and temp files count as stale
pub const DEFAULT_STALE_WINDOW: Duration = Duration::from_secs(7 * 86400);

/// Files modified more recently than this are treated as possibly in use
pub const DEFAULT_IN_USE_WINDOW: Duration = Duration::from_secs(5 * 60);

/// What a rule gets to look at
#[derive(Debug)]
pub struct FileFacts<'a> {
    pub path: &'a Path,
    /// Lowercased path components
    pub components: Vec<String>,
    /// Lowercased file name
    pub file_name: String,
    /// Lowercased extension, empty if none
    pub extension: String,
    pub size: u64,
    /// Time since last modification; zero for timestamps in the future
    pub age: Duration,
}

impl<'a> FileFacts<'a> {
    fn new(path: &'a Path, size: u64, modified_at: DateTime<Utc>, now: DateTime<Utc>) -> Self {
        let components = path
            .components()
            .map(|c| c.as_os_str().to_string_lossy().to_lowercase())
            .collect();
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        let extension = path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        let age = (now - modified_at).to_std().unwrap_or_default();

        Self {
            path,
            components,
            file_name,
            extension,
            size,
            age,
        }
    }

    /// Any directory component (not the file name) equal to one of `names`
    fn in_dir_named(&self, names: &[&str]) -> bool {
        let dirs = self.components.len().saturating_sub(1);
        self.components[..dirs]
            .iter()
            .any(|c| names.contains(&c.as_str()))
    }

    fn has_extension(&self, exts: &[&str]) -> bool {
        exts.contains(&self.extension.as_str())
    }
}

// ─── Category rules ───────────────────────────────────────────────────────────

pub struct CategoryRule {
    pub category: &'static str,
    pub matches: fn(&FileFacts) -> bool,
}

const CACHE_DIRS: &[&str] = &[
    "cache",
    "caches",
    ".cache",
    "cachestorage",
    "code cache",
    "gpucache",
    "shadercache",
    "__pycache__",
    "inetcache",
    "deriveddata",
];

const LOG_DIRS: &[&str] = &["log", "logs", "diagnosticreports", "crashreports"];

const TEMP_DIRS: &[&str] = &["tmp", "temp", ".tmp", "temporary items"];

const TEMP_EXTENSIONS: &[&str] = &["tmp", "temp", "bak", "swp", "part", "crdownload"];

const APP_SUPPORT_DIRS: &[&str] = &[
    "application support",
    "appdata",
    "mozilla",
    "firefox",
    "google-chrome",
    "chromium",
    "brave-browser",
    "microsoft edge",
    "containers",
];

fn is_cache(f: &FileFacts) -> bool {
    f.in_dir_named(CACHE_DIRS)
}

fn is_log(f: &FileFacts) -> bool {
    f.in_dir_named(LOG_DIRS) || f.extension == "log" || f.file_name.contains(".log.")
}

/// macOS per-user temp directory: `/var/folders/<xx>/<id>/T/...`
fn in_darwin_user_temp(f: &FileFacts) -> bool {
    let dirs = f.components.len().saturating_sub(1);
    f.components[..dirs]
        .windows(5)
        .any(|w| w[0] == "var" && w[1] == "folders" && w[4] == "t")
}

fn is_temporary(f: &FileFacts) -> bool {
    f.in_dir_named(TEMP_DIRS) || in_darwin_user_temp(f) || f.has_extension(TEMP_EXTENSIONS)
}

fn is_app_support(f: &FileFacts) -> bool {
    f.in_dir_named(APP_SUPPORT_DIRS)
}

/// Category rules in priority order
pub const CATEGORY_RULES: &[CategoryRule] = &[
    CategoryRule { category: CACHE, matches: is_cache },
    CategoryRule { category: LOGS, matches: is_log },
    CategoryRule { category: TEMPORARY, matches: is_temporary },
    CategoryRule { category: APP_SUPPORT, matches: is_app_support },
];

// ─── Risk rules ───────────────────────────────────────────────────────────────

/// Inputs for risk rules: the file facts plus the category already assigned
pub struct RiskInput<'a> {
    pub facts: &'a FileFacts<'a>,
    pub category: &'static str,
    pub stale_window: Duration,
    pub in_use_window: Duration,
}

pub struct RiskRule {
    pub name: &'static str,
    pub risk: RiskLevel,
    pub matches: fn(&RiskInput) -> bool,
}

const RUNTIME_PREFIXES: &[&str] = &["/run/", "/var/run/", "/var/lock/", "/proc/", "/private/var/run/"];

const LOCK_NAMES: &[&str] = &["lock", "lockfile", "singletonlock", "parent.lock", ".lock"];

const LOCK_EXTENSIONS: &[&str] = &["lock", "lck", "pid"];

fn looks_in_use(input: &RiskInput) -> bool {
    let facts = input.facts;
    let path = facts.path.to_string_lossy();
    RUNTIME_PREFIXES.iter().any(|p| path.starts_with(p))
        || LOCK_NAMES.contains(&facts.file_name.as_str())
        || facts.has_extension(LOCK_EXTENSIONS)
}

fn recently_modified(input: &RiskInput) -> bool {
    input.facts.age < input.in_use_window
}

fn stale_disposable(input: &RiskInput) -> bool {
    (input.category == CACHE || input.category == TEMPORARY)
        && input.facts.age > input.stale_window
}

/// Risk rules in priority order; `Medium` when none match
pub const RISK_RULES: &[RiskRule] = &[
    RiskRule { name: "lock or runtime file", risk: RiskLevel::High, matches: looks_in_use },
    RiskRule { name: "recently modified", risk: RiskLevel::High, matches: recently_modified },
    RiskRule { name: "stale cache or temp", risk: RiskLevel::Low, matches: stale_disposable },
];

// ─── Classifier ───────────────────────────────────────────────────────────────

/// Outcome of classifying one file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    pub category: &'static str,
    pub risk: RiskLevel,
}

#[derive(Debug, Clone, Copy)]
pub struct Classifier {
    stale_window: Duration,
    in_use_window: Duration,
    now: DateTime<Utc>,
}

impl Classifier {
    pub fn new(stale_window: Duration, in_use_window: Duration) -> Self {
        Self {
            stale_window,
            in_use_window,
            now: Utc::now(),
        }
    }

    /// Pin the reference time
    pub fn at(mut self, now: DateTime<Utc>) -> Self {
        self.now = now;
        self
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.now
    }

    pub fn classify(&self, path: &Path, size: u64, modified_at: DateTime<Utc>) -> Classification {
        let facts = FileFacts::new(path, size, modified_at, self.now);

        let category = CATEGORY_RULES
            .iter()
            .find(|rule| (rule.matches)(&facts))
            .map(|rule| rule.category)
            .unwrap_or(OTHER);

        let input = RiskInput {
            facts: &facts,
            category,
            stale_window: self.stale_window,
            in_use_window: self.in_use_window,
        };
        let risk = match RISK_RULES.iter().find(|rule| (rule.matches)(&input)) {
            Some(rule) => {
                tracing::trace!("{}: {} ({})", path.display(), rule.risk, rule.name);
                rule.risk
            }
            None => RiskLevel::Medium,
        };

        Classification { category, risk }
    }
}

impl Default for Classifier {
    fn default() -> Self {
        Self::new(DEFAULT_STALE_WINDOW, DEFAULT_IN_USE_WINDOW)
    }
}
