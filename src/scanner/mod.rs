pub mod classifier;
pub mod model;
pub mod progress;
pub mod roots;
pub mod walker;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use crate::common::errors::ReclaimError;
use crate::common::safety;
use classifier::Classifier;
use model::{ProblemFile, RootFailure, ScanResult};
use progress::{CancelToken, ProgressSender, ScanProgress};
use roots::ScanMode;
use walker::{Exclusions, Walker};

/// Most files a worker classifies before flushing into the shared result
pub const BATCH_SIZE: usize = 256;

/// Directory entries a worker visits between cancellation checks and
/// progress snapshots, however few of them meet the size threshold
pub const CHECK_INTERVAL: u64 = 1024;

/// Everything a scan needs besides the roots
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanConfig {
    pub mode: ScanMode,
    /// Files smaller than this are never reported or counted
    pub min_size_bytes: u64,
    pub stale_window: Duration,
    pub in_use_window: Duration,
    pub exclude_patterns: Vec<String>,
    /// Upper bound on roots walked in parallel
    pub max_concurrency: usize,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            mode: ScanMode::Fast,
            min_size_bytes: 100 * 1024 * 1024,
            stale_window: classifier::DEFAULT_STALE_WINDOW,
            in_use_window: classifier::DEFAULT_IN_USE_WINDOW,
            exclude_patterns: Vec::new(),
            max_concurrency: 4,
        }
    }
}

/// Shared state all walker workers append into
#[derive(Default)]
struct Accumulator {
    /// Files tagged with the index of the root they came from
    files: Vec<(usize, ProblemFile)>,
    failures: Vec<(usize, RootFailure)>,
    skipped: u64,
    files_examined: u64,
    bytes_found: u64,
    interrupted: bool,
}

/// Orchestrates walkers over a set of roots and collects a `ScanResult`
pub struct ScanEngine {
    config: ScanConfig,
    progress: Option<ProgressSender>,
    cancel: CancelToken,
    now: Option<DateTime<Utc>>,
}

impl ScanEngine {
    pub fn new(config: ScanConfig) -> Self {
        Self {
            config,
            progress: None,
            cancel: CancelToken::new(),
            now: None,
        }
    }

    /// Send progress snapshots to this channel
    pub fn with_progress(mut self, progress: ProgressSender) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Use an externally owned cancellation token
    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Pin the classifier's reference time instead of using the scan start
    pub fn at(mut self, now: DateTime<Utc>) -> Self {
        self.now = Some(now);
        self
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Scan the preset roots for the configured mode
    pub fn scan_preset(&self) -> Result<ScanResult, ReclaimError> {
        let roots = roots::roots_for(self.config.mode);
        self.scan(&roots)
    }

    /// Walk `roots`, classify every candidate and aggregate the result.
    ///
    /// A root that cannot be walked is recorded in `root_failures` and the
    /// other roots proceed. On cancellation the files gathered so far are
    /// returned with the cancelled flag set.
    pub fn scan(&self, roots: &[PathBuf]) -> Result<ScanResult, ReclaimError> {
        let start = Instant::now();
        info!(
            "Starting {} scan of {} root(s), min size {} bytes",
            self.config.mode,
            roots.len(),
            self.config.min_size_bytes
        );

        let mut patterns = self.config.exclude_patterns.clone();
        if self.config.mode == ScanMode::Deep {
            patterns.extend(safety::DEFAULT_DEEP_EXCLUDES.iter().map(|s| s.to_string()));
        }
        let walker = Walker::new(Exclusions::new(&patterns), self.config.min_size_bytes);

        let mut classifier = Classifier::new(self.config.stale_window, self.config.in_use_window);
        if let Some(now) = self.now {
            classifier = classifier.at(now);
        }

        let acc = Mutex::new(Accumulator::default());
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.max_concurrency.max(1))
            .thread_name(|i| format!("reclaim-walker-{}", i))
            .build()?;

        pool.install(|| {
            roots.par_iter().enumerate().for_each(|(idx, root)| {
                self.walk_root(idx, root, &walker, &classifier, &acc);
            });
        });

        let acc = acc.into_inner();
        let result = self.finish(acc, start.elapsed().as_secs_f64());

        info!(
            "Scan {} in {:.2}s: {} files, {} bytes, {} skipped, {} root failure(s)",
            if result.is_cancelled() { "cancelled" } else { "finished" },
            result.duration_secs(),
            result.total_count(),
            result.total_bytes(),
            result.skipped(),
            result.root_failures().len()
        );
        Ok(result)
    }

    fn walk_root(
        &self,
        idx: usize,
        root: &Path,
        walker: &Walker,
        classifier: &Classifier,
        acc: &Mutex<Accumulator>,
    ) {
        let mut walk = match walker.walk(root) {
            Ok(w) => w,
            Err(ReclaimError::RootUnavailable { path, reason }) => {
                warn!("Root unavailable: {} ({})", path.display(), reason);
                acc.lock().failures.push((idx, RootFailure { path, reason }));
                return;
            }
            Err(e) => {
                warn!("Root unavailable: {} ({})", root.display(), e);
                acc.lock().failures.push((
                    idx,
                    RootFailure {
                        path: root.to_path_buf(),
                        reason: e.to_string(),
                    },
                ));
                return;
            }
        };

        let mut entries = Vec::with_capacity(BATCH_SIZE);
        let mut reported = 0;
        loop {
            if self.cancel.is_cancelled() {
                debug!("Cancellation observed while walking {}", root.display());
                acc.lock().interrupted = true;
                break;
            }

            let more = walk.fill(&mut entries, BATCH_SIZE, CHECK_INTERVAL);
            let batch: Vec<ProblemFile> = entries
                .drain(..)
                .map(|entry| {
                    let c = classifier.classify(&entry.path, entry.size, entry.modified_at);
                    ProblemFile::new(entry.path, entry.size, entry.modified_at, c.category, c.risk)
                })
                .collect();
            let examined = walk.examined() - reported;
            reported = walk.examined();
            self.flush(idx, root, batch, examined, acc);

            if !more {
                break;
            }
        }

        acc.lock().skipped += walk.skipped();
    }

    /// Move a worker's batch into the shared accumulator and offer a snapshot
    fn flush(
        &self,
        idx: usize,
        root: &Path,
        batch: Vec<ProblemFile>,
        examined: u64,
        acc: &Mutex<Accumulator>,
    ) {
        if batch.is_empty() && examined == 0 {
            return;
        }
        let snapshot = {
            let mut acc = acc.lock();
            acc.files_examined += examined;
            for file in batch {
                acc.bytes_found += file.size();
                acc.files.push((idx, file));
            }
            ScanProgress {
                files_examined: acc.files_examined,
                candidates: acc.files.len() as u64,
                bytes_found: acc.bytes_found,
                current_root: root.to_path_buf(),
            }
        };
        if let Some(ref progress) = self.progress {
            progress.offer(snapshot);
        }
    }

    /// Order by root, drop paths reported twice by overlapping roots, and
    /// build the result.
    fn finish(&self, mut acc: Accumulator, duration_secs: f64) -> ScanResult {
        // Stable sort keeps per-root discovery order
        acc.files.sort_by_key(|(idx, _)| *idx);
        acc.failures.sort_by_key(|(idx, _)| *idx);

        let mut seen: HashSet<PathBuf> = HashSet::with_capacity(acc.files.len());
        let files: Vec<ProblemFile> = acc
            .files
            .into_iter()
            .map(|(_, f)| f)
            .filter(|f| seen.insert(f.path().to_path_buf()))
            .collect();

        ScanResult::new(
            files,
            acc.skipped,
            acc.failures.into_iter().map(|(_, f)| f).collect(),
            acc.interrupted,
            duration_secs,
        )
    }
}

/// One-shot convenience wrapper around `ScanEngine`
pub fn scan(roots: &[PathBuf], config: &ScanConfig) -> Result<ScanResult, ReclaimError> {
    ScanEngine::new(config.clone()).scan(roots)
}
