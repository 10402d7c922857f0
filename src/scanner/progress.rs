//! Scan progress reporting and cooperative cancellation.
//!
//! Snapshots travel over a bounded crossbeam channel. Senders use
//! `try_send`, so a slow or absent reader only loses updates; the walk
//! never waits on it.

use crossbeam_channel::{Receiver, Sender, TrySendError};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Capacity of the progress channel. Once full, new snapshots are dropped.
pub const PROGRESS_CHANNEL_CAPACITY: usize = 256;

/// Running totals, sent by each worker at a fixed entry cadence
#[derive(Debug, Clone, PartialEq)]
pub struct ScanProgress {
    /// Regular files looked at so far, across all roots
    pub files_examined: u64,
    /// Files at or above the size threshold so far
    pub candidates: u64,
    /// Bytes in those files
    pub bytes_found: u64,
    /// Root the sending worker is walking
    pub current_root: PathBuf,
}

/// Create a progress channel pair
pub fn channel() -> (ProgressSender, Receiver<ScanProgress>) {
    let (tx, rx) = crossbeam_channel::bounded(PROGRESS_CHANNEL_CAPACITY);
    (ProgressSender { tx }, rx)
}

/// Non-blocking sending half handed to the scan engine
#[derive(Debug, Clone)]
pub struct ProgressSender {
    tx: Sender<ScanProgress>,
}

impl ProgressSender {
    /// Returns false when the snapshot was dropped
    pub fn offer(&self, snapshot: ScanProgress) -> bool {
        match self.tx.try_send(snapshot) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) | Err(TrySendError::Disconnected(_)) => false,
        }
    }
}

/// Shared cancellation flag, checked between batches by scan and
/// deletion workers
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request the operation to stop as soon as possible
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(n: u64) -> ScanProgress {
        ScanProgress {
            files_examined: n,
            candidates: n / 2,
            bytes_found: n * 10,
            current_root: PathBuf::from("/tmp"),
        }
    }

    #[test]
    fn test_full_channel_drops_instead_of_blocking() {
        let (tx, rx) = channel();
        for i in 0..PROGRESS_CHANNEL_CAPACITY as u64 {
            assert!(tx.offer(snapshot(i)));
        }
        assert!(!tx.offer(snapshot(9999)));
        assert_eq!(rx.len(), PROGRESS_CHANNEL_CAPACITY);
    }

    #[test]
    fn test_disconnected_receiver_is_harmless() {
        let (tx, rx) = channel();
        drop(rx);
        assert!(!tx.offer(snapshot(1)));
    }

    #[test]
    fn test_cancel_token_is_shared() {
        let token = CancelToken::new();
        let clone = token.clone();
        assert!(!clone.is_cancelled());
        token.cancel();
        assert!(clone.is_cancelled());
    }
}
