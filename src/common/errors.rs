use std::path::PathBuf;
use thiserror::Error;

/// Error types for reclaim operations.
/// The binary wraps these in `anyhow` for reporting, but library modules
/// return them directly so callers can match on the failure.
#[derive(Debug, Error)]
pub enum ReclaimError {
    /// A scan root is missing or not a directory. Fatal for that root only.
    #[error("Root unavailable: '{}' ({reason})", path.display())]
    RootUnavailable { path: PathBuf, reason: String },

    /// The selection is larger than what the session may still delete.
    /// Reported before any file is touched.
    #[error(
        "Quota exceeded: {} requested, {} allowed",
        crate::common::format::format_size(*requested),
        crate::common::format::format_size(*allowed)
    )]
    QuotaExceeded { requested: u64, allowed: u64 },

    /// Configuration file is invalid
    #[error("Config error in '{}': {message}", path.display())]
    Config { path: PathBuf, message: String },

    /// Worker pool could not be created
    #[error("Failed to build worker pool: {0}")]
    ThreadPool(String),
}

impl From<rayon::ThreadPoolBuildError> for ReclaimError {
    fn from(e: rayon::ThreadPoolBuildError) -> Self {
        ReclaimError::ThreadPool(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quota_exceeded_message_uses_human_sizes() {
        let err = ReclaimError::QuotaExceeded {
            requested: 7 * 1024 * 1024,
            allowed: 5 * 1024 * 1024,
        };
        let msg = err.to_string();
        assert!(msg.contains("7.00 MB"), "got: {}", msg);
        assert!(msg.contains("5.00 MB"), "got: {}", msg);
    }

    #[test]
    fn test_root_unavailable_mentions_path() {
        let err = ReclaimError::RootUnavailable {
            path: PathBuf::from("/nope"),
            reason: "does not exist".into(),
        };
        assert!(err.to_string().contains("/nope"));
    }
}
