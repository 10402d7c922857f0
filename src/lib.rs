//! # reclaim
//!
//! Finds disk-space-consuming files, scores how risky each one is to
//! delete, and removes a user-chosen selection safely.
//!
//! - **Scanning**: fast (well-known cache/log/temp locations) or deep
//!   (whole filesystem) walks, pruned by exclusion rules and a size threshold
//! - **Classification**: table-driven category and risk rules
//! - **Breakdown**: per-category size buckets for visualization
//! - **Selection**: identity-based selection that survives re-rendering
//! - **Deletion**: per-file isolated removal under a session quota

pub mod cleaner;
pub mod cli;
pub mod common;
pub mod scanner;
pub mod viz;

pub use cleaner::{DeletionExecutor, DeletionReport, Quota, SelectionFilter, SelectionManager, SkipReason};
pub use common::errors::ReclaimError;
pub use scanner::model::{FileId, ProblemFile, RiskLevel, ScanResult};
pub use scanner::{scan, ScanConfig, ScanEngine};
pub use viz::DiskSpaceItem;
