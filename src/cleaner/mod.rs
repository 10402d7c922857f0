pub mod engine;
pub mod selection;

pub use engine::{delete_file, DeletionExecutor, DeletionOutcome, DeletionReport, Quota, SkipReason};
pub use selection::{SelectionFilter, SelectionManager};
