pub mod breakdown;

pub use breakdown::{aggregate, DiskSpaceItem};
