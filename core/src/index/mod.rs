//! Watched folders and indexing progress

pub mod progress;
pub mod watched;

pub use progress::{simulate_rebuild, IndexProgressTracker, RebuildPlan};
pub use watched::WatchedDirectories;
