pub mod error;
pub mod listing;
pub mod size;
pub mod stats;

pub use error::{ListError, Result, TraversalError};
pub use listing::{DirectoryEntry, DirectoryListing, FsListing, ListingProvider};
pub use size::{HumanSize, format_count};
pub use stats::{
    Aggregator, BranchFailure, StatsConfig, StatsMessage, TraversalProgress, TraversalResult,
};
