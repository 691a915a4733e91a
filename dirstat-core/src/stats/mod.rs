mod accumulator;
mod aggregator;
mod progress;

pub use accumulator::{BranchFailure, TraversalResult};
pub use aggregator::{Aggregator, StatsConfig};
pub use progress::{StatsMessage, TraversalProgress};
