use std::path::PathBuf;

use serde::Serialize;

/// Message emitted while a traversal is running
#[derive(Debug, Clone)]
pub enum StatsMessage {
    /// Traversal started at this root
    Started(PathBuf),
    /// Periodic snapshot of the running totals
    Progress(TraversalProgress),
    /// Every exploration unit has finished
    Completed,
    /// The root could not be explored
    Failed(String),
}

/// Running totals of an in-flight traversal
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TraversalProgress {
    pub directories: u64,
    pub files: u64,
    pub bytes: u64,
    pub failed_branches: u64,
    /// Exploration units spawned but not yet finished
    pub outstanding: usize,
}

impl TraversalProgress {
    pub fn is_settled(&self) -> bool {
        self.outstanding == 0
    }
}
