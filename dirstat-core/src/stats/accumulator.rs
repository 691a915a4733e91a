use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

use serde::Serialize;

use super::progress::TraversalProgress;
use crate::error::TraversalError;

/// A subdirectory whose listing failed and was counted as empty
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BranchFailure {
    pub path: PathBuf,
    pub reason: String,
}

/// Frozen totals of a finished traversal
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TraversalResult {
    pub path: PathBuf,
    #[serde(rename = "dirCount")]
    pub directory_count: u64,
    pub file_count: u64,
    pub total_size: u64,
    pub failed_branches: Vec<BranchFailure>,
}

impl TraversalResult {
    /// True when every discovered directory was listed successfully
    pub fn is_complete(&self) -> bool {
        self.failed_branches.is_empty()
    }
}

/// Shared state of one traversal.
///
/// Counters are plain atomics. `outstanding` is the only value the
/// coordinator polls: once it reads zero (with acquire ordering) every
/// unit's counter updates happen-before the read, so a snapshot is final.
pub(crate) struct TraversalAccumulator {
    directory_count: AtomicU64,
    file_count: AtomicU64,
    total_size: AtomicU64,
    outstanding: AtomicUsize,
    failures: Mutex<Vec<BranchFailure>>,
    root_failure: Mutex<Option<TraversalError>>,
}

impl TraversalAccumulator {
    pub(crate) fn new() -> Self {
        Self {
            directory_count: AtomicU64::new(0),
            file_count: AtomicU64::new(0),
            total_size: AtomicU64::new(0),
            outstanding: AtomicUsize::new(0),
            failures: Mutex::new(Vec::new()),
            root_failure: Mutex::new(None),
        }
    }

    pub(crate) fn add_directory(&self) {
        self.directory_count.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn add_file(&self, size: u64) {
        self.file_count.fetch_add(1, Ordering::Relaxed);
        self.total_size.fetch_add(size, Ordering::Relaxed);
    }

    /// Register a unit that is about to be spawned
    pub(crate) fn begin_unit(&self) {
        self.outstanding.fetch_add(1, Ordering::AcqRel);
    }

    /// Mark one unit done, returning how many are still outstanding
    pub(crate) fn finish_unit(&self) -> usize {
        let previous = self.outstanding.fetch_sub(1, Ordering::AcqRel);
        debug_assert!(previous > 0, "unit finished more than once");
        previous - 1
    }

    pub(crate) fn outstanding(&self) -> usize {
        self.outstanding.load(Ordering::Acquire)
    }

    pub(crate) fn record_failure(&self, path: &Path, reason: impl Into<String>) {
        self.failures
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(BranchFailure {
                path: path.to_path_buf(),
                reason: reason.into(),
            });
    }

    pub(crate) fn record_root_failure(&self, err: TraversalError) {
        let mut slot = self
            .root_failure
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        slot.get_or_insert(err);
    }

    pub(crate) fn take_root_failure(&self) -> Option<TraversalError> {
        self.root_failure
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }

    pub(crate) fn progress(&self) -> TraversalProgress {
        TraversalProgress {
            directories: self.directory_count.load(Ordering::Relaxed),
            files: self.file_count.load(Ordering::Relaxed),
            bytes: self.total_size.load(Ordering::Relaxed),
            failed_branches: self
                .failures
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .len() as u64,
            outstanding: self.outstanding(),
        }
    }

    /// Freeze the totals. Only meaningful once `outstanding()` is zero.
    pub(crate) fn snapshot(&self, root: &Path) -> TraversalResult {
        let mut failed_branches = self
            .failures
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        failed_branches.sort_by(|a, b| a.path.cmp(&b.path));

        TraversalResult {
            path: root.to_path_buf(),
            directory_count: self.directory_count.load(Ordering::Relaxed),
            file_count: self.file_count.load(Ordering::Relaxed),
            total_size: self.total_size.load(Ordering::Relaxed),
            failed_branches,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outstanding_balance() {
        let acc = TraversalAccumulator::new();
        acc.begin_unit();
        acc.begin_unit();
        assert_eq!(acc.finish_unit(), 1);
        acc.begin_unit();
        assert_eq!(acc.finish_unit(), 1);
        assert_eq!(acc.finish_unit(), 0);
        assert_eq!(acc.outstanding(), 0);
    }

    #[test]
    fn test_snapshot_sorts_failures() {
        let acc = TraversalAccumulator::new();
        acc.add_directory();
        acc.add_file(7);
        acc.record_failure(Path::new("/r/z"), "denied");
        acc.record_failure(Path::new("/r/a"), "gone");

        let result = acc.snapshot(Path::new("/r"));
        assert_eq!(result.directory_count, 1);
        assert_eq!(result.total_size, 7);
        assert_eq!(result.failed_branches[0].path, PathBuf::from("/r/a"));
        assert!(!result.is_complete());
    }

    #[test]
    fn test_result_serializes_zero_counts() {
        let acc = TraversalAccumulator::new();
        let json = serde_json::to_value(acc.snapshot(Path::new("/r"))).unwrap();
        assert_eq!(json["dirCount"], 0);
        assert_eq!(json["fileCount"], 0);
        assert_eq!(json["totalSize"], 0);
        assert_eq!(json["failedBranches"], serde_json::json!([]));
    }
}
