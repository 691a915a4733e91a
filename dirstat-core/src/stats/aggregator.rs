use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use tracing::{debug, info, warn};

use super::accumulator::{TraversalAccumulator, TraversalResult};
use super::progress::StatsMessage;
use crate::error::TraversalError;
use crate::listing::ListingProvider;

/// Aggregator configuration
#[derive(Debug, Clone)]
pub struct StatsConfig {
    /// Interval between progress snapshots when a progress channel is attached
    pub heartbeat: Duration,
}

impl Default for StatsConfig {
    fn default() -> Self {
        Self {
            heartbeat: Duration::from_millis(100),
        }
    }
}

/// Computes directory/file/size totals for a subtree.
///
/// Every directory discovered gets its own exploration thread. The number
/// of threads is not bounded, so a very wide tree means a very large number
/// of concurrent listings.
pub struct Aggregator<P> {
    provider: Arc<P>,
    config: StatsConfig,
}

impl<P> Clone for Aggregator<P> {
    fn clone(&self) -> Self {
        Self {
            provider: Arc::clone(&self.provider),
            config: self.config.clone(),
        }
    }
}

impl<P: ListingProvider + 'static> Aggregator<P> {
    pub fn new(provider: P) -> Self {
        Self {
            provider: Arc::new(provider),
            config: StatsConfig::default(),
        }
    }

    pub fn with_config(mut self, config: StatsConfig) -> Self {
        self.config = config;
        self
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Explore `root` and block until every unit has finished
    pub fn compute(&self, root: &Path) -> Result<TraversalResult, TraversalError> {
        self.run(root, None)
    }

    /// Like [`compute`](Self::compute), reporting progress on `progress`
    pub fn compute_with_progress(
        &self,
        root: &Path,
        progress: &Sender<StatsMessage>,
    ) -> Result<TraversalResult, TraversalError> {
        self.run(root, Some(progress))
    }

    /// Run the computation on a background thread.
    /// Returns a receiver for progress updates and the handle yielding the result.
    pub fn spawn(
        &self,
        root: PathBuf,
    ) -> (
        Receiver<StatsMessage>,
        JoinHandle<Result<TraversalResult, TraversalError>>,
    ) {
        let (tx, rx) = crossbeam_channel::unbounded();
        let this = self.clone();

        let handle = std::thread::spawn(move || this.compute_with_progress(&root, &tx));

        (rx, handle)
    }

    fn run(
        &self,
        root: &Path,
        progress: Option<&Sender<StatsMessage>>,
    ) -> Result<TraversalResult, TraversalError> {
        let started = Instant::now();
        let shared = Arc::new(TraversalAccumulator::new());
        let (signal_tx, signal_rx) = crossbeam_channel::unbounded();

        if let Some(tx) = progress {
            let _ = tx.send(StatsMessage::Started(root.to_path_buf()));
        }

        let root_unit = Unit::register(Arc::clone(&shared), signal_tx, root.to_path_buf(), true);
        spawn_unit(Arc::clone(&self.provider), root_unit).map_err(TraversalError::Spawn)?;

        // Only units hold senders from here on, so a disconnect means they are all gone
        wait_for_units(&shared, &signal_rx, progress, self.config.heartbeat);

        if let Some(err) = shared.take_root_failure() {
            warn!(root = %root.display(), error = %err, "traversal failed");
            if let Some(tx) = progress {
                let _ = tx.send(StatsMessage::Failed(err.to_string()));
            }
            return Err(err);
        }

        let result = shared.snapshot(root);

        info!(
            root = %root.display(),
            dirs = result.directory_count,
            files = result.file_count,
            bytes = result.total_size,
            failed = result.failed_branches.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "traversal complete"
        );

        if let Some(tx) = progress {
            let _ = tx.send(StatsMessage::Progress(shared.progress()));
            let _ = tx.send(StatsMessage::Completed);
        }

        Ok(result)
    }
}

/// Block until the outstanding-work counter drains to zero.
///
/// The counter is re-read after every completion signal; the number of units
/// is never known up front.
fn wait_for_units(
    shared: &TraversalAccumulator,
    signals: &Receiver<()>,
    progress: Option<&Sender<StatsMessage>>,
    heartbeat: Duration,
) {
    let mut last_beat = Instant::now();

    loop {
        let received = match progress {
            Some(_) => signals.recv_timeout(heartbeat),
            None => signals.recv().map_err(|_| RecvTimeoutError::Disconnected),
        };

        if let Err(RecvTimeoutError::Disconnected) = received {
            debug_assert_eq!(shared.outstanding(), 0);
            return;
        }

        if shared.outstanding() == 0 {
            return;
        }

        if let Some(tx) = progress
            && last_beat.elapsed() >= heartbeat
        {
            let _ = tx.send(StatsMessage::Progress(shared.progress()));
            last_beat = Instant::now();
        }
    }
}

/// One exploration unit.
///
/// Dropping a unit is what retires it: the outstanding counter is decremented
/// and a completion signal sent exactly once, whether the unit finished,
/// panicked, or never got a thread.
struct Unit {
    path: PathBuf,
    is_root: bool,
    shared: Arc<TraversalAccumulator>,
    signal: Sender<()>,
    finished: bool,
}

impl Unit {
    fn register(
        shared: Arc<TraversalAccumulator>,
        signal: Sender<()>,
        path: PathBuf,
        is_root: bool,
    ) -> Self {
        shared.begin_unit();
        Self {
            path,
            is_root,
            shared,
            signal,
            finished: false,
        }
    }

    fn child(&self, name: &OsStr) -> Self {
        Self::register(
            Arc::clone(&self.shared),
            self.signal.clone(),
            self.path.join(name),
            false,
        )
    }
}

impl Drop for Unit {
    fn drop(&mut self) {
        if !self.finished {
            warn!(path = %self.path.display(), "exploration unit aborted");
            if self.is_root {
                self.shared
                    .record_root_failure(TraversalError::Aborted(self.path.clone()));
            } else {
                self.shared
                    .record_failure(&self.path, "exploration aborted before completion");
            }
        }

        self.shared.finish_unit();
        let _ = self.signal.send(());
    }
}

fn spawn_unit<P: ListingProvider + 'static>(
    provider: Arc<P>,
    unit: Unit,
) -> std::io::Result<()> {
    std::thread::Builder::new()
        .name("dirstat-explore".into())
        .spawn(move || explore(provider, unit))
        .map(|_| ())
}

fn explore<P: ListingProvider + 'static>(provider: Arc<P>, mut unit: Unit) {
    debug!(path = %unit.path.display(), "exploring");

    match provider.list(&unit.path) {
        Ok(listing) => {
            for entry in &listing.entries {
                if entry.is_dir {
                    unit.shared.add_directory();
                    let child = unit.child(entry.file_name());
                    let child_path = child.path.clone();
                    // a failed spawn drops the child, which records it as a failed branch
                    if let Err(e) = spawn_unit(Arc::clone(&provider), child) {
                        warn!(path = %child_path.display(), error = %e, "could not spawn exploration thread");
                    }
                } else {
                    unit.shared.add_file(entry.size);
                }
            }
        }
        Err(err) if unit.is_root => {
            unit.shared
                .record_root_failure(TraversalError::Root { source: err });
        }
        Err(err) => {
            warn!(path = %unit.path.display(), error = %err, "branch failed, counting it as empty");
            unit.shared.record_failure(&unit.path, err.describe());
        }
    }

    unit.finished = true;
}
