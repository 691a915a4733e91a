// Run with: cargo run -p dirstat-core --example debug_stats -- /path/to/measure
// Prints every progress heartbeat, useful when a traversal seems stuck.

use dirstat_core::{Aggregator, FsListing, HumanSize, StatsMessage};
use std::path::PathBuf;
use std::time::Instant;

fn main() {
    let path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."));

    println!("Measuring: {:?}", path);

    let (rx, handle) = Aggregator::new(FsListing::new()).spawn(path);
    let start = Instant::now();
    let mut last_outstanding = 0usize;

    for msg in rx {
        let elapsed = start.elapsed().as_secs_f64();
        match msg {
            StatsMessage::Started(root) => println!("[{elapsed:>6.2}s] STARTED {}", root.display()),
            StatsMessage::Progress(p) => {
                let trend = if p.outstanding > last_outstanding { "+" } else { "-" };
                println!(
                    "[{:>6.2}s] dirs={:<8} files={:<8} bytes={:<12} failed={:<4} outstanding={}{}",
                    elapsed, p.directories, p.files, p.bytes, p.failed_branches, p.outstanding, trend
                );
                last_outstanding = p.outstanding;
            }
            StatsMessage::Completed => println!("[{elapsed:>6.2}s] COMPLETED"),
            StatsMessage::Failed(e) => println!("[{elapsed:>6.2}s] FAILED: {e}"),
        }
    }

    match handle.join() {
        Ok(Ok(result)) => {
            println!(
                "\nFinal: {} dirs, {} files, {}",
                result.directory_count,
                result.file_count,
                HumanSize(result.total_size)
            );
            for failure in &result.failed_branches {
                println!("  unreadable: {} ({})", failure.path.display(), failure.reason);
            }
        }
        Ok(Err(e)) => println!("\nError: {e}"),
        Err(_) => println!("\nTraversal thread panicked"),
    }
}
