//! Plain-text rendering for the `list` and `stats` commands.

use dirstat_core::{
    DirectoryListing, HumanSize, TraversalProgress, TraversalResult, format_count,
};

pub fn listing_lines(listing: &DirectoryListing) -> Vec<String> {
    listing
        .entries
        .iter()
        .map(|entry| {
            if entry.is_dir {
                format!("d {:>10}  {}/", "-", entry.name)
            } else {
                format!("f {:>10}  {}", HumanSize(entry.size).to_string(), entry.name)
            }
        })
        .collect()
}

pub fn statistics_lines(result: &TraversalResult) -> Vec<String> {
    let mut lines = vec![
        format!("path:        {}", result.path.display()),
        format!("directories: {}", format_count(result.directory_count)),
        format!("files:       {}", format_count(result.file_count)),
        format!(
            "total size:  {} ({} bytes)",
            HumanSize(result.total_size),
            format_count(result.total_size)
        ),
    ];

    if !result.is_complete() {
        lines.push(format!(
            "unreadable:  {} branch(es), counted as empty",
            result.failed_branches.len()
        ));
        for failure in &result.failed_branches {
            lines.push(format!("  {}: {}", failure.path.display(), failure.reason));
        }
    }

    lines
}

/// Single status line, redrawn in place on stderr
pub fn progress_line(progress: &TraversalProgress) -> String {
    let state = if progress.is_settled() {
        "done".to_string()
    } else {
        format!("{} pending", progress.outstanding)
    };

    format!(
        "{} dirs, {} files, {} ({})",
        format_count(progress.directories),
        format_count(progress.files),
        HumanSize(progress.bytes),
        state
    )
}
