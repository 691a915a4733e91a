use std::fs;
use std::path::Path;

use tracing::warn;

use super::{DirectoryEntry, DirectoryListing, ListingProvider};
use crate::error::{ListError, Result};

/// Lists directories straight off the local filesystem.
///
/// Symlinks are never followed: a link is reported as a leaf entry sized by
/// its own metadata, so a traversal cannot loop through a cyclic link.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsListing;

impl FsListing {
    pub fn new() -> Self {
        Self
    }
}

impl ListingProvider for FsListing {
    fn list(&self, path: &Path) -> Result<DirectoryListing> {
        let meta = fs::metadata(path).map_err(|e| ListError::from_io(path, e))?;
        if !meta.is_dir() {
            return Err(ListError::NotADirectory(path.to_path_buf()));
        }

        let read_dir = fs::read_dir(path).map_err(|e| ListError::from_io(path, e))?;
        let mut entries = Vec::new();

        for entry_result in read_dir {
            let entry = entry_result.map_err(|e| ListError::from_io(path, e))?;

            // DirEntry::metadata does not traverse symlinks
            let metadata = match entry.metadata() {
                Ok(m) => m,
                Err(e) => {
                    warn!(path = %entry.path().display(), error = %e, "skipping unreadable entry");
                    continue;
                }
            };

            entries.push(DirectoryEntry::from_os_name(
                entry.file_name(),
                metadata.is_dir(),
                metadata.len(),
            ));
        }

        entries.sort_by(|a, b| a.file_name().cmp(b.file_name()));

        Ok(DirectoryListing::new(path, entries))
    }
}
