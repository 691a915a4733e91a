mod fs;

pub use fs::FsListing;

use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// One child of a listed directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryEntry {
    pub name: String,
    #[serde(rename = "isDir")]
    pub is_dir: bool,
    /// Apparent size in bytes (always 0 for directories)
    pub size: u64,
    /// Exact on-disk name when `name` had to be lossily converted
    #[serde(skip)]
    pub raw_name: Option<OsString>,
}

impl DirectoryEntry {
    pub fn file(name: impl Into<String>, size: u64) -> Self {
        Self {
            name: name.into(),
            is_dir: false,
            size,
            raw_name: None,
        }
    }

    pub fn directory(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_dir: true,
            size: 0,
            raw_name: None,
        }
    }

    /// Build an entry from a filesystem name, keeping the original bytes
    /// whenever they are not valid UTF-8
    pub fn from_os_name(name: OsString, is_dir: bool, size: u64) -> Self {
        let display = name.to_string_lossy().into_owned();
        let raw_name = name.to_str().is_none().then_some(name);
        Self {
            name: display,
            is_dir,
            size: if is_dir { 0 } else { size },
            raw_name,
        }
    }

    /// Name to join onto the parent path when descending into this entry
    pub fn file_name(&self) -> &OsStr {
        self.raw_name
            .as_deref()
            .unwrap_or_else(|| OsStr::new(&self.name))
    }
}

/// Immediate children of one directory
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirectoryListing {
    pub path: PathBuf,
    pub entries: Vec<DirectoryEntry>,
}

impl DirectoryListing {
    pub fn new(path: impl Into<PathBuf>, entries: Vec<DirectoryEntry>) -> Self {
        Self {
            path: path.into(),
            entries,
        }
    }
}

/// Source of single-directory listings.
///
/// Implementations must be callable from many threads at once: the aggregator
/// invokes `list` concurrently, once per directory it discovers.
pub trait ListingProvider: Send + Sync {
    fn list(&self, path: &Path) -> Result<DirectoryListing>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_wire_names() {
        let json = serde_json::to_value(DirectoryEntry::directory("sub")).unwrap();
        assert_eq!(json["name"], "sub");
        assert_eq!(json["isDir"], true);
        // zero sizes must survive serialization
        assert_eq!(json["size"], 0);
    }

    #[test]
    fn test_utf8_name_needs_no_raw_copy() {
        let entry = DirectoryEntry::from_os_name(OsString::from("plain"), true, 99);
        assert!(entry.raw_name.is_none());
        assert_eq!(entry.size, 0);
        assert_eq!(entry.file_name(), OsStr::new("plain"));
    }

    #[cfg(unix)]
    #[test]
    fn test_non_utf8_name_keeps_raw_bytes() {
        use std::os::unix::ffi::OsStrExt;

        let raw = OsStr::from_bytes(b"bad\xffdir").to_os_string();
        let entry = DirectoryEntry::from_os_name(raw.clone(), true, 0);

        assert_eq!(entry.name, "bad\u{FFFD}dir");
        assert_eq!(entry.file_name(), raw.as_os_str());

        // the raw bytes never reach the wire
        let json = serde_json::to_value(&entry).unwrap();
        assert!(json.get("raw_name").is_none());
    }
}
