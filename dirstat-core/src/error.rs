use std::path::PathBuf;
use thiserror::Error;

/// Failure to list a single directory
#[derive(Error, Debug)]
pub enum ListError {
    #[error("Path does not exist: {0}")]
    PathNotFound(PathBuf),

    #[error("Path is not a directory: {0}")]
    NotADirectory(PathBuf),

    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),

    #[error("IO error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ListError {
    /// Classify an OS error raised while reading `path`
    pub fn from_io(path: impl Into<PathBuf>, err: std::io::Error) -> Self {
        let path = path.into();
        match err.kind() {
            std::io::ErrorKind::NotFound => ListError::PathNotFound(path),
            std::io::ErrorKind::PermissionDenied => ListError::PermissionDenied(path),
            std::io::ErrorKind::NotADirectory => ListError::NotADirectory(path),
            _ => ListError::Io { path, source: err },
        }
    }

    /// What went wrong, without the path
    pub fn describe(&self) -> String {
        match self {
            ListError::PathNotFound(_) => "path does not exist".to_string(),
            ListError::NotADirectory(_) => "not a directory".to_string(),
            ListError::PermissionDenied(_) => "permission denied".to_string(),
            ListError::Io { source, .. } => source.to_string(),
        }
    }

    /// The same failure, reported against a different path
    pub fn with_path(self, path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        match self {
            ListError::PathNotFound(_) => ListError::PathNotFound(path),
            ListError::NotADirectory(_) => ListError::NotADirectory(path),
            ListError::PermissionDenied(_) => ListError::PermissionDenied(path),
            ListError::Io { source, .. } => ListError::Io { path, source },
        }
    }

    pub fn path(&self) -> &std::path::Path {
        match self {
            ListError::PathNotFound(p)
            | ListError::NotADirectory(p)
            | ListError::PermissionDenied(p) => p,
            ListError::Io { path, .. } => path,
        }
    }
}

/// Failure of a whole subtree computation
#[derive(Error, Debug)]
pub enum TraversalError {
    #[error("Cannot list traversal root {}: {source}", .source.path().display())]
    Root {
        #[source]
        source: ListError,
    },

    #[error("Exploration of traversal root {} aborted", .0.display())]
    Aborted(PathBuf),

    #[error("Failed to spawn exploration thread: {0}")]
    Spawn(#[source] std::io::Error),
}

impl TraversalError {
    /// The listing failure behind a fatal root error, if that is what this is
    pub fn list_error(&self) -> Option<&ListError> {
        match self {
            TraversalError::Root { source } => Some(source),
            TraversalError::Aborted(_) | TraversalError::Spawn(_) => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, ListError>;
