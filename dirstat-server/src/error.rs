use std::path::Path;

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use dirstat_core::{ListError, TraversalError};
use thiserror::Error;

use crate::server::paths::relative_to_root;

/// Errors surfaced by the HTTP layer
#[derive(Error, Debug)]
pub enum ServerError {
    #[error(transparent)]
    List(#[from] ListError),

    #[error(transparent)]
    Traversal(#[from] TraversalError),

    /// Requested path escapes the served root
    #[error("Invalid path '{0}': must stay inside the served root")]
    InvalidPath(String),

    #[error("Background task failed: {0}")]
    Join(#[from] tokio::task::JoinError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ServerError {
    /// Rewrite any absolute path inside the error to its form below `root`
    pub fn relative_to(self, root: &Path) -> Self {
        let strip = |err: ListError| {
            let path = relative_to_root(root, err.path());
            err.with_path(path)
        };

        match self {
            ServerError::List(err) => ServerError::List(strip(err)),
            ServerError::Traversal(TraversalError::Root { source }) => {
                ServerError::Traversal(TraversalError::Root {
                    source: strip(source),
                })
            }
            ServerError::Traversal(TraversalError::Aborted(path)) => ServerError::Traversal(
                TraversalError::Aborted(relative_to_root(root, &path)),
            ),
            other => other,
        }
    }

    fn status(&self) -> StatusCode {
        let list_error = match self {
            ServerError::List(e) => Some(e),
            ServerError::Traversal(e) => e.list_error(),
            ServerError::InvalidPath(_) => return StatusCode::BAD_REQUEST,
            _ => None,
        };

        match list_error {
            Some(ListError::PathNotFound(_)) => StatusCode::NOT_FOUND,
            Some(ListError::NotADirectory(_)) => StatusCode::BAD_REQUEST,
            Some(ListError::PermissionDenied(_)) => StatusCode::FORBIDDEN,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        } else {
            tracing::debug!(error = %self, "request rejected");
        }

        let body = serde_json::json!({ "error": self.to_string() });
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_relative_to_hides_root() {
        let root = Path::new("/srv/root");
        let err = ServerError::Traversal(TraversalError::Root {
            source: ListError::PathNotFound(PathBuf::from("/srv/root/nope")),
        })
        .relative_to(root);

        let message = err.to_string();
        assert!(message.contains("/nope"));
        assert!(!message.contains("/srv/root"));
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_status_mapping() {
        let missing = ServerError::List(ListError::PathNotFound(PathBuf::from("/x")));
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);

        let root_denied = ServerError::Traversal(TraversalError::Root {
            source: ListError::PermissionDenied(PathBuf::from("/x")),
        });
        assert_eq!(root_denied.status(), StatusCode::FORBIDDEN);

        let aborted = ServerError::Traversal(TraversalError::Aborted(PathBuf::from("/x")));
        assert_eq!(aborted.status(), StatusCode::INTERNAL_SERVER_ERROR);

        assert_eq!(
            ServerError::InvalidPath("..".into()).status(),
            StatusCode::BAD_REQUEST
        );
    }
}
