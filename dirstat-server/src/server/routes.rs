//! Axum HTTP routes.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::extract::{Query, State};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use dirstat_core::{Aggregator, DirectoryEntry, FsListing, ListingProvider, TraversalResult};
use serde::{Deserialize, Serialize};
use tower_http::trace::TraceLayer;
use tracing::info;

use super::paths::{confine, display_path, relative_to_root};
use crate::error::ServerError;

/// Shared application state
pub struct AppState {
    /// Every request path is resolved beneath this directory (canonical)
    pub root: PathBuf,
    pub aggregator: Aggregator<FsListing>,
}

impl AppState {
    pub fn new(root: PathBuf) -> Self {
        Self {
            root: root.canonicalize().unwrap_or(root),
            aggregator: Aggregator::new(FsListing::new()),
        }
    }
}

#[derive(Debug, Deserialize)]
struct PathQuery {
    path: Option<String>,
}

/// Body of a directory listing response
#[derive(Debug, Serialize)]
pub struct ListingResponse {
    pub path: String,
    pub dirs: Vec<DirectoryEntry>,
}

// ─── Route builder ───────────────────────────────────────────────

pub fn build_router(state: Arc<AppState>) -> Router {
    let api = Router::new()
        .route("/health", get(health))
        .route("/directory-items", get(directory_items))
        .route("/directory-items/statistics", get(statistics));

    Router::new()
        .nest("/api/v1", api)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ─── Handlers ────────────────────────────────────────────────────

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

async fn directory_items(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PathQuery>,
) -> Result<Json<ListingResponse>, ServerError> {
    let listing = {
        let state = Arc::clone(&state);
        let requested = query.path.clone();
        tokio::task::spawn_blocking(move || -> Result<_, ServerError> {
            let target = confine(&state.root, requested.as_deref())?;
            Ok(state.aggregator.provider().list(&target)?)
        })
        .await?
    }
    .map_err(|e| e.relative_to(&state.root))?;

    Ok(Json(ListingResponse {
        path: display_path(query.path.as_deref()),
        dirs: listing.entries,
    }))
}

async fn statistics(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PathQuery>,
) -> Result<Json<TraversalResult>, ServerError> {
    let mut result = {
        let state = Arc::clone(&state);
        let requested = query.path.clone();
        tokio::task::spawn_blocking(move || -> Result<_, ServerError> {
            let target = confine(&state.root, requested.as_deref())?;
            Ok(state.aggregator.compute(&target)?)
        })
        .await?
    }
    .map_err(|e| e.relative_to(&state.root))?;

    result.path = PathBuf::from(display_path(query.path.as_deref()));
    for failure in &mut result.failed_branches {
        failure.path = relative_to_root(&state.root, &failure.path);
    }

    Ok(Json(result))
}

// ─── Server startup ──────────────────────────────────────────────

/// Serve `root` until the process is stopped
pub async fn serve(root: PathBuf, bind: &str, port: u16) -> Result<(), ServerError> {
    let addr: SocketAddr = format!("{bind}:{port}")
        .parse()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e))?;

    let state = Arc::new(AppState::new(root));
    info!(root = %state.root.display(), %addr, "serving directory statistics");

    let app = build_router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use std::fs;
    use tempfile::TempDir;
    use tower::ServiceExt;

    fn fixture() -> TempDir {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("a.txt"), vec![0u8; 10]).unwrap();
        fs::create_dir(temp.path().join("subdir1")).unwrap();
        fs::write(temp.path().join("subdir1/b.txt"), vec![0u8; 20]).unwrap();
        fs::create_dir(temp.path().join("subdir2")).unwrap();
        temp
    }

    async fn get_json(temp: &TempDir, uri: &str) -> (StatusCode, serde_json::Value) {
        let app = build_router(Arc::new(AppState::new(temp.path().to_path_buf())));
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();

        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_statistics_of_root() {
        let temp = fixture();
        let (status, body) = get_json(&temp, "/api/v1/directory-items/statistics").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["path"], "/");
        assert_eq!(body["dirCount"], 2);
        assert_eq!(body["fileCount"], 2);
        assert_eq!(body["totalSize"], 30);
        assert_eq!(body["failedBranches"], serde_json::json!([]));
    }

    #[tokio::test]
    async fn test_statistics_of_empty_subdir_keeps_zeros() {
        let temp = fixture();
        let (status, body) =
            get_json(&temp, "/api/v1/directory-items/statistics?path=/subdir2").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["path"], "/subdir2");
        assert_eq!(body["dirCount"], 0);
        assert_eq!(body["fileCount"], 0);
        assert_eq!(body["totalSize"], 0);
    }

    #[tokio::test]
    async fn test_statistics_missing_path() {
        let temp = fixture();
        let (status, body) =
            get_json(&temp, "/api/v1/directory-items/statistics?path=nope").await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        let message = body["error"].as_str().unwrap();
        assert!(message.contains("/nope"));
        let root = temp.path().canonicalize().unwrap();
        assert!(!message.contains(root.to_str().unwrap()));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_unreadable_branch_is_reported_relative() {
        use std::os::unix::fs::PermissionsExt;

        let temp = fixture();
        let locked = temp.path().join("locked");
        fs::create_dir(&locked).unwrap();
        fs::write(locked.join("hidden.txt"), vec![0u8; 1000]).unwrap();
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

        // permission bits do not stop root
        if fs::read_dir(&locked).is_ok() {
            fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
            return;
        }

        let (status, body) = get_json(&temp, "/api/v1/directory-items/statistics").await;
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["dirCount"], 3);
        assert_eq!(body["fileCount"], 2);
        assert_eq!(body["totalSize"], 30);
        assert_eq!(body["failedBranches"][0]["path"], "/locked");
        assert_eq!(body["failedBranches"][0]["reason"], "permission denied");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_symlink_out_of_root_is_rejected() {
        let outside = TempDir::new().unwrap();
        fs::write(outside.path().join("secret.txt"), "secret").unwrap();
        let temp = fixture();
        std::os::unix::fs::symlink(outside.path(), temp.path().join("link")).unwrap();

        let (status, body) = get_json(&temp, "/api/v1/directory-items?path=link").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body.get("dirs").is_none());

        let (status, _) =
            get_json(&temp, "/api/v1/directory-items/statistics?path=link").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_symlink_within_root_is_served() {
        let temp = fixture();
        std::os::unix::fs::symlink(temp.path().join("subdir1"), temp.path().join("alias")).unwrap();

        let (status, body) =
            get_json(&temp, "/api/v1/directory-items/statistics?path=alias").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["path"], "alias");
        assert_eq!(body["fileCount"], 1);
        assert_eq!(body["totalSize"], 20);
    }

    #[tokio::test]
    async fn test_directory_items() {
        let temp = fixture();
        let (status, body) = get_json(&temp, "/api/v1/directory-items?path=/").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body["dirs"],
            serde_json::json!([
                { "name": "a.txt", "isDir": false, "size": 10 },
                { "name": "subdir1", "isDir": true, "size": 0 },
                { "name": "subdir2", "isDir": true, "size": 0 },
            ])
        );
    }

    #[tokio::test]
    async fn test_directory_items_on_file() {
        let temp = fixture();
        let (status, _) = get_json(&temp, "/api/v1/directory-items?path=a.txt").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_escape_is_rejected() {
        let temp = fixture();
        let (status, _) = get_json(&temp, "/api/v1/directory-items?path=../").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_health() {
        let temp = fixture();
        let (status, body) = get_json(&temp, "/api/v1/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }
}
