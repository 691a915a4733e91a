use std::path::{Component, Path, PathBuf};

use dirstat_core::ListError;

use crate::error::ServerError;

/// Resolve a client-supplied path against the served root.
///
/// Leading separators are ignored so "/docs" and "docs" name the same
/// directory. Anything that could climb out of the root is rejected.
pub fn resolve(root: &Path, requested: Option<&str>) -> Result<PathBuf, ServerError> {
    let raw = requested.unwrap_or_default();
    let relative = raw.trim_start_matches(['/', '\\']);
    let mut resolved = root.to_path_buf();

    for component in Path::new(relative).components() {
        match component {
            Component::Normal(part) => resolved.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                return Err(ServerError::InvalidPath(raw.to_string()));
            }
        }
    }

    Ok(resolved)
}

/// Resolve `requested`, follow any symlinks, and insist the result is still
/// under `root`. `root` must already be canonical.
pub fn confine(root: &Path, requested: Option<&str>) -> Result<PathBuf, ServerError> {
    let resolved = resolve(root, requested)?;
    let canonical = resolved
        .canonicalize()
        .map_err(|e| ListError::from_io(&resolved, e))?;

    if !canonical.starts_with(root) {
        return Err(ServerError::InvalidPath(
            requested.unwrap_or_default().to_string(),
        ));
    }

    Ok(canonical)
}

/// Client-facing form of a path below the root ("/sub/dir")
pub fn relative_to_root(root: &Path, path: &Path) -> PathBuf {
    match path.strip_prefix(root) {
        Ok(relative) => Path::new("/").join(relative),
        Err(_) => path.to_path_buf(),
    }
}

/// The path as echoed back to clients
pub fn display_path(requested: Option<&str>) -> String {
    match requested {
        Some(p) if !p.is_empty() => p.to_string(),
        _ => "/".to_string(),
    }
}
