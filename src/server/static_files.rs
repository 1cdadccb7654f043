//! Static file server for the dashboard directory.

use std::net::SocketAddr;
use std::path::Path;

use axum::Router;
use tower_http::services::ServeDir;
use tracing::info;

use super::ServerError;

/// Router serving the files under `dir`, with `index.html` for directories.
///
/// # Errors
///
/// [`ServerError::DirectoryNotFound`] when `dir` is not an existing directory.
pub fn static_router(dir: &Path) -> Result<Router, ServerError> {
    if !dir.is_dir() {
        return Err(ServerError::DirectoryNotFound {
            path: dir.to_path_buf(),
        });
    }
    Ok(Router::new().fallback_service(ServeDir::new(dir).append_index_html_on_directories(true)))
}

/// Serves `dir` on `addr` until the process exits.
///
/// # Errors
///
/// [`ServerError::DirectoryNotFound`], [`ServerError::Bind`] or
/// [`ServerError::Serve`].
pub async fn run_static_server(addr: SocketAddr, dir: &Path) -> Result<(), ServerError> {
    let app = static_router(dir)?;
    let listener = super::bind(addr).await?;
    info!(%addr, dir = %dir.display(), "serving dashboard");
    super::serve(listener, app).await
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_directory_is_error() {
        let err = static_router(Path::new("/nonexistent/web")).unwrap_err();
        assert!(err.to_string().contains("Directory not found"));
    }

    #[test]
    fn test_file_path_is_not_a_directory() {
        let temp = tempfile::NamedTempFile::new().unwrap();
        assert!(static_router(temp.path()).is_err());
    }

    #[test]
    fn test_existing_directory_builds_router() {
        let temp = tempfile::tempdir().unwrap();
        assert!(static_router(temp.path()).is_ok());
    }
}
