//! HTTP routes and static file serving for the development server.

use anyhow::{Context, Result};
use axum::{
    extract::State,
    http::{header, StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::info;

use super::state::ServerState;
use super::websocket::websocket_handler;
use crate::config::PagesConfig;

/// Live reload client, served from memory and injected into HTML pages.
const RELOAD_SCRIPT: &str = include_str!("reload.js");

const RELOAD_SCRIPT_TAG: &str = r#"<script src="/__sitepipe/reload.js"></script>"#;

/// Create the router: live reload endpoints plus a fallback serving
/// project files.
pub fn create_router(state: ServerState) -> Router {
    Router::new()
        .route("/__sitepipe/ws", get(websocket_handler))
        .route("/__sitepipe/reload.js", get(reload_script))
        .fallback(get(serve_asset))
        .layer(TraceLayer::new_for_http())
        .with_state(Arc::new(state))
}

/// Bind the port and serve until the process is stopped.
pub async fn serve(state: ServerState, port: u16) -> Result<()> {
    let router = create_router(state);
    let addr = format!("0.0.0.0:{port}");
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!("Development server listening on http://localhost:{}", port);
    axum::serve(listener, router).await?;
    Ok(())
}

async fn reload_script() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "text/javascript")], RELOAD_SCRIPT)
}

async fn serve_asset(State(state): State<Arc<ServerState>>, uri: Uri) -> Response {
    let Some(file) = resolve(&state.config, uri.path()) else {
        return (StatusCode::NOT_FOUND, "not found").into_response();
    };
    match tokio::fs::read(&file).await {
        Ok(bytes) => file_response(&file, bytes),
        Err(_) => (StatusCode::NOT_FOUND, "not found").into_response(),
    }
}

/// Map a request path to a file on disk.
///
/// Configured route prefixes (e.g. `/node_modules`) are checked first,
/// then `temp`, `dist`, and `public` in that order, so freshly compiled
/// output shadows published output. Directory hits resolve to their
/// `index.html`; paths with `..` segments resolve to nothing.
pub(crate) fn resolve(config: &PagesConfig, request_path: &str) -> Option<PathBuf> {
    for (prefix, dir) in &config.serve.routes {
        if let Some(rest) = strip_route_prefix(request_path, prefix) {
            let rest = sanitize(rest)?;
            return existing(config.root.join(dir).join(rest));
        }
    }

    let rel = sanitize(request_path)?;
    for base in [config.temp_dir(), config.dist_dir(), config.public_dir()] {
        if let Some(found) = existing(base.join(&rel)) {
            return Some(found);
        }
    }
    None
}

fn strip_route_prefix<'a>(path: &'a str, prefix: &str) -> Option<&'a str> {
    let rest = path.strip_prefix(prefix)?;
    if rest.is_empty() || rest.starts_with('/') {
        Some(rest)
    } else {
        None
    }
}

/// Normalize a request path into a relative path, rejecting traversal.
fn sanitize(path: &str) -> Option<PathBuf> {
    let mut rel = PathBuf::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => return None,
            s => rel.push(s),
        }
    }
    Some(rel)
}

/// The file at `path`, or its `index.html` when `path` is a directory.
fn existing(path: PathBuf) -> Option<PathBuf> {
    if path.is_dir() {
        let index = path.join("index.html");
        return index.is_file().then_some(index);
    }
    path.is_file().then_some(path)
}

fn file_response(path: &Path, bytes: Vec<u8>) -> Response {
    let mime = content_type(path);
    if mime == "text/html" {
        let html = inject_reload(&String::from_utf8_lossy(&bytes));
        return (
            [(header::CONTENT_TYPE, "text/html; charset=utf-8")],
            html,
        )
            .into_response();
    }
    ([(header::CONTENT_TYPE, mime)], bytes).into_response()
}

fn content_type(path: &Path) -> &'static str {
    match path.extension().and_then(|e| e.to_str()) {
        Some("html") => "text/html",
        Some("css") => "text/css",
        Some("js" | "mjs") => "text/javascript",
        Some("json" | "map") => "application/json",
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("svg") => "image/svg+xml",
        Some("ico") => "image/x-icon",
        Some("webp") => "image/webp",
        Some("woff") => "font/woff",
        Some("woff2") => "font/woff2",
        Some("ttf") => "font/ttf",
        Some("otf") => "font/otf",
        Some("txt") => "text/plain",
        _ => "application/octet-stream",
    }
}

/// Insert the reload client before `</body>`, or append when the page
/// has no closing body tag.
fn inject_reload(html: &str) -> String {
    match html.rfind("</body>") {
        Some(pos) => {
            let mut out = String::with_capacity(html.len() + RELOAD_SCRIPT_TAG.len());
            out.push_str(&html[..pos]);
            out.push_str(RELOAD_SCRIPT_TAG);
            out.push_str(&html[pos..]);
            out
        }
        None => format!("{html}{RELOAD_SCRIPT_TAG}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn project(root: &Path) -> PagesConfig {
        PagesConfig::with_root(root)
    }

    fn touch(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }

    #[test]
    fn test_resolve_prefers_temp_over_dist_and_public() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "temp/app.css", "temp");
        touch(dir.path(), "dist/app.css", "dist");
        touch(dir.path(), "public/app.css", "public");

        let config = project(dir.path());
        let found = resolve(&config, "/app.css").unwrap();
        assert_eq!(found, dir.path().join("temp/app.css"));
    }

    #[test]
    fn test_resolve_falls_back_through_bases() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "public/fav.ico", "x");

        let config = project(dir.path());
        let found = resolve(&config, "/fav.ico").unwrap();
        assert_eq!(found, dir.path().join("public/fav.ico"));
    }

    #[test]
    fn test_resolve_directory_serves_index() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "temp/index.html", "<html></html>");

        let config = project(dir.path());
        let found = resolve(&config, "/").unwrap();
        assert_eq!(found, dir.path().join("temp/index.html"));
    }

    #[test]
    fn test_resolve_route_override() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "node_modules/lib/lib.js", "x");

        let config = project(dir.path());
        let found = resolve(&config, "/node_modules/lib/lib.js").unwrap();
        assert_eq!(found, dir.path().join("node_modules/lib/lib.js"));

        // Prefix must end on a path boundary.
        assert!(resolve(&config, "/node_modulesX/lib.js").is_none());
    }

    #[test]
    fn test_resolve_rejects_traversal() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "secret.txt", "s");
        touch(dir.path(), "temp/index.html", "x");

        let config = project(dir.path());
        assert!(resolve(&config, "/../secret.txt").is_none());
        assert!(resolve(&config, "/node_modules/../secret.txt").is_none());
    }

    #[test]
    fn test_content_types() {
        assert_eq!(content_type(Path::new("a.css")), "text/css");
        assert_eq!(content_type(Path::new("a.woff2")), "font/woff2");
        assert_eq!(content_type(Path::new("a.bin")), "application/octet-stream");
    }

    #[test]
    fn test_inject_before_closing_body() {
        let html = "<html><body><p>hi</p></body></html>";
        let out = inject_reload(html);
        assert!(out.contains("reload.js"));
        assert!(out.ends_with("</body></html>"));
        let script_pos = out.find("reload.js").unwrap();
        let body_pos = out.find("</body>").unwrap();
        assert!(script_pos < body_pos);
    }

    #[test]
    fn test_inject_appends_without_body() {
        let out = inject_reload("<p>fragment</p>");
        assert!(out.starts_with("<p>fragment</p>"));
        assert!(out.contains("reload.js"));
    }
}
