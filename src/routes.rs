//! Router assembly.
//!
//! SYSTEM CONTEXT
//! ==============
//! The bookmark manager has no API; all of its state lives in the browser.
//! The server only hands out the built frontend bundle, so the router is a
//! single `ServeDir` over the dist directory. Directory requests resolve to
//! their `index.html`; anything missing is a plain 404.

use std::path::Path;

use axum::Router;
use tower_http::compression::CompressionLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

/// Static frontend router rooted at `dist_dir`.
pub fn app(dist_dir: &Path) -> Router {
    let static_files = ServeDir::new(dist_dir).append_index_html_on_directories(true);

    Router::new()
        .fallback_service(static_files)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
}

#[cfg(test)]
#[path = "routes_test.rs"]
mod tests;
