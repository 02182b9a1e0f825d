//! File Dedup Server Library
//!
//! Accepts multipart file uploads, deduplicates them by SHA-256 content
//! hash and persists them in SQLite. The server binary is in main.rs.
//!
//! # Modules
//!
//! - `hash`: Streaming content hashing
//! - `db`: SQLite pool, schema and the `FileStore` abstraction
//! - `routes`: HTTP handlers for `/ping`, `/health`, `/upload` and `/files`

use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub mod config;
pub mod db;
pub mod error;
pub mod hash;
pub mod routes;
pub mod state;

#[cfg(test)]
mod test_support;

use state::AppState;

/// Assemble the application router with its middleware stack
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let max_file_size = state.config().upload.max_file_size;

    Router::new()
        .merge(routes::health::router())
        .merge(routes::upload::router(max_file_size))
        .merge(routes::files::router())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
