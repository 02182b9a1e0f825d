//! File listing route
//!
//! Returns metadata of every stored file. Content bytes are never included.

use axum::{extract::State, routing::get, Json, Router};

use crate::db::FileSummary;
use crate::error::Result;
use crate::state::AppState;

/// Create the files router
pub fn router() -> Router<AppState> {
    Router::new().route("/files", get(list_files))
}

/// GET /files
async fn list_files(State(state): State<AppState>) -> Result<Json<Vec<FileSummary>>> {
    let files = state.store().list_all().await?;

    tracing::debug!(count = files.len(), "Listed files");

    Ok(Json(files))
}
