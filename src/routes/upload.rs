//! Upload route
//!
//! POST /upload accepts a multipart form with a `file` field, hashes the
//! content and stores it unless identical content is already present.
//!
//! The `exists` lookup only short-circuits the common duplicate case. Two
//! concurrent uploads of the same bytes can both pass it; the loser is then
//! rejected by the store's uniqueness constraint and also gets a 409.

use axum::{
    extract::{
        multipart::{Field, MultipartError, MultipartRejection},
        DefaultBodyLimit, Multipart, State,
    },
    http::StatusCode,
    routing::post,
    Json, Router,
};
use serde::Serialize;

use crate::db::{NewFile, StoreError};
use crate::error::{AppError, Result};
use crate::hash::digest_stream;
use crate::state::AppState;

/// Multipart field carrying the upload
pub const FILE_FIELD: &str = "file";

const UPLOAD_SUCCESS_MESSAGE: &str = "File uploaded successfully";

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub message: &'static str,
    pub filename: String,
    pub hash: String,
}

/// Create the upload router
pub fn router(max_file_size: usize) -> Router<AppState> {
    Router::new()
        .route("/upload", post(upload_file))
        .layer(DefaultBodyLimit::max(max_file_size))
}

/// POST /upload
async fn upload_file(
    State(state): State<AppState>,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<Json<UploadResponse>> {
    let mut multipart = multipart.map_err(|rejection| {
        tracing::warn!("Rejected non-multipart upload: {}", rejection);
        no_file_uploaded()
    })?;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some(FILE_FIELD) {
            tracing::debug!(field = ?field.name(), "Skipping multipart field");
            continue;
        }

        return store_upload(&state, field).await;
    }

    tracing::warn!("No file field found in multipart upload");
    Err(no_file_uploaded())
}

/// Hash the file field, reject known content, insert the rest
async fn store_upload(state: &AppState, field: Field<'_>) -> Result<Json<UploadResponse>> {
    let filename = match field.file_name().and_then(base_file_name) {
        Some(name) => name.to_string(),
        None => {
            tracing::warn!("File field has no filename");
            return Err(no_file_uploaded());
        }
    };

    let hashed = digest_stream(field).await.map_err(multipart_error)?;

    tracing::debug!(
        file_name = %filename,
        hash = %hashed.hash,
        size = hashed.len(),
        "Received upload"
    );

    if state.store().exists(&hashed.hash).await? {
        tracing::info!(file_name = %filename, hash = %hashed.hash, "Duplicate upload rejected");
        return Err(file_exists());
    }

    let file = NewFile {
        hash: hashed.hash,
        name: filename,
        content: hashed.content,
    };

    let id = match state.store().insert(&file).await {
        Ok(id) => id,
        Err(StoreError::Duplicate(_)) => {
            tracing::info!(
                file_name = %file.name,
                hash = %file.hash,
                "Duplicate upload lost insert race"
            );
            return Err(file_exists());
        }
        Err(e) => return Err(e.into()),
    };

    tracing::info!(
        id = id,
        file_name = %file.name,
        hash = %file.hash,
        size = file.content.len(),
        "File stored successfully"
    );

    Ok(Json(UploadResponse {
        message: UPLOAD_SUCCESS_MESSAGE,
        filename: file.name,
        hash: file.hash,
    }))
}

fn no_file_uploaded() -> AppError {
    AppError::BadRequest("No file is uploaded".to_string())
}

fn file_exists() -> AppError {
    AppError::Conflict("File already exists".to_string())
}

/// Last path segment of a client-supplied filename; `None` if nothing is left
fn base_file_name(name: &str) -> Option<&str> {
    name.rsplit(['/', '\\']).find(|segment| !segment.is_empty())
}

/// Body-limit violations become 413 and malformed bodies 400. Only failures
/// on the server side of the read are internal errors.
fn multipart_error(err: MultipartError) -> AppError {
    let status = err.status();

    if status == StatusCode::PAYLOAD_TOO_LARGE {
        tracing::warn!("Upload exceeds body limit: {}", err);
        return AppError::PayloadTooLarge("File too large".to_string());
    }

    if status.is_client_error() {
        tracing::warn!("Malformed multipart body: {}", err);
        return no_file_uploaded();
    }

    AppError::Internal(format!("Failed to read multipart body: {}", err))
}
