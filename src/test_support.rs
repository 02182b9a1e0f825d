//! Shared helpers for in-crate tests

use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use serde_json::Value;
use sqlx::sqlite::SqliteConnectOptions;
use tempfile::TempDir;
use tower::ServiceExt;

use crate::config::Config;
use crate::db::{self, FileStore, FileSummary, NewFile, SqliteFileStore, StoreError};
use crate::state::AppState;

const BOUNDARY: &str = "----dedup-test-boundary";

/// A file store backed by a fresh on-disk database. Keep the `TempDir`
/// alive for as long as the store is used.
pub async fn temp_store() -> (TempDir, SqliteFileStore) {
    let dir = TempDir::new().unwrap();
    let options = SqliteConnectOptions::new().filename(dir.path().join("files.db"));
    let pool = db::create_pool_with(options).await.unwrap();
    (dir, SqliteFileStore::new(pool))
}

pub async fn test_app() -> (TempDir, Router) {
    let (dir, store) = temp_store().await;
    (dir, app_with_store(Arc::new(store)))
}

pub fn app_with_store(store: Arc<dyn FileStore>) -> Router {
    app_with_config(Config::default(), store)
}

pub fn app_with_config(config: Config, store: Arc<dyn FileStore>) -> Router {
    crate::build_router(AppState::new(config, store))
}

/// Build a single-part multipart body. Returns (content type, body).
pub fn multipart_body(field: &str, filename: Option<&str>, content: &[u8]) -> (String, Vec<u8>) {
    let disposition = match filename {
        Some(name) => format!("form-data; name=\"{field}\"; filename=\"{name}\""),
        None => format!("form-data; name=\"{field}\""),
    };

    let mut body = Vec::new();
    body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
    body.extend_from_slice(format!("Content-Disposition: {disposition}\r\n").as_bytes());
    body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
    body.extend_from_slice(content);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

    (format!("multipart/form-data; boundary={BOUNDARY}"), body)
}

pub async fn get(app: &Router, uri: &str) -> (StatusCode, Value) {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    send(app, request).await
}

pub async fn post_multipart(
    app: &Router,
    content_type: &str,
    body: Vec<u8>,
) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri("/upload")
        .header(header::CONTENT_TYPE, content_type)
        .body(Body::from(body))
        .unwrap();
    send(app, request).await
}

/// Upload `content` in the `file` field under `filename`
pub async fn upload(app: &Router, filename: &str, content: &[u8]) -> (StatusCode, Value) {
    let (content_type, body) = multipart_body("file", Some(filename), content);
    post_multipart(app, &content_type, body).await
}

/// Non-JSON bodies (axum extractor rejections) come back as `Value::Null`
async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

/// Every operation fails with a storage error
pub struct FailingStore;

#[async_trait]
impl FileStore for FailingStore {
    async fn exists(&self, _hash: &str) -> Result<bool, StoreError> {
        Err(StoreError::Database(sqlx::Error::PoolTimedOut))
    }

    async fn insert(&self, _file: &NewFile) -> Result<i64, StoreError> {
        Err(StoreError::Database(sqlx::Error::PoolTimedOut))
    }

    async fn list_all(&self) -> Result<Vec<FileSummary>, StoreError> {
        Err(StoreError::Database(sqlx::Error::PoolTimedOut))
    }
}

/// Reports every hash as absent, then loses the insert to a concurrent writer
pub struct RacingStore;

#[async_trait]
impl FileStore for RacingStore {
    async fn exists(&self, _hash: &str) -> Result<bool, StoreError> {
        Ok(false)
    }

    async fn insert(&self, file: &NewFile) -> Result<i64, StoreError> {
        Err(StoreError::Duplicate(file.hash.clone()))
    }

    async fn list_all(&self) -> Result<Vec<FileSummary>, StoreError> {
        Ok(Vec::new())
    }
}
