//! File record storage
//!
//! The `FileStore` trait is what handlers depend on; `SqliteFileStore` is the
//! production implementation. The UNIQUE constraint on `files.hash` is the
//! source of truth for deduplication: `exists` is only a fast path and may
//! race with a concurrent insert of the same content.

use async_trait::async_trait;
use serde::Serialize;
use sqlx::SqlitePool;

/// A file to be inserted
#[derive(Debug, Clone)]
pub struct NewFile {
    pub hash: String,
    pub name: String,
    pub content: Vec<u8>,
}

/// Listing row: record metadata without content
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct FileSummary {
    pub id: i64,
    pub hash: String,
    pub name: String,
}

/// File store errors
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("File with hash {0} already exists")]
    Duplicate(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Persistent, create-only storage of file records keyed by content hash
#[async_trait]
pub trait FileStore: Send + Sync {
    /// Whether a record with exactly this hash has been committed
    async fn exists(&self, hash: &str) -> Result<bool, StoreError>;

    /// Insert a record and return its id.
    ///
    /// Fails with `StoreError::Duplicate` if the hash is already present,
    /// leaving the store unchanged.
    async fn insert(&self, file: &NewFile) -> Result<i64, StoreError>;

    /// Metadata of every record, ordered by id
    async fn list_all(&self) -> Result<Vec<FileSummary>, StoreError>;
}

/// SQLite-backed file store
#[derive(Clone)]
pub struct SqliteFileStore {
    pool: SqlitePool,
}

impl SqliteFileStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl FileStore for SqliteFileStore {
    async fn exists(&self, hash: &str) -> Result<bool, StoreError> {
        let found: i64 = sqlx::query_scalar(
            r#"
            SELECT EXISTS(SELECT 1 FROM files WHERE hash = ?)
            "#,
        )
        .bind(hash)
        .fetch_one(&self.pool)
        .await?;

        Ok(found != 0)
    }

    async fn insert(&self, file: &NewFile) -> Result<i64, StoreError> {
        let result = sqlx::query(
            r#"
            INSERT INTO files (hash, name, content)
            VALUES (?, ?, ?)
            "#,
        )
        .bind(&file.hash)
        .bind(&file.name)
        .bind(&file.content)
        .execute(&self.pool)
        .await;

        match result {
            Ok(done) => Ok(done.last_insert_rowid()),
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                Err(StoreError::Duplicate(file.hash.clone()))
            }
            Err(e) => Err(StoreError::Database(e)),
        }
    }

    async fn list_all(&self) -> Result<Vec<FileSummary>, StoreError> {
        let files = sqlx::query_as::<_, FileSummary>(
            r#"
            SELECT id, hash, name
            FROM files
            ORDER BY id ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(files)
    }
}
