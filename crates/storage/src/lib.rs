//! Storage layer: a JSON key/value store the rest of the server writes through.
//!
//! Two backends: SQLite (durable, default) and an in-process map for tests and
//! throwaway instances. `open` performs the backend's initialization and is
//! the body of the server's storage-init stage.

pub mod memory;
pub mod sqlite;

use std::sync::Arc;

use {
    async_trait::async_trait,
    scribe_config::{StorageBackend, StorageConfig},
    tracing::info,
};

pub use {memory::MemoryStore, sqlite::SqliteStore};

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("sqlite: {0}")]
    Sqlite(#[from] sqlx::Error),
    #[error("value codec: {0}")]
    Codec(#[from] serde_json::Error),
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

pub type StorageResult<T> = Result<T, StorageError>;

#[async_trait]
pub trait Store: Send + Sync {
    async fn get(&self, key: &str) -> StorageResult<Option<serde_json::Value>>;
    async fn set(&self, key: &str, value: &serde_json::Value) -> StorageResult<()>;

    /// Backend name for logs.
    fn backend(&self) -> &'static str;
}

/// Open and initialize the configured backend.
pub async fn open(config: &StorageConfig) -> StorageResult<Arc<dyn Store>> {
    let store: Arc<dyn Store> = match config.backend {
        StorageBackend::Memory => Arc::new(MemoryStore::new()),
        StorageBackend::Sqlite => Arc::new(SqliteStore::open(&config.path).await?),
    };
    info!(backend = store.backend(), "storage ready");
    Ok(store)
}
