use async_trait::async_trait;
use axum::body::Bytes;
use thiserror::Error;
use uuid::Uuid;

pub mod memory;
pub mod supabase;

pub use memory::MemoryStorage;
pub use supabase::SupabaseStorage;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Object already exists: {0}")]
    AlreadyExists(String),

    #[error("Object not found: {0}")]
    NotFound(String),

    #[error("Storage request failed with {status}: {message}")]
    Rejected { status: u16, message: String },

    #[error("Storage unreachable: {0}")]
    Transport(String),
}

impl From<reqwest::Error> for StorageError {
    fn from(err: reqwest::Error) -> Self {
        StorageError::Transport(err.to_string())
    }
}

/// Object storage holding each book's PDF and cover under `books/{id}/`.
/// Paths are relative to the configured bucket.
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Stores a new object; never overwrites.
    async fn upload(&self, path: &str, bytes: Bytes, content_type: &str) -> Result<(), StorageError>;

    /// Time-limited read URL for an existing object.
    async fn signed_url(&self, path: &str, ttl_secs: u64) -> Result<String, StorageError>;

    /// Every object path under `prefix`, at any depth.
    async fn list(&self, prefix: &str) -> Result<Vec<String>, StorageError>;

    async fn remove(&self, paths: &[String]) -> Result<(), StorageError>;
}

pub fn book_prefix(book_id: Uuid) -> String {
    format!("books/{}", book_id)
}

pub fn pdf_path(book_id: Uuid, file_name: &str) -> String {
    format!("{}/pdf/{}", book_prefix(book_id), file_name)
}

pub fn cover_path(book_id: Uuid, file_name: &str) -> String {
    format!("{}/cover/{}", book_prefix(book_id), file_name)
}
