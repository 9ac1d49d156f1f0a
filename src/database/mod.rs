use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::books::BookQuery;
use crate::database::models::{Book, BookChange, BookUpdate, NewBook, NewBookChange, Profile, Role};
use crate::filter::FilterError;

pub mod memory;
pub mod models;
pub mod postgres;
pub mod query_builder;

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Errors from a [`LibraryStore`]
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Query error: {0}")]
    Query(String),

    #[error("Invalid filter: {0}")]
    Filter(#[from] FilterError),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

/// Catalog database: books, admin profiles and the book audit log.
#[async_trait]
pub trait LibraryStore: Send + Sync {
    /// Cheap round-trip for health checks
    async fn ping(&self) -> Result<(), StoreError>;

    async fn get_profile(&self, id: Uuid) -> Result<Option<Profile>, StoreError>;

    /// Admin profiles, newest first.
    async fn list_admins(&self) -> Result<Vec<Profile>, StoreError>;

    /// Fails with `NotFound` when no such profile exists.
    async fn set_role(&self, id: Uuid, role: Role) -> Result<(), StoreError>;

    async fn insert_book(&self, book: NewBook) -> Result<Book, StoreError>;

    async fn get_book(&self, id: Uuid) -> Result<Option<Book>, StoreError>;

    /// Applies editable metadata; `None` when the book does not exist.
    async fn update_book(&self, id: Uuid, update: &BookUpdate) -> Result<Option<Book>, StoreError>;

    /// Returns whether a row was removed.
    async fn delete_book(&self, id: Uuid) -> Result<bool, StoreError>;

    /// One dashboard page plus the total number of matching rows.
    async fn list_books(&self, query: &BookQuery) -> Result<(Vec<Book>, i64), StoreError>;

    /// Every book, for aggregate reporting.
    async fn all_books(&self) -> Result<Vec<Book>, StoreError>;

    async fn insert_change(&self, change: NewBookChange) -> Result<BookChange, StoreError>;

    /// Most recent audit entries first.
    async fn recent_changes(&self, limit: i64) -> Result<Vec<BookChange>, StoreError>;
}
