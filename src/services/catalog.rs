use serde_json::{json, Value};
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

use crate::books::upload::PDF_CONTENT_TYPE;
use crate::books::{count_pages, derive_keywords, ValidatedUpload};
use crate::config::UploadConfig;
use crate::database::models::{Book, BookUpdate, ChangeAction, NewBook, NewBookChange};
use crate::database::{LibraryStore, StoreError};
use crate::state::AppState;
use crate::storage::{self, ObjectStorage, StorageError};

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Book not found")]
    BookNotFound,

    #[error("Title is required")]
    TitleRequired,

    #[error("Error uploading files: {0}")]
    Upload(#[source] StorageError),

    #[error("Error inserting book record: {0}")]
    Insert(#[source] StoreError),

    #[error("Error deleting book record: {0}")]
    Delete(#[source] StoreError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Book mutations that touch storage and the audit log together.
pub struct CatalogService {
    store: Arc<dyn LibraryStore>,
    storage: Arc<dyn ObjectStorage>,
    upload: UploadConfig,
}

impl CatalogService {
    pub fn new(state: &AppState) -> Self {
        Self {
            store: state.store.clone(),
            storage: state.storage.clone(),
            upload: state.config.upload.clone(),
        }
    }

    /// Stores the files, then inserts the row and its `create` audit entry.
    ///
    /// Objects written before a later failure stay in storage; their paths
    /// are logged for manual cleanup.
    pub async fn create_book(&self, admin_id: Uuid, upload: ValidatedUpload) -> Result<Book, CatalogError> {
        let ValidatedUpload { metadata, pdf, cover } = upload;
        let book_id = Uuid::new_v4();

        let pdf_bytes = pdf.bytes.clone();
        let pages = tokio::task::spawn_blocking(move || count_pages(&pdf_bytes))
            .await
            .unwrap_or_else(|e| {
                tracing::warn!("Page counting task failed: {}", e);
                None
            });
        let keywords = derive_keywords(&metadata.title, metadata.subject.as_deref());

        let pdf_path = storage::pdf_path(book_id, &pdf.storage_name());
        let cover_path = cover.as_ref().map(|c| storage::cover_path(book_id, &c.storage_name()));

        self.storage
            .upload(&pdf_path, pdf.bytes, PDF_CONTENT_TYPE)
            .await
            .map_err(CatalogError::Upload)?;
        let mut stored = vec![pdf_path.clone()];

        if let (Some(cover), Some(path)) = (cover, cover_path.as_deref()) {
            if let Err(e) = self.storage.upload(path, cover.bytes, &cover.content_type).await {
                log_orphans(book_id, &stored);
                return Err(CatalogError::Upload(e));
            }
            stored.push(path.to_string());
        }

        let ttl = self.upload.signed_url_ttl_secs;
        let (file_url, cover_url) = futures::join!(self.sign(&pdf_path, ttl), async {
            match cover_path.as_deref() {
                Some(path) => self.sign(path, ttl).await,
                None => None,
            }
        });

        let new_book = NewBook {
            id: book_id,
            title: metadata.title.clone(),
            author: metadata.author.clone(),
            subject: metadata.subject.clone(),
            level: metadata.level.clone(),
            class_level: metadata.class_level.clone(),
            description: metadata.description.clone(),
            cover_url,
            file_path: file_url,
            pages,
            featured: metadata.featured,
            keywords: keywords.clone(),
        };

        let book = match self.store.insert_book(new_book).await {
            Ok(book) => book,
            Err(e) => {
                log_orphans(book_id, &stored);
                return Err(CatalogError::Insert(e));
            }
        };

        self.audit(
            admin_id,
            book_id,
            ChangeAction::Create,
            json!({
                "title": metadata.title,
                "author": metadata.author,
                "subject": metadata.subject,
                "level": metadata.level,
                "class_level": metadata.class_level,
                "description": metadata.description,
                "featured": metadata.featured,
                "pages": pages,
                "keywords": keywords,
            }),
        )
        .await;

        tracing::info!("Book {} created by {}", book_id, admin_id);
        Ok(book)
    }

    /// Replaces editable metadata; keywords and files are left alone.
    pub async fn update_book(&self, admin_id: Uuid, book_id: Uuid, update: BookUpdate) -> Result<Book, CatalogError> {
        let update = update.normalized();
        if update.title.is_empty() {
            return Err(CatalogError::TitleRequired);
        }

        let book = self
            .store
            .update_book(book_id, &update)
            .await?
            .ok_or(CatalogError::BookNotFound)?;

        self.audit(
            admin_id,
            book_id,
            ChangeAction::Update,
            json!({
                "title": update.title,
                "author": update.author,
                "subject": update.subject,
                "level": update.level,
                "class_level": update.class_level,
                "description": update.description,
                "featured": update.featured,
            }),
        )
        .await;

        Ok(book)
    }

    /// Removes every stored object of the book, then its row. Storage
    /// failures are logged and never block the row deletion.
    pub async fn delete_book(&self, admin_id: Uuid, book_id: Uuid) -> Result<Book, CatalogError> {
        let book = match self.store.get_book(book_id).await {
            Ok(Some(book)) => book,
            Ok(None) => return Err(CatalogError::BookNotFound),
            Err(e) => {
                tracing::error!("Error looking up book {}: {}", book_id, e);
                return Err(CatalogError::BookNotFound);
            }
        };

        self.remove_files(book_id).await;

        match self.store.delete_book(book_id).await {
            Ok(true) => {}
            Ok(false) => return Err(CatalogError::BookNotFound),
            Err(e) => return Err(CatalogError::Delete(e)),
        }

        self.audit(
            admin_id,
            book_id,
            ChangeAction::Delete,
            json!({
                "deleted_book": {
                    "title": book.title,
                    "author": book.author,
                    "subject": book.subject,
                    "level": book.level,
                    "class_level": book.class_level,
                }
            }),
        )
        .await;

        tracing::info!("Book {} deleted by {}", book_id, admin_id);
        Ok(book)
    }

    async fn remove_files(&self, book_id: Uuid) {
        let prefix = storage::book_prefix(book_id);
        let paths = match self.storage.list(&prefix).await {
            Ok(paths) => paths,
            Err(e) => {
                tracing::error!("Error listing files under {}: {}", prefix, e);
                return;
            }
        };
        if paths.is_empty() {
            return;
        }
        if let Err(e) = self.storage.remove(&paths).await {
            tracing::error!("Error deleting files {:?}: {}", paths, e);
        }
    }

    async fn sign(&self, path: &str, ttl_secs: u64) -> Option<String> {
        match self.storage.signed_url(path, ttl_secs).await {
            Ok(url) => Some(url),
            Err(e) => {
                tracing::warn!("Could not sign {}: {}", path, e);
                None
            }
        }
    }

    // A missing audit row never fails the mutation it describes
    async fn audit(&self, admin_id: Uuid, book_id: Uuid, action: ChangeAction, changes: Value) {
        let change = NewBookChange { book_id, admin_id, action, changes };
        if let Err(e) = self.store.insert_change(change).await {
            tracing::error!("Error recording {} of book {}: {}", action.as_str(), book_id, e);
        }
    }
}

fn log_orphans(book_id: Uuid, paths: &[String]) {
    tracing::error!(
        "Upload of book {} failed after storing {:?}; objects left in storage",
        book_id,
        paths
    );
}
