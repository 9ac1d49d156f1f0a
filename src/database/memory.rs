use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::books::BookQuery;
use crate::database::models::{Book, BookChange, BookUpdate, NewBook, NewBookChange, Profile, Role};
use crate::database::{LibraryStore, StoreError};

#[derive(Default)]
struct Tables {
    books: Vec<Book>,
    profiles: HashMap<Uuid, Profile>,
    changes: Vec<BookChange>,
}

/// Process-local catalog for development and tests.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
    fail_book_inserts: AtomicBool,
    fail_change_inserts: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn put_profile(&self, profile: Profile) {
        self.tables.write().await.profiles.insert(profile.id, profile);
    }

    /// Inserts a fully-formed row, bypassing the upload path.
    pub async fn put_book(&self, book: Book) {
        self.tables.write().await.books.push(book);
    }

    pub async fn books(&self) -> Vec<Book> {
        self.tables.read().await.books.clone()
    }

    pub async fn changes(&self) -> Vec<BookChange> {
        self.tables.read().await.changes.clone()
    }

    /// Makes subsequent book inserts fail as if the database rejected them.
    pub fn fail_book_inserts(&self, fail: bool) {
        self.fail_book_inserts.store(fail, Ordering::SeqCst);
    }

    pub fn fail_change_inserts(&self, fail: bool) {
        self.fail_change_inserts.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl LibraryStore for MemoryStore {
    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }

    async fn get_profile(&self, id: Uuid) -> Result<Option<Profile>, StoreError> {
        Ok(self.tables.read().await.profiles.get(&id).cloned())
    }

    async fn list_admins(&self) -> Result<Vec<Profile>, StoreError> {
        let tables = self.tables.read().await;
        let mut admins: Vec<Profile> = tables
            .profiles
            .values()
            .filter(|p| p.role == Role::Admin)
            .cloned()
            .collect();
        admins.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(admins)
    }

    async fn set_role(&self, id: Uuid, role: Role) -> Result<(), StoreError> {
        let mut tables = self.tables.write().await;
        let profile = tables
            .profiles
            .get_mut(&id)
            .ok_or_else(|| StoreError::NotFound(format!("Profile {} not found", id)))?;
        profile.role = role;
        Ok(())
    }

    async fn insert_book(&self, book: NewBook) -> Result<Book, StoreError> {
        if self.fail_book_inserts.load(Ordering::SeqCst) {
            return Err(StoreError::Query("insert into books rejected".to_string()));
        }

        let row = Book {
            id: book.id,
            title: book.title,
            author: book.author,
            subject: book.subject,
            level: book.level,
            class_level: book.class_level,
            description: book.description,
            cover_url: book.cover_url,
            file_path: book.file_path,
            pages: book.pages,
            upload_date: Utc::now(),
            featured: book.featured,
            keywords: Some(book.keywords),
            popularity_score: None,
        };

        let mut tables = self.tables.write().await;
        if tables.books.iter().any(|b| b.id == row.id) {
            return Err(StoreError::Query(format!("duplicate key books.id = {}", row.id)));
        }
        tables.books.push(row.clone());
        Ok(row)
    }

    async fn get_book(&self, id: Uuid) -> Result<Option<Book>, StoreError> {
        Ok(self.tables.read().await.books.iter().find(|b| b.id == id).cloned())
    }

    async fn update_book(&self, id: Uuid, update: &BookUpdate) -> Result<Option<Book>, StoreError> {
        let mut tables = self.tables.write().await;
        Ok(tables.books.iter_mut().find(|b| b.id == id).map(|book| {
            book.apply(update);
            book.clone()
        }))
    }

    async fn delete_book(&self, id: Uuid) -> Result<bool, StoreError> {
        let mut tables = self.tables.write().await;
        let before = tables.books.len();
        tables.books.retain(|b| b.id != id);
        Ok(tables.books.len() < before)
    }

    async fn list_books(&self, query: &BookQuery) -> Result<(Vec<Book>, i64), StoreError> {
        let tables = self.tables.read().await;
        let mut matching: Vec<&Book> = tables.books.iter().filter(|b| query.matches(b)).collect();
        matching.sort_by(|a, b| b.upload_date.cmp(&a.upload_date));

        let total = matching.len() as i64;
        let page = matching
            .into_iter()
            .skip(query.offset() as usize)
            .take(crate::books::PAGE_SIZE as usize)
            .cloned()
            .collect();
        Ok((page, total))
    }

    async fn all_books(&self) -> Result<Vec<Book>, StoreError> {
        Ok(self.books().await)
    }

    async fn insert_change(&self, change: NewBookChange) -> Result<BookChange, StoreError> {
        if self.fail_change_inserts.load(Ordering::SeqCst) {
            return Err(StoreError::Query("insert into book_changes rejected".to_string()));
        }

        let row = BookChange {
            id: Uuid::new_v4(),
            book_id: Some(change.book_id),
            admin_id: Some(change.admin_id),
            action: change.action,
            changes: change.changes,
            created_at: Utc::now(),
        };
        self.tables.write().await.changes.push(row.clone());
        Ok(row)
    }

    async fn recent_changes(&self, limit: i64) -> Result<Vec<BookChange>, StoreError> {
        let tables = self.tables.read().await;
        // Insertion order breaks ties between equal timestamps
        let mut changes: Vec<BookChange> = tables.changes.iter().rev().cloned().collect();
        changes.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        changes.truncate(limit.max(0) as usize);
        Ok(changes)
    }
}
