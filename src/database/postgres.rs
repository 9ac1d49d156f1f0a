use async_trait::async_trait;
use sqlx::{postgres::PgPoolOptions, PgPool};
use std::time::Duration;
use tracing::info;
use uuid::Uuid;

use crate::books::BookQuery;
use crate::config::DatabaseConfig;
use crate::database::models::{Book, BookChange, BookUpdate, NewBook, NewBookChange, Profile, Role};
use crate::database::query_builder::QueryBuilder;
use crate::database::{LibraryStore, StoreError};

const PROFILE_COLUMNS: &str = "id, full_name, role, created_at";

/// Catalog tables in the platform's Postgres database
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.connection_timeout))
            .connect(&config.url)
            .await
            .map_err(|e| StoreError::Connection(e.to_string()))?;

        info!("Created database pool (max {} connections)", config.max_connections);
        Ok(Self { pool })
    }
}

#[async_trait]
impl LibraryStore for PgStore {
    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn get_profile(&self, id: Uuid) -> Result<Option<Profile>, StoreError> {
        let query = format!("SELECT {} FROM profiles WHERE id = $1", PROFILE_COLUMNS);
        let profile = sqlx::query_as::<_, Profile>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(profile)
    }

    async fn list_admins(&self) -> Result<Vec<Profile>, StoreError> {
        let query = format!(
            "SELECT {} FROM profiles WHERE role = $1 ORDER BY created_at DESC",
            PROFILE_COLUMNS
        );
        let profiles = sqlx::query_as::<_, Profile>(&query)
            .bind(Role::Admin.as_str())
            .fetch_all(&self.pool)
            .await?;
        Ok(profiles)
    }

    async fn set_role(&self, id: Uuid, role: Role) -> Result<(), StoreError> {
        let result = sqlx::query("UPDATE profiles SET role = $2 WHERE id = $1")
            .bind(id)
            .bind(role.as_str())
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("Profile {} not found", id)));
        }
        Ok(())
    }

    async fn insert_book(&self, book: NewBook) -> Result<Book, StoreError> {
        let row = sqlx::query_as::<_, Book>(
            r#"
            INSERT INTO books (
                id, title, author, subject, level, class_level, description,
                cover_url, file_path, pages, featured, keywords, upload_date
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, NOW())
            RETURNING *
            "#,
        )
        .bind(book.id)
        .bind(&book.title)
        .bind(&book.author)
        .bind(&book.subject)
        .bind(&book.level)
        .bind(&book.class_level)
        .bind(&book.description)
        .bind(&book.cover_url)
        .bind(&book.file_path)
        .bind(book.pages)
        .bind(book.featured)
        .bind(&book.keywords)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    async fn get_book(&self, id: Uuid) -> Result<Option<Book>, StoreError> {
        let book = sqlx::query_as::<_, Book>("SELECT * FROM books WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(book)
    }

    async fn update_book(&self, id: Uuid, update: &BookUpdate) -> Result<Option<Book>, StoreError> {
        let book = sqlx::query_as::<_, Book>(
            r#"
            UPDATE books
            SET title = $2, author = $3, subject = $4, level = $5,
                class_level = $6, description = $7, featured = $8
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&update.title)
        .bind(&update.author)
        .bind(&update.subject)
        .bind(&update.level)
        .bind(&update.class_level)
        .bind(&update.description)
        .bind(update.featured)
        .fetch_optional(&self.pool)
        .await?;
        Ok(book)
    }

    async fn delete_book(&self, id: Uuid) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM books WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_books(&self, query: &BookQuery) -> Result<(Vec<Book>, i64), StoreError> {
        let page = QueryBuilder::<Book>::new("books")?.filter(query.to_filter())?;
        let total = QueryBuilder::<Book>::new("books")?.filter(query.to_count_filter())?;

        let (books, total) = futures::try_join!(page.select_all(&self.pool), total.count(&self.pool))?;
        Ok((books, total))
    }

    async fn all_books(&self) -> Result<Vec<Book>, StoreError> {
        QueryBuilder::<Book>::new("books")?.select_all(&self.pool).await
    }

    async fn insert_change(&self, change: NewBookChange) -> Result<BookChange, StoreError> {
        let row = sqlx::query_as::<_, BookChange>(
            r#"
            INSERT INTO book_changes (id, book_id, admin_id, action, changes, created_at)
            VALUES ($1, $2, $3, $4, $5, NOW())
            RETURNING id, book_id, admin_id, action, changes, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(change.book_id)
        .bind(change.admin_id)
        .bind(change.action.as_str())
        .bind(&change.changes)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    async fn recent_changes(&self, limit: i64) -> Result<Vec<BookChange>, StoreError> {
        let rows = sqlx::query_as::<_, BookChange>(
            r#"
            SELECT id, book_id, admin_id, action, changes, created_at
            FROM book_changes
            ORDER BY created_at DESC
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}
