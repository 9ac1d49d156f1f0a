use axum::extract::{Query, State};
use serde::Serialize;
use std::collections::BTreeSet;

use crate::auth::AdminContext;
use crate::books::{BookPage, BookQuery};
use crate::middleware::{ApiResponse, ApiResult};
use crate::state::AppState;

/// Figures shown above the book table, computed over the current page.
#[derive(Debug, Serialize)]
pub struct PageStats {
    pub featured: usize,
    pub subjects: Vec<String>,
    pub levels: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct DashboardPage {
    #[serde(flatten)]
    pub page: BookPage,
    pub stats: PageStats,
}

impl From<BookPage> for DashboardPage {
    fn from(page: BookPage) -> Self {
        let subjects: BTreeSet<String> = page.books.iter().filter_map(|b| b.subject.clone()).collect();
        let levels: BTreeSet<String> = page.books.iter().filter_map(|b| b.level.clone()).collect();
        let stats = PageStats {
            featured: page.books.iter().filter(|b| b.featured).count(),
            subjects: subjects.into_iter().collect(),
            levels: levels.into_iter().collect(),
        };
        Self { page, stats }
    }
}

/// GET /dashboard?search=&level=&subject=&page= - Paged, filtered book list
pub async fn dashboard(
    State(state): State<AppState>,
    _admin: AdminContext,
    Query(query): Query<BookQuery>,
) -> ApiResult<DashboardPage> {
    let (books, total) = state.store.list_books(&query).await?;
    Ok(ApiResponse::success(query.into_page(books, total).into()))
}
