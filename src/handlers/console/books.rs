use axum::extract::{rejection::JsonRejection, Path, State};
use axum::Json;
use uuid::Uuid;

use crate::auth::AdminContext;
use crate::database::models::{Book, BookUpdate};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::CatalogService;
use crate::state::AppState;

fn parse_book_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| ApiError::not_found("Book not found"))
}

/// GET /books/:id - Book detail
pub async fn book_detail(
    State(state): State<AppState>,
    _admin: AdminContext,
    Path(id): Path<String>,
) -> ApiResult<Book> {
    let book = state
        .store
        .get_book(parse_book_id(&id)?)
        .await?
        .ok_or_else(|| ApiError::not_found("Book not found"))?;
    Ok(ApiResponse::success(book))
}

/// PUT /books/:id/edit - Replace editable metadata and record an `update`
/// audit entry
pub async fn book_edit(
    State(state): State<AppState>,
    admin: AdminContext,
    Path(id): Path<String>,
    body: Result<Json<BookUpdate>, JsonRejection>,
) -> ApiResult<Book> {
    let book_id = parse_book_id(&id)?;
    let Json(update) = body.map_err(|e| ApiError::invalid_json(e.body_text()))?;

    let book = CatalogService::new(&state)
        .update_book(admin.user_id, book_id, update)
        .await?;
    Ok(ApiResponse::success(book))
}
