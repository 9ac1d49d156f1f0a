// handlers/functions/delete.rs - POST /functions/v1/delete-book-and-files

use axum::{body::Bytes, extract::State, Json};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::auth::AdminContext;
use crate::error::ApiError;
use crate::services::CatalogService;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
struct DeleteRequest {
    #[serde(default)]
    book_id: Option<Value>,
    #[serde(default)]
    confirm: Option<Value>,
}

impl DeleteRequest {
    fn book_id(&self) -> Result<Uuid, ApiError> {
        let raw = match &self.book_id {
            None | Some(Value::Null) => return Err(ApiError::bad_request("Book ID is required")),
            Some(Value::String(s)) if s.trim().is_empty() => return Err(ApiError::bad_request("Book ID is required")),
            Some(Value::String(s)) => s.trim().to_string(),
            Some(other) => other.to_string(),
        };

        if self.confirm != Some(Value::Bool(true)) {
            return Err(ApiError::bad_request("Confirmation required"));
        }

        // A malformed id cannot name an existing book
        Uuid::parse_str(&raw).map_err(|_| ApiError::not_found("Book not found"))
    }
}

/// POST /functions/v1/delete-book-and-files - Remove a book, its files and
/// its row. Body: `{ "book_id": "<uuid>", "confirm": true }`.
pub async fn delete_book_and_files(
    State(state): State<AppState>,
    admin: AdminContext,
    body: Bytes,
) -> Result<Json<Value>, ApiError> {
    let request: DeleteRequest =
        serde_json::from_slice(&body).map_err(|e| ApiError::invalid_json(format!("Invalid JSON body: {}", e)))?;
    let book_id = request.book_id()?;

    CatalogService::new(&state)
        .delete_book(admin.user_id, book_id)
        .await?;

    Ok(Json(json!({ "success": true, "message": "Book deleted successfully" })))
}
