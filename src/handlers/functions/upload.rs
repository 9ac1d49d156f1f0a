// handlers/functions/upload.rs - POST /functions/v1/upload-and-insert

use axum::{
    extract::{multipart::MultipartRejection, Multipart, State},
    Json,
};
use serde_json::{json, Value};

use crate::auth::AdminContext;
use crate::books::UploadForm;
use crate::error::ApiError;
use crate::services::CatalogService;
use crate::state::AppState;

/// POST /functions/v1/upload-and-insert - Store a new book and its files
///
/// Multipart fields: `title` and `pdf` are required; `cover`, `author`,
/// `subject`, `level`, `class_level`, `description` and `featured` are
/// optional. Responds with:
///
/// ```json
/// { "success": true, "book": { "id": "...", "title": "...", "pages": 42 } }
/// ```
///
/// Every validation failure happens before anything is written.
pub async fn upload_and_insert(
    State(state): State<AppState>,
    admin: AdminContext,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<Value>, ApiError> {
    let multipart = multipart.map_err(|e| ApiError::bad_request(format!("Invalid multipart body: {}", e.body_text())))?;

    let upload = UploadForm::from_multipart(multipart)
        .await?
        .validate(&state.config.upload)?;

    let book = CatalogService::new(&state)
        .create_book(admin.user_id, upload)
        .await?;

    Ok(Json(json!({ "success": true, "book": book })))
}
