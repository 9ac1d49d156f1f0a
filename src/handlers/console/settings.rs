use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::HeaderMap,
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::auth::session::cookie_value;
use crate::auth::AdminContext;
use crate::database::models::{Profile, Role};
use crate::database::StoreError;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};
use crate::state::AppState;

use super::login::{session_cookies, LoginResponse};

#[derive(Debug, Serialize)]
pub struct SettingsView {
    pub email: Option<String>,
    pub profile: Profile,
    pub admins: Vec<Profile>,
}

#[derive(Debug, Deserialize)]
pub struct InviteRequest {
    #[serde(default)]
    pub email: String,
}

/// GET /settings - Caller's profile and every admin, newest first
pub async fn settings(State(state): State<AppState>, admin: AdminContext) -> ApiResult<SettingsView> {
    let admins = state.store.list_admins().await?;
    Ok(ApiResponse::success(SettingsView {
        email: admin.email,
        profile: admin.profile,
        admins,
    }))
}

/// POST /settings/invite - Invite a new user by email
pub async fn invite(
    State(state): State<AppState>,
    admin: AdminContext,
    body: Result<Json<InviteRequest>, JsonRejection>,
) -> ApiResult<Value> {
    let Json(request) = body.map_err(|e| ApiError::invalid_json(e.body_text()))?;
    let email = request.email.trim();
    if email.is_empty() {
        return Err(ApiError::bad_request("Email is required"));
    }

    let user_id = state.identity.invite(email).await?;
    tracing::info!("{} invited {} ({})", admin.user_id, email, user_id);
    Ok(ApiResponse::success(json!({ "email": email, "user_id": user_id })))
}

/// POST /settings/admins/:id/revoke - Demote an admin to a regular user
pub async fn revoke_admin(
    State(state): State<AppState>,
    admin: AdminContext,
    Path(id): Path<String>,
) -> ApiResult<Value> {
    let profile_id = Uuid::parse_str(&id).map_err(|_| ApiError::not_found("Profile not found"))?;

    state
        .store
        .set_role(profile_id, Role::User)
        .await
        .map_err(|e| match e {
            StoreError::NotFound(_) => ApiError::not_found("Profile not found"),
            other => other.into(),
        })?;

    tracing::info!("{} revoked admin role of {}", admin.user_id, profile_id);
    Ok(ApiResponse::success(json!({ "id": profile_id, "role": Role::User.as_str() })))
}

/// POST /settings/session/refresh - Exchange the refresh cookie for a new
/// session
pub async fn refresh_session(
    State(state): State<AppState>,
    _admin: AdminContext,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    let security = &state.config.security;
    let refresh_token =
        cookie_value(&headers, &security.refresh_cookie).ok_or_else(|| ApiError::unauthorized("No refresh token"))?;

    let session = state.identity.refresh(&refresh_token).await.map_err(|e| {
        tracing::info!("Session refresh rejected: {}", e);
        ApiError::unauthorized("Failed to refresh session")
    })?;

    Ok((
        session_cookies(security, &session),
        ApiResponse::success(LoginResponse::from(&session)),
    ))
}
