use axum::{
    extract::{rejection::JsonRejection, State},
    http::{header, HeaderMap},
    response::{AppendHeaders, IntoResponse},
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::auth::session::{access_token, clear_cookie, set_cookie};
use crate::auth::{AuthError, AuthSession};
use crate::config::SecurityConfig;
use crate::error::ApiError;
use crate::middleware::ApiResponse;
use crate::state::AppState;

const REFRESH_COOKIE_MAX_AGE: i64 = 30 * 24 * 60 * 60;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub user_id: Uuid,
    pub email: Option<String>,
    pub access_token: String,
    pub expires_at: i64,
}

impl From<&AuthSession> for LoginResponse {
    fn from(session: &AuthSession) -> Self {
        Self {
            user_id: session.user_id,
            email: session.email.clone(),
            access_token: session.access_token.clone(),
            expires_at: session.expires_at,
        }
    }
}

/// `Set-Cookie` headers carrying both tokens of a session.
pub(crate) fn session_cookies(
    security: &SecurityConfig,
    session: &AuthSession,
) -> AppendHeaders<[(header::HeaderName, String); 2]> {
    let access_max_age = session.expires_at - Utc::now().timestamp();
    AppendHeaders([
        (
            header::SET_COOKIE,
            set_cookie(&security.session_cookie, &session.access_token, access_max_age, security.secure_cookies),
        ),
        (
            header::SET_COOKIE,
            set_cookie(&security.refresh_cookie, &session.refresh_token, REFRESH_COOKIE_MAX_AGE, security.secure_cookies),
        ),
    ])
}

/// GET /login - Describes how to sign in; signed-in users are redirected
/// to the dashboard before reaching this.
pub async fn login_form() -> ApiResponse<Value> {
    ApiResponse::success(json!({
        "method": "POST",
        "path": "/login",
        "fields": ["email", "password"]
    }))
}

/// POST /login - Password sign-in at the auth provider
pub async fn login(
    State(state): State<AppState>,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(request) = body.map_err(|e| ApiError::invalid_json(e.body_text()))?;
    if request.email.trim().is_empty() || request.password.is_empty() {
        return Err(ApiError::bad_request("Email and password are required"));
    }

    let session = state
        .identity
        .sign_in(request.email.trim(), &request.password)
        .await
        .map_err(|e| match e {
            AuthError::Provider(_) | AuthError::Signing(_) => ApiError::from(e),
            other => {
                tracing::info!("Login rejected for {}: {}", request.email.trim(), other);
                ApiError::unauthorized("Authentication failed")
            }
        })?;

    tracing::info!("User {} signed in", session.user_id);
    Ok((
        session_cookies(&state.config.security, &session),
        ApiResponse::success(LoginResponse::from(&session)),
    ))
}

/// POST /logout - Best-effort sign-out at the provider; cookies are always
/// cleared.
pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> impl IntoResponse {
    let security = &state.config.security;

    if let Ok(token) = access_token(&headers, &security.session_cookie) {
        if let Err(e) = state.identity.sign_out(&token).await {
            tracing::warn!("Provider sign-out failed: {}", e);
        }
    }

    (
        AppendHeaders([
            (header::SET_COOKIE, clear_cookie(&security.session_cookie, security.secure_cookies)),
            (header::SET_COOKIE, clear_cookie(&security.refresh_cookie, security.secure_cookies)),
        ]),
        ApiResponse::success(json!({ "signed_out": true })),
    )
}
