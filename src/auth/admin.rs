use axum::{async_trait, extract::FromRequestParts, http::request::Parts, http::HeaderMap};
use uuid::Uuid;

use crate::auth::session::access_token;
use crate::auth::AuthError;
use crate::database::models::{Profile, Role};
use crate::error::ApiError;
use crate::state::AppState;

/// Caller that passed the admin capability check
#[derive(Debug, Clone)]
pub struct AdminContext {
    pub user_id: Uuid,
    pub email: Option<String>,
    pub profile: Profile,
    pub access_token: String,
}

/// The one role check shared by the upload and delete handlers and every
/// console endpoint: a valid access token whose subject has an admin
/// profile.
pub async fn require_admin(state: &AppState, headers: &HeaderMap) -> Result<AdminContext, AuthError> {
    let token = access_token(headers, &state.config.security.session_cookie)?;
    let claims = state.tokens.verify(&token)?;

    match state.store.get_profile(claims.sub).await? {
        Some(profile) if profile.role == Role::Admin => Ok(AdminContext {
            user_id: claims.sub,
            email: claims.email,
            profile,
            access_token: token,
        }),
        Some(_) | None => {
            tracing::warn!("Rejected non-admin caller {}", claims.sub);
            Err(AuthError::NotAdmin)
        }
    }
}

#[async_trait]
impl FromRequestParts<AppState> for AdminContext {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        Ok(require_admin(state, &parts.headers).await?)
    }
}
