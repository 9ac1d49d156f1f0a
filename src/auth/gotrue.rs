use async_trait::async_trait;
use chrono::Utc;
use reqwest::{Client, Response};
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use uuid::Uuid;

use crate::auth::{AuthError, AuthSession, IdentityGateway};
use crate::config::BackendConfig;

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    expires_at: Option<i64>,
    user: UserResponse,
}

#[derive(Debug, Deserialize)]
struct UserResponse {
    id: Uuid,
    #[serde(default)]
    email: Option<String>,
}

impl From<TokenResponse> for AuthSession {
    fn from(token: TokenResponse) -> Self {
        let expires_at = token
            .expires_at
            .unwrap_or_else(|| Utc::now().timestamp() + token.expires_in.unwrap_or(3600));
        AuthSession {
            access_token: token.access_token,
            refresh_token: token.refresh_token,
            expires_at,
            user_id: token.user.id,
            email: token.user.email,
        }
    }
}

/// Auth REST API (`/auth/v1`) of the hosted platform
pub struct GoTrueIdentity {
    client: Client,
    base_url: String,
    anon_key: String,
    service_key: String,
}

impl GoTrueIdentity {
    pub fn new(backend: &BackendConfig) -> Result<Self, AuthError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(backend.http_timeout_secs))
            .build()?;
        Ok(Self {
            client,
            base_url: format!("{}/auth/v1", backend.url.trim_end_matches('/')),
            anon_key: backend.anon_key.clone(),
            service_key: backend.service_role_key.clone(),
        })
    }

    async fn token_grant(&self, grant_type: &str, body: serde_json::Value) -> Result<AuthSession, AuthError> {
        let response = self
            .client
            .post(format!("{}/token", self.base_url))
            .query(&[("grant_type", grant_type)])
            .header("apikey", &self.anon_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if status.is_client_error() {
            let message = response.text().await.unwrap_or_default();
            return Err(AuthError::SignInFailed(message));
        }
        let token: TokenResponse = Self::check(response).await?.json().await?;
        Ok(token.into())
    }

    async fn check(response: Response) -> Result<Response, AuthError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let message = response.text().await.unwrap_or_default();
        Err(AuthError::Provider(format!("{}: {}", status, message)))
    }
}

#[async_trait]
impl IdentityGateway for GoTrueIdentity {
    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession, AuthError> {
        self.token_grant("password", json!({ "email": email, "password": password }))
            .await
    }

    async fn refresh(&self, refresh_token: &str) -> Result<AuthSession, AuthError> {
        self.token_grant("refresh_token", json!({ "refresh_token": refresh_token }))
            .await
    }

    async fn sign_out(&self, access_token: &str) -> Result<(), AuthError> {
        let response = self
            .client
            .post(format!("{}/logout", self.base_url))
            .header("apikey", &self.anon_key)
            .bearer_auth(access_token)
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    async fn invite(&self, email: &str) -> Result<Uuid, AuthError> {
        let response = self
            .client
            .post(format!("{}/invite", self.base_url))
            .header("apikey", &self.service_key)
            .bearer_auth(&self.service_key)
            .json(&json!({ "email": email }))
            .send()
            .await?;

        match Self::check(response).await {
            Ok(response) => {
                let user: UserResponse = response.json().await?;
                Ok(user.id)
            }
            Err(invite_err) => {
                // Projects without invite mail fall back to a plain sign-up
                // with a throwaway password; the user resets it by email.
                tracing::warn!("Invite failed, falling back to sign-up: {}", invite_err);
                let response = self
                    .client
                    .post(format!("{}/signup", self.base_url))
                    .header("apikey", &self.anon_key)
                    .json(&json!({ "email": email, "password": Uuid::new_v4().simple().to_string() }))
                    .send()
                    .await?;

                #[derive(Deserialize)]
                struct SignUpResponse {
                    #[serde(default)]
                    id: Option<Uuid>,
                    #[serde(default)]
                    user: Option<UserResponse>,
                }

                let body: SignUpResponse = Self::check(response).await?.json().await?;
                body.user
                    .map(|u| u.id)
                    .or(body.id)
                    .ok_or_else(|| AuthError::Provider("sign-up returned no user".to_string()))
            }
        }
    }
}
