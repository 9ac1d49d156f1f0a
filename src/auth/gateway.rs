use async_trait::async_trait;
use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::auth::{AuthError, Claims, TokenKeys};

/// Tokens handed out by the auth provider after sign-in or refresh
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthSession {
    pub access_token: String,
    pub refresh_token: String,
    /// Unix seconds
    pub expires_at: i64,
    pub user_id: Uuid,
    pub email: Option<String>,
}

/// The hosted auth provider: password sign-in, refresh, sign-out, invites.
#[async_trait]
pub trait IdentityGateway: Send + Sync {
    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession, AuthError>;

    async fn refresh(&self, refresh_token: &str) -> Result<AuthSession, AuthError>;

    /// Revokes the refresh tokens behind an access token.
    async fn sign_out(&self, access_token: &str) -> Result<(), AuthError>;

    /// Sends an invitation and returns the invited identity.
    async fn invite(&self, email: &str) -> Result<Uuid, AuthError>;
}

struct MemoryUser {
    id: Uuid,
    password: Option<String>,
}

/// Auth provider stand-in that mints tokens with the service's own keys.
pub struct MemoryIdentity {
    keys: Arc<TokenKeys>,
    session_ttl: Duration,
    users: RwLock<HashMap<String, MemoryUser>>,
    refresh_tokens: RwLock<HashMap<String, (Uuid, String)>>,
    invited: RwLock<Vec<String>>,
}

impl MemoryIdentity {
    pub fn new(keys: Arc<TokenKeys>) -> Self {
        Self {
            keys,
            session_ttl: Duration::hours(1),
            users: RwLock::new(HashMap::new()),
            refresh_tokens: RwLock::new(HashMap::new()),
            invited: RwLock::new(Vec::new()),
        }
    }

    /// Registers a password user and returns its id.
    pub async fn add_user(&self, email: &str, password: &str) -> Uuid {
        let id = Uuid::new_v4();
        self.users.write().await.insert(
            email.to_lowercase(),
            MemoryUser { id, password: Some(password.to_string()) },
        );
        id
    }

    pub async fn invited(&self) -> Vec<String> {
        self.invited.read().await.clone()
    }

    async fn mint(&self, user_id: Uuid, email: &str) -> Result<AuthSession, AuthError> {
        let claims = Claims::new(user_id, Some(email.to_string()), self.session_ttl);
        let access_token = self.keys.issue(&claims)?;
        let refresh_token = Uuid::new_v4().simple().to_string();
        self.refresh_tokens
            .write()
            .await
            .insert(refresh_token.clone(), (user_id, email.to_string()));

        Ok(AuthSession {
            access_token,
            refresh_token,
            expires_at: claims.exp,
            user_id,
            email: Some(email.to_string()),
        })
    }
}

#[async_trait]
impl IdentityGateway for MemoryIdentity {
    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession, AuthError> {
        let email = email.trim().to_lowercase();
        let user_id = {
            let users = self.users.read().await;
            match users.get(&email) {
                Some(user) if user.password.as_deref() == Some(password) => user.id,
                _ => return Err(AuthError::SignInFailed("Invalid login credentials".to_string())),
            }
        };
        self.mint(user_id, &email).await
    }

    async fn refresh(&self, refresh_token: &str) -> Result<AuthSession, AuthError> {
        // Refresh tokens are single use
        let (user_id, email) = self
            .refresh_tokens
            .write()
            .await
            .remove(refresh_token)
            .ok_or_else(|| AuthError::SignInFailed("Invalid refresh token".to_string()))?;
        self.mint(user_id, &email).await
    }

    async fn sign_out(&self, access_token: &str) -> Result<(), AuthError> {
        let claims = self.keys.verify(access_token)?;
        self.refresh_tokens
            .write()
            .await
            .retain(|_, (user_id, _)| *user_id != claims.sub);
        Ok(())
    }

    async fn invite(&self, email: &str) -> Result<Uuid, AuthError> {
        let email = email.trim().to_lowercase();
        let id = {
            let mut users = self.users.write().await;
            users
                .entry(email.clone())
                .or_insert_with(|| MemoryUser { id: Uuid::new_v4(), password: None })
                .id
        };
        self.invited.write().await.push(email);
        Ok(id)
    }
}
