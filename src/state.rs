use anyhow::{Context, Result};
use chrono::Utc;
use std::sync::Arc;

use crate::auth::{GoTrueIdentity, IdentityGateway, MemoryIdentity, TokenKeys};
use crate::config::{AppConfig, BackendKind};
use crate::database::models::{Profile, Role};
use crate::database::{LibraryStore, MemoryStore, PgStore};
use crate::storage::{MemoryStorage, ObjectStorage, SupabaseStorage};

/// Shared by every request: configuration plus the three backend seams.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub store: Arc<dyn LibraryStore>,
    pub storage: Arc<dyn ObjectStorage>,
    pub identity: Arc<dyn IdentityGateway>,
    pub tokens: Arc<TokenKeys>,
}

/// Concrete handles of an in-memory state, for seeding and inspection.
#[derive(Clone)]
pub struct MemoryBackends {
    pub store: Arc<MemoryStore>,
    pub storage: Arc<MemoryStorage>,
    pub identity: Arc<MemoryIdentity>,
}

impl AppState {
    /// Connects the backend selected by `config.backend.kind`.
    pub async fn connect(config: AppConfig) -> Result<Self> {
        config.validate().context("invalid configuration")?;

        match config.backend.kind {
            BackendKind::Supabase => {
                let store = PgStore::connect(&config.database)
                    .await
                    .context("failed to connect to database")?;
                let storage = SupabaseStorage::new(&config.backend, &config.upload)
                    .context("failed to build storage client")?;
                let identity = GoTrueIdentity::new(&config.backend)
                    .context("failed to build auth client")?;
                let tokens = Arc::new(TokenKeys::new(&config.backend.jwt_secret));

                Ok(Self {
                    config: Arc::new(config),
                    store: Arc::new(store),
                    storage: Arc::new(storage),
                    identity: Arc::new(identity),
                    tokens,
                })
            }
            BackendKind::Memory => {
                if !crate::is_development!(config) {
                    tracing::warn!("In-memory backend outside development: catalog is lost on restart");
                }
                let seed = dev_admin_from_env();
                let (state, backends) = Self::in_memory(config);
                if let Some((email, password)) = seed {
                    backends.seed_admin(&email, &password, None).await;
                    tracing::info!("Seeded in-memory admin {}", email);
                }
                Ok(state)
            }
        }
    }

    pub fn in_memory(config: AppConfig) -> (Self, MemoryBackends) {
        let tokens = Arc::new(TokenKeys::new(&config.backend.jwt_secret));
        let backends = MemoryBackends {
            store: Arc::new(MemoryStore::new()),
            storage: Arc::new(MemoryStorage::new()),
            identity: Arc::new(MemoryIdentity::new(tokens.clone())),
        };

        let state = Self {
            config: Arc::new(config),
            store: backends.store.clone(),
            storage: backends.storage.clone(),
            identity: backends.identity.clone(),
            tokens,
        };
        (state, backends)
    }
}

impl MemoryBackends {
    /// Creates a password user with an admin profile and returns its id.
    pub async fn seed_admin(&self, email: &str, password: &str, full_name: Option<&str>) -> uuid::Uuid {
        let id = self.identity.add_user(email, password).await;
        self.store
            .put_profile(Profile {
                id,
                full_name: full_name.map(str::to_string),
                role: Role::Admin,
                created_at: Utc::now(),
            })
            .await;
        id
    }
}

fn dev_admin_from_env() -> Option<(String, String)> {
    let email = std::env::var("DEV_ADMIN_EMAIL").ok().filter(|v| !v.is_empty())?;
    let password = std::env::var("DEV_ADMIN_PASSWORD").ok().filter(|v| !v.is_empty())?;
    Some((email, password))
}
