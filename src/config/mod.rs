use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;
use thiserror::Error;

/// Default per-file upload ceiling (100 MiB)
pub const DEFAULT_UPLOAD_MAX_BYTES: usize = 100 * 1024 * 1024;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub server: ServerConfig,
    pub backend: BackendConfig,
    pub database: DatabaseConfig,
    pub upload: UploadConfig,
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Hosted platform: Postgres + storage REST + auth REST
    Supabase,
    /// Process-local maps, for development and tests
    Memory,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    pub kind: BackendKind,
    pub url: String,
    pub anon_key: String,
    pub service_role_key: String,
    pub jwt_secret: String,
    pub http_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub connection_timeout: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadConfig {
    pub max_bytes: usize,
    pub bucket: String,
    pub signed_url_ttl_secs: u64,
    pub allowed_cover_types: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    pub cors_origins: Vec<String>,
    pub session_cookie: String,
    pub refresh_cookie: String,
    pub secure_cookies: bool,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing configuration: {0}")]
    Missing(&'static str),

    #[error("Invalid configuration for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

impl UploadConfig {
    /// Largest request body accepted on the upload route: a PDF and a cover
    /// at the per-file maximum plus room for the text fields. Files slightly
    /// over the limit still reach the handler, which answers 400.
    pub fn max_body_bytes(&self) -> usize {
        self.max_bytes.saturating_mul(2).saturating_add(1024 * 1024)
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        // Server
        if let Some(port) = env::var("LIBRARY_ADMIN_PORT")
            .ok()
            .or_else(|| env::var("PORT").ok())
            .and_then(|s| s.parse::<u16>().ok())
        {
            self.server.port = port;
        }

        // Backend platform
        if let Ok(v) = env::var("LIBRARY_BACKEND") {
            match v.to_ascii_lowercase().as_str() {
                "memory" => self.backend.kind = BackendKind::Memory,
                "supabase" => self.backend.kind = BackendKind::Supabase,
                other => tracing::warn!("Unknown LIBRARY_BACKEND '{}', keeping {:?}", other, self.backend.kind),
            }
        }
        if let Ok(v) = env::var("SUPABASE_URL") {
            self.backend.url = v.trim_end_matches('/').to_string();
        }
        if let Ok(v) = env::var("SUPABASE_ANON_KEY") {
            self.backend.anon_key = v;
        }
        if let Ok(v) = env::var("SUPABASE_SERVICE_ROLE_KEY") {
            self.backend.service_role_key = v;
        }
        if let Ok(v) = env::var("SUPABASE_JWT_SECRET") {
            self.backend.jwt_secret = v;
        }
        if let Ok(v) = env::var("BACKEND_HTTP_TIMEOUT_SECS") {
            self.backend.http_timeout_secs = v.parse().unwrap_or(self.backend.http_timeout_secs);
        }

        // Database
        if let Ok(v) = env::var("DATABASE_URL") {
            self.database.url = v;
        }
        if let Ok(v) = env::var("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = v.parse().unwrap_or(self.database.max_connections);
        }
        if let Ok(v) = env::var("DATABASE_CONNECTION_TIMEOUT") {
            self.database.connection_timeout = v.parse().unwrap_or(self.database.connection_timeout);
        }

        // Upload
        if let Ok(v) = env::var("UPLOAD_MAX_BYTES") {
            self.upload.max_bytes = v.parse().unwrap_or(self.upload.max_bytes);
        }
        if let Ok(v) = env::var("STORAGE_BUCKET") {
            self.upload.bucket = v;
        }
        if let Ok(v) = env::var("SIGNED_URL_TTL_SECS") {
            self.upload.signed_url_ttl_secs = v.parse().unwrap_or(self.upload.signed_url_ttl_secs);
        }

        // Security
        if let Ok(v) = env::var("SECURITY_CORS_ORIGINS") {
            self.security.cors_origins = v
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }
        if let Ok(v) = env::var("SESSION_COOKIE_NAME") {
            self.security.session_cookie = v;
        }
        if let Ok(v) = env::var("SECURITY_SECURE_COOKIES") {
            self.security.secure_cookies = v.parse().unwrap_or(self.security.secure_cookies);
        }

        self
    }

    /// Checks that the selected backend has everything it needs to start.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.backend.jwt_secret.is_empty() {
            return Err(ConfigError::Missing("SUPABASE_JWT_SECRET"));
        }
        if self.upload.max_bytes == 0 {
            return Err(ConfigError::Invalid {
                key: "UPLOAD_MAX_BYTES",
                reason: "must be greater than zero".to_string(),
            });
        }

        if self.backend.kind == BackendKind::Supabase {
            if self.backend.url.is_empty() {
                return Err(ConfigError::Missing("SUPABASE_URL"));
            }
            url::Url::parse(&self.backend.url).map_err(|e| ConfigError::Invalid {
                key: "SUPABASE_URL",
                reason: e.to_string(),
            })?;
            if self.backend.anon_key.is_empty() {
                return Err(ConfigError::Missing("SUPABASE_ANON_KEY"));
            }
            if self.backend.service_role_key.is_empty() {
                return Err(ConfigError::Missing("SUPABASE_SERVICE_ROLE_KEY"));
            }
            if self.database.url.is_empty() {
                return Err(ConfigError::Missing("DATABASE_URL"));
            }
        }

        Ok(())
    }

    fn development() -> Self {
        Self {
            environment: Environment::Development,
            server: ServerConfig { port: 3000 },
            backend: BackendConfig::unset(),
            database: DatabaseConfig {
                url: String::new(),
                max_connections: 5,
                connection_timeout: 30,
            },
            upload: UploadConfig::defaults(),
            security: SecurityConfig {
                cors_origins: vec!["*".to_string()],
                session_cookie: "sb-access-token".to_string(),
                refresh_cookie: "sb-refresh-token".to_string(),
                secure_cookies: false,
            },
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            server: ServerConfig { port: 3000 },
            backend: BackendConfig::unset(),
            database: DatabaseConfig {
                url: String::new(),
                max_connections: 10,
                connection_timeout: 10,
            },
            upload: UploadConfig::defaults(),
            security: SecurityConfig {
                cors_origins: vec!["https://staging.library.example.com".to_string()],
                session_cookie: "sb-access-token".to_string(),
                refresh_cookie: "sb-refresh-token".to_string(),
                secure_cookies: true,
            },
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            server: ServerConfig { port: 3000 },
            backend: BackendConfig::unset(),
            database: DatabaseConfig {
                url: String::new(),
                max_connections: 20,
                connection_timeout: 5,
            },
            upload: UploadConfig::defaults(),
            security: SecurityConfig {
                cors_origins: vec!["https://library.example.com".to_string()],
                session_cookie: "sb-access-token".to_string(),
                refresh_cookie: "sb-refresh-token".to_string(),
                secure_cookies: true,
            },
        }
    }

    /// Development profile over the in-memory backend, for tests and demos.
    pub fn in_memory(jwt_secret: impl Into<String>) -> Self {
        let mut config = Self::development();
        config.backend.kind = BackendKind::Memory;
        config.backend.url = "http://localhost".to_string();
        config.backend.jwt_secret = jwt_secret.into();
        config
    }
}

impl BackendConfig {
    fn unset() -> Self {
        Self {
            kind: BackendKind::Supabase,
            url: String::new(),
            anon_key: String::new(),
            service_role_key: String::new(),
            jwt_secret: String::new(),
            http_timeout_secs: 30,
        }
    }
}

impl UploadConfig {
    fn defaults() -> Self {
        Self {
            max_bytes: DEFAULT_UPLOAD_MAX_BYTES,
            bucket: "books".to_string(),
            signed_url_ttl_secs: 24 * 60 * 60,
            allowed_cover_types: vec![
                "image/jpeg".to_string(),
                "image/png".to_string(),
                "image/webp".to_string(),
            ],
        }
    }
}

// Loaded once by the server binary; request handlers read the copy in AppState
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

pub fn config() -> &'static AppConfig {
    &CONFIG
}

#[macro_export]
macro_rules! is_development {
    ($config:expr) => {
        matches!($config.environment, $crate::config::Environment::Development)
    };
}
