#![allow(dead_code)]

use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use chrono::Utc;
use lopdf::{dictionary, Document, Object};
use reqwest::{redirect, StatusCode};
use uuid::Uuid;

use library_admin::auth::{Claims, TokenKeys};
use library_admin::config::AppConfig;
use library_admin::database::models::{Book, Profile, Role};
use library_admin::state::MemoryBackends;
use library_admin::{app, AppState};

pub const JWT_SECRET: &str = "integration-test-secret";
pub const ADMIN_EMAIL: &str = "admin@school.test";
pub const ADMIN_PASSWORD: &str = "correct horse";

/// The admin service running in-process over the in-memory backends.
pub struct TestServer {
    pub port: u16,
    pub base_url: String,
    pub backends: MemoryBackends,
    pub admin_id: Uuid,
    keys: TokenKeys,
}

impl TestServer {
    pub async fn spawn() -> Result<Self> {
        Self::spawn_with(AppConfig::in_memory(JWT_SECRET)).await
    }

    pub async fn spawn_with(config: AppConfig) -> Result<Self> {
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let base_url = format!("http://127.0.0.1:{}", port);

        let (state, backends) = AppState::in_memory(config);
        let admin_id = backends.seed_admin(ADMIN_EMAIL, ADMIN_PASSWORD, Some("Head Librarian")).await;

        let listener = tokio::net::TcpListener::bind(("127.0.0.1", port))
            .await
            .context("failed to bind test port")?;
        tokio::spawn(async move {
            let _ = axum::serve(listener, app(state)).await;
        });

        let server = Self { port, base_url, backends, admin_id, keys: TokenKeys::new(JWT_SECRET) };
        server.wait_ready(Duration::from_secs(10)).await?;
        Ok(server)
    }

    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let client = reqwest::Client::new();
        let deadline = Instant::now() + timeout;
        while Instant::now() < deadline {
            if let Ok(resp) = client.get(self.url("/health")).send().await {
                if resp.status() == StatusCode::OK {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        anyhow::bail!("server did not become ready on {} within {:?}", self.base_url, timeout)
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub fn token_for(&self, user_id: Uuid) -> String {
        let claims = Claims::new(user_id, None, chrono::Duration::hours(1));
        self.keys.issue(&claims).expect("sign test token")
    }

    pub fn admin_token(&self) -> String {
        self.token_for(self.admin_id)
    }

    /// Token for a freshly created profile with the `user` role.
    pub async fn user_token(&self) -> String {
        let id = Uuid::new_v4();
        self.backends
            .store
            .put_profile(Profile { id, full_name: None, role: Role::User, created_at: Utc::now() })
            .await;
        self.token_for(id)
    }

    pub fn expired_admin_token(&self) -> String {
        let mut claims = Claims::new(self.admin_id, None, chrono::Duration::hours(1));
        claims.iat -= 7200;
        claims.exp = Utc::now().timestamp() - 60;
        self.keys.issue(&claims).expect("sign test token")
    }

    pub async fn seed_book(&self, title: &str, subject: Option<&str>, level: Option<&str>) -> Book {
        let book = book(title, subject, level);
        self.backends.store.put_book(book.clone()).await;
        book
    }
}

/// Client that reports redirects instead of following them.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .redirect(redirect::Policy::none())
        .build()
        .expect("build test client")
}

pub fn book(title: &str, subject: Option<&str>, level: Option<&str>) -> Book {
    Book {
        id: Uuid::new_v4(),
        title: title.to_string(),
        author: None,
        subject: subject.map(str::to_string),
        level: level.map(str::to_string),
        class_level: None,
        description: None,
        cover_url: None,
        file_path: None,
        pages: None,
        upload_date: Utc::now(),
        featured: false,
        keywords: None,
        popularity_score: None,
    }
}

/// Minimal well-formed PDF with the given number of blank pages.
pub fn sample_pdf(page_count: u32) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let kids: Vec<Object> = (0..page_count)
        .map(|_| {
            Object::Reference(doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "MediaBox" => vec![Object::Integer(0), Object::Integer(0), Object::Integer(595), Object::Integer(842)],
            }))
        })
        .collect();

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => Object::Integer(page_count as i64),
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).expect("serialize sample pdf");
    bytes
}
