use anyhow::{anyhow, bail, Context};
use reqwest::{header, multipart, redirect, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use url::Url;

use crate::books::{BookPage, BookQuery};
use crate::database::models::Book;

/// Thin HTTP client over the admin service's JSON endpoints.
pub struct LibraryClient {
    http: reqwest::Client,
    server: Url,
    token: Option<String>,
}

/// `{success: true, data}` envelope used by the console endpoints
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    data: T,
}

#[derive(Debug, Deserialize)]
struct BookReply {
    book: Book,
}

#[derive(Debug, Deserialize)]
struct MessageReply {
    message: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginReply {
    pub user_id: String,
    pub email: Option<String>,
    pub access_token: String,
    pub expires_at: i64,
}

/// A file read from disk for the upload form
pub struct LocalFile {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl LibraryClient {
    pub fn new(server: &str, token: Option<String>) -> anyhow::Result<Self> {
        let server = Url::parse(server).with_context(|| format!("invalid server URL {:?}", server))?;
        // A guarded page answers 307 to /login for a bad token; surface that
        // instead of following it to the login descriptor.
        let http = reqwest::Client::builder()
            .redirect(redirect::Policy::none())
            .build()
            .context("failed to build HTTP client")?;
        let token = token.filter(|t| !t.trim().is_empty());
        Ok(Self { http, server, token })
    }

    fn url(&self, path: &str) -> anyhow::Result<Url> {
        self.server.join(path).with_context(|| format!("invalid request path {:?}", path))
    }

    fn authorized(&self, request: RequestBuilder) -> anyhow::Result<RequestBuilder> {
        let token = self
            .token
            .as_deref()
            .ok_or_else(|| anyhow!("Not signed in: pass --token or set LIBRARIAN_TOKEN"))?;
        Ok(request.header(header::AUTHORIZATION, format!("Bearer {}", token)))
    }

    pub async fn login(&self, email: &str, password: &str) -> anyhow::Result<LoginReply> {
        let response = self
            .http
            .post(self.url("/login")?)
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await?;
        Ok(read::<Envelope<LoginReply>>(response).await?.data)
    }

    pub async fn list(&self, query: &BookQuery) -> anyhow::Result<BookPage> {
        let request = self.authorized(self.http.get(self.url("/dashboard")?).query(query))?;
        Ok(read::<Envelope<BookPage>>(request.send().await?).await?.data)
    }

    pub async fn show(&self, id: &str) -> anyhow::Result<Book> {
        let request = self.authorized(self.http.get(self.url(&format!("/books/{}", id))?))?;
        Ok(read::<Envelope<Book>>(request.send().await?).await?.data)
    }

    pub async fn upload(
        &self,
        fields: Vec<(&'static str, String)>,
        pdf: LocalFile,
        cover: Option<LocalFile>,
    ) -> anyhow::Result<Book> {
        let mut form = multipart::Form::new();
        for (name, value) in fields {
            form = form.text(name, value);
        }
        form = form.part("pdf", file_part(pdf)?);
        if let Some(cover) = cover {
            form = form.part("cover", file_part(cover)?);
        }

        let request = self.authorized(self.http.post(self.url("/functions/v1/upload-and-insert")?).multipart(form))?;
        Ok(read::<BookReply>(request.send().await?).await?.book)
    }

    pub async fn delete(&self, id: &str) -> anyhow::Result<String> {
        let request = self.authorized(
            self.http
                .post(self.url("/functions/v1/delete-book-and-files")?)
                .json(&json!({ "book_id": id, "confirm": true })),
        )?;
        Ok(read::<MessageReply>(request.send().await?).await?.message)
    }
}

fn file_part(file: LocalFile) -> anyhow::Result<multipart::Part> {
    multipart::Part::bytes(file.bytes)
        .file_name(file.file_name)
        .mime_str(&file.content_type)
        .context("invalid content type")
}

/// Decodes a success body, or turns the service's `{error, code}` body into
/// an error message.
async fn read<T: DeserializeOwned>(response: Response) -> anyhow::Result<T> {
    let status = response.status();

    if status.is_redirection() {
        bail!("Session rejected by the server (HTTP {}); sign in again", status.as_u16());
    }

    let body = response.text().await?;
    if !status.is_success() {
        let message = serde_json::from_str::<Value>(&body)
            .ok()
            .and_then(|v| v.get("error").and_then(Value::as_str).map(str::to_string))
            .unwrap_or_else(|| body.trim().to_string());
        bail!("{} (HTTP {})", message, status.as_u16());
    }

    serde_json::from_str(&body).with_context(|| format!("unexpected response body: {}", body))
}
