mod common;

use anyhow::Result;
use chrono::{Duration, Utc};
use reqwest::{header, StatusCode};
use serde_json::Value;

use common::TestServer;

async fn dashboard(server: &TestServer, query: &str) -> Result<Value> {
    let res = common::client()
        .get(server.url(&format!("/dashboard{}", query)))
        .bearer_auth(server.admin_token())
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    Ok(res.json::<Value>().await?["data"].clone())
}

fn titles(page: &Value) -> Vec<String> {
    page["books"]
        .as_array()
        .map(|books| books.iter().filter_map(|b| b["title"].as_str().map(str::to_string)).collect())
        .unwrap_or_default()
}

#[tokio::test]
async fn pages_newest_first_ten_at_a_time() -> Result<()> {
    let server = TestServer::spawn().await?;
    let now = Utc::now();
    for i in 0..12 {
        let mut book = common::book(&format!("Book {:02}", i), None, None);
        book.upload_date = now - Duration::minutes(i);
        server.backends.store.put_book(book).await;
    }

    let first = dashboard(&server, "").await?;
    assert_eq!(first["total"], 12);
    assert_eq!(first["total_pages"], 2);
    assert_eq!(first["page"], 1);
    let first_titles = titles(&first);
    assert_eq!(first_titles.len(), 10);
    assert_eq!(first_titles[0], "Book 00");

    let second = dashboard(&server, "?page=2").await?;
    assert_eq!(titles(&second), vec!["Book 10", "Book 11"]);

    // Unparseable page numbers fall back to the first page
    let fallback = dashboard(&server, "?page=abc").await?;
    assert_eq!(fallback["page"], 1);
    Ok(())
}

#[tokio::test]
async fn search_and_filters_combine() -> Result<()> {
    let server = TestServer::spawn().await?;
    let mut by_author = common::book("Poems", Some("Literature"), Some("O-Level"));
    by_author.author = Some("Okot p'Bitek".to_string());
    server.backends.store.put_book(by_author).await;
    server.seed_book("Okra Farming", Some("Agriculture"), Some("O-Level")).await;
    server.seed_book("Organic Chemistry", Some("Chemistry"), Some("A-Level")).await;

    let search = dashboard(&server, "?search=OK").await?;
    let mut found = titles(&search);
    found.sort();
    assert_eq!(found, vec!["Okra Farming", "Poems"]);

    let filtered = dashboard(&server, "?search=ok&subject=Agriculture&level=O-Level").await?;
    assert_eq!(titles(&filtered), vec!["Okra Farming"]);

    let nothing = dashboard(&server, "?search=zebra").await?;
    assert!(titles(&nothing).is_empty());
    assert_eq!(nothing["total"], 0);

    let level_only = dashboard(&server, "?level=A-Level").await?;
    assert_eq!(titles(&level_only), vec!["Organic Chemistry"]);
    assert_eq!(level_only["stats"]["levels"], serde_json::json!(["A-Level"]));
    Ok(())
}

#[tokio::test]
async fn guard_redirects_protected_paths_without_session() -> Result<()> {
    let server = TestServer::spawn().await?;

    for path in ["/dashboard", "/books/123", "/analytics", "/settings"] {
        let res = common::client().get(server.url(path)).send().await?;
        assert_eq!(res.status(), StatusCode::TEMPORARY_REDIRECT, "{path}");
        assert_eq!(res.headers()[header::LOCATION], "/login");
    }
    Ok(())
}

#[tokio::test]
async fn expired_cookie_counts_as_no_session() -> Result<()> {
    let server = TestServer::spawn().await?;

    let res = common::client()
        .get(server.url("/dashboard"))
        .header(header::COOKIE, format!("sb-access-token={}", server.expired_admin_token()))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(res.headers()[header::LOCATION], "/login");
    Ok(())
}

#[tokio::test]
async fn signed_in_users_skip_the_login_page() -> Result<()> {
    let server = TestServer::spawn().await?;

    let res = common::client()
        .get(server.url("/login"))
        .header(header::COOKIE, format!("sb-access-token={}", server.admin_token()))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(res.headers()[header::LOCATION], "/dashboard");

    let anonymous = common::client().get(server.url("/login")).send().await?;
    assert_eq!(anonymous.status(), StatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn session_passes_guard_but_role_is_still_checked() -> Result<()> {
    let server = TestServer::spawn().await?;
    let user_token = server.user_token().await;

    let res = common::client()
        .get(server.url("/dashboard"))
        .header(header::COOKIE, format!("sb-access-token={}", user_token))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    Ok(())
}

#[tokio::test]
async fn unprotected_lookalike_paths_pass() -> Result<()> {
    let server = TestServer::spawn().await?;

    let res = common::client().get(server.url("/bookshelf")).send().await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    Ok(())
}
