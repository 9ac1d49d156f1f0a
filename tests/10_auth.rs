mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::{json, Value};

use common::TestServer;

const DELETE_PATH: &str = "/functions/v1/delete-book-and-files";

#[tokio::test]
async fn health_endpoint_responds() -> Result<()> {
    let server = TestServer::spawn().await?;

    let res = common::client().get(server.url("/health")).send().await?;
    assert_eq!(res.status(), StatusCode::OK);

    let body = res.json::<Value>().await?;
    assert_eq!(body["data"]["status"], "ok");
    Ok(())
}

#[tokio::test]
async fn missing_authorization_is_401() -> Result<()> {
    let server = TestServer::spawn().await?;

    let res = common::client()
        .post(server.url(DELETE_PATH))
        .json(&json!({ "book_id": "x", "confirm": true }))
        .send()
        .await?;

    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let body = res.json::<Value>().await?;
    assert_eq!(body["error"], "No authorization header");
    assert_eq!(body["code"], "UNAUTHORIZED");
    Ok(())
}

#[tokio::test]
async fn invalid_or_expired_token_is_401() -> Result<()> {
    let server = TestServer::spawn().await?;

    for token in ["not-a-jwt".to_string(), server.expired_admin_token()] {
        let res = common::client()
            .post(server.url(DELETE_PATH))
            .bearer_auth(&token)
            .json(&json!({ "book_id": "x", "confirm": true }))
            .send()
            .await?;

        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(res.json::<Value>().await?["error"], "Invalid token");
    }
    Ok(())
}

#[tokio::test]
async fn non_admin_is_403() -> Result<()> {
    let server = TestServer::spawn().await?;
    let user_token = server.user_token().await;
    // Valid signature but no profile row at all
    let stranger_token = server.token_for(uuid::Uuid::new_v4());

    for token in [user_token, stranger_token] {
        let res = common::client()
            .post(server.url(DELETE_PATH))
            .bearer_auth(&token)
            .json(&json!({ "book_id": "x", "confirm": true }))
            .send()
            .await?;

        assert_eq!(res.status(), StatusCode::FORBIDDEN);
        assert_eq!(res.json::<Value>().await?["error"], "Unauthorized - admin role required");
    }
    Ok(())
}

#[tokio::test]
async fn session_cookie_is_accepted_without_header() -> Result<()> {
    let server = TestServer::spawn().await?;
    let book = server.seed_book("Cookie Atlas", None, None).await;

    let res = common::client()
        .post(server.url(DELETE_PATH))
        .header("Cookie", format!("sb-access-token={}", server.admin_token()))
        .json(&json!({ "book_id": book.id, "confirm": true }))
        .send()
        .await?;

    assert_eq!(res.status(), StatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn auth_is_checked_before_the_body() -> Result<()> {
    let server = TestServer::spawn().await?;

    let res = common::client()
        .post(server.url(DELETE_PATH))
        .body("{ not json")
        .send()
        .await?;

    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    Ok(())
}
