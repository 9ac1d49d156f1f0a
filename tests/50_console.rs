mod common;

use anyhow::Result;
use chrono::{Duration, Utc};
use reqwest::StatusCode;
use serde_json::{json, Value};
use uuid::Uuid;

use common::TestServer;
use library_admin::database::models::{ChangeAction, Profile, Role};

#[tokio::test]
async fn book_detail_and_not_found() -> Result<()> {
    let server = TestServer::spawn().await?;
    let book = server.seed_book("Physics Made Simple", Some("Physics"), None).await;
    let client = common::client();

    let res = client
        .get(server.url(&format!("/books/{}", book.id)))
        .bearer_auth(server.admin_token())
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.json::<Value>().await?["data"]["title"], "Physics Made Simple");

    for id in [Uuid::new_v4().to_string(), "not-a-uuid".to_string()] {
        let res = client
            .get(server.url(&format!("/books/{}", id)))
            .bearer_auth(server.admin_token())
            .send()
            .await?;
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
        assert_eq!(res.json::<Value>().await?["error"], "Book not found");
    }
    Ok(())
}

#[tokio::test]
async fn edit_replaces_metadata_and_keeps_keywords() -> Result<()> {
    let server = TestServer::spawn().await?;
    let mut book = common::book("Old Title", Some("History"), Some("O-Level"));
    book.keywords = Some(vec!["old".to_string(), "title".to_string()]);
    book.file_path = Some("memory://storage/books/x/pdf/a.pdf".to_string());
    server.backends.store.put_book(book.clone()).await;

    let res = common::client()
        .put(server.url(&format!("/books/{}/edit", book.id)))
        .bearer_auth(server.admin_token())
        .json(&json!({
            "title": " New Title ",
            "author": "",
            "subject": "History",
            "level": "A-Level",
            "featured": true
        }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let updated = res.json::<Value>().await?["data"].clone();
    assert_eq!(updated["title"], "New Title");
    assert_eq!(updated["author"], Value::Null);
    assert_eq!(updated["level"], "A-Level");
    assert_eq!(updated["featured"], true);
    assert_eq!(updated["keywords"], json!(["old", "title"]));
    assert_eq!(updated["file_path"], "memory://storage/books/x/pdf/a.pdf");

    let changes = server.backends.store.changes().await;
    assert_eq!(changes.len(), 1);
    assert_eq!(changes[0].action, ChangeAction::Update);
    assert_eq!(changes[0].changes["title"], "New Title");
    Ok(())
}

#[tokio::test]
async fn edit_requires_title_and_existing_book() -> Result<()> {
    let server = TestServer::spawn().await?;
    let book = server.seed_book("Keep Me", None, None).await;
    let client = common::client();

    let res = client
        .put(server.url(&format!("/books/{}/edit", book.id)))
        .bearer_auth(server.admin_token())
        .json(&json!({ "title": "   " }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(res.json::<Value>().await?["error"], "Title is required");

    let res = client
        .put(server.url(&format!("/books/{}/edit", Uuid::new_v4())))
        .bearer_auth(server.admin_token())
        .json(&json!({ "title": "Anything" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    assert!(server.backends.store.changes().await.is_empty());
    Ok(())
}

#[tokio::test]
async fn analytics_summarizes_catalog() -> Result<()> {
    let server = TestServer::spawn().await?;
    let now = Utc::now();

    let mut popular = common::book("Popular", Some("Maths"), Some("O-Level"));
    popular.popularity_score = Some(9.5);
    popular.featured = true;
    let mut old = common::book("Old", Some("Maths"), Some("A-Level"));
    old.upload_date = now - Duration::days(20);
    let mut ancient = common::book("Ancient", Some("History"), None);
    ancient.upload_date = now - Duration::days(90);
    ancient.popularity_score = Some(1.0);
    for book in [popular, old, ancient] {
        server.backends.store.put_book(book).await;
    }

    let res = common::client()
        .get(server.url("/analytics"))
        .bearer_auth(server.admin_token())
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let data = res.json::<Value>().await?["data"].clone();

    assert_eq!(data["total_books"], 3);
    assert_eq!(data["featured_books"], 1);
    assert_eq!(data["total_subjects"], 2);
    assert_eq!(data["total_levels"], 2);
    assert_eq!(data["uploads_this_week"], 1);
    assert_eq!(data["uploads_this_month"], 2);
    assert_eq!(data["top_books"][0]["title"], "Popular");
    assert_eq!(data["top_books"][1]["title"], "Ancient");
    assert_eq!(data["subject_distribution"][0], json!({ "subject": "Maths", "count": 2 }));
    assert_eq!(data["recent_changes"], json!([]));
    Ok(())
}

#[tokio::test]
async fn settings_lists_admins_newest_first() -> Result<()> {
    let server = TestServer::spawn().await?;
    let newer = Uuid::new_v4();
    server
        .backends
        .store
        .put_profile(Profile {
            id: newer,
            full_name: Some("Deputy".to_string()),
            role: Role::Admin,
            created_at: Utc::now() + Duration::seconds(5),
        })
        .await;

    let res = common::client()
        .get(server.url("/settings"))
        .bearer_auth(server.admin_token())
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let data = res.json::<Value>().await?["data"].clone();
    assert_eq!(data["profile"]["id"], server.admin_id.to_string());
    assert_eq!(data["profile"]["role"], "admin");
    assert_eq!(data["admins"][0]["id"], newer.to_string());
    assert_eq!(data["admins"][1]["id"], server.admin_id.to_string());
    Ok(())
}

#[tokio::test]
async fn invite_goes_through_identity_provider() -> Result<()> {
    let server = TestServer::spawn().await?;
    let client = common::client();

    let res = client
        .post(server.url("/settings/invite"))
        .bearer_auth(server.admin_token())
        .json(&json!({ "email": "  " }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(res.json::<Value>().await?["error"], "Email is required");

    let res = client
        .post(server.url("/settings/invite"))
        .bearer_auth(server.admin_token())
        .json(&json!({ "email": "New.Teacher@school.test" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(server.backends.identity.invited().await, vec!["new.teacher@school.test"]);
    Ok(())
}

#[tokio::test]
async fn revoke_demotes_admin() -> Result<()> {
    let server = TestServer::spawn().await?;
    let deputy = Uuid::new_v4();
    server
        .backends
        .store
        .put_profile(Profile { id: deputy, full_name: None, role: Role::Admin, created_at: Utc::now() })
        .await;
    let client = common::client();

    let res = client
        .post(server.url(&format!("/settings/admins/{}/revoke", deputy)))
        .bearer_auth(server.admin_token())
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);

    // The demoted profile loses console access
    let res = client
        .get(server.url("/settings"))
        .bearer_auth(server.token_for(deputy))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = client
        .post(server.url(&format!("/settings/admins/{}/revoke", Uuid::new_v4())))
        .bearer_auth(server.admin_token())
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    assert_eq!(res.json::<Value>().await?["error"], "Profile not found");
    Ok(())
}
