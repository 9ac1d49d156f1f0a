mod common;

use anyhow::Result;

use common::{TestServer, ADMIN_EMAIL, ADMIN_PASSWORD};
use library_admin::books::BookQuery;
use library_admin::cli::client::{LibraryClient, LocalFile};

#[tokio::test]
async fn login_then_upload_list_show_delete() -> Result<()> {
    let server = TestServer::spawn().await?;

    let anonymous = LibraryClient::new(&server.base_url, None)?;
    let reply = anonymous.login(ADMIN_EMAIL, ADMIN_PASSWORD).await?;
    assert_eq!(reply.user_id, server.admin_id.to_string());

    let client = LibraryClient::new(&server.base_url, Some(reply.access_token))?;
    let pdf = LocalFile {
        file_name: "algebra.pdf".to_string(),
        content_type: "application/pdf".to_string(),
        bytes: common::sample_pdf(3),
    };
    let book = client
        .upload(vec![("title", "Algebra Basics".to_string()), ("subject", "Maths".to_string())], pdf, None)
        .await?;
    assert_eq!(book.pages, Some(3));

    let page = client
        .list(&BookQuery { search: Some("algebra".to_string()), ..Default::default() })
        .await?;
    assert_eq!(page.total, 1);
    assert_eq!(page.books[0].id, book.id);

    let shown = client.show(&book.id.to_string()).await?;
    assert_eq!(shown.title, "Algebra Basics");

    let message = client.delete(&book.id.to_string()).await?;
    assert_eq!(message, "Book deleted successfully");

    let gone = client.show(&book.id.to_string()).await.unwrap_err();
    assert!(gone.to_string().contains("Book not found"), "{gone}");
    Ok(())
}

#[tokio::test]
async fn bad_credentials_and_bad_tokens_surface_as_errors() -> Result<()> {
    let server = TestServer::spawn().await?;

    let anonymous = LibraryClient::new(&server.base_url, None)?;
    let failed = anonymous.login(ADMIN_EMAIL, "nope").await.unwrap_err();
    assert!(failed.to_string().contains("Authentication failed"), "{failed}");
    assert!(anonymous.list(&BookQuery::default()).await.is_err());

    // The guard redirects instead of answering 401 on console pages
    let stale = LibraryClient::new(&server.base_url, Some(server.expired_admin_token()))?;
    let rejected = stale.list(&BookQuery::default()).await.unwrap_err();
    assert!(rejected.to_string().contains("sign in again"), "{rejected}");
    Ok(())
}
