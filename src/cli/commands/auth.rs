use serde_json::json;

use crate::cli::client::LibraryClient;
use crate::cli::OutputFormat;

pub async fn login(client: &LibraryClient, email: &str, password: &str, output_format: OutputFormat) -> anyhow::Result<()> {
    let reply = client.login(email, password).await?;

    match output_format {
        OutputFormat::Json => crate::cli::utils::output_success(
            &output_format,
            "Signed in",
            Some(json!({
                "user_id": reply.user_id,
                "email": reply.email,
                "access_token": reply.access_token,
                "expires_at": reply.expires_at,
            })),
        ),
        // Bare token so `export LIBRARIAN_TOKEN=$(librarian login ...)` works
        OutputFormat::Text => {
            println!("{}", reply.access_token);
            Ok(())
        }
    }
}
