use anyhow::bail;
use clap::Args;
use serde_json::json;
use std::path::PathBuf;

use crate::books::upload::PDF_CONTENT_TYPE;
use crate::books::BookQuery;
use crate::cli::client::LibraryClient;
use crate::cli::utils::{book_line, cover_content_type, output_success, print_book, read_local_file};
use crate::cli::OutputFormat;

#[derive(Debug, Args)]
pub struct UploadArgs {
    #[arg(long, help = "Book title")]
    pub title: String,
    #[arg(long, help = "Path to the PDF")]
    pub pdf: PathBuf,
    #[arg(long, help = "Path to a JPEG, PNG or WebP cover")]
    pub cover: Option<PathBuf>,
    #[arg(long)]
    pub author: Option<String>,
    #[arg(long)]
    pub subject: Option<String>,
    #[arg(long)]
    pub level: Option<String>,
    #[arg(long)]
    pub class_level: Option<String>,
    #[arg(long)]
    pub description: Option<String>,
    #[arg(long, help = "Mark the book as featured")]
    pub featured: bool,
}

impl UploadArgs {
    fn fields(&self) -> Vec<(&'static str, String)> {
        let mut fields = vec![("title", self.title.clone())];
        let optional = [
            ("author", &self.author),
            ("subject", &self.subject),
            ("level", &self.level),
            ("class_level", &self.class_level),
            ("description", &self.description),
        ];
        fields.extend(optional.into_iter().filter_map(|(name, value)| value.clone().map(|v| (name, v))));
        fields.push(("featured", self.featured.to_string()));
        fields
    }
}

pub async fn list(client: &LibraryClient, query: &BookQuery, output_format: OutputFormat) -> anyhow::Result<()> {
    let page = client.list(query).await?;

    match output_format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&page)?),
        OutputFormat::Text => {
            if page.books.is_empty() {
                println!("No books found");
            }
            for book in &page.books {
                println!("{}", book_line(book));
            }
            println!(
                "Page {} of {} ({} books)",
                page.page,
                page.total_pages.max(1),
                page.total
            );
        }
    }
    Ok(())
}

pub async fn show(client: &LibraryClient, id: &str, output_format: OutputFormat) -> anyhow::Result<()> {
    let book = client.show(id).await?;

    match output_format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&book)?),
        OutputFormat::Text => print_book(&book),
    }
    Ok(())
}

pub async fn upload(client: &LibraryClient, args: UploadArgs, output_format: OutputFormat) -> anyhow::Result<()> {
    // Fail on a bad cover extension before reading anything
    let cover_type = args.cover.as_deref().map(cover_content_type).transpose()?;

    let pdf = read_local_file(&args.pdf, PDF_CONTENT_TYPE).await?;
    let cover = match (&args.cover, cover_type) {
        (Some(path), Some(content_type)) => Some(read_local_file(path, content_type).await?),
        _ => None,
    };

    let book = client.upload(args.fields(), pdf, cover).await?;

    output_success(
        &output_format,
        &format!("Uploaded \"{}\" ({})", book.title, book.id),
        Some(json!({ "book": book })),
    )
}

/// Refuses unless `confirm` is exactly the stored title.
pub async fn delete(client: &LibraryClient, id: &str, confirm: &str, output_format: OutputFormat) -> anyhow::Result<()> {
    let book = client.show(id).await?;
    if book.title != confirm {
        bail!("Confirmation does not match the title \"{}\"; nothing deleted", book.title);
    }

    let message = client.delete(id).await?;
    output_success(&output_format, &message, Some(json!({ "book_id": book.id })))
}
