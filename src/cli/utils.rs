use anyhow::{bail, Context};
use serde_json::{json, Map, Value};
use std::path::Path;

use crate::cli::client::LocalFile;
use crate::cli::OutputFormat;
use crate::database::models::Book;

/// Output a success message in the appropriate format. Object `data` is
/// merged into the JSON response next to `message`.
pub fn output_success(output_format: &OutputFormat, message: &str, data: Option<Value>) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            let mut response = Map::new();
            response.insert("success".to_string(), json!(true));
            response.insert("message".to_string(), json!(message));
            match data {
                Some(Value::Object(fields)) => response.extend(fields),
                Some(other) => {
                    response.insert("data".to_string(), other);
                }
                None => {}
            }
            println!("{}", serde_json::to_string_pretty(&Value::Object(response))?);
        }
        OutputFormat::Text => {
            println!("✓ {}", message);
        }
    }
    Ok(())
}

/// Output an error message in the appropriate format
pub fn output_error(output_format: &OutputFormat, message: &str) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            let response = json!({
                "success": false,
                "error": message
            });
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        OutputFormat::Text => {
            eprintln!("Error: {}", message);
        }
    }
    Ok(())
}

/// One-line summary used by `list`
pub fn book_line(book: &Book) -> String {
    let mut line = format!("{}  {}", book.id, book.title);
    if let Some(author) = &book.author {
        line.push_str(&format!(" by {}", author));
    }
    let tags: Vec<&str> = [book.subject.as_deref(), book.level.as_deref(), book.class_level.as_deref()]
        .into_iter()
        .flatten()
        .collect();
    if !tags.is_empty() {
        line.push_str(&format!(" [{}]", tags.join(", ")));
    }
    if book.featured {
        line.push_str(" *");
    }
    line
}

pub fn print_book(book: &Book) {
    println!("ID:          {}", book.id);
    println!("Title:       {}", book.title);
    let optional = [
        ("Author", &book.author),
        ("Subject", &book.subject),
        ("Level", &book.level),
        ("Class level", &book.class_level),
        ("Description", &book.description),
        ("File", &book.file_path),
        ("Cover", &book.cover_url),
    ];
    for (label, value) in optional {
        if let Some(value) = value {
            println!("{:<13}{}", format!("{}:", label), value);
        }
    }
    if let Some(pages) = book.pages {
        println!("Pages:       {}", pages);
    }
    if let Some(keywords) = book.keywords.as_ref().filter(|k| !k.is_empty()) {
        println!("Keywords:    {}", keywords.join(", "));
    }
    println!("Featured:    {}", if book.featured { "yes" } else { "no" });
    println!("Uploaded:    {}", book.upload_date.to_rfc3339());
}

/// Image MIME type from a cover file's extension.
pub fn cover_content_type(path: &Path) -> anyhow::Result<&'static str> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    match extension.as_str() {
        "jpg" | "jpeg" => Ok("image/jpeg"),
        "png" => Ok("image/png"),
        "webp" => Ok("image/webp"),
        _ => bail!("Unsupported cover image {:?}: use .jpg, .png or .webp", path),
    }
}

pub async fn read_local_file(path: &Path, content_type: &str) -> anyhow::Result<LocalFile> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("failed to read {}", path.display()))?;
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("file")
        .to_string();
    Ok(LocalFile { file_name, content_type: content_type.to_string(), bytes })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    #[test]
    fn cover_types_follow_extension() {
        assert_eq!(cover_content_type(Path::new("covers/atlas.JPG")).unwrap(), "image/jpeg");
        assert_eq!(cover_content_type(Path::new("atlas.jpeg")).unwrap(), "image/jpeg");
        assert_eq!(cover_content_type(Path::new("atlas.png")).unwrap(), "image/png");
        assert_eq!(cover_content_type(Path::new("atlas.webp")).unwrap(), "image/webp");
        assert!(cover_content_type(Path::new("atlas.gif")).is_err());
        assert!(cover_content_type(Path::new("atlas")).is_err());
    }

    #[test]
    fn book_line_lists_present_tags() {
        let book = Book {
            id: Uuid::nil(),
            title: "Atlas".to_string(),
            author: Some("Ortelius".to_string()),
            subject: Some("Geography".to_string()),
            level: None,
            class_level: Some("S2".to_string()),
            description: None,
            cover_url: None,
            file_path: None,
            pages: None,
            upload_date: Utc::now(),
            featured: true,
            keywords: None,
            popularity_score: None,
        };
        assert_eq!(
            book_line(&book),
            "00000000-0000-0000-0000-000000000000  Atlas by Ortelius [Geography, S2] *"
        );
    }
}
