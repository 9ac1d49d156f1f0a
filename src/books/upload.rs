use axum::body::Bytes;
use axum::extract::Multipart;
use std::collections::HashMap;
use thiserror::Error;

use crate::config::UploadConfig;
use crate::database::models::book::blank_to_none;

pub const PDF_CONTENT_TYPE: &str = "application/pdf";

/// A file part from the upload form
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Bytes,
}

impl UploadedFile {
    pub fn size(&self) -> usize {
        self.bytes.len()
    }

    /// Final path component of the client-supplied name, so it cannot
    /// escape the book's storage prefix.
    pub fn storage_name(&self) -> String {
        let name = self
            .file_name
            .rsplit(['/', '\\'])
            .find(|s| !s.is_empty() && *s != "." && *s != "..")
            .unwrap_or("");
        if name.is_empty() {
            "file".to_string()
        } else {
            name.to_string()
        }
    }

    // Browsers send an empty part for an untouched file input
    fn is_placeholder(&self) -> bool {
        self.file_name.is_empty() && self.bytes.is_empty()
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum UploadError {
    #[error("Invalid multipart body: {0}")]
    Malformed(String),

    #[error("Title and PDF file are required")]
    MissingRequired,

    #[error("PDF file too large")]
    PdfTooLarge,

    #[error("Cover image too large")]
    CoverTooLarge,

    #[error("Invalid file type for PDF")]
    InvalidPdfType,

    #[error("Invalid file type for cover image")]
    InvalidCoverType,
}

/// Raw multipart upload before validation
#[derive(Debug, Default)]
pub struct UploadForm {
    pub fields: HashMap<String, String>,
    pub pdf: Option<UploadedFile>,
    pub cover: Option<UploadedFile>,
}

/// Metadata fields accepted alongside the files
#[derive(Debug, Clone, PartialEq)]
pub struct BookMetadata {
    pub title: String,
    pub author: Option<String>,
    pub subject: Option<String>,
    pub level: Option<String>,
    pub class_level: Option<String>,
    pub description: Option<String>,
    pub featured: bool,
}

/// An upload that passed every check; safe to start writing.
#[derive(Debug, Clone)]
pub struct ValidatedUpload {
    pub metadata: BookMetadata,
    pub pdf: UploadedFile,
    pub cover: Option<UploadedFile>,
}

impl UploadForm {
    /// Drains the multipart stream. Unknown text fields are kept but unused;
    /// unknown file fields are skipped.
    pub async fn from_multipart(mut multipart: Multipart) -> Result<Self, UploadError> {
        let mut form = UploadForm::default();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| UploadError::Malformed(e.to_string()))?
        {
            let Some(name) = field.name().map(str::to_string) else {
                continue;
            };

            match name.as_str() {
                "pdf" | "cover" => {
                    let file_name = field.file_name().unwrap_or_default().to_string();
                    let content_type = field.content_type().unwrap_or_default().to_string();
                    let bytes = field.bytes().await.map_err(|e| UploadError::Malformed(e.to_string()))?;
                    let file = UploadedFile { file_name, content_type, bytes };
                    if file.is_placeholder() {
                        continue;
                    }
                    if name == "pdf" {
                        form.pdf = Some(file);
                    } else {
                        form.cover = Some(file);
                    }
                }
                _ => {
                    let value = field.text().await.map_err(|e| UploadError::Malformed(e.to_string()))?;
                    form.fields.insert(name, value);
                }
            }
        }

        Ok(form)
    }

    fn field(&self, name: &str) -> Option<String> {
        blank_to_none(self.fields.get(name).map(|v| v.trim().to_string()))
    }

    /// Presence, then size, then type. The first failing rule wins.
    pub fn validate(self, config: &UploadConfig) -> Result<ValidatedUpload, UploadError> {
        let title = self.field("title");
        let (Some(title), Some(pdf)) = (title, self.pdf.clone()) else {
            return Err(UploadError::MissingRequired);
        };

        if pdf.size() > config.max_bytes {
            return Err(UploadError::PdfTooLarge);
        }
        if let Some(cover) = &self.cover {
            if cover.size() > config.max_bytes {
                return Err(UploadError::CoverTooLarge);
            }
        }

        if pdf.content_type != PDF_CONTENT_TYPE {
            return Err(UploadError::InvalidPdfType);
        }
        if let Some(cover) = &self.cover {
            if !config.allowed_cover_types.iter().any(|t| *t == cover.content_type) {
                return Err(UploadError::InvalidCoverType);
            }
        }

        let metadata = BookMetadata {
            title,
            author: self.field("author"),
            subject: self.field("subject"),
            level: self.field("level"),
            class_level: self.field("class_level"),
            description: self.field("description"),
            featured: self.fields.get("featured").map(String::as_str) == Some("true"),
        };

        Ok(ValidatedUpload { metadata, pdf, cover: self.cover })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;

    fn file(name: &str, content_type: &str, size: usize) -> UploadedFile {
        UploadedFile {
            file_name: name.to_string(),
            content_type: content_type.to_string(),
            bytes: Bytes::from(vec![0u8; size]),
        }
    }

    fn config(max_bytes: usize) -> UploadConfig {
        let mut upload = AppConfig::in_memory("secret").upload;
        upload.max_bytes = max_bytes;
        upload
    }

    fn form(title: &str, pdf: Option<UploadedFile>, cover: Option<UploadedFile>) -> UploadForm {
        let mut fields = HashMap::new();
        fields.insert("title".to_string(), title.to_string());
        UploadForm { fields, pdf, cover }
    }

    #[test]
    fn requires_title_and_pdf() {
        let missing_pdf = form("Biology", None, None);
        assert_eq!(missing_pdf.validate(&config(100)).unwrap_err(), UploadError::MissingRequired);

        let blank_title = form("   ", Some(file("a.pdf", PDF_CONTENT_TYPE, 10)), None);
        assert_eq!(blank_title.validate(&config(100)).unwrap_err(), UploadError::MissingRequired);
    }

    #[test]
    fn size_is_checked_before_type() {
        let oversized_wrong_type = form("T", Some(file("a.txt", "text/plain", 101)), None);
        assert_eq!(oversized_wrong_type.validate(&config(100)).unwrap_err(), UploadError::PdfTooLarge);

        let big_cover = form(
            "T",
            Some(file("a.pdf", PDF_CONTENT_TYPE, 10)),
            Some(file("c.png", "image/png", 101)),
        );
        assert_eq!(big_cover.validate(&config(100)).unwrap_err(), UploadError::CoverTooLarge);
    }

    #[test]
    fn exact_limit_is_allowed() {
        let at_limit = form("T", Some(file("a.pdf", PDF_CONTENT_TYPE, 100)), None);
        assert!(at_limit.validate(&config(100)).is_ok());
    }

    #[test]
    fn checks_mime_types() {
        let bad_pdf = form("T", Some(file("a.pdf", "application/x-pdf", 10)), None);
        assert_eq!(bad_pdf.validate(&config(100)).unwrap_err(), UploadError::InvalidPdfType);

        let bad_cover = form(
            "T",
            Some(file("a.pdf", PDF_CONTENT_TYPE, 10)),
            Some(file("c.gif", "image/gif", 10)),
        );
        assert_eq!(bad_cover.validate(&config(100)).unwrap_err(), UploadError::InvalidCoverType);
    }

    #[test]
    fn collects_metadata() {
        let mut upload = form("  Physics  ", Some(file("a.pdf", PDF_CONTENT_TYPE, 10)), Some(file("c.webp", "image/webp", 5)));
        upload.fields.insert("author".to_string(), "".to_string());
        upload.fields.insert("subject".to_string(), "Science".to_string());
        upload.fields.insert("featured".to_string(), "true".to_string());

        let valid = upload.validate(&config(100)).unwrap();
        assert_eq!(valid.metadata.title, "Physics");
        assert_eq!(valid.metadata.author, None);
        assert_eq!(valid.metadata.subject.as_deref(), Some("Science"));
        assert!(valid.metadata.featured);
        assert!(valid.cover.is_some());
    }

    #[test]
    fn storage_name_strips_directories() {
        assert_eq!(file("../../etc/passwd", "", 0).storage_name(), "passwd");
        assert_eq!(file("C:\\docs\\book.pdf", "", 0).storage_name(), "book.pdf");
        assert_eq!(file("", "", 0).storage_name(), "file");
        assert_eq!(file("..", "", 0).storage_name(), "file");
    }
}
