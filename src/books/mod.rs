//! Catalog rules that do not touch the backend: upload validation, keyword
//! and page-count derivation, dashboard query composition.

pub mod keywords;
pub mod pdf;
pub mod query;
pub mod upload;

pub use keywords::derive_keywords;
pub use pdf::count_pages;
pub use query::{BookPage, BookQuery, PAGE_SIZE};
pub use upload::{BookMetadata, UploadError, UploadForm, UploadedFile, ValidatedUpload};
