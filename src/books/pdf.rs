use lopdf::Document;

/// Number of pages in a PDF, or `None` when the bytes cannot be parsed.
/// A failed count never fails an upload.
pub fn count_pages(bytes: &[u8]) -> Option<i32> {
    match Document::load_mem(bytes) {
        Ok(doc) => i32::try_from(doc.get_pages().len()).ok(),
        Err(e) => {
            tracing::warn!("Error counting PDF pages: {}", e);
            None
        }
    }
}
