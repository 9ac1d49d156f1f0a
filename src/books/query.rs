use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{json, Map, Value};

use crate::database::models::Book;
use crate::filter::FilterData;

/// Books shown per dashboard page
pub const PAGE_SIZE: i64 = 10;

/// Dashboard listing parameters: free-text search over title and author,
/// exact level/subject filters, 1-based page number.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BookQuery {
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub level: Option<String>,
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default, deserialize_with = "lenient_page")]
    pub page: Option<u32>,
}

// `?page=` and `?page=abc` fall back to the first page instead of a 400
fn lenient_page<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.and_then(|s| s.trim().parse().ok()))
}

/// One page of dashboard results
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookPage {
    pub books: Vec<Book>,
    pub total: i64,
    pub page: u32,
    pub page_size: i64,
    pub total_pages: i64,
}

impl BookQuery {
    pub fn page(&self) -> u32 {
        self.page.unwrap_or(1).max(1)
    }

    pub fn offset(&self) -> i64 {
        (i64::from(self.page()) - 1) * PAGE_SIZE
    }

    fn search_term(&self) -> Option<&str> {
        self.search.as_deref().filter(|s| !s.is_empty())
    }

    fn level(&self) -> Option<&str> {
        self.level.as_deref().filter(|s| !s.is_empty())
    }

    fn subject(&self) -> Option<&str> {
        self.subject.as_deref().filter(|s| !s.is_empty())
    }

    /// Predicate in the filter language, without ordering or paging.
    pub fn where_clause(&self) -> Value {
        let mut clause = Map::new();
        if let Some(term) = self.search_term() {
            let pattern = format!("%{}%", escape_like(term));
            clause.insert(
                "$or".to_string(),
                json!([
                    { "title": { "$ilike": pattern } },
                    { "author": { "$ilike": pattern } }
                ]),
            );
        }
        if let Some(level) = self.level() {
            clause.insert("level".to_string(), json!(level));
        }
        if let Some(subject) = self.subject() {
            clause.insert("subject".to_string(), json!(subject));
        }
        Value::Object(clause)
    }

    /// Full page query: newest uploads first, `PAGE_SIZE` rows from the
    /// page offset.
    pub fn to_filter(&self) -> FilterData {
        FilterData {
            select: None,
            where_clause: Some(self.where_clause()),
            order: Some(json!("upload_date desc")),
            limit: Some(PAGE_SIZE),
            offset: Some(self.offset()),
        }
    }

    pub fn to_count_filter(&self) -> FilterData {
        FilterData {
            where_clause: Some(self.where_clause()),
            ..Default::default()
        }
    }

    /// Evaluates the same predicate as [`BookQuery::where_clause`] against a
    /// loaded row.
    pub fn matches(&self, book: &Book) -> bool {
        if let Some(term) = self.search_term() {
            let needle = term.to_lowercase();
            let in_title = book.title.to_lowercase().contains(&needle);
            let in_author = book
                .author
                .as_deref()
                .map(|a| a.to_lowercase().contains(&needle))
                .unwrap_or(false);
            if !in_title && !in_author {
                return false;
            }
        }
        if let Some(level) = self.level() {
            if book.level.as_deref() != Some(level) {
                return false;
            }
        }
        if let Some(subject) = self.subject() {
            if book.subject.as_deref() != Some(subject) {
                return false;
            }
        }
        true
    }

    pub fn into_page(&self, books: Vec<Book>, total: i64) -> BookPage {
        BookPage {
            books,
            total,
            page: self.page(),
            page_size: PAGE_SIZE,
            total_pages: (total + PAGE_SIZE - 1) / PAGE_SIZE,
        }
    }
}

/// Makes LIKE wildcards in user input match literally.
fn escape_like(term: &str) -> String {
    let mut out = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '\\' | '%' | '_') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}
