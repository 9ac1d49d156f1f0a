use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Book {
    pub id: Uuid,
    pub title: String,
    pub author: Option<String>,
    pub subject: Option<String>,
    pub level: Option<String>,
    pub class_level: Option<String>,
    pub description: Option<String>,
    pub cover_url: Option<String>,
    pub file_path: Option<String>,
    pub pages: Option<i32>,
    pub upload_date: DateTime<Utc>,
    pub featured: bool,
    pub keywords: Option<Vec<String>>,
    pub popularity_score: Option<f64>,
}

/// Row handed to the store by the upload handler. The id is generated up
/// front because storage paths are derived from it.
#[derive(Debug, Clone, Serialize)]
pub struct NewBook {
    pub id: Uuid,
    pub title: String,
    pub author: Option<String>,
    pub subject: Option<String>,
    pub level: Option<String>,
    pub class_level: Option<String>,
    pub description: Option<String>,
    pub cover_url: Option<String>,
    pub file_path: Option<String>,
    pub pages: Option<i32>,
    pub featured: bool,
    pub keywords: Vec<String>,
}

/// Editable metadata, as submitted by the edit form.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BookUpdate {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub level: Option<String>,
    #[serde(default)]
    pub class_level: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub featured: bool,
}

impl BookUpdate {
    /// Blank optional fields are stored as NULL.
    pub fn normalized(mut self) -> Self {
        self.title = self.title.trim().to_string();
        self.author = blank_to_none(self.author);
        self.subject = blank_to_none(self.subject);
        self.level = blank_to_none(self.level);
        self.class_level = blank_to_none(self.class_level);
        self.description = blank_to_none(self.description);
        self
    }
}

impl Book {
    pub fn apply(&mut self, update: &BookUpdate) {
        self.title = update.title.clone();
        self.author = update.author.clone();
        self.subject = update.subject.clone();
        self.level = update.level.clone();
        self.class_level = update.class_level.clone();
        self.description = update.description.clone();
        self.featured = update.featured;
    }
}

pub fn blank_to_none(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
