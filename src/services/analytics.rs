use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::database::models::{Book, BookChange};

const TOP_BOOKS: usize = 10;

/// Number of audit entries shown on the analytics page
pub const RECENT_CHANGES: i64 = 10;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubjectCount {
    pub subject: String,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LevelCount {
    pub level: String,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyticsSummary {
    pub total_books: usize,
    pub featured_books: usize,
    pub total_subjects: usize,
    pub total_levels: usize,
    pub uploads_this_week: usize,
    pub uploads_this_month: usize,
    pub top_books: Vec<Book>,
    pub recent_changes: Vec<BookChange>,
    pub subject_distribution: Vec<SubjectCount>,
    pub level_distribution: Vec<LevelCount>,
}

pub fn summarize(mut books: Vec<Book>, recent_changes: Vec<BookChange>, now: DateTime<Utc>) -> AnalyticsSummary {
    let week_ago = now - Duration::days(7);
    let month_ago = now - Duration::days(30);

    let subjects = tally(books.iter().filter_map(|b| b.subject.as_deref()));
    let levels = tally(books.iter().filter_map(|b| b.level.as_deref()));

    let total_books = books.len();
    let featured_books = books.iter().filter(|b| b.featured).count();
    let uploads_this_week = books.iter().filter(|b| b.upload_date >= week_ago).count();
    let uploads_this_month = books.iter().filter(|b| b.upload_date >= month_ago).count();

    // Stable, so equal scores keep catalog order
    books.sort_by(|a, b| score(b).total_cmp(&score(a)));
    books.truncate(TOP_BOOKS);

    AnalyticsSummary {
        total_books,
        featured_books,
        total_subjects: subjects.len(),
        total_levels: levels.len(),
        uploads_this_week,
        uploads_this_month,
        top_books: books,
        recent_changes,
        subject_distribution: subjects
            .into_iter()
            .map(|(subject, count)| SubjectCount { subject, count })
            .collect(),
        level_distribution: levels
            .into_iter()
            .map(|(level, count)| LevelCount { level, count })
            .collect(),
    }
}

fn score(book: &Book) -> f64 {
    book.popularity_score.unwrap_or(0.0)
}

/// Occurrence counts in first-seen order, then most frequent first.
fn tally<'a>(values: impl Iterator<Item = &'a str>) -> Vec<(String, usize)> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut counts: Vec<(String, usize)> = Vec::new();

    for value in values {
        match index.get(value) {
            Some(&i) => counts[i].1 += 1,
            None => {
                index.insert(value, counts.len());
                counts.push((value.to_string(), 1));
            }
        }
    }

    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts
}
