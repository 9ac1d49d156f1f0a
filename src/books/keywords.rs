use std::collections::HashSet;

/// Words of this many characters or fewer are not worth indexing.
const MIN_KEYWORD_CHARS: usize = 2;

/// Tag set for a new book: lower-cased words longer than two characters from
/// the title, then the subject, each kept once in first-seen order.
pub fn derive_keywords(title: &str, subject: Option<&str>) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut keywords = Vec::new();

    for text in std::iter::once(title).chain(subject) {
        for word in text.to_lowercase().split_whitespace() {
            if word.chars().count() > MIN_KEYWORD_CHARS && seen.insert(word.to_string()) {
                keywords.push(word.to_string());
            }
        }
    }

    keywords
}
