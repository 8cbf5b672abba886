//! Free-text submission parsing: title/body split and hashtag extraction.
//!
//! A raw submission is split on the first newline into title and body, and
//! the whole original text is scanned for `#tag` tokens. Parsing is pure;
//! persistence and tag resolution happen in the repository layer.

use regex::Regex;

/// Parsed form of a raw text submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub title: String,
    pub body: String,
    /// Extracted tag names in order of appearance, duplicates preserved.
    /// Deduplication happens during tag resolution.
    pub tag_names: Vec<String>,
}

/// Parse a raw submission into title, body, and tag names.
///
/// # Examples
///
/// ```
/// use quillbox_core::ingest::parse_submission;
///
/// let sub = parse_submission("Shopping\nBuy milk #errands #food");
/// assert_eq!(sub.title, "Shopping");
/// assert_eq!(sub.body, "Buy milk #errands #food");
/// assert_eq!(sub.tag_names, vec!["errands", "food"]);
/// ```
pub fn parse_submission(text: &str) -> Submission {
    let (title, body) = split_title_body(text);
    let tag_names = extract_hashtags(text);
    Submission {
        title,
        body,
        tag_names,
    }
}

/// Split text on the first newline only, trimming both parts.
///
/// Without a newline the entire trimmed text becomes the title and the
/// body is empty. The remainder may itself contain newlines; they are
/// preserved in the body.
pub fn split_title_body(text: &str) -> (String, String) {
    match text.split_once('\n') {
        Some((first, rest)) => (first.trim().to_string(), rest.trim().to_string()),
        None => (text.trim().to_string(), String::new()),
    }
}

/// Extract hashtag names from the entire text.
///
/// A hashtag is `#` followed by one or more lowercase ASCII letters. The
/// match is case-sensitive: `#Foo` and `#123` are not tags. Duplicates are
/// preserved at this stage.
pub fn extract_hashtags(text: &str) -> Vec<String> {
    let hashtag_pattern = Regex::new(r"#([a-z]+)").unwrap();

    hashtag_pattern
        .captures_iter(text)
        .filter_map(|cap| cap.get(1))
        .map(|m| m.as_str().to_string())
        .collect()
}
