//! Query-term extraction for catalog and FAQ lookups.

use crate::normalize::normalize;

/// Filler words and shopping verbs that carry no search meaning.
const STOP_WORDS: &[&str] = &[
    "a", "about", "am", "an", "and", "any", "anything", "are", "at", "be", "best", "buy", "can",
    "could", "did", "do", "does", "find", "for", "get", "good", "got", "has", "have", "how", "i",
    "im", "in", "is", "it", "its", "know", "like", "look", "looking", "me", "my", "need", "new",
    "of", "on", "or", "please", "purchase", "recommend", "search", "should", "show", "some",
    "something", "suggest", "take", "tell", "that", "the", "there", "this", "to", "want", "was",
    "we", "what", "whats", "when", "where", "which", "who", "why", "will", "with", "would", "you",
    "your",
];

/// Significant terms of a query, in order of appearance and deduplicated.
///
/// Stop words and words shorter than three characters are dropped (numbers
/// are kept), and a trailing plural `s` is removed so that "laptops"
/// matches "Laptop".
pub fn search_terms(text: &str) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for word in normalize(text).split(' ') {
        if word.is_empty() || STOP_WORDS.contains(&word) {
            continue;
        }
        let numeric = word.chars().all(|c| c.is_ascii_digit());
        if !numeric && word.chars().count() < 3 {
            continue;
        }
        let term = singular(word);
        if !out.iter().any(|t| t == term) {
            out.push(term.to_string());
        }
    }
    out
}

fn singular(word: &str) -> &str {
    if word.len() > 3 && word.ends_with('s') && !word.ends_with("ss") {
        &word[..word.len() - 1]
    } else {
        word
    }
}
