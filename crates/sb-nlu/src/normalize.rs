//! Text normalization shared by every matcher.

/// Lowercase, drop apostrophes, turn any other punctuation into a space,
/// and collapse runs of whitespace.
///
/// `"Where's my ORDER?!"` becomes `"wheres my order"`.
pub fn normalize(text: &str) -> String {
    let mut cleaned = String::with_capacity(text.len());
    for c in text.chars() {
        if c == '\'' || c == '\u{2019}' {
            continue;
        }
        if c.is_alphanumeric() {
            cleaned.extend(c.to_lowercase());
        } else {
            cleaned.push(' ');
        }
    }
    cleaned.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Normalized text padded with a space on each side, so that whole-word
/// containment becomes a plain substring test.
#[derive(Debug, Clone)]
pub struct Padded(String);

impl Padded {
    pub fn new(normalized: &str) -> Self {
        Self(format!(" {normalized} "))
    }

    /// True when `phrase` (already normalized) appears on word boundaries.
    pub fn contains_phrase(&self, phrase: &str) -> bool {
        if phrase.is_empty() {
            return false;
        }
        let needle = format!(" {phrase} ");
        self.0.contains(&needle)
    }

    /// The unpadded normalized text.
    pub fn as_str(&self) -> &str {
        self.0.trim()
    }
}
