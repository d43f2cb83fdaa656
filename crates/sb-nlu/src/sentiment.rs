//! Keyword-count sentiment scoring.
//!
//! Used when no external sentiment service is configured. Counts how many
//! positive and negative cue words appear as whole words and labels the
//! message by whichever side has more.

use crate::normalize::{Padded, normalize};
use sb_protocol::transcript::{Sentiment, SentimentLabel};

const POSITIVE: &[&str] = &[
    "good",
    "great",
    "excellent",
    "amazing",
    "wonderful",
    "fantastic",
    "love",
    "perfect",
    "awesome",
    "best",
    "happy",
    "thanks",
    "thank you",
];

const NEGATIVE: &[&str] = &[
    "bad",
    "terrible",
    "awful",
    "horrible",
    "worst",
    "hate",
    "angry",
    "disappointed",
    "frustrating",
    "problem",
    "issue",
    "broken",
    "poor",
];

/// Keyword-count sentiment scorer.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeywordSentiment;

impl KeywordSentiment {
    pub fn new() -> Self {
        Self
    }

    pub fn analyze(&self, text: &str) -> Sentiment {
        let padded = Padded::new(&normalize(text));
        let positive = POSITIVE.iter().filter(|w| padded.contains_phrase(w)).count();
        let negative = NEGATIVE.iter().filter(|w| padded.contains_phrase(w)).count();

        if positive > negative {
            let score = (0.7 + positive as f64 * 0.1).min(0.95);
            Sentiment {
                label: SentimentLabel::Positive,
                score,
                compound: score,
            }
        } else if negative > positive {
            let score = (0.6 + negative as f64 * 0.1).min(0.9);
            Sentiment {
                label: SentimentLabel::Negative,
                score,
                compound: -score,
            }
        } else {
            Sentiment::neutral()
        }
    }
}
