//! FAQ matching for questions no intent rule understood.

use sb_protocol::catalog::FaqEntry;

/// Minimum overlap score for an FAQ to count as an answer. A term in the
/// question is worth 2, a term only in the answer 1.
pub const MIN_FAQ_SCORE: u32 = 2;

/// Overlap between query terms and one FAQ entry.
pub fn overlap(terms: &[String], faq: &FaqEntry) -> u32 {
    let question = faq.question.to_lowercase();
    let answer = faq.answer.to_lowercase();
    terms
        .iter()
        .map(|term| {
            if question.contains(term.as_str()) {
                2
            } else if answer.contains(term.as_str()) {
                1
            } else {
                0
            }
        })
        .sum()
}

/// The best-scoring FAQ at or above [`MIN_FAQ_SCORE`].
///
/// Ties go to the most frequently asked entry, then the lowest id.
pub fn best_match<'a>(terms: &[String], faqs: &'a [FaqEntry]) -> Option<&'a FaqEntry> {
    faqs.iter()
        .map(|faq| (overlap(terms, faq), faq))
        .filter(|(score, _)| *score >= MIN_FAQ_SCORE)
        .max_by(|(sa, a), (sb, b)| {
            sa.cmp(sb)
                .then(a.times_asked.cmp(&b.times_asked))
                .then(b.id.cmp(&a.id))
        })
        .map(|(_, faq)| faq)
}
