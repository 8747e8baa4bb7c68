//! Relevance scoring of candidates against a query.
//!
//! Assigns scores based on:
//! - Token-set similarity of the title and snippet
//! - Partial similarity of the URL
//! - Whole-word presence bonuses in the title and snippet
//!
//! Formula:
//!
//! ```text
//! score = 0.6 * token_set(title)
//!       + 0.3 * token_set(snippet)     (0 when the snippet is empty)
//!       + 0.1 * partial(url)
//!       + 8   if the query is a whole word in the title
//!       + 4   if the query is a whole word in the snippet
//! ```
//!
//! Rounded to two decimals. Scores above 100 are possible; `>= 100` is
//! excellent.

use crate::config::ScoreThresholds;
use crate::types::Candidate;

use super::similarity::{contains_whole_word, partial_ratio, token_set_ratio};

const TITLE_WEIGHT: f64 = 0.6;
const SNIPPET_WEIGHT: f64 = 0.3;
const URL_WEIGHT: f64 = 0.1;
const TITLE_WORD_BONUS: f64 = 8.0;
const SNIPPET_WORD_BONUS: f64 = 4.0;

/// Calculate the relevance of a candidate for `query`.
///
/// # Arguments
///
/// * `query` - The user's search phrase
/// * `title` - Page or result title
/// * `snippet` - Description text, possibly empty
/// * `url` - Absolute URL of the page
pub fn relevance_score(query: &str, title: &str, snippet: &str, url: &str) -> f64 {
    let title_sim = token_set_ratio(title, query);
    let snippet_sim = if snippet.is_empty() {
        0.0
    } else {
        token_set_ratio(snippet, query)
    };
    let url_sim = partial_ratio(url, query);

    let mut score = TITLE_WEIGHT * title_sim + SNIPPET_WEIGHT * snippet_sim + URL_WEIGHT * url_sim;
    if contains_whole_word(title, query) {
        score += TITLE_WORD_BONUS;
    }
    if contains_whole_word(snippet, query) {
        score += SNIPPET_WORD_BONUS;
    }
    round2(score)
}

/// Apply [`relevance_score`] to every candidate in place.
pub fn score_candidates(query: &str, candidates: &mut [Candidate]) {
    for c in candidates.iter_mut() {
        c.score = relevance_score(query, &c.title, &c.snippet, &c.url);
    }
}

/// Sort candidates by descending score. Ties keep their input order.
pub fn sort_by_score(candidates: &mut [Candidate]) {
    candidates.sort_by(|a, b| b.score.total_cmp(&a.score));
}

/// Whether a result is closely enough related to `query` to be ranked.
///
/// All three must hold:
/// - the query appears as a whole word in the title or the snippet
/// - title similarity reaches `thresholds.strong_candidate`
/// - when a snippet exists, its similarity reaches `thresholds.snippet_min`
pub fn is_strong_candidate(
    query: &str,
    title: &str,
    snippet: &str,
    thresholds: &ScoreThresholds,
) -> bool {
    if !contains_whole_word(title, query) && !contains_whole_word(snippet, query) {
        return false;
    }
    if token_set_ratio(title, query) < thresholds.strong_candidate {
        return false;
    }
    if !snippet.is_empty() && token_set_ratio(snippet, query) < thresholds.snippet_min {
        return false;
    }
    true
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn thresholds() -> ScoreThresholds {
        ScoreThresholds::default()
    }

    #[test]
    fn exact_title_gets_full_title_weight_and_bonus() {
        let score = relevance_score("one piece", "One Piece", "", "https://a.com/one-piece");
        // 0.6 * 100 + 0.1 * 100 + 8
        assert!((score - 78.0).abs() < 1e-9, "got {score}");
    }

    #[test]
    fn matching_snippet_adds_weight_and_bonus() {
        let with = relevance_score(
            "one piece",
            "One Piece",
            "Watch one piece online",
            "https://a.com/one-piece",
        );
        // 78 + 0.3 * 100 + 4
        assert!((with - 112.0).abs() < 1e-9, "got {with}");
    }

    #[test]
    fn unrelated_result_scores_low() {
        let score = relevance_score("one piece", "Contact us", "", "https://a.com/contact");
        assert!(score < 60.0, "got {score}");
    }

    #[test]
    fn score_is_rounded_to_two_decimals() {
        let score = relevance_score("naruto", "Naruto Shippuden episode", "", "https://a.com/x");
        assert!(((score * 100.0).round() - score * 100.0).abs() < 1e-6);
    }

    #[test]
    fn score_is_deterministic() {
        let a = relevance_score("bleach", "Bleach 12", "bleach", "https://a.com/bleach-12");
        let b = relevance_score("bleach", "Bleach 12", "bleach", "https://a.com/bleach-12");
        assert!((a - b).abs() < f64::EPSILON);
    }

    #[test]
    fn exact_title_is_strong() {
        assert!(is_strong_candidate("one piece", "One Piece", "", &thresholds()));
    }

    #[test]
    fn partial_word_is_not_strong() {
        assert!(!is_strong_candidate("cat", "Concatenate strings", "", &thresholds()));
    }

    #[test]
    fn weak_snippet_disqualifies() {
        assert!(!is_strong_candidate(
            "one piece",
            "One Piece",
            "Unrelated description about cooking pasta",
            &thresholds()
        ));
    }

    #[test]
    fn word_in_snippet_only_can_still_be_strong() {
        // Title similarity is 100 (token subset) but the title is hyphenated.
        assert!(is_strong_candidate(
            "one piece",
            "one-piece",
            "one piece episode list",
            &thresholds()
        ));
    }

    #[test]
    fn score_and_sort_orders_descending() {
        let mut candidates = vec![
            Candidate::new("Contact", "https://a.com/contact", ""),
            Candidate::new("One Piece", "https://a.com/one-piece", "one piece"),
            Candidate::new("One Piece Film Red", "https://a.com/film", ""),
        ];
        score_candidates("one piece", &mut candidates);
        sort_by_score(&mut candidates);
        assert_eq!(candidates[0].url, "https://a.com/one-piece");
        assert_eq!(candidates[2].url, "https://a.com/contact");
        for pair in candidates.windows(2) {
            assert!(pair[0].score >= pair[1].score);
        }
    }

    #[test]
    fn sort_keeps_ties_in_input_order() {
        let mut candidates = vec![
            Candidate { score: 50.0, ..Candidate::new("a", "https://a.com/1", "") },
            Candidate { score: 50.0, ..Candidate::new("b", "https://a.com/2", "") },
        ];
        sort_by_score(&mut candidates);
        assert_eq!(candidates[0].title, "a");
    }
}
