//! String-closeness measures on a 0–100 scale.
//!
//! All measures are built on the character-level diff ratio from
//! [`similar`] (`2 * matches / total_len`), applied to preprocessed
//! text: lowercased, punctuation replaced by spaces, whitespace collapsed.

use std::collections::BTreeSet;

use regex::RegexBuilder;
use similar::TextDiff;

/// Lowercase, replace non-alphanumeric characters with spaces, and
/// collapse runs of whitespace.
pub fn preprocess(text: &str) -> String {
    text.chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect::<String>()
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Plain diff ratio between two already-processed strings.
pub fn ratio(a: &str, b: &str) -> f64 {
    if a.is_empty() && b.is_empty() {
        return 100.0;
    }
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    f64::from(TextDiff::from_chars(a, b).ratio()) * 100.0
}

/// Token-set ratio: compares the shared tokens against each side's extras.
///
/// Word order and duplicated words are ignored. If every token of one side
/// appears in the other, the result is 100.
pub fn token_set_ratio(a: &str, b: &str) -> f64 {
    let a = preprocess(a);
    let b = preprocess(b);
    let ta: BTreeSet<&str> = a.split(' ').filter(|t| !t.is_empty()).collect();
    let tb: BTreeSet<&str> = b.split(' ').filter(|t| !t.is_empty()).collect();
    if ta.is_empty() || tb.is_empty() {
        return 0.0;
    }

    let intersection: Vec<&str> = ta.intersection(&tb).copied().collect();
    let diff_ab: Vec<&str> = ta.difference(&tb).copied().collect();
    let diff_ba: Vec<&str> = tb.difference(&ta).copied().collect();

    if !intersection.is_empty() && (diff_ab.is_empty() || diff_ba.is_empty()) {
        return 100.0;
    }

    let sect = intersection.join(" ");
    let join = |extra: &[&str]| {
        if sect.is_empty() {
            extra.join(" ")
        } else {
            format!("{sect} {}", extra.join(" "))
        }
    };
    let sect_ab = join(&diff_ab);
    let sect_ba = join(&diff_ba);

    let mut best = ratio(&sect_ab, &sect_ba);
    if !sect.is_empty() {
        best = best.max(ratio(&sect, &sect_ab)).max(ratio(&sect, &sect_ba));
    }
    best
}

/// Partial ratio: best alignment of the shorter string against every
/// equally long window of the longer one.
pub fn partial_ratio(a: &str, b: &str) -> f64 {
    let a = preprocess(a);
    let b = preprocess(b);
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }

    let (short, long) = if a.chars().count() <= b.chars().count() {
        (a, b)
    } else {
        (b, a)
    };
    let long_chars: Vec<char> = long.chars().collect();
    let width = short.chars().count();

    let mut best = 0.0_f64;
    for start in 0..=(long_chars.len() - width) {
        let window: String = long_chars[start..start + width].iter().collect();
        best = best.max(ratio(&short, &window));
        if best >= 100.0 {
            break;
        }
    }
    best
}

/// Case-insensitive whole-word search for `phrase` inside `text`.
///
/// Prevents partial overlaps from counting as presence: `"one"` is not
/// present in `"someone"`.
pub fn contains_whole_word(text: &str, phrase: &str) -> bool {
    let phrase = phrase.trim();
    if phrase.is_empty() || text.is_empty() {
        return false;
    }
    let pattern = format!(r"\b{}\b", regex::escape(phrase));
    match RegexBuilder::new(&pattern).case_insensitive(true).build() {
        Ok(re) => re.is_match(text),
        Err(e) => {
            tracing::debug!(error = %e, "whole-word pattern rejected");
            false
        }
    }
}
