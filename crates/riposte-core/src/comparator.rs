//! # Comparator Module
//!
//! Pluggable similarity scoring between two statements.
//!
//! - Scores are `Confidence` values in `[0, 1]`, higher = more similar
//! - Comparators are pure and deterministic for identical inputs
//! - Symmetry is not required: the first argument is always the input

use crate::confidence::Confidence;
use crate::primitives::MAX_COMPARE_CHARS;
use crate::types::{RiposteError, Statement};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::str::FromStr;

/// Similarity strategy injected into the selector.
pub trait Comparator: Send + Sync {
    /// Short identifier used in logs and configuration.
    fn name(&self) -> &'static str;

    /// Score how similar `candidate` is to `input`.
    fn compare(&self, input: &Statement, candidate: &Statement) -> Confidence;
}

// =============================================================================
// LEVENSHTEIN
// =============================================================================

/// Normalized edit-distance similarity over lower-cased characters.
///
/// `1 - distance / max(len_a, len_b)`. Two empty strings are identical (1.0).
/// Only the first `MAX_COMPARE_CHARS` characters of each text are compared.
#[derive(Debug, Clone, Copy, Default)]
pub struct LevenshteinDistance;

impl Comparator for LevenshteinDistance {
    fn name(&self) -> &'static str {
        "levenshtein"
    }

    fn compare(&self, input: &Statement, candidate: &Statement) -> Confidence {
        let a = leading_chars(&input.text);
        let b = leading_chars(&candidate.text);

        let longest = a.len().max(b.len());
        if longest == 0 {
            return Confidence::max();
        }

        let distance = levenshtein(&a, &b);
        Confidence::new(1.0 - distance as f64 / longest as f64)
    }
}

/// Lower-cased characters inside the comparison window.
fn leading_chars(text: &str) -> Vec<char> {
    text.chars()
        .take(MAX_COMPARE_CHARS)
        .flat_map(char::to_lowercase)
        .collect()
}

/// Classic two-row dynamic programming edit distance.
fn levenshtein(a: &[char], b: &[char]) -> usize {
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0usize; b.len() + 1];

    for (i, ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let substitution = prev[j] + usize::from(ca != cb);
            let insertion = curr[j] + 1;
            let deletion = prev[j + 1] + 1;
            curr[j + 1] = substitution.min(insertion).min(deletion);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b.len()]
}

// =============================================================================
// JACCARD
// =============================================================================

/// Word-set overlap: `|A ∩ B| / |A ∪ B|` over lower-cased alphanumeric words.
///
/// Returns 0.0 if both statements have no words.
#[derive(Debug, Clone, Copy, Default)]
pub struct JaccardSimilarity;

impl JaccardSimilarity {
    fn words(text: &str) -> BTreeSet<String> {
        text.split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
            .map(str::to_lowercase)
            .collect()
    }
}

impl Comparator for JaccardSimilarity {
    fn name(&self) -> &'static str {
        "jaccard"
    }

    fn compare(&self, input: &Statement, candidate: &Statement) -> Confidence {
        let set_a = Self::words(&input.text);
        let set_b = Self::words(&candidate.text);

        let union = set_a.union(&set_b).count();
        if union == 0 {
            return Confidence::zero();
        }
        let intersection = set_a.intersection(&set_b).count();
        Confidence::new(intersection as f64 / union as f64)
    }
}

// =============================================================================
// EXACT MATCH
// =============================================================================

/// 1.0 when the texts are identical, 0.0 otherwise.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExactMatch;

impl Comparator for ExactMatch {
    fn name(&self) -> &'static str {
        "exact"
    }

    fn compare(&self, input: &Statement, candidate: &Statement) -> Confidence {
        if input.text == candidate.text {
            Confidence::max()
        } else {
            Confidence::zero()
        }
    }
}

// =============================================================================
// SELECTION BY NAME
// =============================================================================

/// Named comparator choice, as written in configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComparatorKind {
    #[default]
    Levenshtein,
    Jaccard,
    Exact,
}

impl ComparatorKind {
    /// Instantiate the comparator.
    #[must_use]
    pub fn build(self) -> Box<dyn Comparator> {
        match self {
            Self::Levenshtein => Box::new(LevenshteinDistance),
            Self::Jaccard => Box::new(JaccardSimilarity),
            Self::Exact => Box::new(ExactMatch),
        }
    }
}

impl FromStr for ComparatorKind {
    type Err = RiposteError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "levenshtein" | "levenshtein_distance" => Ok(Self::Levenshtein),
            "jaccard" | "jaccard_similarity" => Ok(Self::Jaccard),
            "exact" | "exact_match" => Ok(Self::Exact),
            other => Err(RiposteError::InvalidConfig(format!(
                "Unknown comparator: {}. Use: levenshtein, jaccard, exact",
                other
            ))),
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn score(c: &dyn Comparator, a: &str, b: &str) -> f64 {
        c.compare(&Statement::new(a), &Statement::new(b)).value()
    }

    #[test]
    fn levenshtein_identical_is_one() {
        assert_eq!(score(&LevenshteinDistance, "Hello there", "hello there"), 1.0);
    }

    #[test]
    fn levenshtein_known_distance() {
        // kitten -> sitting = 3 edits over 7 chars
        let s = score(&LevenshteinDistance, "kitten", "sitting");
        assert!((s - (1.0 - 3.0 / 7.0)).abs() < 1e-9);
    }

    #[test]
    fn levenshtein_empty_inputs() {
        assert_eq!(score(&LevenshteinDistance, "", ""), 1.0);
        assert_eq!(score(&LevenshteinDistance, "", "abc"), 0.0);
        assert_eq!(score(&LevenshteinDistance, "abc", ""), 0.0);
    }

    #[test]
    fn levenshtein_counts_chars_not_bytes() {
        assert_eq!(levenshtein(&['é'], &['e']), 1);
        let s = score(&LevenshteinDistance, "café", "cafe");
        assert!((s - 0.75).abs() < 1e-9);
    }

    #[test]
    fn levenshtein_compares_leading_window_only() {
        let shared = "a".repeat(MAX_COMPARE_CHARS);
        let a = format!("{}{}", shared, "x".repeat(60_000));
        let b = format!("{}{}", shared, "y".repeat(60_000));
        assert_eq!(score(&LevenshteinDistance, &a, &b), 1.0);

        let c = format!("b{}", &a[1..]);
        let s = score(&LevenshteinDistance, &a, &c);
        assert!((s - (1.0 - 1.0 / MAX_COMPARE_CHARS as f64)).abs() < 1e-9);
    }

    #[test]
    fn jaccard_overlap() {
        // {how, are, you} vs {how, are, they} -> 2 / 4
        let s = score(&JaccardSimilarity, "How are you?", "how are they");
        assert!((s - 0.5).abs() < 1e-9);
    }

    #[test]
    fn jaccard_both_empty_is_zero() {
        assert_eq!(score(&JaccardSimilarity, "", "  ?! "), 0.0);
    }

    #[test]
    fn exact_match_scores() {
        assert_eq!(score(&ExactMatch, "hello", "hello"), 1.0);
        assert_eq!(score(&ExactMatch, "hello", "Hello"), 0.0);
    }

    #[test]
    fn scores_stay_in_unit_range() {
        let comparators: [&dyn Comparator; 3] =
            [&LevenshteinDistance, &JaccardSimilarity, &ExactMatch];
        for c in comparators {
            for (a, b) in [("a", "b"), ("", "x"), ("same", "same"), ("a b c", "c")] {
                let s = score(c, a, b);
                assert!((0.0..=1.0).contains(&s), "{} gave {}", c.name(), s);
            }
        }
    }

    #[test]
    fn kind_from_str() {
        assert_eq!(
            "levenshtein".parse::<ComparatorKind>().expect("parse"),
            ComparatorKind::Levenshtein
        );
        assert_eq!(
            " Jaccard ".parse::<ComparatorKind>().expect("parse"),
            ComparatorKind::Jaccard
        );
        assert!(matches!(
            "cosine".parse::<ComparatorKind>(),
            Err(RiposteError::InvalidConfig(_))
        ));
    }

    #[test]
    fn kind_builds_named_comparator() {
        assert_eq!(ComparatorKind::Exact.build().name(), "exact");
        assert_eq!(ComparatorKind::default().build().name(), "levenshtein");
    }
}
