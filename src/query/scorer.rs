//! Fuzzy subsequence scoring
//!
//! Scores how well a query matches a candidate string with a single
//! left-to-right greedy pass:
//! - base points for every matched character
//! - boundary bonus at the start of text or after `/`, `.`, `_`, space
//! - growing bonus for uninterrupted runs of consecutive matches
//! - exact-case bonus on top of the case-insensitive match
//! - completion bonus (and end-of-text bonus) for a full match
//!
//! A partial match keeps half of what it accumulated.

use serde::{Deserialize, Serialize};

/// Point values for each scoring rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoringWeights {
    /// Points for every matched character
    pub match_base: u32,
    /// Bonus when the match starts the text or follows a boundary character
    pub boundary_bonus: u32,
    /// Multiplied by the current run length for consecutive matches
    pub consecutive_step: u32,
    /// Bonus when the matched character has the same case as the pattern
    pub exact_case_bonus: u32,
    /// Bonus once every pattern character has been matched
    pub completion_bonus: u32,
    /// Extra bonus when the full match ends on the last character of the text
    pub end_of_text_bonus: u32,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            match_base: 10,
            boundary_bonus: 20,
            consecutive_step: 5,
            exact_case_bonus: 5,
            completion_bonus: 50,
            end_of_text_bonus: 100,
        }
    }
}

/// Scorer calculates fuzzy match scores for candidates
#[derive(Debug, Clone, Default)]
pub struct Scorer {
    weights: ScoringWeights,
}

impl Scorer {
    pub fn new(weights: ScoringWeights) -> Self {
        Self { weights }
    }

    /// Create a scorer with default weights
    pub fn with_defaults() -> Self {
        Self::new(ScoringWeights::default())
    }

    /// Score `pattern` against `text`. Empty inputs score 0.
    pub fn score(&self, pattern: &str, text: &str) -> u32 {
        if pattern.is_empty() || text.is_empty() {
            return 0;
        }

        let w = &self.weights;
        let pattern: Vec<char> = pattern.chars().collect();
        let text_len = text.chars().count();

        let mut pattern_idx = 0;
        let mut last_match_idx: Option<usize> = None;
        let mut run: u32 = 0;
        let mut total: u32 = 0;
        let mut prev: Option<char> = None;

        for (idx, ch) in text.chars().enumerate() {
            let wanted = pattern[pattern_idx];

            if fold(ch) == fold(wanted) {
                total = total.saturating_add(w.match_base);

                if prev.is_none_or(is_boundary) {
                    total = total.saturating_add(w.boundary_bonus);
                }

                if pattern_idx > 0 && last_match_idx.is_some_and(|last| last + 1 == idx) {
                    run = run.saturating_add(1);
                    total = total.saturating_add(w.consecutive_step.saturating_mul(run));
                } else {
                    run = 0;
                }

                if ch == wanted {
                    total = total.saturating_add(w.exact_case_bonus);
                }

                last_match_idx = Some(idx);
                pattern_idx += 1;

                if pattern_idx == pattern.len() {
                    total = total.saturating_add(w.completion_bonus);
                    if idx + 1 == text_len {
                        total = total.saturating_add(w.end_of_text_bonus);
                    }
                    return total;
                }
            }

            prev = Some(ch);
        }

        // Partial match penalty
        total / 2
    }

    /// Get the weights (for external calculations)
    pub fn weights(&self) -> &ScoringWeights {
        &self.weights
    }
}

/// Score `pattern` against `text` with the default weights
pub fn score(pattern: &str, text: &str) -> u32 {
    Scorer::with_defaults().score(pattern, text)
}

/// Char indices of `text` consumed by the greedy case-insensitive
/// subsequence walk. A partial match returns the positions it got to.
pub fn match_positions(pattern: &str, text: &str) -> Vec<usize> {
    let pattern: Vec<char> = pattern.chars().collect();
    let mut positions = Vec::with_capacity(pattern.len());

    if pattern.is_empty() {
        return positions;
    }

    for (idx, ch) in text.chars().enumerate() {
        if fold(ch) == fold(pattern[positions.len()]) {
            positions.push(idx);
            if positions.len() == pattern.len() {
                break;
            }
        }
    }

    positions
}

/// Word boundary characters that earn the boundary bonus
pub fn is_boundary(c: char) -> bool {
    matches!(c, '/' | '.' | '_' | ' ')
}

fn fold(c: char) -> char {
    c.to_lowercase().next().unwrap_or(c)
}
