//! Text relevance scoring
//!
//! A link's score is the sum of independent bonuses:
//!
//! | match                                              | bonus |
//! |----------------------------------------------------|-------|
//! | title contains the whole query                     | 50    |
//! | any tag contains the whole query                   | 40    |
//! | description contains the whole query               | 15    |
//! | URL contains the whole query                       | 5     |
//! | per query token found in "title + tags"            | 10    |
//! | per (query token, title token) within edit distance| 15    |
//! | per (query token, tag) within edit distance        | 12    |
//!
//! All comparisons are on lower-cased text. Only "significant" tokens
//! (longer than two characters) take part in the token and fuzzy bonuses.

use std::collections::BTreeSet;

use crate::models::Link;

pub const TITLE_BONUS: u32 = 50;
pub const TAG_BONUS: u32 = 40;
pub const DESCRIPTION_BONUS: u32 = 15;
pub const URL_BONUS: u32 = 5;
pub const TOKEN_BONUS: u32 = 10;
pub const FUZZY_TITLE_BONUS: u32 = 15;
pub const FUZZY_TAG_BONUS: u32 = 12;

/// Tokens must be longer than this many characters to count
const MIN_SIGNIFICANT_LEN: usize = 2;

/// Candidates whose length differs by this much or more are never compared
const MAX_LENGTH_GAP: usize = 3;

/// A parsed, non-empty search query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    phrase: String,
    tokens: Vec<String>,
}

impl SearchQuery {
    /// Parse raw search text; `None` when it is blank
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return None;
        }
        let phrase = trimmed.to_lowercase();
        let tokens = significant_tokens(&phrase).map(str::to_string).collect();
        Some(Self { phrase, tokens })
    }

    /// The whole query, lower-cased
    pub fn phrase(&self) -> &str {
        &self.phrase
    }

    /// Significant query tokens, in query order, duplicates kept
    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    /// Relevance of a link to this query; 0 means "not a match"
    pub fn score(&self, link: &Link) -> u32 {
        let title = link.title.to_lowercase();
        let tags: Vec<String> = link.tags.iter().map(|t| t.to_lowercase()).collect();

        let mut score = 0;

        if title.contains(&self.phrase) {
            score += TITLE_BONUS;
        }
        if tags.iter().any(|t| t.contains(&self.phrase)) {
            score += TAG_BONUS;
        }
        if link.description.to_lowercase().contains(&self.phrase) {
            score += DESCRIPTION_BONUS;
        }
        if link.url.to_lowercase().contains(&self.phrase) {
            score += URL_BONUS;
        }

        if self.tokens.is_empty() {
            return score;
        }

        let haystack = format!("{} {}", title, tags.join(" "));
        for token in &self.tokens {
            if haystack.contains(token.as_str()) {
                score += TOKEN_BONUS;
            }
        }

        let title_tokens: BTreeSet<&str> = significant_tokens(&title).collect();
        let tag_candidates: BTreeSet<&str> = tags
            .iter()
            .map(String::as_str)
            .filter(|t| is_significant(t))
            .collect();

        for token in &self.tokens {
            for candidate in &title_tokens {
                if is_typo_of(token, candidate) {
                    score += FUZZY_TITLE_BONUS;
                }
            }
            for candidate in &tag_candidates {
                if is_typo_of(token, candidate) {
                    score += FUZZY_TAG_BONUS;
                }
            }
        }

        score
    }
}

/// Whitespace-separated tokens longer than two characters
pub fn significant_tokens(text: &str) -> impl Iterator<Item = &str> {
    text.split_whitespace().filter(|t| is_significant(t))
}

fn is_significant(token: &str) -> bool {
    token.chars().count() > MIN_SIGNIFICANT_LEN
}

/// Maximum edit distance tolerated for a query token
fn typo_threshold(token_len: usize) -> usize {
    if token_len > 6 {
        2
    } else {
        1
    }
}

/// Whether `candidate` is close enough to `token` to count as a typo of it
fn is_typo_of(token: &str, candidate: &str) -> bool {
    let token_len = token.chars().count();
    let candidate_len = candidate.chars().count();
    if token_len.abs_diff(candidate_len) >= MAX_LENGTH_GAP {
        return false;
    }
    levenshtein(token, candidate) <= typo_threshold(token_len)
}

/// Edit distance with unit-cost insertion, deletion and substitution
pub fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];

    for (i, ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != cb);
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b.len()]
}
