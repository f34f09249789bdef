//! Sort modes and comparators
//!
//! Every comparator ends with a comparison on the link id so the final
//! order never depends on storage order. Relevance ties fall back to
//! newest first, then id.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::QueryHit;

/// How query results are ordered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SortMode {
    /// Highest score first; only available while a query is active
    Relevance,
    /// Newest first
    #[default]
    DateDesc,
    /// Oldest first
    DateAsc,
    TitleAsc,
    TitleDesc,
    UrlAsc,
    UrlDesc,
}

/// Unknown sort mode name
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown sort mode '{0}' (expected one of: relevance, date-desc, date-asc, title-asc, title-desc, url-asc, url-desc)")]
pub struct ParseSortModeError(String);

impl SortMode {
    pub const ALL: [SortMode; 7] = [
        SortMode::Relevance,
        SortMode::DateDesc,
        SortMode::DateAsc,
        SortMode::TitleAsc,
        SortMode::TitleDesc,
        SortMode::UrlAsc,
        SortMode::UrlDesc,
    ];

    /// Machine name, as accepted by `FromStr`
    pub fn as_str(self) -> &'static str {
        match self {
            SortMode::Relevance => "relevance",
            SortMode::DateDesc => "date-desc",
            SortMode::DateAsc => "date-asc",
            SortMode::TitleAsc => "title-asc",
            SortMode::TitleDesc => "title-desc",
            SortMode::UrlAsc => "url-asc",
            SortMode::UrlDesc => "url-desc",
        }
    }

    /// Human label
    pub fn label(self) -> &'static str {
        match self {
            SortMode::Relevance => "Relevance",
            SortMode::DateDesc => "Date (Newest)",
            SortMode::DateAsc => "Date (Oldest)",
            SortMode::TitleAsc => "Title (A-Z)",
            SortMode::TitleDesc => "Title (Z-A)",
            SortMode::UrlAsc => "URL (A-Z)",
            SortMode::UrlDesc => "URL (Z-A)",
        }
    }

    /// Order two hits under this mode
    pub fn compare(self, a: &QueryHit<'_>, b: &QueryHit<'_>) -> Ordering {
        let (a_link, b_link) = (a.link, b.link);
        let primary = match self {
            SortMode::Relevance => b
                .score
                .cmp(&a.score)
                .then_with(|| b_link.created_at.cmp(&a_link.created_at)),
            SortMode::DateDesc => b_link.created_at.cmp(&a_link.created_at),
            SortMode::DateAsc => a_link.created_at.cmp(&b_link.created_at),
            SortMode::TitleAsc => locale_compare(&a_link.title, &b_link.title),
            SortMode::TitleDesc => locale_compare(&b_link.title, &a_link.title),
            SortMode::UrlAsc => locale_compare(&a_link.url, &b_link.url),
            SortMode::UrlDesc => locale_compare(&b_link.url, &a_link.url),
        };
        primary.then_with(|| a_link.id.cmp(&b_link.id))
    }
}

impl fmt::Display for SortMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortMode {
    type Err = ParseSortModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        SortMode::ALL
            .into_iter()
            .find(|mode| mode.as_str() == wanted)
            .ok_or_else(|| ParseSortModeError(s.to_string()))
    }
}

/// Case-insensitive comparison with lower case ahead of upper case on ties
pub fn locale_compare(a: &str, b: &str) -> Ordering {
    let folded = a
        .chars()
        .flat_map(char::to_lowercase)
        .cmp(b.chars().flat_map(char::to_lowercase));

    folded
        .then_with(|| {
            a.chars()
                .map(char::is_uppercase)
                .cmp(b.chars().map(char::is_uppercase))
        })
        .then_with(|| a.cmp(b))
}
