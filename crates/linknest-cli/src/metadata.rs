//! URL metadata fetching
//!
//! `HtmlMetadataAdapter` is the CLI's suggestion adapter. It fetches a page
//! and reads its title, description and keywords. Folder suggestions are
//! computed locally by `FolderMatcher`.

use scraper::{Html, Selector};
use std::time::Duration;

use linknest_core::models::parse_tag_list;
use linknest_core::{
    AdapterError, Folder, FolderMatcher, FolderSuggestion, Link, MetadataSuggestion,
    SuggestionAdapter,
};

/// Most keywords turned into suggested tags
const MAX_SUGGESTED_TAGS: usize = 5;

/// Suggestion adapter backed by plain HTTP and HTML metadata
pub struct HtmlMetadataAdapter {
    client: reqwest::Client,
    timeout_secs: u64,
}

impl HtmlMetadataAdapter {
    pub fn new(timeout_secs: u64) -> Result<Self, AdapterError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .user_agent("Mozilla/5.0 (compatible; LinkNest/1.0)")
            .build()
            .map_err(|e| AdapterError::Request(e.to_string()))?;

        Ok(Self {
            client,
            timeout_secs,
        })
    }

    fn classify(&self, error: reqwest::Error) -> AdapterError {
        if error.is_timeout() {
            AdapterError::Timeout(self.timeout_secs)
        } else {
            AdapterError::Request(error.to_string())
        }
    }
}

impl SuggestionAdapter for HtmlMetadataAdapter {
    async fn suggest_metadata(&self, url: &str) -> Result<MetadataSuggestion, AdapterError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        if !response.status().is_success() {
            return Err(AdapterError::Request(format!(
                "{} returned HTTP {}",
                url,
                response.status()
            )));
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok());
        check_content_type(url, content_type)?;

        let html = response.text().await.map_err(|e| {
            if e.is_timeout() {
                AdapterError::Timeout(self.timeout_secs)
            } else {
                AdapterError::InvalidResponse(format!("{} sent an unreadable body: {}", url, e))
            }
        })?;
        Ok(parse_metadata(&html))
    }

    async fn suggest_folders(
        &self,
        unfiled: &[Link],
        folders: &[Folder],
    ) -> Result<Vec<FolderSuggestion>, AdapterError> {
        Ok(FolderMatcher.suggest(unfiled, folders))
    }
}

/// Only HTML pages carry the metadata we read; a missing header is given
/// the benefit of the doubt
fn check_content_type(url: &str, content_type: Option<&str>) -> Result<(), AdapterError> {
    match content_type {
        Some(kind) if !kind.to_ascii_lowercase().contains("html") => Err(
            AdapterError::InvalidResponse(format!("{} is not an HTML page ({})", url, kind)),
        ),
        _ => Ok(()),
    }
}

/// Parse metadata from HTML content
fn parse_metadata(html: &str) -> MetadataSuggestion {
    let document = Html::parse_document(html);

    MetadataSuggestion {
        title: extract_title(&document),
        description: extract_description(&document),
        tags: extract_keywords(&document),
    }
}

/// Extract title from HTML
fn extract_title(document: &Html) -> Option<String> {
    if let Some(og_title) = extract_meta_content(document, "og:title") {
        return Some(og_title);
    }

    if let Some(twitter_title) = extract_meta_content(document, "twitter:title") {
        return Some(twitter_title);
    }

    let selector = Selector::parse("title").ok()?;
    document
        .select(&selector)
        .next()
        .map(|el| el.text().collect::<String>().trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Extract description from HTML
fn extract_description(document: &Html) -> Option<String> {
    extract_meta_content(document, "og:description")
        .or_else(|| extract_meta_content(document, "twitter:description"))
        .or_else(|| extract_meta_content(document, "description"))
}

/// Turn `<meta name="keywords">` into lower-cased, de-duplicated tags
fn extract_keywords(document: &Html) -> Vec<String> {
    let Some(keywords) = extract_meta_content(document, "keywords") else {
        return Vec::new();
    };

    let mut tags: Vec<String> = Vec::new();
    for tag in parse_tag_list(&keywords) {
        let tag = tag.to_lowercase();
        if !tags.contains(&tag) {
            tags.push(tag);
        }
    }
    tags.truncate(MAX_SUGGESTED_TAGS);
    tags
}

/// Extract content from a meta tag by property or name
fn extract_meta_content(document: &Html, property: &str) -> Option<String> {
    ["property", "name"].iter().find_map(|attr| {
        let selector = Selector::parse(&format!(r#"meta[{}="{}"]"#, attr, property)).ok()?;
        document
            .select(&selector)
            .next()
            .and_then(|el| el.value().attr("content"))
            .map(str::trim)
            .filter(|content| !content.is_empty())
            .map(str::to_string)
    })
}
