//! Suggestion adapter seam
//!
//! Optional enrichment from an outside source: metadata for a URL, and a
//! folder for each unfiled link. Adapters are consulted asynchronously and
//! may fail; a failure only ever means "no suggestion".
//!
//! Results are applied under a `SuggestionTicket` taken from the store
//! before the request. If the store changed, or the caller abandoned the
//! request, the late results are discarded instead of applied.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

use crate::models::{Folder, Link, LinkDraft};
use crate::query::SearchQuery;
use crate::store::Store;

/// Errors from a suggestion adapter
#[derive(Error, Debug)]
pub enum AdapterError {
    #[error("Suggestion request failed: {0}")]
    Request(String),

    #[error("Invalid suggestion response: {0}")]
    InvalidResponse(String),

    #[error("Suggestion request timed out after {0}s")]
    Timeout(u64),

    /// The store changed or the request was abandoned before the answer arrived
    #[error("Suggestions are stale: the collection changed while they were computed")]
    Stale,
}

/// Suggested metadata for a URL
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetadataSuggestion {
    pub title: Option<String>,
    pub description: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl MetadataSuggestion {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.description.is_none() && self.tags.is_empty()
    }

    /// Fill the draft's empty fields from this suggestion
    ///
    /// Values the caller already provided are kept.
    pub fn fill_blanks(self, draft: &mut LinkDraft) {
        if draft.title.trim().is_empty() {
            if let Some(title) = self.title.filter(|t| !t.trim().is_empty()) {
                draft.title = title;
            }
        }
        if draft.description.trim().is_empty() {
            if let Some(description) = self.description {
                draft.description = description;
            }
        }
        if draft.tags.is_empty() {
            draft.tags = self.tags;
        }
    }
}

/// A proposed folder for one link; `None` means no folder fits
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FolderSuggestion {
    pub link_id: Uuid,
    pub suggested_folder_id: Option<Uuid>,
}

impl FolderSuggestion {
    pub fn new(link_id: Uuid, suggested_folder_id: Option<Uuid>) -> Self {
        Self {
            link_id,
            suggested_folder_id,
        }
    }
}

/// Source of metadata and folder suggestions
pub trait SuggestionAdapter {
    /// Suggest a title, description and tags for a URL
    fn suggest_metadata(
        &self,
        url: &str,
    ) -> impl Future<Output = Result<MetadataSuggestion, AdapterError>>;

    /// Suggest a folder for each unfiled link
    fn suggest_folders(
        &self,
        unfiled: &[Link],
        folders: &[Folder],
    ) -> impl Future<Output = Result<Vec<FolderSuggestion>, AdapterError>>;
}

/// Liveness token for an in-flight suggestion request
///
/// Clones share the abandoned flag, so the requester can hand one to a
/// task and abandon the request from elsewhere.
#[derive(Debug, Clone)]
pub struct SuggestionTicket {
    revision: u64,
    abandoned: Arc<AtomicBool>,
}

impl SuggestionTicket {
    pub(crate) fn new(revision: u64) -> Self {
        Self {
            revision,
            abandoned: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Store revision the request was issued against
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Give up on the request; its results will never be applied
    pub fn abandon(&self) {
        self.abandoned.store(true, Ordering::SeqCst);
    }

    pub fn is_abandoned(&self) -> bool {
        self.abandoned.load(Ordering::SeqCst)
    }
}

/// Folder suggestions bound to the ticket they were requested under
#[derive(Debug, Clone)]
pub struct FolderProposal {
    pub ticket: SuggestionTicket,
    pub suggestions: Vec<FolderSuggestion>,
}

/// Ask an adapter for folder suggestions for the store's unfiled links
///
/// Skips the request when there is nothing to organize or nowhere to put it.
pub async fn request_folder_suggestions<A: SuggestionAdapter>(
    adapter: &A,
    store: &Store,
) -> Result<FolderProposal, AdapterError> {
    let ticket = store.begin_suggestion();
    let unfiled: Vec<Link> = store.unfiled_links().into_iter().cloned().collect();

    if unfiled.is_empty() || store.folders().is_empty() {
        return Ok(FolderProposal {
            ticket,
            suggestions: Vec::new(),
        });
    }

    let suggestions = adapter.suggest_folders(&unfiled, store.folders()).await?;
    debug!(count = suggestions.len(), "Received folder suggestions");
    Ok(FolderProposal {
        ticket,
        suggestions,
    })
}

/// Local folder suggester
///
/// Scores every folder name as a search query against each link and
/// proposes the best-scoring folder. Earlier folders win ties.
#[derive(Debug, Clone, Copy, Default)]
pub struct FolderMatcher;

impl FolderMatcher {
    pub fn suggest(&self, unfiled: &[Link], folders: &[Folder]) -> Vec<FolderSuggestion> {
        let queries: Vec<(Uuid, SearchQuery)> = folders
            .iter()
            .filter_map(|f| SearchQuery::parse(&f.name).map(|q| (f.id, q)))
            .collect();

        unfiled
            .iter()
            .map(|link| {
                let mut best: Option<(Uuid, u32)> = None;
                for (folder, query) in &queries {
                    let score = query.score(link);
                    if score > 0 && best.map_or(true, |(_, top)| score > top) {
                        best = Some((*folder, score));
                    }
                }
                FolderSuggestion::new(link.id, best.map(|(folder, _)| folder))
            })
            .collect()
    }
}
