//! Data models for LinkNest
//!
//! Defines the two entity kinds (Link and Folder), the caller-facing input
//! types used to create and patch them, and the `Snapshot` that captures a
//! whole store.
//!
//! Field names serialize in camelCase (`folderId`, `createdAt`) so snapshot
//! files stay interchangeable with backups written by the web app.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A saved link with metadata
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Link {
    /// Unique identifier, assigned by the store
    pub id: Uuid,
    /// The URL (not checked for reachability)
    pub url: String,
    /// Display title
    pub title: String,
    /// Free-form description, empty when not given
    #[serde(default)]
    pub description: String,
    /// Tags in the order the user entered them
    #[serde(default)]
    pub tags: Vec<String>,
    /// Folder this link is filed under, if any
    #[serde(default)]
    pub folder_id: Option<Uuid>,
    /// When this link was created
    pub created_at: DateTime<Utc>,
}

impl Link {
    /// Build a link from caller data with a fresh id and creation time
    pub(crate) fn from_draft(draft: LinkDraft) -> Self {
        Self {
            id: Uuid::new_v4(),
            url: draft.url,
            title: draft.title,
            description: draft.description,
            tags: normalize_tags(draft.tags),
            folder_id: draft.folder_id,
            created_at: Utc::now(),
        }
    }

    /// Check whether the link carries the given tag (exact match)
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    /// Whether this link is not filed under any folder
    pub fn is_unfiled(&self) -> bool {
        self.folder_id.is_none()
    }
}

/// A folder links can be filed under
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Folder {
    /// Unique identifier, assigned by the store
    pub id: Uuid,
    /// Display name
    pub name: String,
    /// When this folder was created
    pub created_at: DateTime<Utc>,
}

impl Folder {
    pub(crate) fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            created_at: Utc::now(),
        }
    }
}

/// Caller-supplied data for a new link
///
/// `id` and `created_at` are not part of the draft: the store assigns them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LinkDraft {
    pub url: String,
    pub title: String,
    pub description: String,
    pub tags: Vec<String>,
    pub folder_id: Option<Uuid>,
}

impl LinkDraft {
    /// Create a draft with a URL and title, everything else empty
    pub fn new(url: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            title: title.into(),
            ..Default::default()
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn in_folder(mut self, folder_id: Uuid) -> Self {
        self.folder_id = Some(folder_id);
        self
    }
}

/// A partial update to a link
///
/// Each field is applied only when present. `folder_id` is doubly optional:
/// `Some(None)` moves the link out of its folder, `None` leaves it alone.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LinkPatch {
    pub url: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub tags: Option<Vec<String>>,
    pub folder_id: Option<Option<Uuid>>,
}

impl LinkPatch {
    /// A patch that only changes the folder
    pub fn move_to(folder_id: Option<Uuid>) -> Self {
        Self {
            folder_id: Some(folder_id),
            ..Default::default()
        }
    }

    /// True when the patch would change nothing
    pub fn is_empty(&self) -> bool {
        self.url.is_none()
            && self.title.is_none()
            && self.description.is_none()
            && self.tags.is_none()
            && self.folder_id.is_none()
    }

    /// Overwrite the fields present in the patch. Never touches `id` or `created_at`.
    pub(crate) fn apply(self, link: &mut Link) {
        if let Some(url) = self.url {
            link.url = url;
        }
        if let Some(title) = self.title {
            link.title = title;
        }
        if let Some(description) = self.description {
            link.description = description;
        }
        if let Some(tags) = self.tags {
            link.tags = normalize_tags(tags);
        }
        if let Some(folder_id) = self.folder_id {
            link.folder_id = folder_id;
        }
    }
}

/// A complete capture of the store's two collections
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Snapshot {
    pub links: Vec<Link>,
    pub folders: Vec<Folder>,
}

impl Snapshot {
    pub fn is_empty(&self) -> bool {
        self.links.is_empty() && self.folders.is_empty()
    }
}

/// Trim tags and drop the empty ones, keeping order and duplicates
pub fn normalize_tags(tags: Vec<String>) -> Vec<String> {
    tags.into_iter()
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .collect()
}

/// Split a comma-separated tag list as typed by a user
pub fn parse_tag_list(input: &str) -> Vec<String> {
    normalize_tags(input.split(',').map(str::to_string).collect())
}
