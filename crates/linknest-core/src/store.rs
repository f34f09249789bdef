//! Entity store
//!
//! The `Store` owns the link and folder collections and keeps them
//! consistent:
//!
//! - every non-null `folder_id` names an existing folder
//! - ids and creation times are assigned here and never change
//! - deleting a folder unfiles its links in the same step
//!
//! Every successful mutation bumps `revision()` and writes a snapshot to the
//! storage collaborator. A failed write is logged and otherwise ignored: the
//! in-memory state stays authoritative.
//!
//! ## Usage
//!
//! ```ignore
//! let mut store = Store::open(JsonFileStorage::new(&config));
//!
//! let folder = store.add_folder("Reading").id;
//! let link = store.add_link(LinkDraft::new("https://example.com", "Example").in_folder(folder));
//!
//! store.delete_folder(folder); // the link stays, unfiled
//! ```

use std::collections::{BTreeMap, BTreeSet};

use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::Config;
use crate::models::{Folder, Link, LinkDraft, LinkPatch, Snapshot};
use crate::storage::{JsonFileStorage, MemoryStorage, SnapshotStorage, StorageError};
use crate::suggest::{AdapterError, FolderSuggestion, SuggestionTicket};

/// Number of tags reported in `StoreStats::top_tags`
const TOP_TAGS: usize = 5;

/// Summary counts over the collection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreStats {
    pub total_links: usize,
    pub total_folders: usize,
    pub unfiled_links: usize,
    pub unique_tags: usize,
    /// Most used tags, most frequent first
    pub top_tags: Vec<(String, usize)>,
}

/// Authoritative in-memory holder of links and folders
pub struct Store {
    links: Vec<Link>,
    folders: Vec<Folder>,
    storage: Box<dyn SnapshotStorage>,
    /// Distinguishes stores whose revisions happen to coincide
    instance: Uuid,
    revision: u64,
    load_problem: Option<StorageError>,
    save_problem: Option<StorageError>,
}

impl Store {
    /// Open a store seeded from the given storage
    ///
    /// Absent or unreadable storage yields an empty store; the reason is
    /// kept in `load_problem()`.
    pub fn open(storage: impl SnapshotStorage + 'static) -> Self {
        let mut load_problem = None;
        let snapshot = match storage.load() {
            Ok(Some(snapshot)) => snapshot,
            Ok(None) => {
                debug!("No stored snapshot, starting empty");
                Snapshot::default()
            }
            Err(e) => {
                match e.hint() {
                    Some(hint) => {
                        warn!("Could not load stored snapshot, starting empty: {} ({})", e, hint)
                    }
                    None => warn!("Could not load stored snapshot, starting empty: {}", e),
                }
                load_problem = Some(e);
                Snapshot::default()
            }
        };

        Self {
            links: snapshot.links,
            folders: snapshot.folders,
            storage: Box::new(storage),
            instance: Uuid::new_v4(),
            revision: 0,
            load_problem,
            save_problem: None,
        }
    }

    /// Open the file-backed store described by a configuration
    pub fn open_with_config(config: &Config) -> Self {
        Self::open(JsonFileStorage::new(config))
    }

    /// An empty store that persists nowhere but memory
    pub fn in_memory() -> Self {
        Self::open(MemoryStorage::new())
    }

    // ==================== Reads ====================

    /// All links, in storage order (not a presentation order)
    pub fn links(&self) -> &[Link] {
        &self.links
    }

    /// All folders, in creation order
    pub fn folders(&self) -> &[Folder] {
        &self.folders
    }

    pub fn get_link(&self, id: Uuid) -> Option<&Link> {
        self.links.iter().find(|l| l.id == id)
    }

    pub fn get_folder(&self, id: Uuid) -> Option<&Folder> {
        self.folders.iter().find(|f| f.id == id)
    }

    pub fn link_count(&self) -> usize {
        self.links.len()
    }

    pub fn folder_count(&self) -> usize {
        self.folders.len()
    }

    /// Monotonic counter bumped by every successful mutation
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Identity of this store instance, fixed for its lifetime
    pub fn instance_id(&self) -> Uuid {
        self.instance
    }

    /// Why the stored snapshot could not be loaded at open, if it could not
    pub fn load_problem(&self) -> Option<&StorageError> {
        self.load_problem.as_ref()
    }

    /// Error from the most recent write, cleared by the next successful one
    pub fn save_problem(&self) -> Option<&StorageError> {
        self.save_problem.as_ref()
    }

    /// Copy of the current state
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            links: self.links.clone(),
            folders: self.folders.clone(),
        }
    }

    /// Links not filed under any folder
    pub fn unfiled_links(&self) -> Vec<&Link> {
        self.links.iter().filter(|l| l.is_unfiled()).collect()
    }

    /// Number of links filed under a folder
    pub fn links_in_folder(&self, folder: Uuid) -> usize {
        self.links
            .iter()
            .filter(|l| l.folder_id == Some(folder))
            .count()
    }

    /// Distinct tags, sorted
    pub fn all_tags(&self) -> Vec<String> {
        self.links
            .iter()
            .flat_map(|l| l.tags.iter().cloned())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Tags with usage counts, most used first, then by name
    pub fn tags_with_counts(&self) -> Vec<(String, usize)> {
        let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
        for tag in self.links.iter().flat_map(|l| l.tags.iter()) {
            *counts.entry(tag.as_str()).or_default() += 1;
        }

        let mut tags: Vec<(String, usize)> = counts
            .into_iter()
            .map(|(tag, count)| (tag.to_string(), count))
            .collect();
        tags.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        tags
    }

    pub fn stats(&self) -> StoreStats {
        let tags = self.tags_with_counts();
        StoreStats {
            total_links: self.links.len(),
            total_folders: self.folders.len(),
            unfiled_links: self.links.iter().filter(|l| l.is_unfiled()).count(),
            unique_tags: tags.len(),
            top_tags: tags.into_iter().take(TOP_TAGS).collect(),
        }
    }

    // ==================== Link Operations ====================

    /// Add a new link at the front of storage
    ///
    /// A folder reference that names no existing folder is dropped.
    pub fn add_link(&mut self, mut draft: LinkDraft) -> &Link {
        if let Some(folder) = draft.folder_id {
            if self.get_folder(folder).is_none() {
                warn!("Dropping reference to unknown folder {} on new link", folder);
                draft.folder_id = None;
            }
        }

        let link = Link::from_draft(draft);
        debug!(id = %link.id, "Adding link");
        self.links.insert(0, link);
        self.commit();
        &self.links[0]
    }

    /// Apply a partial update to a link
    ///
    /// Returns `None` (changing nothing) when the link does not exist. A
    /// folder change to an unknown folder is ignored.
    pub fn update_link(&mut self, id: Uuid, mut patch: LinkPatch) -> Option<&Link> {
        let index = self.links.iter().position(|l| l.id == id)?;

        if let Some(Some(folder)) = patch.folder_id {
            if self.get_folder(folder).is_none() {
                warn!("Ignoring move of link {} to unknown folder {}", id, folder);
                patch.folder_id = None;
            }
        }

        debug!(%id, "Updating link");
        patch.apply(&mut self.links[index]);
        self.commit();
        Some(&self.links[index])
    }

    /// Delete a link; returns false when it did not exist
    pub fn delete_link(&mut self, id: Uuid) -> bool {
        let before = self.links.len();
        self.links.retain(|l| l.id != id);
        if self.links.len() == before {
            return false;
        }

        debug!(%id, "Deleted link");
        self.commit();
        true
    }

    // ==================== Folder Operations ====================

    /// Add a new folder at the end of storage
    pub fn add_folder(&mut self, name: impl Into<String>) -> &Folder {
        let folder = Folder::new(name);
        debug!(id = %folder.id, "Adding folder");
        self.folders.push(folder);
        self.commit();
        let last = self.folders.len() - 1;
        &self.folders[last]
    }

    /// Rename a folder; `None` when it does not exist
    pub fn update_folder(&mut self, id: Uuid, name: impl Into<String>) -> Option<&Folder> {
        let index = self.folders.iter().position(|f| f.id == id)?;
        self.folders[index].name = name.into();
        debug!(%id, "Renamed folder");
        self.commit();
        Some(&self.folders[index])
    }

    /// Delete a folder and unfile every link that referenced it
    ///
    /// Returns the number of links unfiled, or `None` when the folder did
    /// not exist.
    pub fn delete_folder(&mut self, id: Uuid) -> Option<usize> {
        let index = self.folders.iter().position(|f| f.id == id)?;
        self.folders.remove(index);

        let mut unfiled = 0;
        for link in self.links.iter_mut().filter(|l| l.folder_id == Some(id)) {
            link.folder_id = None;
            unfiled += 1;
        }

        debug!(%id, unfiled, "Deleted folder");
        self.commit();
        Some(unfiled)
    }

    // ==================== Wholesale ====================

    /// Discard everything and install the snapshot's collections verbatim
    ///
    /// The snapshot is expected to have been validated already (see
    /// `codec::import_json`).
    pub fn replace_all(&mut self, snapshot: Snapshot) {
        info!(
            links = snapshot.links.len(),
            folders = snapshot.folders.len(),
            "Replacing store contents"
        );
        self.links = snapshot.links;
        self.folders = snapshot.folders;
        self.commit();
    }

    // ==================== Suggestions ====================

    /// Capture a liveness token before asking a suggestion adapter
    pub fn begin_suggestion(&self) -> SuggestionTicket {
        SuggestionTicket::new(self.revision)
    }

    /// Whether results obtained under `ticket` may still be applied
    pub fn is_current(&self, ticket: &SuggestionTicket) -> bool {
        !ticket.is_abandoned() && ticket.revision() == self.revision
    }

    /// File unfiled links under suggested folders, as one atomic change
    ///
    /// Refuses with `AdapterError::Stale` if the ticket was abandoned or the
    /// store changed since it was issued. Suggestions naming unknown links,
    /// unknown folders, already-filed links, or no folder are skipped.
    /// Returns the number of links moved.
    pub fn apply_folder_suggestions(
        &mut self,
        ticket: &SuggestionTicket,
        suggestions: &[FolderSuggestion],
    ) -> Result<usize, AdapterError> {
        if !self.is_current(ticket) {
            debug!(
                ticket_revision = ticket.revision(),
                revision = self.revision,
                "Discarding stale folder suggestions"
            );
            return Err(AdapterError::Stale);
        }

        let folders: BTreeSet<Uuid> = self.folders.iter().map(|f| f.id).collect();
        let mut moved = 0;
        for suggestion in suggestions {
            let Some(folder) = suggestion.suggested_folder_id else {
                continue;
            };
            if !folders.contains(&folder) {
                continue;
            }
            if let Some(link) = self
                .links
                .iter_mut()
                .find(|l| l.id == suggestion.link_id && l.is_unfiled())
            {
                link.folder_id = Some(folder);
                moved += 1;
            }
        }

        if moved > 0 {
            info!(moved, "Applied folder suggestions");
            self.commit();
        }
        Ok(moved)
    }

    // ==================== Internal ====================

    /// Record a completed mutation and write it through to storage
    fn commit(&mut self) {
        self.revision += 1;
        match self.storage.save(&self.snapshot()) {
            Ok(()) => self.save_problem = None,
            Err(e) => {
                warn!("Failed to persist snapshot (revision {}): {}", self.revision, e);
                self.save_problem = Some(e);
            }
        }
    }
}
