//! LinkNest Core Library
//!
//! This crate provides the core of LinkNest, a personal bookmark manager:
//! links filed into folders, tagged, searched and ordered.
//!
//! # Architecture
//!
//! - **Store**: Authoritative in-memory collections, written through to a
//!   `SnapshotStorage` after every mutation
//! - **Query engine**: Pure evaluation of filters, search scoring and sort
//!   over the store's links
//! - **Codec**: JSON export and validated two-phase import
//!
//! # Quick Start
//!
//! ```text
//! let mut store = Store::open_with_config(&config);
//!
//! // Add a link
//! store.add_link(LinkDraft::new("https://example.com", "Example").with_tags(["web"]));
//!
//! // Search
//! let mut engine = QueryEngine::new();
//! engine.state_mut().set_query("example");
//! let hits = engine.results(&store);
//! ```
//!
//! # Modules
//!
//! - `store`: Entity store with referential integrity (main entry point)
//! - `models`: Links, folders and their input types
//! - `query`: Filtering, scoring, sorting and the sort mode state machine
//! - `codec`: Snapshot export and import
//! - `suggest`: Seam for external metadata and folder suggestions
//! - `storage`: Snapshot persistence
//! - `config`: Application configuration

pub mod codec;
pub mod config;
pub mod models;
pub mod query;
pub mod storage;
pub mod store;
pub mod suggest;

pub use codec::{ExportDocument, ImportCandidate, ValidationError};
pub use config::Config;
pub use models::{Folder, Link, LinkDraft, LinkPatch, Snapshot};
pub use query::{QueryEngine, QueryHit, QueryState, SearchQuery, SortMode};
pub use storage::{JsonFileStorage, MemoryStorage, SnapshotStorage, StorageError};
pub use store::{Store, StoreStats};
pub use suggest::{
    AdapterError, FolderMatcher, FolderSuggestion, MetadataSuggestion, SuggestionAdapter,
    SuggestionTicket,
};
