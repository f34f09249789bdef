//! Storage layer
//!
//! The durable-storage collaborator the `Store` reads from once at startup
//! and writes to after every mutation.
//!
//! ## Implementations
//!
//! - **JsonFileStorage**: the whole snapshot as one JSON file, written atomically
//! - **MemoryStorage**: in-process, for tests and ephemeral stores
//!
//! Storage is never authoritative: the in-memory store is the source of
//! truth and a failed write only produces a warning.

pub mod error;
pub mod persistence;

pub use error::{StorageError, StorageResult};
pub use persistence::{JsonFileStorage, MemoryStorage, SnapshotStorage};
