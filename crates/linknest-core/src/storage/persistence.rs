//! Snapshot persistence
//!
//! Saves and loads the full `{links, folders}` snapshot. The file backend
//! uses atomic writes (write to temp file, then rename) to prevent
//! corruption.
//!
//! Storage location: `~/.local/share/linknest/linknest.json` (configurable
//! via `Config`)

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use tracing::{debug, warn};

use super::error::{StorageError, StorageResult};
use crate::config::Config;
use crate::models::Snapshot;

/// Durable storage for store snapshots
///
/// Read once when a store opens and written after every mutation.
pub trait SnapshotStorage {
    /// Load the stored snapshot, `None` when nothing has been stored yet
    fn load(&self) -> StorageResult<Option<Snapshot>>;

    /// Replace the stored snapshot
    fn save(&self, snapshot: &Snapshot) -> StorageResult<()>;
}

impl<T: SnapshotStorage + ?Sized> SnapshotStorage for Arc<T> {
    fn load(&self) -> StorageResult<Option<Snapshot>> {
        (**self).load()
    }

    fn save(&self, snapshot: &Snapshot) -> StorageResult<()> {
        (**self).save(snapshot)
    }
}

/// Snapshot stored as a single JSON file
pub struct JsonFileStorage {
    path: PathBuf,
}

impl JsonFileStorage {
    /// Create a storage handler for the snapshot path of the given configuration
    pub fn new(config: &Config) -> Self {
        Self::at_path(config.snapshot_path())
    }

    /// Create a storage handler for an explicit file path
    pub fn at_path(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the snapshot file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Check if a snapshot exists on disk
    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Where a corrupt snapshot is moved before starting fresh
    pub fn backup_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".corrupt.backup");
        self.path.with_file_name(name)
    }

    /// Size of the snapshot file in bytes, 0 when absent
    pub fn size(&self) -> u64 {
        fs::metadata(&self.path).map(|m| m.len()).unwrap_or(0)
    }
}

impl SnapshotStorage for JsonFileStorage {
    fn load(&self) -> StorageResult<Option<Snapshot>> {
        if !self.path.exists() {
            return Ok(None);
        }

        let bytes = fs::read(&self.path).map_err(|source| StorageError::Read {
            path: self.path.clone(),
            source,
        })?;

        match serde_json::from_slice::<Snapshot>(&bytes) {
            Ok(snapshot) => {
                debug!(
                    links = snapshot.links.len(),
                    folders = snapshot.folders.len(),
                    "Loaded snapshot from {:?}",
                    self.path
                );
                Ok(Some(snapshot))
            }
            Err(e) => {
                let backup_path = self.backup_path();
                if let Err(rename_err) = fs::rename(&self.path, &backup_path) {
                    warn!(
                        "Could not move corrupt snapshot {:?} aside: {}",
                        self.path, rename_err
                    );
                }
                Err(StorageError::CorruptSnapshot {
                    path: self.path.clone(),
                    backup_path,
                    details: e.to_string(),
                })
            }
        }
    }

    fn save(&self, snapshot: &Snapshot) -> StorageResult<()> {
        let bytes = serde_json::to_vec_pretty(snapshot)?;
        atomic_write(&self.path, &bytes)
    }
}

/// In-process snapshot storage
///
/// Writes can be made to fail on demand to exercise error paths.
#[derive(Default)]
pub struct MemoryStorage {
    snapshot: Mutex<Option<Snapshot>>,
    fail_writes: AtomicBool,
    saves: AtomicUsize,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with an existing snapshot
    pub fn with_snapshot(snapshot: Snapshot) -> Self {
        Self {
            snapshot: Mutex::new(Some(snapshot)),
            ..Default::default()
        }
    }

    /// Make every following `save` fail (or succeed again)
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Number of successful saves so far
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    /// Last snapshot written
    pub fn stored(&self) -> Option<Snapshot> {
        self.snapshot.lock().ok().and_then(|s| s.clone())
    }
}

impl SnapshotStorage for MemoryStorage {
    fn load(&self) -> StorageResult<Option<Snapshot>> {
        Ok(self.stored())
    }

    fn save(&self, snapshot: &Snapshot) -> StorageResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StorageError::Write {
                path: PathBuf::from("<memory>"),
                source: io::Error::new(io::ErrorKind::Other, "writes disabled"),
            });
        }
        let mut slot = self.snapshot.lock().map_err(|_| StorageError::Write {
            path: PathBuf::from("<memory>"),
            source: io::Error::new(io::ErrorKind::Other, "storage lock poisoned"),
        })?;
        *slot = Some(snapshot.clone());
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Write data to a file atomically
///
/// 1. Write to a temporary file in the same directory
/// 2. Sync the file to disk
/// 3. Rename the temp file to the target path
pub(crate) fn atomic_write(path: &Path, data: &[u8]) -> StorageResult<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|source| StorageError::CreateDirectory {
                path: parent.to_path_buf(),
                source,
            })?;
        }
    }

    // Same directory as the target so the rename stays atomic
    let temp_path = path.with_extension("tmp");

    let write_error = |source| StorageError::Write {
        path: temp_path.clone(),
        source,
    };
    let mut file = File::create(&temp_path).map_err(write_error)?;
    file.write_all(data).map_err(write_error)?;
    file.sync_all().map_err(write_error)?;

    fs::rename(&temp_path, path).map_err(|source| StorageError::Write {
        path: path.to_path_buf(),
        source,
    })?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Folder, Link, LinkDraft};
    use tempfile::TempDir;

    fn sample_snapshot() -> Snapshot {
        let folder = Folder::new("Reading");
        let link = Link::from_draft(
            LinkDraft::new("https://example.com", "Example")
                .with_tags(["web"])
                .in_folder(folder.id),
        );
        Snapshot {
            links: vec![link],
            folders: vec![folder],
        }
    }

    #[test]
    fn test_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let storage = JsonFileStorage::at_path(temp_dir.path().join("linknest.json"));

        assert!(!storage.exists());
        assert!(storage.load().unwrap().is_none());

        let snapshot = sample_snapshot();
        storage.save(&snapshot).unwrap();
        assert!(storage.exists());
        assert!(storage.size() > 0);

        let loaded = storage.load().unwrap().unwrap();
        assert_eq!(loaded, snapshot);
    }

    #[test]
    fn test_corrupt_file_is_moved_aside() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("linknest.json");
        fs::write(&path, b"{ not json").unwrap();

        let storage = JsonFileStorage::at_path(&path);
        let err = storage.load().unwrap_err();

        assert!(matches!(err, StorageError::CorruptSnapshot { .. }));
        assert!(!path.exists());
        assert!(storage.backup_path().exists());
        assert!(storage
            .backup_path()
            .to_string_lossy()
            .ends_with("linknest.json.corrupt.backup"));
    }

    #[test]
    fn test_new_uses_config_path() {
        let temp_dir = TempDir::new().unwrap();
        let config = Config {
            data_dir: temp_dir.path().to_path_buf(),
            ..Config::default()
        };
        let storage = JsonFileStorage::new(&config);
        assert_eq!(storage.path(), config.snapshot_path());
    }

    #[test]
    fn test_atomic_write_creates_parent_dirs() {
        let temp_dir = TempDir::new().unwrap();
        let nested_path = temp_dir.path().join("a").join("b").join("file.json");

        atomic_write(&nested_path, b"test data").unwrap();

        assert!(nested_path.exists());
        assert!(!nested_path.with_extension("tmp").exists());
        assert_eq!(fs::read_to_string(&nested_path).unwrap(), "test data");
    }

    #[test]
    fn test_memory_storage_failure_switch() {
        let storage = MemoryStorage::new();
        let snapshot = sample_snapshot();

        storage.save(&snapshot).unwrap();
        assert_eq!(storage.save_count(), 1);

        storage.set_fail_writes(true);
        assert!(storage.save(&Snapshot::default()).is_err());
        assert_eq!(storage.stored(), Some(snapshot));
        assert_eq!(storage.save_count(), 1);
    }
}
