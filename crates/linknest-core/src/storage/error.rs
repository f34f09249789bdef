//! Storage errors
//!
//! Each error can carry a hint telling the user what to do about it. The
//! store keeps load and save errors around so the CLI can show them.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors from reading or writing a snapshot
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Could not create data directory '{path}': {source}")]
    CreateDirectory {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Could not read snapshot '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Could not write snapshot '{path}': {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The file was moved to `backup_path` and the store started empty
    #[error("Snapshot '{path}' is corrupted ({details}); it was moved to '{backup_path}'")]
    CorruptSnapshot {
        path: PathBuf,
        backup_path: PathBuf,
        details: String,
    },

    #[error("Could not encode snapshot: {0}")]
    Encode(#[from] serde_json::Error),
}

impl StorageError {
    /// What the user can do about this error, when there is something
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            StorageError::CorruptSnapshot { .. } => Some(
                "Restore a backup with `linknest import <file>`, or carry on with an empty collection.",
            ),
            StorageError::CreateDirectory { source, .. }
            | StorageError::Read { source, .. }
            | StorageError::Write { source, .. } => io_hint(source),
            StorageError::Encode(_) => None,
        }
    }
}

fn io_hint(source: &io::Error) -> Option<&'static str> {
    if source.kind() == io::ErrorKind::PermissionDenied {
        Some("Check the permissions of the data directory, or set `data_dir` to a writable location.")
    } else if is_out_of_space(source) {
        Some("The disk is full. Free up space, then run `linknest export` to save your links.")
    } else {
        None
    }
}

/// ENOSPC and friends, recognised by message since `ErrorKind::StorageFull`
/// is not available on every supported toolchain
fn is_out_of_space(error: &io::Error) -> bool {
    let msg = error.to_string().to_lowercase();
    ["no space left", "disk full", "quota exceeded", "not enough space"]
        .iter()
        .any(|needle| msg.contains(needle))
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn write_error(kind: io::ErrorKind, msg: &str) -> StorageError {
        StorageError::Write {
            path: PathBuf::from("/data/linknest.json"),
            source: io::Error::new(kind, msg),
        }
    }

    #[test]
    fn test_permission_hint() {
        let err = write_error(io::ErrorKind::PermissionDenied, "access denied");
        assert!(err.hint().unwrap().contains("permissions"));
    }

    #[test]
    fn test_out_of_space_hint() {
        let err = write_error(io::ErrorKind::Other, "No space left on device");
        assert!(err.hint().unwrap().contains("disk is full"));
    }

    #[test]
    fn test_plain_io_error_has_no_hint() {
        let err = write_error(io::ErrorKind::Interrupted, "interrupted");
        assert!(err.hint().is_none());
    }

    #[test]
    fn test_corrupt_snapshot_message_and_hint() {
        let err = StorageError::CorruptSnapshot {
            path: PathBuf::from("/data/linknest.json"),
            backup_path: PathBuf::from("/data/linknest.json.corrupt.backup"),
            details: "expected value at line 1".to_string(),
        };

        let msg = err.to_string();
        assert!(msg.contains("corrupted"));
        assert!(msg.contains("corrupt.backup"));
        assert!(err.hint().unwrap().contains("linknest import"));
    }
}
