//! Snapshot codec
//!
//! Portable JSON representation of the whole store, used for file backup
//! and restore:
//!
//! ```json
//! { "links": [...], "folders": [...], "version": 1 }
//! ```
//!
//! Import is two-phase. `import_json` parses and validates into an
//! `ImportCandidate` without touching any store; the caller confirms and
//! then hands `ImportCandidate::into_snapshot()` to `Store::replace_all`.

use std::collections::HashSet;

use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::warn;
use uuid::Uuid;

use crate::models::{Folder, Link, Snapshot};

/// Version written into exported documents
pub const EXPORT_VERSION: u32 = 1;

/// Reasons an import document is rejected
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Error parsing JSON file: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("Invalid backup: expected a JSON object at the top level")]
    NotAnObject,

    #[error("Invalid backup: missing or empty '{0}'")]
    MissingField(&'static str),

    /// `version` is present but null, false, 0 or empty
    #[error("Invalid backup: unsupported version {0}")]
    InvalidVersion(String),

    #[error("Invalid backup: '{0}' must be a list")]
    NotAList(&'static str),

    #[error("Invalid backup: {kind} #{index} is malformed: {details}")]
    InvalidEntity {
        kind: &'static str,
        index: usize,
        details: String,
    },

    #[error("Invalid backup: duplicate {kind} id {id}")]
    DuplicateId { kind: &'static str, id: Uuid },
}

/// An exported document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportDocument {
    pub links: Vec<Link>,
    pub folders: Vec<Folder>,
    pub version: u32,
}

/// Wrap a snapshot as an export document
pub fn export(snapshot: &Snapshot) -> ExportDocument {
    ExportDocument {
        links: snapshot.links.clone(),
        folders: snapshot.folders.clone(),
        version: EXPORT_VERSION,
    }
}

/// Export a snapshot as pretty-printed JSON
pub fn export_json(snapshot: &Snapshot) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(&export(snapshot))
}

/// Conventional file name for a backup taken on `date`
pub fn backup_file_name(date: NaiveDate) -> String {
    format!("linknest-backup-{}.json", date.format("%Y-%m-%d"))
}

/// A validated import, not yet applied
#[derive(Debug, Clone, PartialEq)]
pub struct ImportCandidate {
    snapshot: Snapshot,
    repaired_references: usize,
}

impl ImportCandidate {
    pub fn link_count(&self) -> usize {
        self.snapshot.links.len()
    }

    pub fn folder_count(&self) -> usize {
        self.snapshot.folders.len()
    }

    /// Links whose folder reference named a folder missing from the file
    /// and was cleared
    pub fn repaired_references(&self) -> usize {
        self.repaired_references
    }

    /// Preview of the candidate's contents
    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    /// One-line description for a confirmation prompt
    pub fn summary(&self) -> String {
        let mut summary = format!(
            "{} link(s) and {} folder(s)",
            self.link_count(),
            self.folder_count()
        );
        if self.repaired_references > 0 {
            summary.push_str(&format!(
                " ({} link(s) pointed at missing folders and will be unfiled)",
                self.repaired_references
            ));
        }
        summary
    }

    /// Hand over the snapshot for `Store::replace_all`
    pub fn into_snapshot(self) -> Snapshot {
        self.snapshot
    }
}

/// Parse and validate an import document
pub fn import_json(text: &str) -> Result<ImportCandidate, ValidationError> {
    let value: Value = serde_json::from_str(text)?;
    import_value(value)
}

/// Validate an already parsed import document
///
/// `links` and `folders` must be present and non-null, and `version` must
/// be truthy (so a present `0` is rejected).
pub fn import_value(value: Value) -> Result<ImportCandidate, ValidationError> {
    let Value::Object(mut document) = value else {
        return Err(ValidationError::NotAnObject);
    };

    let links = take_truthy(&mut document, "links")?;
    let folders = take_truthy(&mut document, "folders")?;
    match document.remove("version") {
        None => return Err(ValidationError::MissingField("version")),
        Some(version) if !is_truthy(&version) => {
            return Err(ValidationError::InvalidVersion(version.to_string()))
        }
        Some(_) => {}
    }

    let folders: Vec<Folder> = decode_list("folders", "folder", folders)?;
    let mut links: Vec<Link> = decode_list("links", "link", links)?;

    ensure_unique("folder", folders.iter().map(|f| f.id))?;
    ensure_unique("link", links.iter().map(|l| l.id))?;

    let known: HashSet<Uuid> = folders.iter().map(|f| f.id).collect();
    let mut repaired_references = 0;
    for link in &mut links {
        if let Some(folder) = link.folder_id {
            if !known.contains(&folder) {
                link.folder_id = None;
                repaired_references += 1;
            }
        }
    }
    if repaired_references > 0 {
        warn!(
            repaired_references,
            "Import referenced folders missing from the file"
        );
    }

    Ok(ImportCandidate {
        snapshot: Snapshot { links, folders },
        repaired_references,
    })
}

fn take_truthy(
    document: &mut serde_json::Map<String, Value>,
    field: &'static str,
) -> Result<Value, ValidationError> {
    match document.remove(field) {
        Some(value) if is_truthy(&value) => Ok(value),
        _ => Err(ValidationError::MissingField(field)),
    }
}

/// JSON truthiness: null, false, 0 and "" are falsy; everything else is truthy
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map_or(true, |f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn decode_list<T: DeserializeOwned>(
    field: &'static str,
    kind: &'static str,
    value: Value,
) -> Result<Vec<T>, ValidationError> {
    let Value::Array(items) = value else {
        return Err(ValidationError::NotAList(field));
    };

    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| {
            serde_json::from_value(item).map_err(|e| ValidationError::InvalidEntity {
                kind,
                index,
                details: e.to_string(),
            })
        })
        .collect()
}

fn ensure_unique(
    kind: &'static str,
    ids: impl Iterator<Item = Uuid>,
) -> Result<(), ValidationError> {
    let mut seen = HashSet::new();
    for id in ids {
        if !seen.insert(id) {
            return Err(ValidationError::DuplicateId { kind, id });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::LinkDraft;
    use crate::store::Store;

    const WEB_APP_BACKUP: &str = r#"{
      "links": [
        {
          "url": "https://react.dev",
          "title": "React Hooks Guide",
          "description": "",
          "tags": ["react", "frontend"],
          "folderId": "5f1c2a0e-9a53-4a55-8d1e-0d0c2a1b3c4d",
          "id": "0b7e6d4c-1f2a-4b3c-9d8e-7f6a5b4c3d2e",
          "createdAt": "2024-03-01T10:15:00.000Z"
        },
        {
          "url": "https://example.com/recipes",
          "title": "Cooking Recipes",
          "description": "Weeknight dinners",
          "tags": [],
          "folderId": null,
          "id": "1c8f7e5d-2a3b-4c4d-8e9f-0a1b2c3d4e5f",
          "createdAt": "2024-02-01T08:00:00.000Z"
        }
      ],
      "folders": [
        {
          "name": "Frontend",
          "id": "5f1c2a0e-9a53-4a55-8d1e-0d0c2a1b3c4d",
          "createdAt": "2024-01-01T00:00:00.000Z"
        }
      ],
      "version": 1
    }"#;

    fn populated_store() -> Store {
        let mut store = Store::in_memory();
        let folder = store.add_folder("Reading").id;
        store.add_link(
            LinkDraft::new("https://rust-lang.org", "Rust")
                .with_description("Systems language")
                .with_tags(["rust", "lang"])
                .in_folder(folder),
        );
        store.add_link(LinkDraft::new("https://example.com", "Example"));
        store
    }

    #[test]
    fn test_export_document_shape() {
        let store = populated_store();
        let json = export_json(&store.snapshot()).unwrap();
        let value: Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["version"], 1);
        assert_eq!(value["links"].as_array().unwrap().len(), 2);
        assert_eq!(value["folders"].as_array().unwrap().len(), 1);
        assert!(value["links"][0].get("folderId").is_some());
    }

    #[test]
    fn test_round_trip_reproduces_store() {
        let store = populated_store();
        let json = export_json(&store.snapshot()).unwrap();

        let candidate = import_json(&json).unwrap();
        assert_eq!(candidate.repaired_references(), 0);

        let mut restored = Store::in_memory();
        restored.replace_all(candidate.into_snapshot());
        assert_eq!(restored.snapshot(), store.snapshot());
    }

    #[test]
    fn test_import_web_app_backup() {
        let candidate = import_json(WEB_APP_BACKUP).unwrap();
        assert_eq!(candidate.link_count(), 2);
        assert_eq!(candidate.folder_count(), 1);

        let links = &candidate.snapshot().links;
        assert_eq!(links[0].title, "React Hooks Guide");
        assert!(links[0].folder_id.is_some());
        assert!(links[1].is_unfiled());
    }

    #[test]
    fn test_import_rejects_malformed_json() {
        assert!(matches!(
            import_json("{ links: oops"),
            Err(ValidationError::Malformed(_))
        ));
    }

    #[test]
    fn test_import_rejects_non_object() {
        assert!(matches!(
            import_json("[1, 2, 3]"),
            Err(ValidationError::NotAnObject)
        ));
    }

    #[test]
    fn test_import_requires_fields() {
        let missing_links = r#"{"folders": [], "version": 1}"#;
        assert!(matches!(
            import_json(missing_links),
            Err(ValidationError::MissingField("links"))
        ));

        let null_folders = r#"{"links": [], "folders": null, "version": 1}"#;
        assert!(matches!(
            import_json(null_folders),
            Err(ValidationError::MissingField("folders"))
        ));

        let no_version = r#"{"links": [], "folders": []}"#;
        assert!(matches!(
            import_json(no_version),
            Err(ValidationError::MissingField("version"))
        ));
    }

    #[test]
    fn test_import_rejects_falsy_version() {
        let zero = r#"{"links": [], "folders": [], "version": 0}"#;
        let err = import_json(zero).unwrap_err();
        assert!(matches!(&err, ValidationError::InvalidVersion(v) if v == "0"));
        assert!(err.to_string().contains("unsupported version 0"));

        let empty = r#"{"links": [], "folders": [], "version": ""}"#;
        assert!(matches!(
            import_json(empty),
            Err(ValidationError::InvalidVersion(_))
        ));

        let null = r#"{"links": [], "folders": [], "version": null}"#;
        assert!(matches!(
            import_json(null),
            Err(ValidationError::InvalidVersion(_))
        ));

        // Any truthy value passes
        let string_version = r#"{"links": [], "folders": [], "version": "1"}"#;
        assert!(import_json(string_version).is_ok());
    }

    #[test]
    fn test_import_empty_collections_are_valid() {
        let candidate = import_json(r#"{"links": [], "folders": [], "version": 1}"#).unwrap();
        assert!(candidate.snapshot().is_empty());
    }

    #[test]
    fn test_import_rejects_bad_entities() {
        let not_a_list = r#"{"links": {"a": 1}, "folders": [], "version": 1}"#;
        assert!(matches!(
            import_json(not_a_list),
            Err(ValidationError::NotAList("links"))
        ));

        let bad_link = r#"{"links": [{"title": "no id"}], "folders": [], "version": 1}"#;
        assert!(matches!(
            import_json(bad_link),
            Err(ValidationError::InvalidEntity { kind: "link", index: 0, .. })
        ));
    }

    #[test]
    fn test_import_rejects_duplicate_ids() {
        let store = populated_store();
        let mut doc = export(&store.snapshot());
        doc.folders.push(doc.folders[0].clone());
        let json = serde_json::to_string(&doc).unwrap();

        assert!(matches!(
            import_json(&json),
            Err(ValidationError::DuplicateId { kind: "folder", .. })
        ));
    }

    #[test]
    fn test_import_repairs_dangling_folder_references() {
        let store = populated_store();
        let mut doc = export(&store.snapshot());
        doc.folders.clear();
        let json = serde_json::to_string(&doc).unwrap();

        let candidate = import_json(&json).unwrap();
        assert_eq!(candidate.repaired_references(), 1);
        assert!(candidate.summary().contains("unfiled"));
        assert!(candidate.snapshot().links.iter().all(|l| l.is_unfiled()));
    }

    #[test]
    fn test_failed_import_leaves_store_untouched() {
        let mut store = populated_store();
        let before = store.snapshot();

        if let Ok(candidate) = import_json(r#"{"links": [], "folders": [], "version": false}"#) {
            store.replace_all(candidate.into_snapshot());
        }

        assert_eq!(store.snapshot(), before);
    }

    #[test]
    fn test_backup_file_name() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();
        assert_eq!(backup_file_name(date), "linknest-backup-2024-03-09.json");
    }
}
