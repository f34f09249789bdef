//! Command handlers
//!
//! Links and folders are addressed by full UUID or a unique prefix of one.
//! Folders may also be addressed by their exact name.

pub mod backup;
pub mod config;
pub mod folder;
pub mod link;
pub mod organize;
pub mod stats;
pub mod tag;

use anyhow::{bail, Result};
use uuid::Uuid;

use linknest_core::Store;

/// Resolve a link reference to its id
pub fn resolve_link(store: &Store, reference: &str) -> Result<Uuid> {
    let candidates: Vec<(Uuid, &str)> = store
        .links()
        .iter()
        .map(|l| (l.id, l.title.as_str()))
        .collect();
    resolve("link", reference, &candidates, None)
}

/// Resolve a folder reference (id, id prefix or exact name) to its id
pub fn resolve_folder(store: &Store, reference: &str) -> Result<Uuid> {
    let candidates: Vec<(Uuid, &str)> = store
        .folders()
        .iter()
        .map(|f| (f.id, f.name.as_str()))
        .collect();

    let by_name: Vec<Uuid> = candidates
        .iter()
        .filter(|(_, name)| *name == reference)
        .map(|(id, _)| *id)
        .collect();

    resolve("folder", reference, &candidates, Some(&by_name))
}

fn resolve(
    kind: &str,
    reference: &str,
    candidates: &[(Uuid, &str)],
    by_name: Option<&[Uuid]>,
) -> Result<Uuid> {
    let reference = reference.trim();

    if let Ok(id) = Uuid::parse_str(reference) {
        if candidates.iter().any(|(candidate, _)| *candidate == id) {
            return Ok(id);
        }
        bail!("No {} found with id: {}", kind, id);
    }

    if let Some(&[id]) = by_name {
        return Ok(id);
    }

    let wanted = reference.to_lowercase();
    let matches: Vec<&(Uuid, &str)> = candidates
        .iter()
        .filter(|(id, _)| !wanted.is_empty() && id.to_string().starts_with(&wanted))
        .collect();

    match matches.as_slice() {
        [] => match by_name {
            Some(named) if named.len() > 1 => {
                bail!("Several folders are named '{}'. Use the folder id instead.", reference)
            }
            _ => bail!("No {} found matching: {}", kind, reference),
        },
        [(id, _)] => Ok(*id),
        _ => {
            eprintln!("Multiple {}s match '{}':", kind, reference);
            for (id, label) in &matches {
                eprintln!("  {} - {}", id, label);
            }
            bail!("Ambiguous ID. Please provide more characters.");
        }
    }
}
