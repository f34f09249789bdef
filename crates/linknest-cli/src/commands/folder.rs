//! Folder command handlers

use anyhow::{bail, Result};

use linknest_core::Store;

use super::resolve_folder;
use crate::editor::confirm;
use crate::output::Output;

/// Create a folder
pub fn create(store: &mut Store, name: String, output: &Output) -> Result<()> {
    let name = name.trim().to_string();
    if name.is_empty() {
        bail!("Folder name cannot be empty");
    }

    let folder = store.add_folder(name).clone();
    output.success(&format!("Created folder: {}", folder.name));
    output.print_folder(&folder);
    Ok(())
}

/// List folders with their link counts
pub fn list(store: &Store, output: &Output) -> Result<()> {
    let folders: Vec<_> = store
        .folders()
        .iter()
        .map(|f| (f, store.links_in_folder(f.id)))
        .collect();
    output.print_folders(&folders);
    Ok(())
}

/// Rename a folder
pub fn rename(store: &mut Store, reference: String, name: String, output: &Output) -> Result<()> {
    let id = resolve_folder(store, &reference)?;
    let name = name.trim().to_string();
    if name.is_empty() {
        bail!("Folder name cannot be empty");
    }

    let folder = store
        .update_folder(id, name)
        .ok_or_else(|| anyhow::anyhow!("Folder not found: {}", reference))?
        .clone();

    output.success(&format!("Renamed folder to: {}", folder.name));
    Ok(())
}

/// Delete a folder; its links stay, unfiled
pub fn delete(store: &mut Store, reference: String, yes: bool, output: &Output) -> Result<()> {
    let id = resolve_folder(store, &reference)?;
    let (name, count) = store
        .get_folder(id)
        .map(|f| (f.name.clone(), store.links_in_folder(id)))
        .ok_or_else(|| anyhow::anyhow!("Folder not found: {}", reference))?;

    let prompt = format!(
        "Delete folder '{}'? Its {} link(s) will be kept as unfiled.",
        name, count
    );
    if !yes && output.should_prompt() && !confirm(&prompt)? {
        output.message("Cancelled.");
        return Ok(());
    }

    let unfiled = store
        .delete_folder(id)
        .ok_or_else(|| anyhow::anyhow!("Folder not found: {}", reference))?;

    output.success(&format!(
        "Deleted folder '{}' ({} link(s) unfiled)",
        name, unfiled
    ));
    Ok(())
}
