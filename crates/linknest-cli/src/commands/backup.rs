//! Export and import command handlers
//!
//! Import is two-phase: the file is validated first, and the store is only
//! replaced after the user confirms (or passes `--yes`).

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use chrono::Local;

use linknest_core::codec::{backup_file_name, export_json, import_json};
use linknest_core::Store;

use crate::editor::confirm;
use crate::output::{Output, OutputFormat};

/// Write the whole collection to a JSON backup file
///
/// Without `--output` the file lands in the current directory under a
/// dated name.
pub fn export(store: &Store, path: Option<PathBuf>, output: &Output) -> Result<()> {
    let path = path.unwrap_or_else(|| PathBuf::from(backup_file_name(Local::now().date_naive())));
    let json = export_json(&store.snapshot()).context("Failed to serialize backup")?;

    std::fs::write(&path, json)
        .with_context(|| format!("Failed to write backup file: {:?}", path))?;

    match output.format {
        OutputFormat::Quiet => println!("{}", path.display()),
        _ => output.success(&format!(
            "Exported {} link(s) and {} folder(s) to {}",
            store.link_count(),
            store.folder_count(),
            path.display()
        )),
    }
    Ok(())
}

/// Replace the whole collection with the contents of a backup file
pub fn import(store: &mut Store, path: PathBuf, yes: bool, output: &Output) -> Result<()> {
    let text = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read backup file: {:?}", path))?;

    let candidate = import_json(&text)
        .with_context(|| format!("{} was not imported; nothing was changed", path.display()))?;

    if !yes {
        if !output.should_prompt() {
            bail!(
                "Importing replaces all {} link(s) and {} folder(s). Pass --yes to confirm.",
                store.link_count(),
                store.folder_count()
            );
        }

        let prompt = format!(
            "Replace all {} link(s) and {} folder(s) with {}?",
            store.link_count(),
            store.folder_count(),
            candidate.summary()
        );
        if !confirm(&prompt)? {
            output.message("Import cancelled. Nothing was changed.");
            return Ok(());
        }
    }

    let summary = candidate.summary();
    store.replace_all(candidate.into_snapshot());
    output.success(&format!("Imported {}", summary));
    Ok(())
}
