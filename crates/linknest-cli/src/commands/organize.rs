//! Organize command handler
//!
//! Proposes a folder for every unfiled link and, with `--apply`, files them
//! in one step.

use anyhow::Result;
use serde_json::json;

use linknest_core::suggest::request_folder_suggestions;
use linknest_core::{AdapterError, Config, Store};

use crate::metadata::HtmlMetadataAdapter;
use crate::output::{Output, OutputFormat};

/// Suggest folders for unfiled links
pub async fn organize(
    store: &mut Store,
    config: &Config,
    apply: bool,
    output: &Output,
) -> Result<()> {
    if store.folders().is_empty() {
        output.message("No folders yet. Create some with `linknest folder add <name>`.");
        return Ok(());
    }

    let adapter = HtmlMetadataAdapter::new(config.fetch_timeout_secs)?;
    let proposal = match request_folder_suggestions(&adapter, store).await {
        Ok(proposal) => proposal,
        Err(e) => {
            output.warn(&format!("No folder suggestions available: {}", e));
            return Ok(());
        }
    };

    let placed: Vec<_> = proposal
        .suggestions
        .iter()
        .filter_map(|s| {
            let link = store.get_link(s.link_id)?;
            let folder = store.get_folder(s.suggested_folder_id?)?;
            Some((link, folder))
        })
        .collect();

    match output.format {
        OutputFormat::Json => {
            let rows: Vec<_> = placed
                .iter()
                .map(|(link, folder)| {
                    json!({"linkId": link.id, "title": link.title, "folderId": folder.id, "folder": folder.name})
                })
                .collect();
            println!("{}", json!({"suggestions": rows, "applied": apply}));
        }
        OutputFormat::Human => {
            if placed.is_empty() {
                println!("No unfiled link matches a folder.");
            }
            for (link, folder) in &placed {
                println!("{} -> {}", link.title, folder.name);
            }
        }
        OutputFormat::Quiet => {}
    }

    if !apply {
        if !placed.is_empty() {
            output.message("\nRun again with --apply to file these links.");
        }
        return Ok(());
    }

    match store.apply_folder_suggestions(&proposal.ticket, &proposal.suggestions) {
        Ok(moved) => {
            output.success(&format!("Filed {} link(s)", moved));
            Ok(())
        }
        Err(AdapterError::Stale) => {
            output.warn("The collection changed while suggestions were computed; nothing was filed.");
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}
