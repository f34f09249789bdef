//! Link command handlers

use anyhow::{bail, Context, Result};

use linknest_core::models::parse_tag_list;
use linknest_core::{
    Config, LinkDraft, LinkPatch, QueryEngine, QueryState, SortMode, Store, SuggestionAdapter,
};

use super::{resolve_folder, resolve_link};
use crate::editor::{confirm, prompt_with_default};
use crate::metadata::HtmlMetadataAdapter;
use crate::output::Output;

/// Fields for a new link as given on the command line
pub struct NewLink {
    pub url: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub tags: Vec<String>,
    pub folder: Option<String>,
    pub fetch: bool,
}

/// Which links to show and in what order
pub struct Selection {
    pub query: Option<String>,
    pub folder: Option<String>,
    pub tag: Option<String>,
    pub sort: Option<SortMode>,
}

/// Changes requested by `link edit`
pub struct Edits {
    pub title: Option<String>,
    pub url: Option<String>,
    pub description: Option<String>,
    pub tags: Option<String>,
    pub folder: Option<String>,
    pub no_folder: bool,
}

/// Create a new link
pub async fn create(
    store: &mut Store,
    config: &Config,
    new: NewLink,
    output: &Output,
) -> Result<()> {
    let url = new.url.trim().to_string();
    if url.is_empty() {
        bail!("URL cannot be empty");
    }

    let mut draft = LinkDraft::new(url.clone(), new.title.unwrap_or_default())
        .with_description(new.description.unwrap_or_default())
        .with_tags(new.tags.iter().flat_map(|t| parse_tag_list(t)));

    if let Some(reference) = new.folder {
        draft.folder_id = Some(resolve_folder(store, &reference)?);
    }

    if new.fetch {
        let adapter = HtmlMetadataAdapter::new(config.fetch_timeout_secs)?;
        match adapter.suggest_metadata(&url).await {
            Ok(suggestion) => suggestion.fill_blanks(&mut draft),
            Err(e) => output.warn(&format!("Could not fetch page details: {}", e)),
        }
    }

    if draft.title.trim().is_empty() {
        draft.title = url;
    }

    let link = store.add_link(draft).clone();
    output.success(&format!("Created link: {}", link.id));
    output.print_link(&link, store);

    Ok(())
}

/// List links, or search them when a query is given
pub fn list(
    store: &Store,
    config: &Config,
    selection: Selection,
    output: &Output,
) -> Result<()> {
    let mut state = QueryState::new();

    if let Some(reference) = selection.folder {
        state.set_folder_filter(Some(resolve_folder(store, &reference)?));
    }
    if let Some(tag) = selection.tag {
        state.set_tag_filter(Some(tag.trim().to_string()));
    }
    if let Some(query) = selection.query {
        state.set_query(query);
    }

    match selection.sort {
        Some(mode) => {
            if !state.set_sort(mode) {
                bail!("Sorting by relevance needs a search query");
            }
        }
        None if !state.is_searching() => {
            state.set_sort(config.default_sort);
        }
        None => {}
    }

    let mut engine = QueryEngine::with_state(state);
    let hits = engine.results(store);
    output.print_hits(&hits, store);
    Ok(())
}

/// Show a single link
pub fn show(store: &Store, id: String, output: &Output) -> Result<()> {
    let uuid = resolve_link(store, &id)?;

    let link = store
        .get_link(uuid)
        .ok_or_else(|| anyhow::anyhow!("Link not found: {}", id))?;

    output.print_link(link, store);
    Ok(())
}

/// Edit a link
///
/// With no flags the fields are prompted for interactively.
pub fn edit(store: &mut Store, id: String, edits: Edits, output: &Output) -> Result<()> {
    let uuid = resolve_link(store, &id)?;

    let mut patch = LinkPatch {
        url: edits.url,
        title: edits.title,
        description: edits.description,
        tags: edits.tags.as_deref().map(parse_tag_list),
        folder_id: None,
    };

    if edits.no_folder {
        patch.folder_id = Some(None);
    } else if let Some(reference) = edits.folder {
        patch.folder_id = Some(Some(resolve_folder(store, &reference)?));
    }

    if patch.is_empty() {
        if !output.should_prompt() {
            bail!("Nothing to change. Pass --title, --url, --description, --tags or --folder.");
        }
        patch = prompt_for_patch(store, uuid)?;
    }

    if patch.is_empty() {
        output.message("No changes made.");
        return Ok(());
    }

    let link = store
        .update_link(uuid, patch)
        .ok_or_else(|| anyhow::anyhow!("Link not found: {}", id))?
        .clone();

    output.success(&format!("Updated link: {}", link.id));
    output.print_link(&link, store);
    Ok(())
}

fn prompt_for_patch(store: &Store, id: uuid::Uuid) -> Result<LinkPatch> {
    let link = store
        .get_link(id)
        .ok_or_else(|| anyhow::anyhow!("Link not found: {}", id))?;

    println!("Editing link: {}", link.id);
    println!("Press Enter to keep current value, or type new value.\n");

    let title = prompt_with_default("Title", &link.title)?;
    let url = prompt_with_default("URL", &link.url)?;
    let description = prompt_with_default("Description", &link.description)?;
    let tags = prompt_with_default("Tags (comma-separated)", &link.tags.join(", "))?
        .map(|t| parse_tag_list(&t));

    Ok(LinkPatch {
        url,
        title,
        description,
        tags,
        folder_id: None,
    })
}

/// Delete a link
pub fn delete(store: &mut Store, id: String, yes: bool, output: &Output) -> Result<()> {
    let uuid = resolve_link(store, &id)?;

    let title = store
        .get_link(uuid)
        .map(|l| l.title.clone())
        .ok_or_else(|| anyhow::anyhow!("Link not found: {}", id))?;

    if !yes && output.should_prompt() && !confirm(&format!("Delete link '{}'?", title))? {
        output.message("Cancelled.");
        return Ok(());
    }

    if !store.delete_link(uuid) {
        bail!("Link not found: {}", id);
    }

    output.success(&format!("Deleted link: {}", uuid));
    Ok(())
}

/// Open a link in the system browser
pub fn open(store: &Store, id: String, output: &Output) -> Result<()> {
    let uuid = resolve_link(store, &id)?;

    let link = store
        .get_link(uuid)
        .ok_or_else(|| anyhow::anyhow!("Link not found: {}", id))?;

    open::that(&link.url).with_context(|| format!("Failed to open {}", link.url))?;
    output.message(&format!("Opened {}", link.url));
    Ok(())
}
